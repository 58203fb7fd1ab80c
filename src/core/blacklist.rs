use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::core::bin::GenomicBin;

#[derive(Error, Debug)]
pub enum BlacklistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid blacklist format: {0}")]
    InvalidFormat(String),
}

/// A contig interval excluded from bin generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistRegion {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl BlacklistRegion {
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }
}

/// Parse a tab-separated blacklist file with columns: contig, start, end.
///
/// Empty lines and `#` comments are skipped. Extra columns are ignored, so
/// full BED files work as input.
///
/// # Errors
///
/// Returns `BlacklistError::Io` if the file cannot be read, or
/// `BlacklistError::InvalidFormat` if a line has fewer than 3 fields or a
/// coordinate does not parse.
pub fn read_blacklist(path: &Path) -> Result<Vec<BlacklistRegion>, BlacklistError> {
    let content = std::fs::read_to_string(path)?;
    parse_blacklist_text(&content)
}

/// Parse blacklist text with columns: contig, start, end.
///
/// # Errors
///
/// Returns `BlacklistError::InvalidFormat` for malformed lines.
pub fn parse_blacklist_text(text: &str) -> Result<Vec<BlacklistRegion>, BlacklistError> {
    let mut regions = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(BlacklistError::InvalidFormat(format!(
                "Line {line_num} has fewer than 3 fields"
            )));
        }

        let start: u64 = fields[1].trim().parse().map_err(|_| {
            BlacklistError::InvalidFormat(format!(
                "Invalid start on line {}: '{}'",
                line_num, fields[1]
            ))
        })?;
        let end: u64 = fields[2].trim().parse().map_err(|_| {
            BlacklistError::InvalidFormat(format!(
                "Invalid end on line {}: '{}'",
                line_num, fields[2]
            ))
        })?;

        if start > end {
            return Err(BlacklistError::InvalidFormat(format!(
                "Start after end on line {line_num}"
            )));
        }

        regions.push(BlacklistRegion::new(fields[0].trim(), start, end));
    }

    Ok(regions)
}

/// Write the seed content of the blacklist artifact.
///
/// The artifact starts as a copy of the static input regions; timed-out bins
/// are appended later so the whole exclusion set lives in one file a rerun
/// can consume directly.
///
/// # Errors
///
/// Returns `BlacklistError::Io` on write failure.
pub fn write_blacklist(path: &Path, regions: &[BlacklistRegion]) -> Result<(), BlacklistError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for region in regions {
        writeln!(writer, "{}\t{}\t{}", region.contig, region.start, region.end)?;
    }
    writer.flush()?;
    Ok(())
}

/// Append timed-out bin coordinates to an existing blacklist artifact.
///
/// # Errors
///
/// Returns `BlacklistError::Io` on write failure.
pub fn append_bins(path: &Path, bins: &[GenomicBin]) -> Result<(), BlacklistError> {
    let mut writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(path)?);
    for bin in bins {
        writeln!(writer, "{}\t{}\t{}", bin.contig, bin.start, bin.end)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blacklist_text() {
        let text = "chr1\t100\t200\nchr2\t0\t50\n";
        let regions = parse_blacklist_text(text).unwrap();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0], BlacklistRegion::new("chr1", 100, 200));
        assert_eq!(regions[1], BlacklistRegion::new("chr2", 0, 50));
    }

    #[test]
    fn test_parse_blacklist_skips_comments_and_blanks() {
        let text = "# repeat regions\n\nchr1\t100\t200\n";
        let regions = parse_blacklist_text(text).unwrap();
        assert_eq!(regions.len(), 1);
    }

    #[test]
    fn test_parse_blacklist_extra_columns_ignored() {
        let text = "chr1\t100\t200\trepeat\t0\t+\n";
        let regions = parse_blacklist_text(text).unwrap();
        assert_eq!(regions[0].end, 200);
    }

    #[test]
    fn test_parse_blacklist_rejects_short_line() {
        let result = parse_blacklist_text("chr1\t100\n");
        assert!(matches!(result, Err(BlacklistError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_blacklist_rejects_bad_coordinate() {
        let result = parse_blacklist_text("chr1\tzero\t200\n");
        assert!(matches!(result, Err(BlacklistError::InvalidFormat(_))));
    }

    #[test]
    fn test_round_trip_with_appended_bins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist.bed");

        write_blacklist(&path, &[BlacklistRegion::new("chr1", 0, 100)]).unwrap();
        append_bins(
            &path,
            &[GenomicBin {
                contig: "chr2".to_string(),
                start: 500,
                end: 1_000,
                fetch_start: 400,
                fetch_end: 1_100,
            }],
        )
        .unwrap();

        let regions = read_blacklist(&path).unwrap();
        assert_eq!(
            regions,
            vec![
                BlacklistRegion::new("chr1", 0, 100),
                BlacklistRegion::new("chr2", 500, 1_000),
            ]
        );
    }
}
