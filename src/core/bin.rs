use serde::Serialize;

use crate::core::blacklist::BlacklistRegion;

/// A contiguous genomic range assigned as one unit of parallel work.
///
/// The processing range `[start, end)` is exclusive to this bin: a molecule
/// belongs to the bin whose processing range contains its cut site. The fetch
/// window `[fetch_start, fetch_end)` is a superset widened by the maximum
/// fragment length so that no fragment contributing to a boundary molecule is
/// missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenomicBin {
    pub contig: String,
    pub start: u64,
    pub end: u64,
    pub fetch_start: u64,
    pub fetch_end: u64,
}

impl GenomicBin {
    /// True when a cut site on `contig` at `pos` is owned by this bin.
    ///
    /// The end is exclusive, so a site exactly on a bin boundary belongs to
    /// the bin that starts there, never the bin that ends there.
    pub fn owns_site(&self, contig: &str, pos: u64) -> bool {
        contig == self.contig && pos >= self.start && pos < self.end
    }
}

impl std::fmt::Display for GenomicBin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

/// Compute the ordered bin plan covering all contigs.
///
/// Contigs are walked in the given order, start positions in steps of
/// `bin_size`. Blacklisted intervals are carved out of the plan entirely:
/// within each contig the non-blacklisted sub-intervals are tiled
/// independently, so no bin's processing range overlaps a blacklist region.
/// Fetch windows are widened by `fragment_length` and clamped to the contig.
///
/// The returned order (contig order, then ascending start) is relied upon by
/// the merge stage to keep the final output coordinate-sorted.
pub fn plan_bins(
    contig_lengths: &[(String, u64)],
    bin_size: u64,
    fragment_length: u64,
    blacklist: &[BlacklistRegion],
) -> Vec<GenomicBin> {
    assert!(bin_size > 0, "bin size must be positive");

    let mut bins = Vec::new();

    for (contig, length) in contig_lengths {
        let excluded = merged_exclusions(contig, *length, blacklist);

        for (allowed_start, allowed_end) in allowed_intervals(*length, &excluded) {
            let mut start = allowed_start;
            while start < allowed_end {
                let end = (start + bin_size).min(allowed_end);
                bins.push(GenomicBin {
                    contig: contig.clone(),
                    start,
                    end,
                    fetch_start: start.saturating_sub(fragment_length),
                    fetch_end: (end + fragment_length).min(*length),
                });
                start = end;
            }
        }
    }

    bins
}

/// Blacklist intervals for one contig, clamped, sorted, and merged.
fn merged_exclusions(contig: &str, length: u64, blacklist: &[BlacklistRegion]) -> Vec<(u64, u64)> {
    let mut intervals: Vec<(u64, u64)> = blacklist
        .iter()
        .filter(|region| region.contig == contig)
        .map(|region| (region.start.min(length), region.end.min(length)))
        .filter(|(start, end)| start < end)
        .collect();

    intervals.sort_unstable();

    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = (*last_end).max(end),
            _ => merged.push((start, end)),
        }
    }

    merged
}

/// The complement of the exclusions within `[0, length)`.
fn allowed_intervals(length: u64, excluded: &[(u64, u64)]) -> Vec<(u64, u64)> {
    let mut allowed = Vec::with_capacity(excluded.len() + 1);
    let mut cursor = 0;

    for &(start, end) in excluded {
        if cursor < start {
            allowed.push((cursor, start));
        }
        cursor = end;
    }

    if cursor < length {
        allowed.push((cursor, length));
    }

    allowed
}
