use std::fs::File;
use std::io;
use std::path::Path;

use noodles::core::{Position, Region};
use noodles::fasta;

/// Random access to reference bases.
///
/// Coordinates are 0-based half-open; implementations return uppercase
/// bases. Workers hold one accessor each, so `&mut self` is fine.
pub trait ReferenceFetch {
    /// Fetch the bases of `[start, end)` on `contig`.
    ///
    /// # Errors
    ///
    /// Returns an error when the contig is unknown or the read fails.
    fn fetch(&mut self, contig: &str, start: u64, end: u64) -> io::Result<Vec<u8>>;
}

/// Indexed FASTA reference accessor.
pub struct ReferenceReader {
    reader: fasta::io::IndexedReader<fasta::io::BufReader<File>>,
}

impl ReferenceReader {
    /// Open `path` together with its `.fai` index.
    ///
    /// # Errors
    ///
    /// Returns an error when the FASTA or its index cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let reader = fasta::io::indexed_reader::Builder::default().build_from_path(path)?;
        Ok(Self { reader })
    }
}

impl ReferenceFetch for ReferenceReader {
    fn fetch(&mut self, contig: &str, start: u64, end: u64) -> io::Result<Vec<u8>> {
        if start >= end {
            return Ok(Vec::new());
        }

        let start = Position::try_from(start as usize + 1)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let end = Position::try_from(end as usize)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let region = Region::new(contig, start..=end);
        let record = self.reader.query(&region)?;

        let mut bases = record.sequence().as_ref().to_vec();
        bases.make_ascii_uppercase();
        Ok(bases)
    }
}
