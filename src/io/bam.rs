use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use bstr::BString;
use noodles::bam;
use noodles::bgzf;
use noodles::core::{Position, Region};
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::sam;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::Record as _;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use noodles::sam::header::record::value::map::program::tag as program_tag;
use noodles::sam::header::record::value::Map;
use thiserror::Error;

use crate::core::bin::GenomicBin;
use crate::pipeline::deadline::{Deadline, DeadlineExceeded};

/// Records scanned between budget checks while draining a range query.
const DEADLINE_STRIDE: usize = 1_024;

/// Raised while scanning a fetch window.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    DeadlineExceeded(#[from] DeadlineExceeded),
}

/// An indexed alignment reader; each worker opens its own.
pub struct AlignmentReader {
    reader: bam::io::IndexedReader<bgzf::Reader<File>>,
    header: sam::Header,
}

impl AlignmentReader {
    /// Open `path` together with its index.
    ///
    /// # Errors
    ///
    /// Returns an error when the BAM or its index cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut reader = bam::io::indexed_reader::Builder::default().build_from_path(path)?;
        let header = reader.read_header()?;
        Ok(Self { reader, header })
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    /// Contig names with their lengths, in header order.
    pub fn contig_lengths(&self) -> Vec<(String, u64)> {
        contig_lengths(&self.header)
    }

    /// All primary mapped records overlapping the bin's fetch window that
    /// pass the mapping-quality floor.
    ///
    /// The deadline is tested every [`DEADLINE_STRIDE`] records so a
    /// pathological pileup cannot scan past the bin's budget.
    ///
    /// # Errors
    ///
    /// Returns an error when the range query or record decoding fails, or
    /// when the budget runs out mid-scan.
    pub fn fetch_window(
        &mut self,
        bin: &GenomicBin,
        min_mapping_quality: u8,
        deadline: &Deadline,
    ) -> Result<Vec<RecordBuf>, FetchError> {
        if bin.fetch_start >= bin.fetch_end {
            return Ok(Vec::new());
        }

        let start = Position::try_from(bin.fetch_start as usize + 1)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let end = Position::try_from(bin.fetch_end as usize)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let region = Region::new(bin.contig.clone(), start..=end);

        let mut records = Vec::new();
        let mut scanned = 0usize;

        for result in self.reader.query(&self.header, &region)? {
            scanned += 1;
            if scanned % DEADLINE_STRIDE == 0 {
                deadline.check()?;
            }

            let record = result?;

            let flags = record.flags();
            if flags.is_unmapped() || flags.is_secondary() || flags.is_supplementary() {
                continue;
            }

            let mapping_quality = record.mapping_quality().map_or(0, |q| q.get());
            if mapping_quality < min_mapping_quality {
                continue;
            }

            records.push(RecordBuf::try_from_alignment_record(&self.header, &record)?);
        }

        Ok(records)
    }
}

/// Derive the output header from the input: keep reference sequences, read
/// groups, programs, and comments; force `SO:coordinate`; append our own
/// program record.
pub fn output_header(input: &sam::Header, command_line: &str) -> sam::Header {
    let mut builder = sam::Header::builder();

    for (name, map) in input.reference_sequences() {
        builder = builder.add_reference_sequence(name.clone(), map.clone());
    }

    for (id, rg) in input.read_groups() {
        builder = builder.add_read_group(id.clone(), rg.clone());
    }

    for (id, pg) in input.programs().as_ref() {
        builder = builder.add_program(id.clone(), pg.clone());
    }

    for comment in input.comments() {
        builder = builder.add_comment(comment.clone());
    }

    let hd = Map::<sam::header::record::value::map::Header>::builder()
        .insert(header_tag::SORT_ORDER, BString::from("coordinate"))
        .build()
        .expect("valid header record");

    let pg = Map::<sam::header::record::value::map::Program>::builder()
        .insert(program_tag::VERSION, BString::from(env!("CARGO_PKG_VERSION")))
        .insert(program_tag::COMMAND_LINE, BString::from(command_line))
        .build()
        .expect("valid program record");

    builder
        .set_header(hd)
        .add_program(env!("CARGO_PKG_NAME"), pg)
        .build()
}

/// Contig names with their lengths, in header order.
pub fn contig_lengths(header: &sam::Header) -> Vec<(String, u64)> {
    header
        .reference_sequences()
        .iter()
        .map(|(name, map)| {
            (
                String::from_utf8_lossy(name).into_owned(),
                usize::from(map.length()) as u64,
            )
        })
        .collect()
}

/// Write `records` to a new BAM at `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be created or a record fails to
/// encode.
pub fn write_bam(path: &Path, header: &sam::Header, records: &[RecordBuf]) -> io::Result<()> {
    let mut writer = bam::io::writer::Builder::default().build_from_path(path)?;
    writer.write_header(header)?;

    for record in records {
        writer.write_alignment_record(header, record)?;
    }

    writer.try_finish()
}

/// Merge the coordinate-sorted `inputs` into a new sorted BAM at `dst`.
///
/// A k-way merge by (reference index, start); ties keep the earlier input's
/// records first, so non-overlapping inputs degenerate to concatenation in
/// the given order. Record data passes through untouched; only the header is
/// replaced.
///
/// # Errors
///
/// Returns an error when any input cannot be read or the output cannot be
/// written.
pub fn merge_bams(dst: &Path, header: &sam::Header, inputs: &[PathBuf]) -> io::Result<()> {
    let mut writer = bam::io::writer::Builder::default().build_from_path(dst)?;
    writer.write_header(header)?;

    let mut readers = Vec::with_capacity(inputs.len());
    let mut records = Vec::with_capacity(inputs.len());
    let mut heap = BinaryHeap::new();

    for (i, input) in inputs.iter().enumerate() {
        let mut reader = bam::io::reader::Builder::default().build_from_path(input)?;
        reader.read_header()?;

        let mut record = bam::Record::default();
        if reader.read_record(&mut record)? != 0 {
            heap.push(Reverse((sort_key(&record)?, i)));
        }
        readers.push(reader);
        records.push(record);
    }

    while let Some(Reverse((_, i))) = heap.pop() {
        writer.write_record(header, &records[i])?;
        if readers[i].read_record(&mut records[i])? != 0 {
            heap.push(Reverse((sort_key(&records[i])?, i)));
        }
    }

    writer.try_finish()
}

/// Coordinate ordering key: reference index, then start. Unmapped records
/// sort last, as samtools places them.
fn sort_key(record: &bam::Record) -> io::Result<(usize, usize)> {
    let reference_sequence_id = record
        .reference_sequence_id()
        .transpose()?
        .unwrap_or(usize::MAX);
    let start = record
        .alignment_start()
        .transpose()?
        .map(usize::from)
        .unwrap_or(usize::MAX);

    Ok((reference_sequence_id, start))
}

/// The conventional index path for a BAM: the BAM path plus `.bai`.
pub fn bai_path(bam: &Path) -> PathBuf {
    PathBuf::from(format!("{}.bai", bam.display()))
}

/// Build and write the `.bai` index for the coordinate-sorted BAM at `path`.
///
/// # Errors
///
/// Returns an error when the BAM cannot be re-read or the index cannot be
/// written.
pub fn index_bam(path: &Path) -> io::Result<PathBuf> {
    let mut reader = bam::io::reader::Builder::default().build_from_path(path)?;
    let header = reader.read_header()?;

    let mut record = bam::Record::default();
    let mut indexer = noodles::csi::binning_index::Indexer::default();
    let mut start_position = reader.get_ref().virtual_position();

    while reader.read_record(&mut record)? != 0 {
        let end_position = reader.get_ref().virtual_position();
        let chunk = Chunk::new(start_position, end_position);

        let alignment_context = match (
            record.reference_sequence_id().transpose()?,
            record.alignment_start().transpose()?,
            record.alignment_end().transpose()?,
        ) {
            (Some(id), Some(start), Some(end)) => {
                Some((id, start, end, !record.flags().is_unmapped()))
            }
            _ => None,
        };

        indexer.add_record(alignment_context, chunk)?;
        start_position = end_position;
    }

    let index: bam::bai::Index = indexer.build(header.reference_sequences().len());

    let out = bai_path(path);
    let mut writer = bam::bai::io::Writer::new(BufWriter::new(File::create(&out)?));
    writer.write_index(&index)?;

    Ok(out)
}
