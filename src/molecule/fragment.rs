use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::RecordBuf;

/// Strand of the original DNA fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
        }
    }
}

/// One physical DNA fragment: a read pair, or a single unpaired read.
///
/// Carries the span over all constituent records, the fragment strand, the
/// UMI (`RX` tag), and the per-fragment ligation motif (`lh` tag) when the
/// upstream demultiplexer recorded one.
#[derive(Debug, Clone)]
pub struct Fragment {
    records: Vec<RecordBuf>,
    pub contig: String,
    /// 0-based inclusive span start.
    pub start: u64,
    /// 0-based exclusive span end.
    pub end: u64,
    pub strand: Strand,
    pub umi: Vec<u8>,
    pub ligation_motif: Option<String>,
}

impl Fragment {
    /// Assemble a fragment from the primary records sharing one read name.
    ///
    /// Returns `None` when no record carries a usable alignment, so callers
    /// can drop unplaceable fragments before grouping.
    pub fn from_records(records: Vec<RecordBuf>, contig: &str) -> Option<Self> {
        let mut start = u64::MAX;
        let mut end = 0u64;

        for record in &records {
            let Some(record_start) = record.alignment_start() else {
                continue;
            };
            let Some(record_end) = record.alignment_end() else {
                continue;
            };
            // noodles positions are 1-based inclusive
            start = start.min(usize::from(record_start) as u64 - 1);
            end = end.max(usize::from(record_end) as u64);
        }

        if start >= end {
            return None;
        }

        let strand = fragment_strand(&records)?;
        let umi = string_tag(&records, Tag::new(b'R', b'X')).unwrap_or_default();
        let ligation_motif = string_tag(&records, Tag::new(b'l', b'h'))
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        Some(Self {
            records,
            contig: contig.to_string(),
            start,
            end,
            strand,
            umi,
            ligation_motif,
        })
    }

    pub fn records(&self) -> &[RecordBuf] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RecordBuf> {
        self.records
    }
}

/// The fragment strand follows the first segment of the template.
///
/// When only the last segment made it into the fetch window, its orientation
/// is inverted to recover the template strand.
fn fragment_strand(records: &[RecordBuf]) -> Option<Strand> {
    let mut fallback = None;

    for record in records {
        let flags = record.flags();
        if flags.is_unmapped() {
            continue;
        }

        if !flags.is_segmented() || flags.is_first_segment() {
            return Some(if flags.is_reverse_complemented() {
                Strand::Reverse
            } else {
                Strand::Forward
            });
        }

        if flags.is_last_segment() && fallback.is_none() {
            fallback = Some(if flags.is_reverse_complemented() {
                Strand::Forward
            } else {
                Strand::Reverse
            });
        }
    }

    fallback
}

/// First string value for `tag` across the fragment's records.
fn string_tag(records: &[RecordBuf], tag: Tag) -> Option<Vec<u8>> {
    records.iter().find_map(|record| {
        if let Some(Value::String(s)) = record.data().get(&tag) {
            Some(s.to_vec())
        } else {
            None
        }
    })
}
