//! Shared fixtures: synthetic coordinate-sorted, indexed BAM inputs.
#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use bstr::BString;
use noodles::core::Position;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Cigar, Data, QualityScores, Sequence};
use noodles::sam::alignment::RecordBuf;
use noodles::sam::header::record::value::map::ReferenceSequence;
use noodles::sam::header::record::value::Map;
use noodles::sam::Header;

use bintag::io::bam::{index_bam, write_bam};

pub fn single_contig_header(name: &str, length: usize) -> Header {
    Header::builder()
        .add_reference_sequence(
            BString::from(name),
            Map::<ReferenceSequence>::new(NonZeroUsize::new(length).unwrap()),
        )
        .build()
}

/// A mapped single-end read; `pos` is 0-based.
pub fn read(name: &str, pos: u64, len: usize, reverse: bool, mapq: u8, umi: &str) -> RecordBuf {
    let flags = if reverse {
        Flags::REVERSE_COMPLEMENTED
    } else {
        Flags::empty()
    };

    RecordBuf::builder()
        .set_name(name)
        .set_flags(flags)
        .set_reference_sequence_id(0)
        .set_alignment_start(Position::try_from(pos as usize + 1).unwrap())
        .set_mapping_quality(MappingQuality::new(mapq).unwrap())
        .set_cigar(Cigar::from(vec![Op::new(Kind::Match, len)]))
        .set_sequence(Sequence::from(vec![b'A'; len]))
        .set_quality_scores(QualityScores::from(vec![30; len]))
        .set_data(Data::from_iter([(
            Tag::new(b'R', b'X'),
            Value::String(umi.into()),
        )]))
        .build()
}

/// Write `records` (already coordinate sorted) as an indexed BAM.
pub fn write_indexed_bam(dir: &Path, header: &Header, records: &[RecordBuf]) -> PathBuf {
    let path = dir.join("input.bam");
    write_bam(&path, header, records).unwrap();
    index_bam(&path).unwrap();
    path
}

/// All records of a BAM, decoded, with the header.
pub fn read_bam(path: &Path) -> (Header, Vec<RecordBuf>) {
    let mut reader = noodles::bam::io::reader::Builder::default()
        .build_from_path(path)
        .unwrap();
    let header = reader.read_header().unwrap();

    let mut records = Vec::new();
    let mut record = noodles::bam::Record::default();
    while reader.read_record(&mut record).unwrap() != 0 {
        records.push(RecordBuf::try_from_alignment_record(&header, &record).unwrap());
    }

    (header, records)
}

/// Integer payload of a tag value, whatever width BAM stored it at.
pub fn int_value(record: &RecordBuf, tag: Tag) -> Option<i64> {
    match record.data().get(&tag)? {
        Value::Int8(v) => Some(i64::from(*v)),
        Value::UInt8(v) => Some(i64::from(*v)),
        Value::Int16(v) => Some(i64::from(*v)),
        Value::UInt16(v) => Some(i64::from(*v)),
        Value::Int32(v) => Some(i64::from(*v)),
        Value::UInt32(v) => Some(i64::from(*v)),
        _ => None,
    }
}
