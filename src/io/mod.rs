//! Readers and writers for the alignment and reference inputs.
//!
//! All coordinate conversion between the crate's 0-based half-open ranges
//! and the 1-based positions noodles speaks happens here.

pub mod bam;
pub mod reference;

pub use bam::{
    bai_path, contig_lengths, index_bam, merge_bams, output_header, write_bam, AlignmentReader,
    FetchError,
};
pub use reference::{ReferenceFetch, ReferenceReader};
