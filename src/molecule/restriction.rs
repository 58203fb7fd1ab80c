use std::io;

use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

use crate::io::reference::ReferenceFetch;
use crate::molecule::fragment::{Fragment, Strand};
use crate::molecule::molecule::Molecule;
use crate::molecule::{CutSite, IdentityModel, RejectReason, Validity};
use crate::utils::seq::reverse_complement;

/// Restriction-site assay (NlaIII-style by default).
///
/// The defining recognition window sits at the fragment's ligation end: the
/// trailing 4 bases of the span on the forward strand, the leading 4 bases
/// on the reverse strand. The cut site is the window start, so a reference
/// lookup of 4 bases at the cut site reads the recognition sequence of a
/// correctly placed molecule.
pub struct RestrictionAssay {
    recognition: Vec<u8>,
    site_must_be_mapped: bool,
}

impl RestrictionAssay {
    pub fn new(recognition: Vec<u8>, site_must_be_mapped: bool) -> Self {
        Self {
            recognition,
            site_must_be_mapped,
        }
    }

    /// The recognition sequence as it appears on the forward reference
    /// strand for a fragment of the given orientation.
    ///
    /// Reference windows are always fetched from the forward strand, so a
    /// reverse-strand molecule's site reads as the reverse complement of
    /// the enzyme's recognition sequence. The default site (CATG) is
    /// palindromic and unaffected; a configured non-palindromic sequence
    /// is compared strand-correctly rather than literally.
    fn oriented_recognition(&self, strand: Strand) -> Vec<u8> {
        match strand {
            Strand::Forward => self.recognition.clone(),
            Strand::Reverse => reverse_complement(&self.recognition),
        }
    }

    /// Count recognition sites within the molecule's span, excluding the
    /// defining cut site itself.
    fn undigested_site_count(&self, span: &[u8], strand: Strand) -> u64 {
        let motif = self.oriented_recognition(strand);
        if span.len() < motif.len() {
            return 0;
        }

        let mut total = span
            .windows(motif.len())
            .filter(|window| *window == motif.as_slice())
            .count() as u64;

        let defining = match strand {
            Strand::Forward => span.ends_with(&motif),
            Strand::Reverse => span.starts_with(&motif),
        };
        if defining {
            total -= 1;
        }

        total
    }
}

impl IdentityModel for RestrictionAssay {
    fn cut_site(&self, fragment: &Fragment) -> Option<CutSite> {
        let window = self.recognition.len() as u64;
        let pos = match fragment.strand {
            Strand::Forward => fragment.end.checked_sub(window)?,
            Strand::Reverse => fragment.start,
        };

        if fragment.end - fragment.start < window {
            return None;
        }

        Some(CutSite {
            contig: fragment.contig.clone(),
            pos,
            strand: fragment.strand,
        })
    }

    fn is_valid(
        &self,
        molecule: &Molecule,
        reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Validity> {
        if !self.site_must_be_mapped {
            return Ok(Validity::Valid);
        }

        let Some(reference) = reference else {
            // Enforced during configuration validation
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "reference required to validate the cut site",
            ));
        };

        let site = &molecule.cut_site;
        let window = self.recognition.len() as u64;
        let bases = reference.fetch(&site.contig, site.pos, site.pos + window)?;

        if bases == self.oriented_recognition(site.strand) {
            Ok(Validity::Valid)
        } else {
            Ok(Validity::Invalid(RejectReason::RecognitionSequenceMismatch))
        }
    }

    fn compute_tags(
        &self,
        molecule: &Molecule,
        reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Vec<(Tag, Value)>> {
        // Without a reference the statistic is simply omitted
        let Some(reference) = reference else {
            return Ok(Vec::new());
        };

        let span = reference.fetch(molecule.contig(), molecule.span_start, molecule.span_end)?;
        let count = self.undigested_site_count(&span, molecule.strand());

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        Ok(vec![(Tag::new(b'U', b's'), Value::from(count as i32))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::test_support::single_record;

    /// In-memory reference for model tests.
    struct FlatReference(Vec<u8>);

    impl ReferenceFetch for FlatReference {
        fn fetch(&mut self, _contig: &str, start: u64, end: u64) -> io::Result<Vec<u8>> {
            let start = start as usize;
            let end = (end as usize).min(self.0.len());
            Ok(self.0[start.min(end)..end].to_vec())
        }
    }

    fn assay(site_must_be_mapped: bool) -> RestrictionAssay {
        RestrictionAssay::new(b"CATG".to_vec(), site_must_be_mapped)
    }

    fn fragment(pos: u64, len: usize, reverse: bool) -> Fragment {
        let record = single_record("r", pos, len, reverse, Some("AAAA"), None);
        Fragment::from_records(vec![record], "chr1").unwrap()
    }

    fn molecule(pos: u64, len: usize, reverse: bool) -> Molecule {
        let frag = fragment(pos, len, reverse);
        let site = assay(false).cut_site(&frag).unwrap();
        Molecule::new(frag, site)
    }

    #[test]
    fn test_forward_cut_site_is_trailing_window() {
        let site = assay(false).cut_site(&fragment(100, 60, false)).unwrap();
        assert_eq!(site.pos, 156);
    }

    #[test]
    fn test_reverse_cut_site_is_leading_window() {
        let site = assay(false).cut_site(&fragment(100, 60, true)).unwrap();
        assert_eq!(site.pos, 100);
    }

    #[test]
    fn test_non_palindromic_recognition_is_complemented_on_reverse() {
        let assay = RestrictionAssay::new(b"GACT".to_vec(), false);
        assert_eq!(assay.oriented_recognition(Strand::Forward), b"GACT".to_vec());
        assert_eq!(assay.oriented_recognition(Strand::Reverse), b"AGTC".to_vec());
    }

    #[test]
    fn test_undigested_count_excludes_defining_site() {
        // Two raw occurrences, trailing one is the defining forward cut site
        assert_eq!(
            assay(false).undigested_site_count(b"CATGAACATG", Strand::Forward),
            1
        );
    }

    #[test]
    fn test_undigested_count_reverse_excludes_leading() {
        assert_eq!(
            assay(false).undigested_site_count(b"CATGAACATG", Strand::Reverse),
            1
        );
    }

    #[test]
    fn test_undigested_count_no_defining_occurrence() {
        assert_eq!(
            assay(false).undigested_site_count(b"AACATGAA", Strand::Forward),
            1
        );
        assert_eq!(assay(false).undigested_site_count(b"AAAAAA", Strand::Forward), 0);
    }

    #[test]
    fn test_validity_accepts_mapped_site() {
        // Forward cut site for a 10 bp fragment at 0 is position 6
        let mut reference = FlatReference(b"AAAAAACATGAAAA".to_vec());
        let molecule = molecule(0, 10, false);

        let validity = assay(true).is_valid(&molecule, Some(&mut reference)).unwrap();
        assert!(validity.is_valid());
    }

    #[test]
    fn test_validity_rejects_mismatching_site() {
        let mut reference = FlatReference(b"AAAAAAGGGGAAAA".to_vec());
        let molecule = molecule(0, 10, false);

        let validity = assay(true).is_valid(&molecule, Some(&mut reference)).unwrap();
        assert_eq!(
            validity,
            Validity::Invalid(RejectReason::RecognitionSequenceMismatch)
        );
    }

    #[test]
    fn test_validity_without_check_needs_no_reference() {
        let molecule = molecule(0, 10, false);
        assert!(assay(false).is_valid(&molecule, None).unwrap().is_valid());
    }

    #[test]
    fn test_tags_omitted_without_reference() {
        let molecule = molecule(0, 10, false);
        let tags = assay(false).compute_tags(&molecule, None).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_us_tag_counts_span_sites() {
        // Span [0, 10) reads CATGAACATG: one undigested site
        let mut reference = FlatReference(b"CATGAACATGTTTT".to_vec());
        let molecule = molecule(0, 10, false);

        let tags = assay(false)
            .compute_tags(&molecule, Some(&mut reference))
            .unwrap();
        assert_eq!(tags, vec![(Tag::new(b'U', b's'), Value::from(1))]);
    }
}
