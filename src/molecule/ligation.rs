use std::io;

use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

use crate::io::reference::ReferenceFetch;
use crate::molecule::fragment::{Fragment, Strand};
use crate::molecule::molecule::Molecule;
use crate::molecule::{CutSite, IdentityModel, Validity};

/// Ligation-motif assay.
///
/// The cut site is the fragment's directional 5' boundary: the span start on
/// the forward strand, the last spanned base on the reverse strand. Validity
/// needs nothing beyond a resolvable site; no reference is consulted.
pub struct LigationAssay;

impl IdentityModel for LigationAssay {
    fn cut_site(&self, fragment: &Fragment) -> Option<CutSite> {
        let pos = match fragment.strand {
            Strand::Forward => fragment.start,
            Strand::Reverse => fragment.end.checked_sub(1)?,
        };

        Some(CutSite {
            contig: fragment.contig.clone(),
            pos,
            strand: fragment.strand,
        })
    }

    fn is_valid(
        &self,
        _molecule: &Molecule,
        _reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Validity> {
        // Grouping already requires a resolved cut site
        Ok(Validity::Valid)
    }

    fn compute_tags(
        &self,
        molecule: &Molecule,
        _reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Vec<(Tag, Value)>> {
        let mut tags = Vec::new();

        if let Some(motif) = molecule.consensus_ligation_motif() {
            tags.push((Tag::new(b'R', b'Z'), Value::String(motif.into())));
        }

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::test_support::single_record;

    fn fragment(pos: u64, len: usize, reverse: bool, motif: Option<&str>) -> Fragment {
        let record = single_record("r", pos, len, reverse, Some("AAAA"), motif);
        Fragment::from_records(vec![record], "chr1").unwrap()
    }

    #[test]
    fn test_forward_cut_site_is_span_start() {
        let site = LigationAssay.cut_site(&fragment(100, 60, false, None)).unwrap();
        assert_eq!(site.pos, 100);
        assert_eq!(site.strand, Strand::Forward);
    }

    #[test]
    fn test_reverse_cut_site_is_last_base() {
        let site = LigationAssay.cut_site(&fragment(100, 60, true, None)).unwrap();
        assert_eq!(site.pos, 159);
        assert_eq!(site.strand, Strand::Reverse);
    }

    #[test]
    fn test_motif_tag_written_when_observed() {
        let frag = fragment(100, 60, false, Some("NA"));
        let site = LigationAssay.cut_site(&frag).unwrap();
        let molecule = Molecule::new(frag, site);

        let tags = LigationAssay.compute_tags(&molecule, None).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].0, Tag::new(b'R', b'Z'));
    }

    #[test]
    fn test_no_motif_tag_without_observations() {
        let frag = fragment(100, 60, false, None);
        let site = LigationAssay.cut_site(&frag).unwrap();
        let molecule = Molecule::new(frag, site);

        let tags = LigationAssay.compute_tags(&molecule, None).unwrap();
        assert!(tags.is_empty());
    }
}
