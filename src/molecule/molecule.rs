use noodles::sam::alignment::RecordBuf;

use crate::molecule::fragment::{Fragment, Strand};
use crate::molecule::CutSite;

/// A cluster of fragments judged to originate from one original DNA molecule.
///
/// Molecules are immutable after the grouper finalizes them, except for tag
/// attachment on their constituent records at write time.
#[derive(Debug, Clone)]
pub struct Molecule {
    fragments: Vec<Fragment>,
    pub cut_site: CutSite,
    pub span_start: u64,
    pub span_end: u64,
    pub umi: Vec<u8>,
}

impl Molecule {
    pub fn new(fragment: Fragment, cut_site: CutSite) -> Self {
        Self {
            span_start: fragment.start,
            span_end: fragment.end,
            umi: fragment.umi.clone(),
            fragments: vec![fragment],
            cut_site,
        }
    }

    /// Associate another fragment sharing this molecule's cut site.
    pub fn push(&mut self, fragment: Fragment) {
        self.span_start = self.span_start.min(fragment.start);
        self.span_end = self.span_end.max(fragment.end);
        self.fragments.push(fragment);
    }

    pub fn contig(&self) -> &str {
        &self.cut_site.contig
    }

    pub fn strand(&self) -> Strand {
        self.cut_site.strand
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn into_records(self) -> Vec<RecordBuf> {
        self.fragments
            .into_iter()
            .flat_map(Fragment::into_records)
            .collect()
    }

    /// Plurality vote over the fragments' ligation motifs.
    ///
    /// Ties break to the first-observed motif: counts are accumulated in
    /// observation order and a later motif must strictly exceed the current
    /// winner to displace it. Returns `None` with zero observations.
    pub fn consensus_ligation_motif(&self) -> Option<&str> {
        let mut counts: Vec<(&str, usize)> = Vec::new();

        for fragment in &self.fragments {
            let Some(motif) = fragment.ligation_motif.as_deref() else {
                continue;
            };
            match counts.iter_mut().find(|(m, _)| *m == motif) {
                Some((_, n)) => *n += 1,
                None => counts.push((motif, 1)),
            }
        }

        // max_by_key would return the last maximum; keep the first instead
        let mut best: Option<(&str, usize)> = None;
        for &(motif, count) in &counts {
            if best.map_or(true, |(_, current)| count > current) {
                best = Some((motif, count));
            }
        }

        best.map(|(motif, _)| motif)
    }
}
