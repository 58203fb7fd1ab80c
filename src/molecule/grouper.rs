use std::collections::HashMap;

use noodles::sam::alignment::RecordBuf;

use crate::molecule::fragment::Fragment;
use crate::molecule::molecule::Molecule;
use crate::molecule::{CutSite, IdentityModel};
use crate::utils::seq::hamming_distance;

/// Outcome of grouping one fetch window's records.
#[derive(Debug)]
pub struct Grouped {
    /// Molecules ordered by cut site, then strand, then first observation.
    pub molecules: Vec<Molecule>,
    /// Fragments assembled from the input records.
    pub fragment_count: usize,
    /// Fragments dropped because no cut site could be resolved.
    pub dropped_no_site: usize,
}

/// Joins records into fragments and fragments into molecules.
///
/// Records are paired by read name, each name becoming one fragment. The
/// assay's identity model places every fragment's cut site; fragments that
/// share a site and strand are then clustered by UMI, where a fragment joins
/// an existing molecule when its UMI is within the configured mismatch
/// tolerance and the molecule still has capacity.
pub struct MoleculeGrouper<'a> {
    model: &'a dyn IdentityModel,
    umi_hamming_distance: usize,
    /// Fragment cap per molecule; zero means unbounded.
    max_fragments_per_molecule: usize,
}

impl<'a> MoleculeGrouper<'a> {
    pub fn new(
        model: &'a dyn IdentityModel,
        umi_hamming_distance: usize,
        max_fragments_per_molecule: usize,
    ) -> Self {
        Self {
            model,
            umi_hamming_distance,
            max_fragments_per_molecule,
        }
    }

    /// Group all records of one fetch window into molecules.
    pub fn group(&self, records: Vec<RecordBuf>, contig: &str) -> Grouped {
        let fragments = assemble_fragments(records, contig);
        let fragment_count = fragments.len();

        let mut placed: Vec<(CutSite, Fragment)> = Vec::with_capacity(fragment_count);
        let mut dropped_no_site = 0usize;

        for fragment in fragments {
            match self.model.cut_site(&fragment) {
                Some(site) => placed.push((site, fragment)),
                None => dropped_no_site += 1,
            }
        }

        // Stable: equal sites keep observation order for the UMI pass
        placed.sort_by(|(a, _), (b, _)| a.pos.cmp(&b.pos).then(a.strand.cmp(&b.strand)));

        let molecules = self.cluster(placed);

        Grouped {
            molecules,
            fragment_count,
            dropped_no_site,
        }
    }

    /// UMI-cluster site-sorted fragments into molecules.
    fn cluster(&self, placed: Vec<(CutSite, Fragment)>) -> Vec<Molecule> {
        let mut molecules: Vec<Molecule> = Vec::new();
        // First molecule index of the current (site, strand) run
        let mut run_start = 0;

        for (site, fragment) in placed {
            if let Some(last) = molecules.last() {
                if last.cut_site.pos != site.pos || last.cut_site.strand != site.strand {
                    run_start = molecules.len();
                }
            }

            let home = molecules[run_start..]
                .iter()
                .position(|molecule| {
                    self.has_capacity(molecule)
                        && hamming_distance(&molecule.umi, &fragment.umi)
                            <= self.umi_hamming_distance
                })
                .map(|offset| run_start + offset);

            match home {
                Some(i) => molecules[i].push(fragment),
                None => molecules.push(Molecule::new(fragment, site)),
            }
        }

        molecules
    }

    fn has_capacity(&self, molecule: &Molecule) -> bool {
        self.max_fragments_per_molecule == 0
            || molecule.fragment_count() < self.max_fragments_per_molecule
    }
}

/// Collapse records into per-read-name fragments, preserving the order in
/// which names were first seen. Nameless records each stand alone.
fn assemble_fragments(records: Vec<RecordBuf>, contig: &str) -> Vec<Fragment> {
    let mut by_name: Vec<Vec<RecordBuf>> = Vec::new();
    let mut index: HashMap<Vec<u8>, usize> = HashMap::new();

    for record in records {
        match record.name().map(|name| name.to_vec()) {
            Some(name) => {
                let slot = *index.entry(name).or_insert_with(|| {
                    by_name.push(Vec::new());
                    by_name.len() - 1
                });
                by_name[slot].push(record);
            }
            None => by_name.push(vec![record]),
        }
    }

    by_name
        .into_iter()
        .filter_map(|records| Fragment::from_records(records, contig))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::test_support::{paired_records, single_record};
    use crate::molecule::{LigationAssay, RestrictionAssay};

    fn ligation_grouper(distance: usize, max: usize) -> MoleculeGrouper<'static> {
        MoleculeGrouper::new(&LigationAssay, distance, max)
    }

    #[test]
    fn test_pairs_collapse_to_one_fragment() {
        let (r1, r2) = paired_records("p1", 100, 300, 60, "AAAA");
        let grouped = ligation_grouper(1, 0).group(vec![r1, r2], "chr1");

        assert_eq!(grouped.fragment_count, 1);
        assert_eq!(grouped.molecules.len(), 1);
        assert_eq!(grouped.molecules[0].fragments()[0].records().len(), 2);
    }

    #[test]
    fn test_same_site_same_umi_merges() {
        let a = single_record("a", 100, 60, false, Some("AAAA"), None);
        let b = single_record("b", 100, 80, false, Some("AAAA"), None);
        let grouped = ligation_grouper(1, 0).group(vec![a, b], "chr1");

        assert_eq!(grouped.molecules.len(), 1);
        assert_eq!(grouped.molecules[0].fragment_count(), 2);
        assert_eq!(grouped.molecules[0].span_end, 180);
    }

    #[test]
    fn test_umi_within_tolerance_merges() {
        let a = single_record("a", 100, 60, false, Some("AAAA"), None);
        let b = single_record("b", 100, 60, false, Some("AAAT"), None);
        let grouped = ligation_grouper(1, 0).group(vec![a, b], "chr1");
        assert_eq!(grouped.molecules.len(), 1);
    }

    #[test]
    fn test_umi_beyond_tolerance_splits() {
        let a = single_record("a", 100, 60, false, Some("AAAA"), None);
        let b = single_record("b", 100, 60, false, Some("AATT"), None);
        let grouped = ligation_grouper(1, 0).group(vec![a, b], "chr1");
        assert_eq!(grouped.molecules.len(), 2);
    }

    #[test]
    fn test_fragment_cap_starts_new_molecule() {
        let a = single_record("a", 100, 60, false, Some("AAAA"), None);
        let b = single_record("b", 100, 60, false, Some("AAAA"), None);
        let grouped = ligation_grouper(1, 1).group(vec![a, b], "chr1");

        assert_eq!(grouped.molecules.len(), 2);
        assert!(grouped.molecules.iter().all(|m| m.fragment_count() == 1));
    }

    #[test]
    fn test_distinct_sites_emit_in_position_order() {
        // Insert out of order; emission follows the cut site
        let late = single_record("late", 500, 60, false, Some("AAAA"), None);
        let early = single_record("early", 100, 60, false, Some("AAAA"), None);
        let grouped = ligation_grouper(1, 0).group(vec![late, early], "chr1");

        let sites: Vec<u64> = grouped.molecules.iter().map(|m| m.cut_site.pos).collect();
        assert_eq!(sites, vec![100, 500]);
    }

    #[test]
    fn test_opposite_strands_never_merge() {
        // Reverse cut site is end - 1 = 100 + 60 - 1; forward read placed there
        let reverse = single_record("r", 100, 60, true, Some("AAAA"), None);
        let forward = single_record("f", 159, 60, false, Some("AAAA"), None);
        let grouped = ligation_grouper(1, 0).group(vec![reverse, forward], "chr1");

        assert_eq!(grouped.molecules.len(), 2);
        assert!(grouped
            .molecules
            .iter()
            .all(|m| m.cut_site.pos == 159));
    }

    #[test]
    fn test_unplaceable_fragments_counted() {
        let model = RestrictionAssay::new(b"CATG".to_vec(), false);
        let grouper = MoleculeGrouper::new(&model, 1, 0);

        let short = single_record("s", 100, 3, false, Some("AAAA"), None);
        let ok = single_record("o", 100, 60, false, Some("AAAA"), None);
        let grouped = grouper.group(vec![short, ok], "chr1");

        assert_eq!(grouped.fragment_count, 2);
        assert_eq!(grouped.dropped_no_site, 1);
        assert_eq!(grouped.molecules.len(), 1);
    }
}
