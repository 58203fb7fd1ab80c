//! Molecule identity: cut-site resolution, validity, and derived tags.
//!
//! The assay variant decides what a "cut site" is and whether a molecule is
//! valid. Each variant implements [`IdentityModel`]; optional capabilities
//! are layered as wrappers over a base variant ([`BaseTags`] adds the generic
//! molecule tags) rather than mixed in.
//!
//! Tags written to every constituent record of an emitted molecule:
//!
//! | Tag | Type | Meaning                                   |
//! |-----|------|-------------------------------------------|
//! | DS  | i32  | Cut site position (0-based)               |
//! | af  | i32  | Associated fragment count                 |
//! | RZ  | Z    | Consensus ligation motif (ligation assay) |
//! | Us  | i32  | Undigested site count (restriction assay) |

pub mod fragment;
pub mod grouper;
pub mod ligation;
#[allow(clippy::module_inception)]
pub mod molecule;
pub mod restriction;

use std::io;

use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

use crate::core::config::{AssayVariant, TagConfig};
use crate::io::reference::ReferenceFetch;

pub use fragment::{Fragment, Strand};
pub use grouper::MoleculeGrouper;
pub use ligation::LigationAssay;
pub use molecule::Molecule;
pub use restriction::RestrictionAssay;

/// The directional genomic coordinate identifying a molecule's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutSite {
    pub contig: String,
    /// 0-based position.
    pub pos: u64,
    pub strand: Strand,
}

/// Why a molecule was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoCutSite,
    RecognitionSequenceMismatch,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCutSite => write!(f, "no cut site found"),
            Self::RecognitionSequenceMismatch => write!(f, "recognition sequence mismatch"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(RejectReason),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Per-assay-variant molecule identity.
///
/// A reference accessor is passed by the caller when one is configured;
/// implementations must degrade gracefully without one except where the
/// configuration already promised a reference.
pub trait IdentityModel: Send + Sync {
    /// Resolve a fragment's cut site, or `None` when it cannot be placed.
    fn cut_site(&self, fragment: &Fragment) -> Option<CutSite>;

    /// Decide molecule validity.
    ///
    /// # Errors
    ///
    /// Returns an IO error when a required reference fetch fails.
    fn is_valid(
        &self,
        molecule: &Molecule,
        reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Validity>;

    /// Compute the molecule-level tags to attach to every record.
    ///
    /// # Errors
    ///
    /// Returns an IO error when a reference fetch fails.
    fn compute_tags(
        &self,
        molecule: &Molecule,
        reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Vec<(Tag, Value)>>;
}

/// Decorator adding the generic molecule tags (`DS`, `af`) over any variant.
pub struct BaseTags<M>(pub M);

impl<M: IdentityModel> IdentityModel for BaseTags<M> {
    fn cut_site(&self, fragment: &Fragment) -> Option<CutSite> {
        self.0.cut_site(fragment)
    }

    fn is_valid(
        &self,
        molecule: &Molecule,
        reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Validity> {
        self.0.is_valid(molecule, reference)
    }

    fn compute_tags(
        &self,
        molecule: &Molecule,
        reference: Option<&mut dyn ReferenceFetch>,
    ) -> io::Result<Vec<(Tag, Value)>> {
        let mut tags = self.0.compute_tags(molecule, reference)?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        tags.push((Tag::new(b'D', b'S'), Value::from(molecule.cut_site.pos as i32)));
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        tags.push((
            Tag::new(b'a', b'f'),
            Value::from(molecule.fragment_count() as i32),
        ));

        Ok(tags)
    }
}

/// Build the identity model for the configured assay variant.
pub fn build_model(config: &TagConfig) -> Box<dyn IdentityModel> {
    match config.assay {
        AssayVariant::Ligation => Box::new(BaseTags(LigationAssay)),
        AssayVariant::Restriction => Box::new(BaseTags(RestrictionAssay::new(
            config.recognition_sequence.clone(),
            config.site_must_be_mapped,
        ))),
    }
}
