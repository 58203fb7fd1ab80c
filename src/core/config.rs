use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("A reference FASTA is required when the cut site must be mapped")]
    ReferenceRequiredForMappedSite,

    #[error("A reference FASTA is required to count undigested sites")]
    ReferenceRequiredForUndigestedSites,

    #[error("Recognition sequence must be 4 bases of ACGT, got '{0}'")]
    InvalidRecognitionSequence(String),

    #[error("Bin size must be positive")]
    ZeroBinSize,
}

/// The biological assay variant driving molecule identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssayVariant {
    /// Ligation-motif assay: cut site at the directional 5' boundary,
    /// molecule tagged with the consensus ligation motif.
    Ligation,
    /// Restriction-site assay: cut site at the recognition sequence,
    /// optionally validated against the reference.
    Restriction,
}

/// Run configuration consumed by the planner, workers, and merger.
#[derive(Debug, Clone)]
pub struct TagConfig {
    /// Width of each processing bin in bp.
    pub bin_size: u64,
    /// Maximum fragment length; also the fetch-window widening.
    pub fragment_length: u64,
    /// Per-bin wall-clock budget.
    pub bin_timeout: Duration,
    /// Reads below this mapping quality are discarded before grouping.
    pub min_mapping_quality: u8,
    /// Job outputs merged per intermediate file.
    pub merge_chunk_size: usize,
    /// Consecutive bins processed per pool job.
    pub job_chunk_size: usize,
    /// Worker threads; 0 means all available cores.
    pub workers: usize,
    pub assay: AssayVariant,
    /// Reject restriction molecules whose cut site does not carry the
    /// recognition sequence in the reference.
    pub site_must_be_mapped: bool,
    /// Fail at startup if undigested-site counting is requested without a
    /// reference, instead of silently omitting the tag.
    pub count_undigested_sites: bool,
    /// Recognition sequence for the restriction assay.
    pub recognition_sequence: Vec<u8>,
    /// UMI mismatch tolerance when joining fragments into a molecule.
    pub umi_hamming_distance: usize,
    /// Maximum fragments associated to one molecule.
    pub max_fragments_per_molecule: usize,
    /// Optional indexed reference FASTA.
    pub reference: Option<PathBuf>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            bin_size: 5_000_000,
            fragment_length: 500,
            bin_timeout: Duration::from_secs(900),
            min_mapping_quality: 40,
            merge_chunk_size: 300,
            job_chunk_size: 50,
            workers: 0,
            assay: AssayVariant::Ligation,
            site_must_be_mapped: false,
            count_undigested_sites: false,
            recognition_sequence: b"CATG".to_vec(),
            umi_hamming_distance: 1,
            max_fragments_per_molecule: 1,
            reference: None,
        }
    }
}

impl TagConfig {
    /// Validate the configuration before any job is scheduled.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for contradictory settings; these are fatal
    /// and must surface before the pool starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bin_size == 0 {
            return Err(ConfigError::ZeroBinSize);
        }

        if self.site_must_be_mapped && self.reference.is_none() {
            return Err(ConfigError::ReferenceRequiredForMappedSite);
        }

        if self.count_undigested_sites && self.reference.is_none() {
            return Err(ConfigError::ReferenceRequiredForUndigestedSites);
        }

        if self.recognition_sequence.len() != 4
            || !self
                .recognition_sequence
                .iter()
                .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T'))
        {
            return Err(ConfigError::InvalidRecognitionSequence(
                String::from_utf8_lossy(&self.recognition_sequence).into_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TagConfig::default().validate().is_ok());
    }

    #[test]
    fn test_mapped_site_requires_reference() {
        let config = TagConfig {
            site_must_be_mapped: true,
            ..TagConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReferenceRequiredForMappedSite)
        ));
    }

    #[test]
    fn test_undigested_sites_require_reference() {
        let config = TagConfig {
            count_undigested_sites: true,
            ..TagConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReferenceRequiredForUndigestedSites)
        ));
    }

    #[test]
    fn test_recognition_sequence_must_be_four_bases() {
        let config = TagConfig {
            recognition_sequence: b"CATGG".to_vec(),
            ..TagConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRecognitionSequence(_))
        ));
    }
}
