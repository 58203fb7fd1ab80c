//! Core data types for binned molecule tagging.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`GenomicBin`]: One unit of parallel work, a processing range plus a
//!   wider fetch window that safely captures boundary-spanning fragments
//! - [`BlacklistRegion`]: A contig interval excluded from bin generation
//! - [`TagConfig`], [`AssayVariant`]: The run configuration surface
//!
//! ## Coordinates
//!
//! All coordinates in this crate are 0-based half-open intervals (BED
//! convention). Conversion to 1-based positions happens only at the noodles
//! boundary in [`crate::io`].

pub mod bin;
pub mod blacklist;
pub mod config;

pub use bin::{plan_bins, GenomicBin};
pub use blacklist::BlacklistRegion;
pub use config::{AssayVariant, ConfigError, TagConfig};
