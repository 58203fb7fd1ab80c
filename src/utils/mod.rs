//! Generic sequence utilities shared across the crate.

pub mod seq;
