//! Error taxonomy for the placer.
//!
//! Mirrors the shape of the teacher crate's own error enums: small
//! `derive_more` `Display`/`Error` enums per failure domain, one per call
//! site that needs to propagate it.

use derive_more::{Display, Error};

/// Invariant violations discovered while building a [`crate::blocks::BlockRegistry`].
/// Fatal at session start.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[display("type_start[0] must equal num_io ({num_io}), found {found}")]
    TypeStartNotAtIo { num_io: usize, found: usize },
    #[display("type_start must be monotonically non-decreasing")]
    TypeStartNotMonotonic,
    #[display("type_start must declare at least one movable type")]
    NoMovableTypes,
    #[display("device has no block type registered for category {category}")]
    MissingBlockType { category: String },
}

/// A movable block could not be mapped to any legal site. Fatal; bubbles up
/// to the driver.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum PlacementIntegrityError {
    #[display("block {block} of type \"{type_name}\" has no legal site available")]
    NoLegalSite { block: usize, type_name: String },
    #[display("site ({x}, {y}) is already occupied on commit")]
    SiteOccupiedOnCommit { x: i32, y: i32 },
}

/// Programmer errors in the assembled linear system: non-symmetric or
/// non-finite. The offending solve is aborted and the iteration is skipped;
/// this is not fatal to the session.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq)]
pub enum SolverDiagnostic {
    #[display("sparse matrix is not symmetric")]
    NotSymmetric,
    #[display("sparse matrix contains a non-finite entry")]
    NonFinite,
}

/// Conjugate gradient exceeded its iteration cap without reaching the
/// requested tolerance. Non-fatal: the caller uses the best iterate and
/// continues the outer loop.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq)]
#[display("conjugate gradient did not converge within {iterations} iterations (relative residual {relative_residual:e})")]
pub struct NumericStall {
    pub iterations: usize,
    pub relative_residual: f64,
}
