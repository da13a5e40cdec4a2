//! An analytical placer for heterogeneous FPGA-like devices.
//!
//! Two stages iterate: a quadratic bound-to-bound (B2B) net-model solve
//! ([`solve`], backed by the sparse conjugate-gradient solver in
//! [`linalg`]) and a recursive-bipartition legalization
//! ([`legalize`]), driven by [`placer::PlacementSession`] with a growing
//! anchor force pulling the real-valued solve toward the last legal
//! placement. Netlist parsing, architecture ingestion, routing, and output
//! writing are all out of scope — callers supply a [`device::Device`] and a
//! slice of [`netlist::Net`] and get a committed legal placement back.

pub type E = f64;

pub mod blocks;
pub mod callback;
pub mod cost;
pub mod device;
pub mod error;
pub mod legalize;
pub mod linalg;
pub mod netlist;
pub mod options;
pub mod placer;
pub mod random;
pub mod solve;

#[cfg(test)]
mod tests;
