//! Unsplit corner-transport-upwind (CTU) integrator for the ideal MHD
//! equations on a uniform Cartesian block, with a constrained-transport
//! update of the face-centered magnetic field that keeps the discrete
//! divergence of B at round-off.
//!
//! The crate is organized around one mutable [`grid::Grid`] block and one
//! [`integrate::Integrator`] holding all per-step scratch storage. A single
//! call to [`integrate::Integrator::step`] advances the block by `grid.dt`.

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

pub mod boundary;
pub mod consts;
pub mod diagnostics;
pub mod eos;
pub mod grid;
pub mod integrate;
pub mod output;
pub mod reconstruct;
pub mod riemann;
pub mod settings;
pub mod state;

#[cfg(test)]
pub mod test_helper;

/// Floating point type used throughout the crate.
pub type Float = f64;

/// Number of passively advected scalar fields carried per cell.
pub const NSCALARS: usize = 2;

/// Ghost layers around the interior block. The predictor needs `nghost`
/// cells along the sweep and two transverse layers; four satisfies every
/// stage of the unsplit update.
pub const NGHOST: usize = 4;
