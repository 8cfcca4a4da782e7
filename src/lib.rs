//! The `probestaff` crate reconstructs structured grid data from simulation
//! probe diagnostics whose points are stored in arbitrary order.
//!
//! A probe samples a set of fields on a regular 0D, 1D, 2D or 3D grid of
//! points embedded in the simulation domain. Because the simulation writes
//! the points in whatever order its subdomains own them, the stored order
//! generally does not match the grid. The [`probe`] module computes, once per
//! probe configuration, where every stored point belongs on the grid, and
//! uses that ordering to extract grid-shaped arrays for any timestep and any
//! arithmetic combination of the recorded fields.

pub mod error;
pub mod field;
pub mod geometry;
pub mod io;
pub mod num;
pub mod probe;

#[cfg(feature = "cli")]
pub mod cli;
