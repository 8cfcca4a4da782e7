//! Command line interface.

pub mod build;
pub mod extract;
pub mod info;
pub mod limits;
pub mod run;
pub mod timesteps;
pub mod utils;

#[cfg(feature = "synthesis")]
pub mod create_probe;
