//! Functions for running the command line program.

use super::{
    build, extract::run_extract_subcommand, info::run_info_subcommand,
    limits::run_limits_subcommand, timesteps::run_timesteps_subcommand,
};
use clap::ArgMatches;
use std::time::Instant;

/// Runs the `probestaff` command line program.
pub fn run() {
    run_with_args(build::build().get_matches());
}

/// Runs the `probestaff` command line program with the given parsed arguments.
pub fn run_with_args(arguments: ArgMatches) {
    let start_instant = Instant::now();

    match arguments.subcommand() {
        Some(("info", info_arguments)) => run_info_subcommand(info_arguments),
        Some(("timesteps", timesteps_arguments)) => run_timesteps_subcommand(timesteps_arguments),
        Some(("limits", limits_arguments)) => run_limits_subcommand(limits_arguments),
        Some(("extract", extract_arguments)) => run_extract_subcommand(extract_arguments),
        #[cfg(feature = "synthesis")]
        Some(("create_probe", create_probe_arguments)) => {
            super::create_probe::run_create_probe_subcommand(create_probe_arguments)
        }
        _ => unreachable!("Subcommand is required"),
    }

    if arguments.is_present("timing") {
        println!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}
