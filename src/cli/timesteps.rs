//! Command line interface for listing the timesteps of a probe.

use super::utils;
use clap::{Arg, ArgMatches, Command};

/// Builds a representation of the `timesteps` command line subcommand.
pub fn create_timesteps_subcommand() -> Command<'static> {
    Command::new("timesteps")
        .about("Print the timesteps available for a probe, one per line")
        .arg(utils::create_input_dir_argument())
        .arg(utils::create_probe_argument(true))
        .arg(utils::create_endianness_argument())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages related to reading"),
        )
}

/// Runs the actions for the `timesteps` subcommand using the given arguments.
pub fn run_timesteps_subcommand(arguments: &ArgMatches) {
    let verbosity = utils::parse_verbosity(arguments, false);
    let store = utils::open_probe_from_arguments(arguments, &verbosity);
    for timestep in store.available_timesteps() {
        println!("{}", timestep);
    }
}
