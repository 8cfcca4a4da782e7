//! Command line interface for printing information about probes.

use super::utils;
use crate::{
    exit_on_error,
    io::{probe, Verbosity},
};
use clap::{Arg, ArgMatches, Command};

/// Builds a representation of the `info` command line subcommand.
pub fn create_info_subcommand() -> Command<'static> {
    Command::new("info")
        .about("Print information about the probes in a directory")
        .arg(utils::create_input_dir_argument())
        .arg(
            utils::create_probe_argument(false)
                .help("Number of the probe to print information about [default: all]"),
        )
        .arg(utils::create_endianness_argument())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages related to reading"),
        )
}

/// Runs the actions for the `info` subcommand using the given arguments.
pub fn run_info_subcommand(arguments: &ArgMatches) {
    let verbosity = utils::parse_verbosity(arguments, false);

    if arguments.is_present("probe") {
        let store = utils::open_probe_from_arguments(arguments, &verbosity);
        println!("{}", store.metadata());
        println!("\tpoints = {}", store.metadata().n_points());
        println!("\ttimesteps = {}", store.available_timesteps().len());
        return;
    }

    let input_dir = utils::get_path_from_required_argument(arguments, "input-dir");
    let endianness = utils::parse_endianness(arguments);
    let probe_files = exit_on_error!(
        probe::find_probe_files(&input_dir),
        "Error: Could not search for probes: {}"
    );
    if probe_files.is_empty() {
        println!("No probes found in {}", input_dir.to_string_lossy());
    }
    for (probe_number, path) in probe_files {
        match probe::open_probe_file(&path, endianness, &Verbosity::Quiet) {
            Ok(store) => println!("{}", store.metadata()),
            Err(err) => eprintln!(
                "Warning: Could not read probe #{} from {}: {}",
                probe_number,
                path.to_string_lossy(),
                err
            ),
        }
    }
}
