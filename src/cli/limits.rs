//! Command line interface for printing the plotting limits of probe data.

use super::utils;
use crate::{exit_on_error, probe::ProbeDiagnostic};
use clap::{Arg, ArgMatches, Command};

/// Builds a representation of the `limits` command line subcommand.
pub fn create_limits_subcommand() -> Command<'static> {
    Command::new("limits")
        .about("Print the plotting limits along each visible axis of the probe data")
        .arg(utils::create_input_dir_argument())
        .arg(utils::create_probe_argument(true))
        .args(utils::create_selection_arguments())
        .arg(utils::create_endianness_argument())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages related to ordering"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Show progress bar for ordering (implies `verbose`)"),
        )
}

/// Runs the actions for the `limits` subcommand using the given arguments.
pub fn run_limits_subcommand(arguments: &ArgMatches) {
    let verbosity = utils::parse_verbosity(arguments, true);
    let store = utils::open_probe_from_arguments(arguments, &verbosity);
    let field_expression = arguments
        .value_of("field")
        .expect("No value for required argument");
    let config = utils::parse_probe_config(arguments);

    let diagnostic = exit_on_error!(
        ProbeDiagnostic::new(store, field_expression, config, verbosity),
        "Error: Could not set up probe diagnostic: {}"
    );
    let limits = exit_on_error!(diagnostic.limits(), "Error: Could not compute limits: {}");
    for (axis, [lower, upper]) in diagnostic.selection().visible_axes().iter().zip(limits) {
        println!("{} {} {} {}", axis.label(), lower, upper, axis.units());
    }
}
