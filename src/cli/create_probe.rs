//! Command line interface for creating synthetic probes.

use super::utils;
use crate::{
    exit_on_error, exit_on_false,
    io::{
        fco,
        probe::{
            native::{self, DEFAULT_WRITE_CHUNK_SIZE},
            MAX_PROBE_AXES,
        },
    },
    probe::synthesis::{self, SyntheticProbeConfig},
};
use clap::{Arg, ArgMatches, Command};

fn create_list_argument(name: &'static str, value_name: &'static str) -> Arg<'static> {
    Arg::new(name)
        .long(name)
        .require_equals(true)
        .use_value_delimiter(true)
        .require_value_delimiter(true)
        .value_name(value_name)
        .takes_value(true)
        .multiple_values(true)
}

/// Builds a representation of the `create_probe` command line subcommand.
pub fn create_create_probe_subcommand() -> Command<'static> {
    Command::new("create_probe")
        .about("Create a synthetic probe with points stored in random order")
        .long_about(
            "Create a synthetic probe with points stored in random order.\n\
             Each field has the value (f + 1)*(100*i + 10*j + k) + t at grid indices\n\
             (i, j, k) and timestep t, where f is the index of the field\n\
             (10*i + j for two axes and i for one axis).",
        )
        .arg(
            Arg::new("output-dir")
                .value_name("OUTPUT_DIR")
                .help("Path to the directory where the probe files should be created")
                .required(true)
                .takes_value(true),
        )
        .arg(utils::create_probe_argument(true).help("Number identifying the new probe"))
        .arg(
            create_list_argument("shape", "NUMBERS")
                .help("Number of grid points along each probe axis (comma-separated)")
                .required(true),
        )
        .arg(
            create_list_argument("p0", "COORDS")
                .help("Position of the first grid point (comma-separated)")
                .required(true),
        )
        .arg(
            create_list_argument("p1", "COORDS")
                .help("Position of the last grid point along the first axis (comma-separated)"),
        )
        .arg(
            create_list_argument("p2", "COORDS")
                .help("Position of the last grid point along the second axis (comma-separated)"),
        )
        .arg(
            create_list_argument("p3", "COORDS")
                .help("Position of the last grid point along the third axis (comma-separated)"),
        )
        .arg(
            create_list_argument("timesteps", "NUMBERS")
                .help("Timesteps to record values for (comma-separated) [default: 0]"),
        )
        .arg(
            create_list_argument("fields", "NAMES")
                .help("Names of the recorded fields (comma-separated) [default: Ex,Bz]"),
        )
        .arg(
            Arg::new("time-integral")
                .long("time-integral")
                .help("Mark the recorded values as integrated over time"),
        )
        .arg(
            Arg::new("patches-per-axis")
                .long("patches-per-axis")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Number of patches to store separately along each axis")
                .takes_value(true)
                .default_value("2"),
        )
        .arg(
            Arg::new("jitter")
                .long("jitter")
                .require_equals(true)
                .value_name("FRACTION")
                .help("Largest random offset of a point from its grid position, in grid spacings")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Seed for the random number generator [default: random]")
                .takes_value(true),
        )
        .arg(utils::create_endianness_argument())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages related to probe creation"),
        )
}

/// Runs the actions for the `create_probe` subcommand using the given arguments.
pub fn run_create_probe_subcommand(arguments: &ArgMatches) {
    let verbosity = utils::parse_verbosity(arguments, false);
    let output_dir = utils::get_path_from_required_argument(arguments, "output-dir");
    let endianness = utils::parse_endianness(arguments);

    let defaults = SyntheticProbeConfig::default();
    let shape: Vec<usize> = utils::get_values_from_parseable_argument(arguments, "shape")
        .expect("No value for required argument");
    let reference_point: Vec<fco> =
        utils::get_finite_float_values_from_required_parseable_argument(arguments, "p0");

    exit_on_false!(
        shape.len() <= MAX_PROBE_AXES,
        "Error: At most {} probe axes are supported",
        MAX_PROBE_AXES
    );
    let end_points: Vec<Vec<fco>> = ["p1", "p2", "p3"][..shape.len()]
        .iter()
        .map(|&name| {
            exit_on_false!(
                arguments.is_present(name),
                "Error: Argument `{}` required for a probe with {} axes",
                name,
                shape.len()
            );
            utils::get_finite_float_values_from_required_parseable_argument(arguments, name)
        })
        .collect();

    let config = SyntheticProbeConfig {
        probe_number: utils::get_value_from_required_parseable_argument(arguments, "probe"),
        shape,
        reference_point,
        end_points,
        field_names: utils::get_values_from_parseable_argument(arguments, "fields")
            .unwrap_or(defaults.field_names),
        timesteps: utils::get_values_from_parseable_argument(arguments, "timesteps")
            .unwrap_or(defaults.timesteps),
        is_time_integral: arguments.is_present("time-integral"),
        patches_per_axis: utils::get_value_from_required_parseable_argument(
            arguments,
            "patches-per-axis",
        ),
        position_jitter: utils::get_value_from_required_parseable_argument(arguments, "jitter"),
        seed: arguments
            .value_of("seed")
            .map(|value_string| utils::parse_value_string("seed", value_string)),
    };

    let store = exit_on_error!(
        synthesis::create_synthetic_probe(&config, &verbosity),
        "Error: Could not create synthetic probe: {}"
    );

    let param_file_path = output_dir.join(format!("Probes{}.probe", config.probe_number));
    exit_on_error!(
        native::write_native_probe(
            &store,
            &param_file_path,
            endianness,
            DEFAULT_WRITE_CHUNK_SIZE,
            &verbosity
        ),
        "Error: Could not write probe files: {}"
    );
    if verbosity.print_messages() {
        println!("Wrote {}", param_file_path.to_string_lossy());
    }
}
