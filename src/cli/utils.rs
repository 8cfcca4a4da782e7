//! Utilities for creating the command line interface.

use crate::{
    exit_on_error, exit_on_false, exit_on_none,
    io::{
        probe::{self, ProbeStore},
        Endianness, Verbosity,
    },
    num::BFloat,
    probe::{ordering::DEFAULT_CHUNK_SIZE, range::RangeRequest, ProbeConfig, TimestepSelection},
};
use clap::{Arg, ArgMatches};
use indicatif::ProgressStyle;
use lazy_static::lazy_static;
use std::{collections::BTreeMap, path::PathBuf, str::FromStr};

lazy_static! {
    static ref DEFAULT_PROGRESS_STYLE: ProgressStyle =
        ProgressStyle::default_bar().template("Progress: {bar:40}  {percent}% | ETA: {eta}");
}

pub fn parse_value_string<T>(argument_name: &str, value_string: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    exit_on_error!(
        value_string.parse(),
        "Error: Could not parse value for {0}: {1}",
        argument_name
    )
}

fn parse_value_strings<'a, 'b, T, I>(argument_name: &'a str, value_strings: I) -> Vec<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
    I: Iterator<Item = &'b str>,
{
    value_strings
        .filter_map(|value_string| {
            if value_string.is_empty() {
                None
            } else {
                Some(parse_value_string(argument_name, value_string))
            }
        })
        .collect()
}

fn verify_finite_float_value<F: BFloat>(argument_name: &str, value: F) {
    exit_on_false!(value.is_finite(), "Error: {} must be finite", argument_name);
}

pub fn get_value_from_required_parseable_argument<T>(
    arguments: &ArgMatches,
    argument_name: &str,
) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    parse_value_string(
        argument_name,
        exit_on_none!(
            arguments.value_of(argument_name),
            "Error: Argument `{}` not provided",
            argument_name
        ),
    )
}

pub fn get_value_from_parseable_argument_with_default<T>(
    arguments: &ArgMatches,
    argument_name: &str,
    default_value: T,
) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    arguments
        .value_of(argument_name)
        .map(|value_string| parse_value_string(argument_name, value_string))
        .unwrap_or(default_value)
}

pub fn get_values_from_parseable_argument<T>(
    arguments: &ArgMatches,
    argument_name: &str,
) -> Option<Vec<T>>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    arguments
        .values_of(argument_name)
        .map(|values| parse_value_strings(argument_name, values))
}

pub fn get_finite_float_values_from_required_parseable_argument<F>(
    arguments: &ArgMatches,
    argument_name: &str,
) -> Vec<F>
where
    F: BFloat + FromStr,
    <F as FromStr>::Err: std::fmt::Display,
{
    let values = exit_on_none!(
        get_values_from_parseable_argument(arguments, argument_name),
        "Error: Argument `{}` not provided",
        argument_name
    );
    values
        .iter()
        .for_each(|&value| verify_finite_float_value(argument_name, value));
    values
}

pub fn get_path_from_required_argument(arguments: &ArgMatches, argument_name: &str) -> PathBuf {
    exit_on_error!(
        PathBuf::from_str(exit_on_none!(
            arguments.value_of(argument_name),
            "Error: Argument `{}` not provided",
            argument_name
        )),
        "Error: Could not interpret path for {0}: {1}",
        argument_name
    )
}

pub fn parse_verbosity(arguments: &ArgMatches, support_progress: bool) -> Verbosity {
    if support_progress && arguments.is_present("progress") {
        Verbosity::Progress(DEFAULT_PROGRESS_STYLE.clone())
    } else if arguments.is_present("verbose") {
        Verbosity::Messages
    } else {
        Verbosity::Quiet
    }
}

pub fn parse_endianness(arguments: &ArgMatches) -> Endianness {
    let name = arguments.value_of("endianness").unwrap_or("native");
    exit_on_none!(
        Endianness::from_name(name),
        "Error: Invalid endianness {}",
        name
    )
}

/// Parses requests of the form `axis=REQUEST` given for the argument with
/// the given name into a map from axis label to range request.
pub fn parse_range_requests(
    arguments: &ArgMatches,
    argument_name: &str,
) -> BTreeMap<String, RangeRequest> {
    let mut requests = BTreeMap::new();
    for value_string in arguments.values_of(argument_name).into_iter().flatten() {
        let (label, request) = exit_on_none!(
            value_string.split_once('='),
            "Error: Invalid value {} for {}: expected AXIS=RANGE",
            value_string,
            argument_name
        );
        let label = label.trim().to_string();
        exit_on_false!(
            !requests.contains_key(&label),
            "Error: Multiple values for {} given for {}",
            argument_name,
            label
        );
        requests.insert(label, parse_value_string(argument_name, request));
    }
    requests
}

/// Creates the probe configuration from the subset, average, timestep and
/// chunk size arguments.
pub fn parse_probe_config(arguments: &ArgMatches) -> ProbeConfig {
    let timesteps = get_value_from_parseable_argument_with_default(
        arguments,
        "timesteps",
        TimestepSelection::All,
    );
    let chunk_size =
        get_value_from_parseable_argument_with_default(arguments, "chunk-size", DEFAULT_CHUNK_SIZE);
    let config = ProbeConfig {
        subset: parse_range_requests(arguments, "subset"),
        average: parse_range_requests(arguments, "average"),
        timesteps,
        chunk_size,
        box_extents: get_values_from_parseable_argument(arguments, "box-extents"),
    };
    exit_on_error!(config.validate(), "Error: Invalid probe configuration: {}");
    config
}

/// Opens the probe selected by the `probe` argument in the directory given
/// by the `input-dir` argument.
pub fn open_probe_from_arguments(
    arguments: &ArgMatches,
    verbosity: &Verbosity,
) -> Box<dyn ProbeStore> {
    let input_dir = get_path_from_required_argument(arguments, "input-dir");
    let probe_number = arguments
        .value_of("probe")
        .map(|value_string| parse_value_string::<u32>("probe", value_string));
    exit_on_error!(
        probe::open_probe_in_directory(
            input_dir,
            probe_number,
            parse_endianness(arguments),
            verbosity,
        ),
        "Error: Could not open probe: {}"
    )
}

/// Creates the argument for the directory holding the probe files.
pub fn create_input_dir_argument() -> Arg<'static> {
    Arg::new("input-dir")
        .value_name("INPUT_DIR")
        .help("Path to the directory containing the probe files")
        .required(true)
        .takes_value(true)
}

/// Creates the argument for the number of the probe to use.
pub fn create_probe_argument(required: bool) -> Arg<'static> {
    Arg::new("probe")
        .short('p')
        .long("probe")
        .require_equals(true)
        .value_name("NUMBER")
        .help("Number of the probe to use")
        .required(required)
        .takes_value(true)
}

/// Creates the argument for the byte order of native binary probe files.
pub fn create_endianness_argument() -> Arg<'static> {
    Arg::new("endianness")
        .short('e')
        .long("endianness")
        .require_equals(true)
        .value_name("ENDIANNESS")
        .help("Byte order to assume for binary probe files that do not specify one")
        .takes_value(true)
        .possible_values(&["little", "big", "native"])
        .default_value("native")
}

/// Creates the arguments specifying the extracted quantity and the selection
/// of grid points.
pub fn create_selection_arguments() -> Vec<Arg<'static>> {
    vec![
        Arg::new("field")
            .short('f')
            .long("field")
            .require_equals(true)
            .value_name("EXPRESSION")
            .help(
                "Quantity to extract, given as an arithmetic expression of recorded fields\n\
                 (e.g. `Ex`, `Bx*Bx + By*By`)",
            )
            .required(true)
            .takes_value(true),
        Arg::new("subset")
            .short('s')
            .long("subset")
            .require_equals(true)
            .value_name("AXIS=RANGE")
            .help(
                "Restrict the given axis to a range, given as `all`, a distance `d`,\n\
                 distances `d0,d1[,step]` or indices `#start:stop[:step]`",
            )
            .takes_value(true)
            .multiple_occurrences(true),
        Arg::new("average")
            .short('a')
            .long("average")
            .require_equals(true)
            .value_name("AXIS=RANGE")
            .help(
                "Average over a range along the given axis, given as `all`, a distance `d`,\n\
                 distances `d0,d1` or indices `#start:stop`",
            )
            .takes_value(true)
            .multiple_occurrences(true),
        Arg::new("timesteps")
            .short('t')
            .long("timesteps")
            .require_equals(true)
            .value_name("SELECTION")
            .help(
                "Timesteps to use, given as `all`, the nearest to `t`, the range `t0,t1`\n\
                 or list positions `#start:stop` [default: all]",
            )
            .takes_value(true),
        Arg::new("chunk-size")
            .long("chunk-size")
            .require_equals(true)
            .value_name("NUMBER")
            .help("Maximum number of probe points to read at once [default: 10000000]")
            .takes_value(true),
        Arg::new("box-extents")
            .long("box-extents")
            .require_equals(true)
            .use_value_delimiter(true)
            .require_value_delimiter(true)
            .value_name("EXTENTS")
            .help(
                "Comma-separated extents of the simulation box, used to clamp\n\
                 plane coordinates in 2D simulations",
            )
            .takes_value(true)
            .multiple_values(true),
    ]
}

#[cfg(test)]
mod tests {

    use super::*;
    use clap::Command;

    fn matches(args: &[&str]) -> ArgMatches {
        Command::new("test")
            .no_binary_name(true)
            .args(create_selection_arguments())
            .arg(create_endianness_argument())
            .get_matches_from(args)
    }

    #[test]
    fn probe_config_is_parsed_from_arguments() {
        let arguments = matches(&[
            "--field=Ex",
            "--subset=axis1=0.5,1.5",
            "--subset=axis3=#0:4:2",
            "--average=axis2=all",
            "--timesteps=10,20",
            "--chunk-size=100",
            "--box-extents=4,2.5,1",
        ]);
        let config = parse_probe_config(&arguments);
        assert_eq!(config.subset.len(), 2);
        assert_eq!(
            config.subset["axis3"],
            RangeRequest::Indices {
                start: 0,
                stop: 4,
                step: 2
            }
        );
        assert_eq!(config.average["axis2"], RangeRequest::All);
        assert_eq!(
            config.timesteps,
            TimestepSelection::Between { min: 10, max: 20 }
        );
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.box_extents, Some(vec![4.0, 2.5, 1.0]));
        assert_eq!(parse_endianness(&arguments), Endianness::Native);
    }

    #[test]
    fn defaults_are_used_for_missing_arguments() {
        let config = parse_probe_config(&matches(&["--field=Ex"]));
        assert_eq!(config, ProbeConfig::default());
    }
}
