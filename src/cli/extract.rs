//! Command line interface for extracting grid-ordered probe data.

use super::utils;
use crate::{
    exit_on_error, exit_on_none, exit_with_error,
    io::utils as io_utils,
    probe::{ProbeData, ProbeDiagnostic},
};
use clap::{Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};

/// Format to write extracted data in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Npy,
    #[cfg(feature = "json")]
    Json,
    #[cfg(feature = "pickle")]
    Pickle,
}

impl OutputFormat {
    fn from_path(output_path: &Path) -> Self {
        match output_path
            .extension()
            .map(|extension| extension.to_string_lossy().to_string())
            .as_deref()
        {
            None | Some("npy") => Self::Npy,
            #[cfg(feature = "json")]
            Some("json") => Self::Json,
            #[cfg(feature = "pickle")]
            Some("pickle") => Self::Pickle,
            Some(extension) => exit_with_error!(
                "Error: Unsupported output format {}\n\
                 Supported extensions are: npy{}{}",
                extension,
                if cfg!(feature = "json") { ", json" } else { "" },
                if cfg!(feature = "pickle") { ", pickle" } else { "" }
            ),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Npy => "npy",
            #[cfg(feature = "json")]
            Self::Json => "json",
            #[cfg(feature = "pickle")]
            Self::Pickle => "pickle",
        }
    }
}

/// Builds a representation of the `extract` command line subcommand.
pub fn create_extract_subcommand() -> Command<'static> {
    Command::new("extract")
        .about("Extract grid-ordered data from a probe")
        .long_about(
            "Extract grid-ordered data from a probe.\n\
             One output file is written for each selected timestep, with the timestep\n\
             appended to the file stem of the output path.",
        )
        .arg(utils::create_input_dir_argument())
        .arg(
            Arg::new("output-file")
                .value_name("OUTPUT_FILE")
                .help(
                    "Path of the output files, with the format given by the extension:\n\
                     *.npy: NumPy array of the values [default]\n\
                     *.json: Values with title, units and axes (requires the json feature)\n\
                     *.pickle: Values with title, units and axes (requires the pickle feature)",
                )
                .required(true)
                .takes_value(true),
        )
        .arg(utils::create_probe_argument(true))
        .args(utils::create_selection_arguments())
        .arg(utils::create_endianness_argument())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages related to extraction"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Show progress bars for ordering and extraction (implies `verbose`)"),
        )
}

/// Runs the actions for the `extract` subcommand using the given arguments.
pub fn run_extract_subcommand(arguments: &ArgMatches) {
    let verbosity = utils::parse_verbosity(arguments, true);
    let store = utils::open_probe_from_arguments(arguments, &verbosity);
    let field_expression = arguments
        .value_of("field")
        .expect("No value for required argument");
    let config = utils::parse_probe_config(arguments);

    let output_path = utils::get_path_from_required_argument(arguments, "output-file");
    let format = OutputFormat::from_path(&output_path);

    let diagnostic = exit_on_error!(
        ProbeDiagnostic::new(store, field_expression, config, verbosity.clone()),
        "Error: Could not set up probe diagnostic: {}"
    );
    if verbosity.print_messages() {
        println!("{}", diagnostic);
    }

    let timesteps = diagnostic.selected_timesteps().to_vec();
    let progress_bar = verbosity.create_progress_bar(timesteps.len());
    for timestep in timesteps {
        let data = exit_on_none!(
            exit_on_error!(
                diagnostic.data_at_timestep(timestep),
                "Error: Could not extract data at timestep {0}: {1}",
                timestep
            ),
            "Error: No data for timestep {}",
            timestep
        );
        let timestep_path = output_path_for_timestep(&output_path, format, timestep);
        exit_on_error!(
            write_data(&data, &timestep_path, format),
            "Error: Could not write {0}: {1}",
            timestep_path.to_string_lossy()
        );
        if verbosity.print_messages() && !verbosity.show_progress() {
            println!("Wrote {}", timestep_path.to_string_lossy());
        }
        progress_bar.inc(1);
    }
    progress_bar.finish_and_clear();
}

fn output_path_for_timestep(output_path: &Path, format: OutputFormat, timestep: u64) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    output_path.with_file_name(format!("{}_{}.{}", stem, timestep, format.extension()))
}

fn write_data(data: &ProbeData, output_path: &Path, format: OutputFormat) -> std::io::Result<()> {
    match format {
        OutputFormat::Npy => io_utils::write_array_as_npy(data.values(), output_path),
        #[cfg(feature = "json")]
        OutputFormat::Json => io_utils::write_data_as_json(data, output_path),
        #[cfg(feature = "pickle")]
        OutputFormat::Pickle => io_utils::write_data_as_pickle(data, output_path),
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn timestep_is_appended_to_file_stem() {
        assert_eq!(
            output_path_for_timestep(Path::new("out/ex.npy"), OutputFormat::Npy, 30),
            PathBuf::from("out/ex_30.npy")
        );
        assert_eq!(
            output_path_for_timestep(Path::new("ex"), OutputFormat::Npy, 0),
            PathBuf::from("ex_0.npy")
        );
    }
}
