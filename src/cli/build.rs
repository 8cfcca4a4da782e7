//! Function for building the command line hierarchy.

use super::{
    extract::create_extract_subcommand, info::create_info_subcommand,
    limits::create_limits_subcommand, timesteps::create_timesteps_subcommand,
};
use clap::{self, Arg, Command};

#[cfg(feature = "synthesis")]
use super::create_probe::create_create_probe_subcommand;

/// Build the `probestaff` command line hierarchy.
#[allow(clippy::let_and_return)]
pub fn build() -> Command<'static> {
    let command = Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .author(clap::crate_authors!())
        .about(clap::crate_description!())
        .disable_help_subcommand(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("timing")
                .long("timing")
                .help("Display elapsed time when done"),
        )
        .subcommand(create_info_subcommand())
        .subcommand(create_timesteps_subcommand())
        .subcommand(create_limits_subcommand())
        .subcommand(create_extract_subcommand());

    #[cfg(feature = "synthesis")]
    let command = command.subcommand(create_create_probe_subcommand());

    command
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn command_line_hierarchy_is_valid() {
        build().debug_assert();
    }
}
