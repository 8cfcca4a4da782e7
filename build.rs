#[cfg(feature = "hdf5")]
use regex::Regex;
#[cfg(feature = "hdf5")]
use std::{
    env,
    process::{self, Command},
};

#[cfg(feature = "hdf5")]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        eprintln!($($print_arg)*);
        process::exit(1)
    }};
}

#[cfg(feature = "hdf5")]
macro_rules! exit_on_error {
    ($result:expr, $($fmt_arg:tt)*) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                exit_with_error!($($fmt_arg)*, err.to_string())
            }
        }
    };
}

#[cfg(not(feature = "hdf5"))]
fn setup_hdf5() {}
#[cfg(feature = "hdf5")]
fn setup_hdf5() {
    println!("cargo:rerun-if-env-changed=HDF5_DIR");

    if env::var("HDF5_DIR").is_ok() {
        return;
    }

    let config_text = String::from_utf8(
        exit_on_error!(
            Command::new("h5cc").arg("-showconfig").output(),
            "Error: Could run h5cc: {}\n\
             Make sure HDF5 is installed and that h5cc is in $PATH"
        )
        .stdout,
    )
    .unwrap_or_else(|err| exit_with_error!("Error: Invalid output from h5cc: {}", err));

    let hdf5_root_path = Regex::new(r"(?m)^\s*Installation point:\s*(.+)\s*$")
        .unwrap()
        .captures(&config_text)
        .and_then(|captures| captures.get(1))
        .unwrap_or_else(|| {
            exit_with_error!("Error: Could not find installation point in h5cc -showconfig output")
        })
        .as_str()
        .to_string();

    println!("cargo:rustc-env=HDF5_DIR={}", hdf5_root_path);
}

fn main() {
    setup_hdf5();
}
