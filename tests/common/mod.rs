use lazy_static::lazy_static;
use ndarray::ArrayD;
use probestaff::{cli, exit_on_error, io::fdt};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

#[macro_export]
macro_rules! def_test {
    (
        OUT[$($out_ident:ident = $out_str:expr),*]
        fn $name:ident $test_body:expr
    ) => {
        #[test]
        fn $name() {
            let test = common::Test::new();

            $( let $out_ident = test.output_path($out_str); )*

            let test_body = |$( $out_ident, )*| $test_body;

            test_body(
                $( path_str!($out_ident), )*
            );
        }
    };
}

#[macro_export]
macro_rules! path_str {
    ($path:expr) => {
        $path.to_string_lossy().as_ref()
    };
}

pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli::run::run_with_args(COMMAND.clone().get_matches_from(args));
}

pub fn assert_file_exists<P: AsRef<Path>>(file_path: P) {
    let file_path = file_path.as_ref();
    assert!(
        file_path.exists(),
        "File {} does not exist",
        file_path.to_string_lossy()
    );
}

pub fn read_npy_file<P: AsRef<Path>>(file_path: P) -> ArrayD<fdt> {
    let file_path = file_path.as_ref();
    assert_file_exists(file_path);
    exit_on_error!(
        ndarray_npy::read_npy(file_path),
        "Error: Could not read {0}: {1}",
        file_path.to_string_lossy()
    )
}

#[derive(Debug)]
pub struct Test {
    output_dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let output_dir = exit_on_error!(
            tempfile::tempdir(),
            "Error: Could not create output directory for test: {}"
        );
        Self { output_dir }
    }

    pub fn output_path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.output_dir.path().join(file_name.as_ref())
    }
}

lazy_static! {
    static ref COMMAND: clap::Command<'static> = cli::build::build().no_binary_name(true);
}

pub fn assert_file_not_exists<P: AsRef<Path>>(file_path: P) {
    let file_path = file_path.as_ref();
    assert!(
        !file_path.exists(),
        "File {} exists",
        file_path.to_string_lossy()
    );
}
