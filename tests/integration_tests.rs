#![cfg(all(feature = "cli", feature = "synthesis"))]

mod common;

use common::run;
use ndarray::prelude::*;
use probestaff::{
    io::{
        fdt,
        probe::{self, ProbeStore},
        Endianness, Verbosity,
    },
    probe::synthesis::synthetic_value,
};

const VOLUME_PROBE: [&str; 10] = [
    "--probe=1",
    "--shape=4,3,2",
    "--p0=0,0,0",
    "--p1=3,0,0",
    "--p2=0,2,0",
    "--p3=0,0,1",
    "--timesteps=0,10,20",
    "--fields=Ex,Bz",
    "--jitter=0.3",
    "--seed=7",
];

fn create_volume_probe(probe_dir: &str) {
    let mut args = vec!["create_probe", probe_dir];
    args.extend(VOLUME_PROBE);
    run(args);
}

def_test!(
OUT[probe_dir = "probes"]
fn created_probe_can_be_opened {
    create_volume_probe(probe_dir);
    let store = probe::open_probe_in_directory(probe_dir, Some(1), Endianness::Native, &Verbosity::Quiet).unwrap();
    let metadata = store.metadata();
    assert_eq!(metadata.shape(), &[4, 3, 2]);
    assert_eq!(metadata.n_points(), 24);
    assert_eq!(metadata.field_names(), &["Ex".to_string(), "Bz".to_string()]);
    assert_eq!(store.available_timesteps(), &[0, 10, 20]);

    assert!(probe::open_probe_in_directory(probe_dir, Some(2), Endianness::Native, &Verbosity::Quiet).is_err());

    run(["info", probe_dir]);
    run(["info", probe_dir, "--probe=1"]);
    run(["timesteps", probe_dir, "--probe=1"]);
    run(["limits", probe_dir, "--probe=1", "--field=Ex", "--subset=axis3=0"]);
});

def_test!(
OUT[probe_dir = "probes", output = "ex.npy"]
fn extracted_volume_matches_grid_values {
    create_volume_probe(probe_dir);
    run(["extract", probe_dir, output, "--probe=1", "--field=Ex", "--timesteps=10", "--chunk-size=5"]);

    let values = common::read_npy_file(output.replace("ex.npy", "ex_10.npy"))
        .into_dimensionality::<Ix3>()
        .unwrap();
    assert_eq!(values.shape(), &[4, 3, 2]);
    for ((i, j, k), &value) in values.indexed_iter() {
        assert_eq!(value, synthetic_value(0, &[i, j, k], 10));
    }
});

def_test!(
OUT[probe_dir = "probes", output = "diff.npy"]
fn subset_and_average_reduce_extracted_data {
    create_volume_probe(probe_dir);
    run([
        "extract",
        probe_dir,
        output,
        "--probe=1",
        "--field=Bz - Ex",
        "--subset=axis1=1,2",
        "--average=axis3=all",
        "--timesteps=#1:3",
    ]);

    for timestep in [10, 20] {
        let values = common::read_npy_file(output.replace("diff.npy", &format!("diff_{}.npy", timestep)))
            .into_dimensionality::<Ix2>()
            .unwrap();
        assert_eq!(values.shape(), &[2, 3]);
        for ((i, j), &value) in values.indexed_iter() {
            let expected = (100 * (i + 1) + 10 * j) as fdt + 0.5;
            assert!((value - expected).abs() < 1e-9, "{} != {}", value, expected);
        }
    }
    common::assert_file_not_exists(output.replace("diff.npy", "diff_0.npy"));
});

def_test!(
OUT[probe_dir = "probes", output = "line.npy"]
fn line_probe_in_plane_is_reordered {
    run([
        "create_probe",
        probe_dir,
        "--probe=0",
        "--shape=9",
        "--p0=1,1",
        "--p1=5,4",
        "--fields=Ey",
        "--patches-per-axis=3",
        "--seed=3",
    ]);
    run(["extract", probe_dir, output, "--probe=0", "--field=2*Ey", "--endianness=big"]);

    let values = common::read_npy_file(output.replace("line.npy", "line_0.npy"));
    assert_eq!(values, Array1::from_shape_fn(9, |i| 2.0 * i as fdt).into_dyn());
});
