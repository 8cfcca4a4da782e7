//! Reading of probe data in the HDF5 layout written by the simulation code.

use super::{
    super::{fco, fdt, Verbosity},
    verify_field_index, verify_point_range, ProbeMetadata, ProbeStore,
};
use crate::io_error;
use hdf5_rs::{
    types::{FixedAscii, VarLenAscii, VarLenUnicode},
    Dataset, File, Location,
};
use ndarray::prelude::*;
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

fn map_h5_err(path: &Path, err: hdf5_rs::Error) -> io::Error {
    io_error!(
        InvalidData,
        "Failed reading HDF5 probe file {}: {}",
        path.to_string_lossy(),
        err
    )
}

fn read_string_attr(location: &Location, name: &str) -> hdf5_rs::Result<String> {
    let attr = location.attr(name)?;
    if let Ok(value) = attr.read_scalar::<VarLenUnicode>() {
        return Ok(value.as_str().to_string());
    }
    if let Ok(value) = attr.read_scalar::<VarLenAscii>() {
        return Ok(value.as_str().to_string());
    }
    let value: FixedAscii<1024> = attr.read_scalar()?;
    Ok(value.as_str().to_string())
}

fn has_attr(location: &Location, name: &str) -> bool {
    location
        .attr_names()
        .map(|names| names.iter().any(|attr_name| attr_name == name))
        .unwrap_or(false)
}

/// Reader for probes stored as `Probes<N>.h5` files.
///
/// The files do not record the extents of the simulation box, so the
/// metadata never has box extents. Supply them through
/// `ProbeConfig::box_extents` to clamp plane coordinates in 2D simulations.
#[derive(Debug)]
pub struct Hdf5ProbeStore {
    file_path: PathBuf,
    file: File,
    metadata: ProbeMetadata,
    timesteps: Vec<u64>,
    timestep_dataset_names: HashMap<u64, String>,
}

impl Hdf5ProbeStore {
    /// Opens the HDF5 probe file at the given path.
    pub fn new<P: AsRef<Path>>(file_path: P, verbosity: &Verbosity) -> io::Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        if verbosity.print_messages() {
            println!("Reading probe from {}", file_path.to_string_lossy());
        }
        let map_err = |err| map_h5_err(&file_path, err);

        let file = File::open(&file_path).map_err(map_err)?;

        let probe_number = file_path
            .file_stem()
            .and_then(|stem| stem.to_string_lossy().trim_start_matches("Probes").parse().ok())
            .unwrap_or(0);

        let dimension: i64 = file
            .attr("dimension")
            .and_then(|attr| attr.read_scalar())
            .map_err(map_err)?;
        let field_names: Vec<String> = read_string_attr(&file, "fields")
            .map_err(map_err)?
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .collect();
        let is_time_integral = if has_attr(&file, "time_integral") {
            file.attr("time_integral")
                .and_then(|attr| attr.read_scalar::<i64>())
                .map_err(map_err)?
                > 0
        } else {
            false
        };

        let shape: Vec<usize> = file
            .dataset("number")
            .and_then(|dataset| dataset.read_raw::<i64>())
            .map_err(map_err)?
            .into_iter()
            .map(|n| usize::try_from(n).unwrap_or(0))
            .collect();
        if shape.len() as i64 != dimension {
            return Err(io_error!(
                InvalidData,
                "Probe file {} has dimension {} but {} axis lengths",
                file_path.to_string_lossy(),
                dimension,
                shape.len()
            ));
        }

        let read_point = |name: &str| -> io::Result<Vec<fco>> {
            file.dataset(name)
                .and_then(|dataset| dataset.read_raw::<fco>())
                .map_err(|err| map_h5_err(&file_path, err))
        };
        let reference_point = read_point("p0")?;
        let end_points = (1..=shape.len())
            .map(|axis| read_point(&format!("p{}", axis)))
            .collect::<io::Result<Vec<_>>>()?;

        let positions = file.dataset("positions").map_err(map_err)?;
        let n_points = positions.shape().first().copied().unwrap_or(0);

        let metadata = ProbeMetadata::new(
            probe_number,
            shape,
            reference_point,
            end_points,
            field_names,
            is_time_integral,
            n_points,
        )?;

        let mut timestep_dataset_names = HashMap::new();
        for name in file.member_names().map_err(map_err)? {
            if let Ok(timestep) = name.parse::<u64>() {
                timestep_dataset_names.insert(timestep, name);
            }
        }
        let mut timesteps: Vec<u64> = timestep_dataset_names.keys().copied().collect();
        timesteps.sort_unstable();

        Ok(Self {
            file_path,
            file,
            metadata,
            timesteps,
            timestep_dataset_names,
        })
    }

    /// Returns the path of the probe file.
    pub fn file_path(&self) -> &Path {
        self.file_path.as_path()
    }

    fn timestep_dataset(&self, timestep: u64) -> io::Result<Dataset> {
        let name = self.timestep_dataset_names.get(&timestep).ok_or_else(|| {
            io_error!(
                NotFound,
                "Timestep {} not stored for probe #{}",
                timestep,
                self.metadata.probe_number()
            )
        })?;
        self.file
            .dataset(name)
            .map_err(|err| map_h5_err(&self.file_path, err))
    }
}

impl ProbeStore for Hdf5ProbeStore {
    fn metadata(&self) -> &ProbeMetadata {
        &self.metadata
    }

    fn available_timesteps(&self) -> &[u64] {
        &self.timesteps
    }

    fn read_positions(&self, first: usize, last: usize) -> io::Result<Array2<fco>> {
        verify_point_range(&self.metadata, first, last)?;
        self.file
            .dataset("positions")
            .and_then(|dataset| dataset.read_slice_2d::<fco, _>(s![first..last, ..]))
            .map_err(|err| map_h5_err(&self.file_path, err))
    }

    fn read_field_values(
        &self,
        timestep: u64,
        field_index: usize,
        first: usize,
        last: usize,
    ) -> io::Result<Array1<fdt>> {
        verify_point_range(&self.metadata, first, last)?;
        verify_field_index(&self.metadata, field_index)?;
        self.timestep_dataset(timestep)?
            .read_slice_1d::<fdt, _>(s![field_index, first..last])
            .map_err(|err| map_h5_err(&self.file_path, err))
    }

    fn moving_window_shift(&self, timestep: u64) -> io::Result<Option<fco>> {
        let dataset = self.timestep_dataset(timestep)?;
        if has_attr(&dataset, "x_moved") {
            dataset
                .attr("x_moved")
                .and_then(|attr| attr.read_scalar::<fco>())
                .map(Some)
                .map_err(|err| map_h5_err(&self.file_path, err))
        } else {
            Ok(None)
        }
    }
}
