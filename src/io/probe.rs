//! Reading and writing of probe diagnostic data.

pub mod native;

#[cfg(feature = "hdf5")]
pub mod hdf5;

use super::{fco, fdt, Endianness, Verbosity};
use crate::{bail_io, io_error};
use lazy_static::lazy_static;
use ndarray::prelude::*;
use regex::Regex;
use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

/// Largest number of sampling axes a probe can have.
pub const MAX_PROBE_AXES: usize = 3;

/// Largest number of spatial dimensions of the simulation.
pub const MAX_AMBIENT_DIMS: usize = 3;

/// Metadata describing the sampling geometry and content of a probe.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeMetadata {
    probe_number: u32,
    shape: Vec<usize>,
    reference_point: Vec<fco>,
    end_points: Vec<Vec<fco>>,
    field_names: Vec<String>,
    is_time_integral: bool,
    n_points: usize,
    box_extents: Option<Vec<fco>>,
}

impl ProbeMetadata {
    /// Creates a new set of probe metadata, verifying that it is consistent.
    ///
    /// # Parameters
    ///
    /// - `probe_number`: Number identifying the probe.
    /// - `shape`: Declared number of points along each probe axis.
    /// - `reference_point`: Position of the first probe point (`p0`).
    /// - `end_points`: Position of the last point along each axis (`p1`, `p2`, ...).
    /// - `field_names`: Names of the recorded fields, in storage order.
    /// - `is_time_integral`: Whether recorded values are integrated over time.
    /// - `n_points`: Total number of stored points.
    pub fn new(
        probe_number: u32,
        shape: Vec<usize>,
        reference_point: Vec<fco>,
        end_points: Vec<Vec<fco>>,
        field_names: Vec<String>,
        is_time_integral: bool,
        n_points: usize,
    ) -> io::Result<Self> {
        let ambient_dims = reference_point.len();
        if ambient_dims == 0 || ambient_dims > MAX_AMBIENT_DIMS {
            bail_io!(
                InvalidData,
                "Reference point of probe #{} has {} components, expected between 1 and {}",
                probe_number,
                ambient_dims,
                MAX_AMBIENT_DIMS
            );
        }
        if shape.len() > MAX_PROBE_AXES {
            bail_io!(
                InvalidData,
                "Probe #{} has {} axes, at most {} are supported",
                probe_number,
                shape.len(),
                MAX_PROBE_AXES
            );
        }
        if end_points.len() != shape.len() {
            bail_io!(
                InvalidData,
                "Probe #{} has {} axes but {} axis end points",
                probe_number,
                shape.len(),
                end_points.len()
            );
        }
        if let Some(idx) = end_points.iter().position(|p| p.len() != ambient_dims) {
            bail_io!(
                InvalidData,
                "End point p{} of probe #{} has {} components, expected {}",
                idx + 1,
                probe_number,
                end_points[idx].len(),
                ambient_dims
            );
        }
        if shape.iter().any(|&n| n == 0) {
            bail_io!(
                InvalidData,
                "Probe #{} has an axis with zero points",
                probe_number
            );
        }
        if n_points == 0 {
            bail_io!(InvalidData, "Probe #{} contains no points", probe_number);
        }
        Ok(Self {
            probe_number,
            shape,
            reference_point,
            end_points,
            field_names,
            is_time_integral,
            n_points,
            box_extents: None,
        })
    }

    /// Sets the extents of the simulation box along each ambient dimension.
    pub fn with_box_extents(mut self, box_extents: Vec<fco>) -> io::Result<Self> {
        if box_extents.len() != self.ambient_dims() {
            bail_io!(
                InvalidData,
                "Box extents for probe #{} have {} components, expected {}",
                self.probe_number,
                box_extents.len(),
                self.ambient_dims()
            );
        }
        self.box_extents = Some(box_extents);
        Ok(self)
    }

    /// Returns the number identifying the probe.
    pub fn probe_number(&self) -> u32 {
        self.probe_number
    }

    /// Returns the declared number of probe axes.
    pub fn dimension(&self) -> usize {
        self.shape.len()
    }

    /// Returns the number of spatial dimensions of the simulation.
    pub fn ambient_dims(&self) -> usize {
        self.reference_point.len()
    }

    /// Returns the declared number of points along each probe axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the position of the first probe point.
    pub fn reference_point(&self) -> &[fco] {
        &self.reference_point
    }

    /// Returns the end point of each probe axis.
    pub fn end_points(&self) -> &[Vec<fco>] {
        &self.end_points
    }

    /// Returns the names of the recorded fields.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Returns the storage index of the given field, if recorded.
    pub fn field_index(&self, field_name: &str) -> Option<usize> {
        self.field_names.iter().position(|name| name == field_name)
    }

    /// Whether the recorded values are integrated over time.
    pub fn is_time_integral(&self) -> bool {
        self.is_time_integral
    }

    /// Returns the total number of stored points.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Returns the extents of the simulation box, if known.
    pub fn box_extents(&self) -> Option<&[fco]> {
        self.box_extents.as_deref()
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", value)?;
    }
    Ok(())
}

impl fmt::Display for ProbeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Probe #{}: {}-dimensional, with fields {}",
            self.probe_number,
            self.dimension(),
            self.field_names.join(",")
        )?;
        f.write_str("\n\tp0 = ")?;
        write_joined(f, &self.reference_point)?;
        for (idx, end_point) in self.end_points.iter().enumerate() {
            write!(f, "\n\tp{} = ", idx + 1)?;
            write_joined(f, end_point)?;
        }
        if !self.shape.is_empty() {
            f.write_str("\n\tnumber = ")?;
            write_joined(f, &self.shape)?;
        }
        Ok(())
    }
}

/// Defines the properties of a storage backend for probe data.
///
/// Points are addressed by their raw index in storage order, which is
/// generally not the order of the sampling grid.
pub trait ProbeStore {
    /// Returns the metadata of the stored probe.
    fn metadata(&self) -> &ProbeMetadata;

    /// Returns the timesteps for which data is stored, in ascending order.
    fn available_timesteps(&self) -> &[u64];

    /// Reads the positions of the points with raw indices in `[first, last)`.
    ///
    /// The returned array has one row per point and one column per ambient dimension.
    fn read_positions(&self, first: usize, last: usize) -> io::Result<Array2<fco>>;

    /// Reads the values of the given field at the given timestep for the
    /// points with raw indices in `[first, last)`.
    fn read_field_values(
        &self,
        timestep: u64,
        field_index: usize,
        first: usize,
        last: usize,
    ) -> io::Result<Array1<fdt>>;

    /// Returns the distance the moving window had moved at the given timestep, if recorded.
    fn moving_window_shift(&self, timestep: u64) -> io::Result<Option<fco>>;

    /// Whether data is stored for the given timestep.
    fn has_timestep(&self, timestep: u64) -> bool {
        self.available_timesteps().binary_search(&timestep).is_ok()
    }
}

impl<S: ProbeStore + ?Sized> ProbeStore for Box<S> {
    fn metadata(&self) -> &ProbeMetadata {
        (**self).metadata()
    }

    fn available_timesteps(&self) -> &[u64] {
        (**self).available_timesteps()
    }

    fn read_positions(&self, first: usize, last: usize) -> io::Result<Array2<fco>> {
        (**self).read_positions(first, last)
    }

    fn read_field_values(
        &self,
        timestep: u64,
        field_index: usize,
        first: usize,
        last: usize,
    ) -> io::Result<Array1<fdt>> {
        (**self).read_field_values(timestep, field_index, first, last)
    }

    fn moving_window_shift(&self, timestep: u64) -> io::Result<Option<fco>> {
        (**self).moving_window_shift(timestep)
    }
}

/// Verifies that `[first, last)` is a valid raw index range for the given metadata.
pub fn verify_point_range(metadata: &ProbeMetadata, first: usize, last: usize) -> io::Result<()> {
    if first > last || last > metadata.n_points() {
        Err(io_error!(
            InvalidInput,
            "Invalid point range [{}, {}) for probe #{} with {} points",
            first,
            last,
            metadata.probe_number(),
            metadata.n_points()
        ))
    } else {
        Ok(())
    }
}

/// Verifies that the given field index is valid for the given metadata.
pub fn verify_field_index(metadata: &ProbeMetadata, field_index: usize) -> io::Result<()> {
    if field_index >= metadata.field_names().len() {
        Err(io_error!(
            InvalidInput,
            "Invalid field index {} for probe #{} with fields {}",
            field_index,
            metadata.probe_number(),
            metadata.field_names().join(", ")
        ))
    } else {
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct StoredTimestep {
    values: Array2<fdt>,
    moving_window_shift: Option<fco>,
}

/// Probe store keeping all positions and values in memory.
#[derive(Clone, Debug)]
pub struct MemoryProbeStore {
    metadata: ProbeMetadata,
    positions: Array2<fco>,
    stored_timesteps: BTreeMap<u64, StoredTimestep>,
    timesteps: Vec<u64>,
}

impl MemoryProbeStore {
    /// Creates a new in-memory store with the given metadata and point positions.
    pub fn new(metadata: ProbeMetadata, positions: Array2<fco>) -> io::Result<Self> {
        if positions.dim() != (metadata.n_points(), metadata.ambient_dims()) {
            bail_io!(
                InvalidData,
                "Positions for probe #{} have shape {:?}, expected ({}, {})",
                metadata.probe_number(),
                positions.shape(),
                metadata.n_points(),
                metadata.ambient_dims()
            );
        }
        Ok(Self {
            metadata,
            positions,
            stored_timesteps: BTreeMap::new(),
            timesteps: Vec::new(),
        })
    }

    /// Stores the values of all fields at the given timestep.
    ///
    /// The value array has one row per field and one column per point.
    pub fn insert_timestep(
        &mut self,
        timestep: u64,
        values: Array2<fdt>,
        moving_window_shift: Option<fco>,
    ) -> io::Result<()> {
        let expected_shape = (
            self.metadata.field_names().len(),
            self.metadata.n_points(),
        );
        if values.dim() != expected_shape {
            bail_io!(
                InvalidData,
                "Values for timestep {} have shape {:?}, expected {:?}",
                timestep,
                values.shape(),
                expected_shape
            );
        }
        self.stored_timesteps.insert(
            timestep,
            StoredTimestep {
                values,
                moving_window_shift,
            },
        );
        self.timesteps = self.stored_timesteps.keys().copied().collect();
        Ok(())
    }

    /// Returns the positions of all points.
    pub fn positions(&self) -> &Array2<fco> {
        &self.positions
    }

    fn stored_timestep(&self, timestep: u64) -> io::Result<&StoredTimestep> {
        self.stored_timesteps.get(&timestep).ok_or_else(|| {
            io_error!(
                NotFound,
                "Timestep {} not stored for probe #{}",
                timestep,
                self.metadata.probe_number()
            )
        })
    }
}

impl ProbeStore for MemoryProbeStore {
    fn metadata(&self) -> &ProbeMetadata {
        &self.metadata
    }

    fn available_timesteps(&self) -> &[u64] {
        &self.timesteps
    }

    fn read_positions(&self, first: usize, last: usize) -> io::Result<Array2<fco>> {
        verify_point_range(&self.metadata, first, last)?;
        Ok(self.positions.slice(s![first..last, ..]).to_owned())
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
        Ok(self
            .stored_timestep(timestep)?
            .values
            .slice(s![field_index, first..last])
            .to_owned())
    }

    fn moving_window_shift(&self, timestep: u64) -> io::Result<Option<fco>> {
        Ok(self.stored_timestep(timestep)?.moving_window_shift)
    }
}

lazy_static! {
    static ref PROBE_FILE_NAME_REGEX: Regex =
        Regex::new(r"^Probes(\d+)\.(probe|h5)$").expect("Invalid probe file name regex");
}

/// Finds all probe files in the given directory, sorted by probe number.
///
/// Files in HDF5 format are only included when HDF5 support is enabled.
pub fn find_probe_files<P: AsRef<Path>>(directory: P) -> io::Result<Vec<(u32, PathBuf)>> {
    let directory = directory.as_ref();
    let entries = fs::read_dir(directory).map_err(|err| {
        io_error!(
            NotFound,
            "Could not read directory {}: {}",
            directory.to_string_lossy(),
            err
        )
    })?;

    let mut probe_files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let file_name = match path.file_name() {
            Some(file_name) => file_name.to_string_lossy().to_string(),
            None => continue,
        };
        if let Some(captures) = PROBE_FILE_NAME_REGEX.captures(&file_name) {
            if &captures[2] == "h5" && !cfg!(feature = "hdf5") {
                continue;
            }
            if let Ok(probe_number) = captures[1].parse::<u32>() {
                probe_files.push((probe_number, path));
            }
        }
    }
    probe_files.sort();
    probe_files.dedup_by_key(|(probe_number, _)| *probe_number);
    Ok(probe_files)
}

/// Opens the file at the given path as a probe store, with the format
/// determined by the file extension.
pub fn open_probe_file<P: AsRef<Path>>(
    file_path: P,
    endianness: Endianness,
    verbosity: &Verbosity,
) -> io::Result<Box<dyn ProbeStore>> {
    let file_path = file_path.as_ref();
    match file_path.extension().map(|ext| ext.to_string_lossy()) {
        Some(ext) if ext == "probe" => Ok(Box::new(native::NativeProbeStore::new(
            file_path, endianness, verbosity,
        )?)),
        #[cfg(feature = "hdf5")]
        Some(ext) if ext == "h5" => Ok(Box::new(hdf5::Hdf5ProbeStore::new(file_path, verbosity)?)),
        _ => Err(io_error!(
            InvalidInput,
            "Unsupported probe file {}\n\
             Valid extensions are: probe{}",
            file_path.to_string_lossy(),
            if cfg!(feature = "hdf5") { ", h5" } else { "" }
        )),
    }
}

/// Opens the probe with the given number in the given directory.
///
/// If no probe number is given or the probe is not found, the returned
/// error lists the available probes.
pub fn open_probe_in_directory<P: AsRef<Path>>(
    directory: P,
    probe_number: Option<u32>,
    endianness: Endianness,
    verbosity: &Verbosity,
) -> io::Result<Box<dyn ProbeStore>> {
    let directory = directory.as_ref();
    let probe_files = find_probe_files(directory)?;

    if let Some(probe_number) = probe_number {
        if let Some((_, path)) = probe_files
            .iter()
            .find(|(number, _)| *number == probe_number)
        {
            return open_probe_file(path, endianness, verbosity);
        }
    }

    let mut lines = vec![match probe_number {
        Some(probe_number) => format!(
            "Probe #{} not found in {}",
            probe_number,
            directory.to_string_lossy()
        ),
        None => "Argument `probe` not provided".to_string(),
    }];
    if probe_files.is_empty() {
        lines.push("No probes found".to_string());
    } else {
        lines.push("Printing available probes:".to_string());
        lines.push("--------------------------".to_string());
        for (probe_number, path) in &probe_files {
            lines.push(
                match open_probe_file(path, endianness, &Verbosity::Quiet) {
                    Ok(store) => store.metadata().to_string(),
                    Err(_) => format!(
                        "Probe #{}: \n\tFile not found or not readable",
                        probe_number
                    ),
                },
            );
        }
    }
    let kind = if probe_number.is_some() {
        io::ErrorKind::NotFound
    } else {
        io::ErrorKind::InvalidInput
    };
    Err(io::Error::new(kind, lines.join("\n")))
}

#[cfg(test)]
mod tests {

    use super::*;

    fn line_metadata(n_points: usize) -> ProbeMetadata {
        ProbeMetadata::new(
            1,
            vec![n_points],
            vec![0.0, 0.0],
            vec![vec![3.0, 4.0]],
            vec!["Ex".to_string(), "Bz".to_string()],
            false,
            n_points,
        )
        .unwrap()
    }

    #[test]
    fn inconsistent_metadata_is_rejected() {
        assert!(ProbeMetadata::new(0, vec![2], vec![0.0], vec![], vec![], false, 2).is_err());
        assert!(
            ProbeMetadata::new(0, vec![2], vec![0.0], vec![vec![1.0, 1.0]], vec![], false, 2)
                .is_err()
        );
        assert!(ProbeMetadata::new(0, vec![], vec![0.0; 4], vec![], vec![], false, 1).is_err());
        assert!(ProbeMetadata::new(0, vec![0], vec![0.0], vec![vec![1.0]], vec![], false, 1)
            .is_err());
        assert!(line_metadata(3).with_box_extents(vec![1.0]).is_err());
    }

    #[test]
    fn metadata_info_lists_geometry() {
        let info = line_metadata(5).to_string();
        assert_eq!(
            info,
            "Probe #1: 1-dimensional, with fields Ex,Bz\n\tp0 = 0 0\n\tp1 = 3 4\n\tnumber = 5"
        );
    }

    #[test]
    fn memory_store_reads_ranges() {
        let metadata = line_metadata(4);
        let positions = Array2::from_shape_fn((4, 2), |(i, j)| (i * 10 + j) as fco);
        let mut store = MemoryProbeStore::new(metadata, positions).unwrap();
        let values = Array2::from_shape_fn((2, 4), |(f, i)| (f * 100 + i) as fdt);
        store.insert_timestep(20, values.clone(), Some(1.5)).unwrap();
        store.insert_timestep(10, values, None).unwrap();

        assert_eq!(store.available_timesteps(), &[10, 20]);
        assert!(store.has_timestep(20));
        assert!(!store.has_timestep(15));
        assert_eq!(
            store.read_positions(1, 3).unwrap(),
            array![[10.0, 11.0], [20.0, 21.0]]
        );
        assert_eq!(
            store.read_field_values(10, 1, 2, 4).unwrap(),
            array![102.0, 103.0]
        );
        assert_eq!(store.moving_window_shift(20).unwrap(), Some(1.5));
        assert!(store.read_positions(3, 5).is_err());
        assert!(store.read_field_values(10, 2, 0, 1).is_err());
        assert!(store.read_field_values(30, 0, 0, 1).is_err());
    }

    #[test]
    fn finding_probe_files_works() {
        let directory = tempfile::tempdir().unwrap();
        for name in ["Probes2.probe", "Probes0.probe", "Probes.probe", "other.txt"] {
            fs::write(directory.path().join(name), "").unwrap();
        }
        let found: Vec<_> = find_probe_files(directory.path())
            .unwrap()
            .into_iter()
            .map(|(number, _)| number)
            .collect();
        assert_eq!(found, vec![0, 2]);
    }
}
