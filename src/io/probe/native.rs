//! Reading and writing of probe data in native format.
//!
//! A native probe consists of a text parameter file `Probes<N>.probe`
//! together with two binary files holding the point positions and the
//! recorded field values. Positions are stored point by point, with one
//! coordinate per ambient dimension. Field values are stored timestep by
//! timestep, and within each timestep field by field over all points.

use super::{
    super::{fco, fdt, utils, Endianness, Verbosity},
    verify_field_index, verify_point_range, ProbeMetadata, ProbeStore,
};
use crate::{bail_io, io_error};
use lazy_static::lazy_static;
use ndarray::prelude::*;
use regex::Regex;
use std::{
    collections::HashMap,
    io::{self, Write},
    mem,
    path::{Path, PathBuf},
    str,
};

/// Default number of points read or written at a time when converting probes.
pub const DEFAULT_WRITE_CHUNK_SIZE: usize = 1_000_000;

lazy_static! {
    static ref PARAMETER_REGEX: Regex = Regex::new(r"(?m)^\s*([_\w]+)\s*=\s*(.+?)\s*$").unwrap();
}

/// Set of parameter names and values associated with a probe parameter file.
#[derive(Clone, Debug)]
struct ParameterSet {
    values: HashMap<String, String>,
}

impl ParameterSet {
    fn parse(text: &str) -> Self {
        Self {
            values: PARAMETER_REGEX
                .captures_iter(text)
                .map(|captures| (captures[1].to_string(), captures[2].to_string()))
                .collect(),
        }
    }

    fn has_param(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn get_str_param<'a>(&'a self, name: &str) -> io::Result<&'a str> {
        match self.values.get(name) {
            Some(value) => Ok(value.trim_matches('"')),
            None => Err(io_error!(
                InvalidData,
                "Parameter {} not found in probe file",
                name
            )),
        }
    }

    fn get_numerical_param<T>(&self, name: &str) -> io::Result<T>
    where
        T: str::FromStr,
        T::Err: ToString,
    {
        let str_value = self.get_str_param(name)?;
        str_value.parse::<T>().map_err(|err| {
            io_error!(
                InvalidData,
                "Failed parsing value {} of parameter {} in probe file: {}",
                str_value,
                name,
                err.to_string()
            )
        })
    }

    fn get_numerical_list_param<T>(&self, name: &str) -> io::Result<Vec<T>>
    where
        T: str::FromStr,
        T::Err: ToString,
    {
        self.get_str_param(name)?
            .split_whitespace()
            .map(|str_value| {
                str_value.parse::<T>().map_err(|err| {
                    io_error!(
                        InvalidData,
                        "Failed parsing value {} of parameter {} in probe file: {}",
                        str_value,
                        name,
                        err.to_string()
                    )
                })
            })
            .collect()
    }
}

/// Reader for probes stored in native format.
#[derive(Clone, Debug)]
pub struct NativeProbeStore {
    param_file_path: PathBuf,
    positions_path: PathBuf,
    data_path: PathBuf,
    endianness: Endianness,
    metadata: ProbeMetadata,
    timesteps: Vec<u64>,
    moving_window_shifts: Option<Vec<fco>>,
}

impl NativeProbeStore {
    /// Creates a reader for the native probe with the given parameter file.
    ///
    /// The given byte order is used unless the parameter file specifies one.
    pub fn new<P: AsRef<Path>>(
        param_file_path: P,
        endianness: Endianness,
        verbosity: &Verbosity,
    ) -> io::Result<Self> {
        let param_file_path = param_file_path.as_ref().to_path_buf();
        if verbosity.print_messages() {
            println!(
                "Reading probe parameters from {}",
                param_file_path.to_string_lossy()
            );
        }
        let parameters = ParameterSet::parse(&utils::read_text_file(&param_file_path)?);

        let probe_number = parameters.get_numerical_param("probe_number")?;
        let dimension: usize = parameters.get_numerical_param("dimension")?;
        let shape = if dimension > 0 {
            parameters.get_numerical_list_param("shape")?
        } else {
            Vec::new()
        };
        let reference_point = parameters.get_numerical_list_param("p0")?;
        let end_points = (1..=dimension)
            .map(|axis| parameters.get_numerical_list_param(&format!("p{}", axis)))
            .collect::<io::Result<Vec<Vec<fco>>>>()?;
        let field_names = parameters
            .get_str_param("fields")?
            .split_whitespace()
            .map(|name| name.to_string())
            .collect();
        let is_time_integral = parameters.get_numerical_param::<u8>("time_integral")? > 0;
        let n_points = parameters.get_numerical_param("n_points")?;

        let mut metadata = ProbeMetadata::new(
            probe_number,
            shape,
            reference_point,
            end_points,
            field_names,
            is_time_integral,
            n_points,
        )?;
        if parameters.has_param("box_extents") {
            metadata =
                metadata.with_box_extents(parameters.get_numerical_list_param("box_extents")?)?;
        }

        let timesteps: Vec<u64> = if parameters.has_param("timesteps") {
            parameters.get_numerical_list_param("timesteps")?
        } else {
            Vec::new()
        };
        if timesteps.windows(2).any(|pair| pair[0] >= pair[1]) {
            bail_io!(
                InvalidData,
                "Timesteps in {} are not strictly increasing",
                param_file_path.to_string_lossy()
            );
        }

        let moving_window_shifts = if parameters.has_param("x_moved") {
            let shifts: Vec<fco> = parameters.get_numerical_list_param("x_moved")?;
            if shifts.len() != timesteps.len() {
                bail_io!(
                    InvalidData,
                    "Got {} moving window shifts for {} timesteps in {}",
                    shifts.len(),
                    timesteps.len(),
                    param_file_path.to_string_lossy()
                );
            }
            Some(shifts)
        } else {
            None
        };

        let endianness = if parameters.has_param("endianness") {
            let name = parameters.get_str_param("endianness")?;
            Endianness::from_name(name)
                .ok_or_else(|| io_error!(InvalidData, "Invalid endianness {} in probe file", name))?
        } else {
            endianness
        };

        let positions_path =
            param_file_path.with_file_name(parameters.get_str_param("positions_file")?);
        let data_path = param_file_path.with_file_name(parameters.get_str_param("data_file")?);

        Ok(Self {
            param_file_path,
            positions_path,
            data_path,
            endianness,
            metadata,
            timesteps,
            moving_window_shifts,
        })
    }

    /// Returns the path of the parameter file.
    pub fn parameter_file_path(&self) -> &Path {
        self.param_file_path.as_path()
    }

    /// Returns the path of the binary position file.
    pub fn positions_file_path(&self) -> &Path {
        self.positions_path.as_path()
    }

    /// Returns the path of the binary data file.
    pub fn data_file_path(&self) -> &Path {
        self.data_path.as_path()
    }

    fn timestep_index(&self, timestep: u64) -> io::Result<usize> {
        self.timesteps.binary_search(&timestep).map_err(|_| {
            io_error!(
                NotFound,
                "Timestep {} not stored for probe #{}",
                timestep,
                self.metadata.probe_number()
            )
        })
    }
}

impl ProbeStore for NativeProbeStore {
    fn metadata(&self) -> &ProbeMetadata {
        &self.metadata
    }

    fn available_timesteps(&self) -> &[u64] {
        &self.timesteps
    }

    fn read_positions(&self, first: usize, last: usize) -> io::Result<Array2<fco>> {
        verify_point_range(&self.metadata, first, last)?;
        let ambient_dims = self.metadata.ambient_dims();
        let values = utils::read_from_binary_file(
            &self.positions_path,
            (last - first) * ambient_dims,
            first * ambient_dims * mem::size_of::<fco>(),
            self.endianness,
        )?;
        Array2::from_shape_vec((last - first, ambient_dims), values)
            .map_err(|err| io_error!(InvalidData, "Invalid position data: {}", err))
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
        let timestep_index = self.timestep_index(timestep)?;
        let n_fields = self.metadata.field_names().len();
        let n_points = self.metadata.n_points();
        let offset = (timestep_index * n_fields + field_index) * n_points + first;
        let values = utils::read_from_binary_file(
            &self.data_path,
            last - first,
            offset * mem::size_of::<fdt>(),
            self.endianness,
        )?;
        Ok(Array1::from_vec(values))
    }

    fn moving_window_shift(&self, timestep: u64) -> io::Result<Option<fco>> {
        let timestep_index = self.timestep_index(timestep)?;
        Ok(self
            .moving_window_shifts
            .as_ref()
            .map(|shifts| shifts[timestep_index]))
    }
}

fn join_values<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes the given probe to the given parameter file path in native format.
///
/// The binary position and data files are placed next to the parameter
/// file. Points are transferred `chunk_size` at a time.
pub fn write_native_probe<S, P>(
    store: &S,
    param_file_path: P,
    endianness: Endianness,
    chunk_size: usize,
    verbosity: &Verbosity,
) -> io::Result<()>
where
    S: ProbeStore + ?Sized,
    P: AsRef<Path>,
{
    let param_file_path = param_file_path.as_ref();
    if chunk_size == 0 {
        bail_io!(InvalidInput, "Chunk size must be larger than zero");
    }
    let metadata = store.metadata();
    let timesteps = store.available_timesteps();
    let n_points = metadata.n_points();

    let positions_path = param_file_path.with_extension("pos");
    let data_path = param_file_path.with_extension("dat");
    let file_name = |path: &Path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| io_error!(InvalidInput, "Invalid probe path {}", path.to_string_lossy()))
    };

    let moving_window_shifts = timesteps
        .iter()
        .map(|&timestep| store.moving_window_shift(timestep))
        .collect::<io::Result<Vec<_>>>()?;

    let positions_file_name = file_name(&positions_path)?;
    let data_file_name = file_name(&data_path)?;

    if verbosity.print_messages() {
        println!("Writing positions to {}", positions_path.to_string_lossy());
    }
    let mut positions_output = utils::AtomicOutputPath::new(&positions_path)?;
    {
        let mut writer = positions_output.writer();
        for first in (0..n_points).step_by(chunk_size) {
            let last = usize::min(first + chunk_size, n_points);
            let positions = store.read_positions(first, last)?;
            let positions: Vec<fco> = positions.iter().copied().collect();
            utils::write_floats(&mut writer, &positions, endianness)?;
        }
        writer.flush()?;
    }

    if verbosity.print_messages() {
        println!("Writing field values to {}", data_path.to_string_lossy());
    }
    let progress_bar = verbosity.create_progress_bar(timesteps.len());
    let mut data_output = utils::AtomicOutputPath::new(&data_path)?;
    {
        let mut writer = data_output.writer();
        for &timestep in timesteps {
            for field_index in 0..metadata.field_names().len() {
                for first in (0..n_points).step_by(chunk_size) {
                    let last = usize::min(first + chunk_size, n_points);
                    let values = store.read_field_values(timestep, field_index, first, last)?;
                    utils::write_floats(&mut writer, &values.to_vec(), endianness)?;
                }
            }
            progress_bar.inc(1);
        }
        writer.flush()?;
    }
    progress_bar.finish_and_clear();

    positions_output.perform_replace()?;
    data_output.perform_replace()?;

    if verbosity.print_messages() {
        println!("Writing parameters to {}", param_file_path.to_string_lossy());
    }
    let mut param_output = utils::AtomicOutputPath::new(param_file_path)?;
    {
        let mut writer = param_output.writer();
        write_parameters(
            &mut writer,
            store,
            &moving_window_shifts,
            endianness,
            &positions_file_name,
            &data_file_name,
        )?;
        writer.flush()?;
    }
    param_output.perform_replace()
}

fn write_parameters<S, W>(
    writer: &mut W,
    store: &S,
    moving_window_shifts: &[Option<fco>],
    endianness: Endianness,
    positions_file_name: &str,
    data_file_name: &str,
) -> io::Result<()>
where
    S: ProbeStore + ?Sized,
    W: Write,
{
    let metadata = store.metadata();
    let timesteps = store.available_timesteps();

    writeln!(writer, "probe_number = {}", metadata.probe_number())?;
    writeln!(writer, "dimension = {}", metadata.dimension())?;
    if metadata.dimension() > 0 {
        writeln!(writer, "shape = {}", join_values(metadata.shape()))?;
    }
    writeln!(writer, "p0 = {}", join_values(metadata.reference_point()))?;
    for (idx, end_point) in metadata.end_points().iter().enumerate() {
        writeln!(writer, "p{} = {}", idx + 1, join_values(end_point))?;
    }
    writeln!(writer, "fields = \"{}\"", metadata.field_names().join(" "))?;
    writeln!(
        writer,
        "time_integral = {}",
        u8::from(metadata.is_time_integral())
    )?;
    writeln!(writer, "n_points = {}", metadata.n_points())?;
    if let Some(box_extents) = metadata.box_extents() {
        writeln!(writer, "box_extents = {}", join_values(box_extents))?;
    }
    if !timesteps.is_empty() {
        writeln!(writer, "timesteps = {}", join_values(timesteps))?;
        if moving_window_shifts.iter().all(Option::is_some) {
            let shifts: Vec<fco> = moving_window_shifts.iter().flatten().copied().collect();
            writeln!(writer, "x_moved = {}", join_values(&shifts))?;
        }
    }
    writeln!(writer, "endianness = \"{}\"", endianness.name())?;
    writeln!(writer, "positions_file = \"{}\"", positions_file_name)?;
    writeln!(writer, "data_file = \"{}\"", data_file_name)
}

#[cfg(test)]
mod tests {

    use super::{super::MemoryProbeStore, *};

    fn create_plane_store() -> MemoryProbeStore {
        let metadata = ProbeMetadata::new(
            4,
            vec![2, 3],
            vec![0.0, 0.0, 1.0],
            vec![vec![1.0, 0.0, 1.0], vec![0.0, 2.0, 1.0]],
            vec!["Ex".to_string(), "Rho_e".to_string()],
            true,
            6,
        )
        .unwrap()
        .with_box_extents(vec![4.0, 4.0, 4.0])
        .unwrap();
        let positions = Array2::from_shape_fn((6, 3), |(i, j)| match j {
            0 => (i % 2) as fco,
            1 => (i / 2) as fco,
            _ => 1.0,
        });
        let mut store = MemoryProbeStore::new(metadata, positions).unwrap();
        for (k, timestep) in [5, 15].into_iter().enumerate() {
            let values = Array2::from_shape_fn((2, 6), |(f, i)| (k * 100 + f * 10 + i) as fdt);
            store
                .insert_timestep(timestep, values, Some(k as fco * 0.5))
                .unwrap();
        }
        store
    }

    #[test]
    fn native_probe_round_trip_works() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("Probes4.probe");
        let original = create_plane_store();

        for endianness in [Endianness::Little, Endianness::Big] {
            write_native_probe(&original, &path, endianness, 4, &Verbosity::Quiet).unwrap();
            let store = NativeProbeStore::new(&path, Endianness::Native, &Verbosity::Quiet).unwrap();

            assert_eq!(store.metadata(), original.metadata());
            assert_eq!(store.available_timesteps(), &[5, 15]);
            assert_eq!(
                store.read_positions(1, 6).unwrap(),
                original.read_positions(1, 6).unwrap()
            );
            assert_eq!(
                store.read_field_values(15, 1, 2, 5).unwrap(),
                array![112.0, 113.0, 114.0]
            );
            assert_eq!(store.moving_window_shift(15).unwrap(), Some(0.5));
            assert!(store.read_field_values(10, 0, 0, 1).is_err());
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parameter_write_errors_are_propagated() {
        let store = create_plane_store();
        let err = write_parameters(
            &mut FailingWriter,
            &store,
            &[None, None],
            Endianness::Little,
            "Probes4.pos",
            "Probes4.dat",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "disk full");

        let mut text = Vec::new();
        write_parameters(
            &mut text,
            &store,
            &[Some(0.0), Some(0.5)],
            Endianness::Big,
            "Probes4.pos",
            "Probes4.dat",
        )
        .unwrap();
        let parameters = ParameterSet::parse(str::from_utf8(&text).unwrap());
        assert_eq!(parameters.get_str_param("endianness").unwrap(), "big");
        assert_eq!(parameters.get_str_param("data_file").unwrap(), "Probes4.dat");
        assert_eq!(parameters.get_str_param("x_moved").unwrap(), "0 0.5");
    }

    #[test]
    fn missing_parameters_are_reported() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("Probes0.probe");
        utils::write_text_file("probe_number = 0\ndimension = 1\n", &path).unwrap();
        let err = NativeProbeStore::new(&path, Endianness::Little, &Verbosity::Quiet).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("shape"));
    }

    #[test]
    fn parameter_parsing_trims_quotes_and_spaces() {
        let parameters = ParameterSet::parse("  name = \"abc def\"  \nlist=1 2  3\n");
        assert_eq!(parameters.get_str_param("name").unwrap(), "abc def");
        assert_eq!(
            parameters.get_numerical_list_param::<u32>("list").unwrap(),
            vec![1, 2, 3]
        );
        assert!(parameters.get_numerical_param::<u32>("name").is_err());
    }
}
