//! Reindexing of disordered probe data onto the probe's sampling grid.

pub mod axes;
pub mod extraction;
pub mod ordering;
pub mod projection;
pub mod range;
pub mod selection;

#[cfg(feature = "synthesis")]
pub mod synthesis;

use self::{
    axes::ProbeGeometry,
    ordering::{PointOrdering, DEFAULT_CHUNK_SIZE},
    projection::PlotCoordinates,
    range::RangeRequest,
    selection::ProbeSelection,
};
use crate::{
    bail_io,
    field::{FieldOperation, Operation},
    io::{
        fco, fdt,
        probe::{ProbeMetadata, ProbeStore},
        Verbosity,
    },
    io_error,
};
use ndarray::prelude::*;
use std::{collections::BTreeMap, fmt, io, str::FromStr};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Which of the available timesteps to extract data for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestepSelection {
    /// Every available timestep.
    All,
    /// The available timestep closest to the given one.
    Nearest(u64),
    /// Every available timestep in the inclusive range `[min, max]`.
    Between { min: u64, max: u64 },
    /// Available timesteps with list positions in `[start, stop)`.
    Indices { start: usize, stop: usize },
}

impl TimestepSelection {
    /// Selects timesteps from the given ascending list of available timesteps.
    pub fn select(&self, available_timesteps: &[u64]) -> io::Result<Vec<u64>> {
        if available_timesteps.is_empty() {
            bail_io!(NotFound, "No timesteps found");
        }
        let selected: Vec<u64> = match *self {
            Self::All => available_timesteps.to_vec(),
            Self::Nearest(timestep) => available_timesteps
                .iter()
                .min_by_key(|&&available| available.abs_diff(timestep))
                .into_iter()
                .copied()
                .collect(),
            Self::Between { min, max } => available_timesteps
                .iter()
                .copied()
                .filter(|timestep| (min..=max).contains(timestep))
                .collect(),
            Self::Indices { start, stop } => {
                let n_timesteps = available_timesteps.len();
                let start = start.min(n_timesteps);
                available_timesteps[start..stop.clamp(start, n_timesteps)].to_vec()
            }
        };
        if selected.is_empty() {
            bail_io!(
                InvalidInput,
                "Timesteps not found for selection {}\n\
                 Available timesteps: {} to {}",
                self,
                available_timesteps[0],
                available_timesteps[available_timesteps.len() - 1]
            );
        }
        Ok(selected)
    }
}

impl Default for TimestepSelection {
    fn default() -> Self {
        Self::All
    }
}

impl FromStr for TimestepSelection {
    type Err = io::Error;

    /// Parses a selection from one of the forms `all`, `t`, `t0,t1` or `#start:stop`.
    fn from_str(selection: &str) -> io::Result<Self> {
        let invalid = || {
            io_error!(
                InvalidInput,
                "Invalid timestep selection {}: expected all, t, t0,t1 or #start:stop",
                selection
            )
        };
        let parse_timestep = |text: &str| text.trim().parse::<u64>().map_err(|_| invalid());
        let parse_index = |text: &str| text.trim().parse::<usize>().map_err(|_| invalid());

        let trimmed = selection.trim();
        if trimmed == "all" {
            return Ok(Self::All);
        }
        if let Some(indices) = trimmed.strip_prefix('#') {
            let (start, stop) = indices.split_once(':').ok_or_else(invalid)?;
            return Ok(Self::Indices {
                start: parse_index(start)?,
                stop: parse_index(stop)?,
            });
        }
        match trimmed.split_once(',') {
            Some((min, max)) => {
                let (min, max) = (parse_timestep(min)?, parse_timestep(max)?);
                if min > max {
                    return Err(invalid());
                }
                Ok(Self::Between { min, max })
            }
            None => Ok(Self::Nearest(parse_timestep(trimmed)?)),
        }
    }
}

impl fmt::Display for TimestepSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Nearest(timestep) => write!(f, "{}", timestep),
            Self::Between { min, max } => write!(f, "{},{}", min, max),
            Self::Indices { start, stop } => write!(f, "#{}:{}", start, stop),
        }
    }
}

/// Configuration parameters for probe data extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeConfig {
    /// Ranges to restrict the data to, keyed by axis label.
    pub subset: BTreeMap<String, RangeRequest>,
    /// Ranges to average the data over, keyed by axis label.
    pub average: BTreeMap<String, RangeRequest>,
    /// Timesteps to extract data for.
    pub timesteps: TimestepSelection,
    /// Maximum number of stored points to read at once.
    pub chunk_size: usize,
    /// Extents of the simulation box, replacing any recorded with the probe.
    /// Probe files written by the simulation do not record them.
    pub box_extents: Option<Vec<fco>>,
}

impl ProbeConfig {
    /// Checks that the configuration parameters are valid.
    pub fn validate(&self) -> io::Result<()> {
        if self.chunk_size == 0 {
            bail_io!(InvalidInput, "Chunk size must be larger than zero");
        }
        if let Some(label) = self
            .subset
            .keys()
            .find(|label| self.average.contains_key(*label))
        {
            bail_io!(
                InvalidInput,
                "`subset` not possible on the same axes as `average` ({})",
                label
            );
        }
        if let Some(box_extents) = &self.box_extents {
            if !box_extents
                .iter()
                .all(|&extent| extent.is_finite() && extent > 0.0)
            {
                bail_io!(
                    InvalidInput,
                    "Box extents must be finite and positive, got {:?}",
                    box_extents
                );
            }
        }
        Ok(())
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            subset: BTreeMap::new(),
            average: BTreeMap::new(),
            timesteps: TimestepSelection::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            box_extents: None,
        }
    }
}

/// Grid-ordered probe data for a single timestep.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct ProbeData {
    timestep: u64,
    values: ArrayD<fdt>,
    title: String,
    units: String,
    axis_labels: Vec<&'static str>,
}

impl ProbeData {
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    /// Returns the values, with one dimension for each visible axis.
    pub fn values(&self) -> &ArrayD<fdt> {
        &self.values
    }

    /// Consumes the data and returns the values.
    pub fn into_values(self) -> ArrayD<fdt> {
        self.values
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    /// Returns the labels of the visible axes, in dimension order.
    pub fn axis_labels(&self) -> &[&'static str] {
        &self.axis_labels
    }
}

/// Parts derived from the probe layout and the configuration.
#[derive(Clone, Debug)]
struct Layout {
    geometry: ProbeGeometry,
    selection: ProbeSelection,
    plot_coordinates: PlotCoordinates,
    ordering: PointOrdering,
    selected_timesteps: Vec<u64>,
}

impl Layout {
    fn build<S: ProbeStore + ?Sized>(
        store: &S,
        config: &ProbeConfig,
        verbosity: &Verbosity,
    ) -> io::Result<Self> {
        config.validate()?;
        let selected_timesteps = config.timesteps.select(store.available_timesteps())?;
        let geometry = match &config.box_extents {
            Some(box_extents) => ProbeGeometry::from_metadata(
                &store.metadata().clone().with_box_extents(box_extents.clone())?,
            )?,
            None => ProbeGeometry::from_metadata(store.metadata())?,
        };
        let selection = ProbeSelection::assemble(&geometry, &config.subset, &config.average)?;
        let plot_coordinates = PlotCoordinates::compute(&geometry, &selection)?;
        let ordering =
            PointOrdering::build(store, &geometry, &selection, config.chunk_size, verbosity)?;
        Ok(Self {
            geometry,
            selection,
            plot_coordinates,
            ordering,
            selected_timesteps,
        })
    }
}

/// Diagnostic for extracting grid-ordered data from a probe.
#[derive(Debug)]
pub struct ProbeDiagnostic<S: ProbeStore> {
    store: S,
    operation: Operation,
    config: ProbeConfig,
    verbosity: Verbosity,
    layout: Layout,
}

impl<S: ProbeStore> ProbeDiagnostic<S> {
    /// Creates a new diagnostic for the quantity given by the field expression.
    ///
    /// The point ordering is computed here, which requires reading every
    /// stored point position once.
    pub fn new(
        store: S,
        field_expression: &str,
        config: ProbeConfig,
        verbosity: Verbosity,
    ) -> io::Result<Self> {
        let operation = Self::create_operation(store.metadata(), field_expression)?;
        if verbosity.print_messages() {
            println!("{}", store.metadata());
        }
        let layout = Layout::build(&store, &config, &verbosity)?;
        Ok(Self {
            store,
            operation,
            config,
            verbosity,
            layout,
        })
    }

    fn create_operation(metadata: &ProbeMetadata, field_expression: &str) -> io::Result<Operation> {
        Operation::new(
            field_expression,
            metadata.field_names(),
            metadata.is_time_integral(),
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metadata(&self) -> &ProbeMetadata {
        self.store.metadata()
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Returns the quantity being extracted.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Returns the names of the recorded fields.
    pub fn fields(&self) -> &[String] {
        self.metadata().field_names()
    }

    pub fn geometry(&self) -> &ProbeGeometry {
        &self.layout.geometry
    }

    pub fn selection(&self) -> &ProbeSelection {
        &self.layout.selection
    }

    pub fn ordering(&self) -> &PointOrdering {
        &self.layout.ordering
    }

    pub fn plot_coordinates(&self) -> &PlotCoordinates {
        &self.layout.plot_coordinates
    }

    /// Returns every timestep stored in the probe, in ascending order.
    pub fn available_timesteps(&self) -> &[u64] {
        self.store.available_timesteps()
    }

    /// Returns the timesteps picked by the timestep selection, in ascending order.
    pub fn selected_timesteps(&self) -> &[u64] {
        &self.layout.selected_timesteps
    }

    /// Returns the `[min, max]` plotting limits along each visible axis.
    pub fn limits(&self) -> io::Result<Vec<[fco; 2]>> {
        self.layout.plot_coordinates.limits()
    }

    /// Returns the shift of the moving window at the given timestep, or zero
    /// if the probe does not record one.
    ///
    /// Returns `None`, after printing a warning, if the timestep is not
    /// among the selected timesteps.
    pub fn moving_window_shift(&self, timestep: u64) -> io::Result<Option<fco>> {
        if !self.is_selected(timestep) {
            return Ok(None);
        }
        Ok(Some(
            self.store.moving_window_shift(timestep)?.unwrap_or(0.0),
        ))
    }

    /// Replaces the extracted quantity, keeping the point ordering.
    pub fn change_field(&mut self, field_expression: &str) -> io::Result<()> {
        self.operation = Self::create_operation(self.store.metadata(), field_expression)?;
        Ok(())
    }

    /// Replaces the configuration, recomputing the selection and the point
    /// ordering.
    ///
    /// The diagnostic is left unchanged if the new configuration is invalid.
    pub fn reconfigure(&mut self, config: ProbeConfig) -> io::Result<()> {
        self.layout = Layout::build(&self.store, &config, &self.verbosity)?;
        self.config = config;
        Ok(())
    }

    fn is_selected(&self, timestep: u64) -> bool {
        let is_selected = self
            .layout
            .selected_timesteps
            .binary_search(&timestep)
            .is_ok();
        if !is_selected {
            eprintln!(
                "Warning: Timestep {} not found in the selected timesteps of probe #{}",
                timestep,
                self.metadata().probe_number()
            );
        }
        is_selected
    }

    /// Extracts the quantity at the given timestep.
    ///
    /// Returns `None`, after printing a warning, if the timestep is not
    /// among the selected timesteps.
    pub fn data_at_timestep(&self, timestep: u64) -> io::Result<Option<ProbeData>> {
        if !self.is_selected(timestep) {
            return Ok(None);
        }
        if self.verbosity.print_messages() {
            println!("Extracting {} at timestep {}", self.operation.title(), timestep);
        }
        let values = extraction::extract_quantity(
            &self.store,
            &self.layout.ordering,
            &self.layout.selection,
            &self.operation,
            timestep,
            self.config.chunk_size,
        )?;
        Ok(Some(ProbeData {
            timestep,
            values,
            title: self.operation.title().to_string(),
            units: self.operation.units().to_string(),
            axis_labels: self
                .layout
                .selection
                .visible_axes()
                .iter()
                .map(|axis| axis.label())
                .collect(),
        }))
    }
}

impl<S: ProbeStore> fmt::Display for ProbeDiagnostic<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.metadata())?;
        for description in self
            .layout
            .selection
            .dispositions()
            .iter()
            .filter_map(|disposition| disposition.description())
        {
            write!(f, "\n\t{}", description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::io::probe::MemoryProbeStore;
    use approx::assert_abs_diff_eq;

    /// A 3 x 2 plane in the xz-plane, stored in reverse order, with field
    /// `Ex` equal to `10 i + j` and `Bz` equal to the timestep.
    fn reversed_plane() -> MemoryProbeStore {
        let metadata = ProbeMetadata::new(
            2,
            vec![3, 2],
            vec![1.0, 0.0, 0.0],
            vec![vec![3.0, 0.0, 0.0], vec![1.0, 0.0, 1.0]],
            vec!["Ex".to_string(), "Bz".to_string()],
            false,
            6,
        )
        .unwrap();
        let grid_index = |raw: usize| ((5 - raw) / 2, (5 - raw) % 2);
        let positions = Array2::from_shape_fn((6, 3), |(raw, dim)| {
            let (i, j) = grid_index(raw);
            match dim {
                0 => 1.0 + i as fco,
                1 => 0.0,
                _ => j as fco,
            }
        });
        let mut store = MemoryProbeStore::new(metadata, positions).unwrap();
        for &timestep in &[0, 5, 10, 20] {
            let values = Array2::from_shape_fn((2, 6), |(field, raw)| {
                let (i, j) = grid_index(raw);
                if field == 0 {
                    (10 * i + j) as fdt
                } else {
                    timestep as fdt
                }
            });
            let shift = (timestep == 10).then(|| 2.5);
            store.insert_timestep(timestep, values, shift).unwrap();
        }
        store
    }

    #[test]
    fn timestep_selection_parses_and_selects() {
        let available = [0, 5, 10, 20];
        let select = |text: &str| text.parse::<TimestepSelection>().unwrap().select(&available);
        assert_eq!(select("all").unwrap(), vec![0, 5, 10, 20]);
        assert_eq!(select("7").unwrap(), vec![5]);
        assert_eq!(select("16").unwrap(), vec![20]);
        assert_eq!(select("5,10").unwrap(), vec![5, 10]);
        assert_eq!(select("#1:3").unwrap(), vec![5, 10]);
        assert_eq!(select("#2:100").unwrap(), vec![10, 20]);
        assert!(select("11,19").is_err());
        assert!("10,5".parse::<TimestepSelection>().is_err());
        assert!("#1".parse::<TimestepSelection>().is_err());
        assert_eq!(
            TimestepSelection::All.select(&[]).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn diagnostic_extracts_grid_ordered_data() {
        let diagnostic = ProbeDiagnostic::new(
            reversed_plane(),
            "Ex + Bz",
            ProbeConfig::default(),
            Verbosity::Quiet,
        )
        .unwrap();
        assert_eq!(diagnostic.selected_timesteps(), &[0, 5, 10, 20]);
        assert!(diagnostic.ordering().is_complete());

        let data = diagnostic.data_at_timestep(10).unwrap().unwrap();
        assert_eq!(data.axis_labels(), &["axis1", "axis2"]);
        assert_eq!(data.title(), "Ex + Bz");
        assert_eq!(data.units(), "E_r");
        let values = data.into_values().into_dimensionality::<Ix2>().unwrap();
        assert_eq!(values, array![[10.0, 11.0], [20.0, 21.0], [30.0, 31.0]]);
    }

    #[test]
    fn unselected_timestep_gives_none() {
        let config = ProbeConfig {
            timesteps: TimestepSelection::Between { min: 5, max: 10 },
            ..ProbeConfig::default()
        };
        let diagnostic =
            ProbeDiagnostic::new(reversed_plane(), "Ex", config, Verbosity::Quiet).unwrap();
        assert_eq!(diagnostic.selected_timesteps(), &[5, 10]);
        assert_eq!(diagnostic.available_timesteps(), &[0, 5, 10, 20]);
        assert!(diagnostic.data_at_timestep(20).unwrap().is_none());
        assert!(diagnostic.data_at_timestep(5).unwrap().is_some());
    }

    #[test]
    fn changing_field_keeps_ordering() {
        let mut diagnostic =
            ProbeDiagnostic::new(reversed_plane(), "Ex", ProbeConfig::default(), Verbosity::Quiet)
                .unwrap();
        let ordering = diagnostic.ordering().clone();
        diagnostic.change_field("Bz*Bz").unwrap();
        assert_eq!(diagnostic.ordering(), &ordering);
        assert_eq!(diagnostic.operation().units(), "B_r^2");
        let values = diagnostic.data_at_timestep(5).unwrap().unwrap().into_values();
        assert!(values.iter().all(|&value| value == 25.0));

        assert!(diagnostic.change_field("Ey").is_err());
        assert_eq!(diagnostic.operation().expression(), "Bz*Bz");
    }

    #[test]
    fn reconfiguring_rebuilds_selection() {
        let mut diagnostic =
            ProbeDiagnostic::new(reversed_plane(), "Ex", ProbeConfig::default(), Verbosity::Quiet)
                .unwrap();
        assert_eq!(diagnostic.limits().unwrap().len(), 2);

        let mut config = ProbeConfig::default();
        config
            .average
            .insert("axis2".to_string(), RangeRequest::All);
        diagnostic.reconfigure(config.clone()).unwrap();
        assert_eq!(diagnostic.config(), &config);
        assert_eq!(diagnostic.selection().final_shape(), &[3, 2]);

        let data = diagnostic.data_at_timestep(0).unwrap().unwrap();
        assert_eq!(data.axis_labels(), &["axis1"]);
        let values = data.into_values().into_dimensionality::<Ix1>().unwrap();
        assert_eq!(values, array![0.5, 10.5, 20.5]);

        let limits = diagnostic.limits().unwrap();
        assert_eq!(limits.len(), 1);
        assert_abs_diff_eq!(limits[0][0], 0.0);
        assert_abs_diff_eq!(limits[0][1], 2.0, epsilon = 1e-12);

        let mut invalid = ProbeConfig::default();
        invalid.subset.insert("axis1".to_string(), RangeRequest::All);
        invalid.average.insert("axis1".to_string(), RangeRequest::All);
        assert!(diagnostic.reconfigure(invalid).is_err());
        assert_eq!(diagnostic.config(), &config);
    }

    #[test]
    fn moving_window_shift_defaults_to_zero() {
        let diagnostic =
            ProbeDiagnostic::new(reversed_plane(), "Ex", ProbeConfig::default(), Verbosity::Quiet)
                .unwrap();
        assert_eq!(diagnostic.moving_window_shift(10).unwrap(), Some(2.5));
        assert_eq!(diagnostic.moving_window_shift(5).unwrap(), Some(0.0));
    }

    #[test]
    fn whole_axis_subsets_leave_extraction_unchanged() {
        let mut diagnostic =
            ProbeDiagnostic::new(reversed_plane(), "Ex", ProbeConfig::default(), Verbosity::Quiet)
                .unwrap();
        let full_ordering = diagnostic.ordering().clone();
        let full_data = diagnostic.data_at_timestep(5).unwrap().unwrap();
        assert_eq!(full_ordering.raw_indices(), &[5, 4, 3, 2, 1, 0]);
        assert_eq!(
            full_data.values(),
            &array![[0.0, 1.0], [10.0, 11.0], [20.0, 21.0]].into_dyn()
        );

        for (first, second) in [("all", "all"), ("#0:3", "#0:2"), ("0,2", "0,1")] {
            let mut config = ProbeConfig::default();
            config
                .subset
                .insert("axis1".to_string(), first.parse().unwrap());
            config
                .subset
                .insert("axis2".to_string(), second.parse().unwrap());
            diagnostic.reconfigure(config).unwrap();
            assert_eq!(diagnostic.ordering(), &full_ordering);
            assert_eq!(diagnostic.data_at_timestep(5).unwrap().unwrap(), full_data);
        }
    }

    #[test]
    fn configured_box_extents_clamp_plane_limits() {
        let metadata = ProbeMetadata::new(
            1,
            vec![4, 3],
            vec![0.0, 0.0],
            vec![vec![3.0, 0.0], vec![0.0, 2.0]],
            vec!["Ex".to_string()],
            false,
            12,
        )
        .unwrap();
        let positions = Array2::from_shape_fn((12, 2), |(raw, dim)| match dim {
            0 => (raw / 3) as fco,
            _ => (raw % 3) as fco,
        });
        let mut store = MemoryProbeStore::new(metadata, positions).unwrap();
        store
            .insert_timestep(0, Array2::zeros((1, 12)), None)
            .unwrap();

        let mut diagnostic =
            ProbeDiagnostic::new(store, "Ex", ProbeConfig::default(), Verbosity::Quiet).unwrap();
        let limits = diagnostic.limits().unwrap();
        for (limit, expected) in limits.iter().flatten().zip([-0.5, 3.5, -0.5, 2.5]) {
            assert_abs_diff_eq!(*limit, expected, epsilon = 1e-12);
        }

        let config = ProbeConfig {
            box_extents: Some(vec![3.0, 2.0]),
            ..ProbeConfig::default()
        };
        diagnostic.reconfigure(config).unwrap();
        assert_eq!(diagnostic.limits().unwrap(), vec![[0.0, 3.0], [0.0, 2.0]]);

        let wrong_length = ProbeConfig {
            box_extents: Some(vec![3.0, 2.0, 1.0]),
            ..ProbeConfig::default()
        };
        assert!(diagnostic.reconfigure(wrong_length).is_err());
        let negative = ProbeConfig {
            box_extents: Some(vec![3.0, -2.0]),
            ..ProbeConfig::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn unselected_timestep_has_no_moving_window_shift() {
        let config = ProbeConfig {
            timesteps: TimestepSelection::Between { min: 0, max: 5 },
            ..ProbeConfig::default()
        };
        let diagnostic =
            ProbeDiagnostic::new(reversed_plane(), "Ex", config, Verbosity::Quiet).unwrap();
        assert_eq!(diagnostic.moving_window_shift(99).unwrap(), None);
        assert_eq!(diagnostic.moving_window_shift(10).unwrap(), None);
        assert!(diagnostic.data_at_timestep(99).unwrap().is_none());
    }

    #[test]
    fn info_lists_requested_ranges() {
        let mut config = ProbeConfig::default();
        config
            .subset
            .insert("axis1".to_string(), "0.5,1.5".parse().unwrap());
        let diagnostic =
            ProbeDiagnostic::new(reversed_plane(), "Ex", config, Verbosity::Quiet).unwrap();
        let info = diagnostic.to_string();
        assert!(info.starts_with("Probe #2: 2-dimensional, with fields Ex,Bz"));
        assert!(info.contains("\n\tsubset for axis1 from"));
        assert_eq!(diagnostic.fields(), &["Ex".to_string(), "Bz".to_string()]);
    }

    #[test]
    fn missing_field_and_timesteps_fail() {
        let err = ProbeDiagnostic::new(
            reversed_plane(),
            "Jx",
            ProbeConfig::default(),
            Verbosity::Quiet,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Available fields: Ex, Bz"));

        let empty = MemoryProbeStore::new(
            reversed_plane().metadata().clone(),
            reversed_plane().positions().clone(),
        )
        .unwrap();
        let err = ProbeDiagnostic::new(empty, "Ex", ProbeConfig::default(), Verbosity::Quiet)
            .unwrap_err();
        assert_eq!(err.to_string(), "No timesteps found");
    }
}
