//! Generation of synthetic probes with disordered point storage.

use crate::{
    bail_io,
    io::{
        fco, fdt,
        probe::{MemoryProbeStore, ProbeMetadata},
        Verbosity,
    },
};
use ndarray::prelude::*;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::io;

/// Configuration parameters for synthetic probes.
#[derive(Clone, Debug)]
pub struct SyntheticProbeConfig {
    /// Number identifying the probe.
    pub probe_number: u32,
    /// Number of grid points along each probe axis.
    pub shape: Vec<usize>,
    /// Position of the first grid point.
    pub reference_point: Vec<fco>,
    /// Position of the last grid point along each axis.
    pub end_points: Vec<Vec<fco>>,
    /// Names of the recorded fields.
    pub field_names: Vec<String>,
    /// Timesteps to record values for.
    pub timesteps: Vec<u64>,
    /// Whether the recorded values are integrated over time.
    pub is_time_integral: bool,
    /// Number of patches the grid is split into along each axis. Patches
    /// are stored one after another in random order, like the subdomains
    /// of a decomposed simulation.
    pub patches_per_axis: usize,
    /// Largest random offset of a point from its grid position, as a
    /// fraction of the grid spacing. Must be smaller than one half.
    pub position_jitter: fco,
    /// Seed for the random number generator, or `None` for a random seed.
    pub seed: Option<u64>,
}

impl SyntheticProbeConfig {
    /// Checks that the configuration parameters are valid.
    pub fn validate(&self) -> io::Result<()> {
        if self.patches_per_axis == 0 {
            bail_io!(InvalidInput, "Number of patches per axis must be larger than zero");
        }
        if !(0.0..0.5).contains(&self.position_jitter) {
            bail_io!(
                InvalidInput,
                "Position jitter must be in [0, 0.5), got {}",
                self.position_jitter
            );
        }
        if self.timesteps.is_empty() {
            bail_io!(InvalidInput, "No timesteps given for synthetic probe");
        }
        Ok(())
    }
}

impl Default for SyntheticProbeConfig {
    fn default() -> Self {
        Self {
            probe_number: 0,
            shape: vec![8],
            reference_point: vec![0.0; 3],
            end_points: vec![vec![1.0, 0.0, 0.0]],
            field_names: vec!["Ex".to_string(), "Bz".to_string()],
            timesteps: vec![0],
            is_time_integral: false,
            patches_per_axis: 2,
            position_jitter: 0.0,
            seed: None,
        }
    }
}

/// Returns the value of the given synthetic field at the given grid point
/// and timestep.
///
/// The value is a linear function of the grid indices, scaled by the field
/// index and offset by the timestep.
pub fn synthetic_value(field_index: usize, grid_indices: &[usize], timestep: u64) -> fdt {
    let position_term: fdt = grid_indices
        .iter()
        .fold(0.0, |accumulated, &index| 10.0 * accumulated + index as fdt);
    (field_index + 1) as fdt * position_term + timestep as fdt
}

/// Creates an in-memory probe whose points are stored in shuffled
/// order, with values given by `synthetic_value`.
pub fn create_synthetic_probe(
    config: &SyntheticProbeConfig,
    verbosity: &Verbosity,
) -> io::Result<MemoryProbeStore> {
    config.validate()?;
    let n_points: usize = config.shape.iter().product();
    let metadata = ProbeMetadata::new(
        config.probe_number,
        config.shape.clone(),
        config.reference_point.clone(),
        config.end_points.clone(),
        config.field_names.clone(),
        config.is_time_integral,
        n_points,
    )?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let storage_order = shuffled_grid_points(&config.shape, config.patches_per_axis, &mut rng);

    let ambient_dims = config.reference_point.len();
    let displacements: Vec<Vec<fco>> = config
        .end_points
        .iter()
        .zip(&config.shape)
        .map(|(end_point, &n)| {
            let n_intervals = n.saturating_sub(1).max(1) as fco;
            end_point
                .iter()
                .zip(&config.reference_point)
                .map(|(end, start)| (end - start) / n_intervals)
                .collect()
        })
        .collect();

    let mut positions = Array2::<fco>::zeros((n_points, ambient_dims));
    for (mut row, grid_indices) in positions.outer_iter_mut().zip(&storage_order) {
        row.assign(&ArrayView1::from(&config.reference_point[..]));
        for (axis, (&index, spacing)) in grid_indices.iter().zip(&displacements).enumerate() {
            let jitter = if config.position_jitter > 0.0 && config.shape[axis] > 1 {
                rng.gen_range(-config.position_jitter..config.position_jitter)
            } else {
                0.0
            };
            for (coordinate, component) in row.iter_mut().zip(spacing) {
                *coordinate += (index as fco + jitter) * component;
            }
        }
    }

    let mut store = MemoryProbeStore::new(metadata, positions)?;

    let progress_bar = verbosity.create_progress_bar(config.timesteps.len());
    for &timestep in &config.timesteps {
        let values = Array2::from_shape_fn(
            (config.field_names.len(), n_points),
            |(field_index, raw)| synthetic_value(field_index, &storage_order[raw], timestep),
        );
        store.insert_timestep(timestep, values, None)?;
        progress_bar.inc(1);
    }
    progress_bar.finish_and_clear();

    if verbosity.print_messages() {
        println!(
            "Created synthetic probe #{} with {} points and {} timestep{}",
            config.probe_number,
            n_points,
            config.timesteps.len(),
            if config.timesteps.len() == 1 { "" } else { "s" }
        );
    }
    Ok(store)
}

/// Lists the grid indices of every point, grouped into patches that are
/// shuffled along with the points inside each patch.
fn shuffled_grid_points<R: Rng>(
    shape: &[usize],
    patches_per_axis: usize,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    let patch_lengths: Vec<usize> = shape
        .iter()
        .map(|&n| (n + patches_per_axis - 1) / patches_per_axis)
        .collect();
    let patch_of = |grid_indices: &[usize]| -> Vec<usize> {
        grid_indices
            .iter()
            .zip(&patch_lengths)
            .map(|(index, length)| index / length)
            .collect()
    };

    let mut grid_points: Vec<Vec<usize>> = vec![Vec::new()];
    for &n in shape {
        grid_points = grid_points
            .into_iter()
            .flat_map(|prefix| {
                (0..n).map(move |index| {
                    let mut indices = prefix.clone();
                    indices.push(index);
                    indices
                })
            })
            .collect();
    }

    let mut patches: Vec<(Vec<usize>, Vec<Vec<usize>>)> = Vec::new();
    for grid_indices in grid_points {
        let patch = patch_of(&grid_indices);
        match patches.iter_mut().find(|(key, _)| *key == patch) {
            Some((_, members)) => members.push(grid_indices),
            None => patches.push((patch, vec![grid_indices])),
        }
    }

    patches.shuffle(rng);
    patches
        .into_iter()
        .flat_map(|(_, mut members)| {
            members.shuffle(rng);
            members
        })
        .collect()
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::io::probe::ProbeStore;

    fn plane_config() -> SyntheticProbeConfig {
        SyntheticProbeConfig {
            probe_number: 3,
            shape: vec![5, 4],
            reference_point: vec![0.0, 1.0, 0.0],
            end_points: vec![vec![4.0, 1.0, 0.0], vec![0.0, 1.0, 3.0]],
            timesteps: vec![0, 100],
            patches_per_axis: 2,
            position_jitter: 0.3,
            seed: Some(42),
            ..SyntheticProbeConfig::default()
        }
    }

    #[test]
    fn synthetic_points_cover_grid_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut points = shuffled_grid_points(&[3, 4, 2], 2, &mut rng);
        assert_eq!(points.len(), 24);
        points.sort();
        points.dedup();
        assert_eq!(points.len(), 24);
    }

    #[test]
    fn synthetic_positions_lie_near_grid_points() {
        let store = create_synthetic_probe(&plane_config(), &Verbosity::Quiet).unwrap();
        assert_eq!(store.available_timesteps(), &[0, 100]);
        let positions = store.read_positions(0, 20).unwrap();
        let values = store.read_field_values(100, 0, 0, 20).unwrap();
        for (row, &value) in positions.outer_iter().zip(values.iter()) {
            assert_eq!(row[1], 1.0);
            let (i, j) = (row[0].round() as usize, row[2].round() as usize);
            assert!((row[0] - i as fco).abs() <= 0.3);
            assert!((row[2] - j as fco).abs() <= 0.3);
            assert_eq!(value, synthetic_value(0, &[i, j], 100));
        }
    }

    #[test]
    fn invalid_synthetic_config_fails() {
        let config = SyntheticProbeConfig {
            position_jitter: 0.5,
            ..SyntheticProbeConfig::default()
        };
        assert!(create_synthetic_probe(&config, &Verbosity::Quiet).is_err());
    }
}
