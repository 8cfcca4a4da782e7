//! Recovery of the grid ordering of disordered probe points.
//!
//! Points are written to storage in the order the simulation's spatial
//! decomposition produced them. The ordering maps each selected grid point,
//! linearized in row-major order, to the raw index of the stored point
//! located there.

use super::{axes::ProbeGeometry, selection::ProbeSelection};
use crate::{
    bail_io,
    geometry::{Dim3, Matrix3, Point3, Vec3},
    io::{fco, probe::ProbeStore, Verbosity},
    io_error,
    num::round_to_index,
};
use ndarray::prelude::*;
use std::{fmt, io};

/// Default number of points processed at a time.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000_000;

/// Marker for grid points with no corresponding stored point.
pub const ABSENT: usize = usize::MAX;

/// Iterator over consecutive `[first, last)` chunks covering a range of items.
#[derive(Clone, Debug)]
pub struct ChunkedRange {
    n_items: usize,
    chunk_size: usize,
    next_first: usize,
}

impl ChunkedRange {
    /// Creates an iterator over chunks of at most `chunk_size` items
    /// covering `[0, n_items)`.
    pub fn new(n_items: usize, chunk_size: usize) -> io::Result<Self> {
        if chunk_size == 0 {
            bail_io!(InvalidInput, "Chunk size must be larger than zero");
        }
        Ok(Self {
            n_items,
            chunk_size,
            next_first: 0,
        })
    }

    /// Returns the total number of chunks.
    pub fn n_chunks(&self) -> usize {
        (self.n_items + self.chunk_size - 1) / self.chunk_size
    }
}

impl Iterator for ChunkedRange {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_first >= self.n_items {
            return None;
        }
        let first = self.next_first;
        let last = usize::min(first + self.chunk_size, self.n_items);
        self.next_first = last;
        Some((first, last))
    }
}

/// Linear map from positions to fractional grid indices.
#[derive(Clone, Debug)]
enum ReindexingBasis {
    Point,
    Line {
        origin: Point3<fco>,
        scale: fco,
    },
    Volume {
        origin: Point3<fco>,
        inverse: Matrix3<fco>,
        scales: [fco; 3],
        n_axes: usize,
    },
}

impl ReindexingBasis {
    fn new(geometry: &ProbeGeometry) -> io::Result<Self> {
        let origin = geometry.reference_point().clone();
        let axes = geometry.axes();
        let scale_of = |axis: usize| axes[axis].len().saturating_sub(1) as fco;

        match axes.len() {
            0 => Ok(Self::Point),
            1 => {
                let length = axes[0].displacement().length();
                if !(length > 0.0) {
                    bail_io!(
                        InvalidInput,
                        "Probe axis {} has zero length",
                        axes[0].label()
                    );
                }
                Ok(Self::Line {
                    origin,
                    scale: scale_of(0) / length,
                })
            }
            n_axes => {
                let first = axes[0].displacement().clone();
                let second = axes[1].displacement().clone();
                let third = if n_axes == 3 {
                    axes[2].displacement().clone()
                } else {
                    first
                        .cross(&second)
                        .normalized()
                        .unwrap_or_else(Vec3::zero)
                };
                let inverse = Matrix3::from_columns(first, second, third)
                    .inverse()
                    .ok_or_else(|| {
                        io_error!(
                            InvalidInput,
                            "Probe axes are degenerate: the axis end points do not span {} dimensions",
                            n_axes
                        )
                    })?;
                let scales = [
                    scale_of(0),
                    scale_of(1),
                    if n_axes == 3 { scale_of(2) } else { 0.0 },
                ];
                Ok(Self::Volume {
                    origin,
                    inverse,
                    scales,
                    n_axes,
                })
            }
        }
    }

    fn n_axes(&self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line { .. } => 1,
            Self::Volume { n_axes, .. } => *n_axes,
        }
    }

    /// Computes the nearest grid indices of the given position, or `None`
    /// if any of them is not finite.
    fn grid_indices(&self, position: &Point3<fco>) -> Option<[i64; 3]> {
        match self {
            Self::Point => Some([0; 3]),
            Self::Line { origin, scale } => {
                let distance = (position - origin).length();
                Some([round_to_index(distance * scale)?, 0, 0])
            }
            Self::Volume {
                origin,
                inverse,
                scales,
                ..
            } => {
                let fractional = inverse * &(position - origin);
                let mut indices = [0; 3];
                for dim in Dim3::slice() {
                    indices[dim.num()] = round_to_index(fractional[dim] * scales[dim.num()])?;
                }
                Some(indices)
            }
        }
    }
}

fn point_from_row(row: ArrayView1<fco>) -> Point3<fco> {
    Point3::with_each_component(|dim| row.get(dim.num()).copied().unwrap_or(0.0))
}

/// Counts of how the stored points were assigned to grid points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderingStatistics {
    /// Number of stored points.
    pub n_points: usize,
    /// Number of stored points mapping to a selected grid point.
    pub n_retained: usize,
    /// Number of stored points mapping to a grid point outside the selection.
    pub n_outside_selection: usize,
    /// Number of stored points whose grid indices could not be computed.
    pub n_non_finite: usize,
    /// Number of retained points mapping to a grid point already claimed by
    /// an earlier stored point.
    pub n_collisions: usize,
    /// Number of selected grid points with no stored point.
    pub n_absent_slots: usize,
}

impl OrderingStatistics {
    /// Returns the total number of stored points that were not used.
    pub fn n_dropped(&self) -> usize {
        self.n_outside_selection + self.n_non_finite + self.n_collisions
    }
}

impl fmt::Display for OrderingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} points retained ({} outside selection, {} non-finite, {} colliding), {} grid points absent",
            self.n_retained - self.n_collisions,
            self.n_points,
            self.n_outside_selection,
            self.n_non_finite,
            self.n_collisions,
            self.n_absent_slots
        )
    }
}

/// Map from selected grid points to the raw indices of the stored points.
#[derive(Clone, Debug, PartialEq)]
pub struct PointOrdering {
    raw_indices: Vec<usize>,
    slots_by_raw_index: Vec<usize>,
    statistics: OrderingStatistics,
}

impl PointOrdering {
    /// Builds the ordering for the given selection by reading the stored
    /// point positions `chunk_size` points at a time.
    ///
    /// Positions are mapped to the nearest grid point. Points falling outside
    /// the selection are dropped, and if several points map to the same grid
    /// point, the one with the lowest raw index is used.
    pub fn build<S: ProbeStore + ?Sized>(
        store: &S,
        geometry: &ProbeGeometry,
        selection: &ProbeSelection,
        chunk_size: usize,
        verbosity: &Verbosity,
    ) -> io::Result<Self> {
        let basis = ReindexingBasis::new(geometry)?;
        let n_points = geometry.n_points();
        let chunks = ChunkedRange::new(n_points, chunk_size)?;

        let mut raw_indices = vec![ABSENT; selection.n_selected_points()];
        let mut statistics = OrderingStatistics {
            n_points,
            ..OrderingStatistics::default()
        };

        if basis.n_axes() == 0 {
            raw_indices[0] = 0;
            statistics.n_retained = 1;
            statistics.n_outside_selection = n_points.saturating_sub(1);
        } else {
            if verbosity.print_messages() {
                println!(
                    "Ordering {} probe points in {} chunk{}",
                    n_points,
                    chunks.n_chunks(),
                    if chunks.n_chunks() == 1 { "" } else { "s" }
                );
            }
            let n_axes = basis.n_axes();
            let progress_bar = verbosity.create_progress_bar(chunks.n_chunks());

            for (first, last) in chunks {
                let positions = store.read_positions(first, last)?;
                for (offset, row) in positions.outer_iter().enumerate() {
                    let grid_indices = match basis.grid_indices(&point_from_row(row)) {
                        Some(grid_indices) => grid_indices,
                        None => {
                            statistics.n_non_finite += 1;
                            continue;
                        }
                    };
                    match selection.linear_index(&grid_indices[..n_axes]) {
                        Some(slot) => {
                            statistics.n_retained += 1;
                            if raw_indices[slot] == ABSENT {
                                raw_indices[slot] = first + offset;
                            } else {
                                statistics.n_collisions += 1;
                            }
                        }
                        None => {
                            statistics.n_outside_selection += 1;
                        }
                    }
                }
                progress_bar.inc(1);
            }
            progress_bar.finish_and_clear();
        }

        statistics.n_absent_slots = raw_indices.iter().filter(|&&raw| raw == ABSENT).count();
        let ordering = Self::from_raw_indices(raw_indices, statistics);

        if verbosity.print_messages() {
            println!("{}", ordering.statistics());
        }
        if statistics.n_collisions > 0 {
            eprintln!(
                "Warning: {} probe points share a grid point with another point",
                statistics.n_collisions
            );
        }
        if statistics.n_absent_slots > 0 {
            eprintln!(
                "Warning: {} selected grid points have no probe point and will be NaN",
                statistics.n_absent_slots
            );
        }
        Ok(ordering)
    }

    fn from_raw_indices(raw_indices: Vec<usize>, statistics: OrderingStatistics) -> Self {
        let mut slots_by_raw_index: Vec<usize> = (0..raw_indices.len())
            .filter(|&slot| raw_indices[slot] != ABSENT)
            .collect();
        slots_by_raw_index.sort_unstable_by_key(|&slot| raw_indices[slot]);
        Self {
            raw_indices,
            slots_by_raw_index,
            statistics,
        }
    }

    /// Returns the number of selected grid points.
    pub fn len(&self) -> usize {
        self.raw_indices.len()
    }

    /// Whether there are no selected grid points.
    pub fn is_empty(&self) -> bool {
        self.raw_indices.is_empty()
    }

    /// Returns the raw index for each selected grid point, with `ABSENT`
    /// where there is none.
    pub fn raw_indices(&self) -> &[usize] {
        &self.raw_indices
    }

    /// Returns the raw index of the stored point at the given grid point, if any.
    pub fn raw_index(&self, slot: usize) -> Option<usize> {
        self.raw_indices
            .get(slot)
            .copied()
            .filter(|&raw| raw != ABSENT)
    }

    /// Returns the grid points whose stored points have raw indices in
    /// `[first, last)`, in increasing raw index order.
    pub fn slots_in_raw_range(&self, first: usize, last: usize) -> &[usize] {
        let start = self
            .slots_by_raw_index
            .partition_point(|&slot| self.raw_indices[slot] < first);
        let end = self
            .slots_by_raw_index
            .partition_point(|&slot| self.raw_indices[slot] < last);
        &self.slots_by_raw_index[start..end]
    }

    /// Returns statistics of the assignment of stored points.
    pub fn statistics(&self) -> &OrderingStatistics {
        &self.statistics
    }

    /// Whether every selected grid point has a stored point.
    pub fn is_complete(&self) -> bool {
        self.statistics.n_absent_slots == 0
    }
}
