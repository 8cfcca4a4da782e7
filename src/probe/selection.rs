//! Assembly of the per-axis selection of grid points.

use super::{
    axes::{ProbeAxis, ProbeGeometry},
    range::{resolve_range, IndexRange, RangePolicy, RangeRequest, ResolvedRange},
};
use crate::{
    bail_io,
    geometry::{Point3, Vec3},
    io::fco,
};
use std::{collections::BTreeMap, io};

/// How an axis is treated when extracting data.
#[derive(Clone, Debug, PartialEq)]
pub enum AxisDisposition {
    /// The axis is averaged over the given range and removed from the output.
    Averaged(ResolvedRange),
    /// The axis is restricted to the given range.
    Subset(ResolvedRange),
    /// The whole axis is used.
    Default(IndexRange),
}

impl AxisDisposition {
    /// Returns the range of grid indices used along the axis.
    pub fn range(&self) -> &IndexRange {
        match self {
            Self::Averaged(resolved) | Self::Subset(resolved) => resolved.range(),
            Self::Default(range) => range,
        }
    }

    /// Whether the axis is averaged over.
    pub fn is_averaged(&self) -> bool {
        matches!(self, Self::Averaged(_))
    }

    /// Returns a description of the requested range, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Averaged(resolved) | Self::Subset(resolved) => Some(resolved.description()),
            Self::Default(_) => None,
        }
    }
}

/// An axis that remains as a dimension of the extracted data.
#[derive(Clone, Debug)]
pub struct VisibleAxis {
    axis_index: usize,
    label: &'static str,
    units: &'static str,
    centers: Vec<Point3<fco>>,
    displacement: Vec3<fco>,
}

impl VisibleAxis {
    fn new(axis: &ProbeAxis, range: &IndexRange) -> Self {
        Self {
            axis_index: axis.index(),
            label: axis.label(),
            units: axis.units(),
            centers: range
                .indices()
                .map(|index| axis.centers()[index].clone())
                .collect(),
            displacement: axis.displacement().clone(),
        }
    }

    /// Returns the index of the underlying probe axis.
    pub fn axis_index(&self) -> usize {
        self.axis_index
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn units(&self) -> &'static str {
        self.units
    }

    /// Returns the coordinates of the selected grid points along the axis.
    pub fn centers(&self) -> &[Point3<fco>] {
        &self.centers
    }

    /// Returns the vector spanning the whole probe axis.
    pub fn displacement(&self) -> &Vec3<fco> {
        &self.displacement
    }
}

/// Selected grid points along every axis of a probe.
#[derive(Clone, Debug)]
pub struct ProbeSelection {
    dispositions: Vec<AxisDisposition>,
    final_shape: Vec<usize>,
    visible_axes: Vec<VisibleAxis>,
}

impl ProbeSelection {
    /// Assembles the selection for the given geometry from the given subset
    /// and averaging requests, keyed by axis label.
    ///
    /// Axes without a request are used in full.
    pub fn assemble(
        geometry: &ProbeGeometry,
        subset: &BTreeMap<String, RangeRequest>,
        average: &BTreeMap<String, RangeRequest>,
    ) -> io::Result<Self> {
        for label in subset.keys().chain(average.keys()) {
            geometry.axis_index(label)?;
        }

        let mut dispositions = Vec::with_capacity(geometry.n_axes());
        let mut visible_axes = Vec::new();

        for axis in geometry.axes() {
            let label = axis.label();
            let disposition = match (average.get(label), subset.get(label)) {
                (Some(_), Some(_)) => bail_io!(
                    InvalidInput,
                    "`subset` not possible on the same axes as `average` ({})",
                    label
                ),
                (Some(request), None) => AxisDisposition::Averaged(resolve_range(
                    request,
                    axis.distances(),
                    label,
                    axis.units(),
                    RangePolicy::Average,
                )?),
                (None, Some(request)) => AxisDisposition::Subset(resolve_range(
                    request,
                    axis.distances(),
                    label,
                    axis.units(),
                    RangePolicy::Subset,
                )?),
                (None, None) => AxisDisposition::Default(IndexRange::full(axis.len())),
            };
            if !disposition.is_averaged() && disposition.range().len() > 1 {
                visible_axes.push(VisibleAxis::new(axis, disposition.range()));
            }
            dispositions.push(disposition);
        }

        let final_shape = dispositions
            .iter()
            .map(|disposition| disposition.range().len())
            .collect();

        Ok(Self {
            dispositions,
            final_shape,
            visible_axes,
        })
    }

    /// Returns the disposition of each probe axis.
    pub fn dispositions(&self) -> &[AxisDisposition] {
        &self.dispositions
    }

    /// Returns the number of selected grid points along each probe axis,
    /// including averaged axes.
    pub fn final_shape(&self) -> &[usize] {
        &self.final_shape
    }

    /// Returns the total number of selected grid points.
    pub fn n_selected_points(&self) -> usize {
        self.final_shape.iter().product()
    }

    /// Returns the axes that remain as dimensions of the extracted data.
    pub fn visible_axes(&self) -> &[VisibleAxis] {
        &self.visible_axes
    }

    /// Returns the indices of the averaged axes.
    pub fn averaged_axes(&self) -> Vec<usize> {
        self.dispositions
            .iter()
            .enumerate()
            .filter_map(|(idx, disposition)| disposition.is_averaged().then(|| idx))
            .collect()
    }

    /// Computes the position within the selection of the point with the
    /// given grid indices, linearized in row-major order over the final
    /// shape.
    ///
    /// Returns `None` if the point is not selected along every axis.
    pub fn linear_index(&self, grid_indices: &[i64]) -> Option<usize> {
        self.dispositions
            .iter()
            .zip(&self.final_shape)
            .zip(grid_indices)
            .try_fold(0, |linear_index, ((disposition, &length), &index)| {
                disposition
                    .range()
                    .position_of(index)
                    .map(|position| linear_index * length + position)
            })
    }
}
