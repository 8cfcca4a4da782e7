//! Geometry of the probe sampling axes.

use crate::{
    geometry::{Point3, Vec3},
    io::{fco, probe::ProbeMetadata},
    io_error,
};
use std::io;

/// Labels of the probe axes, in axis order.
pub const AXIS_LABELS: [&str; 3] = ["axis1", "axis2", "axis3"];

/// Reference unit label of probe axis coordinates.
pub const AXIS_UNITS: &str = "L_r";

/// A single sampling axis of a probe.
#[derive(Clone, Debug)]
pub struct ProbeAxis {
    index: usize,
    displacement: Vec3<fco>,
    centers: Vec<Point3<fco>>,
    distances: Vec<fco>,
}

impl ProbeAxis {
    /// Creates the axis running from the given reference point to the given
    /// end point, with the given number of evenly spaced grid points
    /// including both ends.
    pub fn new(
        index: usize,
        reference_point: &Point3<fco>,
        end_point: &Point3<fco>,
        n_points: usize,
    ) -> Self {
        let displacement = end_point - reference_point;
        let centers: Vec<Point3<fco>> = (0..n_points)
            .map(|k| {
                if n_points > 1 {
                    reference_point + &(&displacement * (k as fco / (n_points - 1) as fco))
                } else {
                    reference_point.clone()
                }
            })
            .collect();
        let distances = centers
            .iter()
            .map(|center| (center - &centers[0]).length())
            .collect();
        Self {
            index,
            displacement,
            centers,
            distances,
        }
    }

    /// Returns the index of the axis.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the label of the axis.
    pub fn label(&self) -> &'static str {
        AXIS_LABELS[self.index]
    }

    /// Returns the reference unit label of the axis coordinates.
    pub fn units(&self) -> &'static str {
        AXIS_UNITS
    }

    /// Returns the number of grid points along the axis.
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Whether the axis has no grid points.
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Returns the vector from the reference point to the end point of the axis.
    pub fn displacement(&self) -> &Vec3<fco> {
        &self.displacement
    }

    /// Returns the coordinates of the grid points along the axis.
    pub fn centers(&self) -> &[Point3<fco>] {
        &self.centers
    }

    /// Returns the distance of each grid point from the first one.
    pub fn distances(&self) -> &[fco] {
        &self.distances
    }
}

/// Complete sampling geometry of a probe.
#[derive(Clone, Debug)]
pub struct ProbeGeometry {
    ambient_dims: usize,
    reference_point: Point3<fco>,
    axes: Vec<ProbeAxis>,
    n_points: usize,
    box_extents: Option<Vec<fco>>,
}

impl ProbeGeometry {
    /// Derives the sampling geometry from the given probe metadata.
    ///
    /// A probe whose declared shape contains a single point in total is
    /// treated as having no axes.
    pub fn from_metadata(metadata: &ProbeMetadata) -> io::Result<Self> {
        let to_point = |components: &[fco]| {
            Point3::from_padded_slice(components).ok_or_else(|| {
                io_error!(
                    InvalidData,
                    "Probe #{} has points with more than 3 components",
                    metadata.probe_number()
                )
            })
        };
        let reference_point = to_point(metadata.reference_point())?;

        let axes = if metadata.shape().iter().product::<usize>() == 1 {
            Vec::new()
        } else {
            metadata
                .shape()
                .iter()
                .zip(metadata.end_points())
                .enumerate()
                .map(|(index, (&n_points, end_point))| {
                    Ok(ProbeAxis::new(
                        index,
                        &reference_point,
                        &to_point(end_point)?,
                        n_points,
                    ))
                })
                .collect::<io::Result<Vec<_>>>()?
        };

        Ok(Self {
            ambient_dims: metadata.ambient_dims(),
            reference_point,
            axes,
            n_points: metadata.n_points(),
            box_extents: metadata.box_extents().map(<[fco]>::to_vec),
        })
    }

    /// Returns the number of spatial dimensions of the simulation.
    pub fn ambient_dims(&self) -> usize {
        self.ambient_dims
    }

    /// Returns the position of the first probe point.
    pub fn reference_point(&self) -> &Point3<fco> {
        &self.reference_point
    }

    /// Returns the number of sampling axes.
    pub fn n_axes(&self) -> usize {
        self.axes.len()
    }

    /// Returns the sampling axes.
    pub fn axes(&self) -> &[ProbeAxis] {
        &self.axes
    }

    /// Returns the number of grid points along each axis.
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(ProbeAxis::len).collect()
    }

    /// Returns the total number of stored points.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Returns the extents of the simulation box, if known.
    pub fn box_extents(&self) -> Option<&[fco]> {
        self.box_extents.as_deref()
    }

    /// Returns the index of the axis with the given label.
    pub fn axis_index(&self, label: &str) -> io::Result<usize> {
        AXIS_LABELS[..self.n_axes()]
            .iter()
            .position(|&axis_label| axis_label == label)
            .ok_or_else(|| {
                io_error!(
                    InvalidInput,
                    "No axis `{}` for a {}-dimensional probe\n\
                     Valid axes: {}",
                    label,
                    self.n_axes(),
                    if self.n_axes() == 0 {
                        "none".to_string()
                    } else {
                        AXIS_LABELS[..self.n_axes()].join(", ")
                    }
                )
            })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn axis_centers_interpolate_between_end_points() {
        let axis = ProbeAxis::new(
            1,
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(4.0, 4.0, 0.0),
            4,
        );
        assert_eq!(axis.label(), "axis2");
        assert_eq!(axis.len(), 4);
        assert_abs_diff_eq!(axis.centers()[0], Point3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(axis.centers()[3], Point3::new(4.0, 4.0, 0.0));
        assert_abs_diff_eq!(axis.centers()[1], Point3::new(2.0, 4.0 / 3.0, 0.0));
        assert_abs_diff_eq!(axis.distances()[2], 10.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn line_distances_are_monotonic() {
        let axis = ProbeAxis::new(
            0,
            &Point3::new(-2.0, 3.0, 1.0),
            &Point3::new(5.0, -1.0, 0.5),
            17,
        );
        assert_eq!(axis.distances()[0], 0.0);
        assert!(axis
            .distances()
            .windows(2)
            .all(|pair| pair[1] >= pair[0]));
        assert_abs_diff_eq!(
            axis.distances()[16],
            axis.displacement().length(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn single_point_probe_has_no_axes() {
        let metadata = ProbeMetadata::new(
            2,
            vec![1, 1],
            vec![0.5, 0.5],
            vec![vec![1.0, 0.5], vec![0.5, 1.0]],
            vec!["Ex".to_string()],
            false,
            1,
        )
        .unwrap();
        let geometry = ProbeGeometry::from_metadata(&metadata).unwrap();
        assert_eq!(geometry.n_axes(), 0);
        assert!(geometry.shape().is_empty());
        assert!(geometry.axis_index("axis1").is_err());
    }

    #[test]
    fn axis_lookup_lists_valid_labels() {
        let metadata = ProbeMetadata::new(
            0,
            vec![4, 1, 1],
            vec![0.0; 3],
            vec![vec![3.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
            vec!["Ex".to_string()],
            false,
            4,
        )
        .unwrap();
        let geometry = ProbeGeometry::from_metadata(&metadata).unwrap();
        assert_eq!(geometry.shape(), vec![4, 1, 1]);
        assert_eq!(geometry.axis_index("axis3").unwrap(), 2);
        let err = geometry.axis_index("axis4").unwrap_err();
        assert!(err.to_string().contains("axis1, axis2, axis3"));
    }
}
