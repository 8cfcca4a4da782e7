//! Plotting coordinates for the visible probe axes.

use super::{
    axes::ProbeGeometry,
    selection::{ProbeSelection, VisibleAxis},
};
use crate::{
    bail_io,
    geometry::{
        Dim3::{X, Y},
        Point3, Vec3,
    },
    io::fco,
    io_error,
    num::finite_min_max,
};
use ndarray::prelude::*;
use std::io;

/// Cell edge coordinates of a sampling plane, expressed in the plane's own
/// two-dimensional coordinate system.
#[derive(Clone, Debug)]
pub struct PlaneProjection {
    x_edges: Array2<fco>,
    y_edges: Array2<fco>,
    origin: Option<[fco; 2]>,
}

impl PlaneProjection {
    /// Computes the edge meshes for the plane spanned by the two given axes.
    ///
    /// When the simulation is three-dimensional the edges are expressed in
    /// the basis of the unit vectors along the two axes. When it is
    /// two-dimensional and the box extents are known, the edges are clamped
    /// to the box.
    pub fn compute(
        first: &VisibleAxis,
        second: &VisibleAxis,
        ambient_dims: usize,
        box_extents: Option<&[fco]>,
    ) -> io::Result<Self> {
        let (first_edges, second_edges) = Self::compute_edges(first, second)?;

        let (first_coords, second_coords, origin) = if ambient_dims == 3 {
            let (first_coords, second_coords, origin) =
                Self::project_edges(first, second, &first_edges, &second_edges)?;
            (first_coords, second_coords, Some(origin))
        } else {
            let in_plane = |edges: &[Point3<fco>]| -> Vec<[fco; 2]> {
                edges.iter().map(|edge| [edge[X], edge[Y]]).collect()
            };
            (in_plane(&first_edges), in_plane(&second_edges), None)
        };

        let shape = (first_coords.len(), second_coords.len());
        let mut x_edges = Array2::from_shape_fn(shape, |(i, j)| {
            first_coords[i][0] + (second_coords[j][0] - second_coords[0][0])
        });
        let mut y_edges = Array2::from_shape_fn(shape, |(i, j)| {
            first_coords[i][1] + (second_coords[j][1] - second_coords[0][1])
        });

        if ambient_dims == 2 {
            if let Some(box_extents) = box_extents {
                x_edges.mapv_inplace(|x| x.max(0.0).min(box_extents[0]));
                y_edges.mapv_inplace(|y| y.max(0.0).min(box_extents[1]));
            }
        }

        Ok(Self {
            x_edges,
            y_edges,
            origin,
        })
    }

    /// Appends an edge beyond the last grid point of each axis and shifts all
    /// edges by half a grid separation along both axes.
    fn compute_edges(
        first: &VisibleAxis,
        second: &VisibleAxis,
    ) -> io::Result<(Vec<Point3<fco>>, Vec<Point3<fco>>)> {
        let separation = |axis: &VisibleAxis| -> io::Result<Vec3<fco>> {
            match axis.centers() {
                [first, second, ..] => Ok(second - first),
                _ => Err(io_error!(
                    InvalidInput,
                    "Axis {} needs at least two points to span a plane",
                    axis.label()
                )),
            }
        };
        let first_separation = separation(first)?;
        let second_separation = separation(second)?;
        let shift = -&(&(&first_separation + &second_separation) * 0.5);

        let edges = |axis: &VisibleAxis, separation: &Vec3<fco>| -> Vec<Point3<fco>> {
            let centers = axis.centers();
            centers
                .iter()
                .cloned()
                .chain(std::iter::once(&centers[centers.len() - 1] + separation))
                .map(|edge| &edge + &shift)
                .collect()
        };
        Ok((
            edges(first, &first_separation),
            edges(second, &second_separation),
        ))
    }

    /// Expresses the edges in the basis of the unit vectors along the two
    /// axes, with the origin at the projection of the simulation origin.
    #[allow(clippy::type_complexity)]
    fn project_edges(
        first: &VisibleAxis,
        second: &VisibleAxis,
        first_edges: &[Point3<fco>],
        second_edges: &[Point3<fco>],
    ) -> io::Result<(Vec<[fco; 2]>, Vec<[fco; 2]>, [fco; 2])> {
        let unit_vector = |axis: &VisibleAxis| {
            axis.displacement().normalized().ok_or_else(|| {
                io_error!(
                    InvalidInput,
                    "Axis {} has zero length and cannot span a plane",
                    axis.label()
                )
            })
        };
        let u1 = unit_vector(first)?;
        let u2 = unit_vector(second)?;
        let u1u2 = u1.dot(&u2);
        let denominator = 1.0 - u1u2 * u1u2;
        if denominator <= fco::EPSILON {
            bail_io!(
                InvalidInput,
                "Axes {} and {} are parallel and cannot span a plane",
                first.label(),
                second.label()
            );
        }

        let first_origin = first_edges[0].to_vec3();
        let ox = first_origin.dot(&u1);
        let oy = (first_origin.dot(&u2) - ox * u1u2) / denominator;

        let first_coords = first_edges
            .iter()
            .map(|edge| [(edge - &first_edges[0]).dot(&u1) + ox, oy])
            .collect();
        let second_coords = second_edges
            .iter()
            .map(|edge| {
                let offset = edge - &second_edges[0];
                [offset.dot(&u1) + ox, offset.dot(&u2) + oy]
            })
            .collect();
        Ok((first_coords, second_coords, [ox, oy]))
    }

    /// Returns the mesh of horizontal edge coordinates.
    pub fn x_edges(&self) -> &Array2<fco> {
        &self.x_edges
    }

    /// Returns the mesh of vertical edge coordinates.
    pub fn y_edges(&self) -> &Array2<fco> {
        &self.y_edges
    }

    /// Returns the in-plane origin offset, if the plane was projected from 3D.
    pub fn origin(&self) -> Option<[fco; 2]> {
        self.origin
    }
}

fn value_limits<'a, I: IntoIterator<Item = &'a fco>>(values: I) -> [fco; 2] {
    finite_min_max(values).unwrap_or([fco::NAN, fco::NAN])
}

/// Coordinates used for plotting extracted probe data.
#[derive(Clone, Debug)]
pub enum PlotCoordinates {
    /// No visible axes.
    Point,
    /// One visible axis, with the distance of each grid point from the first.
    Line(Vec<fco>),
    /// Two visible axes, with cell edge meshes.
    Plane(PlaneProjection),
    /// Three visible axes, which have no plotting coordinates.
    Volume,
}

impl PlotCoordinates {
    /// Computes the plotting coordinates for the visible axes of the given selection.
    pub fn compute(geometry: &ProbeGeometry, selection: &ProbeSelection) -> io::Result<Self> {
        match selection.visible_axes() {
            [] => Ok(Self::Point),
            [axis] => {
                let centers = axis.centers();
                Ok(Self::Line(
                    centers
                        .iter()
                        .map(|center| (center - &centers[0]).length())
                        .collect(),
                ))
            }
            [first, second] => Ok(Self::Plane(PlaneProjection::compute(
                first,
                second,
                geometry.ambient_dims(),
                geometry.box_extents(),
            )?)),
            _ => Ok(Self::Volume),
        }
    }

    /// Returns the `[min, max]` limits of the coordinates along each visible axis.
    pub fn limits(&self) -> io::Result<Vec<[fco; 2]>> {
        match self {
            Self::Point => Ok(Vec::new()),
            Self::Line(distances) => Ok(vec![value_limits(distances)]),
            Self::Plane(projection) => Ok(vec![
                value_limits(projection.x_edges()),
                value_limits(projection.y_edges()),
            ]),
            Self::Volume => Err(io_error!(
                InvalidInput,
                "Limits are only available for probes with at most 2 visible axes"
            )),
        }
    }
}
