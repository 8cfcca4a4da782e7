//! Extraction of ordered field values at a given timestep.

use super::{
    ordering::{ChunkedRange, PointOrdering},
    selection::ProbeSelection,
};
use crate::{
    field::FieldOperation,
    io::{fdt, probe::ProbeStore},
    io_error,
};
use ndarray::prelude::*;
use std::{collections::HashMap, io};

/// Gathers the values of the given field at the given timestep into grid
/// order, reading `chunk_size` stored points at a time.
///
/// Grid points with no stored point are NaN.
pub fn gather_field_values<S: ProbeStore + ?Sized>(
    store: &S,
    ordering: &PointOrdering,
    timestep: u64,
    field_index: usize,
    chunk_size: usize,
) -> io::Result<Array1<fdt>> {
    let mut buffer = Array1::from_elem(ordering.len(), fdt::NAN);
    let raw_indices = ordering.raw_indices();

    for (first, last) in ChunkedRange::new(store.metadata().n_points(), chunk_size)? {
        let slots = ordering.slots_in_raw_range(first, last);
        if slots.is_empty() {
            continue;
        }
        let values = store.read_field_values(timestep, field_index, first, last)?;
        for &slot in slots {
            buffer[slot] = values[raw_indices[slot] - first];
        }
    }
    Ok(buffer)
}

/// Averages the given grid-ordered values over the averaged axes of the
/// selection and removes all axes of length one.
pub fn reduce_to_visible_axes(
    values: Array1<fdt>,
    selection: &ProbeSelection,
) -> io::Result<ArrayD<fdt>> {
    let shape_error =
        |err: ndarray::ShapeError| io_error!(InvalidData, "Invalid shape of probe data: {}", err);

    let mut array = values
        .into_shape(IxDyn(selection.final_shape()))
        .map_err(shape_error)?;

    for axis in selection.averaged_axes() {
        array = array
            .mean_axis(Axis(axis))
            .ok_or_else(|| io_error!(InvalidData, "Cannot average over empty axis {}", axis))?
            .insert_axis(Axis(axis));
    }

    let squeezed_shape: Vec<usize> = array
        .shape()
        .iter()
        .copied()
        .filter(|&length| length != 1)
        .collect();
    array
        .as_standard_layout()
        .into_owned()
        .into_shape(IxDyn(&squeezed_shape))
        .map_err(shape_error)
}

/// Computes the given derived quantity at the given timestep, with
/// averaged axes reduced and axes of length one removed.
pub fn extract_quantity<S, O>(
    store: &S,
    ordering: &PointOrdering,
    selection: &ProbeSelection,
    operation: &O,
    timestep: u64,
    chunk_size: usize,
) -> io::Result<ArrayD<fdt>>
where
    S: ProbeStore + ?Sized,
    O: FieldOperation + ?Sized,
{
    let metadata = store.metadata();
    let mut field_values = HashMap::with_capacity(operation.field_names().len());
    for field_name in operation.field_names() {
        let field_index = metadata.field_index(field_name).ok_or_else(|| {
            io_error!(
                InvalidInput,
                "No field `{}` in probe #{}\n\
                 Available fields: {}",
                field_name,
                metadata.probe_number(),
                metadata.field_names().join(", ")
            )
        })?;
        field_values.insert(
            field_name.clone(),
            gather_field_values(store, ordering, timestep, field_index, chunk_size)?,
        );
    }
    let combined = operation.evaluate(&field_values)?;
    reduce_to_visible_axes(combined, selection)
}

#[cfg(test)]
mod tests {

    use super::{super::axes::ProbeGeometry, *};
    use crate::{
        field::Operation,
        io::{
            fco,
            probe::{MemoryProbeStore, ProbeMetadata},
            Verbosity,
        },
    };
    use approx::assert_abs_diff_eq;
    use std::collections::BTreeMap;

    /// A 4 x 3 x 2 grid with unit spacing, stored in reverse order, where
    /// field `Ex` has value `100 i + 10 j + k` and `Ey` is constant.
    fn reversed_volume() -> MemoryProbeStore {
        let shape = [4, 3, 2];
        let n_points = 24;
        let grid_index = |raw: usize| {
            let linear = n_points - 1 - raw;
            (linear / 6, (linear / 2) % 3, linear % 2)
        };
        let metadata = ProbeMetadata::new(
            7,
            shape.to_vec(),
            vec![0.0; 3],
            vec![vec![3.0, 0.0, 0.0], vec![0.0, 2.0, 0.0], vec![0.0, 0.0, 1.0]],
            vec!["Ex".to_string(), "Ey".to_string()],
            false,
            n_points,
        )
        .unwrap();
        let positions = Array2::from_shape_fn((n_points, 3), |(raw, dim)| {
            let (i, j, k) = grid_index(raw);
            [i, j, k][dim] as fco
        });
        let mut store = MemoryProbeStore::new(metadata, positions).unwrap();
        let values = Array2::from_shape_fn((2, n_points), |(field, raw)| {
            let (i, j, k) = grid_index(raw);
            if field == 0 {
                (100 * i + 10 * j + k) as fdt
            } else {
                2.0
            }
        });
        store.insert_timestep(10, values, None).unwrap();
        store
    }

    fn extract(
        store: &MemoryProbeStore,
        expression: &str,
        subset: &[(&str, &str)],
        average: &[(&str, &str)],
        chunk_size: usize,
    ) -> ArrayD<fdt> {
        let to_requests = |entries: &[(&str, &str)]| -> BTreeMap<_, _> {
            entries
                .iter()
                .map(|(label, request)| (label.to_string(), request.parse().unwrap()))
                .collect()
        };
        let geometry = ProbeGeometry::from_metadata(store.metadata()).unwrap();
        let selection =
            ProbeSelection::assemble(&geometry, &to_requests(subset), &to_requests(average))
                .unwrap();
        let ordering =
            PointOrdering::build(store, &geometry, &selection, chunk_size, &Verbosity::Quiet)
                .unwrap();
        let operation =
            Operation::new(expression, store.metadata().field_names(), false).unwrap();
        extract_quantity(store, &ordering, &selection, &operation, 10, chunk_size).unwrap()
    }

    #[test]
    fn extracted_values_reproduce_grid_values() {
        let store = reversed_volume();
        let values = extract(&store, "Ex", &[], &[], 5);
        assert_eq!(values.shape(), &[4, 3, 2]);
        for ((i, j, k), &value) in values
            .into_dimensionality::<Ix3>()
            .unwrap()
            .indexed_iter()
        {
            assert_eq!(value, (100 * i + 10 * j + k) as fdt);
        }
    }

    #[test]
    fn averaging_gives_mean_of_unaveraged_values() {
        let store = reversed_volume();
        let full = extract(&store, "Ex*Ey", &[], &[], 24)
            .into_dimensionality::<Ix3>()
            .unwrap();
        let averaged = extract(&store, "Ex*Ey", &[], &[("axis2", "all")], 7)
            .into_dimensionality::<Ix2>()
            .unwrap();
        assert_eq!(averaged.shape(), &[4, 2]);
        let expected = full.mean_axis(Axis(1)).unwrap();
        for (value, expected) in averaged.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*value, *expected, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(averaged[[2, 1]], 2.0 * 211.0, epsilon = 1e-12);
    }

    #[test]
    fn subsets_and_single_points_are_squeezed() {
        let store = reversed_volume();
        let values = extract(&store, "Ex", &[("axis1", "1,2"), ("axis3", "1")], &[], 3)
            .into_dimensionality::<Ix2>()
            .unwrap();
        assert_eq!(values.shape(), &[2, 3]);
        assert_eq!(values[[0, 0]], 101.0);
        assert_eq!(values[[1, 2]], 221.0);

        let averaged_everywhere = extract(
            &store,
            "Ey - Ex",
            &[],
            &[("axis1", "all"), ("axis2", "all"), ("axis3", "all")],
            4,
        );
        assert_eq!(averaged_everywhere.ndim(), 0);
        assert_abs_diff_eq!(
            averaged_everywhere
                .into_dimensionality::<Ix0>()
                .unwrap()
                .into_scalar(),
            2.0 - 160.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn chunk_size_does_not_affect_values() {
        let store = reversed_volume();
        let single_chunk = extract(&store, "Ex + Ey", &[("axis2", "#0:3:2")], &[], 24);
        let many_chunks = extract(&store, "Ex + Ey", &[("axis2", "#0:3:2")], &[], 1);
        assert_eq!(single_chunk, many_chunks);
    }

    #[test]
    fn absent_grid_points_are_nan() {
        let selection_shape = [3];
        let metadata = ProbeMetadata::new(
            0,
            selection_shape.to_vec(),
            vec![0.0],
            vec![vec![2.0]],
            vec!["Ex".to_string()],
            false,
            2,
        )
        .unwrap();
        let mut store = MemoryProbeStore::new(metadata, array![[2.0], [0.0]]).unwrap();
        store
            .insert_timestep(10, array![[5.0, 6.0]], None)
            .unwrap();
        let values = extract(&store, "Ex", &[], &[], 1)
            .into_dimensionality::<Ix1>()
            .unwrap();
        assert_eq!(values[[0]], 6.0);
        assert!(values[[1]].is_nan());
        assert_eq!(values[[2]], 5.0);
    }
}
