//! Resolution of requested axis ranges into index ranges.

use crate::{bail_io, io::fco, io_error};
use std::{fmt, io, str::FromStr};

/// Range of grid points requested along a probe axis.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeRequest {
    /// The whole axis.
    All,
    /// The grid point nearest the given distance from the start of the axis.
    Nearest(fco),
    /// All grid points whose distance from the start of the axis lies in
    /// `[start, end]`, keeping every `step`th point.
    Between { start: fco, end: fco, step: usize },
    /// Grid points with indices in `[start, stop)`, keeping every `step`th point.
    Indices {
        start: usize,
        stop: usize,
        step: usize,
    },
}

impl RangeRequest {
    fn parse_step(text: &str, request: &str) -> io::Result<usize> {
        match text.trim().parse::<usize>() {
            Ok(step) if step > 0 => Ok(step),
            _ => Err(io_error!(
                InvalidInput,
                "Invalid step {} in range {}: must be a positive integer",
                text.trim(),
                request
            )),
        }
    }

    fn parse_index(text: &str, request: &str) -> io::Result<usize> {
        text.trim().parse::<usize>().map_err(|err| {
            io_error!(
                InvalidInput,
                "Invalid index {} in range {}: {}",
                text.trim(),
                request,
                err
            )
        })
    }

    fn parse_distance(text: &str, request: &str) -> io::Result<fco> {
        match text.trim().parse::<fco>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(io_error!(
                InvalidInput,
                "Invalid distance {} in range {}",
                text.trim(),
                request
            )),
        }
    }
}

impl FromStr for RangeRequest {
    type Err = io::Error;

    /// Parses a range from one of the forms `all`, `d`, `d0,d1`, `d0,d1,step`
    /// or `#start:stop[:step]`.
    fn from_str(request: &str) -> io::Result<Self> {
        let trimmed = request.trim();
        if trimmed == "all" {
            return Ok(Self::All);
        }
        if let Some(indices) = trimmed.strip_prefix('#') {
            let parts: Vec<&str> = indices.split(':').collect();
            return match parts.as_slice() {
                [start, stop] => Ok(Self::Indices {
                    start: Self::parse_index(start, request)?,
                    stop: Self::parse_index(stop, request)?,
                    step: 1,
                }),
                [start, stop, step] => Ok(Self::Indices {
                    start: Self::parse_index(start, request)?,
                    stop: Self::parse_index(stop, request)?,
                    step: Self::parse_step(step, request)?,
                }),
                _ => Err(io_error!(
                    InvalidInput,
                    "Invalid index range {}: expected #start:stop or #start:stop:step",
                    request
                )),
            };
        }
        let parts: Vec<&str> = trimmed.split(',').collect();
        match parts.as_slice() {
            [value] => Ok(Self::Nearest(Self::parse_distance(value, request)?)),
            [start, end] => Ok(Self::Between {
                start: Self::parse_distance(start, request)?,
                end: Self::parse_distance(end, request)?,
                step: 1,
            }),
            [start, end, step] => Ok(Self::Between {
                start: Self::parse_distance(start, request)?,
                end: Self::parse_distance(end, request)?,
                step: Self::parse_step(step, request)?,
            }),
            _ => Err(io_error!(
                InvalidInput,
                "Invalid range {}: expected all, d, d0,d1, d0,d1,step or #start:stop[:step]",
                request
            )),
        }
    }
}

impl fmt::Display for RangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Nearest(value) => write!(f, "{}", value),
            Self::Between { start, end, step } if *step == 1 => write!(f, "{},{}", start, end),
            Self::Between { start, end, step } => write!(f, "{},{},{}", start, end, step),
            Self::Indices { start, stop, step } if *step == 1 => write!(f, "#{}:{}", start, stop),
            Self::Indices { start, stop, step } => write!(f, "#{}:{}:{}", start, stop, step),
        }
    }
}

/// Strided half-open range of grid indices along an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRange {
    start: usize,
    stop: usize,
    step: usize,
}

impl IndexRange {
    /// Creates a new index range.
    ///
    /// Returns `None` if the range is empty or the step is zero.
    pub fn new(start: usize, stop: usize, step: usize) -> Option<Self> {
        if start < stop && step > 0 {
            Some(Self { start, stop, step })
        } else {
            None
        }
    }

    /// Creates the range covering all of the given number of grid points.
    pub fn full(length: usize) -> Self {
        Self {
            start: 0,
            stop: length.max(1),
            step: 1,
        }
    }

    /// Creates the range containing only the given index.
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            stop: index + 1,
            step: 1,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn stop(&self) -> usize {
        self.stop
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Returns the number of indices in the range.
    pub fn len(&self) -> usize {
        (self.stop - self.start + self.step - 1) / self.step
    }

    /// Whether the range contains no indices. Never true for a constructed range.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the position within the range of the given grid index,
    /// or `None` if the range does not contain it.
    pub fn position_of(&self, index: i64) -> Option<usize> {
        let start = self.start as i64;
        if index < start || index >= self.stop as i64 {
            return None;
        }
        let offset = (index - start) as usize;
        if offset % self.step == 0 {
            Some(offset / self.step)
        } else {
            None
        }
    }

    /// Returns the grid indices contained in the range.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        (self.start..self.stop).step_by(self.step)
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.step == 1 {
            write!(f, "[{}:{}]", self.start, self.stop)
        } else {
            write!(f, "[{}:{}:{}]", self.start, self.stop, self.step)
        }
    }
}

/// How a resolved range will be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangePolicy {
    /// The axis is restricted to the range and remains in the output.
    Subset,
    /// The axis is averaged over the range and removed from the output.
    Average,
}

impl RangePolicy {
    pub fn name(self) -> &'static str {
        match self {
            Self::Subset => "subset",
            Self::Average => "average",
        }
    }
}

/// Index range resolved from a request, with a description of what it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRange {
    range: IndexRange,
    is_single_point: bool,
    description: String,
}

impl ResolvedRange {
    /// Returns the resolved index range.
    pub fn range(&self) -> &IndexRange {
        &self.range
    }

    /// Returns the number of grid points in the range.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the range contains no grid points. Never true for a resolved range.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Whether the range was requested as a single point.
    pub fn is_single_point(&self) -> bool {
        self.is_single_point
    }

    /// Returns a human readable description of the range.
    pub fn description(&self) -> &str {
        &self.description
    }
}

fn nearest_index(distances: &[fco], value: fco) -> usize {
    distances
        .iter()
        .enumerate()
        .fold((0, fco::INFINITY), |(best_idx, best_diff), (idx, &distance)| {
            let diff = (distance - value).abs();
            if diff < best_diff {
                (idx, diff)
            } else {
                (best_idx, best_diff)
            }
        })
        .0
}

/// Resolves the given request into an index range along an axis whose grid
/// points lie at the given distances from the first grid point.
///
/// # Parameters
///
/// - `request`: Requested range.
/// - `distances`: Distance of each grid point from the first one (non-decreasing).
/// - `label`: Label of the axis, used in descriptions and errors.
/// - `units`: Unit label of the distances.
/// - `policy`: Whether the range is a subset or an averaging range.
///
/// # Returns
///
/// An `io::Result` which is either:
///
/// - `Ok`: Contains the resolved range.
/// - `Err`: Contains an error if the request selects no grid points or is
///   otherwise invalid for the axis.
pub fn resolve_range(
    request: &RangeRequest,
    distances: &[fco],
    label: &str,
    units: &str,
    policy: RangePolicy,
) -> io::Result<ResolvedRange> {
    let n_points = distances.len();
    if n_points == 0 {
        bail_io!(InvalidInput, "Axis {} has no grid points", label);
    }
    let (min_distance, max_distance) = (distances[0], distances[n_points - 1]);
    let name = policy.name();

    match *request {
        RangeRequest::All => Ok(ResolvedRange {
            range: IndexRange::full(n_points),
            is_single_point: false,
            description: format!(
                "{} for {} from {} to {} {}",
                name, label, min_distance, max_distance, units
            ),
        }),
        RangeRequest::Nearest(value) => {
            if value < min_distance || value > max_distance {
                bail_io!(
                    InvalidInput,
                    "Argument `{}` for {} out of range: {} not in [{}, {}] {}",
                    name,
                    label,
                    value,
                    min_distance,
                    max_distance,
                    units
                );
            }
            let index = nearest_index(distances, value);
            Ok(ResolvedRange {
                range: IndexRange::single(index),
                is_single_point: true,
                description: format!("{} for {} = {} {}", name, label, distances[index], units),
            })
        }
        RangeRequest::Between { start, end, step } => {
            if policy == RangePolicy::Average && step != 1 {
                bail_io!(
                    InvalidInput,
                    "Argument `average` for {} does not accept a step",
                    label
                );
            }
            let first = distances
                .iter()
                .position(|&distance| distance >= start && distance <= end);
            let last = distances
                .iter()
                .rposition(|&distance| distance >= start && distance <= end);
            match (first, last) {
                (Some(first), Some(last)) => Ok(ResolvedRange {
                    range: IndexRange::new(first, last + 1, step).ok_or_else(|| {
                        io_error!(InvalidInput, "Invalid step for {}", label)
                    })?,
                    is_single_point: false,
                    description: format!(
                        "{} for {} from {} to {} {}",
                        name, label, distances[first], distances[last], units
                    ),
                }),
                _ => Err(io_error!(
                    InvalidInput,
                    "Argument `{}` for {} out of range: [{}, {}] does not overlap [{}, {}] {}",
                    name,
                    label,
                    start,
                    end,
                    min_distance,
                    max_distance,
                    units
                )),
            }
        }
        RangeRequest::Indices { start, stop, step } => {
            if policy == RangePolicy::Average && step != 1 {
                bail_io!(
                    InvalidInput,
                    "Argument `average` for {} does not accept a step",
                    label
                );
            }
            let range = IndexRange::new(start, usize::min(stop, n_points), step)
                .ok_or_else(|| {
                    io_error!(
                        InvalidInput,
                        "Argument `{}` for {} selects no points: indices #{}:{} with {} points on the axis",
                        name,
                        label,
                        start,
                        stop,
                        n_points
                    )
                })?;
            Ok(ResolvedRange {
                range,
                is_single_point: false,
                description: format!(
                    "{} for {} from {} to {} {}",
                    name,
                    label,
                    distances[range.start()],
                    distances[range.stop() - 1],
                    units
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    const DISTANCES: [fco; 5] = [0.0, 0.5, 1.0, 1.5, 2.0];

    fn resolve(request: &str, policy: RangePolicy) -> io::Result<ResolvedRange> {
        resolve_range(
            &request.parse().unwrap(),
            &DISTANCES,
            "axis1",
            "L_r",
            policy,
        )
    }

    #[test]
    fn parsing_requests_works() {
        assert_eq!("all".parse::<RangeRequest>().unwrap(), RangeRequest::All);
        assert_eq!(
            " 0.7 ".parse::<RangeRequest>().unwrap(),
            RangeRequest::Nearest(0.7)
        );
        assert_eq!(
            "0.5,1.5,2".parse::<RangeRequest>().unwrap(),
            RangeRequest::Between {
                start: 0.5,
                end: 1.5,
                step: 2
            }
        );
        assert_eq!(
            "#1:3".parse::<RangeRequest>().unwrap(),
            RangeRequest::Indices {
                start: 1,
                stop: 3,
                step: 1
            }
        );
        for invalid in ["", "a", "1,2,0", "1,2,3,4", "#1", "#a:2", "nan"] {
            assert!(invalid.parse::<RangeRequest>().is_err(), "{}", invalid);
        }
        assert_eq!(
            "0.5,1.5,2".parse::<RangeRequest>().unwrap().to_string(),
            "0.5,1.5,2"
        );
    }

    #[test]
    fn index_range_positions_respect_stride() {
        let range = IndexRange::new(1, 8, 3).unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![1, 4, 7]);
        assert_eq!(range.position_of(4), Some(1));
        assert_eq!(range.position_of(7), Some(2));
        assert_eq!(range.position_of(5), None);
        assert_eq!(range.position_of(0), None);
        assert_eq!(range.position_of(8), None);
        assert_eq!(range.position_of(-2), None);
        assert!(IndexRange::new(3, 3, 1).is_none());
    }

    #[test]
    fn distance_ranges_resolve_to_enclosed_indices() {
        let resolved = resolve("0.4,1.6", RangePolicy::Subset).unwrap();
        assert_eq!(*resolved.range(), IndexRange::new(1, 4, 1).unwrap());
        assert_eq!(resolved.description(), "subset for axis1 from 0.5 to 1.5 L_r");

        let strided = resolve("0,2,2", RangePolicy::Subset).unwrap();
        assert_eq!(strided.len(), 3);

        let whole = resolve("all", RangePolicy::Average).unwrap();
        assert_eq!(*whole.range(), IndexRange::full(5));
    }

    #[test]
    fn single_values_resolve_to_nearest_point() {
        let resolved = resolve("1.3", RangePolicy::Subset).unwrap();
        assert!(resolved.is_single_point());
        assert_eq!(*resolved.range(), IndexRange::single(3));
        assert_eq!(resolved.description(), "subset for axis1 = 1.5 L_r");
    }

    #[test]
    fn empty_or_invalid_selections_fail() {
        assert!(resolve("2.5", RangePolicy::Subset).is_err());
        assert!(resolve("0.6,0.9", RangePolicy::Subset).is_err());
        assert!(resolve("#5:7", RangePolicy::Subset).is_err());
        assert!(resolve("0,2,2", RangePolicy::Average).is_err());
        assert_eq!(
            *resolve("#3:10", RangePolicy::Subset).unwrap().range(),
            IndexRange::new(3, 5, 1).unwrap()
        );
    }
}
