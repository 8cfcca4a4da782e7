//! Derived quantities computed from recorded probe fields.

pub mod operation;

use crate::io::fdt;
use ndarray::prelude::*;
use std::{collections::HashMap, io};

pub use operation::Operation;

/// Reference unit labels for the recorded fields, keyed by the first
/// letter of the field name.
pub const FIELD_UNITS: [(char, &str); 5] = [
    ('B', "B_r"),
    ('E', "E_r"),
    ('J', "J_r"),
    ('R', "Q_r*N_r"),
    ('P', "V_r*K_r*N_r"),
];

/// Unit label appended to the units of time-integrated fields.
pub const TIME_UNIT: &str = "T_r";

/// Returns the reference unit label of the given recorded field.
///
/// Fields whose kind is not recognized are dimensionless.
pub fn reference_units_of_field(field_name: &str, is_time_integral: bool) -> String {
    let units = field_name
        .chars()
        .next()
        .and_then(|first| {
            FIELD_UNITS
                .iter()
                .find(|(letter, _)| *letter == first)
                .map(|(_, units)| *units)
        })
        .unwrap_or("");
    if is_time_integral {
        if units.is_empty() {
            TIME_UNIT.to_string()
        } else {
            format!("{}*{}", units, TIME_UNIT)
        }
    } else {
        units.to_string()
    }
}

/// Returns the display title of the given recorded field.
pub fn title_of_field(field_name: &str, is_time_integral: bool) -> String {
    if is_time_integral {
        format!("Time-integrated {}", field_name)
    } else {
        field_name.to_string()
    }
}

/// Defines the properties of a quantity derived from recorded fields.
pub trait FieldOperation {
    /// Returns the names of the recorded fields the quantity depends on.
    fn field_names(&self) -> &[String];

    /// Computes the quantity from the given values of each recorded field.
    ///
    /// All value arrays must have the same length.
    fn evaluate(&self, values: &HashMap<String, Array1<fdt>>) -> io::Result<Array1<fdt>>;

    /// Returns the display title of the quantity.
    fn title(&self) -> &str;

    /// Returns the reference units of the quantity.
    fn units(&self) -> &str;

    /// Returns the reference units of the given recorded field, if it is
    /// part of the quantity.
    fn units_of(&self, field_name: &str) -> Option<String>;
}
