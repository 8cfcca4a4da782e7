//! File input/output.

pub mod probe;
pub mod utils;

use indicatif::{ProgressBar, ProgressStyle};

/// Floating-point precision used for field values.
#[allow(non_camel_case_types)]
pub type fdt = f64;

/// Floating-point precision used for point coordinates.
#[allow(non_camel_case_types)]
pub type fco = f64;

/// Little- or big-endian byte order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endianness {
    Little,
    Big,
    Native,
}

impl Endianness {
    /// Returns the explicit byte order, resolving `Native` to that of the target.
    pub fn resolved(self) -> Self {
        match self {
            Self::Native => {
                if cfg!(target_endian = "little") {
                    Self::Little
                } else {
                    Self::Big
                }
            }
            explicit => explicit,
        }
    }

    /// Returns the name used for the byte order in parameter files.
    pub fn name(self) -> &'static str {
        match self.resolved() {
            Self::Big => "big",
            _ => "little",
        }
    }

    /// Parses the byte order from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "little" => Some(Self::Little),
            "big" => Some(Self::Big),
            "native" => Some(Self::Native),
            _ => None,
        }
    }
}

/// How much status information to print.
#[derive(Clone, Debug)]
pub enum Verbosity {
    Quiet,
    Messages,
    Progress(ProgressStyle),
}

impl Verbosity {
    /// Whether non-critical status messages should be printed.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Whether progress bars should be shown.
    pub fn show_progress(&self) -> bool {
        matches!(self, Self::Progress(_))
    }

    /// Creates a progress bar with the given length, which is hidden
    /// unless progress should be shown.
    pub fn create_progress_bar(&self, length: usize) -> ProgressBar {
        match self {
            Self::Progress(style) => {
                let progress_bar = ProgressBar::new(length as u64);
                progress_bar.set_style(style.clone());
                progress_bar
            }
            _ => ProgressBar::hidden(),
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Quiet
    }
}
