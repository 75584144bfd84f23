//! Configuration file parser
//!
//! Every setting has a default matching the standard analysis, so an empty
//! file (or no file at all) gives the canonical configuration. Physical
//! quantities are written with their units, e.g. `distance = "145 mm"`.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use units::{Length, Time, mm, ns};
use crate::histogram::AxisSpec;
use crate::{Error, Result};

fn deserialize_uom<'d, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

/// Immutable settings shared by the accumulator and the extractor.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub geometry   : Geometry,
    pub angles     : Angles,
    pub timing     : Timing,
    pub energy     : AxisSpec,
    pub hit_pattern: AxisSpec,
    pub extract    : Extract,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Geometry {
    /// Nominal distance from target to the front face of the detectors
    #[serde(deserialize_with = "deserialize_uom")]
    pub distance: Length,
}

/// Angle tolerances, in degrees.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Angles {
    /// Pairs closer than this are treated as the same crystal
    pub degenerate_below: f64,

    /// Subtracted from the pair angle before the lower-bound search in the
    /// angle bin table
    pub lookup_offset: f64,

    /// Crystal-pair angles closer than this share an angle bin
    pub merge_tolerance: f64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Timing {
    /// Pairs with `|dt|` strictly below this are prompt coincidences
    #[serde(deserialize_with = "deserialize_uom")]
    pub prompt: Time,

    /// Binning of the `|dt|` spectrum, in ns
    pub axis: AxisSpec,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Extract {
    /// Number of angle bins to extract, starting from index 0
    pub indices: usize,

    /// Gate window is `[gate - gate_half_width, gate + gate_half_width]`
    pub gate_half_width: f64,

    /// Peak window is `[peak - peak_half_width, peak + peak_half_width]`
    pub peak_half_width: f64,

    /// Matrices with fewer entries are skipped
    pub min_matrix_entries: f64,

    /// Gated projections with fewer entries are skipped
    pub min_slice_entries: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geometry   : Geometry::default(),
            angles     : Angles::default(),
            timing     : Timing::default(),
            energy     : AxisSpec::new(7990, 10.0, 8000.0),
            hit_pattern: AxisSpec::new(  65,  0.0,   65.0),
            extract    : Extract::default(),
        }
    }
}

impl Default for Geometry {
    fn default() -> Self { Self { distance: mm(145.0) } }
}

impl Default for Angles {
    fn default() -> Self {
        Self {
            degenerate_below: 0.0001,
            lookup_offset   : 0.0005,
            merge_tolerance : 0.0001,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            prompt: ns(400.0),
            axis  : AxisSpec::new(500, 0.0, 500.0),
        }
    }
}

impl Default for Extract {
    fn default() -> Self {
        Self {
            // Excludes the double-hit-in-one-crystal geometry
            indices           : 51,
            gate_half_width   : 1.0,
            peak_half_width   : 1.0,
            min_matrix_entries: 100.0,
            min_slice_entries :  10.0,
        }
    }
}

impl Config {
    /// Reject axes which cannot be binned: no bins, or an empty or
    /// non-finite range.
    pub fn validate(self) -> Result<Self> {
        for (name, axis) in [("energy", self.energy), ("hit_pattern", self.hit_pattern), ("timing.axis", self.timing.axis)] {
            let AxisSpec { bins, low, high } = axis;
            if bins == 0 {
                return Err(Error::InvalidConfig(format!("`{name}` has no bins")))
            }
            if !(low.is_finite() && high.is_finite() && low < high) {
                return Err(Error::InvalidConfig(format!("`{name}` needs finite low < high, got [{low}, {high})")))
            }
        }
        Ok(self)
    }
}

impl FromStr for Config {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self> { toml::from_str::<Config>(s)?.validate() }
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    fs::read_to_string(path)?.parse()
}

/// The configuration in `path`, or the default one if no path is given.
pub fn config_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => read_config_file(path),
        None       => Ok(Config::default()),
    }
}
