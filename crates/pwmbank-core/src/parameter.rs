//! Parameter table, ranges and value sets for the oscillator bank.
//!
//! Every parameter the bank exposes is one row of [`PARAMETERS`]: a stable
//! identifier, the name the engine's parameter tree knows it by, a default and a
//! range. Everything else (lookup by name, engine addresses, preset
//! serialization) is derived from that table.
//!
//! # Example
//!
//! ```
//! use pwmbank_core::{ParameterId, ParameterValues};
//!
//! let id: ParameterId = "filterCutoffFrequency".parse().unwrap();
//! assert_eq!(id.default_value(), 22050.0);
//!
//! let mut values = ParameterValues::default();
//! values.set(ParameterId::PulseWidth, 0.25);
//! assert_eq!(values.get(ParameterId::PulseWidth), 0.25);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Engine-side address of a parameter.
pub type ParameterAddress = u64;

/// How a parameter value is scaled between normalized (0-1) and real values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParameterScale {
    /// `real = min + normalized * (max - min)`
    #[default]
    Linear,

    /// `real = min * (max/min)^normalized`
    ///
    /// Falls back to linear when `min <= 0`.
    Logarithmic,
}

/// Valid range of a parameter.
///
/// The facade never validates against the range; it is informative for callers
/// and enforced by the engine, which clamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub scale: ParameterScale,
}

impl ParameterRange {
    pub const fn linear(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            scale: ParameterScale::Linear,
        }
    }

    pub const fn logarithmic(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            scale: ParameterScale::Logarithmic,
        }
    }

    /// Convert a real value to normalized (0.0-1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let value = self.clamp(value);
        let span = self.span();

        if span <= 0.0 {
            return 0.0;
        }

        match self.scale {
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                (value.ln() - log_min) / (self.max.ln() - log_min)
            }
            _ => (value - self.min) / span,
        }
    }

    /// Convert a normalized value (0.0-1.0) to a real value.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);

        match self.scale {
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                (log_min + normalized * (self.max.ln() - log_min)).exp()
            }
            _ => self.min + normalized * self.span(),
        }
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    #[inline]
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// The parameters of the PWM oscillator bank, in engine address order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterId {
    AttackDuration,
    DecayDuration,
    SustainLevel,
    ReleaseDuration,
    /// Semitones.
    PitchBend,
    /// Semitones.
    VibratoDepth,
    /// Hz.
    VibratoRate,
    /// Duty cycle, 0-1.
    PulseWidth,
    /// Hz.
    FilterCutoffFrequency,
    FilterResonance,
    FilterAttackDuration,
    FilterDecayDuration,
    FilterSustainLevel,
    FilterReleaseDuration,
}

/// One row of the parameter table.
#[derive(Debug, Clone, Copy)]
pub struct ParameterDef {
    pub id: ParameterId,
    pub name: &'static str,
    pub default: f64,
    pub range: ParameterRange,
}

/// Number of parameters in the table.
pub const PARAMETER_COUNT: usize = 14;

/// The parameter table.
///
/// Row `i` has `id.index() == i` and engine address `i`.
pub static PARAMETERS: [ParameterDef; PARAMETER_COUNT] = [
    def(ParameterId::AttackDuration, "attackDuration", 0.1, ParameterRange::linear(0.0, 99.0)),
    def(ParameterId::DecayDuration, "decayDuration", 0.1, ParameterRange::linear(0.0, 99.0)),
    def(ParameterId::SustainLevel, "sustainLevel", 1.0, ParameterRange::linear(0.0, 99.0)),
    def(ParameterId::ReleaseDuration, "releaseDuration", 0.1, ParameterRange::linear(0.0, 99.0)),
    def(ParameterId::PitchBend, "pitchBend", 0.0, ParameterRange::linear(-48.0, 48.0)),
    def(ParameterId::VibratoDepth, "vibratoDepth", 0.0, ParameterRange::linear(0.0, 24.0)),
    def(ParameterId::VibratoRate, "vibratoRate", 0.0, ParameterRange::linear(0.0, 600.0)),
    def(ParameterId::PulseWidth, "pulseWidth", 0.5, ParameterRange::linear(0.0, 1.0)),
    def(
        ParameterId::FilterCutoffFrequency,
        "filterCutoffFrequency",
        22050.0,
        ParameterRange::logarithmic(20.0, 22050.0),
    ),
    def(ParameterId::FilterResonance, "filterResonance", 0.0, ParameterRange::linear(0.0, 1.0)),
    def(
        ParameterId::FilterAttackDuration,
        "filterAttackDuration",
        0.1,
        ParameterRange::linear(0.0, 99.0),
    ),
    def(
        ParameterId::FilterDecayDuration,
        "filterDecayDuration",
        0.1,
        ParameterRange::linear(0.0, 99.0),
    ),
    def(
        ParameterId::FilterSustainLevel,
        "filterSustainLevel",
        1.0,
        ParameterRange::linear(0.0, 99.0),
    ),
    def(
        ParameterId::FilterReleaseDuration,
        "filterReleaseDuration",
        0.1,
        ParameterRange::linear(0.0, 99.0),
    ),
];

const fn def(
    id: ParameterId,
    name: &'static str,
    default: f64,
    range: ParameterRange,
) -> ParameterDef {
    ParameterDef {
        id,
        name,
        default,
        range,
    }
}

impl ParameterId {
    pub const ALL: [ParameterId; PARAMETER_COUNT] = [
        ParameterId::AttackDuration,
        ParameterId::DecayDuration,
        ParameterId::SustainLevel,
        ParameterId::ReleaseDuration,
        ParameterId::PitchBend,
        ParameterId::VibratoDepth,
        ParameterId::VibratoRate,
        ParameterId::PulseWidth,
        ParameterId::FilterCutoffFrequency,
        ParameterId::FilterResonance,
        ParameterId::FilterAttackDuration,
        ParameterId::FilterDecayDuration,
        ParameterId::FilterSustainLevel,
        ParameterId::FilterReleaseDuration,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn address(self) -> ParameterAddress {
        self as ParameterAddress
    }

    pub fn from_address(address: ParameterAddress) -> Option<Self> {
        Self::ALL.get(usize::try_from(address).ok()?).copied()
    }

    #[inline]
    pub fn def(self) -> &'static ParameterDef {
        &PARAMETERS[self.index()]
    }

    /// Key in the engine's parameter tree.
    #[inline]
    pub fn name(self) -> &'static str {
        self.def().name
    }

    #[inline]
    pub fn range(self) -> ParameterRange {
        self.def().range
    }

    #[inline]
    pub fn default_value(self) -> f64 {
        self.def().default
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParameterId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PARAMETERS
            .iter()
            .find(|def| def.name == s)
            .map(|def| def.id)
            .ok_or_else(|| Error::UnknownParameter(s.to_string()))
    }
}

/// One value per parameter.
///
/// Serializes as a `name -> value` map so a value set doubles as a preset.
/// Missing names take their defaults when deserializing; unknown names are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct ParameterValues {
    values: [f64; PARAMETER_COUNT],
}

impl ParameterValues {
    #[inline]
    pub fn get(&self, id: ParameterId) -> f64 {
        self.values[id.index()]
    }

    /// Returns the previous value.
    #[inline]
    pub fn set(&mut self, id: ParameterId, value: f64) -> f64 {
        std::mem::replace(&mut self.values[id.index()], value)
    }

    pub fn with(mut self, id: ParameterId, value: f64) -> Self {
        self.set(id, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterId, f64)> + '_ {
        ParameterId::ALL.iter().map(move |&id| (id, self.get(id)))
    }

    /// First non-finite value, if any.
    pub fn validate(&self) -> Result<()> {
        match self.iter().find(|(_, value)| !value.is_finite()) {
            Some((id, value)) => Err(Error::NonFiniteValue {
                name: id.name().to_string(),
                value,
            }),
            None => Ok(()),
        }
    }
}

impl Default for ParameterValues {
    fn default() -> Self {
        Self {
            values: ParameterId::ALL.map(ParameterId::default_value),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for ParameterValues {
    type Error = Error;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self> {
        let mut values = Self::default();
        for (name, value) in map {
            let id: ParameterId = name.parse()?;
            values.set(id, value);
        }
        values.validate()?;
        Ok(values)
    }
}

impl From<ParameterValues> for BTreeMap<String, f64> {
    fn from(values: ParameterValues) -> Self {
        values
            .iter()
            .map(|(id, value)| (id.name().to_string(), value))
            .collect()
    }
}
