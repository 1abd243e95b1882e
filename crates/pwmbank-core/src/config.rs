//! Instrument configuration and component description.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default ramp time in seconds.
pub const DEFAULT_RAMP_TIME: f64 = 0.0002;

/// Configuration handed to the instrument at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Seconds a ramped parameter change takes to complete.
    pub ramp_time: f64,
    pub sample_rate: f64,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            ramp_time: DEFAULT_RAMP_TIME,
            sample_rate: 44100.0,
        }
    }
}

impl InstrumentConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.ramp_time.is_finite() || self.ramp_time < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "ramp_time {} must be finite and non-negative",
                self.ramp_time
            )));
        }
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        Ok(())
    }
}

/// Four-character code, as used to identify audio components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FourCc([u8; 4]);

impl FourCc {
    pub const fn new(code: [u8; 4]) -> Self {
        Self(code)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl TryFrom<&str> for FourCc {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| Error::InvalidFourCc(s.to_string()))?;
        if !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return Err(Error::InvalidFourCc(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for FourCc {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::try_from(s.as_str())
    }
}

impl From<FourCc> for String {
    fn from(code: FourCc) -> Self {
        code.to_string()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Constructed from ASCII only
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?})", self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Instrument,
    Effect,
    Generator,
}

/// Identifies which engine component to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentDescription {
    pub kind: ComponentKind,
    pub subtype: FourCc,
    pub manufacturer: FourCc,
}

impl ComponentDescription {
    /// The PWM oscillator bank instrument.
    pub const PWM_OSCILLATOR_BANK: Self = Self::instrument(*b"pwmb");

    pub const fn instrument(subtype: [u8; 4]) -> Self {
        Self {
            kind: ComponentKind::Instrument,
            subtype: FourCc::new(subtype),
            manufacturer: FourCc::new(*b"AuKt"),
        }
    }
}

impl Default for ComponentDescription {
    fn default() -> Self {
        Self::PWM_OSCILLATOR_BANK
    }
}
