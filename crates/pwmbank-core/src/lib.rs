//! Core types for the PWM oscillator bank.
//!
//! # Primary API
//!
//! - [`ParameterId`] / [`PARAMETERS`]: the parameter table (name, default, range)
//! - [`ParameterValues`]: one value per parameter, serializable as a preset
//! - [`InstrumentConfig`]: ramp time and sample rate
//! - [`EngineFactory`], [`InstrumentEngine`], [`ParameterTree`]: the engine seam
//! - [`ParameterRamper`]: render-side linear ramp
//!
//! # Example
//!
//! ```
//! use pwmbank_core::{InstrumentConfig, ParameterId, ParameterValues};
//!
//! let config = InstrumentConfig::default();
//! config.validate()?;
//!
//! let preset = ParameterValues::default()
//!     .with(ParameterId::PulseWidth, 0.3)
//!     .with(ParameterId::FilterCutoffFrequency, 1200.0);
//! assert_eq!(preset.get(ParameterId::PulseWidth), 0.3);
//! # Ok::<(), pwmbank_core::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{ComponentDescription, ComponentKind, FourCc, InstrumentConfig, DEFAULT_RAMP_TIME};

pub mod engine;
pub use engine::{
    EngineFactory, InstrumentEngine, NoteNumber, ObserverToken, ParameterHandle,
    ParameterObserver, ParameterTree, SharedEngine, Velocity,
};

pub mod parameter;
pub use parameter::{
    ParameterAddress, ParameterDef, ParameterId, ParameterRange, ParameterScale, ParameterValues,
    PARAMETERS, PARAMETER_COUNT,
};

pub mod smooth;
pub use smooth::{ramp_samples, ParameterRamper};

pub mod tuning;
pub use tuning::{note_to_hz, A4_FREQ, A4_NOTE};
