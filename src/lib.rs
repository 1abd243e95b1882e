//! # pwmbank - PWM Oscillator Bank Instrument
//!
//! A polyphonic pulse-width-modulation synthesizer exposed as a fixed set of
//! named parameters plus note on/off.
//!
//! ## Architecture
//!
//! - **pwmbank-core** - Parameter table, ramping, configuration, engine traits
//! - **pwmbank-engine** - Reference in-process engine (parameter tree, kernel)
//! - **pwmbank** - [`PwmOscillatorBank`], which keeps its parameters in sync
//!   with an engine that is constructed asynchronously
//!
//! ## Quick Start
//!
//! ```ignore
//! use pwmbank::prelude::*;
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let bank = PwmOscillatorBank::builder()
//!     .value(ParameterId::PulseWidth, 0.3)
//!     .spawn(BankEngineFactory::new(), runtime.handle())?;
//!
//! // Safe before the engine exists: recorded and applied at bind
//! bank.set(ParameterId::FilterCutoffFrequency, 1200.0);
//!
//! runtime.block_on(bank.wait_until_bound());
//! bank.note_on_midi(60, 100);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Includes the reference engine
//! - `engine` - `pwmbank-engine` re-exports

/// Re-export of pwmbank-core for direct access
pub use pwmbank_core as core;

pub use pwmbank_core::{
    note_to_hz, ComponentDescription, ComponentKind, EngineFactory, FourCc, InstrumentConfig,
    InstrumentEngine, NoteNumber, ObserverToken, ParameterHandle, ParameterId, ParameterRange,
    ParameterTree, ParameterValues, SharedEngine, Velocity, PARAMETERS,
};

#[cfg(feature = "engine")]
pub use pwmbank_engine as engine;

#[cfg(feature = "engine")]
pub use pwmbank_engine::{BankEngine, BankEngineFactory, BankKernel};

mod error;
pub use error::{Error, Result};

mod binding;
pub use binding::BindingPhase;

mod registry;
pub use registry::ParameterRegistry;

mod builder;
mod instrument;

pub use builder::PwmOscillatorBankBuilder;
pub use instrument::PwmOscillatorBank;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        BindingPhase, InstrumentConfig, ParameterId, ParameterValues, PwmOscillatorBank,
        PwmOscillatorBankBuilder,
    };

    #[cfg(feature = "engine")]
    pub use crate::BankEngineFactory;
}
