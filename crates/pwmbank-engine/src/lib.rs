//! Reference in-process engine for the PWM oscillator bank.
//!
//! Implements the engine side of the parameter protocol:
//!
//! - [`BankParameterTree`] - named parameters with addresses and clamped ranges,
//!   observer tokens, and a lock-free observer channel into the kernel
//! - [`BankKernel`] - render-side ramps (one per parameter) and 128 note slots
//! - [`BankEngine`] - control side: direct writes, ramp time, note events,
//!   kernel allocation
//! - [`BankEngineFactory`] - asynchronous construction, with switches for the
//!   degraded modes a host has to cope with (no tree, missing parameters,
//!   failed construction)
//!
//! The engine does not synthesize audio; oscillator, filter and envelope DSP
//! are outside this crate.
//!
//! # Example
//!
//! ```
//! use pwmbank_core::{InstrumentConfig, InstrumentEngine, ParameterId};
//! use pwmbank_engine::BankEngine;
//!
//! let engine = BankEngine::new(&InstrumentConfig::default());
//! engine.write_value(ParameterId::PulseWidth, 0.25);
//!
//! let mut kernel = engine.allocate_render_resources()?;
//! kernel.process(512);
//! assert_eq!(kernel.parameter(ParameterId::PulseWidth), 0.25);
//! # Ok::<(), pwmbank_engine::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod state;

mod kernel;
pub use kernel::{BankKernel, KernelCommand, NoteStage, NoteState};

mod tree;
pub use tree::BankParameterTree;

mod engine;
pub use engine::BankEngine;

mod factory;
pub use factory::BankEngineFactory;
