//! Builder for configuring and spawning a `PwmOscillatorBank`.

use crate::binding::{BindAttempt, EngineBinding};
use crate::{PwmOscillatorBank, Result};
use pwmbank_core::{
    ComponentDescription, EngineFactory, InstrumentConfig, ParameterId, ParameterValues,
};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Initial values start at the parameter table defaults. Ramp time and sample
/// rate come from [`InstrumentConfig`].
///
/// # Example
///
/// ```ignore
/// use pwmbank::prelude::*;
///
/// let bank = PwmOscillatorBank::builder()
///     .ramp_time(0.005)
///     .value(ParameterId::PulseWidth, 0.3)
///     .value(ParameterId::FilterResonance, 0.4)
///     .spawn(BankEngineFactory::new(), runtime.handle())?;
///
/// // Construction is in flight; values set now initialize the engine.
/// bank.set(ParameterId::PulseWidth, 0.7);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PwmOscillatorBankBuilder {
    config: InstrumentConfig,
    values: ParameterValues,
    description: ComponentDescription,
}

impl PwmOscillatorBankBuilder {
    pub fn config(mut self, config: InstrumentConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 0.0002 s
    pub fn ramp_time(mut self, seconds: f64) -> Self {
        self.config.ramp_time = seconds;
        self
    }

    /// Default: 44100 Hz
    pub fn sample_rate(mut self, hz: f64) -> Self {
        self.config.sample_rate = hz;
        self
    }

    /// Replace all initial values.
    pub fn values(mut self, values: ParameterValues) -> Self {
        self.values = values;
        self
    }

    pub fn value(mut self, id: ParameterId, value: f64) -> Self {
        self.values.set(id, value);
        self
    }

    /// Default: [`ComponentDescription::PWM_OSCILLATOR_BANK`]
    pub fn description(mut self, description: ComponentDescription) -> Self {
        self.description = description;
        self
    }

    /// Create the instrument and start engine construction on `runtime`.
    ///
    /// Returns immediately with the instrument in [`BindingPhase::Binding`].
    /// A factory error or panic, or the runtime shutting down first, is logged
    /// and leaves the instrument unbound.
    ///
    /// [`BindingPhase::Binding`]: crate::BindingPhase::Binding
    pub fn spawn<F: EngineFactory>(self, factory: F, runtime: &Handle) -> Result<PwmOscillatorBank> {
        self.config.validate()?;
        self.values.validate()?;

        let binding = Arc::new(EngineBinding::new(self.values, self.config.ramp_time));
        binding.begin();

        let config = self.config;
        let description = self.description;
        let attempt = BindAttempt::new(Arc::clone(&binding));
        let bind_task = runtime.spawn(async move {
            match factory.instantiate(&description, &config).await {
                Ok(engine) => attempt.complete(engine),
                Err(e) => attempt.fail(&e),
            }
        });

        tracing::debug!(
            "Requested {}/{} engine at {} Hz",
            description.subtype,
            description.manufacturer,
            config.sample_rate
        );

        Ok(PwmOscillatorBank::from_parts(
            binding,
            config,
            description,
            bind_task,
        ))
    }
}
