//! The PWM oscillator bank instrument.

use crate::binding::{BindingPhase, EngineBinding};
use crate::builder::PwmOscillatorBankBuilder;
use crate::Result;
use pwmbank_core::{
    note_to_hz, ComponentDescription, InstrumentConfig, NoteNumber, ParameterId, ParameterValues,
    SharedEngine, Velocity,
};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Polyphonic PWM synthesizer with a fixed set of named parameters.
///
/// Values can be set at any time. Before the engine is bound they are recorded
/// and the engine is initialized with the last value set for each parameter.
/// Once bound, each changed value is sent to the engine as a ramp over the
/// current ramp time. Setting a parameter to its current value does nothing.
///
/// Note events are only forwarded while bound; earlier ones are dropped and
/// not replayed.
///
/// # Example
///
/// ```ignore
/// let bank = PwmOscillatorBank::builder()
///     .value(ParameterId::PulseWidth, 0.3)
///     .spawn(BankEngineFactory::new(), runtime.handle())?;
///
/// bank.set(ParameterId::FilterCutoffFrequency, 1200.0);
/// bank.wait_until_bound().await;
/// bank.note_on_midi(60, 100);
/// ```
pub struct PwmOscillatorBank {
    binding: Arc<EngineBinding>,
    config: InstrumentConfig,
    description: ComponentDescription,
    bind_task: JoinHandle<()>,
}

impl PwmOscillatorBank {
    pub fn builder() -> PwmOscillatorBankBuilder {
        PwmOscillatorBankBuilder::default()
    }

    pub(crate) fn from_parts(
        binding: Arc<EngineBinding>,
        config: InstrumentConfig,
        description: ComponentDescription,
        bind_task: JoinHandle<()>,
    ) -> Self {
        Self {
            binding,
            config,
            description,
            bind_task,
        }
    }

    /// Set a parameter.
    ///
    /// Out-of-range values are passed on; the engine clamps them. Non-finite
    /// values are ignored.
    pub fn set(&self, id: ParameterId, value: f64) {
        self.binding.set(id, value);
    }

    /// Set a parameter by name. Fails only if the name is unknown.
    pub fn set_by_name(&self, name: &str, value: f64) -> Result<()> {
        let id: ParameterId = name.parse()?;
        self.set(id, value);
        Ok(())
    }

    /// Last value set for `id`.
    pub fn value(&self, id: ParameterId) -> f64 {
        self.binding.value(id)
    }

    /// Last value set for every parameter, as a preset.
    pub fn values(&self) -> ParameterValues {
        self.binding.values()
    }

    /// Apply a preset, one parameter at a time.
    pub fn apply(&self, values: &ParameterValues) {
        for (id, value) in values.iter() {
            self.set(id, value);
        }
    }

    /// Duration of subsequent ramps, in seconds.
    ///
    /// Goes straight to the engine when bound, otherwise applied at bind.
    pub fn set_ramp_time(&self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            tracing::warn!("Ignoring invalid ramp time {}", seconds);
            return;
        }
        self.binding.set_ramp_time(seconds);
    }

    pub fn ramp_time(&self) -> f64 {
        self.binding.ramp_time()
    }

    pub fn note_on(&self, note: NoteNumber, velocity: Velocity, frequency: f64) {
        self.binding.note_on(note, velocity, frequency as f32);
    }

    /// Note-on at the equal-tempered frequency of `note`.
    pub fn note_on_midi(&self, note: NoteNumber, velocity: Velocity) {
        self.binding.note_on(note, velocity, note_to_hz(note));
    }

    pub fn note_off(&self, note: NoteNumber) {
        self.binding.note_off(note);
    }

    pub fn phase(&self) -> BindingPhase {
        self.binding.phase()
    }

    pub fn is_bound(&self) -> bool {
        self.phase() == BindingPhase::Bound
    }

    /// Wait for engine construction to finish.
    ///
    /// Returns false if construction failed, panicked, or was cut short by
    /// the runtime shutting down.
    pub async fn wait_until_bound(&self) -> bool {
        let mut phase = self.binding.subscribe();
        let bound = match phase.wait_for(|p| *p != BindingPhase::Binding).await {
            Ok(p) => *p == BindingPhase::Bound,
            Err(_) => false,
        };
        bound
    }

    /// The bound engine, if any.
    pub fn engine(&self) -> Option<SharedEngine> {
        self.binding.engine()
    }

    /// Parameters the bound engine exposes no tree entry for. Values set for
    /// these are recorded but never ramped.
    pub fn missing_parameters(&self) -> Vec<ParameterId> {
        self.binding.missing_parameters()
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    pub fn description(&self) -> &ComponentDescription {
        &self.description
    }
}

impl Drop for PwmOscillatorBank {
    fn drop(&mut self) {
        // Detach first so the aborted attempt finds nothing left to fail.
        self.binding.detach();
        if !self.bind_task.is_finished() {
            tracing::debug!("Cancelling engine construction");
            self.bind_task.abort();
        }
    }
}

impl fmt::Debug for PwmOscillatorBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PwmOscillatorBank")
            .field("phase", &self.phase())
            .field("description", &self.description)
            .field("ramp_time", &self.ramp_time())
            .finish()
    }
}
