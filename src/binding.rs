//! Engine binding: the single synchronized point between the instrument and
//! its asynchronously constructed engine.
//!
//! Every parameter write, the ramp time, and the `Binding -> Bound` transition
//! go through one mutex. A write either happens before the transition, and is
//! part of the values the engine is initialized with, or after it, and is sent
//! as a ramp. It is never lost and never applied twice.

use crate::registry::ParameterRegistry;
use parking_lot::Mutex;
use pwmbank_core::{
    NoteNumber, ObserverToken, ParameterId, ParameterTree, ParameterValues, SharedEngine,
    Velocity,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle of the engine handle relative to the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPhase {
    /// No engine, and none being constructed.
    Unbound,
    /// Engine construction in flight.
    Binding,
    /// Engine constructed and initialized.
    Bound,
}

impl fmt::Display for BindingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingPhase::Unbound => write!(f, "unbound"),
            BindingPhase::Binding => write!(f, "binding"),
            BindingPhase::Bound => write!(f, "bound"),
        }
    }
}

struct BoundEngine {
    engine: SharedEngine,
    /// `None` when the engine has no parameter tree.
    tree: Option<TreeLink>,
}

struct TreeLink {
    tree: Arc<dyn ParameterTree>,
    registry: ParameterRegistry,
    token: ObserverToken,
}

enum Link {
    Unbound,
    Binding,
    Bound(BoundEngine),
}

struct BindingState {
    /// Last-known value of every parameter.
    values: ParameterValues,
    ramp_time: f64,
    link: Link,
}

pub(crate) struct EngineBinding {
    state: Mutex<BindingState>,
    phase: watch::Sender<BindingPhase>,
}

impl EngineBinding {
    pub(crate) fn new(values: ParameterValues, ramp_time: f64) -> Self {
        let (phase, _) = watch::channel(BindingPhase::Unbound);
        Self {
            state: Mutex::new(BindingState {
                values,
                ramp_time,
                link: Link::Unbound,
            }),
            phase,
        }
    }

    /// `Unbound -> Binding`. Returns false from any other phase.
    pub(crate) fn begin(&self) -> bool {
        let mut state = self.state.lock();
        if !matches!(state.link, Link::Unbound) {
            return false;
        }
        state.link = Link::Binding;
        self.phase.send_replace(BindingPhase::Binding);
        true
    }

    /// `Binding -> Bound`.
    ///
    /// Builds the registry, takes an observer token, and writes the last-known
    /// value of every parameter plus the ramp time straight into the engine.
    pub(crate) fn complete(&self, engine: SharedEngine) {
        let mut state = self.state.lock();
        if !matches!(state.link, Link::Binding) {
            tracing::warn!("Engine arrived while {}, discarding", self.phase());
            return;
        }

        let tree = match engine.parameter_tree() {
            Some(tree) => {
                let registry = ParameterRegistry::build(&tree);
                // Nothing to mirror back: the instrument never changes its own values.
                let token = tree.add_observer(Box::new(|address, value| {
                    tracing::trace!("Engine changed parameter {} to {}", address, value);
                }));
                Some(TreeLink {
                    tree,
                    registry,
                    token,
                })
            }
            None => {
                tracing::warn!("Parameter tree unavailable, falling back to direct engine writes");
                None
            }
        };

        for (id, value) in state.values.iter() {
            engine.write_value(id, value as f32);
        }
        engine.set_ramp_time(state.ramp_time);

        tracing::debug!(
            "Engine bound with {} of {} parameters in its tree",
            tree.as_ref().map_or(0, |t| t.registry.len()),
            ParameterId::ALL.len()
        );

        state.link = Link::Bound(BoundEngine { engine, tree });
        self.phase.send_replace(BindingPhase::Bound);
    }

    /// `Binding -> Unbound`. Construction is not retried.
    pub(crate) fn fail(&self, error: &dyn std::error::Error) {
        let mut state = self.state.lock();
        tracing::error!("Engine construction failed: {}", error);
        if matches!(state.link, Link::Binding) {
            state.link = Link::Unbound;
            self.phase.send_replace(BindingPhase::Unbound);
        }
    }

    /// `Binding -> Unbound` for an attempt that ended without a result.
    fn abandon(&self) {
        let mut state = self.state.lock();
        if matches!(state.link, Link::Binding) {
            tracing::error!("Engine construction ended without producing an engine");
            state.link = Link::Unbound;
            self.phase.send_replace(BindingPhase::Unbound);
        }
    }

    pub(crate) fn set(&self, id: ParameterId, value: f64) {
        if !value.is_finite() {
            tracing::warn!("Ignoring non-finite value {} for '{}'", value, id);
            return;
        }

        let mut state = self.state.lock();
        if state.values.set(id, value) == value {
            return;
        }

        match &state.link {
            Link::Bound(BoundEngine {
                tree: Some(link), ..
            }) => match link.registry.handle(id) {
                Some(handle) => handle.set_value(value as f32, &link.token),
                None => tracing::trace!("'{}' has no tree handle, not ramped", id),
            },
            Link::Bound(BoundEngine { engine, tree: None }) => {
                engine.write_value(id, value as f32);
            }
            // Picked up by `complete`
            Link::Unbound | Link::Binding => {}
        }
    }

    pub(crate) fn set_ramp_time(&self, seconds: f64) {
        let mut state = self.state.lock();
        state.ramp_time = seconds;
        if let Link::Bound(bound) = &state.link {
            bound.engine.set_ramp_time(seconds);
        }
    }

    /// Dropped while no engine is bound.
    pub(crate) fn note_on(&self, note: NoteNumber, velocity: Velocity, frequency: f32) {
        match self.engine() {
            Some(engine) => engine.start_note(note, velocity, frequency),
            None => tracing::debug!("Dropping note-on {} while {}", note, self.phase()),
        }
    }

    pub(crate) fn note_off(&self, note: NoteNumber) {
        match self.engine() {
            Some(engine) => engine.stop_note(note),
            None => tracing::debug!("Dropping note-off {} while {}", note, self.phase()),
        }
    }

    pub(crate) fn engine(&self) -> Option<SharedEngine> {
        match &self.state.lock().link {
            Link::Bound(bound) => Some(Arc::clone(&bound.engine)),
            _ => None,
        }
    }

    pub(crate) fn value(&self, id: ParameterId) -> f64 {
        self.state.lock().values.get(id)
    }

    pub(crate) fn values(&self) -> ParameterValues {
        self.state.lock().values
    }

    pub(crate) fn ramp_time(&self) -> f64 {
        self.state.lock().ramp_time
    }

    /// Parameters the bound engine's tree has no entry for.
    ///
    /// Empty while unbound, all parameters if the engine has no tree.
    pub(crate) fn missing_parameters(&self) -> Vec<ParameterId> {
        match &self.state.lock().link {
            Link::Bound(BoundEngine {
                tree: Some(link), ..
            }) => link.registry.missing().collect(),
            Link::Bound(BoundEngine { tree: None, .. }) => ParameterId::ALL.to_vec(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn phase(&self) -> BindingPhase {
        *self.phase.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<BindingPhase> {
        self.phase.subscribe()
    }

    /// Release the observer token. The engine stays alive while anyone else
    /// holds it.
    pub(crate) fn detach(&self) {
        let mut state = self.state.lock();
        if let Link::Bound(BoundEngine {
            tree: Some(link), ..
        }) = &state.link
        {
            link.tree.remove_observer(&link.token);
        }
        state.link = Link::Unbound;
        self.phase.send_replace(BindingPhase::Unbound);
    }
}

/// One engine construction attempt, owned by the bind task.
///
/// Dropped without a result (the factory panicked, or the runtime shut down
/// with the task pending) it returns the binding to `Unbound`.
pub(crate) struct BindAttempt {
    binding: Option<Arc<EngineBinding>>,
}

impl BindAttempt {
    pub(crate) fn new(binding: Arc<EngineBinding>) -> Self {
        Self {
            binding: Some(binding),
        }
    }

    pub(crate) fn complete(mut self, engine: SharedEngine) {
        if let Some(binding) = self.binding.take() {
            binding.complete(engine);
        }
    }

    pub(crate) fn fail(mut self, error: &dyn std::error::Error) {
        if let Some(binding) = self.binding.take() {
            binding.fail(error);
        }
    }
}

impl Drop for BindAttempt {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.abandon();
        }
    }
}
