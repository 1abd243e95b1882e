//! Interfaces between the instrument and the audio engine it drives.
//!
//! The engine itself is external: it is produced asynchronously by an
//! [`EngineFactory`], exposes its parameters through a [`ParameterTree`], and
//! accepts fire-and-forget note events.
//!
//! Two write paths exist:
//!
//! - [`InstrumentEngine::write_value`] stores a value directly in the engine's
//!   own state. Before the engine is running this is the state it initializes
//!   with; values jump, they are not ramped.
//! - [`ParameterHandle::set_value`] goes through the tree's observer channel,
//!   tagged with an [`ObserverToken`], and the engine ramps to the new value over
//!   its current ramp time.

use crate::config::{ComponentDescription, InstrumentConfig};
use crate::parameter::{ParameterAddress, ParameterId};
use crate::Result;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// MIDI note number (0-127).
pub type NoteNumber = u8;

/// MIDI velocity (0-127). Zero on note-on releases the note.
pub type Velocity = u8;

/// Capability to submit ramped parameter changes.
///
/// Only a [`ParameterTree`] hands these out, from
/// [`add_observer`](ParameterTree::add_observer).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObserverToken {
    id: u64,
}

impl ObserverToken {
    /// For tree implementations. `id` must be unique within the tree.
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Called with `(address, value)` when another originator changes a parameter.
pub type ParameterObserver = Box<dyn Fn(ParameterAddress, f32) + Send + Sync>;

/// The engine's parameter interface.
pub trait ParameterTree: Send + Sync {
    /// `None` if the tree has no parameter with this name.
    fn address_of(&self, name: &str) -> Option<ParameterAddress>;

    /// Observer channel: the engine ramps to `value`.
    ///
    /// Observers other than `originator` are notified.
    fn set_value(&self, address: ParameterAddress, value: f32, originator: &ObserverToken);

    fn value(&self, address: ParameterAddress) -> Option<f32>;

    fn add_observer(&self, observer: ParameterObserver) -> ObserverToken;

    fn remove_observer(&self, token: &ObserverToken);
}

/// Settable handle to one parameter of a tree.
#[derive(Clone)]
pub struct ParameterHandle {
    address: ParameterAddress,
    name: String,
    tree: Arc<dyn ParameterTree>,
}

impl ParameterHandle {
    /// Look up `name` in `tree`.
    pub fn lookup(tree: &Arc<dyn ParameterTree>, name: &str) -> Option<Self> {
        let address = tree.address_of(name)?;
        Some(Self {
            address,
            name: name.to_string(),
            tree: Arc::clone(tree),
        })
    }

    pub fn address(&self) -> ParameterAddress {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fire-and-forget.
    pub fn set_value(&self, value: f32, originator: &ObserverToken) {
        self.tree.set_value(self.address, value, originator);
    }

    pub fn value(&self) -> Option<f32> {
        self.tree.value(self.address)
    }
}

impl fmt::Debug for ParameterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterHandle")
            .field("address", &self.address)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A constructed audio engine.
///
/// All methods are fire-and-forget and must not block.
pub trait InstrumentEngine: Send + Sync {
    /// `None` if the engine could not provide its parameter interface.
    fn parameter_tree(&self) -> Option<Arc<dyn ParameterTree>>;

    /// Direct write into the engine's state, bypassing the observer channel.
    fn write_value(&self, id: ParameterId, value: f32);

    /// Seconds subsequent ramped changes take.
    fn set_ramp_time(&self, seconds: f64);

    fn start_note(&self, note: NoteNumber, velocity: Velocity, frequency: f32);

    fn stop_note(&self, note: NoteNumber);
}

pub type SharedEngine = Arc<dyn InstrumentEngine>;

/// Asynchronous engine constructor.
///
/// Failure is reported once; callers do not retry.
pub trait EngineFactory: Send + Sync + 'static {
    fn instantiate(
        &self,
        description: &ComponentDescription,
        config: &InstrumentConfig,
    ) -> impl Future<Output = Result<SharedEngine>> + Send;
}
