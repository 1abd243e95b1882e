//! Test helpers for pwmbank integration tests.
//!
//! [`RecordingEngine`] logs every call the instrument makes into it, in order,
//! so tests can assert on which write path a value took. [`GatedFactory`]
//! holds engine construction until the test opens the gate, which makes the
//! "before bind" window deterministic.

#![allow(dead_code)]

use parking_lot::Mutex;
use pwmbank::core::{
    ComponentDescription, EngineFactory, Error, InstrumentConfig, InstrumentEngine, NoteNumber,
    ObserverToken, ParameterAddress, ParameterId, ParameterObserver, ParameterTree, Result,
    SharedEngine, Velocity, PARAMETER_COUNT,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Direct write into engine state.
    Write { id: ParameterId, value: f32 },
    /// Ramped write through the tree's observer channel.
    Ramp { id: ParameterId, value: f32 },
    RampTime(f64),
    StartNote {
        note: NoteNumber,
        velocity: Velocity,
        frequency: f32,
    },
    StopNote { note: NoteNumber },
    ObserverAdded,
    ObserverRemoved,
}

type EventLog = Arc<Mutex<Vec<Event>>>;
type ValueCells = Arc<Mutex<[f32; PARAMETER_COUNT]>>;

pub struct RecordingTree {
    events: EventLog,
    values: ValueCells,
    hidden: HashSet<ParameterId>,
    next_token: AtomicU64,
}

impl ParameterTree for RecordingTree {
    fn address_of(&self, name: &str) -> Option<ParameterAddress> {
        let id: ParameterId = name.parse().ok()?;
        (!self.hidden.contains(&id)).then(|| id.address())
    }

    fn set_value(&self, address: ParameterAddress, value: f32, _originator: &ObserverToken) {
        let id = ParameterId::from_address(address).expect("known address");
        self.values.lock()[id.index()] = value;
        self.events.lock().push(Event::Ramp { id, value });
    }

    fn value(&self, address: ParameterAddress) -> Option<f32> {
        ParameterId::from_address(address).map(|id| self.values.lock()[id.index()])
    }

    fn add_observer(&self, _observer: ParameterObserver) -> ObserverToken {
        self.events.lock().push(Event::ObserverAdded);
        ObserverToken::new(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    fn remove_observer(&self, _token: &ObserverToken) {
        self.events.lock().push(Event::ObserverRemoved);
    }
}

/// Engine that records calls instead of rendering.
///
/// Direct and ramped writes share one set of value cells, so
/// [`effective`](RecordingEngine::effective) is whatever value reached the
/// engine last by either path.
pub struct RecordingEngine {
    events: EventLog,
    values: ValueCells,
    tree: Option<Arc<RecordingTree>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Self::build(Some(HashSet::new()))
    }

    pub fn without_tree() -> Arc<Self> {
        Self::build(None)
    }

    pub fn without_parameters(hidden: &[ParameterId]) -> Arc<Self> {
        Self::build(Some(hidden.iter().copied().collect()))
    }

    fn build(hidden: Option<HashSet<ParameterId>>) -> Arc<Self> {
        let events = EventLog::default();
        let values = ValueCells::default();
        let tree = hidden.map(|hidden| {
            Arc::new(RecordingTree {
                events: Arc::clone(&events),
                values: Arc::clone(&values),
                hidden,
                next_token: AtomicU64::new(1),
            })
        });
        Arc::new(Self {
            events,
            values,
            tree,
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn writes(&self, id: ParameterId) -> Vec<f32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write { id: i, value } if i == id => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn ramps(&self, id: ParameterId) -> Vec<f32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Ramp { id: i, value } if i == id => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn all_ramps(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Ramp { .. }))
            .count()
    }

    pub fn ramp_times(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::RampTime(seconds) => Some(seconds),
                _ => None,
            })
            .collect()
    }

    pub fn notes(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::StartNote { .. } | Event::StopNote { .. }))
            .collect()
    }

    /// Value that last reached the engine for `id`, by either write path.
    pub fn effective(&self, id: ParameterId) -> f32 {
        self.values.lock()[id.index()]
    }
}

impl InstrumentEngine for RecordingEngine {
    fn parameter_tree(&self) -> Option<Arc<dyn ParameterTree>> {
        self.tree
            .as_ref()
            .map(|tree| Arc::clone(tree) as Arc<dyn ParameterTree>)
    }

    fn write_value(&self, id: ParameterId, value: f32) {
        self.values.lock()[id.index()] = value;
        self.events.lock().push(Event::Write { id, value });
    }

    fn set_ramp_time(&self, seconds: f64) {
        self.events.lock().push(Event::RampTime(seconds));
    }

    fn start_note(&self, note: NoteNumber, velocity: Velocity, frequency: f32) {
        self.events.lock().push(Event::StartNote {
            note,
            velocity,
            frequency,
        });
    }

    fn stop_note(&self, note: NoteNumber) {
        self.events.lock().push(Event::StopNote { note });
    }
}

/// Hands out one pre-built [`RecordingEngine`] once the gate is opened.
#[derive(Clone)]
pub struct GatedFactory {
    engine: Arc<RecordingEngine>,
    gate: Arc<Notify>,
    failure: Option<String>,
    panics: bool,
    calls: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl GatedFactory {
    pub fn new(engine: Arc<RecordingEngine>) -> Self {
        Self {
            engine,
            gate: Arc::new(Notify::new()),
            failure: None,
            panics: false,
            calls: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Panic inside construction once the gate opens.
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Let a pending (or the next) construction finish.
    pub fn open(&self) {
        self.gate.notify_one();
    }

    pub fn engine(&self) -> &Arc<RecordingEngine> {
        &self.engine
    }

    /// Constructions started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Constructions that got past the gate.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl EngineFactory for GatedFactory {
    async fn instantiate(
        &self,
        _description: &ComponentDescription,
        _config: &InstrumentConfig,
    ) -> Result<SharedEngine> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.panics {
            panic!("engine component crashed during construction");
        }
        if let Some(reason) = &self.failure {
            return Err(Error::EngineConstruction(reason.clone()));
        }
        let engine: SharedEngine = self.engine.clone();
        Ok(engine)
    }
}

/// Yield to the runtime until spawned tasks have had a chance to run.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
