//! State shared between the engine's control side and its parameter tree.

use atomic_float::{AtomicF32, AtomicF64};
use pwmbank_core::{ParameterId, PARAMETER_COUNT};
use std::sync::atomic::{AtomicBool, Ordering};

/// Pending values and flags, written from control threads.
///
/// Before render resources exist these cells are what the kernel is built
/// from. `set_up` is raised before the snapshot is taken, so a writer that
/// stores a value and then sees `set_up == false` knows the snapshot will
/// include its value.
pub(crate) struct SharedState {
    values: [AtomicF32; PARAMETER_COUNT],
    ramp_time: AtomicF64,
    set_up: AtomicBool,
}

impl SharedState {
    pub(crate) fn new(ramp_time: f64) -> Self {
        Self {
            values: ParameterId::ALL.map(|id| AtomicF32::new(id.default_value() as f32)),
            ramp_time: AtomicF64::new(ramp_time),
            set_up: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn value(&self, id: ParameterId) -> f32 {
        self.values[id.index()].load(Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn store(&self, id: ParameterId, value: f32) {
        self.values[id.index()].store(value, Ordering::SeqCst);
    }

    pub(crate) fn ramp_time(&self) -> f64 {
        self.ramp_time.load(Ordering::SeqCst)
    }

    pub(crate) fn set_ramp_time(&self, seconds: f64) {
        self.ramp_time.store(seconds, Ordering::SeqCst);
    }

    pub(crate) fn is_set_up(&self) -> bool {
        self.set_up.load(Ordering::SeqCst)
    }

    /// Raise the set-up flag and take the values the kernel starts from.
    pub(crate) fn set_up(&self) -> [f32; PARAMETER_COUNT] {
        self.set_up.store(true, Ordering::SeqCst);
        ParameterId::ALL.map(|id| self.value(id))
    }
}
