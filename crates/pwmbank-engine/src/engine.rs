//! Control side of the reference engine.

use crate::kernel::{BankKernel, KernelCommand};
use crate::state::SharedState;
use crate::tree::BankParameterTree;
use crate::{Error, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use pwmbank_core::{
    InstrumentConfig, InstrumentEngine, NoteNumber, ParameterId, ParameterTree, Velocity,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Reference engine for the PWM oscillator bank.
///
/// Direct writes land in the engine's own state. Until render resources are
/// allocated that state is what the kernel initializes with; afterwards direct
/// writes jump the kernel's value immediately.
///
/// Nothing is queued for a kernel that does not exist yet: note events before
/// allocation are dropped, and parameter changes only update the state.
pub struct BankEngine {
    sample_rate: f64,
    state: Arc<SharedState>,
    tree: Option<Arc<BankParameterTree>>,
    commands: Sender<KernelCommand>,
    kernel_commands: Mutex<Option<Receiver<KernelCommand>>>,
}

impl BankEngine {
    pub fn new(config: &InstrumentConfig) -> Self {
        Self::with_tree(config, Some(HashSet::new()))
    }

    /// `hidden` parameters are absent from the tree; `None` means no tree at all.
    pub(crate) fn with_tree(config: &InstrumentConfig, hidden: Option<HashSet<ParameterId>>) -> Self {
        let state = Arc::new(SharedState::new(config.ramp_time));
        let (commands, kernel_commands) = unbounded();
        let tree = hidden.map(|hidden| {
            Arc::new(BankParameterTree::new(
                Arc::clone(&state),
                commands.clone(),
                hidden,
            ))
        });

        Self {
            sample_rate: config.sample_rate,
            state,
            tree,
            commands,
            kernel_commands: Mutex::new(Some(kernel_commands)),
        }
    }

    /// Build the render kernel from the current engine state.
    ///
    /// Can only be called once.
    pub fn allocate_render_resources(&self) -> Result<BankKernel> {
        let receiver = self
            .kernel_commands
            .lock()
            .take()
            .ok_or(Error::AlreadyAllocated)?;

        // Writes racing with the snapshot are also sent to the kernel.
        let initial = self.state.set_up();
        let kernel = BankKernel::new(self.sample_rate, self.state.ramp_time(), initial, receiver);
        tracing::debug!("Allocated render resources at {} Hz", self.sample_rate);
        Ok(kernel)
    }

    pub fn is_set_up(&self) -> bool {
        self.state.is_set_up()
    }

    /// Value currently held in engine state.
    pub fn value(&self, id: ParameterId) -> f32 {
        self.state.value(id)
    }

    pub fn ramp_time(&self) -> f64 {
        self.state.ramp_time()
    }

    pub fn tree(&self) -> Option<&Arc<BankParameterTree>> {
        self.tree.as_ref()
    }

    fn send(&self, command: KernelCommand) {
        // Receiver lives as long as the kernel; a dropped kernel discards commands.
        let _ = self.commands.send(command);
    }
}

impl InstrumentEngine for BankEngine {
    fn parameter_tree(&self) -> Option<Arc<dyn ParameterTree>> {
        self.tree
            .as_ref()
            .map(|tree| Arc::clone(tree) as Arc<dyn ParameterTree>)
    }

    fn write_value(&self, id: ParameterId, value: f32) {
        let value = id.range().clamp(value);
        self.state.store(id, value);
        if self.is_set_up() {
            self.send(KernelCommand::SetImmediate { id, value });
        }
    }

    fn set_ramp_time(&self, seconds: f64) {
        self.state.set_ramp_time(seconds);
        if self.is_set_up() {
            self.send(KernelCommand::SetRampTime(seconds));
        }
    }

    fn start_note(&self, note: NoteNumber, velocity: Velocity, frequency: f32) {
        if !self.is_set_up() {
            tracing::debug!("Dropping note-on {} before render resources exist", note);
            return;
        }
        self.send(KernelCommand::StartNote {
            note,
            velocity,
            frequency,
        });
    }

    fn stop_note(&self, note: NoteNumber) {
        if !self.is_set_up() {
            tracing::debug!("Dropping note-off {} before render resources exist", note);
            return;
        }
        self.send(KernelCommand::StopNote { note });
    }
}
