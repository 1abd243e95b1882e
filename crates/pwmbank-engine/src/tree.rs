//! Parameter tree of the reference engine.

use crate::kernel::KernelCommand;
use crate::state::SharedState;
use crossbeam_channel::Sender;
use parking_lot::RwLock;
use pwmbank_core::{
    ObserverToken, ParameterAddress, ParameterId, ParameterObserver, ParameterTree,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Address table over the parameter table, with an observer channel into the kernel.
///
/// Values written through the tree are clamped to the parameter's range, stored
/// as the tree's current value, and forwarded to the kernel as a ramp once
/// render resources exist. Before that the stored value is what the kernel
/// starts from.
pub struct BankParameterTree {
    state: Arc<SharedState>,
    commands: Sender<KernelCommand>,
    hidden: HashSet<ParameterId>,
    observers: RwLock<Vec<(u64, ParameterObserver)>>,
    next_token: AtomicU64,
}

impl BankParameterTree {
    pub(crate) fn new(
        state: Arc<SharedState>,
        commands: Sender<KernelCommand>,
        hidden: HashSet<ParameterId>,
    ) -> Self {
        Self {
            state,
            commands,
            hidden,
            observers: RwLock::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }
    }

    fn exposed(&self, address: ParameterAddress) -> Option<ParameterId> {
        ParameterId::from_address(address).filter(|id| !self.hidden.contains(id))
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl ParameterTree for BankParameterTree {
    fn address_of(&self, name: &str) -> Option<ParameterAddress> {
        let id: ParameterId = name.parse().ok()?;
        (!self.hidden.contains(&id)).then(|| id.address())
    }

    fn set_value(&self, address: ParameterAddress, value: f32, originator: &ObserverToken) {
        let Some(id) = self.exposed(address) else {
            tracing::warn!("Ignoring write to unknown parameter address {}", address);
            return;
        };

        let value = id.range().clamp(value);
        self.state.store(id, value);
        if self.state.is_set_up() {
            let _ = self.commands.send(KernelCommand::Ramp { id, value });
        }

        for (token, observer) in self.observers.read().iter() {
            if *token != originator.id() {
                observer(address, value);
            }
        }
    }

    fn value(&self, address: ParameterAddress) -> Option<f32> {
        self.exposed(address).map(|id| self.state.value(id))
    }

    fn add_observer(&self, observer: ParameterObserver) -> ObserverToken {
        let id = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.observers.write().push((id, observer));
        ObserverToken::new(id)
    }

    fn remove_observer(&self, token: &ObserverToken) {
        self.observers.write().retain(|(id, _)| *id != token.id());
    }
}
