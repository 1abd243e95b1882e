//! Parameter registry: one tree handle per parameter, built once at bind time.

use pwmbank_core::{ParameterHandle, ParameterId, ParameterTree, PARAMETER_COUNT};
use std::sync::Arc;

/// Handles into the engine's parameter tree, indexed by [`ParameterId`].
///
/// A parameter the tree does not know has no handle; ramped writes to it are
/// dropped.
#[derive(Debug, Clone)]
pub struct ParameterRegistry {
    handles: [Option<ParameterHandle>; PARAMETER_COUNT],
}

impl ParameterRegistry {
    pub fn build(tree: &Arc<dyn ParameterTree>) -> Self {
        let handles = ParameterId::ALL.map(|id| {
            let handle = ParameterHandle::lookup(tree, id.name());
            if handle.is_none() {
                tracing::warn!("Parameter '{}' missing from engine parameter tree", id);
            }
            handle
        });
        Self { handles }
    }

    #[inline]
    pub fn handle(&self, id: ParameterId) -> Option<&ParameterHandle> {
        self.handles[id.index()].as_ref()
    }

    pub fn missing(&self) -> impl Iterator<Item = ParameterId> + '_ {
        ParameterId::ALL
            .into_iter()
            .filter(|&id| self.handle(id).is_none())
    }

    /// Number of parameters with a handle.
    pub fn len(&self) -> usize {
        self.handles.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwmbank_core::{ObserverToken, ParameterAddress, ParameterObserver};

    /// Tree that knows every parameter except the filter envelope.
    struct PartialTree;

    impl ParameterTree for PartialTree {
        fn address_of(&self, name: &str) -> Option<ParameterAddress> {
            let id: ParameterId = name.parse().ok()?;
            (!name.starts_with("filter") || id == ParameterId::FilterCutoffFrequency)
                .then(|| id.address())
        }

        fn set_value(&self, _: ParameterAddress, _: f32, _: &ObserverToken) {}

        fn value(&self, _: ParameterAddress) -> Option<f32> {
            None
        }

        fn add_observer(&self, _: ParameterObserver) -> ObserverToken {
            ObserverToken::new(1)
        }

        fn remove_observer(&self, _: &ObserverToken) {}
    }

    #[test]
    fn test_build_records_missing() {
        let tree: Arc<dyn ParameterTree> = Arc::new(PartialTree);
        let registry = ParameterRegistry::build(&tree);

        assert!(registry.handle(ParameterId::PulseWidth).is_some());
        assert!(registry.handle(ParameterId::FilterCutoffFrequency).is_some());
        assert!(registry.handle(ParameterId::FilterResonance).is_none());

        let missing: Vec<_> = registry.missing().collect();
        assert_eq!(
            missing,
            vec![
                ParameterId::FilterResonance,
                ParameterId::FilterAttackDuration,
                ParameterId::FilterDecayDuration,
                ParameterId::FilterSustainLevel,
                ParameterId::FilterReleaseDuration,
            ]
        );
        assert_eq!(registry.len(), 9);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_handles_carry_tree_addresses() {
        let tree: Arc<dyn ParameterTree> = Arc::new(PartialTree);
        let registry = ParameterRegistry::build(&tree);

        for id in ParameterId::ALL {
            if let Some(handle) = registry.handle(id) {
                assert_eq!(handle.address(), id.address());
                assert_eq!(handle.name(), id.name());
            }
        }
    }
}
