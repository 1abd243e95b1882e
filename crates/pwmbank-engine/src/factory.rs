//! Asynchronous construction of [`BankEngine`]s.

use crate::engine::BankEngine;
use parking_lot::Mutex;
use pwmbank_core::{
    ComponentDescription, EngineFactory, Error, InstrumentConfig, ParameterId, Result,
    SharedEngine,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Builds [`BankEngine`]s for the PWM oscillator bank description.
///
/// Clones share the record of the last engine built, so a test or host can keep
/// a clone and reach the concrete engine (and allocate its kernel) after an
/// instrument has bound to it.
///
/// # Example
///
/// ```ignore
/// let factory = BankEngineFactory::new().latency(Duration::from_millis(5));
/// let bank = PwmOscillatorBank::builder().spawn(factory.clone(), runtime.handle())?;
/// bank.wait_until_bound().await;
/// let kernel = factory.last_engine().unwrap().allocate_render_resources()?;
/// ```
#[derive(Clone, Default)]
pub struct BankEngineFactory {
    latency: Option<Duration>,
    without_tree: bool,
    hidden: HashSet<ParameterId>,
    failure: Option<String>,
    last: Arc<Mutex<Option<Arc<BankEngine>>>>,
}

impl BankEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before the engine is handed back.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Built engines expose no parameter tree.
    pub fn without_parameter_tree(mut self) -> Self {
        self.without_tree = true;
        self
    }

    /// Built engines' trees have no entry for `id`.
    pub fn without_parameter(mut self, id: ParameterId) -> Self {
        self.hidden.insert(id);
        self
    }

    /// Construction fails with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn last_engine(&self) -> Option<Arc<BankEngine>> {
        self.last.lock().clone()
    }

    fn build(&self, config: &InstrumentConfig) -> Arc<BankEngine> {
        let hidden = (!self.without_tree).then(|| self.hidden.clone());
        let engine = Arc::new(BankEngine::with_tree(config, hidden));
        *self.last.lock() = Some(Arc::clone(&engine));
        engine
    }
}

impl EngineFactory for BankEngineFactory {
    async fn instantiate(
        &self,
        description: &ComponentDescription,
        config: &InstrumentConfig,
    ) -> Result<SharedEngine> {
        if *description != ComponentDescription::PWM_OSCILLATOR_BANK {
            return Err(Error::EngineConstruction(format!(
                "unsupported component {}/{}",
                description.subtype, description.manufacturer
            )));
        }
        config.validate()?;

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        if let Some(reason) = &self.failure {
            return Err(Error::EngineConstruction(reason.clone()));
        }

        let engine: SharedEngine = self.build(config);
        Ok(engine)
    }
}
