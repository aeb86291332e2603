use std::collections::HashMap;

use crate::error::TriggerError;
use crate::traits::{KeepAlive, Trigger, TriggerConfig};
use crate::webhook::{WebhookKeepAlive, WebhookTrigger};

/// Constructor for a trigger implementation.
pub type TriggerFactory = Box<dyn Fn() -> Result<Box<dyn Trigger>, TriggerError> + Send + Sync>;
/// Constructor for a keepalive implementation.
pub type KeepAliveFactory = Box<dyn Fn() -> Result<Box<dyn KeepAlive>, TriggerError> + Send + Sync>;

/// Explicit mapping from trigger type to constructor, built at startup.
///
/// `with_builtins` registers the implementations this crate ships; tests
/// register doubles instead of relying on process-wide state.
#[derive(Default)]
pub struct TriggerFactories {
    factories: HashMap<String, TriggerFactory>,
}

impl TriggerFactories {
    pub fn new() -> TriggerFactories {
        TriggerFactories::default()
    }

    pub fn with_builtins() -> TriggerFactories {
        let mut factories = TriggerFactories::new();
        factories.register("webhook", Box::new(|| Ok(Box::new(WebhookTrigger::new()))));
        factories
    }

    pub fn register(&mut self, kind: &str, factory: TriggerFactory) {
        self.factories.insert(kind.to_lowercase(), factory);
    }

    pub fn create(&self, kind: &str) -> Result<Box<dyn Trigger>, TriggerError> {
        let factory = self
            .factories
            .get(&kind.to_lowercase())
            .ok_or_else(|| TriggerError::UnknownType(kind.to_string()))?;
        factory()
    }

    pub fn create_for_config(&self, cfg: TriggerConfig) -> Result<Box<dyn Trigger>, TriggerError> {
        let mut trigger = self.create(&cfg.kind)?;
        trigger.set_config(cfg);
        Ok(trigger)
    }
}

/// Explicit mapping from keepalive type to constructor.
#[derive(Default)]
pub struct KeepAliveFactories {
    factories: HashMap<String, KeepAliveFactory>,
}

impl KeepAliveFactories {
    pub fn new() -> KeepAliveFactories {
        KeepAliveFactories::default()
    }

    pub fn with_builtins() -> KeepAliveFactories {
        let mut factories = KeepAliveFactories::new();
        factories.register("webhook", Box::new(|| Ok(Box::new(WebhookKeepAlive::new()))));
        factories
    }

    pub fn register(&mut self, kind: &str, factory: KeepAliveFactory) {
        self.factories.insert(kind.to_lowercase(), factory);
    }

    pub fn create(&self, kind: &str) -> Result<Box<dyn KeepAlive>, TriggerError> {
        let factory = self
            .factories
            .get(&kind.to_lowercase())
            .ok_or_else(|| TriggerError::UnknownType(kind.to_string()))?;
        factory()
    }

    pub fn create_for_config(&self, cfg: TriggerConfig) -> Result<Box<dyn KeepAlive>, TriggerError> {
        let mut keepalive = self.create(&cfg.kind)?;
        keepalive.set_config(cfg);
        Ok(keepalive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_webhook_trigger_registered() {
        let factories = TriggerFactories::with_builtins();
        assert!(factories.create("webhook").is_ok());
        assert!(factories.create("WebHook").is_ok());
    }

    #[test]
    fn unknown_trigger_type_errors() {
        let factories = TriggerFactories::new();
        assert!(matches!(
            factories.create("carrier-pigeon"),
            Err(TriggerError::UnknownType(_))
        ));
    }

    #[test]
    fn create_for_config_applies_config() {
        let factories = TriggerFactories::with_builtins();
        let trigger = factories
            .create_for_config(TriggerConfig {
                id: "backup".into(),
                kind: "webhook".into(),
                settings: Default::default(),
            })
            .unwrap();
        assert_eq!(trigger.config().id, "backup");
    }

    #[test]
    fn builtin_webhook_keepalive_registered() {
        let factories = KeepAliveFactories::with_builtins();
        assert!(factories.create("webhook").is_ok());
    }
}
