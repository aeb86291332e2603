use std::collections::HashMap;

use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::scanner::Scanner;

/// Constructor for a scanner implementation.
pub type ScannerFactory = Box<dyn Fn() -> Result<Box<dyn Scanner>, ScanError> + Send + Sync>;

/// Explicit mapping from scanner kind to constructor.
///
/// Built once at startup and handed to whatever assembles the agent; type
/// names are matched case-insensitively. Keeping this an owned value (no
/// process-wide registration) lets tests wire in doubles directly.
#[derive(Default)]
pub struct ScannerFactories {
    factories: HashMap<String, ScannerFactory>,
}

impl ScannerFactories {
    pub fn new() -> ScannerFactories {
        ScannerFactories::default()
    }

    /// Register a scanner constructor under `kind`.
    pub fn register(&mut self, kind: &str, factory: ScannerFactory) {
        self.factories.insert(kind.to_lowercase(), factory);
    }

    /// Instantiate an unconfigured scanner of the given kind.
    pub fn create(&self, kind: &str) -> Result<Box<dyn Scanner>, ScanError> {
        let factory = self
            .factories
            .get(&kind.to_lowercase())
            .ok_or_else(|| ScanError::UnknownType(kind.to_string()))?;
        factory()
    }

    /// Instantiate a scanner for `cfg` and apply the configuration.
    pub fn create_for_config(&self, cfg: ScannerConfig) -> Result<Box<dyn Scanner>, ScanError> {
        let mut scanner = self.create(&cfg.kind)?;
        scanner.set_config(cfg);
        Ok(scanner)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::{mpsc, watch};

    use crate::object::Object;
    use crate::scanner::WatchEvent;

    use super::*;

    #[derive(Default)]
    struct NullScanner {
        cfg: ScannerConfig,
    }

    #[async_trait]
    impl Scanner for NullScanner {
        fn set_config(&mut self, cfg: ScannerConfig) {
            self.cfg = cfg;
        }

        fn config(&self) -> &ScannerConfig {
            &self.cfg
        }

        async fn get_objects(&self) -> Result<Vec<Object>, ScanError> {
            Ok(Vec::new())
        }

        async fn save_state(&self, obj: &Object) -> Result<i32, ScanError> {
            Ok(obj.replicas)
        }

        async fn scale(&self, _obj: &Object, _replicas: i32) -> Result<(), ScanError> {
            Ok(())
        }

        async fn watch(
            &self,
            _stop: watch::Receiver<bool>,
        ) -> Result<mpsc::Receiver<WatchEvent>, ScanError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    #[test]
    fn create_is_case_insensitive() {
        let mut factories = ScannerFactories::new();
        factories.register("Deployment", Box::new(|| Ok(Box::new(NullScanner::default()))));
        assert!(factories.create("deployment").is_ok());
        assert!(factories.create("DEPLOYMENT").is_ok());
    }

    #[test]
    fn create_unknown_kind_errors() {
        let factories = ScannerFactories::new();
        assert!(matches!(
            factories.create("nope"),
            Err(ScanError::UnknownType(_))
        ));
    }

    #[test]
    fn create_for_config_applies_config() {
        let mut factories = ScannerFactories::new();
        factories.register("deployment", Box::new(|| Ok(Box::new(NullScanner::default()))));
        let cfg = ScannerConfig {
            namespace: "dev".into(),
            kind: "deployment".into(),
            priority: 1,
            ..Default::default()
        };
        let scanner = factories.create_for_config(cfg).unwrap();
        assert_eq!(scanner.config().namespace, "dev");
        assert_eq!(scanner.config().priority, 1);
    }
}
