//! HTTP webhook implementations of the trigger and keepalive contracts.

use std::time::Duration;

use async_trait::async_trait;

use lightsout_scanner::Object;

use crate::error::TriggerError;
use crate::template;
use crate::traits::{KeepAlive, Trigger, TriggerConfig};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Trigger that posts a JSON payload (or a rendered body template) to a
/// configured URL.
///
/// Settings: `url` (required), `method` (default `POST`), `timeout`
/// (seconds, default 10), `body` (optional minijinja template; without it
/// the accumulated objects are sent as a JSON array).
#[derive(Debug, Default)]
pub struct WebhookTrigger {
    config: TriggerConfig,
}

impl WebhookTrigger {
    pub fn new() -> WebhookTrigger {
        WebhookTrigger::default()
    }
}

#[async_trait]
impl Trigger for WebhookTrigger {
    fn set_config(&mut self, cfg: TriggerConfig) {
        self.config = cfg;
    }

    fn config(&self) -> &TriggerConfig {
        &self.config
    }

    async fn execute(&self, objects: &[Object]) -> Result<(), TriggerError> {
        let url = required_url(&self.config)?;
        let method = configured_method(&self.config)?;
        let client = reqwest::Client::builder()
            .timeout(configured_timeout(&self.config)?)
            .build()?;

        let body = match self.config.settings.get("body") {
            Some(tmpl) => template::render(tmpl, &self.config.settings, objects)?,
            None => serde_json::to_string(objects)
                .map_err(|e| TriggerError::Config(format!("failed to serialize objects: {e}")))?,
        };

        let response = client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TriggerError::Status { status, body });
        }

        tracing::debug!(id = %self.config.id, url, %status, "webhook trigger delivered");
        Ok(())
    }
}

/// Keepalive that issues a GET against a configured URL; a successful
/// response means the guarded service is in use.
///
/// Settings: `url` (required), `timeout` (seconds, default 10).
#[derive(Debug, Default)]
pub struct WebhookKeepAlive {
    config: TriggerConfig,
}

impl WebhookKeepAlive {
    pub fn new() -> WebhookKeepAlive {
        WebhookKeepAlive::default()
    }
}

#[async_trait]
impl KeepAlive for WebhookKeepAlive {
    fn set_config(&mut self, cfg: TriggerConfig) {
        self.config = cfg;
    }

    fn config(&self) -> &TriggerConfig {
        &self.config
    }

    async fn execute(&self) -> Result<(), TriggerError> {
        let url = required_url(&self.config)?;
        let client = reqwest::Client::builder()
            .timeout(configured_timeout(&self.config)?)
            .build()?;

        let response = client.get(url).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TriggerError::Status { status, body });
        }

        tracing::trace!(id = %self.config.id, url, %status, "keepalive hook answered");
        Ok(())
    }
}

fn required_url(cfg: &TriggerConfig) -> Result<&str, TriggerError> {
    cfg.settings
        .get("url")
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| TriggerError::Config(format!("no url configured for '{}'", cfg.id)))
}

fn configured_method(cfg: &TriggerConfig) -> Result<reqwest::Method, TriggerError> {
    match cfg.settings.get("method") {
        Some(m) => m
            .to_uppercase()
            .parse()
            .map_err(|_| TriggerError::Config(format!("invalid HTTP method: {m}"))),
        None => Ok(reqwest::Method::POST),
    }
}

fn configured_timeout(cfg: &TriggerConfig) -> Result<Duration, TriggerError> {
    match cfg.settings.get("timeout") {
        Some(raw) => raw
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| TriggerError::Config(format!("invalid timeout '{raw}', expected seconds"))),
        None => Ok(DEFAULT_TIMEOUT),
    }
}
