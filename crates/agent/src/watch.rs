//! Watch consumption and periodic resync.
//!
//! Each scanner gets a dedicated consumer task feeding its live events into
//! the registry. Watches are best-effort: a broken stream is reconnected
//! with exponential backoff, and the shared resync timer re-lists every
//! scanner on an interval so anything a stream dropped is healed within one
//! resync period.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

use lightsout_scanner::{Scanner, WatchEvent};

use crate::registry::ObjectRegistry;

const BASE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Consume one scanner's watch stream until `stop` fires.
///
/// On stop the scanner is expected to close the stream once it has released
/// its resources; the task drains until that closure before returning, so a
/// finished watcher implies an acknowledged stop.
pub(crate) async fn watch_scanner(
    scanner: Arc<dyn Scanner>,
    registry: Arc<ObjectRegistry>,
    mut stop: watch::Receiver<bool>,
) {
    let Some(mut events) = subscribe(scanner.as_ref(), &mut stop).await else {
        return;
    };

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() {
                    return;
                }
                if *stop.borrow() {
                    // Wait for the scanner to close the stream (its stop
                    // acknowledgment) before exiting.
                    while events.recv().await.is_some() {}
                    debug!("watcher stopped");
                    return;
                }
            }
            event = events.recv() => match event {
                Some(WatchEvent::Add(obj)) | Some(WatchEvent::Update(obj)) => {
                    debug!(uid = %obj.uid, name = %obj.name, "watch event: add/update");
                    registry.add(obj);
                }
                Some(WatchEvent::Remove(obj)) => {
                    debug!(uid = %obj.uid, name = %obj.name, "watch event: remove");
                    registry.remove(&obj);
                }
                Some(WatchEvent::Lost(reason)) => {
                    warn!(reason = %reason, "watch stream lost, reconnecting");
                    match subscribe(scanner.as_ref(), &mut stop).await {
                        Some(stream) => events = stream,
                        None => return,
                    }
                }
                None => {
                    warn!("watch stream closed unexpectedly, reconnecting");
                    match subscribe(scanner.as_ref(), &mut stop).await {
                        Some(stream) => events = stream,
                        None => return,
                    }
                }
            }
        }
    }
}

/// (Re)subscribe to a scanner's watch stream, backing off exponentially on
/// failure and retrying until it succeeds or `stop` fires (`None`).
async fn subscribe(
    scanner: &dyn Scanner,
    stop: &mut watch::Receiver<bool>,
) -> Option<mpsc::Receiver<WatchEvent>> {
    let mut backoff = BASE_BACKOFF;
    loop {
        if *stop.borrow() {
            return None;
        }
        match scanner.watch(stop.clone()).await {
            Ok(events) => {
                debug!(kind = %scanner.config().kind, "watch stream connected");
                return Some(events);
            }
            Err(e) => {
                warn!(
                    kind = %scanner.config().kind,
                    error = %e,
                    backoff_secs = backoff.as_secs(),
                    "watch connect failed, backing off"
                );
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return None;
                }
            }
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Re-list every scanner into the registry. Seeds the registry at startup
/// and heals events the watch streams missed.
pub(crate) async fn resync(scanners: &[Arc<dyn Scanner>], registry: &ObjectRegistry) {
    debug!("resync start");
    for scanner in scanners {
        match scanner.get_objects().await {
            Ok(objects) => {
                debug!(kind = %scanner.config().kind, objects = objects.len(), "scan result");
                for obj in objects {
                    registry.add(obj);
                }
            }
            Err(e) => {
                error!(kind = %scanner.config().kind, error = %e, "error scanning workloads");
            }
        }
    }
    debug!("resync finished");
}

/// Run an immediate resync, then repeat on `interval` until `stop` fires.
pub(crate) async fn resync_loop(
    scanners: Vec<Arc<dyn Scanner>>,
    registry: Arc<ObjectRegistry>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    resync(&scanners, &registry).await;
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => resync(&scanners, &registry).await,
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    debug!("resync loop stopped");
                    return;
                }
            }
        }
    }
}
