//! Service registry client: the process-wide cache of live instances.
//!
//! # Responsibilities
//! - Resolve every declared service once before traffic is served
//! - Hand out the current instance list for a service without blocking
//! - Refresh one or all services on demand (webhook) or via watches
//! - Publish membership changes to subscribers
//!
//! # Design Decisions
//! - The set of declared services is fixed at construction, so the outer
//!   map is read-only and needs no lock
//! - Each instance list sits behind an `ArcSwap`: readers see either the old
//!   or the new list, never a partial one
//! - A failed refresh keeps the last known list and only affects its own service

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::discovery::backend::{Discovery, DiscoveryError};
use crate::discovery::instance::{
    sort_instances, MembershipChange, Resolution, ServiceInstance, ServiceName,
};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

const CHANGE_CHANNEL_CAPACITY: usize = 16;
const WATCH_BACKOFF_BASE_MS: u64 = 500;
const WATCH_BACKOFF_MAX_MS: u64 = 30_000;

struct Entry {
    instances: ArcSwap<Vec<ServiceInstance>>,
    index: AtomicU64,
    changes: broadcast::Sender<MembershipChange>,
}

/// Cached, discovery-backed view of every declared service.
pub struct ServiceRegistry {
    backend: Arc<dyn Discovery>,
    entries: HashMap<ServiceName, Entry>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ServiceRegistry {
    /// Resolve every service in `services` once.
    ///
    /// Any failure aborts construction: the gateway never starts with a
    /// service it could not resolve. An empty instance set is accepted.
    pub async fn connect(
        backend: Arc<dyn Discovery>,
        services: impl IntoIterator<Item = ServiceName>,
    ) -> Result<Self, DiscoveryError> {
        let mut entries = HashMap::new();
        for service in services {
            let resolution = backend.resolve(&service, None).await?;
            let Resolution { mut instances, index } = resolution;
            sort_instances(&mut instances);

            if instances.is_empty() {
                tracing::warn!(service = %service, "Service resolved with no live instances");
            } else {
                tracing::info!(service = %service, instances = instances.len(), "Service resolved");
            }
            metrics::record_registry_size(service.as_str(), instances.len());

            let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
            entries.insert(
                service,
                Entry {
                    instances: ArcSwap::from_pointee(instances),
                    index: AtomicU64::new(index.unwrap_or(0)),
                    changes,
                },
            );
        }

        Ok(Self { backend, entries })
    }

    /// Names of all declared services.
    pub fn services(&self) -> Vec<ServiceName> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Current instance list of `service`; `None` if it was never declared.
    pub fn instances(&self, service: &ServiceName) -> Option<Arc<Vec<ServiceInstance>>> {
        self.entries.get(service).map(|e| e.instances.load_full())
    }

    /// Subscribe to membership changes of `service`.
    pub fn watch(&self, service: &ServiceName) -> Option<broadcast::Receiver<MembershipChange>> {
        self.entries.get(service).map(|e| e.changes.subscribe())
    }

    /// Re-resolve one service immediately.
    pub async fn refresh(&self, service: &ServiceName) -> Result<Option<MembershipChange>, DiscoveryError> {
        if !self.entries.contains_key(service) {
            return Err(DiscoveryError::UnknownService(service.clone()));
        }
        let resolution = self.backend.resolve(service, None).await?;
        Ok(self.apply(service, resolution))
    }

    /// Re-resolve every declared service; failures are collected, not propagated.
    pub async fn refresh_all(&self) -> Vec<(ServiceName, Result<Option<MembershipChange>, DiscoveryError>)> {
        let mut outcomes = Vec::with_capacity(self.entries.len());
        for service in self.services() {
            let outcome = self.refresh(&service).await;
            if let Err(e) = &outcome {
                tracing::warn!(service = %service, error = %e, "Registry refresh failed; keeping last known instances");
            }
            outcomes.push((service, outcome));
        }
        outcomes
    }

    fn apply(&self, service: &ServiceName, resolution: Resolution) -> Option<MembershipChange> {
        let entry = self.entries.get(service)?;
        let Resolution { mut instances, index } = resolution;
        sort_instances(&mut instances);

        if let Some(index) = index {
            entry.index.store(index, Ordering::Relaxed);
        }

        let current = entry.instances.load();
        let change = MembershipChange::between(service, &current, &instances)?;
        drop(current);

        entry.instances.store(Arc::new(instances));
        metrics::record_registry_size(service.as_str(), change.total);
        tracing::info!(
            service = %service,
            added = change.added.len(),
            removed = change.removed.len(),
            total = change.total,
            "Service membership changed"
        );
        // No subscribers is fine.
        let _ = entry.changes.send(change.clone());
        Some(change)
    }

    /// Spawn one blocking-query watch loop per declared service.
    pub fn spawn_watchers(self: &Arc<Self>, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        self.services()
            .into_iter()
            .map(|service| {
                let registry = self.clone();
                let mut stop = shutdown.subscribe();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = registry.watch_loop(&service) => {}
                        _ = stop.recv() => {
                            tracing::debug!(service = %service, "Registry watcher stopping");
                        }
                    }
                })
            })
            .collect()
    }

    async fn watch_loop(&self, service: &ServiceName) {
        let Some(entry) = self.entries.get(service) else {
            return;
        };
        let mut failures: u32 = 0;

        loop {
            let last = entry.index.load(Ordering::Relaxed);
            match self.backend.resolve(service, Some(last)).await {
                Ok(mut resolution) => {
                    failures = 0;
                    // An index that goes backwards means the backend state was reset.
                    if let Some(index) = resolution.index {
                        if index < last {
                            resolution.index = Some(0);
                        }
                    }
                    self.apply(service, resolution);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = watch_backoff(failures);
                    tracing::warn!(service = %service, error = %e, retry_in = ?delay, "Registry watch failed");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Exponential backoff with up to 10% jitter.
fn watch_backoff(failures: u32) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }
    let exponential = 2u64.saturating_pow(failures - 1);
    let capped = WATCH_BACKOFF_BASE_MS
        .saturating_mul(exponential)
        .min(WATCH_BACKOFF_MAX_MS);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(capped + jitter)
}
