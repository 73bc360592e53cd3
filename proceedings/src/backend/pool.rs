//! Load-balanced backend pool with per-instance capacity accounting
//!
//! Each instance admits at most `max_concurrent` requests. `acquire()` picks
//! the least-loaded healthy instance and refuses outright when every healthy
//! instance is full; it never queues. A [`PoolLease`] holds the slot and
//! frees it on drop.
//!
//! Health is maintained by an independent probe task
//! ([`BackendPool::spawn_health_probe`]) that no trial depends on.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{BackendResult, ModelBackend};

/// Pool admission errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("All {healthy} healthy instances are at capacity")]
    AtCapacity { healthy: usize },

    #[error("No healthy backend instance")]
    NoHealthyInstance,
}

struct PoolInstance {
    backend: Arc<dyn ModelBackend>,
    max_concurrent: usize,
    active: AtomicUsize,
    healthy: AtomicBool,
    served: AtomicU64,
    failed: AtomicU64,
}

impl PoolInstance {
    fn load(&self) -> f64 {
        self.active.load(Ordering::SeqCst) as f64 / self.max_concurrent as f64
    }

    /// Claim a slot unless the instance is full.
    fn try_claim(&self) -> bool {
        let mut current = self.active.load(Ordering::SeqCst);
        loop {
            if current >= self.max_concurrent {
                return false;
            }
            match self.active.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

/// A claimed request slot on one instance; released on drop.
pub struct PoolLease {
    instance: Arc<PoolInstance>,
}

impl PoolLease {
    pub fn backend(&self) -> Arc<dyn ModelBackend> {
        self.instance.backend.clone()
    }
}

impl Drop for PoolLease {
    fn drop(&mut self) {
        self.instance.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for PoolLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolLease")
            .field("backend", &self.instance.backend.name())
            .finish()
    }
}

/// Point-in-time view of one instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceStatus {
    pub name: String,
    pub healthy: bool,
    pub active: usize,
    pub max_concurrent: usize,
    pub served: u64,
    pub failed: u64,
}

/// A set of interchangeable model instances.
#[derive(Default)]
pub struct BackendPool {
    instances: Vec<Arc<PoolInstance>>,
    /// Bound on one health check; an instance that exceeds it is unhealthy.
    check_timeout: Option<Duration>,
}

impl BackendPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance admitting up to `max_concurrent` requests (at least one).
    pub fn add(&mut self, backend: Arc<dyn ModelBackend>, max_concurrent: usize) {
        self.instances.push(Arc::new(PoolInstance {
            backend,
            max_concurrent: max_concurrent.max(1),
            active: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            served: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }));
    }

    pub fn with_instance(mut self, backend: Arc<dyn ModelBackend>, max_concurrent: usize) -> Self {
        self.add(backend, max_concurrent);
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = Some(timeout);
        self
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Claim a slot on the least-loaded healthy instance.
    pub fn acquire(&self) -> Result<PoolLease, PoolError> {
        let mut healthy: Vec<&Arc<PoolInstance>> = self
            .instances
            .iter()
            .filter(|i| i.healthy.load(Ordering::SeqCst))
            .collect();
        if healthy.is_empty() {
            return Err(PoolError::NoHealthyInstance);
        }
        healthy.sort_by(|a, b| a.load().total_cmp(&b.load()));

        for instance in &healthy {
            if instance.try_claim() {
                debug!(
                    backend = %instance.backend.name(),
                    active = instance.active.load(Ordering::SeqCst),
                    max = instance.max_concurrent,
                    "Lease acquired"
                );
                return Ok(PoolLease {
                    instance: Arc::clone(instance),
                });
            }
        }

        Err(PoolError::AtCapacity {
            healthy: healthy.len(),
        })
    }

    pub fn status(&self) -> Vec<InstanceStatus> {
        self.instances
            .iter()
            .map(|i| InstanceStatus {
                name: i.backend.name(),
                healthy: i.healthy.load(Ordering::SeqCst),
                active: i.active.load(Ordering::SeqCst),
                max_concurrent: i.max_concurrent,
                served: i.served.load(Ordering::SeqCst),
                failed: i.failed.load(Ordering::SeqCst),
            })
            .collect()
    }

    /// Health-check every instance once, concurrently, updating its flag.
    pub async fn probe_once(&self) -> usize {
        let checks = self.instances.iter().map(|instance| async move {
            let ok = match self.check_timeout {
                Some(limit) => match tokio::time::timeout(limit, instance.backend.health_check()).await {
                    Ok(ok) => ok,
                    Err(_) => {
                        debug!(backend = %instance.backend.name(), ?limit, "Health check timed out");
                        false
                    }
                },
                None => instance.backend.health_check().await,
            };
            let was = instance.healthy.swap(ok, Ordering::SeqCst);
            if was && !ok {
                warn!(backend = %instance.backend.name(), "Backend became unhealthy");
            } else if !was && ok {
                info!(backend = %instance.backend.name(), "Backend recovered");
            }
            ok
        });
        join_all(checks).await.into_iter().filter(|ok| *ok).count()
    }

    /// Probe on a fixed interval until `cancel` fires.
    pub fn spawn_health_probe(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Health probe stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let healthy = pool.probe_once().await;
                        debug!(healthy, total = pool.len(), "Health probe complete");
                    }
                }
            }
        })
    }
}

#[async_trait]
impl ModelBackend for BackendPool {
    fn name(&self) -> String {
        format!("pool[{}]", self.instances.len())
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> BackendResult<String> {
        let lease = self.acquire()?;
        let result = lease.instance.backend.generate(prompt, max_tokens).await;
        match &result {
            Ok(_) => lease.instance.served.fetch_add(1, Ordering::SeqCst),
            Err(_) => lease.instance.failed.fetch_add(1, Ordering::SeqCst),
        };
        result
    }

    async fn health_check(&self) -> bool {
        self.probe_once().await > 0
    }
}
