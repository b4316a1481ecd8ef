//! Service health monitoring
//!
//! Polls the two backend services independently and keeps the reachability
//! flags the pipeline gates on. A failed check schedules exactly one retry
//! after a fixed backoff; a newer failure replaces the older timer, so at
//! most one retry is ever pending per service. Check failures are recorded
//! in status, never escalated to callers.

use livecoder_common::{Result, ServiceKind, ServiceStatus};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Liveness probe for one backend service
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> Result<()>;
}

/// Monitors backend reachability with an explicit start/stop lifecycle
#[derive(Clone)]
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    probes: HashMap<ServiceKind, Arc<dyn Probe>>,
    statuses: RwLock<HashMap<ServiceKind, ServiceStatus>>,
    /// At most one entry per service; replaced, not stacked
    retry_timers: Mutex<HashMap<ServiceKind, JoinHandle<()>>>,
    pollers: Mutex<Vec<JoinHandle<()>>>,
    poll_interval: Duration,
    retry_backoff: Duration,
}

impl HealthMonitor {
    pub fn new(
        probes: HashMap<ServiceKind, Arc<dyn Probe>>,
        poll_interval: Duration,
        retry_backoff: Duration,
    ) -> Self {
        let statuses = probes
            .keys()
            .map(|kind| (*kind, ServiceStatus::default()))
            .collect();

        Self {
            inner: Arc::new(Inner {
                probes,
                statuses: RwLock::new(statuses),
                retry_timers: Mutex::new(HashMap::new()),
                pollers: Mutex::new(Vec::new()),
                poll_interval,
                retry_backoff,
            }),
        }
    }

    /// Begin periodic polling, one independent task per service
    pub fn start(&self) {
        let mut pollers = self.inner.pollers.lock();
        if !pollers.is_empty() {
            return;
        }

        for service in self.inner.probes.keys().copied() {
            let monitor = self.clone();
            pollers.push(tokio::spawn(async move {
                loop {
                    monitor.check_once(service).await;
                    tokio::time::sleep(monitor.inner.poll_interval).await;
                }
            }));
        }
    }

    /// Cancel all polling and pending retry timers; safe with none pending
    pub fn stop(&self) {
        for handle in self.inner.pollers.lock().drain(..) {
            handle.abort();
        }
        for (_, handle) in self.inner.retry_timers.lock().drain() {
            handle.abort();
        }
    }

    /// Probe one service now and update its status
    pub async fn check_once(&self, service: ServiceKind) -> ServiceStatus {
        let Some(probe) = self.inner.probes.get(&service).cloned() else {
            return ServiceStatus::default();
        };

        match probe.probe().await {
            Ok(()) => {
                debug!(%service, "health check ok");
                self.cancel_retry(service);
                let status = ServiceStatus {
                    reachable: true,
                    last_error: None,
                };
                self.set_status(service, status.clone());
                status
            }
            Err(e) => {
                warn!(%service, error = %e, "health check failed");
                let status = ServiceStatus {
                    reachable: false,
                    last_error: Some(e.to_string()),
                };
                self.set_status(service, status.clone());
                self.schedule_retry(service);
                status
            }
        }
    }

    pub fn status(&self, service: ServiceKind) -> ServiceStatus {
        self.inner
            .statuses
            .read()
            .get(&service)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_reachable(&self, service: ServiceKind) -> bool {
        self.status(service).reachable
    }

    /// Record a connectivity failure observed outside the poll cycle
    pub fn mark_unreachable(&self, service: ServiceKind, reason: &str) {
        self.set_status(
            service,
            ServiceStatus {
                reachable: false,
                last_error: Some(reason.to_string()),
            },
        );
    }

    /// Fire an out-of-band check without waiting for its outcome
    pub fn spawn_check(&self, service: ServiceKind) {
        let monitor = self.clone();
        tokio::spawn(async move {
            monitor.check_once(service).await;
        });
    }

    /// Number of currently scheduled retry timers across all services
    pub fn pending_retries(&self) -> usize {
        self.inner.retry_timers.lock().len()
    }

    fn set_status(&self, service: ServiceKind, status: ServiceStatus) {
        self.inner.statuses.write().insert(service, status);
    }

    fn cancel_retry(&self, service: ServiceKind) {
        if let Some(handle) = self.inner.retry_timers.lock().remove(&service) {
            handle.abort();
        }
    }

    fn schedule_retry(&self, service: ServiceKind) {
        let mut timers = self.inner.retry_timers.lock();
        if let Some(previous) = timers.remove(&service) {
            previous.abort();
        }

        let monitor = self.clone();
        let backoff = self.inner.retry_backoff;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(backoff).await;
            monitor.inner.retry_timers.lock().remove(&service);
            monitor.check_once(service).await;
        });
        timers.insert(service, handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecoder_common::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedProbe {
        healthy: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Probe for ScriptedProbe {
        async fn probe(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(Error::Connectivity {
                    service: ServiceKind::Generation,
                    reason: "connection refused".into(),
                })
            }
        }
    }

    fn monitor_with(probe: Arc<ScriptedProbe>) -> HealthMonitor {
        let mut probes: HashMap<ServiceKind, Arc<dyn Probe>> = HashMap::new();
        probes.insert(ServiceKind::Generation, probe);
        HealthMonitor::new(probes, Duration::from_secs(30), Duration::from_secs(5))
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn consecutive_failures_keep_a_single_pending_retry() {
        let probe = Arc::new(ScriptedProbe::default());
        let monitor = monitor_with(probe.clone());

        monitor.check_once(ServiceKind::Generation).await;
        assert!(!monitor.is_reachable(ServiceKind::Generation));
        assert_eq!(monitor.pending_retries(), 1);

        // Let the retry fire and fail again; the replacement timer must not
        // stack on top of the old one.
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert!(probe.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(monitor.pending_retries(), 1);

        monitor.stop();
        assert_eq!(monitor.pending_retries(), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn successful_check_cancels_the_pending_retry() {
        let probe = Arc::new(ScriptedProbe::default());
        let monitor = monitor_with(probe.clone());

        monitor.check_once(ServiceKind::Generation).await;
        assert_eq!(monitor.pending_retries(), 1);

        probe.healthy.store(true, Ordering::SeqCst);
        let status = monitor.check_once(ServiceKind::Generation).await;
        assert!(status.reachable);
        assert!(status.last_error.is_none());
        assert_eq!(monitor.pending_retries(), 0);
    }

    #[tokio::test]
    async fn stop_is_safe_with_no_timers_pending() {
        let monitor = monitor_with(Arc::new(ScriptedProbe::default()));
        monitor.stop();
        monitor.stop();
    }

    #[tokio::test]
    async fn services_are_tracked_independently() {
        let healthy = Arc::new(ScriptedProbe::default());
        healthy.healthy.store(true, Ordering::SeqCst);
        let failing = Arc::new(ScriptedProbe::default());

        let mut probes: HashMap<ServiceKind, Arc<dyn Probe>> = HashMap::new();
        probes.insert(ServiceKind::Generation, healthy);
        probes.insert(ServiceKind::ArtifactStore, failing);
        let monitor =
            HealthMonitor::new(probes, Duration::from_secs(30), Duration::from_secs(60));

        monitor.check_once(ServiceKind::Generation).await;
        monitor.check_once(ServiceKind::ArtifactStore).await;

        assert!(monitor.is_reachable(ServiceKind::Generation));
        assert!(!monitor.is_reachable(ServiceKind::ArtifactStore));
        assert!(monitor
            .status(ServiceKind::ArtifactStore)
            .last_error
            .is_some());
        monitor.stop();
    }

    #[tokio::test]
    async fn mark_unreachable_flips_the_gate() {
        let probe = Arc::new(ScriptedProbe::default());
        probe.healthy.store(true, Ordering::SeqCst);
        let monitor = monitor_with(probe);

        monitor.check_once(ServiceKind::Generation).await;
        assert!(monitor.is_reachable(ServiceKind::Generation));

        monitor.mark_unreachable(ServiceKind::Generation, "connection reset");
        assert!(!monitor.is_reachable(ServiceKind::Generation));
    }
}
