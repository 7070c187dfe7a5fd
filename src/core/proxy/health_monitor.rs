/*!
Polling health-state machine with change notifications.

One `HealthMonitor` owns one endpoint's health state and is the only writer
of that state. It polls the configured endpoint on a fixed interval
(default 60s), transitions through

```text
Disconnected -> Connecting -> { Connected <-> Error } -> Disconnected
```

and invokes a registered callback whenever the status flips. The repeating
timer is a plain tokio task held through an explicit `JoinHandle`, aborted
on `stop()` and on drop - it never relies on garbage collection.

In-flight probes are not cancelled by `stop()` or a restart; instead every
run carries a generation token and a check that completes after its
generation was superseded is discarded, so late-arriving results cannot
corrupt newer state. Overlapping checks within one generation are not
serialized: the most recently completed check wins (see DESIGN.md).
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::core::proxy::probe::ProbeClient;
use crate::core::proxy::types::{
    get_local_timestamp, ConfigError, HealthChange, HealthSnapshot, HealthStatus, MonitorConfig,
    ValidationError, DEFAULT_PROBE_TIMEOUT_MS, MIN_CHECK_INTERVAL_MS,
};

#[cfg(feature = "network-monitoring")]
use crate::core::proxy::probe::{IsahcProbeClient, ProbeFailure};

type ChangeCallback = Arc<dyn Fn(HealthChange) + Send + Sync>;

/// Result of one explicit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckOutcome {
    pub status: HealthStatus,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

struct MonitorInner {
    config: Option<MonitorConfig>,
    snapshot: HealthSnapshot,
}

struct Shared {
    probe: Arc<dyn ProbeClient>,
    inner: Mutex<MonitorInner>,
    on_change: Mutex<Option<ChangeCallback>>,
    /// Bumped by `start()` and `stop()`; stale check results are discarded
    generation: AtomicU64,
    probe_timeout_ms: u64,
}

/// Polls a configured endpoint and emits state-change events.
///
/// State is mutated only by this instance's own check cycle; external code
/// reads it through `snapshot()`.
pub struct HealthMonitor {
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Create a monitor backed by the production isahc probe client
    #[cfg(feature = "network-monitoring")]
    pub fn new() -> Result<Self, ProbeFailure> {
        Ok(Self::with_probe_client(Arc::new(IsahcProbeClient::new()?)))
    }

    /// Create a monitor with an injected probe client (used by tests)
    pub fn with_probe_client(probe: Arc<dyn ProbeClient>) -> Self {
        Self {
            shared: Arc::new(Shared {
                probe,
                inner: Mutex::new(MonitorInner {
                    config: None,
                    snapshot: HealthSnapshot::default(),
                }),
                on_change: Mutex::new(None),
                generation: AtomicU64::new(0),
                probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            }),
            timer: None,
        }
    }

    /// Override the per-probe timeout (for testing)
    pub fn with_probe_timeout_ms(mut self, timeout_ms: u64) -> Self {
        // Shared is not yet aliased by a timer task at builder time
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.probe_timeout_ms = timeout_ms;
        }
        self
    }

    /// Register the change callback, replacing any previous one.
    ///
    /// The callback fires once per status flip with the previous and current
    /// status. A panicking callback is caught and logged; it never stops the
    /// monitor and never propagates.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(HealthChange) + Send + Sync + 'static,
    {
        *lock(&self.shared.on_change) = Some(Arc::new(callback));
    }

    /// Start monitoring `config`.
    ///
    /// Cancels any prior run, moves to `Connecting`, runs one check
    /// immediately and then repeats at `check_interval_ms`. Must be called
    /// from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the config is missing a host or port; the monitor
    /// is left in its previous state in that case.
    pub fn start(&mut self, config: MonitorConfig) -> Result<(), ConfigError> {
        if config.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if config.port == 0 {
            return Err(ConfigError::MissingPort);
        }

        self.cancel_timer();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let interval_ms = config.check_interval_ms.max(1);
        {
            let mut inner = lock(&self.shared.inner);
            inner.config = Some(config);
            inner.snapshot.status = HealthStatus::Connecting;
            inner.snapshot.error = None;
        }

        let shared = Arc::clone(&self.shared);
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            loop {
                ticker.tick().await;
                Shared::run_check(&shared, generation).await;
            }
        }));

        Ok(())
    }

    /// Stop monitoring.
    ///
    /// Cancels the timer, clears the active config and resets the status to
    /// `Disconnected` while preserving `last_check_at`/`latency_ms` for
    /// display. Idempotent; safe to call when not running. An in-flight
    /// check is not cancelled, but its result is discarded.
    pub fn stop(&mut self) {
        self.cancel_timer();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        let mut inner = lock(&self.shared.inner);
        inner.config = None;
        inner.snapshot.status = HealthStatus::Disconnected;
        inner.snapshot.error = None;
    }

    /// Run one check right now against the current config.
    ///
    /// Updates internal state and fires the change callback exactly like a
    /// timer-driven check.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotRunning` when no config is active (never started, or
    /// stopped).
    pub async fn check_now(&self) -> Result<HealthCheckOutcome, ConfigError> {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        Shared::run_check(&self.shared, generation)
            .await
            .ok_or(ConfigError::NotRunning)
    }

    /// Change the polling interval.
    ///
    /// Rejects intervals below one second. If the monitor is currently
    /// running it restarts against the same config with the new interval;
    /// otherwise this only validates.
    pub fn set_check_interval(&mut self, interval_ms: u64) -> Result<(), ValidationError> {
        if interval_ms < MIN_CHECK_INTERVAL_MS {
            return Err(ValidationError::IntervalTooShort);
        }

        let config = lock(&self.shared.inner).config.clone();
        if let Some(mut config) = config {
            config.check_interval_ms = interval_ms;
            if let Err(error) = self.start(config) {
                // unreachable: the config was validated when the run started
                warn!(target: "proxylink::health", %error, "restart after interval change failed");
            }
        }
        Ok(())
    }

    /// Read-only view of the current state
    pub fn snapshot(&self) -> HealthSnapshot {
        lock(&self.shared.inner).snapshot.clone()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some() && lock(&self.shared.inner).config.is_some()
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

impl Shared {
    /// Execute one probe and fold the result into the monitor state.
    ///
    /// Returns `None` when there is no active config or when the result is
    /// stale (the generation moved on while the probe was in flight).
    async fn run_check(shared: &Arc<Shared>, generation: u64) -> Option<HealthCheckOutcome> {
        let (host, port) = {
            let inner = lock(&shared.inner);
            if generation != shared.generation.load(Ordering::SeqCst) {
                return None;
            }
            let config = inner.config.as_ref()?;
            (config.host.clone(), config.port)
        };

        let url = format!("http://{}:{}/", host.trim(), port);
        let result = shared.probe.request(&url, None, shared.probe_timeout_ms).await;

        // A stale check must not overwrite state owned by a newer run
        if generation != shared.generation.load(Ordering::SeqCst) {
            debug!(target: "proxylink::health", %url, "discarding stale health check result");
            return None;
        }

        let timestamp = get_local_timestamp();
        let (status, latency_ms, error) = match result {
            Ok(response) => (
                HealthStatus::Connected,
                Some(response.latency.as_millis() as u64),
                None,
            ),
            Err(failure) => (HealthStatus::Error, None, Some(failure.to_string())),
        };

        let previous = {
            let mut inner = lock(&shared.inner);
            let previous = inner.snapshot.status;
            inner.snapshot.status = status;
            inner.snapshot.last_check_at = Some(timestamp.clone());
            inner.snapshot.latency_ms = latency_ms;
            inner.snapshot.error = error.clone();
            previous
        };

        if previous != status {
            let callback = lock(&shared.on_change).clone();
            if let Some(callback) = callback {
                let event = HealthChange {
                    previous,
                    current: status,
                    timestamp,
                    latency_ms,
                    error: error.clone(),
                };
                let call = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    callback(event);
                }));
                if call.is_err() {
                    warn!(target: "proxylink::health", "health change callback panicked");
                }
            }
        }

        Some(HealthCheckOutcome {
            status,
            latency_ms,
            error,
        })
    }
}

/// Lock helper: the monitor never holds a guard across an await or a
/// callback invocation, so a poisoned lock only ever wraps consistent state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
