// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Periodic refresh of an external resource.
//!
//! A [`Poller`] runs a fetch operation immediately and then on a fixed
//! interval, publishing the latest result through a `watch` channel.
//! At most one fetch is in flight per poller; ticks that land while a fetch
//! is pending are skipped rather than queued. Failures never blank the
//! published value and never stop the polling loop.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{LookupError, PollerError};
use crate::LookupFuture;

type FetchFn<T> = Arc<dyn Fn() -> LookupFuture<T> + Send + Sync>;

/// Latest known state of a polled resource.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState<T> {
    /// Value from the most recent successful fetch.
    pub last_value: Option<T>,
    /// Error from the most recent fetch, cleared on success.
    pub last_error: Option<LookupError>,
    /// Completion time of the most recent successful fetch.
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            last_value: None,
            last_error: None,
            last_updated_at: None,
        }
    }
}

impl<T> PollState<T> {
    /// State seeded with a known value, as if it had just been fetched.
    #[must_use]
    pub fn seeded(value: T) -> Self {
        Self {
            last_value: Some(value),
            last_error: None,
            last_updated_at: Some(Utc::now()),
        }
    }

    /// Whether the published value is older than the most recent attempt.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    fn record(&mut self, result: Result<T, LookupError>) {
        match result {
            Ok(value) => {
                self.last_value = Some(value);
                self.last_error = None;
                self.last_updated_at = Some(Utc::now());
            }
            Err(e) => {
                self.last_error = Some(e);
            }
        }
    }
}

/// Configuration for a poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Name used in log lines.
    pub name: String,
    /// Time between fetch attempts.
    pub interval: Duration,
}

impl PollerConfig {
    pub fn new(name: impl Into<String>, interval: Duration) -> Result<Self, PollerError> {
        if interval.is_zero() {
            return Err(PollerError::ZeroInterval);
        }
        Ok(Self {
            name: name.into(),
            interval,
        })
    }
}

/// Result of asking the poller to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A fetch was started.
    Started,
    /// A fetch was already in flight, nothing happened.
    Skipped,
    /// The poller has been stopped.
    Stopped,
}

/// Shared between the handle, the timer task and each fetch task.
struct Shared<T> {
    name: String,
    fetch: FetchFn<T>,
    state_tx: watch::Sender<PollState<T>>,
    in_flight: AtomicBool,
    cancel_token: CancellationToken,
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Start a fetch unless one is already running.
    fn tick(self: &Arc<Self>) -> TickOutcome {
        if self.cancel_token.is_cancelled() {
            return TickOutcome::Stopped;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("{}: fetch still in flight, skipping tick", self.name);
            return TickOutcome::Skipped;
        }

        let guard = InFlightGuard {
            shared: Arc::clone(self),
        };
        tokio::spawn(async move {
            let result = (guard.shared.fetch)().await;
            guard.shared.complete(result);
        });
        TickOutcome::Started
    }

    /// Publish a fetch result. The cancel check runs under the watch lock,
    /// so nothing is published once `cancel` has returned.
    fn complete(&self, result: Result<T, LookupError>) {
        self.state_tx.send_if_modified(|state| {
            if self.cancel_token.is_cancelled() {
                debug!("{}: discarding result that arrived after stop", self.name);
                return false;
            }
            if let Err(e) = &result {
                warn!("{}: fetch failed ({}): {}", self.name, e.kind(), e);
            }
            state.record(result);
            true
        });
    }
}

impl<T> Shared<T> {
    fn cancel(&self) {
        self.state_tx.send_if_modified(|_| {
            self.cancel_token.cancel();
            false
        });
    }
}

/// Clears the in-flight flag when a fetch task ends, including by panic.
struct InFlightGuard<T: Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + Sync + 'static> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared
                .complete(Err(LookupError::Network("fetch panicked".to_string())));
        }
        self.shared.in_flight.store(false, Ordering::Release);
    }
}

/// Handle to a running poller.
///
/// The timer task runs until [`Poller::stop`] is called or the handle is
/// dropped.
pub struct Poller<T> {
    shared: Arc<Shared<T>>,
    interval: Duration,
}

impl<T> std::fmt::Debug for Poller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("name", &self.shared.name)
            .field("interval", &self.interval)
            .field("in_flight", &self.shared.in_flight.load(Ordering::Relaxed))
            .field("cancel_token", &self.shared.cancel_token)
            .finish_non_exhaustive()
    }
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn a poller that fetches immediately and then every `config.interval`.
    #[must_use]
    pub fn spawn<F, Fut>(config: PollerConfig, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, LookupError>> + Send + 'static,
    {
        Self::spawn_with_state(config, PollState::default(), fetch)
    }

    /// Spawn a poller whose state starts from `initial` instead of empty.
    #[must_use]
    pub fn spawn_with_state<F, Fut>(config: PollerConfig, initial: PollState<T>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, LookupError>> + Send + 'static,
    {
        let (state_tx, _) = watch::channel(initial);
        let fetch: FetchFn<T> = Arc::new(move || Box::pin(fetch()) as LookupFuture<T>);

        let shared = Arc::new(Shared {
            name: config.name,
            fetch,
            state_tx,
            in_flight: AtomicBool::new(false),
            cancel_token: CancellationToken::new(),
        });

        let task_shared = Arc::clone(&shared);
        let interval = config.interval;
        info!(
            "{}: polling every {} ms",
            shared.name,
            interval.as_millis()
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        task_shared.tick();
                    }
                    () = task_shared.cancel_token.cancelled() => {
                        info!("{}: polling stopped", task_shared.name);
                        return;
                    }
                }
            }
        });

        Self { shared, interval }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> PollState<T> {
        self.shared.state_tx.borrow().clone()
    }

    /// Latest successfully fetched value, if any.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.shared.state_tx.borrow().last_value.clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.shared.state_tx.subscribe()
    }

    /// Fetch now unless a fetch is already in flight. Does not reset the timer.
    pub fn poll_now(&self) -> TickOutcome {
        self.shared.tick()
    }
}

impl<T> Poller<T> {
    /// Name given in the configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Configured interval between attempts.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a fetch is currently in flight.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Whether the poller is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.cancel_token.is_cancelled()
    }

    /// Stop polling. An in-flight fetch may finish but its result is dropped.
    pub fn stop(&self) {
        self.shared.cancel();
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn config(ms: u64) -> PollerConfig {
        PollerConfig::new("test", Duration::from_millis(ms)).unwrap()
    }

    /// Let spawned tasks run without advancing the paused clock much.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert_eq!(
            PollerConfig::new("zero", Duration::ZERO).unwrap_err(),
            PollerError::ZeroInterval
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_on_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let poller = Poller::spawn(config(2000), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, LookupError>(n) }
        });

        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.latest(), Some(0));

        tokio::time::sleep(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(poller.latest(), Some(1));
        assert!(poller.state().last_updated_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_tick_while_pending_is_noop() {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (g, c) = (Arc::clone(&gate), Arc::clone(&calls));
        let poller = Poller::spawn(config(60_000), move || {
            c.fetch_add(1, Ordering::SeqCst);
            let g = Arc::clone(&g);
            async move {
                g.notified().await;
                Ok::<_, LookupError>("iss")
            }
        });

        settle().await;
        assert!(poller.is_fetching());
        assert_eq!(poller.poll_now(), TickOutcome::Skipped);
        assert_eq!(poller.poll_now(), TickOutcome::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        settle().await;
        assert!(!poller.is_fetching());
        assert_eq!(poller.latest(), Some("iss"));

        assert_eq!(poller.poll_now(), TickOutcome::Started);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_skipped_while_pending() {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (g, c) = (Arc::clone(&gate), Arc::clone(&calls));
        let _poller = Poller::spawn(config(100), move || {
            c.fetch_add(1, Ordering::SeqCst);
            let g = Arc::clone(&g);
            async move {
                g.notified().await;
                Ok::<_, LookupError>(())
            }
        });

        // Several intervals elapse while the first fetch hangs.
        tokio::time::sleep(Duration::from_millis(550)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        settle().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_last_value() {
        let fail = Arc::new(AtomicBool::new(true));
        let f = Arc::clone(&fail);
        let poller = Poller::spawn_with_state(config(1000), PollState::seeded(7_u32), move || {
            let fail = f.load(Ordering::SeqCst);
            async move {
                if fail {
                    Err(LookupError::Network("connection reset".into()))
                } else {
                    Ok(8)
                }
            }
        });

        settle().await;
        let state = poller.state();
        assert_eq!(state.last_value, Some(7));
        assert_eq!(
            state.last_error,
            Some(LookupError::Network("connection reset".into()))
        );
        assert!(state.is_stale());
        assert!(poller.is_running());

        // Polling continues after the failure and recovers.
        fail.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        settle().await;
        let state = poller.state();
        assert_eq!(state.last_value, Some(8));
        assert!(state.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (g, c) = (Arc::clone(&gate), Arc::clone(&calls));
        let poller = Poller::spawn(config(100), move || {
            c.fetch_add(1, Ordering::SeqCst);
            let g = Arc::clone(&g);
            async move {
                g.notified().await;
                Ok::<_, LookupError>(42)
            }
        });

        settle().await;
        let mut rx = poller.subscribe();
        poller.stop();
        assert!(!poller.is_running());
        assert_eq!(poller.poll_now(), TickOutcome::Stopped);

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(500)).await;
        settle().await;

        assert_eq!(poller.latest(), None);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_fetch_does_not_stall_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let poller = Poller::spawn(config(100), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                assert!(n > 0, "first fetch blows up");
                Ok::<_, LookupError>(n)
            }
        });

        settle().await;
        assert!(!poller.is_fetching());
        assert_eq!(
            poller.state().last_error,
            Some(LookupError::Network("fetch panicked".into()))
        );

        tokio::time::sleep(Duration::from_millis(1000)).await;
        settle().await;
        assert!(calls.load(Ordering::SeqCst) >= 5);
        assert!(poller.latest().is_some());
        assert!(poller.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_complete_after_stop_publishes_nothing() {
        let poller = Poller::spawn(config(60_000), || async { Ok::<_, LookupError>(1_u8) });
        let mut rx = poller.subscribe();
        poller.stop();
        rx.mark_unchanged();

        poller.shared.complete(Ok(2));
        poller
            .shared
            .complete(Err(LookupError::Parse("late".into())));

        assert!(!rx.has_changed().unwrap());
        assert_ne!(poller.latest(), Some(2));
        assert_ne!(
            poller.state().last_error,
            Some(LookupError::Parse("late".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_timer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let poller = Poller::spawn(config(100), move || {
            c.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, LookupError>(()) }
        });
        settle().await;
        drop(poller);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_updates() {
        let poller = Poller::spawn(config(500), || async { Ok::<_, LookupError>(1.5_f64) });
        let mut rx = poller.subscribe();

        tokio::time::timeout(Duration::from_millis(100), rx.changed())
            .await
            .expect("timeout")
            .expect("sender dropped");
        assert_eq!(rx.borrow().last_value, Some(1.5));
    }
}
