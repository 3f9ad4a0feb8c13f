use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;

use super::{Cadences, RefreshOutcome, RunSummary, SchedulerState, SweepOptions, SweepOutcome};
use crate::{
    clock::{Clock, SystemClock},
    keepalive::KeepAlive,
    observability::metrics,
    remote::{ClientError, ResourceClient},
    resources::{ResourceId, ResourceStore, RetentionPolicy},
    server::ListenerHandle,
};

/// Owns the resource store and drives refreshes, sweeps and keep-alive
/// pings until cancelled.
pub struct Scheduler {
    store: ResourceStore,
    client: Arc<dyn ResourceClient>,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
    pinger: Option<Arc<dyn KeepAlive>>,
    cadences: Cadences,
    options: SweepOptions,
    listener: Option<(ListenerHandle, Duration)>,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(
        store: ResourceStore,
        client: Arc<dyn ResourceClient>,
        policy: RetentionPolicy,
    ) -> Self {
        let (state, _) = watch::channel(SchedulerState::Starting);
        Self {
            store,
            client,
            policy,
            clock: Arc::new(SystemClock),
            pinger: None,
            cadences: Cadences::default(),
            options: SweepOptions::default(),
            listener: None,
            state,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Ping `pinger` on every keep-alive tick. Without one the keep-alive
    /// timer is never polled.
    pub fn with_pinger(mut self, pinger: Arc<dyn KeepAlive>) -> Self {
        self.pinger = Some(pinger);
        self
    }

    pub fn with_cadences(mut self, cadences: Cadences) -> Self {
        self.cadences = cadences;
        self
    }

    pub fn with_sweep_options(mut self, options: SweepOptions) -> Self {
        self.options = options;
        self
    }

    /// Drain `listener` for at most `grace` once cancellation is observed.
    pub fn with_listener(mut self, listener: ListenerHandle, grace: Duration) -> Self {
        self.listener = Some((listener, grace));
        self
    }

    /// Observe state transitions of [`Scheduler::run`].
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    fn set_state(&self, state: SchedulerState) {
        tracing::debug!(state = %state, "Scheduler state change");
        self.state.send_replace(state);
    }

    /// List every remote resource and merge the listing into the store.
    ///
    /// Entries missing from the listing are kept. On error the store is left
    /// untouched.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, ClientError> {
        let resources = match self.client.list().await {
            Ok(resources) => resources,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Error listing resources");
                metrics::record_refresh("error", None);
                return Err(e);
            }
        };

        let listed = self.store.extend(resources);
        let outcome = RefreshOutcome {
            listed,
            stored: self.store.len(),
        };

        tracing::info!(
            listed = outcome.listed,
            stored = outcome.stored,
            "Refreshed {} resources, {} stored",
            outcome.listed,
            outcome.stored
        );
        metrics::record_refresh("success", Some(outcome.stored));

        Ok(outcome)
    }

    /// Delete every expired resource in the store.
    ///
    /// An entry is removed only after its remote delete succeeded; failures
    /// are logged and retried by the next sweep.
    pub async fn sweep(&mut self) -> SweepOutcome {
        let now = self.clock.now();
        let dry_run_msg = if self.options.dry_run {
            " (DRY RUN)"
        } else {
            ""
        };
        // Only the identity of expired entries is copied out; payloads stay put.
        let expired: Vec<(ResourceId, String)> = self
            .store
            .iter()
            .filter(|resource| self.policy.is_expired(resource, now))
            .map(|resource| (resource.id.clone(), resource.created_at.clone()))
            .collect();
        let mut outcome = SweepOutcome {
            examined: self.store.len(),
            expired: expired.len(),
            ..Default::default()
        };

        for (id, created_at) in expired {
            if self.options.dry_run {
                tracing::info!(
                    id = %id,
                    created_at = %created_at,
                    "DRY RUN: Would delete resource {}",
                    id
                );
                outcome.skipped += 1;
                continue;
            }

            if matches!(self.options.max_deletes, Some(limit) if outcome.deleted >= limit) {
                outcome.skipped += 1;
                continue;
            }

            match self.client.delete(&id).await {
                Ok(()) => {
                    self.store.remove(&id);
                    outcome.deleted += 1;
                    metrics::record_deletion("success");
                    tracing::debug!(id = %id, created_at = %created_at, "Deleted resource");
                }
                Err(e) => {
                    outcome.failed += 1;
                    metrics::record_deletion(e.kind());
                    tracing::warn!(
                        id = %id,
                        error = %e,
                        kind = e.kind(),
                        "Error deleting resource"
                    );
                }
            }
        }

        metrics::record_sweep(self.store.len());

        if outcome.has_work() {
            tracing::info!(
                examined = outcome.examined,
                expired = outcome.expired,
                deleted = outcome.deleted,
                failed = outcome.failed,
                skipped = outcome.skipped,
                cutoff = %self.policy.cutoff(now),
                "Sweep complete{}",
                dry_run_msg
            );
        } else {
            tracing::debug!(examined = outcome.examined, "Sweep complete, nothing expired");
        }

        outcome
    }

    /// Run until `cancel` fires.
    ///
    /// Performs one refresh and one sweep up front, then reacts to whichever
    /// timer fires first. Each timer first fires one full period after the
    /// initial sweep. Once cancelled, the HTTP listener (if any) is drained
    /// and the totals of the run are returned.
    pub async fn run(mut self, cancel: CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();

        self.set_state(SchedulerState::Starting);
        tracing::info!(
            max_age_secs = self.policy.max_age().num_seconds(),
            refresh_secs = self.cadences.refresh.as_secs(),
            sweep_secs = self.cadences.sweep.as_secs(),
            keepalive = self.pinger.is_some(),
            dry_run = self.options.dry_run,
            "Starting scheduler"
        );

        let refreshed = self.refresh().await.is_ok();
        summary.record_refresh(refreshed);
        let outcome = self.sweep().await;
        summary.record_sweep(&outcome);

        let start = Instant::now();
        let mut refresh_tick = interval_at(start + self.cadences.refresh, self.cadences.refresh);
        let mut sweep_tick = interval_at(start + self.cadences.sweep, self.cadences.sweep);
        let mut keepalive_tick =
            interval_at(start + self.cadences.keepalive, self.cadences.keepalive);
        for tick in [&mut refresh_tick, &mut sweep_tick, &mut keepalive_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let pinger = self.pinger.clone();
        self.set_state(SchedulerState::Running);

        loop {
            // Timers due while an action ran must not win against a
            // cancellation that arrived during it.
            if cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = refresh_tick.tick() => {
                    let refreshed = self.refresh().await.is_ok();
                    summary.record_refresh(refreshed);
                }
                _ = sweep_tick.tick() => {
                    let outcome = self.sweep().await;
                    summary.record_sweep(&outcome);
                }
                _ = keepalive_tick.tick(), if pinger.is_some() => {
                    if let Some(pinger) = pinger.clone() {
                        tokio::spawn(async move { pinger.ping().await });
                        summary.pings += 1;
                    }
                }
            }
        }

        self.set_state(SchedulerState::Draining);
        tracing::info!("Cancellation received, draining");

        if let Some((listener, grace)) = self.listener.take() {
            listener.drain(grace).await;
        }

        self.set_state(SchedulerState::Stopped);
        tracing::info!(
            refreshes = summary.refreshes,
            refresh_failures = summary.refresh_failures,
            sweeps = summary.sweeps,
            deleted = summary.deleted,
            pings = summary.pings,
            "Scheduler stopped"
        );

        summary
    }
}
