use std::{fmt, time::Duration};

use crate::config::RetentionConfig;

/// Lifecycle of a [`Scheduler`](super::Scheduler) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Initial refresh and sweep in progress.
    Starting,
    /// Waiting on the timers and the cancellation token.
    Running,
    /// Cancellation observed; the HTTP listener is being drained.
    Draining,
    /// Terminal.
    Stopped,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Periods of the three timers.
///
/// Production always uses [`Cadences::default`]; the fields are public so
/// tests can shrink them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadences {
    pub refresh: Duration,
    pub sweep: Duration,
    pub keepalive: Duration,
}

impl Default for Cadences {
    fn default() -> Self {
        Self {
            refresh: Duration::from_secs(60 * 60),
            sweep: Duration::from_secs(60),
            keepalive: Duration::from_secs(60),
        }
    }
}

/// Safety settings applied to every sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOptions {
    /// Log expired resources instead of deleting them.
    pub dry_run: bool,
    /// Cap on successful deletions per sweep. `None` is unlimited.
    pub max_deletes: Option<usize>,
}

impl SweepOptions {
    pub fn from_config(config: &RetentionConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            max_deletes: config
                .delete_limit()
                .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX)),
        }
    }
}
