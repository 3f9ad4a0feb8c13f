/// Result of a single refresh.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Number of resources the remote listed.
    pub listed: usize,
    /// Size of the store after merging the listing.
    pub stored: usize,
}

/// Result of a single sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Store entries looked at.
    pub examined: usize,
    /// Entries the retention policy reported as expired.
    pub expired: usize,
    /// Expired entries deleted remotely and removed from the store.
    pub deleted: usize,
    /// Expired entries whose remote delete failed. They stay in the store.
    pub failed: usize,
    /// Expired entries left alone because of dry run or the per-sweep cap.
    pub skipped: usize,
}

impl SweepOutcome {
    /// Check if the sweep had anything to do.
    pub fn has_work(&self) -> bool {
        self.expired > 0
    }
}

/// Totals over a whole scheduler run, returned once it stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Refreshes that completed.
    pub refreshes: usize,
    /// Refreshes abandoned because the listing failed.
    pub refresh_failures: usize,
    pub sweeps: usize,
    /// Resources deleted across all sweeps.
    pub deleted: usize,
    /// Keep-alive pings dispatched.
    pub pings: usize,
}

impl RunSummary {
    pub(super) fn record_refresh(&mut self, succeeded: bool) {
        if succeeded {
            self.refreshes += 1;
        } else {
            self.refresh_failures += 1;
        }
    }

    pub(super) fn record_sweep(&mut self, outcome: &SweepOutcome) {
        self.sweeps += 1;
        self.deleted += outcome.deleted;
    }
}
