//! Host-driven refresh cadence.
//!
//! The host calls [`RefreshScheduler::tick`] on its own timer; the scheduler
//! decides whether the expensive rebuild or the cheap progress refresh is
//! due. Rebuild requests are debounced, refresh requests are throttled.
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::ChecklistConfig;

/// Work the host should run for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledWork {
    Idle,
    RefreshProgress,
    RebuildCache,
}

#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    refresh_interval: Duration,
    rebuild_debounce: Duration,
    rebuild_due: Option<Instant>,
    refresh_pending: bool,
    last_refresh: Option<Instant>,
}

impl RefreshScheduler {
    #[must_use]
    pub const fn new(refresh_interval: Duration, rebuild_debounce: Duration) -> Self {
        Self {
            refresh_interval,
            rebuild_debounce,
            rebuild_due: None,
            refresh_pending: false,
            last_refresh: None,
        }
    }

    #[must_use]
    pub const fn from_config(config: &ChecklistConfig) -> Self {
        Self::new(config.refresh_interval(), config.rebuild_debounce())
    }

    /// Reference data changed; rebuild once things settle.
    ///
    /// Each request restarts the debounce window.
    pub fn request_rebuild(&mut self, now: Instant) {
        self.rebuild_due = Some(now + self.rebuild_debounce);
    }

    /// Rebuild on the next tick regardless of debounce.
    pub fn request_rebuild_now(&mut self, now: Instant) {
        self.rebuild_due = Some(self.rebuild_due.map_or(now, |due| due.min(now)));
    }

    /// Progress changed; refresh when the throttle allows.
    pub fn request_refresh(&mut self) {
        self.refresh_pending = true;
    }

    #[must_use]
    pub const fn rebuild_pending(&self) -> bool {
        self.rebuild_due.is_some()
    }

    #[must_use]
    pub const fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    pub fn tick(&mut self, now: Instant) -> ScheduledWork {
        if self.rebuild_due.is_some_and(|due| now >= due) {
            // a rebuild refreshes every experiment as well
            self.rebuild_due = None;
            self.refresh_pending = false;
            self.last_refresh = Some(now);
            return ScheduledWork::RebuildCache;
        }

        let throttled = self
            .last_refresh
            .is_some_and(|last| now.saturating_duration_since(last) < self.refresh_interval);
        if self.refresh_pending && !throttled {
            self.refresh_pending = false;
            self.last_refresh = Some(now);
            return ScheduledWork::RefreshProgress;
        }

        ScheduledWork::Idle
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::from_config(&ChecklistConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn idle_without_requests() {
        let mut scheduler = RefreshScheduler::default();
        assert_eq!(scheduler.tick(Instant::now()), ScheduledWork::Idle);
    }

    #[test]
    fn rebuild_waits_for_debounce_and_restarts() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(ms(500), ms(1_000));
        scheduler.request_rebuild(start);
        assert_eq!(scheduler.tick(start + ms(900)), ScheduledWork::Idle);

        scheduler.request_rebuild(start + ms(900));
        assert_eq!(scheduler.tick(start + ms(1_500)), ScheduledWork::Idle);
        assert_eq!(scheduler.tick(start + ms(1_900)), ScheduledWork::RebuildCache);
        assert!(!scheduler.rebuild_pending());
        assert_eq!(scheduler.tick(start + ms(5_000)), ScheduledWork::Idle);
    }

    #[test]
    fn immediate_rebuild_skips_debounce() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(ms(500), ms(1_000));
        scheduler.request_rebuild(start);
        scheduler.request_rebuild_now(start);
        assert_eq!(scheduler.tick(start), ScheduledWork::RebuildCache);
    }

    #[test]
    fn refresh_is_throttled() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(ms(500), ms(1_000));
        scheduler.request_refresh();
        assert_eq!(scheduler.tick(start), ScheduledWork::RefreshProgress);

        scheduler.request_refresh();
        assert_eq!(scheduler.tick(start + ms(200)), ScheduledWork::Idle);
        assert!(scheduler.refresh_pending());
        assert_eq!(
            scheduler.tick(start + ms(500)),
            ScheduledWork::RefreshProgress
        );
        assert_eq!(scheduler.tick(start + ms(2_000)), ScheduledWork::Idle);
    }

    #[test]
    fn rebuild_absorbs_pending_refresh() {
        let start = Instant::now();
        let mut scheduler = RefreshScheduler::new(ms(500), ms(0));
        scheduler.request_refresh();
        scheduler.request_rebuild(start);
        assert_eq!(scheduler.tick(start), ScheduledWork::RebuildCache);
        assert!(!scheduler.refresh_pending());
        assert_eq!(scheduler.tick(start + ms(1_000)), ScheduledWork::Idle);
    }
}
