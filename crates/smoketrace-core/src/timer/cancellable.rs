//! Cancellable timers on a millisecond timeline.
//!
//! A timer is plain data: it never spawns anything and never calls back.
//! Its owner asks for the next deadline, sleeps however it likes, and then
//! polls. Dropping the owner drops the timer, so a fire after teardown has
//! nothing left to mutate.
//!
//! ```text
//! disarmed --start(now)--> armed(deadline) --poll(now >= deadline)--> fired
//!    ^                          |                                      |
//!    +---------cancel()---------+       one-shot: disarmed; repeating: re-armed
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    OneShot,
    Repeating,
}

#[derive(Debug, Clone)]
pub struct CancellableTimer {
    kind: TimerKind,
    period_ms: u64,
    deadline_ms: Option<u64>,
}

impl CancellableTimer {
    /// A timer that fires once, `delay_ms` after it is started.
    pub fn one_shot(delay_ms: u64) -> Self {
        Self {
            kind: TimerKind::OneShot,
            period_ms: delay_ms,
            deadline_ms: None,
        }
    }

    /// A timer that fires every `period_ms` until cancelled.
    ///
    /// A zero period is bumped to 1ms so polling always makes progress.
    pub fn repeating(period_ms: u64) -> Self {
        Self {
            kind: TimerKind::Repeating,
            period_ms: period_ms.max(1),
            deadline_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Whether a poll at `now_ms` would fire.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|deadline| deadline <= now_ms)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm (or re-arm) the timer relative to `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    /// Disarm the timer. Returns whether it was armed.
    pub fn cancel(&mut self) -> bool {
        self.deadline_ms.take().is_some()
    }

    /// Fire at most once. Returns the deadline that fired.
    ///
    /// A repeating timer is re-armed from its own deadline rather than from
    /// `now_ms`, so a late poll does not stretch the period; the caller polls
    /// again to catch up on missed fires one at a time.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        let deadline = self.deadline_ms?;
        if now_ms < deadline {
            return None;
        }
        self.deadline_ms = match self.kind {
            TimerKind::OneShot => None,
            TimerKind::Repeating => Some(deadline.saturating_add(self.period_ms)),
        };
        Some(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once() {
        let mut timer = CancellableTimer::one_shot(400);
        assert!(!timer.is_armed());
        assert_eq!(timer.poll(10_000), None);

        timer.start(100);
        assert_eq!(timer.deadline_ms(), Some(500));
        assert_eq!(timer.poll(499), None);
        assert_eq!(timer.poll(500), Some(500));
        assert_eq!(timer.poll(900), None);
        assert!(!timer.is_armed());
    }

    #[test]
    fn repeating_rearms_from_deadline() {
        let mut timer = CancellableTimer::repeating(150);
        timer.start(0);
        // Polled late: fires for 150 and keeps the 300 cadence.
        assert_eq!(timer.poll(320), Some(150));
        assert_eq!(timer.poll(320), Some(300));
        assert_eq!(timer.poll(320), None);
        assert_eq!(timer.deadline_ms(), Some(450));
    }

    #[test]
    fn cancel_disarms() {
        let mut timer = CancellableTimer::repeating(150);
        timer.start(0);
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.poll(1_000), None);
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut timer = CancellableTimer::repeating(0);
        timer.start(10);
        assert_eq!(timer.period_ms(), 1);
        assert_eq!(timer.poll(11), Some(11));
        assert_eq!(timer.poll(11), None);
    }

    #[test]
    fn restart_moves_deadline() {
        let mut timer = CancellableTimer::one_shot(400);
        timer.start(0);
        timer.start(300);
        assert!(!timer.is_due(400));
        assert!(timer.is_due(700));
    }
}
