use serde::{Deserialize, Serialize};

/// Progress at which a cigarette is finished.
pub const MAX_PROGRESS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnMode {
    Idle,
    /// Burning while the pointer is held.
    Manual,
    /// Burning on its own after a double-tap, until the next press.
    Auto,
}

impl BurnMode {
    pub fn is_burning(self) -> bool {
        !matches!(self, BurnMode::Idle)
    }
}

/// Result of advancing a session by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is idle; nothing changed.
    Idle,
    Progressed(u8),
    /// Progress reached [`MAX_PROGRESS`]; it is already reset and the mode is Idle.
    Completed { mode: BurnMode },
}

/// Progress of the cigarette currently held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnSession {
    progress: u8,
    mode: BurnMode,
    tick_interval_ms: u64,
}

impl BurnSession {
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            progress: 0,
            mode: BurnMode::Idle,
            tick_interval_ms,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn mode(&self) -> BurnMode {
        self.mode
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    pub fn is_burning(&self) -> bool {
        self.mode.is_burning()
    }

    pub(crate) fn set_mode(&mut self, mode: BurnMode) {
        self.mode = mode;
    }

    /// Add `step` to progress, clamped at [`MAX_PROGRESS`].
    ///
    /// Reaching the end resets progress to 0 and forces Idle in the same call,
    /// so no later tick can observe a finished cigarette.
    pub(crate) fn advance(&mut self, step: u8) -> TickOutcome {
        if !self.is_burning() {
            return TickOutcome::Idle;
        }
        let next = self.progress.saturating_add(step).min(MAX_PROGRESS);
        if next >= MAX_PROGRESS {
            let mode = self.mode;
            self.progress = 0;
            self.mode = BurnMode::Idle;
            return TickOutcome::Completed { mode };
        }
        self.progress = next;
        TickOutcome::Progressed(next)
    }
}

/// Cigarettes finished since the controller was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeCounter {
    count: u64,
}

impl CumulativeCounter {
    pub fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn increment(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_session_does_not_progress() {
        let mut session = BurnSession::new(150);
        assert_eq!(session.advance(1), TickOutcome::Idle);
        assert_eq!(session.progress(), 0);
    }

    #[test]
    fn completes_exactly_at_max() {
        let mut session = BurnSession::new(150);
        session.set_mode(BurnMode::Auto);
        for expected in 1..MAX_PROGRESS {
            assert_eq!(session.advance(1), TickOutcome::Progressed(expected));
        }
        assert_eq!(
            session.advance(1),
            TickOutcome::Completed {
                mode: BurnMode::Auto
            }
        );
        assert_eq!(session.progress(), 0);
        assert_eq!(session.mode(), BurnMode::Idle);
        assert_eq!(session.advance(1), TickOutcome::Idle);
    }

    #[test]
    fn oversized_step_is_clamped_into_completion() {
        let mut session = BurnSession::new(150);
        session.set_mode(BurnMode::Manual);
        assert_eq!(session.advance(60), TickOutcome::Progressed(60));
        assert_eq!(
            session.advance(60),
            TickOutcome::Completed {
                mode: BurnMode::Manual
            }
        );
    }

    #[test]
    fn counter_increments() {
        let mut counter = CumulativeCounter::default();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.count(), 2);
    }
}
