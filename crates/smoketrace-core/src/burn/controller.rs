//! Burn controller.
//!
//! Owns the session, the input classifier, the tick timer and the local
//! cumulative counter. Like the timers it holds, the controller has no
//! threads of its own: the caller feeds it pointer events and calls
//! `advance()` when `next_deadline()` comes due.
//!
//! ## State Transitions
//!
//! ```text
//!            hold fires (pointer down)          release / leave
//!   Idle ------------------------------> Manual ---------------> Idle
//!    |  \                                  |
//!    |   \ double-tap                      | progress hits 100
//!    |    v                                v
//!    |   Auto ---- press -----> Idle      Idle (+1 count, progress 0)
//!    |    |
//!    |    +------- progress hits 100 ----> Idle (+1 count, progress 0)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut controller = BurnController::new(&BurnConfig::default());
//! controller.pointer(PointerEvent::mouse(PointerKind::Down), 0);
//! // Later, once now >= controller.next_deadline():
//! let events = controller.advance(now);
//! ```

use chrono::Utc;
use tracing::{debug, info};

use super::input::{InputClassifier, Intent, PointerEvent, PointerFilter, TapWindow, Transition};
use super::session::{BurnMode, BurnSession, CumulativeCounter, TickOutcome};
use crate::events::Event;
use crate::storage::BurnConfig;
use crate::timer::CancellableTimer;

#[derive(Debug, Clone)]
pub struct BurnController {
    session: BurnSession,
    input: InputClassifier,
    filter: PointerFilter,
    ticker: CancellableTimer,
    counter: CumulativeCounter,
    burn_step: u8,
}

impl BurnController {
    /// Create a controller in `Idle` with progress 0 and no timers armed.
    pub fn new(config: &BurnConfig) -> Self {
        Self {
            session: BurnSession::new(config.tick_interval_ms),
            input: InputClassifier::new(TapWindow::from(config)),
            filter: PointerFilter::default(),
            ticker: CancellableTimer::repeating(config.tick_interval_ms),
            counter: CumulativeCounter::default(),
            burn_step: config.burn_step.max(1),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn progress(&self) -> u8 {
        self.session.progress()
    }

    pub fn mode(&self) -> BurnMode {
        self.session.mode()
    }

    pub fn is_burning(&self) -> bool {
        self.session.is_burning()
    }

    pub fn count(&self) -> u64 {
        self.counter.count()
    }

    pub fn session(&self) -> &BurnSession {
        &self.session
    }

    pub fn input(&self) -> &InputClassifier {
        &self.input
    }

    /// Whether the tick timer is armed.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_armed()
    }

    /// Earliest pending timer deadline on the caller's millisecond timeline.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.input.hold_deadline_ms(), self.ticker.deadline_ms()) {
            (Some(hold), Some(tick)) => Some(hold.min(tick)),
            (hold, tick) => hold.or(tick),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode(),
            progress: self.progress(),
            burning: self.is_burning(),
            count: self.count(),
            tick_interval_ms: self.session.tick_interval_ms(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Feed a raw pointer event observed at `now_ms`.
    ///
    /// Timers due at or before `now_ms` fire first, so the event sees the
    /// state the timeline has actually reached.
    pub fn pointer(&mut self, event: PointerEvent, now_ms: u64) -> Vec<Event> {
        let mut events = self.advance(now_ms);
        if let Some(intent) = self.filter.translate(event) {
            events.extend(self.apply_intent(intent, now_ms));
        }
        events
    }

    /// Feed an already-classified intent observed at `now_ms`.
    pub fn intent(&mut self, intent: Intent, now_ms: u64) -> Vec<Event> {
        let mut events = self.advance(now_ms);
        events.extend(self.apply_intent(intent, now_ms));
        events
    }

    /// Fire every timer due at or before `now_ms`, in deadline order.
    ///
    /// Each fire observes its own deadline as the current time. When the hold
    /// check and a tick share a deadline the hold check goes first.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            let hold = self.input.hold_deadline_ms().filter(|d| *d <= now_ms);
            let tick = self.ticker.deadline_ms().filter(|d| *d <= now_ms);
            match (hold, tick) {
                (Some(h), None) => events.extend(self.fire_hold(h)),
                (Some(h), Some(t)) if h <= t => events.extend(self.fire_hold(h)),
                (_, Some(t)) => {
                    self.ticker.poll(t);
                    events.extend(self.tick());
                }
                (None, None) => break,
            }
        }
        events
    }

    /// Release the controller, returning the final count.
    ///
    /// Consuming `self` drops both timers with the session, so nothing can
    /// tick against a torn-down controller.
    pub fn teardown(self) -> CumulativeCounter {
        debug!(
            count = self.counter.count(),
            progress = self.session.progress(),
            "burn controller torn down"
        );
        self.counter
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn fire_hold(&mut self, deadline_ms: u64) -> Option<Event> {
        let transition = self.input.poll_hold(deadline_ms, self.mode());
        self.apply_transition(transition, deadline_ms)
    }

    fn apply_intent(&mut self, intent: Intent, now_ms: u64) -> Option<Event> {
        let transition = self.input.intent(intent, now_ms, self.mode());
        self.apply_transition(transition, now_ms)
    }

    fn apply_transition(&mut self, transition: Transition, now_ms: u64) -> Option<Event> {
        match transition {
            Transition::None => None,
            Transition::StartManual => self.start_burning(BurnMode::Manual, now_ms),
            Transition::StartAuto => self.start_burning(BurnMode::Auto, now_ms),
            Transition::CancelAuto => {
                self.stop_burning();
                debug!(progress = self.progress(), "auto burn cancelled");
                Some(Event::AutoCancelled {
                    progress: self.progress(),
                    at: Utc::now(),
                })
            }
            Transition::StopManual => {
                self.stop_burning();
                debug!(progress = self.progress(), "manual burn stopped");
                Some(Event::BurnStopped {
                    progress: self.progress(),
                    at: Utc::now(),
                })
            }
        }
    }

    fn start_burning(&mut self, mode: BurnMode, now_ms: u64) -> Option<Event> {
        if self.mode() == mode {
            return None;
        }
        // Switching Manual -> Auto keeps the running tick cadence.
        if !self.ticker.is_armed() {
            self.ticker.start(now_ms);
        }
        self.session.set_mode(mode);
        debug!(?mode, progress = self.progress(), "burn started");
        Some(Event::BurnStarted {
            mode,
            progress: self.progress(),
            at: Utc::now(),
        })
    }

    fn stop_burning(&mut self) {
        self.ticker.cancel();
        self.session.set_mode(BurnMode::Idle);
    }

    fn tick(&mut self) -> Option<Event> {
        match self.session.advance(self.burn_step) {
            TickOutcome::Idle => {
                self.ticker.cancel();
                None
            }
            TickOutcome::Progressed(progress) => Some(Event::Ticked {
                progress,
                at: Utc::now(),
            }),
            TickOutcome::Completed { mode } => {
                self.ticker.cancel();
                let count = self.counter.increment();
                info!(count, ?mode, "cigarette finished");
                Some(Event::SessionCompleted {
                    count,
                    mode,
                    at: Utc::now(),
                })
            }
        }
    }
}
