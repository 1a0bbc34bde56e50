//! Press/release classification.
//!
//! Raw pointer events are reduced to [`Intent`]s by [`PointerFilter`], then
//! [`InputClassifier`] decides what each intent means for the session:
//!
//! - press while Auto: cancel Auto
//! - press within the double-tap window of the previous tap: start Auto
//! - any other press: remember it and arm the hold timer; if the pointer is
//!   still down when it fires, start Manual
//! - release or leave while Manual: stop

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::session::BurnMode;
use crate::storage::BurnConfig;
use crate::timer::CancellableTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Up,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub source: PointerSource,
}

impl PointerEvent {
    pub fn mouse(kind: PointerKind) -> Self {
        Self {
            kind,
            source: PointerSource::Mouse,
        }
    }

    pub fn touch(kind: PointerKind) -> Self {
        Self {
            kind,
            source: PointerSource::Touch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Press,
    Release,
    /// Pointer left the surface while down.
    Cancel,
}

/// Keeps mouse and touch from both firing on devices that synthesize mouse
/// events after touches.
#[derive(Debug, Clone, Default)]
pub struct PointerFilter {
    touch_seen: bool,
}

impl PointerFilter {
    pub fn touch_seen(&self) -> bool {
        self.touch_seen
    }

    pub fn translate(&mut self, event: PointerEvent) -> Option<Intent> {
        match event.source {
            PointerSource::Touch => self.touch_seen = true,
            PointerSource::Mouse if self.touch_seen && event.kind == PointerKind::Down => {
                trace!("ignoring mouse-down after touch input");
                return None;
            }
            PointerSource::Mouse => {}
        }
        Some(match event.kind {
            PointerKind::Down => Intent::Press,
            PointerKind::Up => Intent::Release,
            PointerKind::Leave => Intent::Cancel,
        })
    }
}

/// Timing bounds for tap classification, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapWindow {
    /// Exclusive lower bound for a double-tap.
    pub double_tap_min_ms: u64,
    /// Exclusive upper bound for a double-tap.
    pub double_tap_max_ms: u64,
    pub hold_arm_ms: u64,
}

impl TapWindow {
    pub fn is_double_tap(&self, elapsed_ms: u64) -> bool {
        elapsed_ms > self.double_tap_min_ms && elapsed_ms < self.double_tap_max_ms
    }
}

impl From<&BurnConfig> for TapWindow {
    fn from(config: &BurnConfig) -> Self {
        Self {
            double_tap_min_ms: config.double_tap_min_ms,
            double_tap_max_ms: config.double_tap_max_ms,
            hold_arm_ms: config.hold_arm_ms,
        }
    }
}

impl Default for TapWindow {
    fn default() -> Self {
        Self::from(&BurnConfig::default())
    }
}

/// What the session should do in response to an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    StartManual,
    StartAuto,
    CancelAuto,
    StopManual,
}

#[derive(Debug, Clone)]
pub struct InputClassifier {
    window: TapWindow,
    last_tap_ms: Option<u64>,
    pending_single_tap: CancellableTimer,
    pointer_down: bool,
}

impl InputClassifier {
    pub fn new(window: TapWindow) -> Self {
        Self {
            window,
            last_tap_ms: None,
            pending_single_tap: CancellableTimer::one_shot(window.hold_arm_ms),
            pointer_down: false,
        }
    }

    pub fn window(&self) -> TapWindow {
        self.window
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn last_tap_ms(&self) -> Option<u64> {
        self.last_tap_ms
    }

    /// Deadline of the pending hold check, if one is armed.
    pub fn hold_deadline_ms(&self) -> Option<u64> {
        self.pending_single_tap.deadline_ms()
    }

    pub fn intent(&mut self, intent: Intent, now_ms: u64, mode: BurnMode) -> Transition {
        match intent {
            Intent::Press => self.press(now_ms, mode),
            Intent::Release | Intent::Cancel => self.lift(mode),
        }
    }

    pub fn press(&mut self, now_ms: u64, mode: BurnMode) -> Transition {
        self.pointer_down = true;

        if mode == BurnMode::Auto {
            self.pending_single_tap.cancel();
            return Transition::CancelAuto;
        }

        let double_tap = self
            .last_tap_ms
            .map(|last| now_ms.saturating_sub(last))
            .is_some_and(|elapsed| self.window.is_double_tap(elapsed));

        if double_tap {
            self.pending_single_tap.cancel();
            self.last_tap_ms = None;
            return Transition::StartAuto;
        }

        self.last_tap_ms = Some(now_ms);
        self.pending_single_tap.start(now_ms);
        Transition::None
    }

    /// Release and leave are the same to the session.
    ///
    /// The hold timer is left armed: when it fires it sees the pointer is up
    /// and does nothing, which is what keeps a quick tap from burning.
    pub fn lift(&mut self, mode: BurnMode) -> Transition {
        self.pointer_down = false;
        match mode {
            BurnMode::Manual => Transition::StopManual,
            BurnMode::Auto | BurnMode::Idle => Transition::None,
        }
    }

    /// Fire the hold timer if it is due at `now_ms`.
    pub fn poll_hold(&mut self, now_ms: u64, mode: BurnMode) -> Transition {
        if self.pending_single_tap.poll(now_ms).is_none() {
            return Transition::None;
        }
        if self.pointer_down && mode != BurnMode::Auto {
            Transition::StartManual
        } else {
            Transition::None
        }
    }
}
