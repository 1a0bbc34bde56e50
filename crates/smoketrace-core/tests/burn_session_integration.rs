//! Burn sessions end to end: controller timelines, then a full app run
//! against the in-memory store.
//!
//! | Scenario                         | Mode   | Completes | Count |
//! |----------------------------------|--------|-----------|-------|
//! | hold past arm delay, keep held   | Manual | yes       | +1    |
//! | hold, release early              | Manual | no        | 0     |
//! | double-tap, wait                 | Auto   | yes       | +1    |
//! | double-tap, press to cancel      | Auto   | no        | 0     |
//! | touch + emulated mouse press     | -      | -         | -     |

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use smoketrace_core::burn::{BurnController, BurnMode, PointerEvent, PointerKind};
use smoketrace_core::completion::{CompletionSummary, InterstitialStep, SummarySurface};
use smoketrace_core::interstitial::{Interstitial, InterstitialOutcome};
use smoketrace_core::storage::{BurnConfig, Config};
use smoketrace_core::store::{CounterStore, MemoryStore};
use smoketrace_core::{AppUpdate, Event, InterstitialError, SessionApp};

// ============================================================================
// Controller timelines
// ============================================================================

const TICK: u64 = 150;

fn run_until(controller: &mut BurnController, end: u64) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(deadline) = controller.next_deadline().filter(|d| *d <= end) {
        events.extend(controller.advance(deadline));
    }
    events
}

fn count_completed(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| e.completed_count().is_some())
        .count()
}

#[test]
fn held_cigarette_burns_to_the_end() {
    let mut c = BurnController::new(&BurnConfig::default());
    c.pointer(PointerEvent::mouse(PointerKind::Down), 0);

    // Armed at 400, then 100 ticks of 1%.
    let events = run_until(&mut c, 400 + 100 * TICK);
    assert_eq!(count_completed(&events), 1);
    assert_eq!(c.count(), 1);
    assert_eq!(c.progress(), 0);
    assert_eq!(c.mode(), BurnMode::Idle);
    assert!(!c.is_ticking());
}

#[test]
fn early_release_keeps_partial_progress() {
    let mut c = BurnController::new(&BurnConfig::default());
    c.pointer(PointerEvent::mouse(PointerKind::Down), 0);
    run_until(&mut c, 400 + 10 * TICK);
    let events = c.pointer(PointerEvent::mouse(PointerKind::Up), 400 + 10 * TICK + 1);

    assert!(events.iter().any(|e| matches!(e, Event::BurnStopped { .. })));
    assert_eq!(c.progress(), 10);
    assert_eq!(c.count(), 0);
    assert_eq!(c.next_deadline(), None);
}

#[test]
fn double_tap_auto_burn_and_cancel() {
    let mut c = BurnController::new(&BurnConfig::default());
    c.pointer(PointerEvent::mouse(PointerKind::Down), 0);
    c.pointer(PointerEvent::mouse(PointerKind::Up), 20);
    c.pointer(PointerEvent::mouse(PointerKind::Down), 200);
    c.pointer(PointerEvent::mouse(PointerKind::Up), 220);
    assert_eq!(c.mode(), BurnMode::Auto);

    run_until(&mut c, 200 + 30 * TICK);
    assert_eq!(c.progress(), 30);

    let events = c.pointer(PointerEvent::mouse(PointerKind::Down), 200 + 30 * TICK + 10);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::AutoCancelled { progress: 30, .. })));
    assert_eq!(c.mode(), BurnMode::Idle);
    assert_eq!(c.count(), 0);

    // The cancelling press does not arm a hold.
    assert_eq!(c.next_deadline(), None);
}

#[test]
fn emulated_mouse_after_touch_is_ignored() {
    let mut c = BurnController::new(&BurnConfig::default());
    c.pointer(PointerEvent::touch(PointerKind::Down), 0);
    c.pointer(PointerEvent::touch(PointerKind::Up), 10);
    // Browsers replay the touch as mouse events; that must not read as a second tap.
    c.pointer(PointerEvent::mouse(PointerKind::Down), 120);
    assert_eq!(c.mode(), BurnMode::Idle);

    c.pointer(PointerEvent::touch(PointerKind::Down), 200);
    assert_eq!(c.mode(), BurnMode::Auto);
}

#[test]
fn completions_accumulate_across_sessions() {
    let mut c = BurnController::new(&BurnConfig {
        burn_step: 25,
        ..BurnConfig::default()
    });
    let mut now = 0;
    for expected in 1..=3 {
        c.pointer(PointerEvent::mouse(PointerKind::Down), now);
        now += 400 + 4 * TICK;
        run_until(&mut c, now);
        c.pointer(PointerEvent::mouse(PointerKind::Up), now + 1);
        assert_eq!(c.count(), expected);
        now += 1_000;
    }
    assert_eq!(c.teardown().count(), 3);
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Pointer(PointerEvent),
    Wait,
}

fn any_step() -> impl Strategy<Value = (Step, u64)> {
    let step = prop_oneof![
        Just(Step::Pointer(PointerEvent::mouse(PointerKind::Down))),
        Just(Step::Pointer(PointerEvent::mouse(PointerKind::Up))),
        Just(Step::Pointer(PointerEvent::mouse(PointerKind::Leave))),
        Just(Step::Wait),
    ];
    (step, 0u64..3_000)
}

proptest! {
    #[test]
    fn any_script_keeps_progress_in_bounds(
        burn_step in 1u8..=40,
        script in prop::collection::vec(any_step(), 0..40),
    ) {
        let mut c = BurnController::new(&BurnConfig {
            burn_step,
            ..BurnConfig::default()
        });
        let mut now = 0;
        let mut events = Vec::new();
        for (step, dt) in script {
            now += dt;
            match step {
                Step::Pointer(event) => events.extend(c.pointer(event, now)),
                Step::Wait => events.extend(c.advance(now)),
            }
            prop_assert!(c.progress() < 100);
        }
        // Let a burn still in progress run out.
        events.extend(c.advance(now + 200 * TICK));

        let mut last = 0u8;
        let mut completed = 0u64;
        for event in &events {
            match event {
                Event::Ticked { progress, .. } => {
                    prop_assert_eq!(*progress, last + burn_step);
                    prop_assert!(*progress < 100);
                    last = *progress;
                }
                Event::SessionCompleted { count, .. } => {
                    prop_assert!(u16::from(last) + u16::from(burn_step) >= 100);
                    completed += 1;
                    prop_assert_eq!(*count, completed);
                    last = 0;
                }
                Event::BurnStarted { progress, .. }
                | Event::BurnStopped { progress, .. }
                | Event::AutoCancelled { progress, .. } => {
                    prop_assert_eq!(*progress, last);
                }
                _ => {}
            }
        }
        prop_assert_eq!(c.count(), completed);
        prop_assert_eq!(c.progress(), last);
    }
}

// ============================================================================
// Full app
// ============================================================================

#[derive(Default)]
struct Summaries(Mutex<Vec<CompletionSummary>>);

impl SummarySurface for Summaries {
    fn show_summary(&self, summary: &CompletionSummary) {
        self.0.lock().unwrap().push(summary.clone());
    }
}

struct FlakyInterstitial {
    loaded: AtomicBool,
}

impl Interstitial for FlakyInterstitial {
    fn is_available(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn preload(&self) -> impl Future<Output = Result<(), InterstitialError>> + Send {
        self.loaded.store(true, Ordering::SeqCst);
        std::future::ready(Ok(()))
    }

    fn show(&self) -> impl Future<Output = InterstitialOutcome> + Send {
        self.loaded.store(false, Ordering::SeqCst);
        std::future::ready(InterstitialOutcome::Failed("no fill".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn app_runs_two_cigarettes_through_completion() {
    let mut config = Config::default();
    config.burn.tick_interval_ms = 10;
    config.burn.burn_step = 20;

    let store = Arc::new(MemoryStore::new("user_e2e", Duration::from_secs(30)));
    let summaries = Arc::new(Summaries::default());
    let (app, mut updates) = SessionApp::start(
        &config,
        Arc::clone(&store),
        Arc::new(FlakyInterstitial {
            loaded: AtomicBool::new(false),
        }),
        Arc::clone(&summaries),
        |_: u8, _: bool| {},
    );

    for _ in 0..2 {
        app.pointer(PointerEvent::mouse(PointerKind::Down));
        tokio::time::sleep(Duration::from_millis(500)).await;
        app.pointer(PointerEvent::mouse(PointerKind::Up));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let count = app.shutdown().await;
    assert_eq!(count, 2);

    let shown = summaries.0.lock().unwrap();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1].stats.count, 2);
    assert_eq!(shown[1].money_label, "₩500");

    let mut steps = Vec::new();
    while let Ok(update) = updates.try_recv() {
        if let AppUpdate::Completed(report) = update {
            steps.push(report.interstitial);
        }
    }
    assert_eq!(steps.len(), 2);
    assert!(steps.iter().all(|step| matches!(
        step,
        InterstitialStep::Shown(InterstitialOutcome::Failed(_))
    )));

    assert_eq!(store.aggregate_stats().await.unwrap().total_count, 2);
    assert!(store.presence().is_none());
}
