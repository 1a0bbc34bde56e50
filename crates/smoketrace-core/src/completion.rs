//! What happens after a cigarette is finished.
//!
//! 1. The local count was already bumped by the controller. The global
//!    counter increment is fired off without waiting.
//! 2. Presence is set to not-burning, also without waiting.
//! 3. After the settle delay, a preloaded interstitial is shown if one is
//!    available, and the next one starts preloading once it resolves.
//! 4. The summary is shown. Always, and never before step 3 resolves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::burn::BurnMode;
use crate::events::Event;
use crate::interstitial::{Interstitial, InterstitialOutcome};
use crate::stats::DerivedStats;
use crate::storage::PricingConfig;
use crate::store::{
    spawn_best_effort, BestEffort, CounterStore, PresenceQueue, PresenceUpdate,
};

/// Receives the summary shown after each finished cigarette.
pub trait SummarySurface: Send + Sync + 'static {
    fn show_summary(&self, summary: &CompletionSummary);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub count: u64,
    pub mode: BurnMode,
    pub at: DateTime<Utc>,
}

impl CompletedSession {
    pub fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::SessionCompleted { count, mode, at } => Some(Self {
                count: *count,
                mode: *mode,
                at: *at,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub stats: DerivedStats,
    pub money_label: String,
    pub time_lost_label: String,
}

impl CompletionSummary {
    pub fn new(count: u64, pricing: &PricingConfig) -> Self {
        let stats = DerivedStats::for_count(count, pricing);
        Self {
            money_label: stats.money_label(&pricing.currency_symbol),
            time_lost_label: stats.time_lost_label(),
            stats,
        }
    }

    pub fn share_text(&self) -> String {
        let noun = if self.stats.count == 1 {
            "cigarette"
        } else {
            "cigarettes"
        };
        format!(
            "I burned {} {noun} on SmokeTrace: {} gone up in smoke and {} of life lost.",
            self.stats.count, self.money_label, self.time_lost_label
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterstitialStep {
    Shown(InterstitialOutcome),
    Skipped,
}

/// What each step of a completion did.
#[derive(Debug)]
pub struct CompletionReport {
    pub session: CompletedSession,
    pub summary: CompletionSummary,
    pub interstitial: InterstitialStep,
    /// Still running when the report is returned; await to observe the result.
    pub counter: JoinHandle<BestEffort>,
    pub presence: JoinHandle<BestEffort>,
}

/// Remote writes fired at the start of a completion.
#[derive(Debug)]
pub struct RemoteUpdates {
    pub counter: JoinHandle<BestEffort>,
    pub presence: JoinHandle<BestEffort>,
}

pub struct CompletionCoordinator<S, I, N> {
    store: Arc<S>,
    presence: PresenceQueue,
    interstitial: Arc<I>,
    summary: Arc<N>,
    pricing: PricingConfig,
    settle_delay: Duration,
}

impl<S, I, N> CompletionCoordinator<S, I, N>
where
    S: CounterStore,
    I: Interstitial,
    N: SummarySurface,
{
    pub fn new(
        store: Arc<S>,
        presence: PresenceQueue,
        interstitial: Arc<I>,
        summary: Arc<N>,
        pricing: PricingConfig,
        settle_delay: Duration,
    ) -> Self {
        Self {
            store,
            presence,
            interstitial,
            summary,
            pricing,
            settle_delay,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub async fn complete(&self, session: CompletedSession) -> CompletionReport {
        let remote = self.start_remote_updates();
        self.finish(session, remote).await
    }

    /// Fire the counter increment and queue presence as not burning.
    ///
    /// Synchronous, so a caller that runs the rest of the completion on
    /// another task still queues presence in event order.
    pub fn start_remote_updates(&self) -> RemoteUpdates {
        let store = Arc::clone(&self.store);
        let counter = spawn_best_effort("increment_global_counter", async move {
            store.increment_global_counter().await
        });
        let ack = self.presence.send(PresenceUpdate::Burning(false));
        let presence = tokio::spawn(ack.outcome());
        RemoteUpdates { counter, presence }
    }

    /// Settle delay, interstitial, then the summary.
    pub async fn finish(
        &self,
        session: CompletedSession,
        remote: RemoteUpdates,
    ) -> CompletionReport {
        tokio::time::sleep(self.settle_delay).await;
        let interstitial = self.run_interstitial().await;

        let summary = CompletionSummary::new(session.count, &self.pricing);
        self.summary.show_summary(&summary);
        info!(
            count = session.count,
            money = %summary.money_label,
            time_lost = %summary.time_lost_label,
            "completion summary shown"
        );

        CompletionReport {
            session,
            summary,
            interstitial,
            counter: remote.counter,
            presence: remote.presence,
        }
    }

    async fn run_interstitial(&self) -> InterstitialStep {
        if !self.interstitial.is_available() {
            debug!("no interstitial available, skipping");
            return InterstitialStep::Skipped;
        }

        // Shown on its own task so a panicking surface still counts as a
        // failure instead of taking the summary down with it.
        let surface = Arc::clone(&self.interstitial);
        let outcome = match tokio::spawn(async move { surface.show().await }).await {
            Ok(outcome) => outcome,
            Err(e) => InterstitialOutcome::Failed(format!("interstitial task failed: {e}")),
        };
        if let InterstitialOutcome::Failed(reason) = &outcome {
            warn!(%reason, "interstitial failed");
        }

        let next = Arc::clone(&self.interstitial);
        tokio::spawn(async move {
            if let Err(e) = next.preload().await {
                debug!(error = %e, "interstitial preload failed");
            }
        });

        InterstitialStep::Shown(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InterstitialError, StoreError};
    use crate::store::{ActiveUsers, AggregateStats, DailyStat, MemoryStore, PresenceWriter};
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct RecordingSummary {
        shown: Mutex<Vec<(CompletionSummary, Instant)>>,
    }

    impl SummarySurface for RecordingSummary {
        fn show_summary(&self, summary: &CompletionSummary) {
            self.shown
                .lock()
                .unwrap()
                .push((summary.clone(), Instant::now()));
        }
    }

    struct ScriptedInterstitial {
        loaded: AtomicBool,
        fail: bool,
        display: Duration,
        preloads: AtomicUsize,
    }

    impl ScriptedInterstitial {
        fn new(loaded: bool, fail: bool, display: Duration) -> Self {
            Self {
                loaded: AtomicBool::new(loaded),
                fail,
                display,
                preloads: AtomicUsize::new(0),
            }
        }
    }

    impl Interstitial for ScriptedInterstitial {
        fn is_available(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }

        fn preload(&self) -> impl Future<Output = Result<(), InterstitialError>> + Send {
            async move {
                self.preloads.fetch_add(1, Ordering::SeqCst);
                self.loaded.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        fn show(&self) -> impl Future<Output = InterstitialOutcome> + Send {
            async move {
                self.loaded.store(false, Ordering::SeqCst);
                tokio::time::sleep(self.display).await;
                if self.fail {
                    InterstitialOutcome::Failed("failedToShow".into())
                } else {
                    InterstitialOutcome::Dismissed
                }
            }
        }
    }

    struct FailingStore;

    impl CounterStore for FailingStore {
        fn increment_global_counter(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
        fn set_presence(&self, _: bool) -> impl Future<Output = Result<(), StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
        fn register_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
        fn heartbeat(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
        fn remove_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
        fn aggregate_stats(
            &self,
        ) -> impl Future<Output = Result<AggregateStats, StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
        fn active_users(&self) -> impl Future<Output = Result<ActiveUsers, StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
        fn daily_stats(
            &self,
            _: usize,
        ) -> impl Future<Output = Result<Vec<DailyStat>, StoreError>> + Send {
            std::future::ready(Err(StoreError::NotConfigured("offline".into())))
        }
    }

    fn session(count: u64) -> CompletedSession {
        CompletedSession {
            count,
            mode: BurnMode::Auto,
            at: Utc::now(),
        }
    }

    const SETTLE: Duration = Duration::from_millis(500);

    fn coordinator_with<S, I, N>(
        store: Arc<S>,
        interstitial: Arc<I>,
        summary: Arc<N>,
    ) -> (CompletionCoordinator<S, I, N>, PresenceWriter)
    where
        S: CounterStore,
        I: Interstitial,
        N: SummarySurface,
    {
        let writer = PresenceWriter::spawn(Arc::clone(&store));
        let coordinator = CompletionCoordinator::new(
            store,
            writer.queue(),
            interstitial,
            summary,
            PricingConfig::default(),
            SETTLE,
        );
        (coordinator, writer)
    }

    #[tokio::test(start_paused = true)]
    async fn skips_unavailable_interstitial_after_settle_delay() {
        let summary = Arc::new(RecordingSummary::default());
        let (coordinator, _writer) = coordinator_with(
            Arc::new(MemoryStore::new("user_c", Duration::from_secs(30))),
            Arc::new(crate::interstitial::Unsupported),
            Arc::clone(&summary),
        );

        let started = Instant::now();
        let report = coordinator.complete(session(3)).await;

        assert_eq!(report.interstitial, InterstitialStep::Skipped);
        let shown = summary.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].1 - started, SETTLE);
        assert_eq!(shown[0].0.stats.count, 3);
        assert_eq!(shown[0].0.stats.money_spent, 750);
        assert_eq!(shown[0].0.time_lost_label, "33 minutes");
    }

    #[tokio::test(start_paused = true)]
    async fn summary_waits_for_interstitial_dismissal_then_preloads() {
        let summary = Arc::new(RecordingSummary::default());
        let interstitial = Arc::new(ScriptedInterstitial::new(
            true,
            false,
            Duration::from_secs(5),
        ));
        let (coordinator, _writer) = coordinator_with(
            Arc::new(MemoryStore::new("user_c", Duration::from_secs(30))),
            Arc::clone(&interstitial),
            Arc::clone(&summary),
        );

        let started = Instant::now();
        let report = coordinator.complete(session(1)).await;

        assert_eq!(
            report.interstitial,
            InterstitialStep::Shown(InterstitialOutcome::Dismissed)
        );
        let shown_at = summary.shown.lock().unwrap()[0].1;
        assert_eq!(shown_at - started, SETTLE + Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(interstitial.preloads.load(Ordering::SeqCst), 1);
        assert!(interstitial.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_interstitial_still_shows_summary() {
        let summary = Arc::new(RecordingSummary::default());
        let (coordinator, _writer) = coordinator_with(
            Arc::new(MemoryStore::new("user_c", Duration::from_secs(30))),
            Arc::new(ScriptedInterstitial::new(true, true, Duration::ZERO)),
            Arc::clone(&summary),
        );

        let started = Instant::now();
        let report = coordinator.complete(session(2)).await;

        assert!(matches!(
            report.interstitial,
            InterstitialStep::Shown(InterstitialOutcome::Failed(_))
        ));
        let shown = summary.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].1 - started <= SETTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_failures_are_ignored() {
        let summary = Arc::new(RecordingSummary::default());
        let (coordinator, _writer) = coordinator_with(
            Arc::new(FailingStore),
            Arc::new(crate::interstitial::Unsupported),
            Arc::clone(&summary),
        );

        let report = coordinator.complete(session(1)).await;
        assert_eq!(summary.shown.lock().unwrap().len(), 1);
        assert!(matches!(report.counter.await.unwrap(), BestEffort::Ignored(_)));
        assert!(matches!(report.presence.await.unwrap(), BestEffort::Ignored(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn counter_and_presence_reach_the_store() {
        let store = Arc::new(MemoryStore::new("user_c", Duration::from_secs(30)));
        store.set_presence(true).await.unwrap();
        let (coordinator, _writer) = coordinator_with(
            Arc::clone(&store),
            Arc::new(crate::interstitial::Unsupported),
            Arc::new(RecordingSummary::default()),
        );

        let report = coordinator.complete(session(1)).await;
        assert!(report.counter.await.unwrap().is_ok());
        assert!(report.presence.await.unwrap().is_ok());
        assert_eq!(store.aggregate_stats().await.unwrap().total_count, 1);
        assert_eq!(store.presence().map(|p| p.is_smoking), Some(false));
    }

    #[test]
    fn share_text_mentions_totals() {
        let summary = CompletionSummary::new(4, &PricingConfig::default());
        let text = summary.share_text();
        assert!(text.contains("4 cigarettes"));
        assert!(text.contains("₩1,000"));
        assert!(text.contains("44 minutes"));
    }

    #[test]
    fn completed_session_from_event() {
        let event = Event::SessionCompleted {
            count: 2,
            mode: BurnMode::Manual,
            at: Utc::now(),
        };
        let session = CompletedSession::from_event(&event).unwrap();
        assert_eq!(session.count, 2);
        assert_eq!(session.mode, BurnMode::Manual);
        assert!(CompletedSession::from_event(&Event::BurnStopped {
            progress: 1,
            at: Utc::now()
        })
        .is_none());
    }
}
