//! One running burn screen.
//!
//! Wires the driver, presence updates, the completion coordinator and the
//! heartbeat together. Remote calls made here are all best-effort: an
//! offline store changes what the totals show, never what the user sees
//! locally. Presence writes all go through one [`PresenceWriter`], so they
//! reach the store in the order the session produced them.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::burn::{BurnController, Intent, PointerEvent};
use crate::completion::{
    CompletedSession, CompletionCoordinator, CompletionReport, SummarySurface,
};
use crate::driver::{BurnDriver, RenderSurface};
use crate::events::Event;
use crate::interstitial::Interstitial;
use crate::storage::Config;
use crate::store::{CounterStore, PresenceQueue, PresenceUpdate, PresenceWriter};

#[derive(Debug)]
pub enum AppUpdate {
    Event(Event),
    /// A completion ran to the end: the summary has been shown.
    Completed(CompletionReport),
}

pub struct SessionApp {
    driver: Option<BurnDriver>,
    presence: PresenceWriter,
    pump: Option<JoinHandle<()>>,
    heartbeat: JoinHandle<()>,
}

impl SessionApp {
    pub fn start<S, I, N, R>(
        config: &Config,
        store: Arc<S>,
        interstitial: Arc<I>,
        summary: Arc<N>,
        render: R,
    ) -> (Self, mpsc::UnboundedReceiver<AppUpdate>)
    where
        S: CounterStore,
        I: Interstitial,
        N: SummarySurface,
        R: RenderSurface,
    {
        let presence = PresenceWriter::spawn(Arc::clone(&store));
        presence.send(PresenceUpdate::Register);

        let preload = Arc::clone(&interstitial);
        tokio::spawn(async move {
            if let Err(e) = preload.preload().await {
                debug!(error = %e, "initial interstitial preload failed");
            }
        });

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let driver = BurnDriver::spawn(BurnController::new(&config.burn), render, events_tx);

        let coordinator = Arc::new(CompletionCoordinator::new(
            store,
            presence.queue(),
            interstitial,
            summary,
            config.pricing.clone(),
            config.completion.settle_delay(),
        ));
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump_events(
            events_rx,
            updates_tx,
            presence.queue(),
            coordinator,
        ));

        let heartbeat = tokio::spawn(keep_alive(presence.queue(), config.store.heartbeat()));

        info!("burn session started");
        let app = Self {
            driver: Some(driver),
            presence,
            pump: Some(pump),
            heartbeat,
        };
        (app, updates_rx)
    }

    pub fn pointer(&self, event: PointerEvent) {
        if let Some(driver) = &self.driver {
            driver.pointer(event);
        }
    }

    pub fn intent(&self, intent: Intent) {
        if let Some(driver) = &self.driver {
            driver.intent(intent);
        }
    }

    pub async fn snapshot(&self) -> Option<Event> {
        match &self.driver {
            Some(driver) => driver.snapshot().await,
            None => None,
        }
    }

    /// Tear the session down and return the final local count.
    ///
    /// Completions already in flight run to the end first, so their
    /// summaries are still delivered. Presence is removed last, after every
    /// other presence write has landed.
    pub async fn shutdown(mut self) -> u64 {
        let count = match self.driver.take() {
            Some(driver) => driver.shutdown().await,
            None => 0,
        };
        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                warn!(error = %e, "event pump ended abnormally");
            }
        }
        // A heartbeat queued after the removal would recreate the node.
        self.heartbeat.abort();
        let _ = (&mut self.heartbeat).await;
        self.presence.send(PresenceUpdate::Remove).outcome().await;
        info!(count, "burn session ended");
        count
    }
}

impl Drop for SessionApp {
    fn drop(&mut self) {
        self.heartbeat.abort();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

async fn pump_events<S, I, N>(
    mut events: mpsc::UnboundedReceiver<Event>,
    updates: mpsc::UnboundedSender<AppUpdate>,
    presence: PresenceQueue,
    coordinator: Arc<CompletionCoordinator<S, I, N>>,
) where
    S: CounterStore,
    I: Interstitial,
    N: SummarySurface,
{
    let mut completions = JoinSet::new();
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match &event {
                    Event::BurnStarted { .. } => {
                        presence.send(PresenceUpdate::Burning(true));
                    }
                    e if e.is_stop() => {
                        presence.send(PresenceUpdate::Burning(false));
                    }
                    _ => {}
                }
                if let Some(session) = CompletedSession::from_event(&event) {
                    // Queued here, in event order, before the settle delay.
                    let remote = coordinator.start_remote_updates();
                    let coordinator = Arc::clone(&coordinator);
                    completions.spawn(async move { coordinator.finish(session, remote).await });
                }
                let _ = updates.send(AppUpdate::Event(event));
            }
            Some(done) = completions.join_next(), if !completions.is_empty() => {
                forward_completion(done, &updates);
            }
        }
    }
    while let Some(done) = completions.join_next().await {
        forward_completion(done, &updates);
    }
}

fn forward_completion(
    done: Result<CompletionReport, tokio::task::JoinError>,
    updates: &mpsc::UnboundedSender<AppUpdate>,
) {
    match done {
        Ok(report) => {
            let _ = updates.send(AppUpdate::Completed(report));
        }
        Err(e) => warn!(error = %e, "completion task failed"),
    }
}

async fn keep_alive(presence: PresenceQueue, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick is immediate and presence was just registered.
    interval.tick().await;
    loop {
        interval.tick().await;
        presence.send(PresenceUpdate::Heartbeat).outcome().await;
    }
}
