//! Runs a [`BurnController`] against the tokio clock.
//!
//! The controller itself never sleeps. The driver task sleeps until the
//! controller's next deadline, or until a command arrives, and redraws the
//! render surface whenever something changed. Dropping the driver aborts
//! the task, which drops both timers with it: nothing draws after teardown.

use std::future::pending;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::burn::{BurnController, CumulativeCounter, Intent, PointerEvent};
use crate::events::Event;

/// Where the burning cigarette is drawn.
pub trait RenderSurface: Send + 'static {
    fn draw(&mut self, progress: u8, burning: bool);
}

impl<F> RenderSurface for F
where
    F: FnMut(u8, bool) + Send + 'static,
{
    fn draw(&mut self, progress: u8, burning: bool) {
        self(progress, burning)
    }
}

enum Command {
    Pointer(PointerEvent),
    Intent(Intent),
    Snapshot(oneshot::Sender<Event>),
    Shutdown,
}

pub struct BurnDriver {
    commands: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<CumulativeCounter>>,
}

impl BurnDriver {
    /// Spawn the driver task. Every controller event is forwarded to `events`.
    pub fn spawn<R>(
        controller: BurnController,
        render: R,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self
    where
        R: RenderSurface,
    {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(controller, render, events, rx));
        Self {
            commands,
            task: Some(task),
        }
    }

    pub fn pointer(&self, event: PointerEvent) {
        self.send(Command::Pointer(event));
    }

    pub fn intent(&self, intent: Intent) {
        self.send(Command::Intent(intent));
    }

    /// Current state, or `None` once the driver has stopped.
    pub async fn snapshot(&self) -> Option<Event> {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Snapshot(tx)).is_err() {
            return None;
        }
        rx.await.ok()
    }

    /// Stop the driver and return the final cumulative count.
    pub async fn shutdown(mut self) -> u64 {
        self.send(Command::Shutdown);
        let Some(task) = self.task.take() else {
            return 0;
        };
        match task.await {
            Ok(counter) => counter.count(),
            Err(e) => {
                warn!(error = %e, "burn driver task ended abnormally");
                0
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("burn driver already stopped, command dropped");
        }
    }
}

impl Drop for BurnDriver {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<R>(
    mut controller: BurnController,
    mut render: R,
    events: mpsc::UnboundedSender<Event>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> CumulativeCounter
where
    R: RenderSurface,
{
    let origin = Instant::now();
    let now_ms = || u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX);

    render.draw(controller.progress(), controller.is_burning());

    loop {
        let deadline = controller
            .next_deadline()
            .map(|ms| origin + Duration::from_millis(ms));
        let wake = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => pending::<()>().await,
            }
        };

        let emitted = tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Pointer(event)) => controller.pointer(event, now_ms()),
                Some(Command::Intent(intent)) => controller.intent(intent, now_ms()),
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(controller.snapshot());
                    continue;
                }
                Some(Command::Shutdown) | None => break,
            },
            _ = wake => controller.advance(now_ms()),
        };

        if emitted.is_empty() {
            continue;
        }
        render.draw(controller.progress(), controller.is_burning());
        for event in emitted {
            if events.send(event).is_err() {
                debug!("event receiver gone");
            }
        }
    }

    controller.teardown()
}
