//! Polling subscriptions.
//!
//! The REST API has no push channel we rely on, so a subscription is a task
//! that polls on a fixed interval and calls back when the value changes.
//! The first successful read is always delivered.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{ActiveUsers, AggregateStats, CounterStore};

const MIN_POLL: Duration = Duration::from_millis(100);

/// Handle to a polling task. Dropping it stops the polling.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {
        // Drop does the work.
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn subscribe_aggregate_stats<S, F>(
    store: Arc<S>,
    every: Duration,
    mut callback: F,
) -> Subscription
where
    S: CounterStore,
    F: FnMut(AggregateStats) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(MIN_POLL));
        let mut last = None;
        loop {
            interval.tick().await;
            match store.aggregate_stats().await {
                Ok(stats) if last != Some(stats) => {
                    last = Some(stats);
                    callback(stats);
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "aggregate stats poll failed"),
            }
        }
    });
    Subscription { handle }
}

pub fn subscribe_active_user_count<S, F>(
    store: Arc<S>,
    every: Duration,
    mut callback: F,
) -> Subscription
where
    S: CounterStore,
    F: FnMut(ActiveUsers) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(MIN_POLL));
        let mut last = None;
        loop {
            interval.tick().await;
            match store.active_users().await {
                Ok(users) if last != Some(users) => {
                    last = Some(users);
                    callback(users);
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "active users poll failed"),
            }
        }
    });
    Subscription { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn delivers_initial_value_and_changes_only() {
        let store = Arc::new(MemoryStore::new("user_sub", Duration::from_secs(30)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = subscribe_aggregate_stats(Arc::clone(&store), Duration::from_secs(5), move |s| {
            sink.lock().unwrap().push(s.total_count);
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0]);

        store.increment_global_counter().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);

        sub.cancel();
        store.increment_global_counter().await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn active_user_subscription_reports_presence() {
        let store = Arc::new(MemoryStore::new("user_sub", Duration::from_secs(30)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let every = Duration::from_secs(5);
        let _sub = subscribe_active_user_count(Arc::clone(&store), every, move |u| {
            sink.lock().unwrap().push(u.total);
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        store.register_presence().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }
}
