//! In-process store for offline sessions and tests.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{
    now_epoch_ms, today_utc, ActiveUsers, AggregateStats, CounterStore, DailyStat,
    PresenceRecord, StatsNode,
};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct State {
    stats: Option<StatsNode>,
    presence: HashMap<String, PresenceRecord>,
    daily: BTreeMap<NaiveDate, u64>,
}

#[derive(Debug)]
pub struct MemoryStore {
    user_id: String,
    active_window: Duration,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(user_id: impl Into<String>, active_window: Duration) -> Self {
        Self {
            user_id: user_id.into(),
            active_window,
            state: Mutex::new(State::default()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// This user's presence node, if registered.
    pub fn presence(&self) -> Option<PresenceRecord> {
        self.lock().presence.get(&self.user_id).cloned()
    }

    /// Insert another client's presence, for exercising active-user counts.
    pub fn insert_presence(&self, user_id: &str, record: PresenceRecord) {
        self.lock().presence.insert(user_id.to_string(), record);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_presence(&self, is_burning: Option<bool>) {
        let mut state = self.lock();
        let record = state.presence.entry(self.user_id.clone()).or_default();
        record.timestamp = Some(now_epoch_ms());
        if let Some(is_burning) = is_burning {
            record.is_smoking = is_burning;
        }
    }
}

impl CounterStore for MemoryStore {
    fn increment_global_counter(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        let today = today_utc();
        let mut state = self.lock();
        let next = StatsNode::incremented(state.stats.take(), today);
        state.stats = Some(next);
        *state.daily.entry(today).or_insert(0) += 1;
        drop(state);
        std::future::ready(Ok(()))
    }

    fn set_presence(
        &self,
        is_burning: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.write_presence(Some(is_burning));
        std::future::ready(Ok(()))
    }

    fn register_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.write_presence(Some(false));
        std::future::ready(Ok(()))
    }

    fn heartbeat(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.write_presence(None);
        std::future::ready(Ok(()))
    }

    fn remove_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.lock().presence.remove(&self.user_id);
        std::future::ready(Ok(()))
    }

    fn aggregate_stats(&self) -> impl Future<Output = Result<AggregateStats, StoreError>> + Send {
        let stats = self
            .lock()
            .stats
            .as_ref()
            .map(|node| node.as_seen_on(today_utc()))
            .unwrap_or_default();
        std::future::ready(Ok(stats))
    }

    fn active_users(&self) -> impl Future<Output = Result<ActiveUsers, StoreError>> + Send {
        let users = ActiveUsers::count(
            self.lock().presence.values(),
            now_epoch_ms(),
            self.active_window,
        );
        std::future::ready(Ok(users))
    }

    fn daily_stats(
        &self,
        days: usize,
    ) -> impl Future<Output = Result<Vec<DailyStat>, StoreError>> + Send {
        let state = self.lock();
        let skip = state.daily.len().saturating_sub(days);
        let stats = state
            .daily
            .iter()
            .skip(skip)
            .map(|(date, count)| DailyStat {
                date: *date,
                count: *count,
            })
            .collect();
        std::future::ready(Ok(stats))
    }
}
