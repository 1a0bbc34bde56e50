//! Remote counter and presence store.
//!
//! The store is shared with every other client, so nothing here assumes a
//! read-modify-write is atomic: each update is a blind set or a server-side
//! increment, and a lost update from a concurrent client is acceptable.

mod firebase;
mod memory;
mod presence;
mod subscription;
#[cfg(test)]
pub(crate) mod testing;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use presence::{PresenceAck, PresenceQueue, PresenceUpdate, PresenceWriter};
pub use subscription::{subscribe_active_user_count, subscribe_aggregate_stats, Subscription};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::StoreError;
use crate::storage::StoreConfig;

/// Every remote backend implements this trait.
///
/// Futures are `Send` so callers can fire them off on the runtime without
/// waiting.
pub trait CounterStore: Send + Sync + 'static {
    /// Add one finished cigarette to the global totals.
    fn increment_global_counter(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrite this user's presence with a fresh timestamp and burning flag.
    fn set_presence(&self, is_burning: bool)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Announce this user as present and not burning.
    fn register_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Refresh this user's timestamp, leaving the burning flag alone.
    fn heartbeat(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Drop this user's presence entirely.
    fn remove_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn aggregate_stats(&self) -> impl Future<Output = Result<AggregateStats, StoreError>> + Send;

    fn active_users(&self) -> impl Future<Output = Result<ActiveUsers, StoreError>> + Send;

    /// Per-day counts for the most recent `days` days that have any.
    fn daily_stats(
        &self,
        days: usize,
    ) -> impl Future<Output = Result<Vec<DailyStat>, StoreError>> + Send;
}

/// Outcome of a fire-and-forget remote call. Never propagated as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    Ok,
    Ignored(String),
}

impl BestEffort {
    pub fn is_ok(&self) -> bool {
        matches!(self, BestEffort::Ok)
    }
}

/// Await a remote call, logging and swallowing any failure.
pub async fn best_effort<F>(operation: &'static str, call: F) -> BestEffort
where
    F: Future<Output = Result<(), StoreError>>,
{
    match call.await {
        Ok(()) => BestEffort::Ok,
        Err(e) => {
            warn!(operation, error = %e, "remote call failed, ignoring");
            BestEffort::Ignored(e.to_string())
        }
    }
}

/// Spawn a remote call without waiting for it.
pub fn spawn_best_effort<F>(operation: &'static str, call: F) -> JoinHandle<BestEffort>
where
    F: Future<Output = Result<(), StoreError>> + Send + 'static,
{
    tokio::spawn(best_effort(operation, call))
}

/// Global totals as shown to every user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub today_count: u64,
    pub total_count: u64,
}

/// The `stats` node as stored remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsNode {
    #[serde(default)]
    pub today_count: u64,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub last_date: String,
}

impl StatsNode {
    /// Node after one more cigarette on `today`; the daily count restarts
    /// when the stored date is stale.
    pub fn incremented(current: Option<StatsNode>, today: NaiveDate) -> StatsNode {
        let current = current.unwrap_or_default();
        let today_key = date_key(today);
        let today_count = if current.last_date == today_key {
            current.today_count.saturating_add(1)
        } else {
            1
        };
        StatsNode {
            today_count,
            total_count: current.total_count.saturating_add(1),
            last_date: today_key,
        }
    }

    /// What a reader on `today` sees; a stale date means nothing yet today.
    pub fn as_seen_on(&self, today: NaiveDate) -> AggregateStats {
        AggregateStats {
            today_count: if self.last_date == date_key(today) {
                self.today_count
            } else {
                0
            },
            total_count: self.total_count,
        }
    }
}

/// One user's node under `activeUsers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Server timestamp in epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(rename = "isSmoking", default)]
    pub is_smoking: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUsers {
    pub total: u64,
    pub burning: u64,
}

impl ActiveUsers {
    /// Count users seen within `window` of `now_ms`.
    pub fn count<'a>(
        records: impl IntoIterator<Item = &'a PresenceRecord>,
        now_ms: i64,
        window: Duration,
    ) -> Self {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let mut users = ActiveUsers::default();
        for record in records {
            let Some(ts) = record.timestamp else {
                continue;
            };
            if now_ms.saturating_sub(ts) < window_ms {
                users.total += 1;
                if record.is_smoking {
                    users.burning += 1;
                }
            }
        }
        users
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub count: u64,
}

/// `YYYY-MM-DD`, the key format of the `daily` node and `stats.lastDate`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Store selected by configuration: remote when a database URL is set,
/// in-memory otherwise.
pub enum RemoteStore {
    Firebase(FirebaseStore),
    Memory(MemoryStore),
}

impl RemoteStore {
    pub fn from_config(config: &StoreConfig, user_id: &str) -> Result<Self, StoreError> {
        if config.is_remote() {
            Ok(RemoteStore::Firebase(FirebaseStore::from_config(
                config, user_id,
            )?))
        } else {
            Ok(RemoteStore::Memory(MemoryStore::new(
                user_id,
                config.active_window(),
            )))
        }
    }

    pub fn offline(config: &StoreConfig, user_id: &str) -> Self {
        RemoteStore::Memory(MemoryStore::new(user_id, config.active_window()))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, RemoteStore::Firebase(_))
    }
}

impl CounterStore for RemoteStore {
    fn increment_global_counter(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.increment_global_counter().await,
                RemoteStore::Memory(s) => s.increment_global_counter().await,
            }
        }
    }

    fn set_presence(
        &self,
        is_burning: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.set_presence(is_burning).await,
                RemoteStore::Memory(s) => s.set_presence(is_burning).await,
            }
        }
    }

    fn register_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.register_presence().await,
                RemoteStore::Memory(s) => s.register_presence().await,
            }
        }
    }

    fn heartbeat(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.heartbeat().await,
                RemoteStore::Memory(s) => s.heartbeat().await,
            }
        }
    }

    fn remove_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.remove_presence().await,
                RemoteStore::Memory(s) => s.remove_presence().await,
            }
        }
    }

    fn aggregate_stats(&self) -> impl Future<Output = Result<AggregateStats, StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.aggregate_stats().await,
                RemoteStore::Memory(s) => s.aggregate_stats().await,
            }
        }
    }

    fn active_users(&self) -> impl Future<Output = Result<ActiveUsers, StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.active_users().await,
                RemoteStore::Memory(s) => s.active_users().await,
            }
        }
    }

    fn daily_stats(
        &self,
        days: usize,
    ) -> impl Future<Output = Result<Vec<DailyStat>, StoreError>> + Send {
        async move {
            match self {
                RemoteStore::Firebase(s) => s.daily_stats(days).await,
                RemoteStore::Memory(s) => s.daily_stats(days).await,
            }
        }
    }
}
