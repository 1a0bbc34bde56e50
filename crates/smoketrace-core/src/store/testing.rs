//! Store doubles shared by tests across the crate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::store::{ActiveUsers, AggregateStats, CounterStore, DailyStat, MemoryStore};

/// Memory store whose `true` presence writes take a while to land.
pub(crate) struct SlowBurningStore {
    pub(crate) inner: MemoryStore,
    pub(crate) delay: Duration,
}

impl CounterStore for SlowBurningStore {
    fn increment_global_counter(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.inner.increment_global_counter()
    }

    fn set_presence(
        &self,
        is_burning: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            if is_burning {
                tokio::time::sleep(self.delay).await;
            }
            self.inner.set_presence(is_burning).await
        }
    }

    fn register_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.inner.register_presence()
    }

    fn heartbeat(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.inner.heartbeat()
    }

    fn remove_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.inner.remove_presence()
    }

    fn aggregate_stats(
        &self,
    ) -> impl Future<Output = Result<AggregateStats, StoreError>> + Send {
        self.inner.aggregate_stats()
    }

    fn active_users(&self) -> impl Future<Output = Result<ActiveUsers, StoreError>> + Send {
        self.inner.active_users()
    }

    fn daily_stats(
        &self,
        days: usize,
    ) -> impl Future<Output = Result<Vec<DailyStat>, StoreError>> + Send {
        self.inner.daily_stats(days)
    }
}

pub(crate) fn slow_store() -> Arc<SlowBurningStore> {
    Arc::new(SlowBurningStore {
        inner: MemoryStore::new("user_w", Duration::from_secs(30)),
        delay: Duration::from_millis(50),
    })
}
