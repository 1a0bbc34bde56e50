//! Firebase Realtime Database over its REST API.
//!
//! Layout of the database:
//!
//! ```text
//! stats                 { todayCount, totalCount, lastDate }
//! daily/<YYYY-MM-DD>    count, bumped with a server-side increment
//! activeUsers/<user>    { timestamp: <server ms>, isSmoking }
//! ```

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{
    date_key, now_epoch_ms, today_utc, ActiveUsers, AggregateStats, CounterStore, DailyStat,
    PresenceRecord, StatsNode,
};
use crate::error::StoreError;
use crate::storage::StoreConfig;

const STATS_PATH: &str = "stats";
const DAILY_PATH: &str = "daily";
const ACTIVE_USERS_PATH: &str = "activeUsers";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FirebaseStore {
    client: Client,
    base: Url,
    auth: Option<String>,
    user_id: String,
    active_window: Duration,
}

impl FirebaseStore {
    /// `database_url` is the database root, e.g.
    /// `https://<project>-default-rtdb.firebaseio.com`.
    pub fn new(
        database_url: &str,
        auth: Option<String>,
        user_id: impl Into<String>,
        active_window: Duration,
    ) -> Result<Self, StoreError> {
        let trimmed = database_url.trim();
        if trimmed.is_empty() {
            return Err(StoreError::NotConfigured("database URL is empty".into()));
        }
        // Url::join replaces the last path segment unless the base ends in '/'.
        let base = if trimmed.ends_with('/') {
            Url::parse(trimmed)?
        } else {
            Url::parse(&format!("{trimmed}/"))?
        };
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            auth: auth.filter(|token| !token.is_empty()),
            user_id: user_id.into(),
            active_window,
        })
    }

    pub fn from_config(config: &StoreConfig, user_id: &str) -> Result<Self, StoreError> {
        Self::new(
            &config.database_url,
            config.auth_token.clone(),
            user_id,
            config.active_window(),
        )
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        let mut url = self.base.join(&format!("{path}.json"))?;
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok(url)
    }

    fn presence_path(&self) -> String {
        format!("{ACTIVE_USERS_PATH}/{}", self.user_id)
    }

    async fn check(path: &str, resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, StoreError> {
        let resp = self.client.get(self.url(path)?).query(query).send().await?;
        let resp = Self::check(path, resp).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| StoreError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), StoreError> {
        let resp = self.client.put(self.url(path)?).json(body).send().await?;
        Self::check(path, resp).await?;
        debug!(path, "firebase put");
        Ok(())
    }

    async fn patch_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), StoreError> {
        let resp = self.client.patch(self.url(path)?).json(body).send().await?;
        Self::check(path, resp).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let resp = self.client.delete(self.url(path)?).send().await?;
        Self::check(path, resp).await?;
        Ok(())
    }
}

impl CounterStore for FirebaseStore {
    fn increment_global_counter(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let today = today_utc();
            let current: Option<StatsNode> = self.get_json(STATS_PATH, &[]).await?;
            let next = StatsNode::incremented(current, today);
            self.put_json(STATS_PATH, &next).await?;
            let daily = format!("{DAILY_PATH}/{}", date_key(today));
            self.put_json(&daily, &json!({ ".sv": { "increment": 1 } }))
                .await
        }
    }

    fn set_presence(
        &self,
        is_burning: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let body = json!({ "timestamp": { ".sv": "timestamp" }, "isSmoking": is_burning });
            self.put_json(&self.presence_path(), &body).await
        }
    }

    fn register_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.set_presence(false)
    }

    fn heartbeat(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let body = json!({ "timestamp": { ".sv": "timestamp" } });
            self.patch_json(&self.presence_path(), &body).await
        }
    }

    fn remove_presence(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move { self.delete(&self.presence_path()).await }
    }

    fn aggregate_stats(&self) -> impl Future<Output = Result<AggregateStats, StoreError>> + Send {
        async move {
            let node: Option<StatsNode> = self.get_json(STATS_PATH, &[]).await?;
            Ok(node
                .map(|node| node.as_seen_on(today_utc()))
                .unwrap_or_default())
        }
    }

    fn active_users(&self) -> impl Future<Output = Result<ActiveUsers, StoreError>> + Send {
        async move {
            let users: Option<HashMap<String, PresenceRecord>> =
                self.get_json(ACTIVE_USERS_PATH, &[]).await?;
            let users = users.unwrap_or_default();
            Ok(ActiveUsers::count(
                users.values(),
                now_epoch_ms(),
                self.active_window,
            ))
        }
    }

    fn daily_stats(
        &self,
        days: usize,
    ) -> impl Future<Output = Result<Vec<DailyStat>, StoreError>> + Send {
        async move {
            if days == 0 {
                return Ok(Vec::new());
            }
            let query = [
                ("orderBy", "\"$key\"".to_string()),
                ("limitToLast", days.to_string()),
            ];
            let raw: Option<BTreeMap<String, u64>> = self.get_json(DAILY_PATH, &query).await?;
            let mut stats: Vec<DailyStat> = raw
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(key, count)| {
                    NaiveDate::parse_from_str(&key, "%Y-%m-%d")
                        .ok()
                        .map(|date| DailyStat { date, count })
                })
                .collect();
            stats.sort_by_key(|stat| stat.date);
            Ok(stats)
        }
    }
}
