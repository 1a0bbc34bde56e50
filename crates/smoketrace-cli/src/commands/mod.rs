pub mod calc;
pub mod config;
pub mod share;
pub mod simulate;
pub mod stats;

use smoketrace_core::storage::{data_dir, load_or_create_user_id};
use smoketrace_core::{Config, CoreError, RemoteStore, StoreError};

pub type CmdResult = Result<(), CoreError>;

/// Store for commands that only make sense against the shared database.
pub fn remote_store(config: &Config) -> Result<RemoteStore, CoreError> {
    if !config.store.is_remote() {
        return Err(StoreError::NotConfigured(
            "set store.database_url (and store.enabled = true) first".into(),
        )
        .into());
    }
    let user_id = load_or_create_user_id(&data_dir()?)?;
    Ok(RemoteStore::from_config(&config.store, &user_id)?)
}
