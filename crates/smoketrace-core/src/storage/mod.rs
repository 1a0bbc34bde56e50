mod config;

pub use config::{
    BurnConfig, CompletionConfig, Config, InterstitialConfig, PricingConfig, StoreConfig,
};

use rand::Rng;
use std::path::{Path, PathBuf};

const USER_ID_FILE: &str = "user_id";
const USER_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const USER_ID_LEN: usize = 11;

/// Returns `~/.config/smoketrace[-dev]/` based on SMOKETRACE_ENV.
///
/// Set SMOKETRACE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SMOKETRACE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("smoketrace-dev")
    } else {
        base_dir.join("smoketrace")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Stable presence identifier for this installation.
///
/// Read from `<dir>/user_id`, generated and written on first use.
pub fn load_or_create_user_id(dir: &Path) -> std::io::Result<String> {
    let path = dir.join(USER_ID_FILE);
    if let Ok(existing) = std::fs::read_to_string(&path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let id = generate_user_id(&mut rand::thread_rng());
    std::fs::write(&path, &id)?;
    Ok(id)
}

fn generate_user_id<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..USER_ID_LEN)
        .map(|_| USER_ID_ALPHABET[rng.gen_range(0..USER_ID_ALPHABET.len())] as char)
        .collect();
    format!("user_{suffix}")
}
