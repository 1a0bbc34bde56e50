//! Full-screen interstitial shown between a finished cigarette and its
//! summary.
//!
//! Unsupported platforms and failures are both just a skipped interstitial
//! to the caller; neither is allowed to hold up the summary.

use std::future::Future;

use crate::error::InterstitialError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterstitialOutcome {
    Dismissed,
    Failed(String),
}

pub trait Interstitial: Send + Sync + 'static {
    /// Supported on this platform and a preloaded interstitial is ready.
    fn is_available(&self) -> bool;

    /// Load the next interstitial so a later `show()` has something ready.
    fn preload(&self) -> impl Future<Output = Result<(), InterstitialError>> + Send;

    /// Show the preloaded interstitial, resolving when it is dismissed or fails.
    fn show(&self) -> impl Future<Output = InterstitialOutcome> + Send;
}

/// Platform with no interstitial support.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl Interstitial for Unsupported {
    fn is_available(&self) -> bool {
        false
    }

    fn preload(&self) -> impl Future<Output = Result<(), InterstitialError>> + Send {
        std::future::ready(Err(InterstitialError::Unsupported))
    }

    fn show(&self) -> impl Future<Output = InterstitialOutcome> + Send {
        std::future::ready(InterstitialOutcome::Failed(
            InterstitialError::Unsupported.to_string(),
        ))
    }
}
