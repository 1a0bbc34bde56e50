//! # SmokeTrace Core Library
//!
//! Core logic for SmokeTrace, a toy that burns a virtual cigarette while the
//! user holds or double-taps it and reports what the habit costs. All
//! operations are available from the standalone CLI; any GUI is a thin
//! layer over the same library.
//!
//! ## Architecture
//!
//! - **Burn Controller**: A clock-free state machine. The caller feeds
//!   pointer events with timestamps and calls `advance()` at the controller's
//!   next deadline
//! - **Driver**: Runs a controller against the tokio clock and a render surface
//! - **Completion**: Counter update, presence, interstitial and summary, in order
//! - **Store**: Shared global counter, daily counts and presence over REST
//! - **Storage**: TOML configuration and the local user id
//!
//! ## Key Components
//!
//! - [`BurnController`]: Burn session state machine
//! - [`CompletionCoordinator`]: What happens after a cigarette is finished
//! - [`CounterStore`]: Trait for remote counter backends
//! - [`Config`]: Application configuration management

pub mod app;
pub mod burn;
pub mod completion;
pub mod driver;
pub mod error;
pub mod events;
pub mod interstitial;
pub mod share;
pub mod stats;
pub mod storage;
pub mod store;
pub mod timer;

pub use app::{AppUpdate, SessionApp};
pub use burn::{
    BurnController, BurnMode, BurnSession, InputClassifier, Intent, PointerEvent, PointerKind,
    PointerSource,
};
pub use completion::{
    CompletedSession, CompletionCoordinator, CompletionReport, CompletionSummary,
    InterstitialStep, SummarySurface,
};
pub use driver::{BurnDriver, RenderSurface};
pub use error::{ConfigError, CoreError, InterstitialError, StoreError, ValidationError};
pub use events::Event;
pub use interstitial::{Interstitial, InterstitialOutcome};
pub use share::{share_or_copy, ShareOutcome, ShareTarget};
pub use stats::DerivedStats;
pub use storage::Config;
pub use store::{CounterStore, FirebaseStore, MemoryStore, RemoteStore};
pub use timer::CancellableTimer;
