//! Terminal stand-ins for the app's surfaces.
//!
//! Progress and the interstitial card go to stderr so stdout stays clean for
//! `--json` output.

use std::future::Future;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use smoketrace_core::completion::{CompletionSummary, SummarySurface};
use smoketrace_core::interstitial::{Interstitial, InterstitialOutcome};
use smoketrace_core::storage::InterstitialConfig;
use smoketrace_core::{CoreError, InterstitialError, RenderSurface, ShareTarget};

const BAR_WIDTH: usize = 30;
const SHARE_INTENT_URL: &str = "https://twitter.com/intent/tweet?text=";

/// Cigarette drawn as a single redrawn line.
pub struct TerminalRender {
    enabled: bool,
    last: Option<(u8, bool)>,
}

impl TerminalRender {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }
}

pub fn cigarette_line(progress: u8, burning: bool) -> String {
    let burnt = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    let tip = if burning { '*' } else { '|' };
    format!(
        "[{}{}{}] {progress:>3}%",
        ".".repeat(burnt),
        tip,
        "=".repeat(BAR_WIDTH - burnt)
    )
}

impl RenderSurface for TerminalRender {
    fn draw(&mut self, progress: u8, burning: bool) {
        if !self.enabled || self.last == Some((progress, burning)) {
            return;
        }
        self.last = Some((progress, burning));
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}", cigarette_line(progress, burning));
        let _ = err.flush();
    }
}

pub struct PrintSummary {
    json: bool,
}

impl PrintSummary {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl SummarySurface for PrintSummary {
    fn show_summary(&self, summary: &CompletionSummary) {
        if self.json {
            let line = serde_json::json!({ "type": "Summary", "summary": summary });
            println!("{line}");
            return;
        }
        println!();
        println!("Cigarettes:  {}", summary.stats.count);
        println!("Money spent: {}", summary.money_label);
        println!("Time lost:   {}", summary.time_lost_label);
    }
}

/// Full-screen card replaced by a countdown on stderr.
pub struct CountdownInterstitial {
    config: InterstitialConfig,
    loaded: AtomicBool,
}

impl CountdownInterstitial {
    pub fn new(config: InterstitialConfig) -> Self {
        Self {
            config,
            loaded: AtomicBool::new(false),
        }
    }
}

impl Interstitial for CountdownInterstitial {
    fn is_available(&self) -> bool {
        self.config.enabled && self.loaded.load(Ordering::SeqCst)
    }

    fn preload(&self) -> impl Future<Output = Result<(), InterstitialError>> + Send {
        let result = if self.config.enabled {
            self.loaded.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(InterstitialError::Unsupported)
        };
        std::future::ready(result)
    }

    fn show(&self) -> impl Future<Output = InterstitialOutcome> + Send {
        async move {
            if !self.loaded.swap(false, Ordering::SeqCst) {
                return InterstitialOutcome::Failed("nothing preloaded".into());
            }
            for remaining in (1..=self.config.duration_secs).rev() {
                eprint!("\r  -- break: back in {remaining}s --  ");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            eprintln!();
            InterstitialOutcome::Dismissed
        }
    }
}

pub fn share_intent_url(payload: &str) -> String {
    format!("{SHARE_INTENT_URL}{}", urlencoding::encode(payload))
}

/// Native share: the platform's browser on a share-intent URL.
pub struct OpenShare;

impl ShareTarget for OpenShare {
    fn name(&self) -> &str {
        "browser"
    }

    fn share(&self, payload: &str) -> Result<(), CoreError> {
        open::that(share_intent_url(payload))?;
        Ok(())
    }
}

pub struct ClipboardShare;

impl ShareTarget for ClipboardShare {
    fn name(&self) -> &str {
        "clipboard"
    }

    fn share(&self, payload: &str) -> Result<(), CoreError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| CoreError::Custom(format!("failed to access clipboard: {e}")))?;
        clipboard
            .set_text(payload)
            .map_err(|e| CoreError::Custom(format!("failed to set clipboard text: {e}")))
    }
}
