//! Sharing a completion summary: native share first, clipboard second.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;

/// A place a text payload can be sent.
pub trait ShareTarget {
    fn name(&self) -> &str;

    fn share(&self, payload: &str) -> Result<(), CoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShareOutcome {
    Shared,
    Copied,
    Failed { reason: String },
}

/// Try the native share target, falling back to the clipboard.
pub fn share_or_copy<N, C>(payload: &str, native: &N, clipboard: &C) -> ShareOutcome
where
    N: ShareTarget + ?Sized,
    C: ShareTarget + ?Sized,
{
    match native.share(payload) {
        Ok(()) => {
            debug!(target_name = native.name(), "shared summary");
            return ShareOutcome::Shared;
        }
        Err(e) => warn!(target_name = native.name(), error = %e, "native share failed"),
    }
    match clipboard.share(payload) {
        Ok(()) => ShareOutcome::Copied,
        Err(e) => {
            warn!(target_name = clipboard.name(), error = %e, "clipboard copy failed");
            ShareOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        fail: bool,
        received: RefCell<Vec<String>>,
    }

    impl Recording {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                received: RefCell::new(Vec::new()),
            }
        }
    }

    impl ShareTarget for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn share(&self, payload: &str) -> Result<(), CoreError> {
            self.received.borrow_mut().push(payload.to_string());
            if self.fail {
                Err(CoreError::Custom("unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn native_success_skips_clipboard() {
        let native = Recording::new(false);
        let clipboard = Recording::new(false);
        assert_eq!(share_or_copy("hi", &native, &clipboard), ShareOutcome::Shared);
        assert!(clipboard.received.borrow().is_empty());
    }

    #[test]
    fn falls_back_to_clipboard() {
        let native = Recording::new(true);
        let clipboard = Recording::new(false);
        assert_eq!(share_or_copy("hi", &native, &clipboard), ShareOutcome::Copied);
        assert_eq!(*clipboard.received.borrow(), vec!["hi".to_string()]);
    }

    #[test]
    fn reports_total_failure() {
        let native = Recording::new(true);
        let clipboard = Recording::new(true);
        assert!(matches!(
            share_or_copy("hi", &native, &clipboard),
            ShareOutcome::Failed { .. }
        ));
    }
}
