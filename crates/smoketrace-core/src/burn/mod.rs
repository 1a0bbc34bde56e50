mod controller;
mod input;
mod session;

pub use controller::BurnController;
pub use input::{
    InputClassifier, Intent, PointerEvent, PointerFilter, PointerKind, PointerSource, TapWindow,
    Transition,
};
pub use session::{BurnMode, BurnSession, CumulativeCounter, TickOutcome, MAX_PROGRESS};
