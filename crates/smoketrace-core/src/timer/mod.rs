mod cancellable;

pub use cancellable::{CancellableTimer, TimerKind};
