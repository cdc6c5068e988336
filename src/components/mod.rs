pub mod hooks;
pub mod scroll_threshold;

pub use hooks::use_threshold_signals::use_threshold_signals;
pub use scroll_threshold::{ScrollThreshold, ScrollThresholdHandle};
