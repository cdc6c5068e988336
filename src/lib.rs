//! Scroll threshold detection for Leptos apps.
//!
//! A [`ThresholdMonitor`] watches a scrollable surface and fires
//! `upper-threshold` / `lower-threshold` once each time the scroll position
//! gets within a configured distance of the top/left or bottom/right
//! bound, until re-armed with `clear_triggers`. The usual consumer is an
//! infinite list that loads more items on `lower-threshold`.
//!
//! The engine is platform independent ([`ScrollTarget`] + [`Scheduler`]);
//! [`dom`] binds it to the browser and [`components`] wraps it in a
//! `<ScrollThreshold>` component.

pub mod components;
pub mod config;
pub mod dom;
pub mod monitor;
pub mod schedule;
pub mod target;

pub use components::{use_threshold_signals, ScrollThreshold, ScrollThresholdHandle};
pub use config::{Axis, ConfigError, ThresholdConfig};
pub use dom::{DomScrollTarget, ScrollTargetSpec, WindowScheduler};
pub use monitor::{
    Edge, EdgeState, Handler, ListenerId, ThresholdEvent, ThresholdEventKind, ThresholdMonitor,
    WeakThresholdMonitor,
};
pub use schedule::{ManualScheduler, Scheduler, TimerId};
pub use target::{ScrollMetrics, ScrollSubscription, ScrollTarget};
