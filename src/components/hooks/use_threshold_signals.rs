use crate::monitor::{ThresholdEventKind, ThresholdMonitor};
use leptos::prelude::*;

/// Hook mirroring a monitor's triggered state into signals
///
/// Returns a tuple of (upper_triggered_signal, lower_triggered_signal) where:
/// - `upper_triggered_signal`: RwSignal<bool> following the `upper-changed` events
/// - `lower_triggered_signal`: RwSignal<bool> following the `lower-changed` events
pub fn use_threshold_signals(monitor: &ThresholdMonitor) -> (RwSignal<bool>, RwSignal<bool>) {
    let upper_triggered_signal = RwSignal::new(monitor.upper_triggered());
    let lower_triggered_signal = RwSignal::new(monitor.lower_triggered());

    monitor.add_listener(ThresholdEventKind::UpperChanged, move |ev| {
        if let Some(value) = ev.value() {
            upper_triggered_signal.set(value);
        }
    });
    monitor.add_listener(ThresholdEventKind::LowerChanged, move |ev| {
        if let Some(value) = ev.value() {
            lower_triggered_signal.set(value);
        }
    });

    (upper_triggered_signal, lower_triggered_signal)
}
