use crate::components::hooks::use_threshold_signals::use_threshold_signals;
use crate::config::{
    ThresholdConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD,
};
use crate::dom::{bind_scroll_target, ScrollTargetSpec, WindowScheduler};
use crate::monitor::{ThresholdEvent, ThresholdMonitor};
use crate::target::ScrollTarget;
use leptos::html;
use leptos::prelude::*;
use std::rc::Rc;
use tw_merge::*;

/// Imperative access to a mounted `<ScrollThreshold>`.
///
/// Create one in the parent, pass it as `handle`, and call
/// [`ScrollThresholdHandle::clear_triggers`] once new content has been
/// loaded to re-arm the thresholds.
#[derive(Clone, Copy)]
pub struct ScrollThresholdHandle {
    monitor: StoredValue<Option<ThresholdMonitor>, LocalStorage>,
}

impl ScrollThresholdHandle {
    pub fn new() -> Self {
        Self {
            monitor: StoredValue::new_local(None),
        }
    }

    fn install(&self, monitor: ThresholdMonitor) {
        self.monitor.set_value(Some(monitor));
    }

    fn with<R>(&self, f: impl FnOnce(&ThresholdMonitor) -> R) -> Option<R> {
        self.monitor
            .try_with_value(|m| m.as_ref().map(f))
            .flatten()
    }

    /// The monitor behind the mounted component, if any.
    pub fn monitor(&self) -> Option<ThresholdMonitor> {
        self.with(|m| m.clone())
    }

    pub fn clear_triggers(&self) {
        self.with(|m| m.clear_triggers());
    }

    pub fn check_scroll_thresholds(&self) {
        self.with(|m| m.check_scroll_thresholds());
    }

    pub fn upper_triggered(&self) -> bool {
        self.with(|m| m.upper_triggered()).unwrap_or(false)
    }

    pub fn lower_triggered(&self) -> bool {
        self.with(|m| m.lower_triggered()).unwrap_or(false)
    }

    /// Stops the monitor listening and forgets it; the handle goes back to
    /// being a no-op.
    pub fn release(&self) {
        let Some(monitor) = self.monitor.try_update_value(Option::take).flatten() else {
            return;
        };
        monitor.detach();
        monitor.clear_scroll_target();
    }
}

impl Default for ScrollThresholdHandle {
    fn default() -> Self {
        Self::new()
    }
}

/* ========================================================== */
/*                     ✨ COMPONENTS ✨                       */
/* ========================================================== */

/// Fires `on_upper_threshold` / `on_lower_threshold` when its scroll target
/// gets within the given distance of the top/left or bottom/right bound.
///
/// By default the component scrolls its own children. Pass
/// `scroll_target="document"` to watch the page, or an element id to watch
/// another scroller.
#[component]
pub fn ScrollThreshold(
    #[prop(optional)] children: Option<Children>,
    #[prop(into, optional)] class: String,
    #[prop(default = DEFAULT_UPPER_THRESHOLD.into(), into)] upper_threshold: Signal<f64>,
    #[prop(default = DEFAULT_LOWER_THRESHOLD.into(), into)] lower_threshold: Signal<f64>,
    #[prop(default = false.into(), into)] horizontal: Signal<bool>,
    #[prop(optional, into)] scroll_target: ScrollTargetSpec,
    #[prop(default = DEFAULT_DEBOUNCE_MS)] debounce_ms: u32,
    #[prop(optional)] handle: Option<ScrollThresholdHandle>,
    #[prop(optional)] on_upper_threshold: Option<Callback<()>>,
    #[prop(optional)] on_lower_threshold: Option<Callback<()>>,
    /// Mirrors `upper-changed`.
    #[prop(optional)]
    upper_triggered: Option<RwSignal<bool>>,
    /// Mirrors `lower-changed`.
    #[prop(optional)]
    lower_triggered: Option<RwSignal<bool>>,
) -> impl IntoView {
    let merged_class = tw_merge!("block", class);
    let node_ref: NodeRef<html::Div> = NodeRef::new();
    let handle = handle.unwrap_or_default();

    let config = ThresholdConfig {
        upper_threshold: upper_threshold.get_untracked(),
        lower_threshold: lower_threshold.get_untracked(),
        horizontal: horizontal.get_untracked(),
        debounce_ms,
    };
    let monitor = ThresholdMonitor::new(config, Rc::new(WindowScheduler));

    if let Some(cb) = on_upper_threshold {
        monitor.set_on_upper_threshold(Some(Rc::new(move |_: &ThresholdEvent| cb.run(()))));
    }
    if let Some(cb) = on_lower_threshold {
        monitor.set_on_lower_threshold(Some(Rc::new(move |_: &ThresholdEvent| cb.run(()))));
    }

    let (upper_signal, lower_signal) = use_threshold_signals(&monitor);
    if let Some(out) = upper_triggered {
        Effect::new(move |_| out.set(upper_signal.get()));
    }
    if let Some(out) = lower_triggered {
        Effect::new(move |_| out.set(lower_signal.get()));
    }

    handle.install(monitor.clone());

    // Keeps the resolved target alive; the monitor only holds it weakly.
    let bound_target: StoredValue<Option<Rc<dyn ScrollTarget>>, LocalStorage> =
        StoredValue::new_local(None);

    let monitor_for_mount = monitor.clone();
    Effect::new(move |_| {
        let Some(el) = node_ref.get() else {
            return;
        };
        let host: web_sys::HtmlElement = el.into();
        bound_target.set_value(bind_scroll_target(&monitor_for_mount, &host, &scroll_target));
        monitor_for_mount.attach();
    });

    let monitor_for_thresholds = monitor.clone();
    Effect::new(move |_| {
        monitor_for_thresholds.set_upper_threshold(upper_threshold.get());
        monitor_for_thresholds.set_lower_threshold(lower_threshold.get());
    });

    let monitor_for_axis = monitor;
    Effect::new(move |_| {
        monitor_for_axis.set_horizontal(horizontal.get());
    });

    on_cleanup(move || {
        handle.release();
        bound_target.try_update_value(|t| t.take());
    });

    view! {
        <div data-name="ScrollThreshold" class=merged_class tabindex="0" node_ref=node_ref>
            {children.map(|children| children())}
        </div>
    }
}


// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount_point() -> web_sys::HtmlElement {
        let doc = web_sys::window()
            .and_then(|w| w.document())
            .expect("test runs in a browser");
        let el: web_sys::HtmlElement = doc
            .create_element("div")
            .expect("create mount point")
            .unchecked_into();
        doc.body()
            .expect("body")
            .append_child(&el)
            .expect("append mount point");
        el
    }

    #[wasm_bindgen_test]
    async fn test_threshold_props_follow_signals_and_unmount_releases() {
        let _ = leptos::task::Executor::init_wasm_bindgen();
        let parent = mount_point();
        let upper = RwSignal::new(100.0);
        let lower = RwSignal::new(50.0);
        let handle = ScrollThresholdHandle::new();

        let mounted = leptos::mount::mount_to(parent.clone(), move || {
            view! { <ScrollThreshold upper_threshold=upper lower_threshold=lower handle=handle /> }
        });
        leptos::task::tick().await;

        let monitor = handle.monitor().expect("mounted component installs its monitor");
        assert_eq!(monitor.upper_threshold(), 100.0);
        assert_eq!(monitor.lower_threshold(), 50.0);
        assert!(monitor.is_attached());

        upper.set(250.0);
        lower.set(75.0);
        leptos::task::tick().await;
        assert_eq!(monitor.upper_threshold(), 250.0);
        assert_eq!(monitor.lower_threshold(), 75.0);

        drop(mounted);
        assert!(handle.monitor().is_none());
        assert!(!monitor.is_attached());
        assert!(!monitor.has_scroll_target());
        parent.remove();
    }
}
