use crate::monitor::ThresholdMonitor;
use crate::schedule::{Scheduler, TimerId};
use crate::target::{ScrollMetrics, ScrollSubscription, ScrollTarget};
use log::warn;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Identifier keyword selecting whole-document scrolling.
pub const DOCUMENT_TARGET: &str = "document";

/// Which surface a threshold host observes.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ScrollTargetSpec {
    /// The host element scrolls its own content.
    #[default]
    Host,
    /// The page itself (window scroll position, root element extents).
    Document,
    /// Element looked up by id in the host's document.
    Id(String),
    Element(web_sys::Element),
}

impl From<&str> for ScrollTargetSpec {
    fn from(value: &str) -> Self {
        match value.trim() {
            "" => ScrollTargetSpec::Host,
            DOCUMENT_TARGET => ScrollTargetSpec::Document,
            id => ScrollTargetSpec::Id(id.to_string()),
        }
    }
}

impl From<String> for ScrollTargetSpec {
    fn from(value: String) -> Self {
        ScrollTargetSpec::from(value.as_str())
    }
}

impl From<web_sys::Element> for ScrollTargetSpec {
    fn from(value: web_sys::Element) -> Self {
        ScrollTargetSpec::Element(value)
    }
}

impl ScrollTargetSpec {
    pub fn resolve(&self, host: &web_sys::HtmlElement) -> Option<DomScrollTarget> {
        match self {
            ScrollTargetSpec::Host => Some(DomScrollTarget::Element(host.clone().into())),
            ScrollTargetSpec::Document => web_sys::window().map(DomScrollTarget::Document),
            ScrollTargetSpec::Id(id) => {
                let found = host
                    .owner_document()
                    .or_else(|| web_sys::window().and_then(|w| w.document()))
                    .and_then(|doc| doc.get_element_by_id(id));
                if found.is_none() {
                    warn!("scroll target #{id} not found");
                }
                found.map(DomScrollTarget::Element)
            }
            ScrollTargetSpec::Element(el) => Some(DomScrollTarget::Element(el.clone())),
        }
    }
}

/// Browser-backed [`ScrollTarget`].
#[derive(Clone, Debug)]
pub enum DomScrollTarget {
    Element(web_sys::Element),
    Document(web_sys::Window),
}

impl DomScrollTarget {
    /// True when this target is `host` itself, however it was specified.
    pub fn is_element(&self, host: &web_sys::HtmlElement) -> bool {
        match self {
            DomScrollTarget::Element(el) => {
                let host: &web_sys::Node = host;
                el.is_same_node(Some(host))
            }
            DomScrollTarget::Document(_) => false,
        }
    }

    fn event_target(&self) -> web_sys::EventTarget {
        match self {
            DomScrollTarget::Element(el) => el.clone().into(),
            DomScrollTarget::Document(window) => window.clone().into(),
        }
    }
}

impl ScrollTarget for DomScrollTarget {
    fn metrics(&self) -> ScrollMetrics {
        match self {
            DomScrollTarget::Element(el) => ScrollMetrics {
                scroll_left: f64::from(el.scroll_left()),
                scroll_top: f64::from(el.scroll_top()),
                width: f64::from(el.client_width()),
                height: f64::from(el.client_height()),
                scroll_width: f64::from(el.scroll_width()),
                scroll_height: f64::from(el.scroll_height()),
            },
            DomScrollTarget::Document(window) => {
                // Page offsets come from the window, extents from the root element.
                let root = window.document().and_then(|d| d.document_element());
                let px = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
                    v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
                };
                ScrollMetrics {
                    scroll_left: window.page_x_offset().unwrap_or(0.0),
                    scroll_top: window.page_y_offset().unwrap_or(0.0),
                    width: px(window.inner_width()),
                    height: px(window.inner_height()),
                    scroll_width: root
                        .as_ref()
                        .map(|r| f64::from(r.scroll_width()))
                        .unwrap_or(0.0),
                    scroll_height: root
                        .as_ref()
                        .map(|r| f64::from(r.scroll_height()))
                        .unwrap_or(0.0),
                }
            }
        }
    }

    fn subscribe(&self, on_scroll: Rc<dyn Fn()>) -> ScrollSubscription {
        let target = self.event_target();
        let cb = Closure::<dyn Fn()>::new(move || on_scroll());
        if target
            .add_event_listener_with_callback("scroll", cb.as_ref().unchecked_ref())
            .is_err()
        {
            warn!("failed to subscribe to scroll events");
            return ScrollSubscription::noop();
        }

        // The closure lives inside the unsubscribe hook so it stays valid
        // exactly as long as the listener is registered.
        ScrollSubscription::new(move || {
            let _ = target.remove_event_listener_with_callback("scroll", cb.as_ref().unchecked_ref());
        })
    }
}

/// Enables native scrolling on the host only when it is its own target.
pub fn apply_host_overflow(host: &web_sys::HtmlElement, host_scrolls: bool) {
    let style = host.style();
    if host_scrolls {
        let _ = style.set_property("overflow", "auto");
        let _ = style.set_property("-webkit-overflow-scrolling", "touch");
    } else {
        let _ = style.remove_property("overflow");
        let _ = style.remove_property("-webkit-overflow-scrolling");
    }
}

/// Resolves `spec` against `host`, points `monitor` at it and applies the
/// host overflow styling.
///
/// The monitor only keeps a weak reference: the caller must hold on to
/// the returned target for as long as it should be observed.
pub fn bind_scroll_target(
    monitor: &ThresholdMonitor,
    host: &web_sys::HtmlElement,
    spec: &ScrollTargetSpec,
) -> Option<Rc<dyn ScrollTarget>> {
    let Some(target) = spec.resolve(host) else {
        apply_host_overflow(host, false);
        monitor.clear_scroll_target();
        return None;
    };
    apply_host_overflow(host, target.is_element(host));
    let target: Rc<dyn ScrollTarget> = Rc::new(target);
    monitor.set_scroll_target(&target);
    Some(target)
}

/// [`Scheduler`] over `window.setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowScheduler;

impl Scheduler for WindowScheduler {
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TimerId> {
        let Some(win) = web_sys::window() else {
            return None;
        };
        let cb = Closure::once_into_js(move || task());
        win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            i32::try_from(delay_ms).unwrap_or(i32::MAX),
        )
        .ok()
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id);
        }
    }
}
