//! Threshold engine.
//!
//! Two independent edges (upper = top/left, lower = bottom/right), each
//! either armed or triggered. A check moves an armed edge to triggered when
//! the scroll position is within its threshold and announces it once;
//! `clear_triggers` re-arms both.

mod events;

pub use events::{Handler, ListenerId, ThresholdEvent, ThresholdEventKind};

use crate::config::ThresholdConfig;
use crate::schedule::{Scheduler, TimerId};
use crate::target::{ScrollSubscription, ScrollTarget};
use events::{CallbackSlot, Listeners};
use log::{debug, trace, warn};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeState {
    #[default]
    Armed,
    Triggered,
}

impl EdgeState {
    pub fn is_triggered(self) -> bool {
        self == EdgeState::Triggered
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Upper,
    Lower,
}

impl Edge {
    fn threshold_event(self) -> ThresholdEvent {
        match self {
            Edge::Upper => ThresholdEvent::UpperThreshold,
            Edge::Lower => ThresholdEvent::LowerThreshold,
        }
    }

    fn changed_event(self, value: bool) -> ThresholdEvent {
        match self {
            Edge::Upper => ThresholdEvent::UpperChanged { value },
            Edge::Lower => ThresholdEvent::LowerChanged { value },
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Upper => write!(f, "upper"),
            Edge::Lower => write!(f, "lower"),
        }
    }
}

struct MonitorState {
    config: ThresholdConfig,
    upper: EdgeState,
    lower: EdgeState,

    /// Observed surface. Owned by whoever resolved it.
    target: Option<Weak<dyn ScrollTarget>>,
    subscription: Option<ScrollSubscription>,

    attached: bool,

    /// Debounced scroll-driven check; at most one pending.
    scroll_timer: Option<TimerId>,
    /// Deferred reset + check after attach / axis change.
    init_timer: Option<TimerId>,
}

impl MonitorState {
    fn edge_mut(&mut self, edge: Edge) -> &mut EdgeState {
        match edge {
            Edge::Upper => &mut self.upper,
            Edge::Lower => &mut self.lower,
        }
    }
}

struct Inner {
    state: RefCell<MonitorState>,
    listeners: RefCell<Listeners>,
    upper_slot: RefCell<CallbackSlot>,
    lower_slot: RefCell<CallbackSlot>,
    scheduler: Rc<dyn Scheduler>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for id in [state.scroll_timer.take(), state.init_timer.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.clear_timeout(id);
        }
    }
}

/// Watches a scroll target and fires edge-triggered threshold events.
///
/// Cheap to clone; clones share state. Timer callbacks and scroll
/// subscriptions only hold weak references, so dropping the last clone
/// tears everything down. Listeners are owned by the monitor: a listener
/// that needs to call back into it must capture a [`WeakThresholdMonitor`]
/// (see [`ThresholdMonitor::downgrade`]), otherwise the monitor keeps itself
/// alive.
#[derive(Clone)]
pub struct ThresholdMonitor {
    inner: Rc<Inner>,
}

/// Non-owning handle to a [`ThresholdMonitor`].
#[derive(Clone)]
pub struct WeakThresholdMonitor {
    inner: Weak<Inner>,
}

impl WeakThresholdMonitor {
    pub fn upgrade(&self) -> Option<ThresholdMonitor> {
        ThresholdMonitor::from_weak(&self.inner)
    }
}

impl ThresholdMonitor {
    pub fn new(config: ThresholdConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(MonitorState {
                    config,
                    upper: EdgeState::Armed,
                    lower: EdgeState::Armed,
                    target: None,
                    subscription: None,
                    attached: false,
                    scroll_timer: None,
                    init_timer: None,
                }),
                listeners: RefCell::new(Listeners::default()),
                upper_slot: RefCell::new(CallbackSlot::default()),
                lower_slot: RefCell::new(CallbackSlot::default()),
                scheduler,
            }),
        }
    }

    fn from_weak(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn downgrade(&self) -> WeakThresholdMonitor {
        WeakThresholdMonitor {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> ThresholdConfig {
        self.inner.state.borrow().config
    }

    pub fn upper_threshold(&self) -> f64 {
        self.inner.state.borrow().config.upper_threshold
    }

    pub fn set_upper_threshold(&self, px: f64) {
        self.inner.state.borrow_mut().config.upper_threshold = px;
    }

    pub fn lower_threshold(&self) -> f64 {
        self.inner.state.borrow().config.lower_threshold
    }

    pub fn set_lower_threshold(&self, px: f64) {
        self.inner.state.borrow_mut().config.lower_threshold = px;
    }

    pub fn horizontal(&self) -> bool {
        self.inner.state.borrow().config.horizontal
    }

    /// Switches the axis and schedules a fresh reset + check against it.
    pub fn set_horizontal(&self, horizontal: bool) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.config.horizontal == horizontal {
                return;
            }
            state.config.horizontal = horizontal;
        }
        debug!("scroll threshold axis changed (horizontal={horizontal})");
        self.schedule_init_check();
    }

    pub fn debounce_ms(&self) -> u32 {
        self.inner.state.borrow().config.debounce_ms
    }

    pub fn set_debounce_ms(&self, ms: u32) {
        self.inner.state.borrow_mut().config.debounce_ms = ms;
    }

    pub fn upper_triggered(&self) -> bool {
        self.inner.state.borrow().upper.is_triggered()
    }

    pub fn lower_triggered(&self) -> bool {
        self.inner.state.borrow().lower.is_triggered()
    }

    pub fn edge_state(&self, edge: Edge) -> EdgeState {
        let state = self.inner.state.borrow();
        match edge {
            Edge::Upper => state.upper,
            Edge::Lower => state.lower,
        }
    }

    /// Observes `target` instead of the previous one.
    ///
    /// Only a weak reference is kept; once the caller drops the target,
    /// checks become no-ops.
    pub fn set_scroll_target(&self, target: &Rc<dyn ScrollTarget>) {
        let previous = self.inner.state.borrow_mut().subscription.take();
        drop(previous);

        let subscription = self.subscribe_to(target);
        let mut state = self.inner.state.borrow_mut();
        state.target = Some(Rc::downgrade(target));
        state.subscription = Some(subscription);
    }

    fn subscribe_to(&self, target: &Rc<dyn ScrollTarget>) -> ScrollSubscription {
        let weak = Rc::downgrade(&self.inner);
        target.subscribe(Rc::new(move || {
            if let Some(monitor) = Self::from_weak(&weak) {
                monitor.handle_scroll();
            }
        }))
    }

    pub fn clear_scroll_target(&self) {
        let previous = {
            let mut state = self.inner.state.borrow_mut();
            state.target = None;
            state.subscription.take()
        };
        drop(previous);
    }

    pub fn has_scroll_target(&self) -> bool {
        self.inner
            .state
            .borrow()
            .target
            .as_ref()
            .is_some_and(|w| w.strong_count() > 0)
    }

    /// Marks the monitor as live, listens to the current target again if a
    /// previous detach dropped the listener, and schedules the initial check.
    pub fn attach(&self) {
        let resubscribe = {
            let mut state = self.inner.state.borrow_mut();
            state.attached = true;
            if state.subscription.is_some() {
                None
            } else {
                state.target.as_ref().and_then(|w| w.upgrade())
            }
        };
        if let Some(target) = resubscribe {
            let subscription = self.subscribe_to(&target);
            self.inner.state.borrow_mut().subscription = Some(subscription);
        }
        debug!("scroll threshold attached");
        self.schedule_init_check();
    }

    /// Cancels any pending check and removes the scroll listener from the
    /// target. The target itself is remembered for the next
    /// [`ThresholdMonitor::attach`].
    pub fn detach(&self) {
        let (timers, subscription) = {
            let mut state = self.inner.state.borrow_mut();
            state.attached = false;
            (
                [state.scroll_timer.take(), state.init_timer.take()],
                state.subscription.take(),
            )
        };
        drop(subscription);
        for id in timers.into_iter().flatten() {
            self.inner.scheduler.clear_timeout(id);
        }
        debug!("scroll threshold detached");
    }

    pub fn is_attached(&self) -> bool {
        self.inner.state.borrow().attached
    }

    pub fn has_pending_scroll_check(&self) -> bool {
        self.inner.state.borrow().scroll_timer.is_some()
    }

    pub fn has_pending_init_check(&self) -> bool {
        self.inner.state.borrow().init_timer.is_some()
    }

    /// Raw scroll notification. Schedules one check `debounce_ms` after the
    /// first notification of a burst; later ones are dropped meanwhile.
    pub fn handle_scroll(&self) {
        let delay = {
            let state = self.inner.state.borrow();
            if !state.attached {
                return;
            }
            if state.scroll_timer.is_some() {
                trace!("scroll check already pending");
                return;
            }
            state.config.debounce_ms
        };

        let weak = Rc::downgrade(&self.inner);
        let id = self.inner.scheduler.set_timeout(
            delay,
            Box::new(move || {
                let Some(monitor) = Self::from_weak(&weak) else {
                    return;
                };
                monitor.inner.state.borrow_mut().scroll_timer = None;
                monitor.check_scroll_thresholds();
            }),
        );
        if id.is_none() {
            warn!("could not schedule scroll threshold check");
        }
        self.inner.state.borrow_mut().scroll_timer = id;
    }

    fn schedule_init_check(&self) {
        {
            let state = self.inner.state.borrow();
            if !state.attached || state.init_timer.is_some() {
                return;
            }
        }

        let weak = Rc::downgrade(&self.inner);
        let id = self.inner.scheduler.set_timeout(
            0,
            Box::new(move || {
                let Some(monitor) = Self::from_weak(&weak) else {
                    return;
                };
                monitor.inner.state.borrow_mut().init_timer = None;
                monitor.clear_triggers();
                monitor.check_scroll_thresholds();
            }),
        );
        if id.is_none() {
            warn!("could not schedule initial scroll threshold check");
        }
        self.inner.state.borrow_mut().init_timer = id;
    }

    /// Compares the current scroll position against both thresholds and
    /// fires for every armed edge that is within range.
    ///
    /// No-op without a live target or when both edges are already
    /// triggered.
    pub fn check_scroll_thresholds(&self) {
        let (leading, trailing, config) = {
            let state = self.inner.state.borrow();
            if state.upper.is_triggered() && state.lower.is_triggered() {
                return;
            }
            let Some(target) = state.target.as_ref().and_then(|w| w.upgrade()) else {
                return;
            };
            let axis = state.config.axis();
            let metrics = target.metrics();
            (
                metrics.leading_offset(axis),
                metrics.trailing_gap(axis),
                state.config,
            )
        };

        if leading <= config.upper_threshold {
            self.trigger(Edge::Upper);
        }
        if trailing <= config.lower_threshold {
            self.trigger(Edge::Lower);
        }
    }

    /// Re-arms both edges. Does not recheck.
    pub fn clear_triggers(&self) {
        let upper = self.set_edge(Edge::Upper, EdgeState::Armed);
        let lower = self.set_edge(Edge::Lower, EdgeState::Armed);
        if upper || lower {
            debug!("scroll thresholds cleared");
        }
    }

    fn trigger(&self, edge: Edge) {
        if !self.set_edge(edge, EdgeState::Triggered) {
            return;
        }
        debug!("{edge} scroll threshold reached");
        self.dispatch(edge.threshold_event());
    }

    /// Returns whether the edge actually changed; a change always emits the
    /// edge's `*-changed` event.
    fn set_edge(&self, edge: Edge, next: EdgeState) -> bool {
        {
            let mut state = self.inner.state.borrow_mut();
            let current = state.edge_mut(edge);
            if *current == next {
                return false;
            }
            *current = next;
        }
        self.dispatch(edge.changed_event(next.is_triggered()));
        true
    }

    fn dispatch(&self, event: ThresholdEvent) {
        let handlers = self.inner.listeners.borrow().handlers_for(event.kind());
        for handler in handlers {
            handler(&event);
        }
    }

    pub fn add_listener(
        &self,
        kind: ThresholdEventKind,
        handler: impl Fn(&ThresholdEvent) + 'static,
    ) -> ListenerId {
        self.inner.listeners.borrow_mut().add(kind, Rc::new(handler))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id)
    }

    /// Handler installed through [`ThresholdMonitor::set_on_upper_threshold`].
    pub fn on_upper_threshold(&self) -> Option<Handler> {
        self.inner.upper_slot.borrow().handler()
    }

    /// Replaces the single `upper-threshold` callback; `None` clears it.
    /// Listeners added with [`ThresholdMonitor::add_listener`] are untouched.
    pub fn set_on_upper_threshold(&self, handler: Option<Handler>) {
        self.set_slot(Edge::Upper, handler);
    }

    pub fn on_lower_threshold(&self) -> Option<Handler> {
        self.inner.lower_slot.borrow().handler()
    }

    /// Replaces the single `lower-threshold` callback; `None` clears it.
    pub fn set_on_lower_threshold(&self, handler: Option<Handler>) {
        self.set_slot(Edge::Lower, handler);
    }

    fn set_slot(&self, edge: Edge, handler: Option<Handler>) {
        let slot = match edge {
            Edge::Upper => &self.inner.upper_slot,
            Edge::Lower => &self.inner.lower_slot,
        };
        let kind = edge.threshold_event().kind();

        let previous = slot.borrow_mut().replace(None);
        if let Some(id) = previous {
            self.inner.listeners.borrow_mut().remove(id);
        }
        if let Some(handler) = handler {
            let id = self.inner.listeners.borrow_mut().add(kind, handler.clone());
            slot.borrow_mut().replace(Some((id, handler)));
        }
    }
}

impl fmt::Debug for ThresholdMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("ThresholdMonitor")
            .field("config", &state.config)
            .field("upper", &state.upper)
            .field("lower", &state.lower)
            .field("attached", &state.attached)
            .finish_non_exhaustive()
    }
}
