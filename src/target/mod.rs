use crate::config::Axis;
use std::rc::Rc;

/// One reading of a scrollable surface's geometry, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub scroll_top: f64,
    /// Visible width of the surface (clientWidth / innerWidth).
    pub width: f64,
    /// Visible height of the surface (clientHeight / innerHeight).
    pub height: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    /// Scroll offset from the top (vertical) or left (horizontal) bound.
    pub fn leading_offset(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.scroll_top,
            Axis::Horizontal => self.scroll_left,
        }
    }

    pub fn visible_extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.height,
            Axis::Horizontal => self.width,
        }
    }

    pub fn total_extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.scroll_height,
            Axis::Horizontal => self.scroll_width,
        }
    }

    /// Distance left to scroll before reaching the bottom/right bound.
    pub fn trailing_gap(&self, axis: Axis) -> f64 {
        self.total_extent(axis) - self.visible_extent(axis) - self.leading_offset(axis)
    }
}

/// Keeps a scroll listener registered until dropped.
pub struct ScrollSubscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl ScrollSubscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription with nothing to undo.
    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }
}

impl Drop for ScrollSubscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl std::fmt::Debug for ScrollSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollSubscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// A surface the threshold monitor can observe: an element, the host
/// itself, or the whole document.
pub trait ScrollTarget {
    fn metrics(&self) -> ScrollMetrics;

    /// Registers `on_scroll` to run on every raw scroll notification.
    fn subscribe(&self, on_scroll: Rc<dyn Fn()>) -> ScrollSubscription;
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sample() -> ScrollMetrics {
        ScrollMetrics {
            scroll_left: 30.0,
            scroll_top: 500.0,
            width: 400.0,
            height: 200.0,
            scroll_width: 1000.0,
            scroll_height: 2000.0,
        }
    }

    #[test]
    fn test_vertical_accessors() {
        let m = sample();
        assert_eq!(m.leading_offset(Axis::Vertical), 500.0);
        assert_eq!(m.visible_extent(Axis::Vertical), 200.0);
        assert_eq!(m.total_extent(Axis::Vertical), 2000.0);
        assert_eq!(m.trailing_gap(Axis::Vertical), 1300.0);
    }

    #[test]
    fn test_horizontal_accessors() {
        let m = sample();
        assert_eq!(m.leading_offset(Axis::Horizontal), 30.0);
        assert_eq!(m.visible_extent(Axis::Horizontal), 400.0);
        assert_eq!(m.total_extent(Axis::Horizontal), 1000.0);
        assert_eq!(m.trailing_gap(Axis::Horizontal), 570.0);
    }

    #[test]
    fn test_trailing_gap_is_zero_at_bottom() {
        let m = ScrollMetrics {
            scroll_top: 1800.0,
            ..sample()
        };
        assert_eq!(m.trailing_gap(Axis::Vertical), 0.0);
    }

    #[test]
    fn test_subscription_runs_unsubscribe_once_on_drop() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let sub = ScrollSubscription::new(move || c.set(c.get() + 1));
        assert_eq!(count.get(), 0);
        drop(sub);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_fake_target_unsubscribes_on_drop() {
        let target = fake::FakeTarget::vertical(200.0, 2000.0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let sub = target.subscribe(Rc::new(move || h.set(h.get() + 1)));
        target.fire_scroll();
        assert_eq!(hits.get(), 1);
        drop(sub);
        assert_eq!(target.listener_count(), 0);
        target.fire_scroll();
        assert_eq!(hits.get(), 1);
    }
}
