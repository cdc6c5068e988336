use std::cell::{Cell, RefCell};

/// Handle returned by a [`Scheduler`]; same shape as `window.setTimeout` ids.
pub type TimerId = i32;

/// Deferred one-shot callbacks.
pub trait Scheduler {
    /// Runs `task` once after `delay_ms`. Returns `None` when nothing could
    /// be scheduled (e.g. no window).
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TimerId>;

    fn clear_timeout(&self, id: TimerId);
}

struct PendingTask {
    id: TimerId,
    due_ms: u64,
    task: Box<dyn FnOnce()>,
}

/// Virtual-clock scheduler.
///
/// Nothing runs until the host calls [`ManualScheduler::advance`], which
/// makes it suitable for frame-driven hosts and for deterministic tests.
/// Tasks scheduled while advancing run in the same call if they fall
/// due before the new time.
#[derive(Default)]
pub struct ManualScheduler {
    now_ms: Cell<u64>,
    next_id: Cell<TimerId>,
    pending: RefCell<Vec<PendingTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Moves the clock forward, running every task that falls due in order.
    pub fn advance(&self, ms: u64) {
        let until = self.now_ms.get() + ms;
        while let Some(next) = self.take_next_due(until) {
            self.now_ms.set(next.due_ms);
            (next.task)();
        }
        self.now_ms.set(until);
    }

    /// Runs whatever is due right now (zero-delay tasks included).
    pub fn run_until_idle(&self) {
        self.advance(0);
    }

    fn take_next_due(&self, until: u64) -> Option<PendingTask> {
        let mut pending = self.pending.borrow_mut();
        let idx = pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= until)
            .min_by_key(|(_, p)| (p.due_ms, p.id))
            .map(|(i, _)| i)?;
        Some(pending.remove(idx))
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TimerId> {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        self.pending.borrow_mut().push(PendingTask {
            id,
            due_ms: self.now_ms.get() + u64::from(delay_ms),
            task,
        });
        Some(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.pending.borrow_mut().retain(|p| p.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce()>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let make = move |name: &'static str| -> Box<dyn FnOnce()> {
            let l = l.clone();
            Box::new(move || l.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_tasks_run_only_when_due() {
        let s = ManualScheduler::new();
        let (log, task) = recorder();
        s.set_timeout(200, task("a"));
        s.advance(199);
        assert!(log.borrow().is_empty());
        s.advance(1);
        assert_eq!(*log.borrow(), vec!["a"]);
        assert_eq!(s.pending_count(), 0);
        assert_eq!(s.now_ms(), 200);
    }

    #[test]
    fn test_tasks_run_in_due_order_then_fifo() {
        let s = ManualScheduler::new();
        let (log, task) = recorder();
        s.set_timeout(50, task("late"));
        s.set_timeout(0, task("first"));
        s.set_timeout(0, task("second"));
        s.advance(100);
        assert_eq!(*log.borrow(), vec!["first", "second", "late"]);
    }

    #[test]
    fn test_clear_timeout_cancels() {
        let s = ManualScheduler::new();
        let (log, task) = recorder();
        let id = s.set_timeout(10, task("a")).expect("manual scheduler always schedules");
        s.clear_timeout(id);
        s.advance(100);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_task_scheduled_while_advancing_runs_if_due() {
        let s = Rc::new(ManualScheduler::new());
        let hits = Rc::new(Cell::new(0));
        let s2 = s.clone();
        let h = hits.clone();
        s.set_timeout(
            10,
            Box::new(move || {
                let h = h.clone();
                s2.set_timeout(10, Box::new(move || h.set(h.get() + 1)));
            }),
        );
        s.advance(15);
        assert_eq!(hits.get(), 0);
        s.advance(5);
        assert_eq!(hits.get(), 1);
    }
}
