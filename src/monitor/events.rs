use std::rc::Rc;

/// Notifications raised by a [`super::ThresholdMonitor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdEvent {
    /// The leading edge crossed into its threshold.
    UpperThreshold,
    /// The trailing edge crossed into its threshold.
    LowerThreshold,
    UpperChanged { value: bool },
    LowerChanged { value: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThresholdEventKind {
    UpperThreshold,
    LowerThreshold,
    UpperChanged,
    LowerChanged,
}

impl ThresholdEvent {
    pub fn kind(&self) -> ThresholdEventKind {
        match self {
            ThresholdEvent::UpperThreshold => ThresholdEventKind::UpperThreshold,
            ThresholdEvent::LowerThreshold => ThresholdEventKind::LowerThreshold,
            ThresholdEvent::UpperChanged { .. } => ThresholdEventKind::UpperChanged,
            ThresholdEvent::LowerChanged { .. } => ThresholdEventKind::LowerChanged,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// New triggered state carried by the `*-changed` events.
    pub fn value(&self) -> Option<bool> {
        match self {
            ThresholdEvent::UpperChanged { value } | ThresholdEvent::LowerChanged { value } => {
                Some(*value)
            }
            _ => None,
        }
    }
}

impl ThresholdEventKind {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdEventKind::UpperThreshold => "upper-threshold",
            ThresholdEventKind::LowerThreshold => "lower-threshold",
            ThresholdEventKind::UpperChanged => "upper-changed",
            ThresholdEventKind::LowerChanged => "lower-changed",
        }
    }
}

pub type Handler = Rc<dyn Fn(&ThresholdEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Unlimited listener list, keyed by event kind.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, ThresholdEventKind, Handler)>,
}

impl Listeners {
    pub fn add(&mut self, kind: ThresholdEventKind, handler: Handler) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, kind, handler));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(i, _, _)| *i != id);
        self.entries.len() != before
    }

    /// Handlers for `kind`, cloned so they can run without holding a borrow.
    pub fn handlers_for(&self, kind: ThresholdEventKind) -> Vec<Handler> {
        self.entries
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| h.clone())
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The `on<edge>threshold` property: at most one handler installed through
/// it at a time, on top of whatever the general listener list holds.
#[derive(Default)]
pub(crate) struct CallbackSlot {
    installed: Option<(ListenerId, Handler)>,
}

impl CallbackSlot {
    pub fn handler(&self) -> Option<Handler> {
        self.installed.as_ref().map(|(_, h)| h.clone())
    }

    /// Swaps the slot contents, returning the registration to remove.
    pub fn replace(&mut self, next: Option<(ListenerId, Handler)>) -> Option<ListenerId> {
        std::mem::replace(&mut self.installed, next).map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Rc::new(|_: &ThresholdEvent| {})
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ThresholdEvent::UpperThreshold.name(), "upper-threshold");
        assert_eq!(ThresholdEvent::LowerThreshold.name(), "lower-threshold");
        assert_eq!(
            ThresholdEvent::UpperChanged { value: true }.name(),
            "upper-changed"
        );
        assert_eq!(
            ThresholdEvent::LowerChanged { value: false }.name(),
            "lower-changed"
        );
    }

    #[test]
    fn test_value_only_on_changed_events() {
        assert_eq!(ThresholdEvent::UpperThreshold.value(), None);
        assert_eq!(ThresholdEvent::LowerChanged { value: true }.value(), Some(true));
    }

    #[test]
    fn test_listeners_filter_by_kind_and_remove() {
        let mut l = Listeners::default();
        let a = l.add(ThresholdEventKind::UpperThreshold, noop());
        l.add(ThresholdEventKind::UpperThreshold, noop());
        l.add(ThresholdEventKind::LowerChanged, noop());
        assert_eq!(l.handlers_for(ThresholdEventKind::UpperThreshold).len(), 2);
        assert_eq!(l.handlers_for(ThresholdEventKind::LowerThreshold).len(), 0);

        assert!(l.remove(a));
        assert!(!l.remove(a));
        assert_eq!(l.handlers_for(ThresholdEventKind::UpperThreshold).len(), 1);
        assert_eq!(l.len(), 2);
    }
}
