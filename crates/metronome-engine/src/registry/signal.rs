use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`Signal::connect`], used to disconnect later.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

/// Parameterless change notification.
///
/// Participants own one `Signal` per observable property and `emit()` it when
/// the property changes. Emission walks a snapshot of the handler list, so a
/// handler may disconnect itself (or anyone else) while it runs.
#[derive(Default)]
pub struct Signal {
    handlers: RefCell<Vec<(SubscriptionId, Rc<dyn Fn()>)>>,
    next_id: Cell<u64>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, handler: impl Fn() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.iter().position(|(h, _)| *h == id) {
            Some(i) => {
                handlers.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn emit(&self) {
        let snapshot: Vec<(SubscriptionId, Rc<dyn Fn()>)> = self
            .handlers
            .borrow()
            .iter()
            .map(|(id, h)| (*id, Rc::clone(h)))
            .collect();

        for (id, handler) in snapshot {
            if self.is_connected(id) {
                handler();
            }
        }
    }

    pub fn is_connected(&self, id: SubscriptionId) -> bool {
        self.handlers.borrow().iter().any(|(h, _)| *h == id)
    }

    /// Number of connected handlers.
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("handlers", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_every_handler() {
        let hits = Rc::new(Cell::new(0));
        let s = Signal::new();
        for _ in 0..3 {
            let hits = hits.clone();
            s.connect(move || hits.set(hits.get() + 1));
        }
        s.emit();
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn disconnect_unknown_id_is_false() {
        let s = Signal::new();
        let id = s.connect(|| {});
        assert!(s.disconnect(id));
        assert!(!s.disconnect(id));
        assert!(s.is_empty());
    }

    #[test]
    fn handler_may_disconnect_itself_during_emit() {
        let s = Rc::new(Signal::new());
        let own_id: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let hits = Rc::new(Cell::new(0));

        let id = {
            let weak = Rc::downgrade(&s);
            let own_id = own_id.clone();
            let hits = hits.clone();
            s.connect(move || {
                hits.set(hits.get() + 1);
                if let (Some(sig), Some(id)) = (weak.upgrade(), own_id.get()) {
                    sig.disconnect(id);
                }
            })
        };
        own_id.set(Some(id));

        s.emit();
        s.emit();
        assert_eq!(hits.get(), 1);
        assert!(s.is_empty());
    }

    #[test]
    fn handler_disconnected_mid_emit_is_skipped() {
        let s = Rc::new(Signal::new());
        let victim: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let victim_hits = Rc::new(Cell::new(0));

        {
            let weak = Rc::downgrade(&s);
            let victim = victim.clone();
            s.connect(move || {
                if let (Some(sig), Some(id)) = (weak.upgrade(), victim.get()) {
                    assert!(sig.disconnect(id));
                }
            });
        }
        let id = {
            let victim_hits = victim_hits.clone();
            s.connect(move || victim_hits.set(victim_hits.get() + 1))
        };
        victim.set(Some(id));

        s.emit();
        assert_eq!(victim_hits.get(), 0);
        assert!(!s.is_connected(id));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn handler_connected_mid_emit_waits_for_next_emit() {
        let s = Rc::new(Signal::new());
        let late_hits = Rc::new(Cell::new(0));
        let armed = Rc::new(Cell::new(true));

        {
            let weak = Rc::downgrade(&s);
            let late_hits = late_hits.clone();
            s.connect(move || {
                if armed.replace(false) {
                    if let Some(sig) = weak.upgrade() {
                        let late_hits = late_hits.clone();
                        sig.connect(move || late_hits.set(late_hits.get() + 1));
                    }
                }
            });
        }

        s.emit();
        assert_eq!(late_hits.get(), 0);
        s.emit();
        assert_eq!(late_hits.get(), 1);
    }
}
