//! Typed event dispatch.
//!
//! Handlers are kept per [`EventKind`] in registration order. Dispatch
//! snapshots the handler list first, so handlers may subscribe, unsubscribe
//! or emit while running. A nested emit reaches every handler again,
//! including the one that emitted. Handlers keep their own state in
//! `Cell`/`RefCell`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::app::domain::events::{Event, EventKind};

/// What a handler reports back. Errors are logged, never propagated.
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error>>;

type Handler<C> = Rc<dyn Fn(&C, &Event) -> ListenerResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct EventBus<C> {
    listeners: RefCell<HashMap<EventKind, Vec<(ListenerId, Handler<C>)>>>,
    next_id: Cell<u64>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&C, &Event) -> ListenerResult + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let handler: Handler<C> = Rc::new(handler);
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, handler));
        id
    }

    /// Unregister one handler. Unknown ids are ignored.
    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(handlers) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        before != handlers.len()
    }

    pub fn remove_all_listeners(&self, kind: EventKind) {
        self.listeners.borrow_mut().remove(&kind);
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .get(&kind)
            .map_or(0, |handlers| handlers.len())
    }

    /// Run every handler for the event's kind, in order. Returns how many
    /// completed without error.
    pub fn dispatch(&self, ctx: &C, event: &Event) -> usize {
        let kind = event.kind();
        let snapshot: Vec<(ListenerId, Handler<C>)> = match self.listeners.borrow().get(&kind) {
            Some(handlers) => handlers.clone(),
            None => return 0,
        };

        let mut completed = 0;
        for (id, handler) in snapshot {
            // Skip handlers removed by an earlier handler in this dispatch.
            if !self.is_registered(kind, id) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| handler(ctx, event))) {
                Ok(Ok(())) => completed += 1,
                Ok(Err(e)) => log::warn!("'{}' listener {:?} failed: {}", kind, id, e),
                Err(_) => log::warn!("'{}' listener {:?} panicked", kind, id),
            }
        }
        completed
    }

    fn is_registered(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .get(&kind)
            .is_some_and(|handlers| handlers.iter().any(|(hid, _)| *hid == id))
    }
}
