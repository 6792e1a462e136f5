//! Correlation of asynchronous host calls with their callbacks.
//!
//! An outbound HTTP call returns a callout id immediately; the response
//! arrives later as a separate `proxy_on_http_call_response` dispatch naming
//! only the root context and that id. Each root keeps a [`CalloutTable`] of
//! in-flight calls issued by itself or any of its children, recording the
//! callback and the context that was active when the call was made.
//!
//! Registration always completes before the host can deliver the matching
//! completion, since the guest only yields back to the host after the
//! current entry point returns.

use std::collections::HashMap;
use std::fmt;

use crate::logging::trace;
use crate::state::{VmState, protocol_violation};

/// Invoked with `(num_headers, body_size, num_trailers)` of the response.
pub type CalloutCallback = Box<dyn FnOnce(usize, usize, usize)>;

/// A pending callout: what to run, and on whose behalf.
pub struct CalloutAttribute {
    pub callback: CalloutCallback,
    pub caller_context_id: u32,
}

impl fmt::Debug for CalloutAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalloutAttribute")
            .field("caller_context_id", &self.caller_context_id)
            .finish_non_exhaustive()
    }
}

/// In-flight callouts owned by one root context.
#[derive(Default, Debug)]
pub struct CalloutTable {
    pending: HashMap<u32, CalloutAttribute>,
}

impl CalloutTable {
    /// Track a new callout. Returns the previous entry if the id was reused.
    pub fn insert(&mut self, callout_id: u32, attribute: CalloutAttribute) -> Option<CalloutAttribute> {
        self.pending.insert(callout_id, attribute)
    }

    /// Remove and return the callout; a second take yields `None`.
    pub fn take(&mut self, callout_id: u32) -> Option<CalloutAttribute> {
        self.pending.remove(&callout_id)
    }

    pub fn contains(&self, callout_id: u32) -> bool {
        self.pending.contains_key(&callout_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl VmState {
    /// Attach `callback` to a callout the host just accepted.
    ///
    /// The callout is filed under the root owning the active context, so a
    /// child's completion is still found after the child itself is gone.
    pub fn register_callout(&self, callout_id: u32, callback: CalloutCallback) {
        let caller = self.active_context_id();
        let Some(root_id) = self.root_id_of(caller) else {
            protocol_violation(format_args!(
                "callout {callout_id} issued from untracked context {caller}"
            ));
        };

        let mut callouts = self.callouts.borrow_mut();
        let Some(table) = callouts.get_mut(&root_id) else {
            protocol_violation(format_args!(
                "callout {callout_id} issued for missing root {root_id}"
            ));
        };

        let attribute = CalloutAttribute {
            callback,
            caller_context_id: caller,
        };
        if table.insert(callout_id, attribute).is_some() {
            protocol_violation(format_args!(
                "callout id {callout_id} reused while still in flight on root {root_id}"
            ));
        }
        trace!(callout_id, root_id, caller, "registered callout");
    }

    /// Remove the callout `callout_id` from root `root_id`'s table.
    pub fn resolve_callout(&self, root_id: u32, callout_id: u32) -> Option<CalloutAttribute> {
        let attribute = self
            .callouts
            .borrow_mut()
            .get_mut(&root_id)
            .and_then(|table| table.take(callout_id));
        trace!(callout_id, root_id, found = attribute.is_some(), "resolved callout");
        attribute
    }

    /// Number of callouts still pending on `root_id`.
    pub fn pending_callouts(&self, root_id: u32) -> usize {
        self.callouts
            .borrow()
            .get(&root_id)
            .map_or(0, CalloutTable::len)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::context::{HttpContext, RootContext};
    use crate::types::ContextKind;

    struct Exchange;

    impl HttpContext for Exchange {}

    struct HttpRoot;

    impl RootContext for HttpRoot {
        fn create_http_context(&self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
            Some(Box::new(Exchange))
        }
    }

    fn state_with_child() -> VmState {
        let state = VmState::new();
        state.set_root_context_factory(|_| Box::new(HttpRoot));
        state.create_root(1);
        assert!(state.create_child(5, 1, ContextKind::Http));
        state
    }

    #[test]
    fn test_register_then_resolve_once() {
        let state = state_with_child();
        let hits = Rc::new(Cell::new(0));
        let hits_in_cb = Rc::clone(&hits);

        state.set_active(5);
        state.register_callout(
            100,
            Box::new(move |_, _, _| hits_in_cb.set(hits_in_cb.get() + 1)),
        );
        assert_eq!(state.pending_callouts(1), 1);

        let attribute = state.resolve_callout(1, 100).unwrap();
        assert_eq!(attribute.caller_context_id, 5);
        (attribute.callback)(0, 0, 0);
        assert_eq!(hits.get(), 1);

        assert!(state.resolve_callout(1, 100).is_none());
        assert_eq!(state.pending_callouts(1), 0);
    }

    #[test]
    fn test_root_can_issue_callouts() {
        let state = state_with_child();
        state.set_active(1);
        state.register_callout(7, Box::new(|_, _, _| {}));
        let attribute = state.resolve_callout(1, 7).unwrap();
        assert_eq!(attribute.caller_context_id, 1);
    }

    #[test]
    fn test_callback_receives_counts() {
        let state = state_with_child();
        let seen = Rc::new(RefCell::new(None));
        let seen_in_cb = Rc::clone(&seen);
        state.set_active(5);
        state.register_callout(
            3,
            Box::new(move |h, b, t| *seen_in_cb.borrow_mut() = Some((h, b, t))),
        );
        let attribute = state.resolve_callout(1, 3).unwrap();
        (attribute.callback)(4, 128, 1);
        assert_eq!(*seen.borrow(), Some((4, 128, 1)));
    }

    #[test]
    fn test_resolve_wrong_root() {
        let state = state_with_child();
        state.set_active(5);
        state.register_callout(3, Box::new(|_, _, _| {}));
        assert!(state.resolve_callout(2, 3).is_none());
        assert_eq!(state.pending_callouts(1), 1);
    }

    #[test]
    fn test_callout_survives_child_destruction() {
        let state = state_with_child();
        state.set_active(5);
        state.register_callout(3, Box::new(|_, _, _| {}));
        state.destroy(5);
        assert!(state.resolve_callout(1, 3).is_some());
    }

    #[test]
    #[should_panic(expected = "untracked context 9")]
    fn test_register_from_unknown_context_is_fatal() {
        let state = state_with_child();
        state.set_active(9);
        state.register_callout(3, Box::new(|_, _, _| {}));
    }

    #[test]
    #[should_panic(expected = "reused while still in flight")]
    fn test_duplicate_callout_id_is_fatal() {
        let state = state_with_child();
        state.set_active(5);
        state.register_callout(3, Box::new(|_, _, _| {}));
        state.register_callout(3, Box::new(|_, _, _| {}));
    }

    #[test]
    fn test_table_take() {
        let mut table = CalloutTable::default();
        assert!(table.is_empty());
        table.insert(
            1,
            CalloutAttribute {
                callback: Box::new(|_, _, _| {}),
                caller_context_id: 2,
            },
        );
        assert!(table.contains(1));
        assert!(table.take(1).is_some());
        assert!(table.take(1).is_none());
        assert_eq!(table.len(), 0);
    }
}
