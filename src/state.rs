//! Context registry shared by every dispatch entry point.
//!
//! The host names contexts by bare `u32` ids. [`VmState`] maps those ids to
//! the plugin's root, stream and HTTP context objects, remembers which root
//! owns each child, and tracks the "active" id: the context on whose behalf
//! user code is currently running.
//!
//! Each table sits in its own `RefCell` so that user code running inside one
//! context (which holds a borrow of that context's table) can still register
//! callouts, which touch only the root-id map and the callout tables.
//!
//! The guest is single-threaded and the host never re-enters it from inside a
//! host call, so the process-wide instance is a plain thread-local with no
//! locking. Host protocol violations (duplicate ids, unknown roots, events for
//! dead contexts) are fatal: see [`protocol_violation`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::callout::CalloutTable;
use crate::context::{DefaultRootContext, HttpContext, RootContext, StreamContext};
use crate::logging::{debug, error};
use crate::types::ContextKind;

/// Constructs the plugin's root context for a host-assigned id.
pub type RootContextFactory = Rc<dyn Fn(u32) -> Box<dyn RootContext>>;

thread_local! {
    static STATE: VmState = VmState::new();
}

/// Run `f` against the process-wide registry.
pub fn with_state<R>(f: impl FnOnce(&VmState) -> R) -> R {
    STATE.with(f)
}

/// Install the factory used for every root context the host creates.
///
/// Call this once from the plugin's start-up code. Later calls replace the
/// earlier factory.
pub fn set_root_context<F>(factory: F)
where
    F: Fn(u32) -> Box<dyn RootContext> + 'static,
{
    with_state(|s| s.set_root_context_factory(factory));
}

/// Abort on a host/guest desynchronization that cannot be recovered from.
#[cold]
#[allow(clippy::panic)]
pub(crate) fn protocol_violation(message: std::fmt::Arguments<'_>) -> ! {
    error!(reason = %message, "host protocol violation");
    panic!("host protocol violation: {message}");
}

/// Registry of live contexts and their ownership.
#[derive(Default)]
pub struct VmState {
    root_factory: RefCell<Option<RootContextFactory>>,
    pub(crate) roots: RefCell<HashMap<u32, Box<dyn RootContext>>>,
    pub(crate) streams: RefCell<HashMap<u32, Box<dyn StreamContext>>>,
    pub(crate) http: RefCell<HashMap<u32, Box<dyn HttpContext>>>,
    /// Callout tables, one per live root.
    pub(crate) callouts: RefCell<HashMap<u32, CalloutTable>>,
    /// Owning root of every live context; roots map to themselves.
    pub(crate) root_ids: RefCell<HashMap<u32, u32>>,
    active_id: Cell<u32>,
}

impl VmState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_root_context_factory<F>(&self, factory: F)
    where
        F: Fn(u32) -> Box<dyn RootContext> + 'static,
    {
        *self.root_factory.borrow_mut() = Some(Rc::new(factory));
    }

    /// Create the root context for `context_id` with an empty callout table.
    pub fn create_root(&self, context_id: u32) {
        if let Some(kind) = self.kind_of(context_id) {
            protocol_violation(format_args!(
                "context id {context_id} already registered as {kind:?}"
            ));
        }

        self.set_active(context_id);
        // Released before the call so the factory may install a new one.
        let factory = self.root_factory.borrow().clone();
        let root = match factory {
            Some(factory) => factory(context_id),
            None => Box::new(DefaultRootContext),
        };

        self.roots.borrow_mut().insert(context_id, root);
        self.callouts
            .borrow_mut()
            .insert(context_id, CalloutTable::default());
        self.root_ids.borrow_mut().insert(context_id, context_id);
        debug!(context_id, "created root context");
    }

    /// Ask root `root_id` for a child of `kind`.
    ///
    /// Returns `false` when the root declines, in which case nothing is
    /// recorded for `context_id`.
    pub fn create_child(&self, context_id: u32, root_id: u32, kind: ContextKind) -> bool {
        if !self.roots.borrow().contains_key(&root_id) {
            protocol_violation(format_args!(
                "unknown root context id {root_id} for child {context_id}"
            ));
        }
        if let Some(existing) = self.kind_of(context_id) {
            protocol_violation(format_args!(
                "context id {context_id} already registered as {existing:?}"
            ));
        }

        self.set_active(root_id);
        let created = match kind {
            ContextKind::Http => self.create_http(context_id, root_id),
            ContextKind::Stream => self.create_stream(context_id, root_id),
            ContextKind::Root => protocol_violation(format_args!(
                "root context {context_id} requested as a child of {root_id}"
            )),
        };

        if created {
            self.root_ids.borrow_mut().insert(context_id, root_id);
            debug!(context_id, root_id, ?kind, "created child context");
        } else {
            debug!(context_id, root_id, ?kind, "root declined child context");
        }
        created
    }

    fn create_http(&self, context_id: u32, root_id: u32) -> bool {
        let child = self
            .roots
            .borrow()
            .get(&root_id)
            .and_then(|root| root.create_http_context(context_id));
        match child {
            Some(ctx) => {
                self.http.borrow_mut().insert(context_id, ctx);
                true
            }
            None => false,
        }
    }

    fn create_stream(&self, context_id: u32, root_id: u32) -> bool {
        let child = self
            .roots
            .borrow()
            .get(&root_id)
            .and_then(|root| root.create_stream_context(context_id));
        match child {
            Some(ctx) => {
                self.streams.borrow_mut().insert(context_id, ctx);
                true
            }
            None => false,
        }
    }

    /// Which table holds `context_id`, if any.
    pub fn kind_of(&self, context_id: u32) -> Option<ContextKind> {
        if self.roots.borrow().contains_key(&context_id) {
            Some(ContextKind::Root)
        } else if self.streams.borrow().contains_key(&context_id) {
            Some(ContextKind::Stream)
        } else if self.http.borrow().contains_key(&context_id) {
            Some(ContextKind::Http)
        } else {
            None
        }
    }

    /// The root that owns `context_id` (itself, for a root).
    pub fn root_id_of(&self, context_id: u32) -> Option<u32> {
        self.root_ids.borrow().get(&context_id).copied()
    }

    /// Remove `context_id` from whichever table holds it.
    ///
    /// Destroying a root drops its pending callouts; the host delivers no
    /// completions for them afterwards.
    pub fn destroy(&self, context_id: u32) -> ContextKind {
        let Some(kind) = self.kind_of(context_id) else {
            protocol_violation(format_args!("delete of unknown context id {context_id}"));
        };

        match kind {
            ContextKind::Root => {
                self.roots.borrow_mut().remove(&context_id);
                let abandoned = self
                    .callouts
                    .borrow_mut()
                    .remove(&context_id)
                    .map_or(0, |table| table.len());
                debug!(context_id, abandoned, "destroyed root context");
            }
            ContextKind::Stream => {
                self.streams.borrow_mut().remove(&context_id);
                debug!(context_id, "destroyed stream context");
            }
            ContextKind::Http => {
                self.http.borrow_mut().remove(&context_id);
                debug!(context_id, "destroyed http context");
            }
        }
        self.root_ids.borrow_mut().remove(&context_id);
        kind
    }

    /// Record the context user code is about to run for.
    pub fn set_active(&self, context_id: u32) {
        self.active_id.set(context_id);
    }

    pub fn active_context_id(&self) -> u32 {
        self.active_id.get()
    }

    /// Number of live contexts across all tables.
    pub fn len(&self) -> usize {
        self.roots.borrow().len() + self.streams.borrow().len() + self.http.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
