//! Content observation
//!
//! Watches a component's default slot and tells subscribers when the projected
//! content changes.
//!
//! Hosts are inconsistent about the initial `slotchange`: some fire it for
//! content that is already present, some never do. The observer settles this
//! with a race. It listens for the real event and, at construction, also queues
//! one continuation. Whichever runs first sets `fired` and delivers the
//! content; the continuation does nothing if the event beat it. Exactly one
//! initial notification results either way.
//!
//! A `slotchange` that arrives while the component is rendering is delivered at
//! the next scheduling boundary instead, after that render has finished.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotkit_core::{PipelineConfig, PipelineWarning, ReactiveCore};
use slotkit_dom::{same_nodes, Content, ListenerId, ShadowRoot, Slot, SlotChangeEvent};
use tracing::{debug, trace, warn};

/// Handler for content-change notifications
pub type ContentHandler = Rc<dyn Fn(&Content)>;

struct ObserverShared {
    component: String,
    slot: Option<Slot>,
    // The observer's own slotchange listener, removed on drop
    listener: Cell<Option<ListenerId>>,
    core: ReactiveCore,
    dedupe: bool,
    fired: Cell<bool>,
    delivered: RefCell<Option<Content>>,
    // No unregistration: handlers live as long as the observer.
    handlers: RefCell<Vec<ContentHandler>>,
    notifications: Cell<u64>,
    warning: Option<PipelineWarning>,
}

/// Observer of a component's default slot. Clones share the same observer.
#[derive(Clone)]
pub struct ContentObserver {
    shared: Rc<ObserverShared>,
}

impl ContentObserver {
    /// Start observing the default slot of `shadow_root`.
    ///
    /// Without a default slot the observer logs a [`PipelineWarning`] and
    /// never delivers content.
    pub fn new(
        component: &str,
        shadow_root: Option<&ShadowRoot>,
        core: &ReactiveCore,
        config: &PipelineConfig,
    ) -> Self {
        let slot = shadow_root.and_then(ShadowRoot::default_slot).cloned();
        let warning = match slot {
            Some(_) => None,
            None => {
                let warning = PipelineWarning::MissingContentSlot {
                    component: component.to_string(),
                };
                if config.warn_on_missing_slot {
                    warn!(component, "{warning}");
                }
                Some(warning)
            }
        };

        let observer = Self {
            shared: Rc::new(ObserverShared {
                component: component.to_string(),
                slot,
                listener: Cell::new(None),
                core: core.clone(),
                dedupe: config.dedupe_content,
                fired: Cell::new(false),
                delivered: RefCell::new(None),
                handlers: RefCell::new(Vec::new()),
                notifications: Cell::new(0),
                warning,
            }),
        };

        if let Some(slot) = &observer.shared.slot {
            let weak = Rc::downgrade(&observer.shared);
            let id = slot.add_listener(move |_event| {
                if let Some(shared) = weak.upgrade() {
                    ContentObserver { shared }.handle_slotchange();
                }
            });
            observer.shared.listener.set(Some(id));

            let weak = Rc::downgrade(&observer.shared);
            core.scheduler().queue("content-normalize", move || {
                if let Some(shared) = weak.upgrade() {
                    ContentObserver { shared }.normalize_initial_content();
                }
            });
        }

        observer
    }

    /// Register a handler for content changes
    pub fn on_content_change<F: Fn(&Content) + 'static>(&self, handler: F) {
        self.shared.handlers.borrow_mut().push(Rc::new(handler));
    }

    /// Register a handler for the raw `slotchange` event.
    ///
    /// Returns `None` if there is no slot to listen to.
    pub fn on_slot_change<F: Fn(&SlotChangeEvent) + 'static>(&self, handler: F) -> Option<ListenerId> {
        match &self.shared.slot {
            Some(slot) => Some(slot.add_listener(handler)),
            None => {
                warn!(
                    component = %self.shared.component,
                    "slotchange handler ignored: no default slot"
                );
                None
            }
        }
    }

    /// Content from the most recent notification
    pub fn content(&self) -> Option<Content> {
        self.shared.delivered.borrow().clone()
    }

    pub fn slot(&self) -> Option<&Slot> {
        self.shared.slot.as_ref()
    }

    /// Whether the initial notification has happened (or been claimed by the event)
    pub fn has_fired(&self) -> bool {
        self.shared.fired.get()
    }

    /// Number of notifications delivered to handlers
    pub fn notification_count(&self) -> u64 {
        self.shared.notifications.get()
    }

    pub fn warning(&self) -> Option<&PipelineWarning> {
        self.shared.warning.as_ref()
    }

    fn handle_slotchange(&self) {
        self.shared.fired.set(true);
        self.deliver_or_defer();
    }

    fn normalize_initial_content(&self) {
        if self.shared.fired.replace(true) {
            trace!(component = %self.shared.component, "initial slotchange already fired");
            return;
        }
        debug!(component = %self.shared.component, "host skipped initial slotchange; synthesizing");
        self.deliver_or_defer();
    }

    fn deliver_or_defer(&self) {
        if !self.shared.core.is_rendering() {
            self.deliver();
            return;
        }

        debug!(component = %self.shared.component, "slotchange during render; deferring");
        let weak = Rc::downgrade(&self.shared);
        self.shared.core.scheduler().queue("content-deferred", move || {
            if let Some(shared) = weak.upgrade() {
                ContentObserver { shared }.deliver();
            }
        });
    }

    fn deliver(&self) {
        // Content may affect what the host can observe, so changes made while
        // handling it raise change events.
        self.shared
            .core
            .with_change_events(|| self.notify_about_content_changes());
    }

    fn notify_about_content_changes(&self) {
        let Some(slot) = &self.shared.slot else {
            return;
        };
        let content = slot.assigned_nodes_flattened();

        if self.shared.dedupe {
            if let Some(previous) = self.shared.delivered.borrow().as_ref() {
                if Rc::ptr_eq(previous, &content) || same_nodes(previous, &content) {
                    trace!(component = %self.shared.component, "content unchanged; skipping notification");
                    return;
                }
            }
        }

        *self.shared.delivered.borrow_mut() = Some(content.clone());
        self.shared
            .notifications
            .set(self.shared.notifications.get() + 1);
        debug!(
            component = %self.shared.component,
            nodes = content.len(),
            "content changed"
        );

        let handlers = self.shared.handlers.borrow().clone();
        for handler in handlers {
            handler(&content);
        }
    }
}

impl Drop for ObserverShared {
    fn drop(&mut self) {
        if let (Some(slot), Some(id)) = (&self.slot, self.listener.take()) {
            slot.remove_listener(id);
            trace!(component = %self.component, "slotchange listener removed");
        }
    }
}

impl std::fmt::Debug for ContentObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentObserver")
            .field("component", &self.shared.component)
            .field("slot", &self.shared.slot)
            .field("fired", &self.shared.fired.get())
            .field("notifications", &self.shared.notifications.get())
            .finish()
    }
}
