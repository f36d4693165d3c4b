//! Content-projection points
//!
//! A [`Slot`] holds the nodes a host assigns to it and raises `slotchange` to
//! its listeners. Hosts disagree on when that event fires for content that is
//! already present, so each slot carries a [`SlotChangeTiming`] describing the
//! host it stands in for.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotkit_core::Scheduler;
use slotmap::{new_key_type, SlotMap};
use tracing::trace;

use crate::node::{Content, Node};

new_key_type! {
    /// Identifier of a registered `slotchange` listener
    pub struct ListenerId;
}

/// Raw `slotchange` event
#[derive(Clone, Debug)]
pub struct SlotChangeEvent {
    pub slot_name: Option<String>,
    /// Flattened assigned nodes at dispatch time
    pub assigned: Content,
}

/// Listener for raw `slotchange` events
pub type SlotChangeListener = Rc<dyn Fn(&SlotChangeEvent)>;

/// When an announced change reaches listeners
#[derive(Clone, Debug, Default)]
pub enum SlotChangeTiming {
    /// Listeners run synchronously inside `announce`
    #[default]
    Immediate,
    /// Listeners run at the scheduler's next boundary
    Queued(Scheduler),
    /// Announcements are dropped; only `fire_slotchange` reaches listeners
    Suppressed,
}

struct SlotInner {
    name: Option<String>,
    assigned: RefCell<Content>,
    listeners: RefCell<SlotMap<ListenerId, SlotChangeListener>>,
    timing: RefCell<SlotChangeTiming>,
}

/// Handle to a slot. Clones refer to the same slot.
#[derive(Clone)]
pub struct Slot {
    inner: Rc<SlotInner>,
}

impl Slot {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            inner: Rc::new(SlotInner {
                name: name.map(str::to_string),
                assigned: RefCell::new(Rc::from(Vec::new())),
                listeners: RefCell::new(SlotMap::with_key()),
                timing: RefCell::new(SlotChangeTiming::default()),
            }),
        }
    }

    /// An unnamed slot, the default projection point of a shadow tree
    pub fn unnamed() -> Self {
        Self::new(None)
    }

    pub fn named(name: &str) -> Self {
        Self::new(Some(name))
    }

    /// Assign initial nodes without announcing a change
    pub fn with_assigned(self, nodes: Vec<Node>) -> Self {
        *self.inner.assigned.borrow_mut() = Rc::from(nodes);
        self
    }

    pub fn with_timing(self, timing: SlotChangeTiming) -> Self {
        self.set_timing(timing);
        self
    }

    pub fn set_timing(&self, timing: SlotChangeTiming) {
        *self.inner.timing.borrow_mut() = timing;
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn is_unnamed(&self) -> bool {
        self.inner.name.is_none()
    }

    /// Nodes assigned directly to this slot
    pub fn assigned_nodes(&self) -> Content {
        self.inner.assigned.borrow().clone()
    }

    /// Assigned nodes with nested slots replaced by their own flattened assignments.
    ///
    /// Without nested slots this returns the stored sequence itself, so
    /// identity is stable until the assignment changes.
    pub fn assigned_nodes_flattened(&self) -> Content {
        let assigned = self.assigned_nodes();
        if !assigned.iter().any(|node| matches!(node, Node::Slot(_))) {
            return assigned;
        }

        let mut flattened = Vec::with_capacity(assigned.len());
        for node in assigned.iter() {
            match node {
                Node::Slot(nested) => {
                    flattened.extend(nested.assigned_nodes_flattened().iter().cloned());
                }
                other => flattened.push(other.clone()),
            }
        }
        Rc::from(flattened)
    }

    /// Replace the assignment and announce the change
    pub fn assign(&self, nodes: impl Into<Content>) {
        *self.inner.assigned.borrow_mut() = nodes.into();
        self.announce();
    }

    /// Announce a change according to this slot's timing
    pub fn announce(&self) {
        let timing = self.inner.timing.borrow().clone();
        match timing {
            SlotChangeTiming::Immediate => self.fire_slotchange(),
            SlotChangeTiming::Queued(scheduler) => {
                let weak: Weak<SlotInner> = Rc::downgrade(&self.inner);
                scheduler.queue("slotchange", move || {
                    if let Some(inner) = weak.upgrade() {
                        Slot { inner }.fire_slotchange();
                    }
                });
            }
            SlotChangeTiming::Suppressed => {
                trace!(slot = ?self.name(), "slotchange suppressed");
            }
        }
    }

    /// Dispatch `slotchange` to every listener now
    pub fn fire_slotchange(&self) {
        let event = SlotChangeEvent {
            slot_name: self.inner.name.clone(),
            assigned: self.assigned_nodes_flattened(),
        };
        // Listeners may add or remove listeners while running
        let listeners: Vec<SlotChangeListener> =
            self.inner.listeners.borrow().values().cloned().collect();
        trace!(slot = ?self.name(), listeners = listeners.len(), "slotchange");
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn add_listener<F: Fn(&SlotChangeEvent) + 'static>(&self, listener: F) -> ListenerId {
        self.inner.listeners.borrow_mut().insert(Rc::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.inner.name)
            .field("assigned", &self.inner.assigned.borrow().len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// The persistent attachment point of a component's shadow tree
#[derive(Clone, Debug, Default)]
pub struct ShadowRoot {
    slots: Vec<Slot>,
}

impl ShadowRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn add_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// The first unnamed slot, if the tree has one
    pub fn default_slot(&self) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.is_unnamed())
    }

    pub fn named_slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name() == Some(name))
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}
