//! Slotkit host element model
//!
//! A small DOM-like model standing in for the host environment:
//!
//! - **Elements and nodes**: shared element handles with attributes, classes and inline style
//! - **Slots**: content-projection points with host-controlled `slotchange` timing
//! - **Updates**: the diff/patch applier that reconciles update descriptions onto elements
//!
//! # Example
//!
//! ```rust
//! use slotkit_dom::{updates, Element, UpdateDescription};
//!
//! let item = Element::new("li");
//! item.set_attribute("data-x", "1");
//!
//! let update = UpdateDescription::new()
//!     .attribute("data-x", false)
//!     .class("selected", true);
//! updates::apply(&item, &update);
//!
//! assert!(!item.has_attribute("data-x"));
//! assert!(item.has_class("selected"));
//! ```

pub mod content;
pub mod node;
pub mod slot;
pub mod updates;

pub use content::{same_nodes, substantive_elements, text_from_content, AUXILIARY_TAGS};
pub use node::{Content, Element, ElementId, Node};
pub use slot::{ListenerId, ShadowRoot, Slot, SlotChangeEvent, SlotChangeTiming};
pub use updates::{AttrValue, UpdateDescription};
