//! Slotkit Components
//!
//! Builds list-like components on top of `slotkit_core` and `slotkit_dom`:
//!
//! - **Content observation**: one normalized notification per content change,
//!   however the host times its `slotchange` events
//! - **Item projection**: memoized items with per-item updates applied against
//!   each item's original snapshot
//! - **Layers**: an ordered chain of [`ItemLayer`]s that extend item facts and
//!   updates without dropping what earlier layers produced
//!
//! # Example
//!
//! ```rust
//! use slotkit_component::{CalcClassLayer, Component, SelectedIndexLayer};
//! use slotkit_core::StatePatch;
//! use slotkit_dom::{Element, Node, ShadowRoot, Slot};
//!
//! let first = Element::new("div");
//! let second = Element::new("div");
//! let slot = Slot::unnamed().with_assigned(vec![first.clone().into(), second.clone().into()]);
//!
//! let list = Component::builder("my-list")
//!     .state("selectedIndex", 0)
//!     .shadow_root(ShadowRoot::new().with_slot(slot))
//!     .layer(SelectedIndexLayer::new())
//!     .layer(CalcClassLayer::new("selected", "selected"))
//!     .build();
//! list.scheduler().run_until_idle();
//! assert!(first.has_class("selected"));
//!
//! list.set_state(StatePatch::new().set("selectedIndex", 1));
//! list.scheduler().run_until_idle();
//! assert!(!first.has_class("selected"));
//! assert!(second.has_class("selected"));
//! ```

pub mod component;
pub mod items;
pub mod layer;
pub mod layers;
pub mod slot_content;

pub use component::{Component, ComponentBuilder, RenderedListener};
pub use items::{default_items_for_state, ItemProjection, ItemsForState};
pub use layer::{ItemCalcs, ItemLayer, Items, LayerChain, LayerChainBuilder, LayerContext};
pub use layers::{CalcAttributeLayer, CalcClassLayer, SelectedIndexLayer};
pub use slot_content::{ContentHandler, ContentObserver};
