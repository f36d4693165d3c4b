//! Item projection
//!
//! Derives a component's items from its content and pushes per-item updates
//! onto them during render.
//!
//! - Items are memoized by content identity: until the content sequence is
//!   replaced, `items` returns the same frozen `Rc<[Element]>`.
//! - Each item's original attributes, classes and style are captured the first
//!   time a render touches it and never again. Updates are always computed
//!   against that baseline, so repeated renders cannot drift.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotkit_dom::{substantive_elements, updates, Content, Element, ElementId, UpdateDescription};
use tracing::trace;

use crate::layer::{Items, LayerChain, LayerContext};

/// Computes items from content
pub type ItemsForState = Box<dyn Fn(Option<&Content>) -> Option<Items>>;

/// The substantive elements of `content`, or `None` without content
pub fn default_items_for_state(content: Option<&Content>) -> Option<Items> {
    content.map(|content| Rc::from(substantive_elements(content)))
}

struct ItemsMemo {
    content: Option<Content>,
    items: Option<Items>,
}

/// Per-component item state: the items memo and the original snapshots
pub struct ItemProjection {
    items_for_state: ItemsForState,
    memo: RefCell<Option<ItemsMemo>>,
    // Entries are never released, even after the item leaves the content.
    originals: RefCell<FxHashMap<ElementId, Rc<UpdateDescription>>>,
}

impl ItemProjection {
    pub fn new() -> Self {
        Self::with_items_for_state(Box::new(default_items_for_state))
    }

    pub fn with_items_for_state(items_for_state: ItemsForState) -> Self {
        Self {
            items_for_state,
            memo: RefCell::new(None),
            originals: RefCell::new(FxHashMap::default()),
        }
    }

    /// Current items.
    ///
    /// Items supplied by a layer are returned as-is and skip the memo.
    pub fn items(&self, ctx: &LayerContext<'_>, layers: &LayerChain) -> Option<Items> {
        if let Some(items) = layers.items(ctx) {
            return Some(items);
        }

        if let Some(memo) = self.memo.borrow().as_ref() {
            if same_content(memo.content.as_ref(), ctx.content) {
                return memo.items.clone();
            }
        }

        let items = (self.items_for_state)(ctx.content);
        trace!(
            items = items.as_ref().map_or(0, |items| items.len()),
            "items recomputed"
        );
        *self.memo.borrow_mut() = Some(ItemsMemo {
            content: ctx.content.cloned(),
            items: items.clone(),
        });
        items
    }

    /// The item's original snapshot, captured now if this is its first render
    pub fn original(&self, item: &Element) -> Rc<UpdateDescription> {
        self.originals
            .borrow_mut()
            .entry(item.id())
            .or_insert_with(|| {
                trace!(item = item.id().raw(), "capture original snapshot");
                Rc::new(updates::current(item))
            })
            .clone()
    }

    /// The item's original snapshot, if one has been captured
    pub fn original_snapshot(&self, item: &Element) -> Option<Rc<UpdateDescription>> {
        self.originals.borrow().get(&item.id()).cloned()
    }

    /// Number of items with a captured snapshot
    pub fn snapshot_count(&self) -> usize {
        self.originals.borrow().len()
    }

    /// Compute and apply updates for every item. Returns the number of items patched.
    pub fn render(&self, ctx: &LayerContext<'_>, layers: &LayerChain, items: Option<&Items>) -> usize {
        let Some(items) = items else {
            return 0;
        };

        for (index, item) in items.iter().enumerate() {
            let original = self.original(item);
            let calcs = layers.item_calcs(ctx, item, index);
            let update = layers.item_updates(ctx, item, &calcs, &original);
            updates::apply(item, &update);
        }
        items.len()
    }
}

impl Default for ItemProjection {
    fn default() -> Self {
        Self::new()
    }
}

fn same_content(a: Option<&Content>, b: Option<&Content>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{ItemCalcs, ItemLayer};
    use slotkit_core::State;
    use slotkit_dom::Node;

    fn ctx<'a>(state: &'a State, content: Option<&'a Content>) -> LayerContext<'a> {
        LayerContext {
            state,
            content,
            changed: &[],
            raise_change_events: false,
        }
    }

    fn content_of(elements: &[Element]) -> Content {
        let mut nodes = vec![Node::text(" ")];
        nodes.extend(elements.iter().cloned().map(Node::from));
        Rc::from(nodes)
    }

    #[test]
    fn test_items_memoized_by_content_identity() {
        let projection = ItemProjection::new();
        let layers = LayerChain::default();
        let state = State::new();
        let a = Element::new("div");
        let content = content_of(&[a.clone()]);

        let first = projection.items(&ctx(&state, Some(&content)), &layers).unwrap();
        let second = projection.items(&ctx(&state, Some(&content)), &layers).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(&first[..], &[a.clone()]);

        // Equal nodes in a new sequence still count as new content
        let replaced = content_of(&[a]);
        let third = projection.items(&ctx(&state, Some(&replaced)), &layers).unwrap();
        assert!(!Rc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_no_content_yields_no_items() {
        let projection = ItemProjection::new();
        let state = State::new();
        assert!(projection
            .items(&ctx(&state, None), &LayerChain::default())
            .is_none());
    }

    #[test]
    fn test_empty_content_yields_empty_items() {
        let projection = ItemProjection::new();
        let state = State::new();
        let content: Content = Rc::from(vec![Node::comment("only a comment")]);

        let items = projection
            .items(&ctx(&state, Some(&content)), &LayerChain::default())
            .unwrap();
        assert!(items.is_empty());
    }

    struct FixedItems(Items);

    impl ItemLayer for FixedItems {
        fn items(&self, _ctx: &LayerContext<'_>) -> Option<Items> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn test_layer_items_take_precedence() {
        let fixed: Items = Rc::from(vec![Element::new("x")]);
        let layers = LayerChain::builder().layer(FixedItems(fixed.clone())).build();
        let projection = ItemProjection::new();
        let state = State::new();
        let content = content_of(&[Element::new("div"), Element::new("div")]);

        let items = projection.items(&ctx(&state, Some(&content)), &layers).unwrap();
        assert!(Rc::ptr_eq(&items, &fixed));
    }

    struct DropX;

    impl ItemLayer for DropX {
        fn item_updates(
            &self,
            _ctx: &LayerContext<'_>,
            _item: &Element,
            _calcs: &ItemCalcs,
            _original: &UpdateDescription,
            _prior: &UpdateDescription,
        ) -> UpdateDescription {
            UpdateDescription::new().attribute("data-x", false)
        }
    }

    #[test]
    fn test_original_captured_once() {
        let projection = ItemProjection::new();
        let layers = LayerChain::builder().layer(DropX).build();
        let state = State::new();
        let item = Element::new("li").with_attribute("data-x", "1");
        let items: Items = Rc::from(vec![item.clone()]);

        assert!(projection.original_snapshot(&item).is_none());
        projection.render(&ctx(&state, None), &layers, Some(&items));
        projection.render(&ctx(&state, None), &layers, Some(&items));

        assert!(!item.has_attribute("data-x"));
        let original = projection.original_snapshot(&item).unwrap();
        assert_eq!(original.attributes["data-x"].as_text(), Some("1"));
        assert_eq!(projection.snapshot_count(), 1);
    }

    #[test]
    fn test_custom_items_for_state() {
        let projection = ItemProjection::with_items_for_state(Box::new(
            |content: Option<&Content>| -> Option<Items> {
                content.map(|content| {
                    let lis: Vec<Element> = content
                        .iter()
                        .filter_map(Node::as_element)
                        .filter(|el| el.has_tag("li"))
                        .cloned()
                        .collect();
                    Rc::from(lis)
                })
            },
        ));
        let state = State::new();
        let li = Element::new("li");
        let content = content_of(&[Element::new("div"), li.clone()]);

        let items = projection
            .items(&ctx(&state, Some(&content)), &LayerChain::default())
            .unwrap();
        assert_eq!(&items[..], &[li]);
    }
}
