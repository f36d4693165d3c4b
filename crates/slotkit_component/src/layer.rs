//! Composable item layers
//!
//! A component's per-item behavior is an ordered chain of [`ItemLayer`]s, base
//! layers first. For every item the chain folds each layer's contribution into
//! one [`ItemCalcs`] record and one [`UpdateDescription`].
//!
//! Layers extend, they never drop: [`ItemCalcs`] has no way to remove a fact,
//! and a layer's `item_updates` returns only its own delta, which the chain
//! merges key by key over what earlier layers produced.

use std::collections::BTreeMap;
use std::rc::Rc;

use slotkit_core::{State, Value};
use slotkit_dom::{Content, Element, UpdateDescription};
use tracing::warn;

/// A component's current items: the substantive elements of its content
pub type Items = Rc<[Element]>;

/// What a layer can see during a render or an items computation
#[derive(Clone, Copy, Debug)]
pub struct LayerContext<'a> {
    pub state: &'a State,
    pub content: Option<&'a Content>,
    /// What changed since the previous render
    pub changed: &'a [String],
    /// Whether the current transition came from a host-observable action
    pub raise_change_events: bool,
}

/// Facts about one item derived from component state during a render.
///
/// `index` is always present. Other facts are added by layers and can be
/// overwritten by later layers, but not removed.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemCalcs {
    index: usize,
    facts: BTreeMap<String, Value>,
}

impl ItemCalcs {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            facts: BTreeMap::new(),
        }
    }

    /// The item's 0-based position in content order
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, fact: &str) -> Option<&Value> {
        self.facts.get(fact)
    }

    /// A boolean fact; absent or non-boolean facts read as `false`
    pub fn flag(&self, fact: &str) -> bool {
        matches!(self.facts.get(fact), Some(Value::Bool(true)))
    }

    /// Add a fact or overwrite one set by an earlier layer
    pub fn set(&mut self, fact: impl Into<String>, value: impl Into<Value>) {
        let fact = fact.into();
        if fact == "index" {
            warn!("Item layers cannot overwrite the index fact");
            return;
        }
        self.facts.insert(fact, value.into());
    }

    pub fn with(mut self, fact: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(fact, value);
        self
    }

    pub fn facts(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One layer of per-item behavior. Every method defaults to contributing nothing.
pub trait ItemLayer {
    /// Name used in logs
    fn name(&self) -> &'static str {
        "layer"
    }

    /// Supply the item list directly, bypassing content-derived items
    fn items(&self, _ctx: &LayerContext<'_>) -> Option<Items> {
        None
    }

    /// Add facts about `item` on top of what earlier layers computed
    fn item_calcs(&self, _ctx: &LayerContext<'_>, _item: &Element, _calcs: &mut ItemCalcs) {}

    /// This layer's desired changes for `item`.
    ///
    /// `original` is the item as first observed; `prior` is what earlier layers want.
    fn item_updates(
        &self,
        _ctx: &LayerContext<'_>,
        _item: &Element,
        _calcs: &ItemCalcs,
        _original: &UpdateDescription,
        _prior: &UpdateDescription,
    ) -> UpdateDescription {
        UpdateDescription::default()
    }

    /// Non-item render work. Runs before the item pass.
    fn render(&self, _ctx: &LayerContext<'_>) {}

    /// Runs after the render completes
    fn rendered(&self, _ctx: &LayerContext<'_>) {}
}

/// Ordered list of layers, base first
#[derive(Default)]
pub struct LayerChain {
    layers: Vec<Box<dyn ItemLayer>>,
}

impl LayerChain {
    pub fn builder() -> LayerChainBuilder {
        LayerChainBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    /// Items supplied by a layer. The outermost layer that supplies items wins.
    pub fn items(&self, ctx: &LayerContext<'_>) -> Option<Items> {
        self.layers.iter().rev().find_map(|layer| layer.items(ctx))
    }

    pub fn item_calcs(&self, ctx: &LayerContext<'_>, item: &Element, index: usize) -> ItemCalcs {
        let mut calcs = ItemCalcs::new(index);
        for layer in &self.layers {
            layer.item_calcs(ctx, item, &mut calcs);
        }
        calcs
    }

    pub fn item_updates(
        &self,
        ctx: &LayerContext<'_>,
        item: &Element,
        calcs: &ItemCalcs,
        original: &UpdateDescription,
    ) -> UpdateDescription {
        let mut updates = UpdateDescription::default();
        for layer in &self.layers {
            let delta = layer.item_updates(ctx, item, calcs, original, &updates);
            updates.merge(&delta);
        }
        updates
    }

    pub fn render(&self, ctx: &LayerContext<'_>) {
        for layer in &self.layers {
            layer.render(ctx);
        }
    }

    pub fn rendered(&self, ctx: &LayerContext<'_>) {
        for layer in &self.layers {
            layer.rendered(ctx);
        }
    }
}

/// Builder for [`LayerChain`]
#[derive(Default)]
pub struct LayerChainBuilder {
    layers: Vec<Box<dyn ItemLayer>>,
}

impl LayerChainBuilder {
    /// Add a layer on top of those already added
    pub fn layer<L: ItemLayer + 'static>(mut self, layer: L) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn boxed(mut self, layer: Box<dyn ItemLayer>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> LayerChain {
        LayerChain {
            layers: self.layers,
        }
    }
}
