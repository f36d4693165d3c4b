//! Reusable item layers
//!
//! Small building blocks for list-like components: derive a `selected` fact
//! from state, then reflect boolean facts onto items as classes or attributes.

use slotkit_dom::{Element, UpdateDescription};

use crate::layer::{ItemCalcs, ItemLayer, LayerContext};

/// Marks the item whose index matches a state key.
///
/// Reads `selectedIndex` and sets the `selected` fact by default. A missing,
/// negative or non-integer index selects nothing.
#[derive(Clone, Debug)]
pub struct SelectedIndexLayer {
    state_key: String,
    fact: String,
}

impl SelectedIndexLayer {
    pub fn new() -> Self {
        Self {
            state_key: "selectedIndex".to_string(),
            fact: "selected".to_string(),
        }
    }

    pub fn state_key(mut self, key: impl Into<String>) -> Self {
        self.state_key = key.into();
        self
    }

    pub fn fact(mut self, fact: impl Into<String>) -> Self {
        self.fact = fact.into();
        self
    }
}

impl Default for SelectedIndexLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemLayer for SelectedIndexLayer {
    fn name(&self) -> &'static str {
        "selected-index"
    }

    fn item_calcs(&self, ctx: &LayerContext<'_>, _item: &Element, calcs: &mut ItemCalcs) {
        let selected = ctx
            .state
            .get_as::<usize>(&self.state_key)
            .is_some_and(|index| index == calcs.index());
        calcs.set(self.fact.as_str(), selected);
    }
}

/// Toggles a class from a boolean fact
#[derive(Clone, Debug)]
pub struct CalcClassLayer {
    fact: String,
    class: String,
}

impl CalcClassLayer {
    pub fn new(fact: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            fact: fact.into(),
            class: class.into(),
        }
    }
}

impl ItemLayer for CalcClassLayer {
    fn name(&self) -> &'static str {
        "calc-class"
    }

    fn item_updates(
        &self,
        _ctx: &LayerContext<'_>,
        _item: &Element,
        calcs: &ItemCalcs,
        _original: &UpdateDescription,
        _prior: &UpdateDescription,
    ) -> UpdateDescription {
        UpdateDescription::new().class(&self.class, calcs.flag(&self.fact))
    }
}

/// Reflects a boolean fact onto an attribute.
///
/// By default the attribute is present or absent. With [`as_text`](Self::as_text)
/// it always holds `"true"` or `"false"`, as ARIA state attributes expect.
#[derive(Clone, Debug)]
pub struct CalcAttributeLayer {
    fact: String,
    attribute: String,
    as_text: bool,
}

impl CalcAttributeLayer {
    pub fn new(fact: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            fact: fact.into(),
            attribute: attribute.into(),
            as_text: false,
        }
    }

    pub fn as_text(mut self) -> Self {
        self.as_text = true;
        self
    }
}

impl ItemLayer for CalcAttributeLayer {
    fn name(&self) -> &'static str {
        "calc-attribute"
    }

    fn item_updates(
        &self,
        _ctx: &LayerContext<'_>,
        _item: &Element,
        calcs: &ItemCalcs,
        _original: &UpdateDescription,
        _prior: &UpdateDescription,
    ) -> UpdateDescription {
        let on = calcs.flag(&self.fact);
        if self.as_text {
            UpdateDescription::new().attribute(&self.attribute, on.to_string())
        } else {
            UpdateDescription::new().attribute(&self.attribute, on)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerChain;
    use slotkit_core::State;
    use slotkit_dom::AttrValue;

    fn ctx(state: &State) -> LayerContext<'_> {
        LayerContext {
            state,
            content: None,
            changed: &[],
            raise_change_events: false,
        }
    }

    #[test]
    fn test_selected_index_marks_matching_item() {
        let chain = LayerChain::builder().layer(SelectedIndexLayer::new()).build();
        let state: State = [("selectedIndex", 2)].into_iter().collect();
        let item = Element::new("li");

        assert!(chain.item_calcs(&ctx(&state), &item, 2).flag("selected"));
        assert!(!chain.item_calcs(&ctx(&state), &item, 1).flag("selected"));
    }

    #[test]
    fn test_negative_index_selects_nothing() {
        let chain = LayerChain::builder().layer(SelectedIndexLayer::new()).build();
        let state: State = [("selectedIndex", -1)].into_iter().collect();

        let calcs = chain.item_calcs(&ctx(&state), &Element::new("li"), 0);
        assert_eq!(calcs.get("selected"), Some(&false.into()));
    }

    #[test]
    fn test_custom_state_key_and_fact() {
        let layer = SelectedIndexLayer::new().state_key("currentIndex").fact("current");
        let chain = LayerChain::builder().layer(layer).build();
        let state: State = [("currentIndex", 0)].into_iter().collect();

        assert!(chain.item_calcs(&ctx(&state), &Element::new("li"), 0).flag("current"));
    }

    #[test]
    fn test_class_and_attribute_follow_fact() {
        let chain = LayerChain::builder()
            .layer(SelectedIndexLayer::new())
            .layer(CalcClassLayer::new("selected", "selected"))
            .layer(CalcAttributeLayer::new("selected", "aria-selected").as_text())
            .layer(CalcAttributeLayer::new("selected", "data-current"))
            .build();
        let state: State = [("selectedIndex", 0)].into_iter().collect();
        let item = Element::new("li");

        let calcs = chain.item_calcs(&ctx(&state), &item, 0);
        let updates = chain.item_updates(&ctx(&state), &item, &calcs, &UpdateDescription::default());
        assert_eq!(updates.classes["selected"], true);
        assert_eq!(updates.attributes["aria-selected"], AttrValue::Text("true".into()));
        assert_eq!(updates.attributes["data-current"], AttrValue::Present);

        let calcs = chain.item_calcs(&ctx(&state), &item, 1);
        let updates = chain.item_updates(&ctx(&state), &item, &calcs, &UpdateDescription::default());
        assert_eq!(updates.classes["selected"], false);
        assert_eq!(updates.attributes["aria-selected"], AttrValue::Text("false".into()));
        assert_eq!(updates.attributes["data-current"], AttrValue::Absent);
    }
}
