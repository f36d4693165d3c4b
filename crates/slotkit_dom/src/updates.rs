//! Update descriptions and the update applier
//!
//! An [`UpdateDescription`] states the attributes, classes and inline style an
//! element should have. [`apply`] patches exactly the keys it mentions and
//! leaves everything else on the element alone, so state set by other parties
//! survives. Applying the same description twice yields the same element state
//! as applying it once.

use indexmap::IndexMap;

use crate::node::{Element, Node};

/// Desired value of an attribute
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    /// Set the attribute to this text
    Text(String),
    /// Set the attribute with an empty value (a boolean attribute)
    Present,
    /// Remove the attribute
    Absent,
}

impl AttrValue {
    /// Text the attribute will hold, or `None` if it will be absent
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            AttrValue::Present => Some(""),
            AttrValue::Absent => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(present: bool) -> Self {
        if present {
            AttrValue::Present
        } else {
            AttrValue::Absent
        }
    }
}

impl From<&str> for AttrValue {
    fn from(text: &str) -> Self {
        AttrValue::Text(text.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(text: String) -> Self {
        AttrValue::Text(text)
    }
}

impl<T: Into<String>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttrValue::Absent, |text| AttrValue::Text(text.into()))
    }
}

/// Desired attribute, class, style and child changes for one element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateDescription {
    pub attributes: IndexMap<String, AttrValue>,
    /// `true` adds the class, `false` removes it
    pub classes: IndexMap<String, bool>,
    /// `None` or an empty value removes the property
    pub style: IndexMap<String, Option<String>>,
    /// Replaces the element's children when present
    pub child_nodes: Option<Vec<Node>>,
}

impl UpdateDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn class(mut self, name: &str, present: bool) -> Self {
        self.classes.insert(name.to_string(), present);
        self
    }

    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style.insert(property.to_string(), Some(value.into()));
        self
    }

    pub fn clear_style(mut self, property: &str) -> Self {
        self.style.insert(property.to_string(), None);
        self
    }

    pub fn child_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.child_nodes = Some(nodes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.classes.is_empty()
            && self.style.is_empty()
            && self.child_nodes.is_none()
    }

    /// Merge `other` on top of this description, key by key.
    ///
    /// Keys only in `self` are kept; keys in `other` override.
    pub fn merge(&mut self, other: &UpdateDescription) {
        for (name, value) in &other.attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
        for (name, present) in &other.classes {
            self.classes.insert(name.clone(), *present);
        }
        for (property, value) in &other.style {
            self.style.insert(property.clone(), value.clone());
        }
        if let Some(nodes) = &other.child_nodes {
            self.child_nodes = Some(nodes.clone());
        }
    }

    /// Consuming form of [`merge`](Self::merge)
    pub fn merged(mut self, other: &UpdateDescription) -> Self {
        self.merge(other);
        self
    }
}

/// Patch `element` to match `updates`
pub fn apply(element: &Element, updates: &UpdateDescription) {
    for (name, value) in &updates.attributes {
        match value.as_text() {
            Some(text) => element.set_attribute(name, text),
            None => {
                element.remove_attribute(name);
            }
        }
    }

    for (name, present) in &updates.classes {
        element.toggle_class(name, *present);
    }

    for (property, value) in &updates.style {
        match value.as_deref() {
            Some(value) if !value.is_empty() => element.set_style_property(property, value),
            _ => {
                element.remove_style_property(property);
            }
        }
    }

    if let Some(nodes) = &updates.child_nodes {
        element.set_children(nodes.clone());
    }
}

/// Read an element's present attributes, classes and style as a description.
///
/// `class` and `style` appear only under `classes` and `style`. Children are
/// not captured.
pub fn current(element: &Element) -> UpdateDescription {
    UpdateDescription {
        attributes: element
            .attributes()
            .into_iter()
            .map(|(name, value)| (name, AttrValue::Text(value)))
            .collect(),
        classes: element
            .classes()
            .into_iter()
            .map(|class| (class, true))
            .collect(),
        style: element
            .style()
            .into_iter()
            .map(|(property, value)| (property, Some(value)))
            .collect(),
        child_nodes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_and_removes() {
        let el = Element::new("li")
            .with_attribute("data-x", "1")
            .with_class("old")
            .with_style("color", "red");

        let update = UpdateDescription::new()
            .attribute("data-x", AttrValue::Absent)
            .attribute("aria-hidden", true)
            .attribute("title", "Item")
            .class("old", false)
            .class("selected", true)
            .clear_style("color")
            .style("width", "10px");
        apply(&el, &update);

        assert!(!el.has_attribute("data-x"));
        assert_eq!(el.attribute("aria-hidden").as_deref(), Some(""));
        assert_eq!(el.attribute("title").as_deref(), Some("Item"));
        assert_eq!(el.classes(), vec!["selected".to_string()]);
        assert_eq!(el.style_property("color"), None);
        assert_eq!(el.style_property("width").as_deref(), Some("10px"));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let el = Element::new("li").with_attribute("data-x", "1");
        let update = UpdateDescription::new()
            .attribute("data-x", false)
            .attribute("role", "option")
            .class("selected", true)
            .style("opacity", "0.5");

        apply(&el, &update);
        let once = current(&el);
        apply(&el, &update);
        assert_eq!(current(&el), once);
    }

    #[test]
    fn test_apply_leaves_unmentioned_state_alone() {
        let el = Element::new("li")
            .with_attribute("id", "keep")
            .with_class("host-set")
            .with_style("margin", "4px");

        apply(&el, &UpdateDescription::new().class("selected", true));

        assert_eq!(el.attribute("id").as_deref(), Some("keep"));
        assert!(el.has_class("host-set"));
        assert_eq!(el.style_property("margin").as_deref(), Some("4px"));
    }

    #[test]
    fn test_removing_missing_attribute_is_harmless() {
        let el = Element::new("li");
        apply(
            &el,
            &UpdateDescription::new()
                .attribute("data-missing", None::<String>)
                .class("missing", false),
        );
        assert!(current(&el).is_empty());
    }

    #[test]
    fn test_empty_style_value_removes_property() {
        let el = Element::new("li").with_style("color", "red");
        apply(&el, &UpdateDescription::new().style("color", ""));
        assert_eq!(el.style_property("color"), None);
    }

    #[test]
    fn test_child_nodes_replace_children() {
        let el = Element::new("ul").with_text("old");
        apply(
            &el,
            &UpdateDescription::new().child_nodes(vec![Node::text("new")]),
        );
        assert_eq!(el.text_content(), "new");
    }

    #[test]
    fn test_merge_overrides_per_key() {
        let base = UpdateDescription::new()
            .attribute("role", "option")
            .attribute("title", "a")
            .class("selected", false);
        let top = UpdateDescription::new()
            .attribute("title", "b")
            .class("selected", true)
            .style("color", "blue");

        let merged = base.merged(&top);
        assert_eq!(merged.attributes["role"], AttrValue::Text("option".into()));
        assert_eq!(merged.attributes["title"], AttrValue::Text("b".into()));
        assert_eq!(merged.classes["selected"], true);
        assert_eq!(merged.style["color"].as_deref(), Some("blue"));
    }

    #[test]
    fn test_current_splits_class_and_style() {
        let el = Element::new("li")
            .with_attribute("data-x", "1")
            .with_attribute("class", "a b")
            .with_attribute("style", "color: red");
        let snapshot = current(&el);

        assert_eq!(snapshot.attributes.len(), 1);
        assert_eq!(snapshot.attributes["data-x"], AttrValue::Text("1".into()));
        assert_eq!(snapshot.classes.len(), 2);
        assert_eq!(snapshot.style["color"].as_deref(), Some("red"));
    }

    #[test]
    fn test_current_round_trips_through_apply() {
        let source = Element::new("li")
            .with_attribute("data-x", "1")
            .with_class("a")
            .with_style("color", "red");
        let copy = Element::new("li");

        apply(&copy, &current(&source));
        assert_eq!(current(&copy), current(&source));
    }
}
