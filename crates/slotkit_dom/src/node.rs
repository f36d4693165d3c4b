//! Elements and nodes
//!
//! Elements are shared handles: cloning an [`Element`] yields another handle to
//! the same element, and equality is identity. The host owns elements; a
//! component only ever holds references to them.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::{IndexMap, IndexSet};

use crate::slot::Slot;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of an element, unique for the life of the process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct ElementData {
    tag: String,
    attributes: IndexMap<String, String>,
    classes: IndexSet<String>,
    style: IndexMap<String, String>,
    children: Vec<Node>,
}

/// Handle to a host element
#[derive(Clone)]
pub struct Element {
    id: ElementId,
    data: Rc<RefCell<ElementData>>,
}

impl Element {
    /// Create an element. Tag names are stored lowercase.
    pub fn new(tag: &str) -> Self {
        Self {
            id: ElementId::next(),
            data: Rc::new(RefCell::new(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes: IndexMap::new(),
                classes: IndexSet::new(),
                style: IndexMap::new(),
                children: Vec::new(),
            })),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn tag(&self) -> String {
        self.data.borrow().tag.clone()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.data.borrow().tag.eq_ignore_ascii_case(tag)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Read an attribute. `class` and `style` are serialized from the class list and style map.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let data = self.data.borrow();
        match name {
            "class" if !data.classes.is_empty() => Some(
                data.classes
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            "style" if !data.style.is_empty() => Some(
                data.style
                    .iter()
                    .map(|(prop, value)| format!("{prop}: {value};"))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            "class" | "style" => None,
            _ => data.attributes.get(name).cloned(),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute. `class` replaces the class list; `style` replaces the style map.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut data = self.data.borrow_mut();
        match name {
            "class" => {
                data.classes = value.split_whitespace().map(str::to_string).collect();
            }
            "style" => {
                data.style = parse_style(&value);
            }
            _ => {
                data.attributes.insert(name.to_string(), value);
            }
        }
    }

    /// Remove an attribute. Returns whether it was present; missing attributes are not an error.
    pub fn remove_attribute(&self, name: &str) -> bool {
        let mut data = self.data.borrow_mut();
        match name {
            "class" => {
                let had = !data.classes.is_empty();
                data.classes.clear();
                had
            }
            "style" => {
                let had = !data.style.is_empty();
                data.style.clear();
                had
            }
            _ => data.attributes.shift_remove(name).is_some(),
        }
    }

    /// Plain attributes in insertion order, excluding `class` and `style`
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.data
            .borrow()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // =========================================================================
    // Classes
    // =========================================================================

    pub fn classes(&self) -> Vec<String> {
        self.data.borrow().classes.iter().cloned().collect()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.data.borrow().classes.contains(class)
    }

    pub fn add_class(&self, class: &str) {
        self.data.borrow_mut().classes.insert(class.to_string());
    }

    pub fn remove_class(&self, class: &str) -> bool {
        self.data.borrow_mut().classes.shift_remove(class)
    }

    /// Add or remove a class
    pub fn toggle_class(&self, class: &str, present: bool) {
        if present {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    // =========================================================================
    // Inline style
    // =========================================================================

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.data.borrow().style.get(property).cloned()
    }

    /// Set an inline style property. An empty value removes it.
    pub fn set_style_property(&self, property: &str, value: impl Into<String>) {
        let value = value.into();
        let mut data = self.data.borrow_mut();
        if value.is_empty() {
            data.style.shift_remove(property);
        } else {
            data.style.insert(property.to_string(), value);
        }
    }

    pub fn remove_style_property(&self, property: &str) -> bool {
        self.data.borrow_mut().style.shift_remove(property).is_some()
    }

    pub fn style(&self) -> Vec<(String, String)> {
        self.data
            .borrow()
            .style
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // =========================================================================
    // Children
    // =========================================================================

    pub fn children(&self) -> Vec<Node> {
        self.data.borrow().children.clone()
    }

    pub fn set_children(&self, children: Vec<Node>) {
        self.data.borrow_mut().children = children;
    }

    pub fn append_child(&self, child: impl Into<Node>) {
        self.data.borrow_mut().children.push(child.into());
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in self.data.borrow().children.iter() {
            match child {
                Node::Text(value) => text.push_str(value),
                Node::Element(element) => text.push_str(&element.text_content()),
                Node::Comment(_) | Node::Slot(_) => {}
            }
        }
        text
    }

    // =========================================================================
    // Builders
    // =========================================================================

    pub fn with_attribute(self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_style(self, property: &str, value: impl Into<String>) -> Self {
        self.set_style_property(property, value);
        self
    }

    pub fn with_child(self, child: impl Into<Node>) -> Self {
        self.append_child(child);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.append_child(Node::text(text));
        self
    }

    /// Check if two handles refer to the same element
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

fn parse_style(source: &str) -> IndexMap<String, String> {
    source
        .split(';')
        .filter_map(|declaration| {
            let (prop, value) = declaration.split_once(':')?;
            let (prop, value) = (prop.trim(), value.trim());
            (!prop.is_empty() && !value.is_empty()).then(|| (prop.to_string(), value.to_string()))
        })
        .collect()
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Element")
            .field("id", &self.id.0)
            .field("tag", &data.tag)
            .field("attributes", &data.attributes)
            .field("classes", &data.classes)
            .field("style", &data.style)
            .finish()
    }
}

/// A node that can be projected into a slot
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Rc<str>),
    Comment(Rc<str>),
    /// A nested slot, expanded when content is flattened
    Slot(Slot),
}

impl Node {
    pub fn text(value: &str) -> Self {
        Node::Text(Rc::from(value))
    }

    pub fn comment(value: &str) -> Self {
        Node::Comment(Rc::from(value))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Identity comparison: the same element, slot, or text/comment allocation
    pub fn same_node(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Element(a), Node::Element(b)) => a.ptr_eq(b),
            (Node::Text(a), Node::Text(b)) | (Node::Comment(a), Node::Comment(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Node::Slot(a), Node::Slot(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Slot> for Node {
    fn from(slot: Slot) -> Self {
        Node::Slot(slot)
    }
}

/// A frozen sequence of projected nodes. Identity is the allocation (`Rc::ptr_eq`).
pub type Content = Rc<[Node]>;
