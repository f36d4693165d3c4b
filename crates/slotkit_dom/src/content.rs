//! Helpers for working with projected content

use crate::node::{Element, Node};

/// Tags that never count as substantive content
pub const AUXILIARY_TAGS: [&str; 5] = ["link", "script", "slot", "style", "template"];

/// Check if a node is a substantive element
pub fn is_substantive(node: &Node) -> bool {
    match node {
        Node::Element(element) => {
            let tag = element.tag();
            !AUXILIARY_TAGS.contains(&tag.as_str())
        }
        _ => false,
    }
}

/// The elements of `nodes` that carry meaning for a component.
///
/// Text nodes (whitespace or not), comments, nested slots and auxiliary
/// elements such as `<style>` or `<template>` are dropped.
pub fn substantive_elements(nodes: &[Node]) -> Vec<Element> {
    nodes
        .iter()
        .filter(|node| is_substantive(node))
        .filter_map(Node::as_element)
        .cloned()
        .collect()
}

/// Concatenated text of the given nodes, descending into elements
pub fn text_from_content(nodes: &[Node]) -> String {
    let mut text = String::new();
    for node in nodes {
        match node {
            Node::Text(value) => text.push_str(value),
            Node::Element(element) => text.push_str(&element.text_content()),
            Node::Comment(_) | Node::Slot(_) => {}
        }
    }
    text
}

/// Check if two sequences hold the same nodes, by identity, in the same order
pub fn same_nodes(a: &[Node], b: &[Node]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_node(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substantive_elements_filters_noise() {
        let one = Element::new("div");
        let two = Element::new("P");
        let nodes = vec![
            Node::text("\n  "),
            one.clone().into(),
            Node::comment("note"),
            Element::new("style").into(),
            Node::text("loose text"),
            Element::new("template").into(),
            two.clone().into(),
        ];

        assert_eq!(substantive_elements(&nodes), vec![one, two]);
    }

    #[test]
    fn test_substantive_elements_of_empty_content() {
        assert!(substantive_elements(&[]).is_empty());
    }

    #[test]
    fn test_text_from_content() {
        let nodes = vec![
            Node::text("a"),
            Node::comment("skip"),
            Element::new("span").with_text("b").into(),
        ];
        assert_eq!(text_from_content(&nodes), "ab");
    }

    #[test]
    fn test_same_nodes() {
        let el: Node = Element::new("div").into();
        let text = Node::text("x");
        let a = vec![el.clone(), text.clone()];

        assert!(same_nodes(&a, &[el.clone(), text.clone()]));
        assert!(!same_nodes(&a, &[text.clone(), el.clone()]));
        assert!(!same_nodes(&a, &[el, Node::text("x")]));
        assert!(!same_nodes(&a, &[]));
    }
}
