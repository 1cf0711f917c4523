//! Semantic markup tree produced from a Google Doc.
//!
//! The JSON shape follows HAST (`type`, `tagName`, `properties`, `children`)
//! so site templates that already understand HAST can walk it.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Root { children: Vec<Node> },
    Element(Element),
    Text { value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub tag_name: String,
    pub properties: Properties,
    pub children: Vec<Node>,
}

/// Element attributes, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Sets `key`, replacing any existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(existing) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Element {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            properties: Properties::default(),
            children: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn into_node(self) -> Node {
        Node::Element(self)
    }
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn root(children: Vec<Node>) -> Self {
        Node::Root { children }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root { children } => children,
            Node::Element(el) => &el.children,
            Node::Text { .. } => &[],
        }
    }

    /// Collects the `src` slot of every `img` element, depth-first, in
    /// document order.
    pub fn image_sources_mut(&mut self) -> Vec<&mut String> {
        let mut slots = Vec::new();
        collect_image_sources(self, &mut slots);
        slots
    }

    /// Every `img` source in document order.
    pub fn image_sources(&self) -> Vec<&str> {
        let mut sources = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Node::Element(el) = node {
                if el.tag_name == "img" {
                    if let Some(src) = el.properties.get("src") {
                        sources.push(src);
                    }
                }
            }
            stack.extend(node.children().iter().rev());
        }
        sources
    }
}

fn collect_image_sources<'a>(node: &'a mut Node, slots: &mut Vec<&'a mut String>) {
    match node {
        Node::Root { children } => {
            for child in children.iter_mut() {
                collect_image_sources(child, slots);
            }
        }
        Node::Element(el) => {
            if el.tag_name == "img" {
                if let Some(src) = el.properties.get_mut("src") {
                    slots.push(src);
                }
            }
            for child in el.children.iter_mut() {
                collect_image_sources(child, slots);
            }
        }
        Node::Text { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(src: &str) -> Node {
        Element::new("img").with_property("src", src).into_node()
    }

    #[test]
    fn test_properties_keep_insertion_order_and_replace_in_place() {
        let mut props = Properties::default();
        props.set("src", "a.png");
        props.set("alt", "A");
        props.set("src", "b.png");

        let pairs: Vec<_> = props.iter().collect();
        assert_eq!(pairs, vec![("src", "b.png"), ("alt", "A")]);
    }

    #[test]
    fn test_image_sources_mut_visits_nested_images_in_order() {
        let mut tree = Node::root(vec![
            Element::new("p").with_children(vec![img("one")]).into_node(),
            Element::new("table")
                .with_children(vec![Element::new("td")
                    .with_children(vec![img("two"), Node::text("caption")])
                    .into_node()])
                .into_node(),
            img("three"),
        ]);

        for slot in tree.image_sources_mut() {
            slot.insert_str(0, "/img/");
        }

        assert_eq!(tree.image_sources(), vec!["/img/one", "/img/two", "/img/three"]);
    }

    #[test]
    fn test_serializes_like_hast() {
        let tree = Node::root(vec![Element::new("p")
            .with_property("class", "subtitle")
            .with_children(vec![Node::text("Hi")])
            .into_node()]);

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "root",
                "children": [{
                    "type": "element",
                    "tagName": "p",
                    "properties": { "class": "subtitle" },
                    "children": [{ "type": "text", "value": "Hi" }]
                }]
            })
        );
    }
}
