//! Element records stored by the [`Scene`](super::Scene).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::style::Style;

/// Node size used when a node's style does not set one.
pub const DEFAULT_NODE_SIZE: f64 = 32.0;

/// Well-known state names.
pub mod state {
    pub const HIDDEN: &str = "hidden";
    pub const SELECTED: &str = "selected";
    pub const ACTIVE: &str = "active";
    /// Nodes in this state are held in place by force layouts.
    pub const PINNED: &str = "pinned";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Edge,
    Combo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub states: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn in_combo(mut self, combo: impl Into<String>) -> Self {
        self.combo = Some(combo.into());
        self
    }

    pub fn size(&self) -> [f64; 2] {
        self.style
            .size
            .unwrap_or([DEFAULT_NODE_SIZE, DEFAULT_NODE_SIZE])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub states: BTreeSet<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn touches(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub states: BTreeSet<String>,
}

impl Combo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

/// Initial topology supplied by the host, as plain attribute records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub combos: Vec<Combo>,
}

/// Borrowed view of any element kind, as returned by [`Scene::element`](super::Scene::element).
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
    Combo(&'a Combo),
}

impl<'a> Element<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            Element::Node(n) => &n.id,
            Element::Edge(e) => &e.id,
            Element::Combo(c) => &c.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Edge(_) => ElementKind::Edge,
            Element::Combo(_) => ElementKind::Combo,
        }
    }

    pub fn data(&self) -> &'a Map<String, Value> {
        match self {
            Element::Node(n) => &n.data,
            Element::Edge(e) => &e.data,
            Element::Combo(c) => &c.data,
        }
    }

    pub fn style(&self) -> &'a Style {
        match self {
            Element::Node(n) => &n.style,
            Element::Edge(e) => &e.style,
            Element::Combo(c) => &c.style,
        }
    }

    pub fn states(&self) -> &'a BTreeSet<String> {
        match self {
            Element::Node(n) => &n.states,
            Element::Edge(e) => &e.states,
            Element::Combo(c) => &c.states,
        }
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states().contains(name)
    }

    pub fn is_hidden(&self) -> bool {
        self.has_state(state::HIDDEN)
    }
}
