//! The [`Scene`] container.
//!
//! Elements are stored in insertion order (layouts such as the grid rely on it). Ids are unique
//! across all element kinds, so `remove_element("x")` never has to guess what `x` is.

pub mod element;
pub mod event;
pub mod style;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use element::{Combo, Edge, Element, ElementKind, GraphData, Node, state};
use event::SceneEvent;
use style::Style;

type IdMap<V> = IndexMap<String, V, FxBuildHasher>;

/// Axis-aligned box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self::new(x0, y0, x0, y0);
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn expand(self, by: f64) -> Bounds {
        Bounds::new(
            self.min_x - by,
            self.min_y - by,
            self.max_x + by,
            self.max_y + by,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: IdMap<Node>,
    edges: IdMap<Edge>,
    combos: IdMap<Combo>,
    events: Vec<SceneEvent>,
    revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a scene from host-supplied records: combos first, then nodes, then edges.
    pub fn from_data(data: GraphData) -> Result<Self> {
        let mut scene = Self::new();
        scene.load(data)?;
        Ok(scene)
    }

    /// Adds a whole topology. Either every element is added or none is.
    pub fn load(&mut self, data: GraphData) -> Result<()> {
        let GraphData {
            nodes,
            edges,
            combos,
        } = data;
        let snapshot = (
            self.nodes.clone(),
            self.edges.clone(),
            self.combos.clone(),
            self.events.len(),
        );
        let result = self
            .add_combos(combos)
            .and_then(|_| self.add_nodes(nodes))
            .and_then(|_| self.add_edges(edges));
        if result.is_err() {
            let (nodes, edges, combos, events_len) = snapshot;
            self.nodes = nodes;
            self.edges = edges;
            self.combos = combos;
            self.events.truncate(events_len);
        }
        result
    }

    /// Monotonic counter bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains(&self, id: &str) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn kind_of(&self, id: &str) -> Option<ElementKind> {
        if self.nodes.contains_key(id) {
            Some(ElementKind::Node)
        } else if self.edges.contains_key(id) {
            Some(ElementKind::Edge)
        } else if self.combos.contains_key(id) {
            Some(ElementKind::Combo)
        } else {
            None
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn combo(&self, id: &str) -> Option<&Combo> {
        self.combos.get(id)
    }

    pub fn element(&self, id: &str) -> Result<Element<'_>> {
        if let Some(n) = self.nodes.get(id) {
            return Ok(Element::Node(n));
        }
        if let Some(e) = self.edges.get(id) {
            return Ok(Element::Edge(e));
        }
        if let Some(c) = self.combos.get(id) {
            return Ok(Element::Combo(c));
        }
        Err(not_found(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn combos(&self) -> impl Iterator<Item = &Combo> {
        self.combos.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn combo_count(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.combos.is_empty()
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.element(id).is_ok_and(|e| e.is_hidden())
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> Result<()> {
        let nodes: Vec<Node> = nodes.into_iter().collect();
        let mut batch: FxHashSet<&str> = FxHashSet::default();
        for n in &nodes {
            self.ensure_fresh_id(&n.id, &mut batch)?;
            validate_style(&n.id, &n.style)?;
            if let Some(combo) = n.combo.as_deref() {
                if !self.combos.contains_key(combo) {
                    return Err(dangling(&n.id, combo));
                }
            }
        }

        for n in nodes {
            let id = n.id.clone();
            self.nodes.insert(id.clone(), n);
            self.record(SceneEvent::ElementAdded {
                id,
                kind: ElementKind::Node,
            });
        }
        Ok(())
    }

    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>) -> Result<()> {
        let edges: Vec<Edge> = edges.into_iter().collect();
        let mut batch: FxHashSet<&str> = FxHashSet::default();
        for e in &edges {
            self.ensure_fresh_id(&e.id, &mut batch)?;
            validate_style(&e.id, &e.style)?;
            for endpoint in [&e.source, &e.target] {
                if !self.nodes.contains_key(endpoint.as_str()) {
                    return Err(dangling(&e.id, endpoint));
                }
            }
        }

        for e in edges {
            let id = e.id.clone();
            self.edges.insert(id.clone(), e);
            self.record(SceneEvent::ElementAdded {
                id,
                kind: ElementKind::Edge,
            });
        }
        Ok(())
    }

    pub fn add_combos(&mut self, combos: impl IntoIterator<Item = Combo>) -> Result<()> {
        let combos: Vec<Combo> = combos.into_iter().collect();
        let mut batch: FxHashSet<&str> = FxHashSet::default();
        for c in &combos {
            self.ensure_fresh_id(&c.id, &mut batch)?;
            validate_style(&c.id, &c.style)?;
        }

        for c in combos {
            let id = c.id.clone();
            self.combos.insert(id.clone(), c);
            self.record(SceneEvent::ElementAdded {
                id,
                kind: ElementKind::Combo,
            });
        }
        Ok(())
    }

    /// Removes an element and returns the ids of everything removed with it.
    ///
    /// Removing a node removes every incident edge. Removing a combo ungroups its members.
    pub fn remove_element(&mut self, id: &str) -> Result<Vec<String>> {
        let kind = self.kind_of(id).ok_or_else(|| not_found(id))?;
        let mut removed = Vec::new();
        match kind {
            ElementKind::Node => {
                let mut cascaded = Vec::new();
                self.edges.retain(|edge_id, e| {
                    if e.touches(id) {
                        cascaded.push(edge_id.clone());
                        false
                    } else {
                        true
                    }
                });
                if !cascaded.is_empty() {
                    tracing::debug!(node = id, edges = cascaded.len(), "cascading edge removal");
                }
                for edge_id in cascaded {
                    self.record(SceneEvent::ElementRemoved {
                        id: edge_id.clone(),
                        kind: ElementKind::Edge,
                    });
                    removed.push(edge_id);
                }
                self.nodes.shift_remove(id);
            }
            ElementKind::Edge => {
                self.edges.shift_remove(id);
            }
            ElementKind::Combo => {
                let members: Vec<String> = self
                    .nodes
                    .values()
                    .filter(|n| n.combo.as_deref() == Some(id))
                    .map(|n| n.id.clone())
                    .collect();
                for member in members {
                    if let Some(n) = self.nodes.get_mut(&member) {
                        n.combo = None;
                    }
                    self.record(SceneEvent::ComboChanged {
                        node: member,
                        combo: None,
                    });
                }
                self.combos.shift_remove(id);
            }
        }
        self.record(SceneEvent::ElementRemoved {
            id: id.to_string(),
            kind,
        });
        removed.insert(0, id.to_string());
        Ok(removed)
    }

    pub fn update_element_style(&mut self, id: &str, patch: Style) -> Result<()> {
        let kind = self.kind_of(id).ok_or_else(|| not_found(id))?;
        let style = self.style_mut(id).ok_or_else(|| not_found(id))?;
        let mut merged = style.clone();
        merged.merge(patch);
        validate_style(id, &merged)?;
        if *style == merged {
            return Ok(());
        }
        *style = merged;
        self.record(SceneEvent::StyleChanged {
            id: id.to_string(),
            kind,
        });
        Ok(())
    }

    /// Marks an element hidden. Returns `false` when it already was.
    pub fn hide_element(&mut self, id: &str) -> Result<bool> {
        self.set_element_state(id, state::HIDDEN, true)
    }

    /// Clears the hidden state. Returns `false` when the element was already visible.
    pub fn show_element(&mut self, id: &str) -> Result<bool> {
        self.set_element_state(id, state::HIDDEN, false)
    }

    pub fn set_element_state(&mut self, id: &str, name: &str, enabled: bool) -> Result<bool> {
        let kind = self.kind_of(id).ok_or_else(|| not_found(id))?;
        let states = match kind {
            ElementKind::Node => self.nodes.get_mut(id).map(|n| &mut n.states),
            ElementKind::Edge => self.edges.get_mut(id).map(|e| &mut e.states),
            ElementKind::Combo => self.combos.get_mut(id).map(|c| &mut c.states),
        }
        .ok_or_else(|| not_found(id))?;

        let changed = if enabled {
            states.insert(name.to_string())
        } else {
            states.remove(name)
        };
        if changed {
            self.record(SceneEvent::StateChanged {
                id: id.to_string(),
                kind,
                state: name.to_string(),
                enabled,
            });
        }
        Ok(changed)
    }

    /// Moves a node into `combo` (or out of any combo with `None`).
    pub fn set_node_combo(&mut self, node: &str, combo: Option<&str>) -> Result<bool> {
        if let Some(c) = combo.filter(|c| !self.combos.contains_key(*c)) {
            return Err(dangling(node, c));
        }
        let n = self.nodes.get_mut(node).ok_or_else(|| not_found(node))?;
        if n.combo.as_deref() == combo {
            return Ok(false);
        }
        n.combo = combo.map(str::to_string);
        self.record(SceneEvent::ComboChanged {
            node: node.to_string(),
            combo: combo.map(str::to_string),
        });
        Ok(true)
    }

    /// Writes node positions in one batch. Every id must be a node and every coordinate finite.
    pub fn apply_positions<I, S>(&mut self, positions: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, (f64, f64))>,
        S: AsRef<str>,
    {
        let positions: Vec<(S, (f64, f64))> = positions.into_iter().collect();
        for (id, (x, y)) in &positions {
            let id = id.as_ref();
            if !self.nodes.contains_key(id) {
                return Err(not_found(id));
            }
            if !(x.is_finite() && y.is_finite()) {
                return Err(Error::InvalidStyle {
                    id: id.to_string(),
                    message: format!("position must be finite, got ({x}, {y})"),
                });
            }
        }

        let mut ids = Vec::new();
        for (id, (x, y)) in positions {
            let id = id.as_ref();
            let Some(n) = self.nodes.get_mut(id) else {
                continue;
            };
            if n.style.position() != Some((x, y)) {
                n.style.x = Some(x);
                n.style.y = Some(y);
                ids.push(id.to_string());
            }
        }
        let count = ids.len();
        if count > 0 {
            self.record(SceneEvent::PositionsChanged { ids });
        }
        Ok(count)
    }

    pub fn incident_edges<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.touches(node))
    }

    /// Distinct nodes sharing an edge with `node`, in edge insertion order.
    pub fn neighbors<'a>(&'a self, node: &'a str) -> Vec<&'a str> {
        let mut out: Vec<&str> = Vec::new();
        for e in self.incident_edges(node) {
            let other = if e.source == node { &e.target } else { &e.source };
            if other != node && !out.contains(&other.as_str()) {
                out.push(other);
            }
        }
        out
    }

    pub fn combo_members(&self, combo: &str) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.combo.as_deref() == Some(combo))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Bounding box of a single positioned node, including its size.
    pub fn node_bounds(&self, id: &str) -> Option<Bounds> {
        let n = self.nodes.get(id)?;
        let (x, y) = n.style.position()?;
        let [w, h] = n.size();
        Some(Bounds::new(x - w / 2.0, y - h / 2.0, x + w / 2.0, y + h / 2.0))
    }

    /// Bounding box of the visible members of a combo.
    pub fn combo_bounds(&self, combo: &str) -> Option<Bounds> {
        self.nodes
            .values()
            .filter(|n| n.combo.as_deref() == Some(combo) && !n.states.contains(state::HIDDEN))
            .filter_map(|n| self.node_bounds(&n.id))
            .reduce(Bounds::union)
    }

    /// Bounding box of every visible, positioned node.
    pub fn bounds(&self) -> Option<Bounds> {
        self.nodes
            .values()
            .filter(|n| !n.states.contains(state::HIDDEN))
            .filter_map(|n| self.node_bounds(&n.id))
            .reduce(Bounds::union)
    }

    /// Takes the change log accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Removes every element. Emits removal events so observers can clean up.
    pub fn clear(&mut self) {
        let ids: Vec<(String, ElementKind)> = self
            .edges
            .keys()
            .map(|id| (id.clone(), ElementKind::Edge))
            .chain(self.nodes.keys().map(|id| (id.clone(), ElementKind::Node)))
            .chain(self.combos.keys().map(|id| (id.clone(), ElementKind::Combo)))
            .collect();
        self.nodes.clear();
        self.edges.clear();
        self.combos.clear();
        for (id, kind) in ids {
            self.record(SceneEvent::ElementRemoved { id, kind });
        }
    }

    fn style_mut(&mut self, id: &str) -> Option<&mut Style> {
        if let Some(n) = self.nodes.get_mut(id) {
            return Some(&mut n.style);
        }
        if let Some(e) = self.edges.get_mut(id) {
            return Some(&mut e.style);
        }
        self.combos.get_mut(id).map(|c| &mut c.style)
    }

    fn ensure_fresh_id<'a>(&self, id: &'a str, batch: &mut FxHashSet<&'a str>) -> Result<()> {
        if self.contains(id) || !batch.insert(id) {
            return Err(Error::DuplicateId { id: id.to_string() });
        }
        Ok(())
    }

    fn record(&mut self, event: SceneEvent) {
        self.revision = self.revision.wrapping_add(1);
        self.events.push(event);
    }
}

fn validate_style(id: &str, style: &Style) -> Result<()> {
    style.validate().map_err(|message| Error::InvalidStyle {
        id: id.to_string(),
        message,
    })
}

fn not_found(id: &str) -> Error {
    Error::NotFound { id: id.to_string() }
}

fn dangling(id: &str, missing: &str) -> Error {
    Error::DanglingReference {
        id: id.to_string(),
        missing: missing.to_string(),
    }
}
