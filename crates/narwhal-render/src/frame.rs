//! Desired visual state of a scene, one [`DrawItem`] per visible element.

use indexmap::IndexMap;
use narwhal_scene::{Bounds, ElementKind, Scene, state};
use rustc_hash::FxBuildHasher;
use serde::Serialize;

use crate::error::Result;
use crate::shape::{Primitive, ShapeAttrs, ShapeRegistry, combo_padding};
use crate::viewport::Point;

/// Where an item sits in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Placement {
    /// Center of a node or combo.
    Point { x: f64, y: f64 },
    /// Edge from source center to target center.
    Segment { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Placement {
    pub fn anchor(&self) -> Point {
        match *self {
            Placement::Point { x, y } => Point::new(x, y),
            Placement::Segment { x1, y1, x2, y2 } => {
                Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawItem {
    pub id: String,
    pub kind: ElementKind,
    pub shape: String,
    pub placement: Placement,
    pub primitives: Vec<Primitive>,
}

/// Draw items in paint order: combos, then edges, then nodes, each in scene insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    items: IndexMap<String, DrawItem, FxBuildHasher>,
}

impl Frame {
    pub fn get(&self, id: &str) -> Option<&DrawItem> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn items(&self) -> impl DoubleEndedIterator<Item = &DrawItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push(&mut self, item: DrawItem) {
        self.items.insert(item.id.clone(), item);
    }
}

fn shape_key(style: &narwhal_scene::Style, kind: ElementKind) -> &str {
    style
        .shape
        .as_deref()
        .unwrap_or_else(|| ShapeRegistry::default_key(kind))
}

fn node_center(scene: &Scene, id: &str) -> Option<Point> {
    let (x, y) = scene.node(id)?.style.position().unwrap_or((0.0, 0.0));
    Some(Point::new(x, y))
}

/// Builds the frame for the visible part of `scene`.
///
/// Hidden elements, edges touching a hidden node, and combos without visible positioned members
/// are left out. Nodes without a position are drawn at the origin.
pub fn build_frame(scene: &Scene, shapes: &ShapeRegistry) -> Result<Frame> {
    let mut frame = Frame::default();

    for combo in scene.combos() {
        if combo.states.contains(state::HIDDEN) {
            continue;
        }
        let Some(members) = scene.combo_bounds(&combo.id) else {
            continue;
        };
        let bounds: Bounds = members.expand(combo_padding(&combo.style));
        let (cx, cy) = bounds.center();
        let key = shape_key(&combo.style, ElementKind::Combo);
        let attrs = ShapeAttrs {
            id: &combo.id,
            kind: ElementKind::Combo,
            style: &combo.style,
            states: &combo.states,
            size: [bounds.width(), bounds.height()],
        };
        let mut primitives = Vec::new();
        shapes
            .get(ElementKind::Combo, key)?
            .render(&attrs, &mut primitives)?;
        frame.push(DrawItem {
            id: combo.id.clone(),
            kind: ElementKind::Combo,
            shape: key.to_string(),
            placement: Placement::Point { x: cx, y: cy },
            primitives,
        });
    }

    for edge in scene.edges() {
        if edge.states.contains(state::HIDDEN)
            || scene.is_hidden(&edge.source)
            || scene.is_hidden(&edge.target)
        {
            continue;
        }
        let (Some(a), Some(b)) = (
            node_center(scene, &edge.source),
            node_center(scene, &edge.target),
        ) else {
            continue;
        };
        let key = shape_key(&edge.style, ElementKind::Edge);
        let attrs = ShapeAttrs {
            id: &edge.id,
            kind: ElementKind::Edge,
            style: &edge.style,
            states: &edge.states,
            size: [(b - a).norm(), edge.style.line_width.unwrap_or(1.0)],
        };
        let mut primitives = Vec::new();
        shapes
            .get(ElementKind::Edge, key)?
            .render(&attrs, &mut primitives)?;
        frame.push(DrawItem {
            id: edge.id.clone(),
            kind: ElementKind::Edge,
            shape: key.to_string(),
            placement: Placement::Segment {
                x1: a.x,
                y1: a.y,
                x2: b.x,
                y2: b.y,
            },
            primitives,
        });
    }

    for node in scene.nodes() {
        if node.states.contains(state::HIDDEN) {
            continue;
        }
        let (x, y) = node.style.position().unwrap_or((0.0, 0.0));
        let key = shape_key(&node.style, ElementKind::Node);
        let attrs = ShapeAttrs {
            id: &node.id,
            kind: ElementKind::Node,
            style: &node.style,
            states: &node.states,
            size: node.size(),
        };
        let mut primitives = Vec::new();
        shapes
            .get(ElementKind::Node, key)?
            .render(&attrs, &mut primitives)?;
        frame.push(DrawItem {
            id: node.id.clone(),
            kind: ElementKind::Node,
            shape: key.to_string(),
            placement: Placement::Point { x, y },
            primitives,
        });
    }

    Ok(frame)
}
