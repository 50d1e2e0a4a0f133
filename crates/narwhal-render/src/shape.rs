//! Shape implementations map element attributes to abstract draw primitives.
//!
//! Node and combo primitives are expressed in local coordinates around the element's placement
//! point, and edge primitives along the placement segment, so moving an element changes its
//! placement but not its primitives.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use narwhal_scene::{ElementKind, Style};
use rustc_hash::FxBuildHasher;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::viewport::Point;

const DEFAULT_FILL: &str = "#1783FF";
const DEFAULT_STROKE: &str = "#99ADD1";
const DEFAULT_COMBO_FILL: &str = "#99ADD1";
const COMBO_PADDING: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Primitive {
    #[serde(rename_all = "camelCase")]
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        line_width: f64,
        opacity: f64,
    },
    #[serde(rename_all = "camelCase")]
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        line_width: f64,
        opacity: f64,
    },
    /// Stroke along the item's placement segment.
    #[serde(rename_all = "camelCase")]
    Segment {
        stroke: String,
        line_width: f64,
        opacity: f64,
        end_arrow: bool,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
    },
}

impl Primitive {
    /// Whether the local point lies inside a filled primitive.
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Primitive::Circle { cx, cy, r, .. } => (p.x - cx).hypot(p.y - cy) <= *r,
            Primitive::Rect {
                x,
                y,
                width,
                height,
                ..
            } => p.x >= *x && p.x <= x + width && p.y >= *y && p.y <= y + height,
            Primitive::Segment { .. } | Primitive::Text { .. } => false,
        }
    }
}

/// Attributes handed to a [`Shape`].
#[derive(Debug, Clone, Copy)]
pub struct ShapeAttrs<'a> {
    pub id: &'a str,
    pub kind: ElementKind,
    pub style: &'a Style,
    pub states: &'a BTreeSet<String>,
    /// Width and height. For combos, the padded extent of the visible members.
    pub size: [f64; 2],
}

impl ShapeAttrs<'_> {
    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains(name)
    }

    fn opacity(&self) -> f64 {
        self.style.opacity.unwrap_or(1.0)
    }

    fn line_width(&self, default: f64) -> f64 {
        let base = self.style.line_width.unwrap_or(default);
        if self.has_state(narwhal_scene::state::SELECTED) {
            base + 2.0
        } else {
            base
        }
    }

    fn label(&self, y: f64, container: &mut Vec<Primitive>) {
        if let Some(text) = &self.style.label {
            container.push(Primitive::Text {
                x: 0.0,
                y,
                text: text.clone(),
            });
        }
    }
}

/// Maps attributes to primitives appended to `container`.
///
/// Custom shapes compose built-ins by delegating to them and appending their own primitives.
pub trait Shape: Send + Sync {
    fn render(&self, attrs: &ShapeAttrs<'_>, container: &mut Vec<Primitive>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CircleShape;

impl Shape for CircleShape {
    fn render(&self, attrs: &ShapeAttrs<'_>, container: &mut Vec<Primitive>) -> Result<()> {
        let r = attrs.size[0].min(attrs.size[1]) / 2.0;
        container.push(Primitive::Circle {
            cx: 0.0,
            cy: 0.0,
            r,
            fill: Some(attrs.style.fill.clone().unwrap_or_else(|| DEFAULT_FILL.into())),
            stroke: attrs.style.stroke.clone(),
            line_width: attrs.line_width(0.0),
            opacity: attrs.opacity(),
        });
        attrs.label(r + 12.0, container);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RectShape;

impl Shape for RectShape {
    fn render(&self, attrs: &ShapeAttrs<'_>, container: &mut Vec<Primitive>) -> Result<()> {
        let [w, h] = attrs.size;
        container.push(Primitive::Rect {
            x: -w / 2.0,
            y: -h / 2.0,
            width: w,
            height: h,
            radius: 0.0,
            fill: Some(attrs.style.fill.clone().unwrap_or_else(|| DEFAULT_FILL.into())),
            stroke: attrs.style.stroke.clone(),
            line_width: attrs.line_width(0.0),
            opacity: attrs.opacity(),
        });
        attrs.label(h / 2.0 + 12.0, container);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineShape;

impl Shape for LineShape {
    fn render(&self, attrs: &ShapeAttrs<'_>, container: &mut Vec<Primitive>) -> Result<()> {
        container.push(Primitive::Segment {
            stroke: attrs
                .style
                .stroke
                .clone()
                .unwrap_or_else(|| DEFAULT_STROKE.into()),
            line_width: attrs.line_width(1.0),
            opacity: attrs.opacity(),
            end_arrow: attrs
                .style
                .extra
                .get("endArrow")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        });
        // Edge labels sit at the segment midpoint.
        attrs.label(0.0, container);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComboRectShape;

impl Shape for ComboRectShape {
    fn render(&self, attrs: &ShapeAttrs<'_>, container: &mut Vec<Primitive>) -> Result<()> {
        let [w, h] = attrs.size;
        container.push(Primitive::Rect {
            x: -w / 2.0,
            y: -h / 2.0,
            width: w,
            height: h,
            radius: 4.0,
            fill: Some(
                attrs
                    .style
                    .fill
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMBO_FILL.into()),
            ),
            stroke: Some(
                attrs
                    .style
                    .stroke
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STROKE.into()),
            ),
            line_width: attrs.line_width(1.0),
            opacity: attrs.style.opacity.unwrap_or(0.1),
        });
        attrs.label(-h / 2.0 - 8.0, container);
        Ok(())
    }
}

/// Padding added around the members of a combo.
pub fn combo_padding(style: &Style) -> f64 {
    style
        .extra
        .get("padding")
        .and_then(|v| v.as_f64())
        .unwrap_or(COMBO_PADDING)
}

type ShapeMap = IndexMap<String, Arc<dyn Shape>, FxBuildHasher>;

/// Shape implementations keyed by element kind and shape name.
#[derive(Clone, Default)]
pub struct ShapeRegistry {
    nodes: ShapeMap,
    edges: ShapeMap,
    combos: ShapeMap,
}

impl std::fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges.keys().collect::<Vec<_>>())
            .field("combos", &self.combos.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ShapeRegistry {
    pub const DEFAULT_NODE: &'static str = "circle";
    pub const DEFAULT_EDGE: &'static str = "line";
    pub const DEFAULT_COMBO: &'static str = "rect";

    /// Registry holding the built-in shapes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.insert(ElementKind::Node, "circle", Arc::new(CircleShape));
        registry.insert(ElementKind::Node, "rect", Arc::new(RectShape));
        registry.insert(ElementKind::Edge, "line", Arc::new(LineShape));
        registry.insert(ElementKind::Combo, "rect", Arc::new(ComboRectShape));
        registry
    }

    fn map(&self, kind: ElementKind) -> &ShapeMap {
        match kind {
            ElementKind::Node => &self.nodes,
            ElementKind::Edge => &self.edges,
            ElementKind::Combo => &self.combos,
        }
    }

    /// Inserts or replaces a shape. Returns the previous implementation, if any.
    pub fn insert(
        &mut self,
        kind: ElementKind,
        key: impl Into<String>,
        shape: Arc<dyn Shape>,
    ) -> Option<Arc<dyn Shape>> {
        let map = match kind {
            ElementKind::Node => &mut self.nodes,
            ElementKind::Edge => &mut self.edges,
            ElementKind::Combo => &mut self.combos,
        };
        map.insert(key.into(), shape)
    }

    pub fn contains(&self, kind: ElementKind, key: &str) -> bool {
        self.map(kind).contains_key(key)
    }

    pub fn get(&self, kind: ElementKind, key: &str) -> Result<&Arc<dyn Shape>> {
        self.map(kind).get(key).ok_or_else(|| Error::UnknownShape {
            kind,
            key: key.to_string(),
        })
    }

    pub fn default_key(kind: ElementKind) -> &'static str {
        match kind {
            ElementKind::Node => Self::DEFAULT_NODE,
            ElementKind::Edge => Self::DEFAULT_EDGE,
            ElementKind::Combo => Self::DEFAULT_COMBO,
        }
    }

    pub fn keys(&self, kind: ElementKind) -> impl Iterator<Item = &str> {
        self.map(kind).keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs<'a>(style: &'a Style, states: &'a BTreeSet<String>) -> ShapeAttrs<'a> {
        ShapeAttrs {
            id: "n",
            kind: ElementKind::Node,
            style,
            states,
            size: [40.0, 20.0],
        }
    }

    #[test]
    fn circle_uses_smaller_extent_as_diameter() {
        let style = Style::default().with_label("hub");
        let states = BTreeSet::new();
        let mut out = Vec::new();
        CircleShape.render(&attrs(&style, &states), &mut out).unwrap();
        assert!(matches!(out[0], Primitive::Circle { r, .. } if r == 10.0));
        assert!(matches!(&out[1], Primitive::Text { text, .. } if text == "hub"));
    }

    #[test]
    fn selection_thickens_stroke() {
        let style = Style::default();
        let states: BTreeSet<String> = [narwhal_scene::state::SELECTED.to_string()].into();
        let mut out = Vec::new();
        RectShape.render(&attrs(&style, &states), &mut out).unwrap();
        assert!(matches!(out[0], Primitive::Rect { line_width, .. } if line_width == 2.0));
    }

    #[test]
    fn unknown_key_is_reported_with_kind() {
        let registry = ShapeRegistry::with_builtins();
        assert!(registry.get(ElementKind::Edge, "line").is_ok());
        assert_eq!(
            registry.get(ElementKind::Edge, "cubic").err(),
            Some(Error::UnknownShape {
                kind: ElementKind::Edge,
                key: "cubic".to_string()
            })
        );
    }
}
