use std::any::Any;

use narwhal_render::{Point, Transform, Viewport};
use narwhal_scene::{Bounds, Scene, SceneEvent};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Plugin, PluginContext};
use crate::behavior::Propagation;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::extension::parse_options;
use crate::input::{InputEvent, Target};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MinimapPosition {
    LeftTop,
    RightTop,
    LeftBottom,
    #[default]
    RightBottom,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinimapOptions {
    pub size: [f64; 2],
    /// Inner padding between the panel edge and the scene overview.
    pub padding: f64,
    pub position: MinimapPosition,
}

impl Default for MinimapOptions {
    fn default() -> Self {
        Self {
            size: [240.0, 160.0],
            padding: 10.0,
            position: MinimapPosition::RightBottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// World bounds to panel mapping.
#[derive(Debug, Clone, Copy)]
struct Projection {
    world: Bounds,
    scale: f64,
    origin: Point,
}

impl Projection {
    fn to_panel(&self, p: Point) -> Point {
        Point::new(
            self.origin.x + (p.x - self.world.min_x) * self.scale,
            self.origin.y + (p.y - self.world.min_y) * self.scale,
        )
    }

    fn to_world(&self, p: Point) -> Point {
        Point::new(
            self.world.min_x + (p.x - self.origin.x) / self.scale,
            self.world.min_y + (p.y - self.origin.y) / self.scale,
        )
    }
}

/// Scaled overview of the scene in a corner of the view, with the visible region outlined.
///
/// Pressing inside the panel pans the main view to center the pressed point.
#[derive(Debug, Clone)]
pub struct Minimap {
    options: MinimapOptions,
    panel: Option<Rect>,
    indicator: Option<Rect>,
}

impl Minimap {
    pub fn new(options: MinimapOptions) -> Self {
        Self {
            options,
            panel: None,
            indicator: None,
        }
    }

    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let options: MinimapOptions = parse_options("minimap", options)?;
        let [w, h] = options.size;
        if !(w.is_finite() && h.is_finite() && w > 2.0 * options.padding && h > 2.0 * options.padding)
        {
            return Err(Error::InvalidOptions {
                key: "minimap".to_string(),
                message: format!("size [{w}, {h}] leaves no room inside padding"),
            });
        }
        Ok(Self::new(options))
    }

    pub fn options(&self) -> &MinimapOptions {
        &self.options
    }

    /// Panel rectangle in screen coordinates, once the view size is known.
    pub fn panel(&self) -> Option<Rect> {
        self.panel
    }

    /// Visible world region drawn inside the panel, in screen coordinates.
    pub fn viewport_indicator(&self) -> Option<Rect> {
        self.indicator
    }

    fn panel_rect(&self, viewport: &Viewport) -> Rect {
        let (vw, vh) = viewport.size();
        let [w, h] = self.options.size;
        let (x, y) = match self.options.position {
            MinimapPosition::LeftTop => (0.0, 0.0),
            MinimapPosition::RightTop => (vw - w, 0.0),
            MinimapPosition::LeftBottom => (0.0, vh - h),
            MinimapPosition::RightBottom => (vw - w, vh - h),
        };
        Rect {
            x,
            y,
            width: w,
            height: h,
        }
    }

    fn visible_world(viewport: &Viewport) -> Bounds {
        let (w, h) = viewport.size();
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(0.0, h),
            Point::new(w, h),
        ]
        .map(|c| viewport.screen_to_world(c));
        Bounds::from_points(corners.iter().map(|p| (p.x, p.y)))
            .unwrap_or(Bounds::new(0.0, 0.0, w, h))
    }

    /// The overview covers the scene and the visible region.
    fn projection(&self, scene: &Scene, viewport: &Viewport, panel: Rect) -> Projection {
        let visible = Self::visible_world(viewport);
        let world = scene.bounds().map_or(visible, |b| b.union(visible));
        let pad = self.options.padding;
        let inner_w = panel.width - 2.0 * pad;
        let inner_h = panel.height - 2.0 * pad;
        let scale = (inner_w / world.width().max(1.0)).min(inner_h / world.height().max(1.0));
        let origin = Point::new(
            panel.x + pad + (inner_w - world.width() * scale) / 2.0,
            panel.y + pad + (inner_h - world.height() * scale) / 2.0,
        );
        Projection {
            world,
            scale,
            origin,
        }
    }

    fn refresh(&mut self, scene: &Scene, viewport: &Viewport) {
        let panel = self.panel_rect(viewport);
        let projection = self.projection(scene, viewport, panel);
        let visible = Self::visible_world(viewport);
        let top_left = projection.to_panel(Point::new(visible.min_x, visible.min_y));
        let bottom_right = projection.to_panel(Point::new(visible.max_x, visible.max_y));
        self.panel = Some(panel);
        self.indicator = Some(Rect {
            x: top_left.x,
            y: top_left.y,
            width: bottom_right.x - top_left.x,
            height: bottom_right.y - top_left.y,
        });
    }
}

impl Plugin for Minimap {
    fn on_scene_change(&mut self, _events: &[SceneEvent], ctx: &mut PluginContext<'_>) -> Result<()> {
        self.refresh(ctx.scene, ctx.viewport);
        Ok(())
    }

    fn on_viewport_change(&mut self, _t: &Transform, ctx: &mut PluginContext<'_>) -> Result<()> {
        self.refresh(ctx.scene, ctx.viewport);
        Ok(())
    }

    fn on_input(
        &mut self,
        event: &InputEvent,
        _target: Option<&Target>,
        ctx: &mut PluginContext<'_>,
    ) -> Result<Propagation> {
        let InputEvent::PointerDown { x, y } = *event else {
            return Ok(Propagation::Continue);
        };
        let panel = self.panel_rect(ctx.viewport);
        let p = Point::new(x, y);
        if !panel.contains(p) {
            return Ok(Propagation::Continue);
        }
        let world = self.projection(ctx.scene, ctx.viewport, panel).to_world(p);
        let now = ctx.viewport.world_to_screen(world);
        let center = ctx.viewport.center();
        ctx.commands.push(Command::Pan {
            dx: center.x - now.x,
            dy: center.y - now.y,
        });
        Ok(Propagation::Stop)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
