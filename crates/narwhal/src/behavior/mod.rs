//! Pointer and gesture handlers.
//!
//! Behaviors run in configuration order. Each one sees only the event kinds it
//! [handles](Behavior::handles) and may stop propagation to the behaviors after it. Mutations go
//! through [`Commands`], which the graph applies once the event has been handled.

mod click_select;
mod drag_canvas;
mod drag_element;
mod zoom_canvas;

use narwhal_render::{Frame, Point, Viewport};
use narwhal_scene::Scene;

use crate::command::Commands;
use crate::error::Result;
use crate::extension::ExtensionRegistry;
use crate::input::{EventKind, InputEvent, Target};

pub use click_select::{ClickSelect, ClickSelectOptions};
pub use drag_canvas::{DragCanvas, DragCanvasOptions};
pub use drag_element::{DragElement, DragElementOptions};
pub use zoom_canvas::{ZoomCanvas, ZoomCanvasOptions};

/// Screen distance a pointer may travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Pointer is down on a valid target.
    Armed,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    /// The event is consumed; later behaviors do not see it.
    Stop,
}

/// What a behavior may read while handling an event.
pub struct BehaviorContext<'a> {
    pub scene: &'a Scene,
    pub viewport: &'a Viewport,
    pub frame: &'a Frame,
    /// Element under the pointer, if any.
    pub target: Option<&'a Target>,
    pub commands: &'a mut Commands,
}

impl BehaviorContext<'_> {
    pub fn to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen)
    }
}

pub trait Behavior {
    fn handles(&self, kind: EventKind) -> bool;

    fn handle(&mut self, event: &InputEvent, ctx: &mut BehaviorContext<'_>) -> Result<Propagation>;

    /// Returns to [`Phase::Idle`]. Applied deltas stay unless the behavior opts into rollback.
    fn cancel(&mut self, ctx: &mut BehaviorContext<'_>);

    fn phase(&self) -> Phase;
}

pub(crate) fn register_builtins(registry: &mut ExtensionRegistry) {
    registry.insert_behavior("drag-canvas", |o| Ok(Box::new(DragCanvas::from_options(o)?)));
    registry.insert_behavior("drag-element", |o| Ok(Box::new(DragElement::from_options(o)?)));
    registry.insert_behavior("zoom-canvas", |o| Ok(Box::new(ZoomCanvas::from_options(o)?)));
    registry.insert_behavior("click-select", |o| Ok(Box::new(ClickSelect::from_options(o)?)));
}
