//! Pointer and gesture input, in screen coordinates.

use narwhal_render::Point;
use narwhal_scene::ElementKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    /// The pointer left the container.
    PointerLeave,
    #[serde(rename_all = "camelCase")]
    Wheel { x: f64, y: f64, delta_y: f64 },
    /// Two-finger gesture; `scale` is relative to the previous pinch event.
    Pinch { x: f64, y: f64, scale: f64 },
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    Wheel,
    Pinch,
    Cancel,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::PointerDown { .. } => EventKind::PointerDown,
            InputEvent::PointerMove { .. } => EventKind::PointerMove,
            InputEvent::PointerUp { .. } => EventKind::PointerUp,
            InputEvent::PointerLeave => EventKind::PointerLeave,
            InputEvent::Wheel { .. } => EventKind::Wheel,
            InputEvent::Pinch { .. } => EventKind::Pinch,
            InputEvent::Cancel => EventKind::Cancel,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match *self {
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerMove { x, y }
            | InputEvent::PointerUp { x, y }
            | InputEvent::Wheel { x, y, .. }
            | InputEvent::Pinch { x, y, .. } => Some(Point::new(x, y)),
            InputEvent::PointerLeave | InputEvent::Cancel => None,
        }
    }

    /// Whether the event ends every in-flight interaction.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, InputEvent::PointerLeave | InputEvent::Cancel)
    }
}

/// Element under the pointer when an event was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub kind: ElementKind,
}
