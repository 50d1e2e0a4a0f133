use narwhal_render::Point;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Behavior, BehaviorContext, DRAG_THRESHOLD, Phase, Propagation};
use crate::command::Command;
use crate::error::Result;
use crate::extension::parse_options;
use crate::input::{EventKind, InputEvent};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DragCanvasOptions {
    /// Pan back to where the drag started when it is cancelled.
    pub rollback_on_cancel: bool,
    /// Also start a pan when the press lands on a combo.
    pub allow_drag_on_combo: bool,
}

/// Pans the viewport while the pointer is dragged over empty canvas.
#[derive(Debug, Clone)]
pub struct DragCanvas {
    options: DragCanvasOptions,
    phase: Phase,
    origin: Point,
    last: Point,
}

impl DragCanvas {
    pub fn new(options: DragCanvasOptions) -> Self {
        Self {
            options,
            phase: Phase::Idle,
            origin: Point::origin(),
            last: Point::origin(),
        }
    }

    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(parse_options("drag-canvas", options)?))
    }
}

impl Behavior for DragCanvas {
    fn handles(&self, kind: EventKind) -> bool {
        matches!(
            kind,
            EventKind::PointerDown | EventKind::PointerMove | EventKind::PointerUp
        )
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut BehaviorContext<'_>) -> Result<Propagation> {
        let Some(p) = event.position() else {
            return Ok(Propagation::Continue);
        };
        match (event, self.phase) {
            (InputEvent::PointerDown { .. }, _) => {
                let on_canvas = match ctx.target {
                    None => true,
                    Some(t) => {
                        self.options.allow_drag_on_combo
                            && t.kind == narwhal_scene::ElementKind::Combo
                    }
                };
                if on_canvas {
                    self.phase = Phase::Armed;
                    self.origin = p;
                    self.last = p;
                }
                Ok(Propagation::Continue)
            }
            (InputEvent::PointerMove { .. }, Phase::Armed | Phase::Dragging) => {
                if self.phase == Phase::Armed && (p - self.origin).norm() < DRAG_THRESHOLD {
                    return Ok(Propagation::Continue);
                }
                self.phase = Phase::Dragging;
                let (dx, dy) = (p.x - self.last.x, p.y - self.last.y);
                self.last = p;
                ctx.commands.push(Command::Pan { dx, dy });
                Ok(Propagation::Stop)
            }
            (InputEvent::PointerUp { .. }, phase) => {
                self.phase = Phase::Idle;
                Ok(if phase == Phase::Dragging {
                    Propagation::Stop
                } else {
                    Propagation::Continue
                })
            }
            _ => Ok(Propagation::Continue),
        }
    }

    fn cancel(&mut self, ctx: &mut BehaviorContext<'_>) {
        if self.phase == Phase::Dragging && self.options.rollback_on_cancel {
            ctx.commands.push(Command::Pan {
                dx: self.origin.x - self.last.x,
                dy: self.origin.y - self.last.y,
            });
        }
        self.phase = Phase::Idle;
    }

    fn phase(&self) -> Phase {
        self.phase
    }
}
