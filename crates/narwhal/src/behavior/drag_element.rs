use narwhal_render::Point;
use narwhal_scene::{ElementKind, state};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Behavior, BehaviorContext, DRAG_THRESHOLD, Phase, Propagation};
use crate::command::Command;
use crate::error::Result;
use crate::extension::parse_options;
use crate::input::{EventKind, InputEvent};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DragElementOptions {
    /// Move the node back to its start position when the drag is cancelled.
    pub rollback_on_cancel: bool,
    /// Pin dragged nodes so force layouts keep them where they were dropped.
    pub pin_on_drop: bool,
}

#[derive(Debug, Clone)]
struct Grab {
    id: String,
    node_start: Point,
    pointer_start: Point,
    screen_start: Point,
}

/// Moves a node with the pointer.
#[derive(Debug, Clone)]
pub struct DragElement {
    options: DragElementOptions,
    phase: Phase,
    grab: Option<Grab>,
}

impl DragElement {
    pub fn new(options: DragElementOptions) -> Self {
        Self {
            options,
            phase: Phase::Idle,
            grab: None,
        }
    }

    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(parse_options("drag-element", options)?))
    }

    /// Id of the node being dragged.
    pub fn dragging(&self) -> Option<&str> {
        self.grab.as_ref().map(|g| g.id.as_str())
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.grab = None;
    }
}

impl Behavior for DragElement {
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
        match event {
            InputEvent::PointerDown { .. } => {
                self.reset();
                let Some(target) = ctx.target.filter(|t| t.kind == ElementKind::Node) else {
                    return Ok(Propagation::Continue);
                };
                let Some(node) = ctx.scene.node(&target.id) else {
                    return Ok(Propagation::Continue);
                };
                let (x, y) = node.style.position().unwrap_or((0.0, 0.0));
                self.grab = Some(Grab {
                    id: target.id.clone(),
                    node_start: Point::new(x, y),
                    pointer_start: ctx.to_world(p),
                    screen_start: p,
                });
                self.phase = Phase::Armed;
                Ok(Propagation::Continue)
            }
            InputEvent::PointerMove { .. } => {
                let Some(grab) = &self.grab else {
                    return Ok(Propagation::Continue);
                };
                if self.phase == Phase::Armed && (p - grab.screen_start).norm() < DRAG_THRESHOLD {
                    return Ok(Propagation::Continue);
                }
                let world = ctx.to_world(p);
                let to = grab.node_start + (world - grab.pointer_start);
                ctx.commands.push(Command::MoveNode {
                    id: grab.id.clone(),
                    x: to.x,
                    y: to.y,
                });
                self.phase = Phase::Dragging;
                Ok(Propagation::Stop)
            }
            InputEvent::PointerUp { .. } => {
                let dragged = self.phase == Phase::Dragging;
                if let (true, true, Some(grab)) = (dragged, self.options.pin_on_drop, &self.grab) {
                    ctx.commands.push(Command::SetState {
                        id: grab.id.clone(),
                        state: state::PINNED.to_string(),
                        enabled: true,
                    });
                }
                self.reset();
                Ok(if dragged {
                    Propagation::Stop
                } else {
                    Propagation::Continue
                })
            }
            _ => Ok(Propagation::Continue),
        }
    }

    fn cancel(&mut self, ctx: &mut BehaviorContext<'_>) {
        if let (Phase::Dragging, true, Some(grab)) =
            (self.phase, self.options.rollback_on_cancel, &self.grab)
        {
            ctx.commands.push(Command::MoveNode {
                id: grab.id.clone(),
                x: grab.node_start.x,
                y: grab.node_start.y,
            });
        }
        self.reset();
    }

    fn phase(&self) -> Phase {
        self.phase
    }
}
