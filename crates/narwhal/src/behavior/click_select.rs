use narwhal_render::Point;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Behavior, BehaviorContext, DRAG_THRESHOLD, Phase, Propagation};
use crate::command::Command;
use crate::error::Result;
use crate::extension::parse_options;
use crate::input::{EventKind, InputEvent, Target};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClickSelectOptions {
    /// Keep earlier selections when another element is clicked.
    pub multiple: bool,
    /// State toggled on the clicked element.
    pub state: String,
}

impl Default for ClickSelectOptions {
    fn default() -> Self {
        Self {
            multiple: false,
            state: narwhal_scene::state::SELECTED.to_string(),
        }
    }
}

/// Toggles a state on clicked elements. Clicking empty canvas clears the selection.
#[derive(Debug, Clone)]
pub struct ClickSelect {
    options: ClickSelectOptions,
    phase: Phase,
    press: Option<(Point, Option<Target>)>,
}

impl ClickSelect {
    pub fn new(options: ClickSelectOptions) -> Self {
        Self {
            options,
            phase: Phase::Idle,
            press: None,
        }
    }

    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(parse_options("click-select", options)?))
    }

    fn clear_others(&self, keep: Option<&str>, ctx: &mut BehaviorContext<'_>) {
        let name = self.options.state.as_str();
        let selected: Vec<String> = ctx
            .scene
            .nodes()
            .filter(|n| n.states.contains(name))
            .map(|n| n.id.clone())
            .chain(
                ctx.scene
                    .edges()
                    .filter(|e| e.states.contains(name))
                    .map(|e| e.id.clone()),
            )
            .chain(
                ctx.scene
                    .combos()
                    .filter(|c| c.states.contains(name))
                    .map(|c| c.id.clone()),
            )
            .filter(|id| Some(id.as_str()) != keep)
            .collect();
        for id in selected {
            ctx.commands.push(Command::SetState {
                id,
                state: name.to_string(),
                enabled: false,
            });
        }
    }
}

impl Behavior for ClickSelect {
    fn handles(&self, kind: EventKind) -> bool {
        matches!(kind, EventKind::PointerDown | EventKind::PointerUp)
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut BehaviorContext<'_>) -> Result<Propagation> {
        match *event {
            InputEvent::PointerDown { x, y } => {
                self.press = Some((Point::new(x, y), ctx.target.cloned()));
                self.phase = Phase::Armed;
                Ok(Propagation::Continue)
            }
            InputEvent::PointerUp { x, y } => {
                self.phase = Phase::Idle;
                let Some((at, pressed)) = self.press.take() else {
                    return Ok(Propagation::Continue);
                };
                if (Point::new(x, y) - at).norm() > DRAG_THRESHOLD || pressed.as_ref() != ctx.target
                {
                    return Ok(Propagation::Continue);
                }
                match pressed {
                    Some(target) => {
                        let on = !ctx
                            .scene
                            .element(&target.id)
                            .map(|e| e.has_state(&self.options.state))
                            .unwrap_or(false);
                        if !self.options.multiple {
                            self.clear_others(Some(&target.id), ctx);
                        }
                        ctx.commands.push(Command::SetState {
                            id: target.id,
                            state: self.options.state.clone(),
                            enabled: on,
                        });
                        Ok(Propagation::Stop)
                    }
                    None => {
                        self.clear_others(None, ctx);
                        Ok(Propagation::Continue)
                    }
                }
            }
            _ => Ok(Propagation::Continue),
        }
    }

    fn cancel(&mut self, _ctx: &mut BehaviorContext<'_>) {
        self.press = None;
        self.phase = Phase::Idle;
    }

    fn phase(&self) -> Phase {
        self.phase
    }
}
