use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Plugin, PluginContext};
use crate::behavior::Propagation;
use crate::error::Result;
use crate::extension::parse_options;
use crate::input::{InputEvent, Target};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    #[default]
    Hover,
    Click,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipOptions {
    /// Screen offset from the pointer.
    pub offset: [f64; 2],
    pub trigger: Trigger,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            offset: [10.0, 10.0],
            trigger: Trigger::Hover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipContent {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub title: String,
    /// Scalar data fields, in record order.
    pub fields: Vec<(String, String)>,
}

/// Shows element details next to the pointer. Never mutates the scene.
#[derive(Debug, Clone, Default)]
pub struct Tooltip {
    options: TooltipOptions,
    current: Option<TooltipContent>,
}

impl Tooltip {
    pub fn new(options: TooltipOptions) -> Self {
        Self {
            options,
            current: None,
        }
    }

    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(parse_options("tooltip", options)?))
    }

    pub fn current(&self) -> Option<&TooltipContent> {
        self.current.as_ref()
    }

    fn show(&mut self, target: &Target, x: f64, y: f64, ctx: &PluginContext<'_>) {
        let Ok(element) = ctx.scene.element(&target.id) else {
            self.current = None;
            return;
        };
        let title = element
            .style()
            .label
            .clone()
            .unwrap_or_else(|| target.id.clone());
        let fields = element
            .data()
            .iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k.clone(), s.clone())),
                Value::Number(n) => Some((k.clone(), n.to_string())),
                Value::Bool(b) => Some((k.clone(), b.to_string())),
                _ => None,
            })
            .collect();
        let [dx, dy] = self.options.offset;
        self.current = Some(TooltipContent {
            id: target.id.clone(),
            x: x + dx,
            y: y + dy,
            title,
            fields,
        });
    }
}

impl Plugin for Tooltip {
    fn on_scene_change(
        &mut self,
        events: &[narwhal_scene::SceneEvent],
        ctx: &mut PluginContext<'_>,
    ) -> Result<()> {
        let stale = self.current.as_ref().is_some_and(|c| {
            ctx.scene.is_hidden(&c.id)
                || events.iter().any(|e| {
                    matches!(e, narwhal_scene::SceneEvent::ElementRemoved { id, .. } if *id == c.id)
                })
        });
        if stale {
            self.current = None;
        }
        Ok(())
    }

    fn on_input(
        &mut self,
        event: &InputEvent,
        target: Option<&Target>,
        ctx: &mut PluginContext<'_>,
    ) -> Result<Propagation> {
        let shows = match (self.options.trigger, event) {
            (Trigger::Hover, InputEvent::PointerMove { .. }) => true,
            (Trigger::Click, InputEvent::PointerUp { .. }) => true,
            (_, InputEvent::PointerLeave | InputEvent::Cancel) => {
                self.current = None;
                return Ok(Propagation::Continue);
            }
            _ => false,
        };
        if !shows {
            return Ok(Propagation::Continue);
        }
        match (target, event.position()) {
            (Some(t), Some(p)) => self.show(t, p.x, p.y, ctx),
            _ => self.current = None,
        }
        Ok(Propagation::Continue)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
