use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Behavior, BehaviorContext, Phase, Propagation};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::extension::parse_options;
use crate::input::{EventKind, InputEvent};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomCanvasOptions {
    /// Zoom ratio per 100 units of wheel delta.
    pub sensitivity: f64,
}

impl Default for ZoomCanvasOptions {
    fn default() -> Self {
        Self { sensitivity: 1.2 }
    }
}

/// Zooms around the pointer on wheel and pinch input.
#[derive(Debug, Clone)]
pub struct ZoomCanvas {
    options: ZoomCanvasOptions,
}

impl ZoomCanvas {
    pub fn new(options: ZoomCanvasOptions) -> Self {
        Self { options }
    }

    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let options: ZoomCanvasOptions = parse_options("zoom-canvas", options)?;
        if !(options.sensitivity.is_finite() && options.sensitivity > 1.0) {
            return Err(Error::InvalidOptions {
                key: "zoom-canvas".to_string(),
                message: format!("sensitivity must be > 1, got {}", options.sensitivity),
            });
        }
        Ok(Self::new(options))
    }
}

impl Behavior for ZoomCanvas {
    fn handles(&self, kind: EventKind) -> bool {
        matches!(kind, EventKind::Wheel | EventKind::Pinch)
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut BehaviorContext<'_>) -> Result<Propagation> {
        let (ratio, x, y) = match *event {
            // Scrolling up (negative delta) zooms in.
            InputEvent::Wheel { x, y, delta_y } => {
                (self.options.sensitivity.powf(-delta_y / 100.0), x, y)
            }
            InputEvent::Pinch { x, y, scale } => (scale, x, y),
            _ => return Ok(Propagation::Continue),
        };
        ctx.commands.push(Command::ZoomBy {
            ratio,
            anchor: Some([x, y]),
        });
        Ok(Propagation::Stop)
    }

    fn cancel(&mut self, _ctx: &mut BehaviorContext<'_>) {}

    fn phase(&self) -> Phase {
        Phase::Idle
    }
}
