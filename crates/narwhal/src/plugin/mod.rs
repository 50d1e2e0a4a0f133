//! Satellite features that observe the scene and viewport without owning them.

mod minimap;
mod tooltip;

use std::any::Any;

use narwhal_render::{Frame, Transform, Viewport};
use narwhal_scene::{Scene, SceneEvent};

use crate::behavior::Propagation;
use crate::command::Commands;
use crate::error::Result;
use crate::extension::ExtensionRegistry;
use crate::input::{InputEvent, Target};

pub use minimap::{Minimap, MinimapOptions, MinimapPosition, Rect};
pub use tooltip::{Tooltip, TooltipContent, TooltipOptions, Trigger};

/// Read access plus a command queue. Plugins mutate only by pushing commands.
pub struct PluginContext<'a> {
    pub scene: &'a Scene,
    pub viewport: &'a Viewport,
    pub frame: &'a Frame,
    pub commands: &'a mut Commands,
}

pub trait Plugin: Any {
    fn on_scene_change(&mut self, _events: &[SceneEvent], _ctx: &mut PluginContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_viewport_change(
        &mut self,
        _transform: &Transform,
        _ctx: &mut PluginContext<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// Sees input before behaviors. Returning [`Propagation::Stop`] hides the event from them.
    fn on_input(
        &mut self,
        _event: &InputEvent,
        _target: Option<&Target>,
        _ctx: &mut PluginContext<'_>,
    ) -> Result<Propagation> {
        Ok(Propagation::Continue)
    }

    fn on_destroy(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

pub(crate) fn register_builtins(registry: &mut ExtensionRegistry) {
    registry.insert_plugin("minimap", |o| Ok(Box::new(Minimap::from_options(o)?)));
    registry.insert_plugin("tooltip", |o| Ok(Box::new(Tooltip::from_options(o)?)));
}
