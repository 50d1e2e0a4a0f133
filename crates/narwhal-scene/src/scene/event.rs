//! Change notifications recorded by the scene.

use serde::Serialize;

use super::element::ElementKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SceneEvent {
    ElementAdded {
        id: String,
        kind: ElementKind,
    },
    ElementRemoved {
        id: String,
        kind: ElementKind,
    },
    StyleChanged {
        id: String,
        kind: ElementKind,
    },
    StateChanged {
        id: String,
        kind: ElementKind,
        state: String,
        enabled: bool,
    },
    ComboChanged {
        node: String,
        combo: Option<String>,
    },
    /// Layout or drag wrote new positions for the listed nodes.
    PositionsChanged {
        ids: Vec<String>,
    },
}

impl SceneEvent {
    /// Whether the event changes the topology a layout was computed for.
    pub fn is_topology_change(&self) -> bool {
        matches!(
            self,
            SceneEvent::ElementAdded { .. }
                | SceneEvent::ElementRemoved { .. }
                | SceneEvent::ComboChanged { .. }
        )
    }

    pub fn element_id(&self) -> Option<&str> {
        match self {
            SceneEvent::ElementAdded { id, .. }
            | SceneEvent::ElementRemoved { id, .. }
            | SceneEvent::StyleChanged { id, .. }
            | SceneEvent::StateChanged { id, .. } => Some(id),
            SceneEvent::ComboChanged { node, .. } => Some(node),
            SceneEvent::PositionsChanged { .. } => None,
        }
    }
}
