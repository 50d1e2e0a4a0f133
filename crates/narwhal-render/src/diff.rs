//! Reconciles frames against the last emitted state.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;

use crate::frame::{DrawItem, Frame, Placement};
use crate::shape::Primitive;
use crate::viewport::{Transform, Viewport};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Create {
        item: DrawItem,
    },
    UpdateStyle {
        id: String,
        shape: String,
        primitives: Vec<Primitive>,
    },
    UpdateTransform {
        id: String,
        placement: Placement,
    },
    Remove {
        id: String,
    },
    /// The world-to-screen matrix changed. `matrix` is `[a, b, c, d, e, f]`.
    SetViewport {
        matrix: [f64; 6],
        transform: Transform,
    },
}

impl DrawOp {
    pub fn id(&self) -> Option<&str> {
        match self {
            DrawOp::Create { item } => Some(&item.id),
            DrawOp::UpdateStyle { id, .. }
            | DrawOp::UpdateTransform { id, .. }
            | DrawOp::Remove { id } => Some(id),
            DrawOp::SetViewport { .. } => None,
        }
    }
}

/// Keeps the last emitted frame and viewport matrix.
#[derive(Debug, Default)]
pub struct RenderDiffer {
    last: IndexMap<String, DrawItem, FxBuildHasher>,
    last_matrix: Option<[f64; 6]>,
}

impl RenderDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits the operations that turn the last emitted state into `frame` under `viewport`.
    ///
    /// Order: removals, the viewport change, then creations and updates in frame order.
    pub fn diff(&mut self, frame: &Frame, viewport: &Viewport) -> Vec<DrawOp> {
        let mut ops = Vec::new();

        let removed: Vec<String> = self
            .last
            .keys()
            .filter(|id| !frame.contains(id))
            .cloned()
            .collect();
        for id in removed {
            self.last.shift_remove(&id);
            ops.push(DrawOp::Remove { id });
        }

        let matrix = viewport.affine();
        if self.last_matrix != Some(matrix) {
            self.last_matrix = Some(matrix);
            ops.push(DrawOp::SetViewport {
                matrix,
                transform: viewport.transform(),
            });
        }

        for item in frame.items() {
            match self.last.get_mut(&item.id) {
                None => {
                    self.last.insert(item.id.clone(), item.clone());
                    ops.push(DrawOp::Create { item: item.clone() });
                }
                Some(prev) => {
                    if prev.shape != item.shape || prev.primitives != item.primitives {
                        prev.shape = item.shape.clone();
                        prev.primitives = item.primitives.clone();
                        ops.push(DrawOp::UpdateStyle {
                            id: item.id.clone(),
                            shape: item.shape.clone(),
                            primitives: item.primitives.clone(),
                        });
                    }
                    if prev.placement != item.placement {
                        prev.placement = item.placement;
                        ops.push(DrawOp::UpdateTransform {
                            id: item.id.clone(),
                            placement: item.placement,
                        });
                    }
                }
            }
        }

        tracing::trace!(ops = ops.len(), items = frame.len(), "render diff");
        ops
    }

    /// Forgets the emitted state so the next diff recreates everything.
    pub fn reset(&mut self) {
        self.last.clear();
        self.last_matrix = None;
    }

    /// The state a target holds after applying every op emitted so far.
    pub fn emitted(&self) -> impl Iterator<Item = &DrawItem> {
        self.last.values()
    }
}
