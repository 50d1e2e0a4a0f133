//! Sinks for draw operations.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::diff::DrawOp;
use crate::error::{Error, Result};
use crate::frame::DrawItem;
use crate::viewport::Transform;

/// A rendering backend. Drawing itself happens outside this crate.
pub trait RenderTarget {
    /// Whether the target is bound to a container it can draw into.
    fn is_attached(&self) -> bool {
        true
    }

    fn apply(&mut self, ops: &[DrawOp]) -> Result<()>;
}

/// Shared handle, so the host can inspect a target after handing it to a graph.
impl<T: RenderTarget> RenderTarget for Rc<RefCell<T>> {
    fn is_attached(&self) -> bool {
        self.borrow().is_attached()
    }

    fn apply(&mut self, ops: &[DrawOp]) -> Result<()> {
        self.borrow_mut().apply(ops)
    }
}

/// Target that keeps every batch and mirrors the resulting item state. Used headless.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    batches: Vec<Vec<DrawOp>>,
    items: IndexMap<String, DrawItem, FxBuildHasher>,
    transform: Option<Transform>,
    detached: bool,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// A target with no container; rendering into it fails.
    pub fn detached() -> Self {
        Self {
            detached: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> &[Vec<DrawOp>] {
        &self.batches
    }

    pub fn last_batch(&self) -> Option<&[DrawOp]> {
        self.batches.last().map(Vec::as_slice)
    }

    pub fn take_batches(&mut self) -> Vec<Vec<DrawOp>> {
        std::mem::take(&mut self.batches)
    }

    pub fn items(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.values()
    }

    pub fn item(&self, id: &str) -> Option<&DrawItem> {
        self.items.get(id)
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }
}

impl RenderTarget for RecordingTarget {
    fn is_attached(&self) -> bool {
        !self.detached
    }

    fn apply(&mut self, ops: &[DrawOp]) -> Result<()> {
        if self.detached {
            return Err(Error::MissingContainer);
        }
        for op in ops {
            match op {
                DrawOp::Create { item } => {
                    self.items.insert(item.id.clone(), item.clone());
                }
                DrawOp::UpdateStyle {
                    id,
                    shape,
                    primitives,
                } => {
                    let item = self.items.get_mut(id).ok_or_else(|| Error::Backend {
                        message: format!("update for unknown item {id}"),
                    })?;
                    item.shape = shape.clone();
                    item.primitives = primitives.clone();
                }
                DrawOp::UpdateTransform { id, placement } => {
                    let item = self.items.get_mut(id).ok_or_else(|| Error::Backend {
                        message: format!("move for unknown item {id}"),
                    })?;
                    item.placement = *placement;
                }
                DrawOp::Remove { id } => {
                    self.items.shift_remove(id);
                }
                DrawOp::SetViewport { transform, .. } => {
                    self.transform = Some(*transform);
                }
            }
        }
        self.batches.push(ops.to_vec());
        Ok(())
    }
}
