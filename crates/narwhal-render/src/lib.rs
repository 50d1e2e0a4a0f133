#![forbid(unsafe_code)]

//! Rendering half of narwhal: the viewport transform, the shape registry, frame building,
//! draw-op diffing and hit testing. Nothing here draws pixels; a [`RenderTarget`] consumes the
//! abstract [`DrawOp`]s.

pub mod diff;
pub mod error;
pub mod frame;
pub mod pick;
pub mod shape;
pub mod target;
pub mod viewport;

pub use diff::{DrawOp, RenderDiffer};
pub use error::{Error, Result};
pub use frame::{DrawItem, Frame, Placement, build_frame};
pub use pick::pick;
pub use shape::{
    CircleShape, ComboRectShape, LineShape, Primitive, RectShape, Shape, ShapeAttrs,
    ShapeRegistry,
};
pub use target::{RecordingTarget, RenderTarget};
pub use viewport::{Point, Transform, Viewport, ViewportError, ViewportOptions};
