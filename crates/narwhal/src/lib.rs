#![forbid(unsafe_code)]

//! `narwhal` is a headless graph visualization engine.
//!
//! A [`Graph`] owns one scene, one viewport and one layout task. The host attaches a
//! [`RenderTarget`], awaits [`Graph::render`], then feeds input through [`Graph::dispatch`] and
//! drives progressive layout with [`Graph::tick`]. Behaviors and plugins are resolved by key from
//! an [`ExtensionRegistry`] passed to [`Graph::new`].
//!
//! Crates:
//! - `narwhal-scene`: nodes, edges, combos and the change log
//! - `beluga`: layout algorithms
//! - `narwhal-render`: viewport math, shapes, draw-op diffing

pub mod behavior;
pub mod command;
pub mod error;
pub mod extension;
pub mod graph;
pub mod input;
pub mod options;
pub mod plugin;

mod scheduler;

pub use beluga::{Algorithm, CircularOptions, ForceOptions, GridOptions};
pub use command::Command;
pub use error::{Error, ExtensionFailure, Result};
pub use extension::{Category, EnableFn, Extension, ExtensionRegistry};
pub use graph::{Graph, Subscription, TickStatus};
pub use input::{EventKind, InputEvent, Target};
pub use options::{BehaviorSpec, ExtensionSpec, GraphOptions, PluginSpec};

pub use narwhal_render::{
    DrawItem, DrawOp, Placement, Point, Primitive, RecordingTarget, RenderTarget, Shape,
    ShapeAttrs, Transform, Viewport, ViewportOptions,
};
pub use narwhal_scene::{
    Bounds, Combo, Edge, Element, ElementKind, GraphData, Node, SceneEvent, Style, state,
};
