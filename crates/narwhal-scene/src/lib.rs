#![forbid(unsafe_code)]

//! Scene model for `narwhal`.
//!
//! The scene is the authoritative in-memory graph: nodes, edges and combos (node groups), each
//! carrying opaque application `data`, resolved visual `style` and a set of named `states`.
//!
//! Every mutation is validated before anything is changed, so a failing call never leaves the
//! scene partially updated. Successful mutations append [`SceneEvent`]s to an internal change log
//! that the owning graph drains and fans out to subscribers.

pub mod error;
pub mod scene;

pub use error::{Error, Result};
pub use scene::element::{
    Combo, Edge, Element, ElementKind, GraphData, Node, state, DEFAULT_NODE_SIZE,
};
pub use scene::event::SceneEvent;
pub use scene::style::Style;
pub use scene::{Bounds, Scene};
