#![forbid(unsafe_code)]

//! Headless graph layout algorithms.
//!
//! `beluga` is used by `narwhal` to position scene nodes. Every algorithm is exposed two ways:
//! - [`layout`] runs an [`Algorithm`] to completion and returns the final positions;
//! - [`Layout::start`] returns a [`LayoutRun`] that yields progressive positions in chunks, so a
//!   caller can redraw between iterations and drop the run when a newer request supersedes it.

pub mod algo;
pub mod error;
pub mod graph;

pub use algo::{
    Algorithm, CircularOptions, ForceOptions, GridOptions, Layout, LayoutRun, Step,
    circular::CircularLayout, force::ForceLayout, grid::GridLayout,
};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, LayoutResult, Node, Point};

/// Headless layout entry point.
pub fn layout(graph: &Graph, algorithm: &Algorithm) -> Result<LayoutResult> {
    algorithm.compute(graph)
}
