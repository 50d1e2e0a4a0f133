pub mod circular;
pub mod force;
pub mod grid;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{Graph, LayoutResult};

pub use force::ForceOptions;

/// Layout algorithm selected by name, as it appears in graph options:
/// `{"type": "force", "linkDistance": 120}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Algorithm {
    Grid(GridOptions),
    Circular(CircularOptions),
    Force(ForceOptions),
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Grid(GridOptions::default())
    }
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Grid(_) => "grid",
            Algorithm::Circular(_) => "circular",
            Algorithm::Force(_) => "force",
        }
    }

    /// Sets the layout center when the options leave it unset.
    pub fn with_default_center(mut self, center: [f64; 2]) -> Self {
        let slot = match &mut self {
            Algorithm::Grid(o) => &mut o.center,
            Algorithm::Circular(o) => &mut o.center,
            Algorithm::Force(o) => &mut o.center,
        };
        slot.get_or_insert(center);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    /// Column count. Derived from `rows` or `ceil(sqrt(n))` when unset.
    pub cols: Option<usize>,
    pub rows: Option<usize>,
    /// Cell size. Defaults to the largest node extent plus `gap`.
    pub cell_width: Option<f64>,
    pub cell_height: Option<f64>,
    pub gap: Option<f64>,
    pub center: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircularOptions {
    /// Ring radius. Derived from the node count and size when unset.
    pub radius: Option<f64>,
    /// Angle of the first node, in radians.
    pub start_angle: f64,
    pub clockwise: Option<bool>,
    pub center: Option<[f64; 2]>,
}

/// Outcome of one [`LayoutRun::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Intermediate positions. The run wants to be stepped again.
    Progress(LayoutResult),
    /// Final positions. Stepping again returns the same result.
    Done(LayoutResult),
}

impl Step {
    pub fn result(&self) -> &LayoutResult {
        match self {
            Step::Progress(r) | Step::Done(r) => r,
        }
    }

    pub fn into_result(self) -> LayoutResult {
        match self {
            Step::Progress(r) | Step::Done(r) => r,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done(_))
    }
}

/// An in-flight layout computation that owns a snapshot of its input graph.
pub trait LayoutRun: Send {
    /// Advances by one chunk of work.
    fn step(&mut self) -> Result<Step>;
}

pub trait Layout {
    /// Validates the graph and snapshots it into a run.
    fn start(&self, graph: &Graph) -> Result<Box<dyn LayoutRun>>;

    /// Runs to completion.
    fn compute(&self, graph: &Graph) -> Result<LayoutResult> {
        let mut run = self.start(graph)?;
        loop {
            if let Step::Done(result) = run.step()? {
                return Ok(result);
            }
        }
    }
}

impl Layout for Algorithm {
    fn start(&self, graph: &Graph) -> Result<Box<dyn LayoutRun>> {
        match self {
            Algorithm::Grid(o) => grid::GridLayout::new(o.clone()).start(graph),
            Algorithm::Circular(o) => circular::CircularLayout::new(o.clone()).start(graph),
            Algorithm::Force(o) => force::ForceLayout::new(o.clone()).start(graph),
        }
    }
}

/// Run for algorithms that finish in a single pass.
pub(crate) struct Immediate(pub(crate) LayoutResult);

impl LayoutRun for Immediate {
    fn step(&mut self) -> Result<Step> {
        Ok(Step::Done(self.0.clone()))
    }
}
