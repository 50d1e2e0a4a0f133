use std::f64::consts::TAU;

use crate::algo::{CircularOptions, Immediate, Layout, LayoutRun};
use crate::error::Result;
use crate::graph::{Graph, LayoutResult, Point};

const MIN_RADIUS: f64 = 50.0;

/// Places nodes evenly on one ring, in graph node order.
#[derive(Debug, Clone, Default)]
pub struct CircularLayout {
    options: CircularOptions,
}

impl CircularLayout {
    pub fn new(options: CircularOptions) -> Self {
        Self { options }
    }
}

/// Radius that keeps `n` nodes of the given extent from touching on the ring.
pub(crate) fn fitting_radius(n: usize, extent: f64, spacing: f64) -> f64 {
    ((n as f64) * (extent + spacing) / TAU).max(MIN_RADIUS)
}

pub(crate) fn ring_point(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

impl Layout for CircularLayout {
    fn start(&self, graph: &Graph) -> Result<Box<dyn LayoutRun>> {
        graph.validate()?;
        let o = &self.options;
        let n = graph.nodes.len();
        let center = Point::from(o.center.unwrap_or_default());
        let radius = o
            .radius
            .unwrap_or_else(|| fitting_radius(n, graph.max_node_extent(), 20.0));
        let sign = if o.clockwise.unwrap_or(true) { 1.0 } else { -1.0 };

        let mut result = LayoutResult::default();
        if n == 1 {
            result.positions.insert(graph.nodes[0].id.clone(), center);
        } else {
            let step = TAU / n.max(1) as f64;
            for (idx, node) in graph.nodes.iter().enumerate() {
                let angle = o.start_angle + sign * step * idx as f64;
                result
                    .positions
                    .insert(node.id.clone(), ring_point(center, radius, angle));
            }
        }
        Ok(Box::new(Immediate(result)))
    }
}
