use crate::algo::{GridOptions, Immediate, Layout, LayoutRun};
use crate::error::{Error, Result};
use crate::graph::{Graph, LayoutResult, Point};

const DEFAULT_GAP: f64 = 40.0;

/// Places nodes row-major on a regular grid centered on `center`, in graph node order.
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    options: GridOptions,
}

impl GridLayout {
    pub fn new(options: GridOptions) -> Self {
        Self { options }
    }

    fn dimensions(&self, n: usize) -> Result<(usize, usize)> {
        let o = &self.options;
        if o.cols == Some(0) || o.rows == Some(0) {
            return Err(Error::InvalidOptions {
                message: "grid rows and cols must be positive".to_string(),
            });
        }
        let cols = match (o.cols, o.rows) {
            (Some(c), _) => c,
            (None, Some(r)) => n.div_ceil(r).max(1),
            (None, None) => (n as f64).sqrt().ceil().max(1.0) as usize,
        };
        Ok((cols, n.div_ceil(cols).max(1)))
    }
}

impl Layout for GridLayout {
    fn start(&self, graph: &Graph) -> Result<Box<dyn LayoutRun>> {
        graph.validate()?;
        let n = graph.nodes.len();
        let (cols, rows) = self.dimensions(n)?;
        let o = &self.options;
        let gap = o.gap.unwrap_or(DEFAULT_GAP);
        let extent = graph.max_node_extent();
        let cell_w = o.cell_width.unwrap_or(extent + gap);
        let cell_h = o.cell_height.unwrap_or(extent + gap);
        let center = Point::from(o.center.unwrap_or_default());

        let used_cols = cols.min(n.max(1));
        let left = center.x - (used_cols as f64 - 1.0) * cell_w / 2.0;
        let top = center.y - (rows as f64 - 1.0) * cell_h / 2.0;

        let mut result = LayoutResult::default();
        for (idx, node) in graph.nodes.iter().enumerate() {
            let (row, col) = (idx / cols, idx % cols);
            result.positions.insert(
                node.id.clone(),
                Point::new(left + col as f64 * cell_w, top + row as f64 * cell_h),
            );
        }
        tracing::debug!(nodes = n, cols, rows, "grid layout");
        Ok(Box::new(Immediate(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn nodes(n: usize) -> Graph {
        Graph {
            nodes: (0..n).map(|i| Node::new(format!("n{i}")).sized(20.0, 20.0)).collect(),
            edges: Vec::new(),
        }
    }

    #[test]
    fn default_columns_are_ceil_sqrt() {
        let layout = GridLayout::default();
        assert_eq!(layout.dimensions(5).unwrap(), (3, 2));
        assert_eq!(layout.dimensions(9).unwrap(), (3, 3));
        assert_eq!(layout.dimensions(0).unwrap(), (1, 1));
    }

    #[test]
    fn rows_derive_columns() {
        let layout = GridLayout::new(GridOptions {
            rows: Some(2),
            ..Default::default()
        });
        assert_eq!(layout.dimensions(7).unwrap(), (4, 2));
    }

    #[test]
    fn zero_columns_are_rejected() {
        let layout = GridLayout::new(GridOptions {
            cols: Some(0),
            ..Default::default()
        });
        assert!(matches!(
            layout.start(&nodes(3)),
            Err(Error::InvalidOptions { .. })
        ));
    }
}
