//! Force-directed layout with optional cluster attraction.
//!
//! Every iteration accumulates three kinds of force on each node:
//! - pairwise repulsion `node_strength / d²`, with `d` floored at `min_distance`;
//! - spring attraction along edges `edge_strength * (d - link_distance)`;
//! - a pull toward `center` scaled by `gravity` and, when clustering is on, a pull toward the
//!   centroid of the node's cluster scaled by `cluster_node_strength`.
//!
//! Velocities are damped every iteration and capped at `max_speed`. The run finishes when the
//! kinetic energy drops below `min_energy` or after `max_iterations`.

mod rng;

use std::f64::consts::TAU;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::algo::circular::{fitting_radius, ring_point};
use crate::algo::{Layout, LayoutRun, Step};
use crate::error::{Error, Result};
use crate::graph::{Graph, LayoutResult, Point};

use rng::XorShift64Star;

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const COINCIDENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceOptions {
    /// Rest length of edge springs.
    pub link_distance: f64,
    pub edge_strength: f64,
    /// Repulsion coefficient between every pair of nodes.
    pub node_strength: f64,
    /// Distance floor used by repulsion.
    pub min_distance: f64,
    pub gravity: f64,
    pub center: Option<[f64; 2]>,
    /// Velocity multiplier applied every iteration, in `(0, 1]`.
    pub damping: f64,
    pub max_speed: f64,
    pub clustering: bool,
    pub cluster_node_strength: f64,
    /// Node data field read as the cluster key.
    pub cluster_by: String,
    pub max_iterations: usize,
    pub min_energy: f64,
    /// Iterations per [`LayoutRun::step`].
    pub iterations_per_step: usize,
    /// Seeds random initial placement. Without a seed, existing positions are reused and the rest
    /// are laid out on a ring.
    pub seed: Option<u64>,
}

impl Default for ForceOptions {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            edge_strength: 0.1,
            node_strength: 20_000.0,
            min_distance: 20.0,
            gravity: 0.01,
            center: None,
            damping: 0.9,
            max_speed: 50.0,
            clustering: false,
            cluster_node_strength: 0.2,
            cluster_by: "cluster".to_string(),
            max_iterations: 300,
            min_energy: 0.1,
            iterations_per_step: 10,
            seed: None,
        }
    }
}

impl ForceOptions {
    fn validate(&self) -> Result<()> {
        let finite = [
            ("linkDistance", self.link_distance),
            ("edgeStrength", self.edge_strength),
            ("nodeStrength", self.node_strength),
            ("minDistance", self.min_distance),
            ("gravity", self.gravity),
            ("damping", self.damping),
            ("maxSpeed", self.max_speed),
            ("clusterNodeStrength", self.cluster_node_strength),
            ("minEnergy", self.min_energy),
        ];
        for (name, value) in finite {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidOptions {
                    message: format!("{name} must be finite and non-negative, got {value}"),
                });
            }
        }
        if self.damping == 0.0 || self.damping > 1.0 {
            return Err(Error::InvalidOptions {
                message: format!("damping must be in (0, 1], got {}", self.damping),
            });
        }
        if self.min_distance == 0.0 {
            return Err(Error::InvalidOptions {
                message: "minDistance must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    options: ForceOptions,
}

impl ForceLayout {
    pub fn new(options: ForceOptions) -> Self {
        Self { options }
    }
}

impl Layout for ForceLayout {
    fn start(&self, graph: &Graph) -> Result<Box<dyn LayoutRun>> {
        self.options.validate()?;
        graph.validate()?;
        Ok(Box::new(Simulation::new(graph, self.options.clone())?))
    }
}

#[derive(Debug, Clone)]
struct Body {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    fixed: bool,
    cluster: Option<usize>,
}

#[derive(Debug)]
struct Simulation {
    ids: Vec<String>,
    bodies: Vec<Body>,
    links: Vec<(usize, usize)>,
    cluster_count: usize,
    options: ForceOptions,
    center: Point,
    iteration: usize,
    energy: f64,
    done: bool,
}

impl Simulation {
    fn new(graph: &Graph, options: ForceOptions) -> Result<Self> {
        let center = Point::from(options.center.unwrap_or_default());
        let index = graph.index();
        let links = graph
            .edges
            .iter()
            .filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
            .filter(|(a, b)| a != b)
            .collect();

        let mut cluster_ids: FxHashMap<&str, usize> = FxHashMap::default();
        let mut clusters = Vec::with_capacity(graph.nodes.len());
        for n in &graph.nodes {
            let cluster = match (&n.cluster, options.clustering) {
                (Some(key), true) => {
                    let next = cluster_ids.len();
                    Some(*cluster_ids.entry(key.as_str()).or_insert(next))
                }
                _ => None,
            };
            clusters.push(cluster);
        }

        let start = initial_positions(graph, &options, center);
        let bodies = graph
            .nodes
            .iter()
            .zip(start)
            .zip(clusters)
            .map(|((n, p), cluster)| Body {
                x: p.x,
                y: p.y,
                vx: 0.0,
                vy: 0.0,
                fixed: n.fixed,
                cluster,
            })
            .collect();

        let mut sim = Self {
            ids: graph.nodes.iter().map(|n| n.id.clone()).collect(),
            bodies,
            links,
            cluster_count: cluster_ids.len(),
            options,
            center,
            iteration: 0,
            energy: f64::INFINITY,
            done: false,
        };
        sim.check_finite()?;
        if sim.bodies.iter().all(|b| b.fixed) || sim.options.max_iterations == 0 {
            sim.done = true;
        }
        Ok(sim)
    }

    fn result(&self) -> LayoutResult {
        let mut result = LayoutResult::default();
        for (id, b) in self.ids.iter().zip(&self.bodies) {
            result.positions.insert(id.clone(), Point::new(b.x, b.y));
        }
        result
    }

    fn check_finite(&self) -> Result<()> {
        match self
            .bodies
            .iter()
            .position(|b| !(b.x.is_finite() && b.y.is_finite()))
        {
            Some(idx) => Err(Error::NonFinitePosition {
                node_id: self.ids[idx].clone(),
                iteration: self.iteration,
            }),
            None => Ok(()),
        }
    }

    fn cluster_centroids(&self) -> Vec<Point> {
        let mut sums = vec![(0.0, 0.0, 0usize); self.cluster_count];
        for b in &self.bodies {
            if let Some(c) = b.cluster {
                sums[c].0 += b.x;
                sums[c].1 += b.y;
                sums[c].2 += 1;
            }
        }
        sums.into_iter()
            .map(|(x, y, n)| Point::new(x / n.max(1) as f64, y / n.max(1) as f64))
            .collect()
    }

    fn tick(&mut self) -> Result<()> {
        let o = &self.options;
        let n = self.bodies.len();
        let mut forces = vec![(0.0f64, 0.0f64); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                let mut dx = a.x - b.x;
                let mut dy = a.y - b.y;
                let mut dist = (dx * dx + dy * dy).sqrt();
                if dist < COINCIDENT_EPSILON {
                    let angle = GOLDEN_ANGLE * (i * n + j) as f64;
                    (dx, dy, dist) = (angle.cos(), angle.sin(), 1.0);
                }
                let d = dist.max(o.min_distance);
                let f = o.node_strength / (d * d);
                let (ux, uy) = (dx / dist, dy / dist);
                forces[i].0 += f * ux;
                forces[i].1 += f * uy;
                forces[j].0 -= f * ux;
                forces[j].1 -= f * uy;
            }
        }

        for &(s, t) in &self.links {
            let (a, b) = (&self.bodies[s], &self.bodies[t]);
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < COINCIDENT_EPSILON {
                continue;
            }
            let f = o.edge_strength * (dist - o.link_distance);
            let (fx, fy) = (f * dx / dist, f * dy / dist);
            forces[s].0 += fx;
            forces[s].1 += fy;
            forces[t].0 -= fx;
            forces[t].1 -= fy;
        }

        let centroids = self.cluster_centroids();
        for (b, force) in self.bodies.iter().zip(forces.iter_mut()) {
            force.0 += (self.center.x - b.x) * o.gravity;
            force.1 += (self.center.y - b.y) * o.gravity;
            if let Some(c) = b.cluster {
                force.0 += (centroids[c].x - b.x) * o.cluster_node_strength;
                force.1 += (centroids[c].y - b.y) * o.cluster_node_strength;
            }
        }

        let mut energy = 0.0;
        for (b, (fx, fy)) in self.bodies.iter_mut().zip(forces) {
            if b.fixed {
                b.vx = 0.0;
                b.vy = 0.0;
                continue;
            }
            b.vx = (b.vx + fx) * o.damping;
            b.vy = (b.vy + fy) * o.damping;
            let speed = (b.vx * b.vx + b.vy * b.vy).sqrt();
            if speed > o.max_speed {
                let scale = o.max_speed / speed;
                b.vx *= scale;
                b.vy *= scale;
            }
            b.x += b.vx;
            b.y += b.vy;
            energy += 0.5 * (b.vx * b.vx + b.vy * b.vy);
        }

        self.iteration += 1;
        self.energy = energy;
        self.check_finite()
    }
}

impl LayoutRun for Simulation {
    fn step(&mut self) -> Result<Step> {
        if self.done {
            return Ok(Step::Done(self.result()));
        }
        for _ in 0..self.options.iterations_per_step.max(1) {
            self.tick()?;
            if self.energy < self.options.min_energy
                || self.iteration >= self.options.max_iterations
            {
                self.done = true;
                tracing::debug!(
                    iterations = self.iteration,
                    energy = self.energy,
                    "force layout finished"
                );
                return Ok(Step::Done(self.result()));
            }
        }
        tracing::trace!(
            iteration = self.iteration,
            energy = self.energy,
            "force layout progress"
        );
        Ok(Step::Progress(self.result()))
    }
}

fn initial_positions(graph: &Graph, options: &ForceOptions, center: Point) -> Vec<Point> {
    let n = graph.nodes.len();
    match options.seed {
        Some(seed) => {
            let mut rng = XorShift64Star::new(seed);
            let half = options.link_distance * (n as f64).sqrt().max(1.0) / 2.0;
            graph
                .nodes
                .iter()
                .map(|node| {
                    let p = Point::new(
                        center.x + rng.next_f64_signed() * half,
                        center.y + rng.next_f64_signed() * half,
                    );
                    match (node.fixed, node.position) {
                        (true, Some(existing)) => existing,
                        _ => p,
                    }
                })
                .collect()
        }
        None => {
            let radius = fitting_radius(n, graph.max_node_extent(), options.link_distance / 2.0);
            graph
                .nodes
                .iter()
                .enumerate()
                .map(|(idx, node)| match node.position {
                    Some(existing) => existing,
                    None if n == 1 => center,
                    None => ring_point(center, radius, TAU * idx as f64 / n as f64),
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    #[test]
    fn coincident_nodes_are_pushed_apart() {
        let graph = Graph {
            nodes: vec![Node::new("a").at(0.0, 0.0), Node::new("b").at(0.0, 0.0)],
            edges: Vec::new(),
        };
        let result = ForceLayout::default().compute(&graph).unwrap();
        let (a, b) = (result.get("a").unwrap(), result.get("b").unwrap());
        assert!(a.distance(b) > 1.0);
    }

    #[test]
    fn unseeded_runs_reuse_existing_positions() {
        let graph = Graph {
            nodes: vec![Node::new("a").at(5.0, 7.0), Node::new("b")],
            edges: vec![Edge::new("e", "a", "b")],
        };
        let start = initial_positions(&graph, &ForceOptions::default(), Point::default());
        assert_eq!(start[0], Point::new(5.0, 7.0));
        assert!(start[1].distance(Point::default()) > 0.0);
    }

    #[test]
    fn zero_damping_is_rejected() {
        let layout = ForceLayout::new(ForceOptions {
            damping: 0.0,
            ..Default::default()
        });
        assert!(matches!(
            layout.start(&Graph::default()),
            Err(Error::InvalidOptions { .. })
        ));
    }
}
