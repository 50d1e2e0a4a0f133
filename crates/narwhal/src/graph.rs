//! The graph instance: one scene, one viewport, one layout task, one render target.

use beluga::{Algorithm, Layout};
use narwhal_render::{
    Frame, Point, RenderDiffer, RenderTarget, ShapeRegistry, Transform, Viewport, ViewportError,
    build_frame, pick,
};
use narwhal_scene::{
    Combo, Edge, Element, GraphData, Node, Scene, SceneEvent, Style, state,
};
use serde_json::Value;

use crate::behavior::{Behavior, BehaviorContext, Phase, Propagation};
use crate::command::{Command, Commands, Issuer};
use crate::error::{Error, ExtensionFailure, Result};
use crate::extension::{Category, EnableFn, ExtensionRegistry};
use crate::input::{EventKind, InputEvent, Target};
use crate::options::{ExtensionSpec, GraphOptions};
use crate::plugin::{Plugin, PluginContext};
use crate::scheduler::{LayoutTask, yield_now};

/// Upper bound on commands applied in one drain. Extensions that keep reacting to their own
/// commands are cut off here.
const MAX_COMMANDS_PER_DRAIN: usize = 1024;

/// Handle returned by the `on_*` subscription methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStatus {
    /// A layout run still has work left.
    pub layout_running: bool,
    /// Draw operations pushed to the target.
    pub ops: usize,
}

struct Slot<T: ?Sized> {
    key: String,
    enable: Option<EnableFn>,
    enabled: bool,
    inner: Box<T>,
}

impl<T: ?Sized> Slot<T> {
    fn new(spec: &ExtensionSpec, inner: Box<T>) -> Self {
        Self {
            key: spec.key.clone(),
            enable: spec.enable.clone(),
            enabled: spec.enabled_by_options(),
            inner,
        }
    }

    fn accepts(&self, event: &InputEvent, target: Option<&Target>) -> bool {
        self.enabled && self.enable.as_ref().is_none_or(|f| f(event, target))
    }
}

type SceneListener = Box<dyn FnMut(&SceneEvent)>;
type ViewportListener = Box<dyn FnMut(&Transform)>;
type ErrorHook = Box<dyn FnMut(&ExtensionFailure)>;

pub struct Graph {
    scene: Scene,
    viewport: Viewport,
    layout: Algorithm,
    custom_layout: Option<Box<dyn Layout>>,
    shapes: ShapeRegistry,
    behaviors: Vec<Slot<dyn Behavior>>,
    plugins: Vec<Slot<dyn Plugin>>,
    commands: Commands,
    differ: RenderDiffer,
    frame: Frame,
    frame_revision: Option<u64>,
    target: Option<Box<dyn RenderTarget>>,
    task: Option<LayoutTask>,
    generation: u64,
    scene_listeners: Vec<(Subscription, SceneListener)>,
    viewport_listeners: Vec<(Subscription, ViewportListener)>,
    next_subscription: u64,
    error_hook: Option<ErrorHook>,
    failures: Vec<ExtensionFailure>,
    auto_fit: bool,
    fit_padding: f64,
    relayout_on_change: bool,
    rendered: bool,
    fitted: bool,
    destroyed: bool,
}

impl Graph {
    /// Builds a graph, resolving every behavior and plugin key against `registry`.
    ///
    /// Unknown keys fail here with [`Error::UnknownBehavior`] / [`Error::UnknownPlugin`].
    pub fn new(options: GraphOptions, registry: &ExtensionRegistry) -> Result<Self> {
        let GraphOptions {
            data,
            layout,
            viewport,
            behaviors,
            plugins,
            auto_fit,
            fit_padding,
            relayout_on_change,
        } = options;

        let viewport = Viewport::new(viewport)?;
        let behaviors = behaviors
            .iter()
            .map(|spec| -> Result<Slot<dyn Behavior>> {
                Ok(Slot::new(spec, registry.create_behavior(spec)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let plugins = plugins
            .iter()
            .map(|spec| -> Result<Slot<dyn Plugin>> {
                Ok(Slot::new(spec, registry.create_plugin(spec)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let scene = Scene::from_data(data)?;

        tracing::debug!(
            nodes = scene.node_count(),
            edges = scene.edge_count(),
            behaviors = behaviors.len(),
            plugins = plugins.len(),
            layout = layout.name(),
            "graph created"
        );

        Ok(Self {
            scene,
            viewport,
            layout,
            custom_layout: None,
            shapes: registry.shapes().clone(),
            behaviors,
            plugins,
            commands: Commands::default(),
            differ: RenderDiffer::new(),
            frame: Frame::default(),
            frame_revision: None,
            target: None,
            task: None,
            generation: 0,
            scene_listeners: Vec::new(),
            viewport_listeners: Vec::new(),
            next_subscription: 0,
            error_hook: None,
            failures: Vec::new(),
            auto_fit,
            fit_padding,
            relayout_on_change,
            rendered: false,
            fitted: false,
            destroyed: false,
        })
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(Error::Destroyed)
        } else {
            Ok(())
        }
    }

    // ---- lifecycle ----

    /// Binds the render target. The next draw recreates every item on it.
    pub fn attach(&mut self, target: impl RenderTarget + 'static) {
        self.target = Some(Box::new(target));
        self.differ.reset();
    }

    pub fn detach(&mut self) -> Option<Box<dyn RenderTarget>> {
        self.differ.reset();
        self.target.take()
    }

    /// Lays out the scene and draws it, yielding between layout chunks.
    ///
    /// Resolves once the layout has converged and the frame has been pushed to the target.
    ///
    /// # Errors
    ///
    /// - [`Error::Render`] when no attached target is bound, or the target rejects a batch. The
    ///   next draw after a rejected batch recreates every item.
    /// - [`Error::Layout`] when the layout fails to start or produces non-finite positions; the
    ///   failed run is dropped.
    ///
    /// Dangling edge or combo references never get this far: [`Graph::new`] rejects them with
    /// [`Error::Scene`], and the mutation methods reject them before touching the scene.
    pub async fn render(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if !self.target.as_ref().is_some_and(|t| t.is_attached()) {
            return Err(narwhal_render::Error::MissingContainer.into());
        }
        self.flush_scene_events()?;
        self.relayout()?;
        self.rendered = true;
        loop {
            let status = self.tick()?;
            if !status.layout_running {
                return Ok(());
            }
            yield_now().await;
        }
    }

    /// Runs one layout chunk, applies queued commands, then diffs and draws.
    pub fn tick(&mut self) -> Result<TickStatus> {
        self.ensure_alive()?;
        let step = self.task.as_mut().map(LayoutTask::step);
        match step {
            Some(Ok(step)) => {
                let done = step.is_done();
                self.apply_layout(step.into_result())?;
                if done {
                    self.task = None;
                    if self.auto_fit && !self.fitted {
                        self.fitted = true;
                        self.fit_view(self.fit_padding)?;
                    }
                }
            }
            Some(Err(err)) => {
                self.task = None;
                return Err(err.into());
            }
            None => {}
        }
        self.flush_scene_events()?;
        self.apply_commands();
        let ops = self.draw()?;
        Ok(TickStatus {
            layout_running: self.task.is_some(),
            ops,
        })
    }

    /// Tears the instance down. Every later call fails with [`Error::Destroyed`].
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for slot in &mut self.plugins {
            slot.inner.on_destroy();
        }
        self.plugins.clear();
        self.behaviors.clear();
        self.scene_listeners.clear();
        self.viewport_listeners.clear();
        self.error_hook = None;
        self.task = None;
        self.target = None;
        self.commands.clear();
        self.scene.clear();
        self.scene.drain_events();
        self.destroyed = true;
        tracing::debug!("graph destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ---- layout ----

    /// Starts a new layout run from the current scene, superseding any run in flight.
    ///
    /// Positions from the superseded run are never applied.
    pub fn relayout(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let graph = self.layout_graph();
        let (name, run) = match &self.custom_layout {
            Some(custom) => ("custom", custom.start(&graph)?),
            None => {
                let center = self.viewport.screen_to_world(self.viewport.center());
                let algorithm = self.layout.clone().with_default_center([center.x, center.y]);
                (algorithm.name(), algorithm.start(&graph)?)
            }
        };
        self.generation += 1;
        let task = LayoutTask::new(self.generation, name, run);
        if let Some(old) = self.task.replace(task) {
            tracing::debug!(
                superseded = old.generation,
                algorithm = old.algorithm,
                generation = self.generation,
                "layout superseded"
            );
        }
        Ok(())
    }

    /// Swaps the layout algorithm and starts it.
    pub fn set_layout(&mut self, layout: Algorithm) -> Result<()> {
        self.ensure_alive()?;
        self.layout = layout;
        self.custom_layout = None;
        self.relayout()
    }

    /// Runs a host-supplied layout in place of the configured algorithm until the next
    /// [`set_layout`](Self::set_layout).
    pub fn set_custom_layout(&mut self, layout: impl Layout + 'static) -> Result<()> {
        self.ensure_alive()?;
        self.custom_layout = Some(Box::new(layout));
        self.relayout()
    }

    pub fn layout_running(&self) -> bool {
        self.task.is_some()
    }

    /// Generation of the most recent layout request.
    pub fn layout_generation(&self) -> u64 {
        self.generation
    }

    fn layout_graph(&self) -> beluga::Graph {
        let cluster_by = match &self.layout {
            Algorithm::Force(o) => o.cluster_by.as_str(),
            _ => "cluster",
        };
        let nodes = self
            .scene
            .nodes()
            .map(|n| {
                let [width, height] = n.size();
                beluga::Node {
                    id: n.id.clone(),
                    width,
                    height,
                    position: n.style.position().map(|(x, y)| beluga::Point::new(x, y)),
                    cluster: match n.data.get(cluster_by) {
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(Value::Number(v)) => Some(v.to_string()),
                        _ => n.combo.clone(),
                    },
                    fixed: n.states.contains(state::PINNED),
                }
            })
            .collect();
        let edges = self
            .scene
            .edges()
            .map(|e| beluga::Edge::new(e.id.clone(), e.source.clone(), e.target.clone()))
            .collect();
        beluga::Graph { nodes, edges }
    }

    fn apply_layout(&mut self, result: beluga::LayoutResult) -> Result<()> {
        let positions: Vec<(String, (f64, f64))> = result
            .positions
            .into_iter()
            .filter(|(id, _)| self.scene.node(id).is_some())
            .map(|(id, p)| (id, (p.x, p.y)))
            .collect();
        self.scene.apply_positions(positions)?;
        Ok(())
    }

    // ---- drawing ----

    fn refresh_frame(&mut self) -> Result<()> {
        let revision = self.scene.revision();
        if self.frame_revision != Some(revision) {
            self.frame = build_frame(&self.scene, &self.shapes)?;
            self.frame_revision = Some(revision);
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<usize> {
        self.refresh_frame()?;
        if !self.rendered {
            return Ok(0);
        }
        let Some(target) = self.target.as_mut().filter(|t| t.is_attached()) else {
            return Err(narwhal_render::Error::MissingContainer.into());
        };
        let ops = self.differ.diff(&self.frame, &self.viewport);
        if ops.is_empty() {
            return Ok(0);
        }
        if let Err(err) = target.apply(&ops) {
            // The target's contents are unknown now; the next draw recreates everything.
            self.differ.reset();
            return Err(err.into());
        }
        Ok(ops.len())
    }

    /// The last frame built from the scene.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    // ---- scene mutations ----

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn add_data(&mut self, data: GraphData) -> Result<()> {
        self.ensure_alive()?;
        self.scene.load(data)?;
        self.flush_scene_events()
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> Result<()> {
        self.ensure_alive()?;
        self.scene.add_nodes(nodes)?;
        self.flush_scene_events()
    }

    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>) -> Result<()> {
        self.ensure_alive()?;
        self.scene.add_edges(edges)?;
        self.flush_scene_events()
    }

    pub fn add_combos(&mut self, combos: impl IntoIterator<Item = Combo>) -> Result<()> {
        self.ensure_alive()?;
        self.scene.add_combos(combos)?;
        self.flush_scene_events()
    }

    /// Removes an element. Returns every removed id, cascaded edges included.
    pub fn remove_element(&mut self, id: &str) -> Result<Vec<String>> {
        self.ensure_alive()?;
        let removed = self.scene.remove_element(id)?;
        self.flush_scene_events()?;
        Ok(removed)
    }

    pub fn update_element_style(&mut self, id: &str, patch: Style) -> Result<()> {
        self.ensure_alive()?;
        self.scene.update_element_style(id, patch)?;
        self.flush_scene_events()
    }

    pub fn element_data(&self, id: &str) -> Result<Element<'_>> {
        self.ensure_alive()?;
        Ok(self.scene.element(id)?)
    }

    pub fn hide_element(&mut self, id: &str) -> Result<bool> {
        self.set_element_state(id, state::HIDDEN, true)
    }

    pub fn show_element(&mut self, id: &str) -> Result<bool> {
        self.set_element_state(id, state::HIDDEN, false)
    }

    pub fn set_element_state(&mut self, id: &str, name: &str, enabled: bool) -> Result<bool> {
        self.ensure_alive()?;
        let changed = self.scene.set_element_state(id, name, enabled)?;
        self.flush_scene_events()?;
        Ok(changed)
    }

    pub fn set_node_combo(&mut self, node: &str, combo: Option<&str>) -> Result<bool> {
        self.ensure_alive()?;
        let changed = self.scene.set_node_combo(node, combo)?;
        self.flush_scene_events()?;
        Ok(changed)
    }

    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> Result<bool> {
        self.ensure_alive()?;
        let moved = self.scene.apply_positions([(id, (x, y))])? > 0;
        self.flush_scene_events()?;
        Ok(moved)
    }

    // ---- viewport ----

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn transform(&self) -> Transform {
        self.viewport.transform()
    }

    fn transform_op(
        &mut self,
        op: impl FnOnce(&mut Viewport) -> std::result::Result<(), ViewportError>,
    ) -> Result<()> {
        self.ensure_alive()?;
        let before = (self.viewport.transform(), self.viewport.size());
        op(&mut self.viewport)?;
        if (self.viewport.transform(), self.viewport.size()) != before {
            self.viewport_changed();
        }
        Ok(())
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.transform_op(|vp| vp.pan(dx, dy))
    }

    pub fn zoom_to(&mut self, scale: f64, anchor: Option<Point>) -> Result<()> {
        self.transform_op(|vp| vp.zoom_to(scale, anchor))
    }

    pub fn zoom_by(&mut self, ratio: f64, anchor: Option<Point>) -> Result<()> {
        self.transform_op(|vp| vp.zoom_by(ratio, anchor))
    }

    pub fn rotate_to(&mut self, radians: f64) -> Result<()> {
        self.transform_op(|vp| vp.rotate_to(radians))
    }

    pub fn rotate_by(&mut self, delta: f64) -> Result<()> {
        self.transform_op(|vp| vp.rotate_by(delta))
    }

    pub fn rotate_to_degrees(&mut self, degrees: f64) -> Result<()> {
        self.transform_op(|vp| vp.rotate_to_degrees(degrees))
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        self.transform_op(|vp| vp.resize(width, height))
    }

    /// Fits every visible node into the view. A scene without positioned nodes is left alone.
    pub fn fit_view(&mut self, padding: f64) -> Result<()> {
        let Some(bounds) = self.scene.bounds() else {
            return self.ensure_alive();
        };
        self.transform_op(|vp| vp.fit_view(bounds, padding))
    }

    pub fn fit_center(&mut self, x: f64, y: f64) -> Result<()> {
        self.transform_op(|vp| vp.fit_center(Point::new(x, y)))
    }

    // ---- commands ----

    /// Applies a command through the matching public operation.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Pan { dx, dy } => self.pan(dx, dy),
            Command::ZoomTo { scale, anchor } => {
                self.zoom_to(scale, Command::anchor_point(anchor))
            }
            Command::ZoomBy { ratio, anchor } => self.zoom_by(ratio, Command::anchor_point(anchor)),
            Command::RotateTo { radians } => self.rotate_to(radians),
            Command::Resize { width, height } => self.resize(width, height),
            Command::FitView { padding } => self.fit_view(padding),
            Command::MoveNode { id, x, y } => self.move_node(&id, x, y).map(drop),
            Command::SetState { id, state, enabled } => {
                self.set_element_state(&id, &state, enabled).map(drop)
            }
        }
    }

    fn apply_commands(&mut self) {
        let mut applied = 0;
        while let Some((issuer, command)) = self.commands.pop() {
            applied += 1;
            if applied > MAX_COMMANDS_PER_DRAIN {
                tracing::warn!(
                    limit = MAX_COMMANDS_PER_DRAIN,
                    "command limit reached; dropping the rest of the queue"
                );
                self.commands.clear();
                return;
            }
            if let Err(err) = self.execute(command) {
                self.report_command_failure(issuer, err);
            }
        }
    }

    fn report_command_failure(&mut self, issuer: Issuer, err: Error) {
        match issuer {
            Some((category, key)) => self.report(vec![ExtensionFailure {
                category,
                key,
                message: err.to_string(),
            }]),
            None => tracing::warn!(error = %err, "command failed"),
        }
    }

    // ---- input ----

    /// Routes an input event through the plugins, then the behaviors, in configuration order.
    pub fn dispatch(&mut self, event: InputEvent) -> Result<()> {
        self.ensure_alive()?;
        self.refresh_frame()?;
        let target = event.position().and_then(|p| {
            pick(&self.frame, self.viewport.screen_to_world(p)).map(|item| Target {
                id: item.id.clone(),
                kind: item.kind,
            })
        });
        let cancelling = event.is_cancellation();
        let mut failed = Vec::new();
        let mut stopped = false;

        for slot in &mut self.plugins {
            if !cancelling && !slot.accepts(&event, target.as_ref()) {
                continue;
            }
            self.commands.issue_as(Category::Plugin, &slot.key);
            let mut ctx = PluginContext {
                scene: &self.scene,
                viewport: &self.viewport,
                frame: &self.frame,
                commands: &mut self.commands,
            };
            match slot.inner.on_input(&event, target.as_ref(), &mut ctx) {
                Ok(Propagation::Stop) => {
                    stopped = true;
                    break;
                }
                Ok(Propagation::Continue) => {}
                Err(err) => failed.push(failure(Category::Plugin, &slot.key, &err)),
            }
        }

        if cancelling {
            self.cancel_behaviors();
        } else if !stopped {
            let kind = event.kind();
            let mut consumed_at = None;
            for (i, slot) in self.behaviors.iter_mut().enumerate() {
                if !slot.inner.handles(kind) || !slot.accepts(&event, target.as_ref()) {
                    continue;
                }
                self.commands.issue_as(Category::Behavior, &slot.key);
                let mut ctx = BehaviorContext {
                    scene: &self.scene,
                    viewport: &self.viewport,
                    frame: &self.frame,
                    target: target.as_ref(),
                    commands: &mut self.commands,
                };
                match slot.inner.handle(&event, &mut ctx) {
                    Ok(Propagation::Stop) => {
                        consumed_at = Some(i);
                        break;
                    }
                    Ok(Propagation::Continue) => {}
                    Err(err) => failed.push(failure(Category::Behavior, &slot.key, &err)),
                }
            }
            // A release ends every gesture, including ones whose handler never saw it.
            if let (Some(i), EventKind::PointerUp) = (consumed_at, kind) {
                self.cancel_behaviors_from(i + 1);
            }
        }

        self.report(failed);
        self.apply_commands();
        Ok(())
    }

    /// Returns every behavior to idle. Deltas already applied stay unless a behavior rolls back.
    pub fn cancel_interaction(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.cancel_behaviors();
        self.apply_commands();
        Ok(())
    }

    fn cancel_behaviors(&mut self) {
        self.cancel_behaviors_from(0);
    }

    /// Cancels every behavior from `start` on. Past `start`, idle behaviors are left alone.
    fn cancel_behaviors_from(&mut self, start: usize) {
        for slot in self.behaviors.iter_mut().skip(start) {
            if start > 0 && slot.inner.phase() == Phase::Idle {
                continue;
            }
            self.commands.issue_as(Category::Behavior, &slot.key);
            let mut ctx = BehaviorContext {
                scene: &self.scene,
                viewport: &self.viewport,
                frame: &self.frame,
                target: None,
                commands: &mut self.commands,
            };
            slot.inner.cancel(&mut ctx);
        }
    }

    /// Phase of each behavior, in configuration order.
    pub fn behavior_phases(&self) -> Vec<(&str, Phase)> {
        self.behaviors
            .iter()
            .map(|s| (s.key.as_str(), s.inner.phase()))
            .collect()
    }

    /// The first plugin configured under `key`, if it is a `T`.
    pub fn plugin<T: Plugin>(&self, key: &str) -> Option<&T> {
        self.plugins
            .iter()
            .find(|s| s.key == key)
            .and_then(|s| s.inner.as_any().downcast_ref::<T>())
    }

    // ---- notifications ----

    pub fn on_scene_change(&mut self, listener: impl FnMut(&SceneEvent) + 'static) -> Subscription {
        let sub = self.next_subscription();
        self.scene_listeners.push((sub, Box::new(listener)));
        sub
    }

    pub fn on_viewport_change(
        &mut self,
        listener: impl FnMut(&Transform) + 'static,
    ) -> Subscription {
        let sub = self.next_subscription();
        self.viewport_listeners.push((sub, Box::new(listener)));
        sub
    }

    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.scene_listeners.len() + self.viewport_listeners.len();
        self.scene_listeners.retain(|(s, _)| *s != subscription);
        self.viewport_listeners.retain(|(s, _)| *s != subscription);
        before != self.scene_listeners.len() + self.viewport_listeners.len()
    }

    /// Receives every isolated behavior or plugin failure.
    pub fn on_error(&mut self, hook: impl FnMut(&ExtensionFailure) + 'static) {
        self.error_hook = Some(Box::new(hook));
    }

    pub fn failures(&self) -> &[ExtensionFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<ExtensionFailure> {
        std::mem::take(&mut self.failures)
    }

    fn next_subscription(&mut self) -> Subscription {
        self.next_subscription += 1;
        Subscription(self.next_subscription)
    }

    fn report(&mut self, failures: Vec<ExtensionFailure>) {
        for f in failures {
            tracing::warn!(
                category = %f.category,
                key = %f.key,
                message = %f.message,
                "extension failed"
            );
            if let Some(hook) = self.error_hook.as_mut() {
                hook(&f);
            }
            self.failures.push(f);
        }
    }

    fn flush_scene_events(&mut self) -> Result<()> {
        let events = self.scene.drain_events();
        if events.is_empty() {
            return Ok(());
        }
        for event in &events {
            for (_, listener) in &mut self.scene_listeners {
                listener(event);
            }
        }

        let mut failed = Vec::new();
        for slot in &mut self.plugins {
            self.commands.issue_as(Category::Plugin, &slot.key);
            let mut ctx = PluginContext {
                scene: &self.scene,
                viewport: &self.viewport,
                frame: &self.frame,
                commands: &mut self.commands,
            };
            if let Err(err) = slot.inner.on_scene_change(&events, &mut ctx) {
                failed.push(failure(Category::Plugin, &slot.key, &err));
            }
        }
        self.report(failed);

        if self.rendered
            && self.relayout_on_change
            && events.iter().any(SceneEvent::is_topology_change)
        {
            self.relayout()?;
        }
        Ok(())
    }

    fn viewport_changed(&mut self) {
        let transform = self.viewport.transform();
        for (_, listener) in &mut self.viewport_listeners {
            listener(&transform);
        }
        let mut failed = Vec::new();
        for slot in &mut self.plugins {
            self.commands.issue_as(Category::Plugin, &slot.key);
            let mut ctx = PluginContext {
                scene: &self.scene,
                viewport: &self.viewport,
                frame: &self.frame,
                commands: &mut self.commands,
            };
            if let Err(err) = slot.inner.on_viewport_change(&transform, &mut ctx) {
                failed.push(failure(Category::Plugin, &slot.key, &err));
            }
        }
        self.report(failed);
    }
}

fn failure(category: Category, key: &str, err: &Error) -> ExtensionFailure {
    ExtensionFailure {
        category,
        key: key.to_string(),
        message: err.to_string(),
    }
}
