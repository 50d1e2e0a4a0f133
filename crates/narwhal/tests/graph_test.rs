use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use narwhal::behavior::Phase;
use narwhal::plugin::{Minimap, Plugin, PluginContext, Tooltip};
use narwhal::{
    Algorithm, Category, Command, DrawOp, Edge, ElementKind, Error, Extension, ExtensionRegistry,
    ExtensionSpec, ForceOptions, Graph, GraphData, GraphOptions, GridOptions, InputEvent, Node,
    Point, RecordingTarget, RenderTarget, Result, SceneEvent, Style, Target, Transform,
    ViewportOptions, state,
};

fn node(id: &str, x: f64, y: f64) -> Node {
    Node::new(id).with_style(Style::at(x, y))
}

/// `node1..node5` as a tree, plus one extra link closing a cycle.
fn tree_plus_link() -> GraphData {
    GraphData {
        nodes: (1..=5).map(|i| Node::new(format!("node{i}"))).collect(),
        edges: vec![
            Edge::new("e1", "node1", "node2"),
            Edge::new("e2", "node1", "node3"),
            Edge::new("e3", "node2", "node4"),
            Edge::new("e4", "node2", "node5"),
            Edge::new("e5", "node4", "node5"),
        ],
        ..GraphData::default()
    }
}

/// Two nodes placed in screen space under the identity transform.
fn pair() -> GraphData {
    GraphData {
        nodes: vec![node("a", 100.0, 100.0), node("b", 300.0, 100.0)],
        edges: vec![Edge::new("ab", "a", "b")],
        ..GraphData::default()
    }
}

fn graph(options: GraphOptions) -> Graph {
    Graph::new(options, &ExtensionRegistry::with_builtins()).unwrap()
}

fn position(g: &Graph, id: &str) -> (f64, f64) {
    g.scene().node(id).unwrap().style.position().unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn record_transforms(g: &mut Graph) -> Rc<RefCell<Vec<Transform>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    g.on_viewport_change(move |t| sink.borrow_mut().push(*t));
    seen
}

#[test]
fn rotation_beyond_full_turns_matches_sixty_degrees() {
    let mut g = graph(
        GraphOptions::default()
            .with_data(tree_plus_link())
            .with_layout(Algorithm::Grid(GridOptions::default())),
    );
    g.attach(RecordingTarget::new());
    block_on(g.render()).unwrap();

    let before: Vec<(f64, f64)> = (1..=5).map(|i| position(&g, &format!("node{i}"))).collect();
    g.rotate_to_degrees(2160.0 + 60.0).unwrap();
    let after: Vec<(f64, f64)> = (1..=5).map(|i| position(&g, &format!("node{i}"))).collect();
    assert_eq!(before, after);

    let t = g.transform();
    assert!((t.rotation_degrees() - 60.0).abs() < 1e-9);

    let mut reference = narwhal::Viewport::new(ViewportOptions::default()).unwrap();
    reference.rotate_to_degrees(60.0).unwrap();
    for (x, y) in after {
        let p = Point::new(x, y);
        let ours = g.viewport().world_to_screen(p);
        let theirs = reference.world_to_screen(p);
        assert!((ours - theirs).norm() < 1e-6);
        assert!((g.viewport().screen_to_world(ours) - p).norm() < 1e-6);
    }
    assert!(g.failures().is_empty());
}

#[test]
fn minimap_click_pans_through_the_viewport() {
    let mut g = graph(
        GraphOptions::default()
            .with_data(tree_plus_link())
            .with_plugin(
                ExtensionSpec::new("minimap").with_option("size", serde_json::json!([240, 160])),
            ),
    );
    g.attach(RecordingTarget::new());
    block_on(g.render()).unwrap();

    let minimap = g.plugin::<Minimap>("minimap").unwrap();
    assert_eq!(minimap.options().size, [240.0, 160.0]);
    let indicator = minimap.viewport_indicator().unwrap();
    assert!(minimap.panel().unwrap().contains(indicator.center()));

    let seen = record_transforms(&mut g);
    let before = g.transform();
    g.dispatch(InputEvent::PointerDown {
        x: indicator.x + indicator.width * 0.25,
        y: indicator.y + indicator.height * 0.25,
    })
    .unwrap();

    assert_eq!(seen.borrow().len(), 1);
    assert_ne!(g.transform(), before);
    assert_eq!(g.transform().scale, before.scale);
}

#[test]
fn unknown_extensions_fail_construction() {
    let registry = ExtensionRegistry::with_builtins();
    let err = Graph::new(GraphOptions::default().with_plugin("radar"), &registry).err();
    assert_eq!(
        err,
        Some(Error::UnknownPlugin {
            key: "radar".to_string()
        })
    );
    let err = Graph::new(GraphOptions::default().with_behavior("lasso"), &registry).err();
    assert_eq!(
        err,
        Some(Error::UnknownBehavior {
            key: "lasso".to_string()
        })
    );
}

#[test]
fn duplicate_registration_fails_but_replace_wins() {
    let mut registry = ExtensionRegistry::with_builtins();
    let err = registry
        .register(
            Category::Plugin,
            "tooltip",
            Extension::plugin(|_| Ok(Box::new(Tooltip::default()))),
        )
        .unwrap_err();
    assert_eq!(
        err,
        Error::AlreadyRegistered {
            category: Category::Plugin,
            key: "tooltip".to_string()
        }
    );
    registry
        .replace(
            Category::Plugin,
            "tooltip",
            Extension::plugin(|_| Ok(Box::new(Broken))),
        )
        .unwrap();
    let g = Graph::new(GraphOptions::default().with_plugin("tooltip"), &registry).unwrap();
    assert!(g.plugin::<Broken>("tooltip").is_some());
}

/// Fails every scene notification.
struct Broken;

impl Plugin for Broken {
    fn on_scene_change(
        &mut self,
        _events: &[SceneEvent],
        _ctx: &mut PluginContext<'_>,
    ) -> Result<()> {
        Err(Error::InvalidOptions {
            key: "broken".to_string(),
            message: "cannot observe".to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Pushes a fixed command list on every pointer press.
struct Scripted(Vec<Command>);

impl Plugin for Scripted {
    fn on_input(
        &mut self,
        event: &InputEvent,
        _target: Option<&Target>,
        ctx: &mut PluginContext<'_>,
    ) -> Result<narwhal::behavior::Propagation> {
        if matches!(event, InputEvent::PointerDown { .. }) {
            for c in &self.0 {
                ctx.commands.push(c.clone());
            }
        }
        Ok(narwhal::behavior::Propagation::Continue)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn registry_with(
    key: &str,
    make: impl Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
) -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::with_builtins();
    registry
        .register(Category::Plugin, key, Extension::plugin(move |_| Ok(make())))
        .unwrap();
    registry
}

#[test]
fn failing_plugin_is_isolated() {
    let registry = registry_with("broken", || Box::new(Broken));
    let mut g = Graph::new(
        GraphOptions::default()
            .with_plugin("broken")
            .with_plugin("minimap"),
        &registry,
    )
    .unwrap();
    let hooked = Rc::new(RefCell::new(Vec::new()));
    let sink = hooked.clone();
    g.on_error(move |f| sink.borrow_mut().push(f.key.clone()));

    g.add_nodes([node("a", 0.0, 0.0)]).unwrap();

    assert_eq!(*hooked.borrow(), vec!["broken".to_string()]);
    assert_eq!(g.failures().len(), 1);
    assert_eq!(g.failures()[0].category, Category::Plugin);
    assert!(g.plugin::<Minimap>("minimap").unwrap().panel().is_some());
    assert!(g.scene().node("a").is_some());
    assert_eq!(g.take_failures().len(), 1);
    assert!(g.failures().is_empty());
}

#[test]
fn commands_apply_in_issue_order() {
    let registry = registry_with("script", || {
        Box::new(Scripted(vec![
            Command::Pan { dx: 10.0, dy: 0.0 },
            Command::ZoomTo {
                scale: 2.0,
                anchor: Some([0.0, 0.0]),
            },
        ]))
    });
    let mut g = Graph::new(GraphOptions::default().with_plugin("script"), &registry).unwrap();
    let seen = record_transforms(&mut g);

    g.dispatch(InputEvent::PointerDown { x: 500.0, y: 500.0 }).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].translate_x, 10.0);
    assert_eq!(seen[0].scale, 1.0);
    assert_eq!(seen[1].scale, 2.0);
    // Zooming about the screen origin doubles the earlier pan.
    assert!(close(seen[1].translate_x, 20.0));
}

#[test]
fn failed_command_is_attributed_to_its_issuer() {
    let registry = registry_with("script", || {
        Box::new(Scripted(vec![
            Command::MoveNode {
                id: "ghost".to_string(),
                x: 0.0,
                y: 0.0,
            },
            Command::Pan { dx: 5.0, dy: 5.0 },
        ]))
    });
    let mut g = Graph::new(GraphOptions::default().with_plugin("script"), &registry).unwrap();
    g.dispatch(InputEvent::PointerDown { x: 1.0, y: 1.0 }).unwrap();

    assert_eq!(g.failures().len(), 1);
    assert_eq!(g.failures()[0].key, "script");
    assert_eq!(g.transform().translate_x, 5.0);
}

#[test]
fn relayout_supersedes_the_run_in_flight() {
    let force = Algorithm::Force(ForceOptions {
        seed: Some(7),
        iterations_per_step: 5,
        ..ForceOptions::default()
    });
    let options = || {
        GraphOptions::default()
            .with_data(tree_plus_link())
            .with_layout(force.clone())
    };

    let mut superseded = graph(options());
    superseded.relayout().unwrap();
    assert!(superseded.tick().unwrap().layout_running);
    superseded.relayout().unwrap();
    assert_eq!(superseded.layout_generation(), 2);
    while superseded.tick().unwrap().layout_running {}

    let mut fresh = graph(options());
    fresh.relayout().unwrap();
    while fresh.tick().unwrap().layout_running {}

    for i in 1..=5 {
        let id = format!("node{i}");
        assert_eq!(position(&superseded, &id), position(&fresh, &id));
    }
}

#[test]
fn topology_change_after_render_restarts_layout() {
    let mut g = graph(GraphOptions::default().with_data(tree_plus_link()));
    g.attach(RecordingTarget::new());
    block_on(g.render()).unwrap();
    let generation = g.layout_generation();

    g.update_element_style("node1", Style::default().with_fill("#f00")).unwrap();
    assert_eq!(g.layout_generation(), generation);

    g.add_nodes([Node::new("node6")]).unwrap();
    assert_eq!(g.layout_generation(), generation + 1);
    assert!(g.layout_running());
    g.tick().unwrap();
    assert!(g.scene().node("node6").unwrap().style.position().is_some());
}

fn drag_graph(rollback: bool) -> Graph {
    graph(
        GraphOptions::default()
            .with_data(pair())
            .with_behavior(ExtensionSpec::new("drag-element").with_option("rollbackOnCancel", rollback)),
    )
}

#[test]
fn drag_element_moves_and_keeps_position_on_cancel() {
    let mut g = drag_graph(false);
    g.dispatch(InputEvent::PointerDown { x: 100.0, y: 100.0 }).unwrap();
    g.dispatch(InputEvent::PointerMove { x: 150.0, y: 120.0 }).unwrap();
    assert_eq!(position(&g, "a"), (150.0, 120.0));
    assert_eq!(g.behavior_phases(), vec![("drag-element", Phase::Dragging)]);

    g.dispatch(InputEvent::Cancel).unwrap();
    assert_eq!(position(&g, "a"), (150.0, 120.0));
    assert_eq!(g.behavior_phases(), vec![("drag-element", Phase::Idle)]);
}

#[test]
fn drag_element_rolls_back_when_asked() {
    let mut g = drag_graph(true);
    g.dispatch(InputEvent::PointerDown { x: 100.0, y: 100.0 }).unwrap();
    g.dispatch(InputEvent::PointerMove { x: 150.0, y: 120.0 }).unwrap();
    g.dispatch(InputEvent::PointerLeave).unwrap();
    assert_eq!(position(&g, "a"), (100.0, 100.0));
    assert_eq!(g.behavior_phases(), vec![("drag-element", Phase::Idle)]);
}

#[test]
fn drag_element_pins_on_drop() {
    let mut g = graph(
        GraphOptions::default()
            .with_data(pair())
            .with_behavior(ExtensionSpec::new("drag-element").with_option("pinOnDrop", true)),
    );
    g.dispatch(InputEvent::PointerDown { x: 300.0, y: 100.0 }).unwrap();
    g.dispatch(InputEvent::PointerMove { x: 310.0, y: 140.0 }).unwrap();
    g.dispatch(InputEvent::PointerUp { x: 310.0, y: 140.0 }).unwrap();
    let b = g.element_data("b").unwrap();
    assert!(b.has_state(state::PINNED));
}

#[test]
fn drag_canvas_pans_only_from_empty_space() {
    let mut g = graph(
        GraphOptions::default()
            .with_data(pair())
            .with_behavior("drag-element")
            .with_behavior("drag-canvas"),
    );
    g.dispatch(InputEvent::PointerDown { x: 500.0, y: 400.0 }).unwrap();
    g.dispatch(InputEvent::PointerMove { x: 501.0, y: 400.0 }).unwrap();
    assert_eq!(g.transform(), Transform::default());

    g.dispatch(InputEvent::PointerMove { x: 520.0, y: 430.0 }).unwrap();
    g.dispatch(InputEvent::PointerUp { x: 520.0, y: 430.0 }).unwrap();
    let t = g.transform();
    assert_eq!((t.translate_x, t.translate_y), (20.0, 30.0));

    // A press on a node drags the node instead.
    g.dispatch(InputEvent::PointerDown { x: 120.0, y: 130.0 }).unwrap();
    g.dispatch(InputEvent::PointerMove { x: 140.0, y: 130.0 }).unwrap();
    assert_eq!(g.transform(), t);
    assert_eq!(position(&g, "a"), (120.0, 100.0));
}

#[test]
fn zoom_canvas_keeps_the_anchor_fixed() {
    let mut g = graph(GraphOptions::default().with_data(pair()).with_behavior("zoom-canvas"));
    let anchor = Point::new(200.0, 150.0);
    let world = g.viewport().screen_to_world(anchor);

    g.dispatch(InputEvent::Wheel {
        x: anchor.x,
        y: anchor.y,
        delta_y: -100.0,
    })
    .unwrap();

    assert!(close(g.transform().scale, 1.2));
    assert!((g.viewport().world_to_screen(world) - anchor).norm() < 1e-9);

    g.dispatch(InputEvent::Pinch {
        x: anchor.x,
        y: anchor.y,
        scale: 0.5,
    })
    .unwrap();
    assert!(close(g.transform().scale, 0.6));
}

#[test]
fn click_select_toggles_a_single_selection() {
    let mut g = graph(GraphOptions::default().with_data(pair()).with_behavior("click-select"));
    let click = |g: &mut Graph, x: f64, y: f64| {
        g.dispatch(InputEvent::PointerDown { x, y }).unwrap();
        g.dispatch(InputEvent::PointerUp { x, y }).unwrap();
    };
    let selected = |g: &Graph, id: &str| g.element_data(id).unwrap().has_state(state::SELECTED);

    click(&mut g, 100.0, 100.0);
    assert!(selected(&g, "a"));

    click(&mut g, 300.0, 100.0);
    assert!(!selected(&g, "a"));
    assert!(selected(&g, "b"));

    click(&mut g, 300.0, 100.0);
    assert!(!selected(&g, "b"));

    click(&mut g, 100.0, 100.0);
    click(&mut g, 600.0, 500.0);
    assert!(!selected(&g, "a"));
}

#[test]
fn tooltip_respects_its_enable_predicate() {
    let spec = ExtensionSpec::new("tooltip")
        .with_enable(|_, target| target.is_some_and(|t| t.kind == ElementKind::Node && t.id != "b"));
    let mut g = graph(GraphOptions::default().with_data(pair()).with_plugin(spec));

    g.dispatch(InputEvent::PointerMove { x: 100.0, y: 100.0 }).unwrap();
    let shown = g.plugin::<Tooltip>("tooltip").unwrap().current().cloned().unwrap();
    assert_eq!(shown.id, "a");
    assert_eq!((shown.x, shown.y), (110.0, 110.0));

    g.dispatch(InputEvent::PointerMove { x: 300.0, y: 100.0 }).unwrap();
    let tooltip = g.plugin::<Tooltip>("tooltip").unwrap();
    assert_eq!(tooltip.current().map(|c| c.id.as_str()), Some("a"));

    // Cancellations always reach plugins.
    g.dispatch(InputEvent::PointerLeave).unwrap();
    assert!(g.plugin::<Tooltip>("tooltip").unwrap().current().is_none());
}

#[test]
fn tooltip_hides_when_its_element_is_hidden() {
    let mut g = graph(GraphOptions::default().with_data(pair()).with_plugin("tooltip"));
    g.dispatch(InputEvent::PointerMove { x: 100.0, y: 100.0 }).unwrap();
    assert!(g.plugin::<Tooltip>("tooltip").unwrap().current().is_some());

    g.hide_element("a").unwrap();
    assert!(g.plugin::<Tooltip>("tooltip").unwrap().current().is_none());
}

#[test]
fn render_without_container_fails() {
    let mut g = graph(GraphOptions::default().with_data(pair()));
    let missing = Error::Render(narwhal_render::Error::MissingContainer);
    assert_eq!(block_on(g.render()), Err(missing.clone()));

    g.attach(RecordingTarget::detached());
    assert_eq!(block_on(g.render()), Err(missing));
}

#[test]
fn destroyed_graph_rejects_every_call() {
    let mut g = graph(GraphOptions::default().with_data(pair()).with_plugin("minimap"));
    g.attach(RecordingTarget::new());
    block_on(g.render()).unwrap();

    g.destroy();
    g.destroy();
    assert!(g.is_destroyed());
    assert_eq!(block_on(g.render()), Err(Error::Destroyed));
    assert_eq!(g.pan(1.0, 1.0), Err(Error::Destroyed));
    assert_eq!(g.add_nodes([Node::new("c")]), Err(Error::Destroyed));
    assert_eq!(
        g.dispatch(InputEvent::PointerDown { x: 0.0, y: 0.0 }),
        Err(Error::Destroyed)
    );
    assert_eq!(g.tick().err(), Some(Error::Destroyed));
    assert!(g.plugin::<Minimap>("minimap").is_none());
}

#[test]
fn hide_and_show_round_trip_through_the_target() {
    let target = Rc::new(RefCell::new(RecordingTarget::new()));
    let mut g = graph(GraphOptions::default().with_data(pair()));
    g.attach(target.clone());
    block_on(g.render()).unwrap();
    let baseline: Vec<_> = target.borrow().items().cloned().collect();
    assert_eq!(baseline.len(), 3);

    assert!(g.hide_element("a").unwrap());
    g.tick().unwrap();
    assert!(target.borrow().item("a").is_none());
    assert!(target.borrow().item("ab").is_none());
    assert!(target.borrow().item("b").is_some());

    assert!(g.show_element("a").unwrap());
    g.tick().unwrap();
    let restored: Vec<_> = target.borrow().items().cloned().collect();
    assert_eq!(restored.len(), baseline.len());
    for item in &baseline {
        assert_eq!(target.borrow().item(&item.id), Some(item));
    }
}

#[test]
fn moving_a_node_only_updates_transforms() {
    let target = Rc::new(RefCell::new(RecordingTarget::new()));
    let mut g = graph(GraphOptions {
        relayout_on_change: false,
        ..GraphOptions::default().with_data(pair())
    });
    g.attach(target.clone());
    block_on(g.render()).unwrap();
    target.borrow_mut().take_batches();

    g.execute(Command::MoveNode {
        id: "a".to_string(),
        x: 0.0,
        y: 0.0,
    })
    .unwrap();
    g.tick().unwrap();

    let batches = target.borrow_mut().take_batches();
    assert_eq!(batches.len(), 1);
    let ops: Vec<_> = batches[0]
        .iter()
        .map(|op| (op.id(), matches!(op, DrawOp::UpdateTransform { .. })))
        .collect();
    assert_eq!(ops, vec![(Some("ab"), true), (Some("a"), true)]);
}

#[test]
fn removing_a_node_cascades_to_its_edges() {
    let target = Rc::new(RefCell::new(RecordingTarget::new()));
    let mut g = graph(GraphOptions::default().with_data(pair()));
    g.attach(target.clone());
    block_on(g.render()).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    g.on_scene_change(move |e| sink.borrow_mut().push(e.clone()));

    let mut removed = g.remove_element("a").unwrap();
    removed.sort();
    assert_eq!(removed, vec!["a".to_string(), "ab".to_string()]);
    assert_eq!(
        events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SceneEvent::ElementRemoved { .. }))
            .count(),
        2
    );
    while g.tick().unwrap().layout_running {}
    assert_eq!(target.borrow().items().count(), 1);
    assert!(g.element_data("ab").is_err());
}

#[test]
fn unsubscribed_listeners_stop_hearing() {
    let mut g = graph(GraphOptions::default());
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    let sub = g.on_viewport_change(move |_| *sink.borrow_mut() += 1);
    g.pan(1.0, 0.0).unwrap();
    assert!(g.unsubscribe(sub));
    assert!(!g.unsubscribe(sub));
    g.pan(1.0, 0.0).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn auto_fit_frames_the_first_layout() {
    let mut g = graph(GraphOptions {
        auto_fit: true,
        ..GraphOptions::default().with_data(tree_plus_link())
    });
    g.attach(RecordingTarget::new());
    block_on(g.render()).unwrap();

    let bounds = g.scene().bounds().unwrap();
    for (x, y) in [(bounds.min_x, bounds.min_y), (bounds.max_x, bounds.max_y)] {
        let p = g.viewport().world_to_screen(Point::new(x, y));
        assert!(p.x >= -1e-6 && p.x <= 800.0 + 1e-6);
        assert!(p.y >= -1e-6 && p.y <= 600.0 + 1e-6);
    }
}

/// Rejects the first `failures` batches, then records like a normal target.
struct Flaky {
    failures: usize,
    inner: RecordingTarget,
}

impl RenderTarget for Flaky {
    fn apply(&mut self, ops: &[DrawOp]) -> narwhal_render::Result<()> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(narwhal_render::Error::Backend {
                message: "transient".to_string(),
            });
        }
        self.inner.apply(ops)
    }
}

#[test]
fn rejected_batch_is_redrawn_in_full() {
    let target = Rc::new(RefCell::new(Flaky {
        failures: 1,
        inner: RecordingTarget::new(),
    }));
    let mut g = graph(GraphOptions::default().with_data(pair()));
    g.attach(target.clone());

    assert_eq!(
        block_on(g.render()),
        Err(Error::Render(narwhal_render::Error::Backend {
            message: "transient".to_string()
        }))
    );
    assert_eq!(target.borrow().inner.items().count(), 0);

    assert!(g.tick().unwrap().ops > 0);
    assert_eq!(g.frame().len(), 3);
    assert_eq!(target.borrow().inner.items().count(), 3);
    assert_eq!(target.borrow().inner.transform(), Some(g.transform()));
    assert_eq!(g.tick().unwrap().ops, 0);
}

#[test]
fn consumed_release_returns_every_behavior_to_idle() {
    let mut g = graph(
        GraphOptions::default()
            .with_data(pair())
            .with_behavior("drag-canvas")
            .with_behavior("click-select"),
    );
    g.dispatch(InputEvent::PointerDown { x: 5.0, y: 5.0 }).unwrap();
    g.dispatch(InputEvent::PointerMove { x: 50.0, y: 50.0 }).unwrap();
    assert_eq!(
        g.behavior_phases(),
        vec![("drag-canvas", Phase::Dragging), ("click-select", Phase::Armed)]
    );

    g.dispatch(InputEvent::PointerUp { x: 50.0, y: 50.0 }).unwrap();
    assert_eq!(
        g.behavior_phases(),
        vec![("drag-canvas", Phase::Idle), ("click-select", Phase::Idle)]
    );
    assert_ne!(g.transform(), Transform::default());

    let a = g.viewport().world_to_screen(Point::new(100.0, 100.0));
    g.dispatch(InputEvent::PointerDown { x: a.x, y: a.y }).unwrap();
    g.dispatch(InputEvent::PointerUp { x: a.x, y: a.y }).unwrap();
    assert!(g.element_data("a").unwrap().has_state(state::SELECTED));
}

/// Moves `a` once, then reports a non-finite position.
struct Diverging;

struct DivergingRun {
    steps: usize,
}

impl beluga::Layout for Diverging {
    fn start(&self, _graph: &beluga::Graph) -> beluga::Result<Box<dyn beluga::LayoutRun>> {
        Ok(Box::new(DivergingRun { steps: 0 }))
    }
}

impl beluga::LayoutRun for DivergingRun {
    fn step(&mut self) -> beluga::Result<beluga::Step> {
        self.steps += 1;
        if self.steps > 1 {
            return Err(beluga::Error::NonFinitePosition {
                node_id: "a".to_string(),
                iteration: self.steps,
            });
        }
        let mut result = beluga::LayoutResult::default();
        result
            .positions
            .insert("a".to_string(), beluga::Point::new(1.0, 2.0));
        Ok(beluga::Step::Progress(result))
    }
}

#[test]
fn layout_failures_reach_the_caller_and_drop_the_run() {
    let mut g = graph(GraphOptions::default().with_data(pair()));
    g.attach(RecordingTarget::new());
    block_on(g.render()).unwrap();

    g.set_custom_layout(Diverging).unwrap();
    let status = g.tick().unwrap();
    assert!(status.layout_running);
    assert_eq!(position(&g, "a"), (1.0, 2.0));

    let diverged = Error::Layout(beluga::Error::NonFinitePosition {
        node_id: "a".to_string(),
        iteration: 2,
    });
    assert_eq!(g.tick().err(), Some(diverged.clone()));
    assert!(!g.layout_running());
    assert_eq!(position(&g, "a"), (1.0, 2.0));
    assert!(!g.tick().unwrap().layout_running);

    assert_eq!(block_on(g.render()), Err(diverged));
    assert!(!g.layout_running());

    g.set_layout(Algorithm::Grid(GridOptions::default())).unwrap();
    block_on(g.render()).unwrap();
    let (x, y) = position(&g, "a");
    assert!(x.is_finite() && y.is_finite());
}

#[test]
fn dangling_topology_is_rejected_at_construction() {
    let mut data = pair();
    data.edges.push(Edge::new("bad", "a", "ghost"));
    let err = Graph::new(
        GraphOptions::default().with_data(data),
        &ExtensionRegistry::with_builtins(),
    )
    .err();
    assert_eq!(
        err,
        Some(Error::Scene(narwhal_scene::Error::DanglingReference {
            id: "bad".to_string(),
            missing: "ghost".to_string()
        }))
    );
}
