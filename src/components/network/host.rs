//! Renderer host: lifecycle and event dispatch, independent of any canvas.
//!
//! The host owns one [`Session`] per graph. A session is only created once the
//! drawing surface has a positive size, and a new graph always replaces the
//! whole session. Option changes restyle the live session and re-heat its
//! simulation instead.
//!
//! The Leptos component feeds DOM events in and draws whatever
//! [`NetworkHost::frame`] says changed; everything else is here so it can be
//! exercised without a browser.

use log::{debug, info};

use super::caption::{CAPTION_FONT_SIZE, Font, TextMeasure};
use super::graph::{Graph, Issue, Vec2};
use super::hooks::{self, HookContext, OverlayHook, OverlayOp};
use super::info::{self, InfoPanel};
use super::interaction::{
	DragGesture, Focus, GestureEnd, GestureStep, Interaction, Target, ViewTransform,
};
use super::scene::Scene;
use super::simulation::{PrecomputeBudget, Simulation, SimulationParams};
use super::theme::Theme;
use super::types::{GraphData, NetworkOptions};

/// Wheel zoom step per notch.
const ZOOM_IN: f64 = 1.1;
const ZOOM_OUT: f64 = 0.9;

/// Layout, scene and interaction state for one graph.
pub struct Session {
	graph: Graph,
	simulation: Simulation,
	scene: Scene,
	interaction: Interaction,
}

impl Session {
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn scene(&self) -> &Scene {
		&self.scene
	}

	pub fn interaction(&self) -> &Interaction {
		&self.interaction
	}
}

/// Drives a network visualization from mount to teardown.
pub struct NetworkHost<M> {
	options: NetworkOptions,
	theme: Theme,
	font: Font,
	measure: M,
	clock: Box<dyn FnMut() -> f64>,
	budget: PrecomputeBudget,
	pending: Option<GraphData>,
	surface: Option<(f64, f64)>,
	session: Option<Session>,
	gesture: DragGesture,
	under_pointer: Option<Target>,
	hooks: Vec<Box<dyn OverlayHook>>,
	dirty: bool,
}

impl<M: TextMeasure> NetworkHost<M> {
	/// `clock` returns milliseconds and bounds the warm-up run.
	pub fn new(
		options: NetworkOptions,
		theme: Theme,
		measure: M,
		clock: impl FnMut() -> f64 + 'static,
	) -> Self {
		Self {
			options,
			font: Font::new(theme.font_family, CAPTION_FONT_SIZE),
			theme,
			measure,
			clock: Box::new(clock),
			budget: PrecomputeBudget::default(),
			pending: None,
			surface: None,
			session: None,
			gesture: DragGesture::Idle,
			under_pointer: None,
			hooks: Vec::new(),
			dirty: false,
		}
	}

	pub fn add_hook(&mut self, hook: Box<dyn OverlayHook>) {
		self.hooks.push(hook);
		self.dirty = true;
	}

	pub fn theme(&self) -> &Theme {
		&self.theme
	}

	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	/// Current surface size, once one with positive area has been seen.
	pub fn surface(&self) -> Option<(f64, f64)> {
		self.surface
	}

	/// Replaces the graph. The previous session is dropped before anything new
	/// is built.
	pub fn set_graph(&mut self, data: GraphData) {
		if self.session.take().is_some() {
			debug!("network-viz: graph replaced, session torn down");
		}
		self.gesture = DragGesture::Idle;
		self.under_pointer = None;
		self.pending = Some(data);
		if let Some((width, height)) = self.surface {
			self.start(width, height);
		}
	}

	/// Restyles the live graph and re-heats its layout.
	pub fn set_options(&mut self, options: NetworkOptions) {
		let params = SimulationParams::from(&options);
		self.options = options;
		if let Some(session) = self.session.as_mut() {
			session.graph.restyle(&self.options, &self.font, &mut self.measure);
			session.scene = Scene::build(&session.graph, &self.theme);
			session.simulation.set_params(params, &session.graph);
			self.dirty = true;
		}
	}

	/// Attaches to a surface of the given size, building the session if a
	/// graph is waiting. A surface without area defers setup.
	pub fn render(&mut self, width: f64, height: f64) -> Result<(), Issue> {
		if !(width > 0.0 && height > 0.0) {
			let issue = Issue::SurfaceNotReady { width, height };
			debug!("network-viz: {issue}");
			return Err(issue);
		}
		self.surface = Some((width, height));
		if self.session.is_none() {
			self.start(width, height);
		}
		self.dirty = true;
		Ok(())
	}

	/// Resize notification. Keeps the current view.
	pub fn resize(&mut self, width: f64, height: f64) -> Result<(), Issue> {
		self.render(width, height)
	}

	fn start(&mut self, width: f64, height: f64) {
		let Some(data) = self.pending.take() else {
			return;
		};
		let (mut graph, issues) = Graph::prepare(data, &self.options, &self.font, &mut self.measure);
		info!(
			"network-viz: loaded {} nodes, {} edges ({} records dropped)",
			graph.nodes().len(),
			graph.edges().len(),
			issues.len()
		);

		let mut simulation = Simulation::new(SimulationParams::from(&self.options));
		simulation.load(&mut graph);
		let started = (self.clock)();
		let ticks = simulation.precompute(&mut graph, self.budget, &mut self.clock);
		debug!(
			"network-viz: warm-up ran {ticks} ticks in {:.1}ms",
			(self.clock)() - started
		);

		let scene = Scene::build(&graph, &self.theme);
		let interaction = Interaction::new(ViewTransform::fit(&graph, width, height));
		self.session = Some(Session {
			graph,
			simulation,
			scene,
			interaction,
		});
		self.dirty = true;
	}

	/// Whether the frame loop should keep running.
	pub fn wants_frame(&self) -> bool {
		self.session
			.as_ref()
			.is_some_and(|s| self.dirty || s.simulation.is_running())
	}

	/// Advances the layout by one frame. Returns whether a redraw is due.
	pub fn frame(&mut self) -> bool {
		let Some(session) = self.session.as_mut() else {
			return false;
		};
		let mut changed = std::mem::take(&mut self.dirty);
		if session.simulation.is_running() {
			session.simulation.frame(&mut session.graph);
			session.scene.update_positions(&session.graph);
			changed = true;
		}
		changed
	}

	pub fn pointer_down(&mut self, at: Vec2) {
		let Some(session) = self.session.as_ref() else {
			return;
		};
		let hit = session.interaction.hit_test(&session.scene, at);
		self.gesture.press(hit, at);
	}

	pub fn pointer_move(&mut self, at: Vec2) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		let world = session.interaction.view().screen_to_world(at);
		match self.gesture.move_to(at) {
			GestureStep::DragStart(node) => {
				session.simulation.start_drag(&mut session.graph, node, world);
			}
			GestureStep::DragMove(_) => session.simulation.drag_to(&mut session.graph, world),
			GestureStep::Pan(dx, dy) => session.interaction.pan_by(dx, dy),
			GestureStep::Nothing => {
				if self.gesture != DragGesture::Idle {
					return;
				}
				let hit = session.interaction.hit_test(&session.scene, at);
				if hit == self.under_pointer {
					return;
				}
				if self.under_pointer.is_some() {
					session.interaction.pointer_out();
				}
				if let Some(target) = hit {
					session.interaction.pointer_over(target);
				}
				self.under_pointer = hit;
			}
		}
		self.dirty = true;
	}

	pub fn pointer_up(&mut self) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		match self.gesture.release() {
			GestureEnd::Click(hit) => {
				session.interaction.click(hit);
				if hit.is_none() {
					self.under_pointer = None;
				}
			}
			GestureEnd::DragEnd(_) => session.simulation.end_drag(&mut session.graph),
			GestureEnd::Nothing => {}
		}
		self.dirty = true;
	}

	/// Pointer left the surface: drop any gesture and hover.
	pub fn pointer_leave(&mut self) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		if self.gesture.cancel().is_some() {
			session.simulation.end_drag(&mut session.graph);
		}
		if self.under_pointer.take().is_some() {
			session.interaction.pointer_out();
		}
		self.dirty = true;
	}

	/// Zooms around `at`; positive `delta_y` zooms out.
	pub fn wheel(&mut self, at: Vec2, delta_y: f64) {
		let Some(session) = self.session.as_mut() else {
			return;
		};
		let factor = if delta_y > 0.0 { ZOOM_OUT } else { ZOOM_IN };
		session.interaction.zoom_at(at, factor);
		self.dirty = true;
	}

	pub fn focus(&self) -> Focus {
		self.session
			.as_ref()
			.map_or(Focus::Overview, |s| s.interaction.focus())
	}

	/// Info panel content for the current focus.
	pub fn panel(&self) -> InfoPanel {
		self.session
			.as_ref()
			.map(|s| info::panel(&s.graph, s.interaction.focus()))
			.unwrap_or_default()
	}

	/// Primitives from every overlay hook that succeeded this frame.
	pub fn overlays(&mut self) -> Vec<OverlayOp> {
		let Some(session) = self.session.as_ref() else {
			return Vec::new();
		};
		if self.hooks.is_empty() {
			return Vec::new();
		}
		let ctx = HookContext {
			graph: &session.graph,
			scene: &session.scene,
			view: session.interaction.view(),
		};
		hooks::run_guarded(&mut self.hooks, &ctx)
	}

	/// Releases everything. The host does nothing afterwards until given a
	/// new graph and surface.
	pub fn destroy(&mut self) {
		self.session = None;
		self.pending = None;
		self.surface = None;
		self.gesture = DragGesture::Idle;
		self.under_pointer = None;
		self.hooks.clear();
		self.dirty = false;
		debug!("network-viz: host destroyed");
	}
}

#[cfg(test)]
mod tests {
	use anyhow::bail;

	use super::super::caption::tests::monospace;
	use super::super::graph::tests::{node, people};
	use super::super::graph::NodeIdx;
	use super::super::hooks::Overlay;
	use super::super::simulation::Phase;
	use super::*;

	type TestHost = NetworkHost<fn(&str, &Font) -> f64>;

	/// Every clock read advances time by 10ms.
	fn host() -> TestHost {
		let mut now = 0.0;
		NetworkHost::new(
			NetworkOptions::default(),
			Theme::default(),
			monospace as fn(&str, &Font) -> f64,
			move || {
				now += 10.0;
				now
			},
		)
	}

	fn mounted() -> TestHost {
		let mut host = host();
		host.set_graph(people());
		host.render(800.0, 600.0).expect("surface has area");
		host
	}

	fn settle(host: &mut TestHost) {
		let mut frames = 0;
		while host.wants_frame() {
			host.frame();
			frames += 1;
			assert!(frames < 1000, "layout never settled");
		}
	}

	fn node_on_screen(host: &TestHost, idx: usize) -> Vec2 {
		let session = host.session().expect("session");
		let position = session.graph().node(NodeIdx(idx)).position;
		session.interaction().view().world_to_screen(position)
	}

	fn summary(host: &TestHost) -> String {
		match host.panel() {
			InfoPanel::Overview(overview) => overview.summary(),
			InfoPanel::Details(details) => panic!("expected overview, got {details:?}"),
		}
	}

	fn details_id(host: &TestHost) -> String {
		match host.panel() {
			InfoPanel::Details(details) => details.id,
			InfoPanel::Overview(_) => panic!("expected details"),
		}
	}

	#[test]
	fn zero_size_surface_defers_setup() {
		let mut host = host();
		host.set_graph(people());
		assert_eq!(
			host.render(0.0, 600.0),
			Err(Issue::SurfaceNotReady {
				width: 0.0,
				height: 600.0,
			})
		);
		assert!(host.session().is_none());
		assert!(!host.wants_frame());
		assert_eq!(summary(&host), "Displaying 0 nodes, 0 relationships.");

		host.resize(800.0, 600.0).expect("surface has area");
		assert!(host.session().is_some());
		assert_eq!(summary(&host), "Displaying 3 nodes, 2 relationships.");
	}

	#[test]
	fn warm_up_respects_time_budget_then_frames_converge() {
		let mut host = mounted();
		let session = host.session().expect("session");
		assert_eq!(session.simulation().phase(), Phase::Settling);
		assert!(host.wants_frame());
		settle(&mut host);
		let session = host.session().expect("session");
		assert_eq!(session.simulation().phase(), Phase::Converged);
		assert!(!host.frame());
	}

	#[test]
	fn empty_graph_draws_once_and_stops() {
		let mut host = host();
		host.set_graph(GraphData::default());
		host.render(800.0, 600.0).expect("surface has area");
		assert!(host.frame());
		assert!(!host.wants_frame());
		assert_eq!(summary(&host), "Displaying 0 nodes, 0 relationships.");
	}

	#[test]
	fn clicks_select_toggle_and_clear() {
		let mut host = mounted();
		settle(&mut host);
		let n1 = node_on_screen(&host, 0);

		host.pointer_down(n1);
		host.pointer_up();
		assert_eq!(details_id(&host), "n1");

		host.pointer_down(n1);
		host.pointer_up();
		assert!(matches!(host.panel(), InfoPanel::Overview(_)));

		host.pointer_down(n1);
		host.pointer_up();
		host.pointer_down(Vec2::new(-5_000.0, -5_000.0));
		host.pointer_up();
		assert_eq!(host.focus(), Focus::Overview);
	}

	#[test]
	fn hover_shows_details_until_pointer_moves_off() {
		let mut host = mounted();
		settle(&mut host);
		let n2 = node_on_screen(&host, 1);
		host.pointer_move(n2);
		assert_eq!(details_id(&host), "n2");
		host.pointer_move(Vec2::new(-5_000.0, -5_000.0));
		assert_eq!(summary(&host), "Displaying 3 nodes, 2 relationships.");
	}

	#[test]
	fn click_without_travel_does_not_reheat() {
		let mut host = mounted();
		settle(&mut host);
		let n1 = node_on_screen(&host, 0);
		host.pointer_down(n1);
		host.pointer_move(n1 + Vec2::new(2.0, 2.0));
		host.pointer_up();
		host.frame();
		let session = host.session().expect("session");
		assert_eq!(session.simulation().phase(), Phase::Converged);
	}

	#[test]
	fn dragging_pins_node_until_release() {
		let mut host = mounted();
		settle(&mut host);
		let n1 = node_on_screen(&host, 0);
		let grabbed = n1 + Vec2::new(30.0, 0.0);
		host.pointer_down(n1);
		host.pointer_move(grabbed);
		let session = host.session().expect("session");
		assert_eq!(session.simulation().phase(), Phase::Dragging(NodeIdx(0)));
		let world = session.interaction().view().screen_to_world(grabbed);
		assert_eq!(session.graph().node(NodeIdx(0)).pinned, Some(world));

		for _ in 0..20 {
			host.frame();
		}
		assert!(host.wants_frame());
		let session = host.session().expect("session");
		assert_eq!(session.graph().node(NodeIdx(0)).position, world);

		host.pointer_up();
		let session = host.session().expect("session");
		assert_eq!(session.simulation().phase(), Phase::Settling);
		assert_eq!(session.graph().node(NodeIdx(0)).pinned, None);
		assert_eq!(host.focus(), Focus::Overview);
	}

	#[test]
	fn dragging_empty_canvas_pans_view() {
		let mut host = mounted();
		settle(&mut host);
		let before = *host.session().expect("session").interaction().view();
		let start = Vec2::new(-5_000.0, -5_000.0);
		host.pointer_down(start);
		host.pointer_move(start + Vec2::new(40.0, 10.0));
		host.pointer_up();
		let after = *host.session().expect("session").interaction().view();
		assert!((after.x - before.x - 40.0).abs() < 1e-9);
		assert!((after.y - before.y - 10.0).abs() < 1e-9);
		assert_eq!(host.focus(), Focus::Overview);
	}

	#[test]
	fn wheel_zooms_around_pointer() {
		let mut host = mounted();
		let at = Vec2::new(200.0, 150.0);
		let before = host.session().expect("session").interaction().view().screen_to_world(at);
		host.wheel(at, -120.0);
		let view = *host.session().expect("session").interaction().view();
		assert!((view.k - 1.1).abs() < 1e-12);
		assert!((view.screen_to_world(at) - before).length() < 1e-9);
	}

	#[test]
	fn option_change_restyles_and_reheats_in_place() {
		let mut host = mounted();
		settle(&mut host);
		let positions: Vec<Vec2> = host
			.session()
			.expect("session")
			.graph()
			.nodes()
			.iter()
			.map(|n| n.position)
			.collect();

		let options: NetworkOptions =
			serde_json::from_str(r#"{"objectOptions": {"Person": {"radius": 20}}}"#).expect("valid options");
		host.set_options(options);

		let session = host.session().expect("session");
		assert_eq!(session.simulation().phase(), Phase::Settling);
		assert!(session.simulation().alpha() >= 0.3);
		assert!(session.scene().nodes.iter().all(|shape| shape.radius == 20.0));
		let after: Vec<Vec2> = session.graph().nodes().iter().map(|n| n.position).collect();
		assert_eq!(after, positions);
	}

	#[test]
	fn new_graph_replaces_session() {
		let mut host = mounted();
		settle(&mut host);
		host.pointer_down(node_on_screen(&host, 0));
		host.pointer_up();
		assert_eq!(details_id(&host), "n1");

		host.set_graph(GraphData {
			nodes: vec![node("m1", "Movie")],
			links: Vec::new(),
		});
		assert_eq!(summary(&host), "Displaying 1 nodes, 0 relationships.");
	}

	#[test]
	fn destroy_stops_everything() {
		let mut host = mounted();
		host.destroy();
		assert!(!host.wants_frame());
		assert!(!host.frame());
		host.pointer_down(Vec2::ZERO);
		host.pointer_up();
		host.wheel(Vec2::ZERO, 1.0);
		assert!(host.session().is_none());
		assert_eq!(host.surface(), None);
	}

	struct Marker;

	impl OverlayHook for Marker {
		fn draw(&mut self, overlay: &mut Overlay, ctx: &HookContext<'_>) -> anyhow::Result<()> {
			if let Some(shape) = ctx.scene.nodes.first() {
				overlay.text("start", shape.center, "black");
			}
			Ok(())
		}
	}

	struct Crashes;

	impl OverlayHook for Crashes {
		fn draw(&mut self, _overlay: &mut Overlay, _ctx: &HookContext<'_>) -> anyhow::Result<()> {
			bail!("bad user code")
		}
	}

	#[test]
	fn broken_overlay_does_not_stop_the_host() {
		let mut host = mounted();
		host.add_hook(Box::new(Crashes));
		host.add_hook(Box::new(Marker));
		assert!(host.frame());
		let ops = host.overlays();
		assert_eq!(ops.len(), 1);
		assert!(host.wants_frame());
	}
}
