//! Force-directed layout engine.
//!
//! The simulation cools from `alpha = 1` towards `alpha_target`, scaling every
//! force by the current alpha. It stops once alpha drops to `alpha_min`.
//! Dragging a node pins it under the pointer and keeps the rest of the graph
//! gently warm until the drag ends.
//!
//! ```text
//! Idle --load--> Warming --precompute--> Settling --alpha <= min--> Converged
//!                                          ^   |                       |
//!                                          |   +--start_drag--> Dragging <--+
//!                                          +------end_drag---------+
//! ```

use std::f64::consts::TAU;

use log::debug;

use super::forces::{self, LinkForce};
use super::graph::{Graph, NodeIdx, Vec2};
use super::types::NetworkOptions;

/// Alpha that option changes raise the simulation to.
pub const REHEAT_ALPHA: f64 = 0.3;
/// Ticks at which a full cool-down from 1 reaches `alpha_min`.
const COOLING_TICKS: f64 = 300.0;

/// Tuning constants for the layout. All are defaults, not physical truths.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Fixed link strength, or `None` for `1 / min(degree)` per link.
	pub link_strength: Option<f64>,
	/// Added twice to the endpoint radii to get a link's rest length.
	pub link_distance: f64,
	/// Collision margin added to every node radius.
	pub collision_radius: f64,
	pub centre_x: f64,
	pub centre_y: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	pub alpha_min: f64,
	pub alpha_target: f64,
	/// Integration steps per animation frame.
	pub ticks_per_frame: usize,
	pub dragging_alpha: f64,
	pub dragging_alpha_target: f64,
}

impl Default for SimulationParams {
	fn default() -> Self {
		Self {
			charge_strength: -400.0,
			link_strength: None,
			link_distance: 45.0,
			collision_radius: 25.0,
			centre_x: 0.03,
			centre_y: 0.03,
			velocity_decay: 0.4,
			alpha_min: 0.05,
			alpha_target: 0.0,
			ticks_per_frame: 5,
			dragging_alpha: 0.8,
			dragging_alpha_target: 0.09,
		}
	}
}

impl From<&NetworkOptions> for SimulationParams {
	fn from(options: &NetworkOptions) -> Self {
		Self {
			charge_strength: options.charge_strength,
			link_strength: options.link_strength,
			collision_radius: options.collision_radius,
			centre_x: options.centre_attraction,
			centre_y: options.centre_attraction,
			..Self::default()
		}
	}
}

/// Limits for the synchronous warm-up run before the first paint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrecomputeBudget {
	pub max_ticks: usize,
	pub max_millis: f64,
}

impl Default for PrecomputeBudget {
	fn default() -> Self {
		Self {
			max_ticks: 150,
			max_millis: 250.0,
		}
	}
}

/// Lifecycle of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// No graph loaded.
	Idle,
	/// Laid out on a circle, waiting for the warm-up run.
	Warming,
	/// Cooling on the frame loop.
	Settling,
	/// Cold; no frames needed.
	Converged,
	/// A node is pinned under the pointer.
	Dragging(NodeIdx),
}

/// Layout engine state for one graph.
pub struct Simulation {
	params: SimulationParams,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	phase: Phase,
	links: Vec<LinkForce>,
	collide_radii: Vec<f64>,
}

impl Simulation {
	pub fn new(params: SimulationParams) -> Self {
		let alpha_decay = 1.0 - params.alpha_min.powf(1.0 / COOLING_TICKS);
		Self {
			alpha_target: params.alpha_target,
			params,
			alpha: 1.0,
			alpha_decay,
			phase: Phase::Idle,
			links: Vec::new(),
			collide_radii: Vec::new(),
		}
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn params(&self) -> &SimulationParams {
		&self.params
	}

	/// Whether frames should keep being scheduled.
	pub fn is_running(&self) -> bool {
		matches!(self.phase, Phase::Warming | Phase::Settling | Phase::Dragging(_))
	}

	/// Places `graph` on its starting circle and heats the simulation to 1.
	pub fn load(&mut self, graph: &mut Graph) {
		circular_layout(graph, self.params.link_distance);
		for node in graph.nodes_mut() {
			node.velocity = Vec2::ZERO;
			node.pinned = None;
		}
		self.rebuild(graph);
		self.alpha = 1.0;
		self.alpha_target = self.params.alpha_target;
		self.phase = if graph.is_empty() {
			Phase::Converged
		} else {
			Phase::Warming
		};
	}

	/// Recomputes per-link and per-node force parameters from current styles.
	pub fn rebuild(&mut self, graph: &Graph) {
		let degrees = graph.degrees();
		let nodes = graph.nodes();
		self.links = graph
			.edges()
			.iter()
			.map(|edge| {
				let (s, t) = (edge.source.0, edge.target.0);
				let (ds, dt) = (degrees[s].max(1) as f64, degrees[t].max(1) as f64);
				LinkForce {
					source: s,
					target: t,
					distance: nodes[s].radius + nodes[t].radius + self.params.link_distance * 2.0,
					strength: self
						.params
						.link_strength
						.unwrap_or_else(|| 1.0 / ds.min(dt)),
					bias: ds / (ds + dt),
				}
			})
			.collect();
		self.collide_radii = nodes
			.iter()
			.map(|node| node.radius + self.params.collision_radius)
			.collect();
	}

	/// Runs ticks synchronously until the tick budget, the time budget or
	/// convergence is reached. `now` returns milliseconds.
	pub fn precompute(
		&mut self,
		graph: &mut Graph,
		budget: PrecomputeBudget,
		mut now: impl FnMut() -> f64,
	) -> usize {
		if self.phase != Phase::Warming {
			return 0;
		}
		let start = now();
		let mut ticks = 0;
		while ticks < budget.max_ticks && now() - start < budget.max_millis {
			self.tick(graph);
			ticks += 1;
			if self.alpha <= self.params.alpha_min {
				break;
			}
		}
		self.phase = if self.alpha <= self.params.alpha_min {
			Phase::Converged
		} else {
			Phase::Settling
		};
		debug!(
			"network-viz: precomputed {} ticks, alpha {:.3}",
			ticks, self.alpha
		);
		ticks
	}

	/// One integration step: cool, accumulate forces, integrate.
	pub fn tick(&mut self, graph: &mut Graph) {
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;
		let params = &self.params;
		let nodes = graph.nodes_mut();

		forces::apply_links(nodes, &self.links, alpha);
		forces::apply_repulsion(nodes, params.charge_strength, alpha);
		forces::apply_centering(nodes, params.centre_x, params.centre_y, alpha);
		forces::apply_collision(nodes, &self.collide_radii);

		let friction = 1.0 - params.velocity_decay;
		for node in nodes {
			match node.pinned {
				Some(pin) => {
					node.position = pin;
					node.velocity = Vec2::ZERO;
				}
				None => {
					node.velocity = node.velocity * friction;
					node.position += node.velocity;
				}
			}
		}
	}

	/// Advances one animation frame. Returns whether another frame is needed.
	pub fn frame(&mut self, graph: &mut Graph) -> bool {
		if !self.is_running() {
			return false;
		}
		if self.phase == Phase::Warming {
			self.phase = Phase::Settling;
		}
		for _ in 0..self.params.ticks_per_frame.max(1) {
			self.tick(graph);
			if self.alpha <= self.params.alpha_min && !matches!(self.phase, Phase::Dragging(_)) {
				self.phase = Phase::Converged;
				debug!("network-viz: layout converged");
				break;
			}
		}
		self.is_running()
	}

	/// Pins `node` at `at` and re-heats the graph around it.
	pub fn start_drag(&mut self, graph: &mut Graph, node: NodeIdx, at: Vec2) {
		if node.0 >= graph.nodes().len() {
			return;
		}
		graph.node_mut(node).pinned = Some(at);
		self.alpha_target = self.params.dragging_alpha_target;
		self.alpha = self.alpha.max(self.params.dragging_alpha);
		self.phase = Phase::Dragging(node);
	}

	/// Moves the pinned node.
	pub fn drag_to(&mut self, graph: &mut Graph, at: Vec2) {
		if let Phase::Dragging(node) = self.phase {
			graph.node_mut(node).pinned = Some(at);
		}
	}

	/// Releases the pinned node and lets the graph cool down.
	pub fn end_drag(&mut self, graph: &mut Graph) {
		if let Phase::Dragging(node) = self.phase {
			graph.node_mut(node).pinned = None;
			self.alpha_target = self.params.alpha_target;
			self.phase = Phase::Settling;
		}
	}

	/// Applies new tuning without resetting positions.
	pub fn set_params(&mut self, params: SimulationParams, graph: &Graph) {
		self.alpha_decay = 1.0 - params.alpha_min.powf(1.0 / COOLING_TICKS);
		if !matches!(self.phase, Phase::Dragging(_)) {
			self.alpha_target = params.alpha_target;
		}
		self.params = params;
		self.rebuild(graph);
		self.reheat(REHEAT_ALPHA);
	}

	/// Raises alpha to at least `alpha` and resumes the frame loop.
	pub fn reheat(&mut self, alpha: f64) {
		if matches!(self.phase, Phase::Idle) || self.links.len() + self.collide_radii.len() == 0 {
			return;
		}
		self.alpha = self.alpha.max(alpha);
		if self.phase == Phase::Converged {
			self.phase = Phase::Settling;
		}
	}
}

/// Spreads nodes evenly on a circle sized to the node count.
pub fn circular_layout(graph: &mut Graph, link_distance: f64) {
	let count = graph.nodes().len();
	let radius = count as f64 * link_distance / TAU;
	for (i, node) in graph.nodes_mut().iter_mut().enumerate() {
		let angle = TAU * i as f64 / count as f64;
		node.position = Vec2::new(radius * angle.sin(), radius * angle.cos());
	}
}

#[cfg(test)]
mod tests {
	use super::super::graph::tests::{people, prepare};
	use super::super::types::GraphData;
	use super::*;

	fn loaded(data: GraphData) -> (Graph, Simulation) {
		let (mut graph, _) = prepare(data);
		let mut sim = Simulation::new(SimulationParams::default());
		sim.load(&mut graph);
		(graph, sim)
	}

	#[test]
	fn load_places_nodes_on_a_circle() {
		let (graph, sim) = loaded(people());
		let expected = 3.0 * 45.0 / TAU;
		for node in graph.nodes() {
			assert!((node.position.length() - expected).abs() < 1e-9);
		}
		assert_eq!(sim.phase(), Phase::Warming);
		assert_eq!(sim.alpha(), 1.0);
	}

	#[test]
	fn empty_graph_is_converged_immediately() {
		let (mut graph, mut sim) = loaded(GraphData::default());
		assert_eq!(sim.phase(), Phase::Converged);
		assert!(!sim.frame(&mut graph));
	}

	#[test]
	fn precompute_stops_at_time_budget() {
		let (mut graph, mut sim) = loaded(people());
		let mut clock = 0.0;
		let ticks = sim.precompute(&mut graph, PrecomputeBudget::default(), || {
			let now = clock;
			clock += 10.0;
			now
		});
		assert_eq!(ticks, 24);
		assert_eq!(sim.phase(), Phase::Settling);
	}

	#[test]
	fn precompute_stops_at_tick_budget() {
		let (mut graph, mut sim) = loaded(people());
		let ticks = sim.precompute(&mut graph, PrecomputeBudget::default(), || 0.0);
		assert_eq!(ticks, 150);
		assert!(sim.is_running());
	}

	#[test]
	fn alpha_cools_monotonically_until_frames_stop() {
		let (mut graph, mut sim) = loaded(people());
		let mut previous = sim.alpha();
		let mut frames = 0;
		while sim.frame(&mut graph) {
			assert!(sim.alpha() <= previous);
			previous = sim.alpha();
			frames += 1;
			assert!(frames < 1000, "simulation never converged");
		}
		assert!(sim.alpha() <= SimulationParams::default().alpha_min);
		assert_eq!(sim.phase(), Phase::Converged);
		let settled = sim.alpha();
		assert!(!sim.frame(&mut graph));
		assert_eq!(sim.alpha(), settled);
		for node in graph.nodes() {
			assert!(node.position.x.is_finite() && node.position.y.is_finite());
		}
	}

	#[test]
	fn layout_separates_linked_nodes() {
		let (mut graph, mut sim) = loaded(people());
		while sim.frame(&mut graph) {}
		let a = graph.node(NodeIdx(0)).position;
		let b = graph.node(NodeIdx(1)).position;
		let gap = (a - b).length();
		assert!(gap > 2.0 * 8.0, "nodes overlap: {gap}");
	}

	#[test]
	fn drag_pins_node_and_keeps_graph_warm() {
		let (mut graph, mut sim) = loaded(people());
		while sim.frame(&mut graph) {}

		let pin = Vec2::new(300.0, -120.0);
		sim.start_drag(&mut graph, NodeIdx(0), pin);
		assert_eq!(sim.phase(), Phase::Dragging(NodeIdx(0)));
		assert!(sim.alpha() >= 0.8);
		for _ in 0..200 {
			assert!(sim.frame(&mut graph));
		}
		assert_eq!(graph.node(NodeIdx(0)).position, pin);
		assert!(sim.alpha() > SimulationParams::default().alpha_min);

		sim.end_drag(&mut graph);
		assert_eq!(graph.node(NodeIdx(0)).pinned, None);
		assert_eq!(sim.alpha_target(), 0.0);
		assert_eq!(sim.phase(), Phase::Settling);
		let mut frames = 0;
		while sim.frame(&mut graph) {
			frames += 1;
			assert!(frames < 1000);
		}
		assert_eq!(sim.phase(), Phase::Converged);
	}

	#[test]
	fn new_params_reheat_without_relayout() {
		let (mut graph, mut sim) = loaded(people());
		while sim.frame(&mut graph) {}
		let before: Vec<Vec2> = graph.nodes().iter().map(|n| n.position).collect();

		let params = SimulationParams {
			charge_strength: -100.0,
			..SimulationParams::default()
		};
		sim.set_params(params, &graph);
		assert_eq!(sim.phase(), Phase::Settling);
		assert!(sim.alpha() >= REHEAT_ALPHA);
		let after: Vec<Vec2> = graph.nodes().iter().map(|n| n.position).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn rest_length_grows_with_radii() {
		let (graph, sim) = loaded(people());
		assert_eq!(sim.links.len(), 2);
		assert_eq!(sim.links[0].distance, 8.0 + 8.0 + 90.0);
		// n1 has degree 1, n2 degree 2.
		assert_eq!(sim.links[0].strength, 1.0);
		assert!((sim.links[0].bias - 1.0 / 3.0).abs() < 1e-12);
		assert_eq!(sim.collide_radii, vec![33.0; graph.nodes().len()]);
	}
}
