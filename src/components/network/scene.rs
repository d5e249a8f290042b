//! Renderable scene derived from the graph.
//!
//! A [`Scene`] is built once per graph/style combination. While the layout
//! runs, only [`Scene::update_positions`] is called: it rewrites geometry in
//! place and never allocates, so it is cheap enough for every frame.
//!
//! Edges come first in draw order so nodes paint over line ends.

use std::f64::consts::FRAC_PI_2;
use std::f64::consts::PI;

use super::caption::CaptionLine;
use super::graph::{EdgeIdx, Graph, NodeIdx, Vec2};
use super::theme::Theme;

/// Arrowhead length per unit of stroke width.
pub const ARROW_SIZE: f64 = 4.0;
/// Gap between a node's circle and its highlight ring.
pub const RING_OFFSET: f64 = 1.0;

/// A node circle with its highlight ring and caption.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
	pub node: NodeIdx,
	pub center: Vec2,
	pub radius: f64,
	pub ring_radius: f64,
	pub color: String,
	pub caption_color: String,
	pub caption: Vec<CaptionLine>,
}

/// An edge path with arrowhead, rotated caption and hit region.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeShape {
	pub edge: EdgeIdx,
	pub source: NodeIdx,
	pub target: NodeIdx,
	/// Path start (source centre).
	pub start: Vec2,
	/// Path end, short of the target by its radius plus the arrowhead.
	pub end: Vec2,
	/// Arrowhead as tip, left and right corners.
	pub arrow: [Vec2; 3],
	pub midpoint: Vec2,
	/// Caption rotation in radians, kept within `(-pi/2, pi/2]` so text is upright.
	pub angle: f64,
	pub label: String,
	pub color: String,
	pub stroke_width: f64,
	/// Width of the invisible overlay used for hover, selection and hit tests.
	pub hit_width: f64,
	/// False when the endpoints overlap too much to draw a path.
	pub visible: bool,
}

/// Ordered drawing instructions for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub edges: Vec<EdgeShape>,
	pub nodes: Vec<NodeShape>,
}

impl Scene {
	/// Builds shapes for every node and edge of `graph`.
	pub fn build(graph: &Graph, theme: &Theme) -> Self {
		let nodes = graph
			.nodes()
			.iter()
			.enumerate()
			.map(|(i, node)| NodeShape {
				node: NodeIdx(i),
				center: Vec2::ZERO,
				radius: node.radius,
				ring_radius: node.radius + RING_OFFSET,
				color: node.color.clone(),
				caption_color: theme.caption_color_for(&node.color).to_css(),
				caption: node.caption.clone(),
			})
			.collect();
		let edges = graph
			.edges()
			.iter()
			.enumerate()
			.map(|(i, edge)| EdgeShape {
				edge: EdgeIdx(i),
				source: edge.source,
				target: edge.target,
				start: Vec2::ZERO,
				end: Vec2::ZERO,
				arrow: [Vec2::ZERO; 3],
				midpoint: Vec2::ZERO,
				angle: 0.0,
				label: edge.label.clone(),
				color: edge.color.clone(),
				stroke_width: edge.stroke_width,
				hit_width: edge.stroke_width + ARROW_SIZE * 2.0,
				visible: false,
			})
			.collect();
		let mut scene = Scene { edges, nodes };
		scene.update_positions(graph);
		scene
	}

	/// Rewrites all geometry from the graph's current positions.
	pub fn update_positions(&mut self, graph: &Graph) {
		for shape in &mut self.nodes {
			shape.center = graph.node(shape.node).position;
		}
		for shape in &mut self.edges {
			let source = graph.node(shape.source);
			let target = graph.node(shape.target);
			layout_edge(shape, source.position, target.position, target.radius);
		}
	}

	/// Topmost node whose circle contains `point`.
	pub fn node_at(&self, point: Vec2) -> Option<NodeIdx> {
		self.nodes
			.iter()
			.rev()
			.find(|shape| (point - shape.center).length_sq() <= shape.radius * shape.radius)
			.map(|shape| shape.node)
	}

	/// Topmost edge whose overlay stroke contains `point`.
	pub fn edge_at(&self, point: Vec2) -> Option<EdgeIdx> {
		self.edges
			.iter()
			.rev()
			.filter(|shape| shape.visible)
			.find(|shape| {
				let half = shape.hit_width / 2.0;
				distance_sq_to_segment(point, shape.start, shape.arrow[0]) <= half * half
			})
			.map(|shape| shape.edge)
	}
}

fn layout_edge(shape: &mut EdgeShape, from: Vec2, to: Vec2, target_radius: f64) {
	let delta = to - from;
	let distance = delta.length();
	let arrow_length = ARROW_SIZE * shape.stroke_width;

	shape.start = from;
	shape.midpoint = (from + to) * 0.5;
	shape.angle = upright_angle(delta);
	shape.visible = distance > target_radius + arrow_length;
	if !shape.visible {
		shape.end = from;
		shape.arrow = [from; 3];
		return;
	}

	let unit = delta * (1.0 / distance);
	let normal = Vec2::new(-unit.y, unit.x) * (arrow_length / 2.0);
	let tip = to - unit * target_radius;
	let back = tip - unit * arrow_length;
	shape.end = back;
	shape.arrow = [tip, back + normal, back - normal];
}

fn upright_angle(delta: Vec2) -> f64 {
	if delta.x == 0.0 && delta.y == 0.0 {
		return 0.0;
	}
	let angle = delta.y.atan2(delta.x);
	if angle > FRAC_PI_2 {
		angle - PI
	} else if angle <= -FRAC_PI_2 {
		angle + PI
	} else {
		angle
	}
}

fn distance_sq_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f64 {
	let ab = b - a;
	let len_sq = ab.length_sq();
	if len_sq == 0.0 {
		return (point - a).length_sq();
	}
	let t = (((point.x - a.x) * ab.x + (point.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
	(point - (a + ab * t)).length_sq()
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::super::graph::tests::{edge, node, people, prepare};
	use super::super::simulation::{Simulation, SimulationParams};
	use super::super::types::GraphData;
	use super::*;

	fn settled(data: GraphData) -> Graph {
		let (mut graph, _) = prepare(data);
		let mut sim = Simulation::new(SimulationParams::default());
		sim.load(&mut graph);
		while sim.frame(&mut graph) {}
		graph
	}

	#[test]
	fn arrow_tip_touches_target_boundary() {
		let graph = settled(people());
		let scene = Scene::build(&graph, &Theme::default());
		for shape in &scene.edges {
			assert!(shape.visible);
			let target = graph.node(shape.target);
			let tip_distance = (shape.arrow[0] - target.position).length();
			assert!((tip_distance - target.radius).abs() < 1e-9);
			let end_distance = (shape.end - target.position).length();
			assert!((end_distance - target.radius - ARROW_SIZE * shape.stroke_width).abs() < 1e-9);
		}
	}

	#[test]
	fn captions_stay_upright() {
		assert_eq!(upright_angle(Vec2::new(1.0, 0.0)), 0.0);
		assert_eq!(upright_angle(Vec2::new(-1.0, 0.0)), 0.0);
		assert!((upright_angle(Vec2::new(-1.0, -1.0)) - PI / 4.0).abs() < 1e-12);
		assert!((upright_angle(Vec2::new(0.0, -1.0)) - FRAC_PI_2).abs() < 1e-12);
		assert_eq!(upright_angle(Vec2::ZERO), 0.0);
	}

	#[test]
	fn update_matches_fresh_build() {
		let (mut graph, _) = prepare(people());
		let mut sim = Simulation::new(SimulationParams::default());
		sim.load(&mut graph);
		let theme = Theme::default();
		let mut scene = Scene::build(&graph, &theme);
		sim.frame(&mut graph);
		scene.update_positions(&graph);
		assert_eq!(scene, Scene::build(&graph, &theme));
	}

	#[test]
	fn self_loop_is_not_drawn() {
		let data = GraphData {
			nodes: vec![node("a", "L")],
			links: vec![edge("a", "a", "SELF")],
		};
		let graph = settled(data);
		let scene = Scene::build(&graph, &Theme::default());
		assert!(!scene.edges[0].visible);
		assert_eq!(scene.edge_at(graph.node(NodeIdx(0)).position), None);
	}

	#[test]
	fn hit_tests_prefer_nodes_then_edges() {
		let graph = settled(people());
		let scene = Scene::build(&graph, &Theme::default());
		let n2 = graph.node(NodeIdx(1)).position;
		assert_eq!(scene.node_at(n2), Some(NodeIdx(1)));
		let mid = scene.edges[0].midpoint;
		assert_eq!(scene.node_at(mid), None);
		assert_eq!(scene.edge_at(mid), Some(EdgeIdx(0)));
		assert_eq!(scene.edge_at(Vec2::new(10_000.0, 10_000.0)), None);
	}

	proptest! {
		#[test]
		fn scene_only_references_rendered_nodes(
			node_count in 0usize..6,
			links in prop::collection::vec((0usize..9, 0usize..9), 0..12),
		) {
			let data = GraphData {
				nodes: (0..node_count).map(|i| node(&format!("n{i}"), "L")).collect(),
				links: links.iter().map(|(s, t)| edge(&format!("n{s}"), &format!("n{t}"), "R")).collect(),
			};
			let (mut graph, _) = prepare(data);
			let mut sim = Simulation::new(SimulationParams::default());
			sim.load(&mut graph);
			sim.frame(&mut graph);
			let theme = Theme::default();
			let scene = Scene::build(&graph, &theme);
			for shape in &scene.edges {
				prop_assert!(scene.nodes.iter().any(|n| n.node == shape.source));
				prop_assert!(scene.nodes.iter().any(|n| n.node == shape.target));
			}
			prop_assert_eq!(&scene, &Scene::build(&graph, &theme));
		}
	}
}
