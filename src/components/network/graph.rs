//! Arena-backed graph model.
//!
//! Nodes and edges live in flat vectors addressed by [`NodeIdx`] / [`EdgeIdx`].
//! Edges reference their endpoints by index, resolved once during
//! [`Graph::prepare`], so the simulation and scene never chase string ids or
//! see a dangling reference.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use log::warn;
use serde_json::{Map, Value};

use super::caption::{self, CaptionLine, Font, TextMeasure};
use super::style;
use super::types::{GraphData, NetworkOptions};

/// 2D point or vector in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
	/// Horizontal component, growing to the right.
	pub x: f64,
	/// Vertical component, growing downwards.
	pub y: f64,
}

impl Vec2 {
	/// The origin.
	pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

	/// Creates a vector from its components.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Squared length; avoids the square root in distance comparisons.
	pub fn length_sq(self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	/// Euclidean length.
	pub fn length(self) -> f64 {
		self.length_sq().sqrt()
	}
}

impl Add for Vec2 {
	type Output = Vec2;
	fn add(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Vec2 {
	type Output = Vec2;
	fn sub(self, rhs: Vec2) -> Vec2 {
		Vec2::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Vec2 {
	type Output = Vec2;
	fn mul(self, rhs: f64) -> Vec2 {
		Vec2::new(self.x * rhs, self.y * rhs)
	}
}

impl AddAssign for Vec2 {
	fn add_assign(&mut self, rhs: Vec2) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl SubAssign for Vec2 {
	fn sub_assign(&mut self, rhs: Vec2) {
		self.x -= rhs.x;
		self.y -= rhs.y;
	}
}

/// Stable index of a node in its [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub usize);

/// Stable index of an edge in its [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(pub usize);

/// A node plus its simulation and derived style state.
#[derive(Clone, Debug)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub labels: Vec<String>,
	pub properties: Map<String, Value>,
	pub position: Vec2,
	pub velocity: Vec2,
	/// Set while the node is dragged; overrides the simulated position.
	pub pinned: Option<Vec2>,
	pub radius: f64,
	pub color: String,
	pub caption_key: Option<String>,
	pub caption: Vec<CaptionLine>,
}

/// A directed edge between two nodes of the same graph.
#[derive(Clone, Debug)]
pub struct GraphEdge {
	pub id: String,
	pub source: NodeIdx,
	pub target: NodeIdx,
	pub label: String,
	pub properties: Map<String, Value>,
	pub color: String,
	pub stroke_width: f64,
}

/// Recoverable problems found while preparing or mounting a graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Issue {
	/// An edge endpoint names a node that is not in the graph. The edge is dropped.
	DanglingEdge {
		source: String,
		target: String,
		missing: String,
	},
	/// A node id appeared more than once. Later occurrences are dropped.
	DuplicateNode { id: String },
	/// The drawing surface has no area yet; setup waits for the next resize.
	SurfaceNotReady { width: f64, height: f64 },
}

impl fmt::Display for Issue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Issue::DanglingEdge {
				source,
				target,
				missing,
			} => write!(f, "dropped edge {source} -> {target}: unknown node {missing}"),
			Issue::DuplicateNode { id } => write!(f, "dropped duplicate node {id}"),
			Issue::SurfaceNotReady { width, height } => {
				write!(f, "surface is {width}x{height}, deferring layout")
			}
		}
	}
}

/// Nodes (unique by id) and the edges between them.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<GraphNode>,
	edges: Vec<GraphEdge>,
	index: HashMap<String, NodeIdx>,
}

impl Graph {
	/// Builds a graph from decoded records and resolves every style.
	///
	/// Edges whose endpoints are missing and nodes whose id repeats are
	/// dropped and reported; neither is an error.
	pub fn prepare(
		data: GraphData,
		options: &NetworkOptions,
		font: &Font,
		measure: &mut impl TextMeasure,
	) -> (Self, Vec<Issue>) {
		let mut graph = Graph::default();
		let mut issues = Vec::new();

		for record in data.nodes {
			if graph.index.contains_key(&record.id) {
				issues.push(Issue::DuplicateNode { id: record.id });
				continue;
			}
			let labels = if record.labels.is_empty() && !record.label.is_empty() {
				vec![record.label.clone()]
			} else {
				record.labels
			};
			graph.index.insert(record.id.clone(), NodeIdx(graph.nodes.len()));
			graph.nodes.push(GraphNode {
				id: record.id,
				label: record.label,
				labels,
				properties: record.properties,
				position: Vec2::ZERO,
				velocity: Vec2::ZERO,
				pinned: None,
				radius: style::DEFAULT_NODE_RADIUS,
				color: String::new(),
				caption_key: None,
				caption: Vec::new(),
			});
		}

		for record in data.links {
			let source = graph.index.get(&record.source).copied();
			let target = graph.index.get(&record.target).copied();
			let (Some(source), Some(target)) = (source, target) else {
				let missing = if source.is_none() {
					record.source.clone()
				} else {
					record.target.clone()
				};
				issues.push(Issue::DanglingEdge {
					source: record.source,
					target: record.target,
					missing,
				});
				continue;
			};
			let id = record
				.id
				.unwrap_or_else(|| format!("{}-[{}]->{}", record.source, record.label, record.target));
			graph.edges.push(GraphEdge {
				id,
				source,
				target,
				label: record.label,
				properties: record.properties,
				color: String::new(),
				stroke_width: style::DEFAULT_STROKE_WIDTH,
			});
		}

		for issue in &issues {
			warn!("network-viz: {}", issue);
		}

		graph.restyle(options, font, measure);
		(graph, issues)
	}

	/// Re-resolves colors, radii, stroke widths and captions from `options`.
	/// Positions and velocities are left untouched.
	pub fn restyle(&mut self, options: &NetworkOptions, font: &Font, measure: &mut impl TextMeasure) {
		let config = &options.object_options;
		for node in &mut self.nodes {
			node.color = style::node_color(config, &node.label);
			node.radius = style::node_radius(config, &node.label);
			node.caption_key = style::node_caption_key(config, &node.label);
			node.caption = caption::fit_node(node, font, measure);
		}
		for edge in &mut self.edges {
			edge.color = style::edge_color(config, &edge.label);
			edge.stroke_width = style::edge_stroke_width(config, &edge.label);
		}
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [GraphNode] {
		&mut self.nodes
	}

	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	pub fn node(&self, idx: NodeIdx) -> &GraphNode {
		&self.nodes[idx.0]
	}

	pub fn node_mut(&mut self, idx: NodeIdx) -> &mut GraphNode {
		&mut self.nodes[idx.0]
	}

	pub fn edge(&self, idx: EdgeIdx) -> &GraphEdge {
		&self.edges[idx.0]
	}

	pub fn node_by_id(&self, id: &str) -> Option<NodeIdx> {
		self.index.get(id).copied()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Number of edges touching each node. Self-loops count twice.
	pub fn degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for edge in &self.edges {
			degrees[edge.source.0] += 1;
			degrees[edge.target.0] += 1;
		}
		degrees
	}

	/// Node labels with their counts, in first-seen order.
	pub fn node_label_counts(&self) -> Vec<(String, usize)> {
		count_in_order(self.nodes.iter().map(|n| n.label.as_str()))
	}

	/// Edge labels with their counts, in first-seen order.
	pub fn edge_label_counts(&self) -> Vec<(String, usize)> {
		count_in_order(self.edges.iter().map(|e| e.label.as_str()))
	}
}

fn count_in_order<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
	let mut counts: Vec<(String, usize)> = Vec::new();
	let mut slots: HashMap<&str, usize> = HashMap::new();
	for label in labels {
		match slots.get(label) {
			Some(&slot) => counts[slot].1 += 1,
			None => {
				slots.insert(label, counts.len());
				counts.push((label.to_string(), 1));
			}
		}
	}
	counts
}

#[cfg(test)]
pub(crate) mod tests {
	use proptest::prelude::*;

	use super::super::caption::tests::monospace;
	use super::super::types::{EdgeRecord, NodeRecord};
	use super::*;

	pub(crate) fn node(id: &str, label: &str) -> NodeRecord {
		NodeRecord {
			id: id.into(),
			label: label.into(),
			..Default::default()
		}
	}

	pub(crate) fn edge(source: &str, target: &str, label: &str) -> EdgeRecord {
		EdgeRecord {
			source: source.into(),
			target: target.into(),
			label: label.into(),
			..Default::default()
		}
	}

	/// `n1 -> n2 -> n3`, all `Person`, both edges `KNOWS`.
	pub(crate) fn people() -> GraphData {
		GraphData {
			nodes: vec![node("n1", "Person"), node("n2", "Person"), node("n3", "Person")],
			links: vec![edge("n1", "n2", "KNOWS"), edge("n2", "n3", "KNOWS")],
		}
	}

	pub(crate) fn prepare(data: GraphData) -> (Graph, Vec<Issue>) {
		Graph::prepare(data, &NetworkOptions::default(), &Font::default(), &mut monospace)
	}

	#[test]
	fn dangling_edge_is_dropped_not_fatal() {
		let mut data = people();
		data.links.push(edge("n1", "n9", "KNOWS"));
		let (graph, issues) = prepare(data);
		assert_eq!(graph.edges().len(), 2);
		assert_eq!(
			issues,
			vec![Issue::DanglingEdge {
				source: "n1".into(),
				target: "n9".into(),
				missing: "n9".into(),
			}]
		);
	}

	#[test]
	fn duplicate_node_keeps_first() {
		let mut data = people();
		let mut dup = node("n1", "Robot");
		dup.properties.insert("name".into(), "copy".into());
		data.nodes.push(dup);
		let (graph, issues) = prepare(data);
		assert_eq!(graph.nodes().len(), 3);
		assert_eq!(graph.node(graph.node_by_id("n1").unwrap()).label, "Person");
		assert_eq!(issues, vec![Issue::DuplicateNode { id: "n1".into() }]);
	}

	#[test]
	fn styles_and_captions_are_resolved() {
		let mut data = people();
		data.nodes[0].properties.insert("name".into(), "Ada".into());
		let options: NetworkOptions = serde_json::from_str(
			r##"{"objectOptions": {"Person": {"radius": 20, "label": "name"}, "KNOWS": {"strokeWidth": 4, "color": "#00ff00"}}}"##,
		)
		.unwrap();
		let (graph, _) = Graph::prepare(data, &options, &Font::default(), &mut monospace);
		let n1 = graph.node(NodeIdx(0));
		assert_eq!(n1.radius, 20.0);
		assert_eq!(n1.caption_key.as_deref(), Some("name"));
		assert_eq!(n1.caption.len(), 1);
		assert_eq!(n1.caption[0].text, "Ada");
		assert!(graph.node(NodeIdx(1)).caption.is_empty());
		assert_eq!(graph.edges()[0].stroke_width, 4.0);
		assert_eq!(graph.edges()[0].color, "#00ff00");
	}

	#[test]
	fn labels_fall_back_to_primary_label() {
		let (graph, _) = prepare(people());
		assert_eq!(graph.node(NodeIdx(0)).labels, vec!["Person"]);
	}

	#[test]
	fn label_counts_keep_first_seen_order() {
		let mut data = people();
		data.nodes.insert(1, node("m1", "Movie"));
		let (graph, _) = prepare(data);
		assert_eq!(
			graph.node_label_counts(),
			vec![("Person".to_string(), 3), ("Movie".to_string(), 1)]
		);
		assert_eq!(graph.edge_label_counts(), vec![("KNOWS".to_string(), 2)]);
		assert_eq!(graph.degrees(), vec![1, 0, 2, 1]);
	}

	proptest! {
		#[test]
		fn every_kept_edge_resolves(
			node_count in 0usize..8,
			links in prop::collection::vec((0usize..12, 0usize..12), 0..20),
		) {
			let data = GraphData {
				nodes: (0..node_count).map(|i| node(&format!("n{i}"), "L")).collect(),
				links: links.iter().map(|(s, t)| edge(&format!("n{s}"), &format!("n{t}"), "R")).collect(),
			};
			let expected = links.iter().filter(|(s, t)| *s < node_count && *t < node_count).count();
			let (graph, issues) = prepare(data);
			prop_assert_eq!(graph.edges().len(), expected);
			prop_assert_eq!(issues.len(), links.len() - expected);
			for edge in graph.edges() {
				prop_assert!(edge.source.0 < graph.nodes().len());
				prop_assert!(edge.target.0 < graph.nodes().len());
			}
		}
	}
}
