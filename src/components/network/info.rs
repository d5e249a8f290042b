//! Structured content for the info panel.
//!
//! The panel either summarises the whole graph or describes one node or edge.
//! Markup lives in the component; this module only decides what is shown.

use serde_json::{Map, Value};

use super::graph::Graph;
use super::interaction::{Focus, Target};

/// One legend row: a label, its resolved colour and how often it occurs.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
	pub label: String,
	pub color: String,
	pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overview {
	pub node_labels: Vec<LegendEntry>,
	pub edge_labels: Vec<LegendEntry>,
	pub node_count: usize,
	pub edge_count: usize,
}

impl Overview {
	pub fn summary(&self) -> String {
		format!(
			"Displaying {} nodes, {} relationships.",
			self.node_count, self.edge_count
		)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
	Node,
	Edge,
}

/// A property rendered as `key: value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyRow {
	pub key: String,
	pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Details {
	pub kind: TargetKind,
	pub id: String,
	pub labels: Vec<String>,
	/// Background of the header badge; the target's resolved colour.
	pub header_color: String,
	/// Source and target node ids, for edges.
	pub endpoints: Option<(String, String)>,
	pub properties: Vec<PropertyRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InfoPanel {
	Overview(Overview),
	Details(Details),
}

impl Default for InfoPanel {
	fn default() -> Self {
		InfoPanel::Overview(Overview::default())
	}
}

/// Label legends in first-seen order with counts.
pub fn overview(graph: &Graph) -> Overview {
	let node_labels = graph
		.node_label_counts()
		.into_iter()
		.map(|(label, count)| LegendEntry {
			color: graph
				.nodes()
				.iter()
				.find(|n| n.label == label)
				.map(|n| n.color.clone())
				.unwrap_or_default(),
			label,
			count,
		})
		.collect();
	let edge_labels = graph
		.edge_label_counts()
		.into_iter()
		.map(|(label, count)| LegendEntry {
			color: graph
				.edges()
				.iter()
				.find(|e| e.label == label)
				.map(|e| e.color.clone())
				.unwrap_or_default(),
			label,
			count,
		})
		.collect();
	Overview {
		node_labels,
		edge_labels,
		node_count: graph.nodes().len(),
		edge_count: graph.edges().len(),
	}
}

pub fn details(graph: &Graph, target: Target) -> Details {
	match target {
		Target::Node(idx) => {
			let node = graph.node(idx);
			Details {
				kind: TargetKind::Node,
				id: node.id.clone(),
				labels: node.labels.clone(),
				header_color: node.color.clone(),
				endpoints: None,
				properties: rows(&node.properties),
			}
		}
		Target::Edge(idx) => {
			let edge = graph.edge(idx);
			Details {
				kind: TargetKind::Edge,
				id: edge.id.clone(),
				labels: if edge.label.is_empty() {
					Vec::new()
				} else {
					vec![edge.label.clone()]
				},
				header_color: edge.color.clone(),
				endpoints: Some((
					graph.node(edge.source).id.clone(),
					graph.node(edge.target).id.clone(),
				)),
				properties: rows(&edge.properties),
			}
		}
	}
}

/// Panel content for the current focus.
pub fn panel(graph: &Graph, focus: Focus) -> InfoPanel {
	match focus {
		Focus::Overview => InfoPanel::Overview(overview(graph)),
		Focus::Hovering(target) | Focus::Selected(target) => InfoPanel::Details(details(graph, target)),
	}
}

fn rows(properties: &Map<String, Value>) -> Vec<PropertyRow> {
	properties
		.iter()
		.map(|(key, value)| PropertyRow {
			key: key.clone(),
			value: match value {
				Value::String(s) => s.clone(),
				Value::Null => String::new(),
				other => other.to_string(),
			},
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::super::graph::tests::{people, prepare};
	use super::super::graph::{EdgeIdx, NodeIdx};
	use super::super::style::{DEFAULT_LINK_COLOR, label_color};
	use super::*;

	#[test]
	fn overview_counts_people_graph() {
		let (graph, _) = prepare(people());
		let overview = overview(&graph);
		assert_eq!(
			overview.node_labels,
			vec![LegendEntry {
				label: "Person".into(),
				color: label_color("Person").to_css_rgb(),
				count: 3,
			}]
		);
		assert_eq!(
			overview.edge_labels,
			vec![LegendEntry {
				label: "KNOWS".into(),
				color: DEFAULT_LINK_COLOR.into(),
				count: 2,
			}]
		);
		assert_eq!(overview.summary(), "Displaying 3 nodes, 2 relationships.");
	}

	#[test]
	fn node_details_keep_property_order() {
		let mut data = people();
		data.nodes[0].labels = vec!["Person".into(), "Engineer".into()];
		data.nodes[0].properties.insert("name".into(), "Ada".into());
		data.nodes[0].properties.insert("born".into(), 1815.into());
		data.nodes[0].properties.insert("alias".into(), Value::Null);
		let (graph, _) = prepare(data);
		let details = details(&graph, Target::Node(NodeIdx(0)));
		assert_eq!(details.kind, TargetKind::Node);
		assert_eq!(details.id, "n1");
		assert_eq!(details.labels, vec!["Person", "Engineer"]);
		let keys: Vec<&str> = details.properties.iter().map(|r| r.key.as_str()).collect();
		assert_eq!(keys, vec!["name", "born", "alias"]);
		assert_eq!(details.properties[1].value, "1815");
		assert_eq!(details.properties[2].value, "");
	}

	#[test]
	fn edge_details_name_endpoints() {
		let (graph, _) = prepare(people());
		let details = details(&graph, Target::Edge(EdgeIdx(1)));
		assert_eq!(details.kind, TargetKind::Edge);
		assert_eq!(details.id, "n2-[KNOWS]->n3");
		assert_eq!(details.endpoints, Some(("n2".into(), "n3".into())));
		assert_eq!(details.header_color, DEFAULT_LINK_COLOR);
	}

	#[test]
	fn panel_follows_focus() {
		let (graph, _) = prepare(people());
		assert!(matches!(panel(&graph, Focus::Overview), InfoPanel::Overview(_)));
		let hovered = panel(&graph, Focus::Hovering(Target::Node(NodeIdx(2))));
		assert!(matches!(hovered, InfoPanel::Details(d) if d.id == "n3"));
	}
}
