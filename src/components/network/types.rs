//! Input records and options for the network component.
//!
//! The records mirror the payload produced by the upstream query decoder:
//! nodes and links carry a handful of reserved keys (`id`, `label__`, ...) and
//! every other key is a property shown in the info panel, in source order.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A node as decoded from a query result row.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NodeRecord {
	/// Unique identifier for this node. Used to reference nodes in links.
	pub id: String,
	/// Primary label; keys style lookups and legend grouping.
	#[serde(rename = "label__", default)]
	pub label: String,
	/// Every label carried by the node (the primary label is usually first).
	#[serde(rename = "labels__", default)]
	pub labels: Vec<String>,
	/// Remaining keys, in source order.
	#[serde(flatten)]
	pub properties: Map<String, Value>,
}

/// A directed relationship between two nodes.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct EdgeRecord {
	/// Optional identifier supplied by the source database.
	#[serde(default)]
	pub id: Option<String>,
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
	/// Relationship type.
	#[serde(rename = "label__", default)]
	pub label: String,
	/// Remaining keys, in source order.
	#[serde(flatten)]
	pub properties: Map<String, Value>,
}

/// Complete graph payload: nodes and links.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GraphData {
	/// Nodes in payload order.
	#[serde(default)]
	pub nodes: Vec<NodeRecord>,
	/// Relationships; `edges` is accepted as well.
	#[serde(default, alias = "edges")]
	pub links: Vec<EdgeRecord>,
}

/// Per-label visual overrides. Unset or falsy fields fall back to defaults.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectStyle {
	/// CSS color for the node fill or the edge stroke.
	pub color: Option<String>,
	/// Edge stroke width in world units.
	pub stroke_width: Option<f64>,
	/// Node radius in world units.
	pub radius: Option<f64>,
	/// Property key whose value is drawn as the node caption.
	pub label: Option<String>,
}

/// Label → style overrides.
pub type ObjectStyleConfig = HashMap<String, ObjectStyle>;

/// Visualization options as edited by the user.
///
/// Every field is optional in the JSON; missing ones take the documented
/// default, the same way a partial options object is merged over defaults.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkOptions {
	/// Many-body strength. Negative values repel.
	pub charge_strength: f64,
	/// Link spring strength. `None` uses `1 / min(degree(source), degree(target))`.
	pub link_strength: Option<f64>,
	/// Margin added to each node's radius for collision avoidance.
	pub collision_radius: f64,
	/// Strength of the pull towards the origin, applied on each axis.
	pub centre_attraction: f64,
	/// Per-label style overrides.
	pub object_options: ObjectStyleConfig,
}

impl Default for NetworkOptions {
	fn default() -> Self {
		Self {
			charge_strength: -400.0,
			link_strength: None,
			collision_radius: 25.0,
			centre_attraction: 0.03,
			object_options: HashMap::new(),
		}
	}
}
