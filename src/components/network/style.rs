//! Per-label style resolution.
//!
//! Every visual attribute of a node or edge is looked up in the user's
//! [`ObjectStyleConfig`] by label. A missing label, a missing field or a falsy
//! value (`0`, empty string) all resolve to the documented default, so lookups
//! never fail.

use super::theme::Color;
use super::types::{ObjectStyle, ObjectStyleConfig};

/// Node radius when no override is configured.
pub const DEFAULT_NODE_RADIUS: f64 = 8.0;
/// Edge stroke width when no override is configured.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
/// Edge color when no override is configured.
pub const DEFAULT_LINK_COLOR: &str = "#a5abb6";

/// Fixed palette for label-derived default colors.
pub const BASE_COLORS: [Color; 14] = [
	Color::rgb(0x35, 0x6a, 0xff), // Blue
	Color::rgb(0xe9, 0x28, 0x28), // Red
	Color::rgb(0x3b, 0xd9, 0x73), // Green
	Color::rgb(0x60, 0x4f, 0xe9), // Purple
	Color::rgb(0x50, 0xf5, 0xed), // Cyan
	Color::rgb(0xfb, 0x8d, 0x3d), // Orange
	Color::rgb(0x79, 0x9c, 0xff), // Light Blue
	Color::rgb(0xb5, 0x54, 0xff), // Lilac
	Color::rgb(0x8c, 0xff, 0xb4), // Light Green
	Color::rgb(0xa5, 0x5f, 0x2a), // Brown
	Color::rgb(0x00, 0x00, 0x00), // Black
	Color::rgb(0x49, 0x49, 0x49), // Gray
	Color::rgb(0xff, 0x7d, 0xe3), // Pink
	Color::rgb(0x00, 0x2f, 0xb4), // Dark Blue
];

/// A configured value that may be "unset" even when present.
pub trait StyleValue: Clone {
	fn is_falsy(&self) -> bool;
}

impl StyleValue for String {
	fn is_falsy(&self) -> bool {
		self.is_empty()
	}
}

impl StyleValue for f64 {
	fn is_falsy(&self) -> bool {
		*self == 0.0 || self.is_nan()
	}
}

/// Looks up `field` on the style configured for `label`.
///
/// Returns `default` when the label has no style, when the field is unset, or
/// when the configured value is falsy.
pub fn resolve<T: StyleValue>(
	config: &ObjectStyleConfig,
	label: &str,
	field: impl Fn(&ObjectStyle) -> Option<&T>,
	default: T,
) -> T {
	config
		.get(label)
		.and_then(field)
		.filter(|value| !value.is_falsy())
		.cloned()
		.unwrap_or(default)
}

/// Stable palette color for a label.
///
/// Uses FNV-1a over the label bytes, so the color depends only on the label
/// text and never on the order in which labels were first seen.
pub fn label_color(label: &str) -> Color {
	let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
	for byte in label.bytes() {
		hash ^= u64::from(byte);
		hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
	}
	BASE_COLORS[(hash % BASE_COLORS.len() as u64) as usize]
}

pub fn node_color(config: &ObjectStyleConfig, label: &str) -> String {
	resolve(config, label, |s| s.color.as_ref(), label_color(label).to_css_rgb())
}

pub fn node_radius(config: &ObjectStyleConfig, label: &str) -> f64 {
	resolve(config, label, |s| s.radius.as_ref(), DEFAULT_NODE_RADIUS)
}

/// Property key used as the caption, if any.
pub fn node_caption_key(config: &ObjectStyleConfig, label: &str) -> Option<String> {
	Some(resolve(config, label, |s| s.label.as_ref(), String::new())).filter(|key| !key.is_empty())
}

pub fn edge_color(config: &ObjectStyleConfig, label: &str) -> String {
	resolve(config, label, |s| s.color.as_ref(), DEFAULT_LINK_COLOR.to_string())
}

pub fn edge_stroke_width(config: &ObjectStyleConfig, label: &str) -> f64 {
	resolve(config, label, |s| s.stroke_width.as_ref(), DEFAULT_STROKE_WIDTH)
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use proptest::prelude::*;

	use super::*;

	fn config_with(label: &str, style: ObjectStyle) -> ObjectStyleConfig {
		HashMap::from([(label.to_string(), style)])
	}

	#[test]
	fn absent_label_uses_default() {
		let config = config_with("Movie", ObjectStyle { radius: Some(20.0), ..Default::default() });
		assert_eq!(node_radius(&config, "Person"), DEFAULT_NODE_RADIUS);
	}

	#[test]
	fn absent_field_uses_default() {
		let config = config_with("Person", ObjectStyle { color: Some("#123456".into()), ..Default::default() });
		assert_eq!(node_radius(&config, "Person"), DEFAULT_NODE_RADIUS);
		assert_eq!(edge_stroke_width(&config, "Person"), DEFAULT_STROKE_WIDTH);
		assert_eq!(node_color(&config, "Person"), "#123456");
	}

	#[test]
	fn falsy_field_uses_default() {
		let config = config_with(
			"Person",
			ObjectStyle {
				color: Some(String::new()),
				radius: Some(0.0),
				stroke_width: Some(0.0),
				label: Some(String::new()),
			},
		);
		assert_eq!(node_radius(&config, "Person"), DEFAULT_NODE_RADIUS);
		assert_eq!(edge_stroke_width(&config, "Person"), DEFAULT_STROKE_WIDTH);
		assert_eq!(edge_color(&config, "Person"), DEFAULT_LINK_COLOR);
		assert_eq!(node_color(&config, "Person"), label_color("Person").to_css_rgb());
		assert_eq!(node_caption_key(&config, "Person"), None);
	}

	#[test]
	fn configured_values_win() {
		let config = config_with(
			"KNOWS",
			ObjectStyle {
				color: Some("#ff0000".into()),
				stroke_width: Some(5.0),
				radius: Some(30.0),
				label: Some("name".into()),
			},
		);
		assert_eq!(edge_color(&config, "KNOWS"), "#ff0000");
		assert_eq!(edge_stroke_width(&config, "KNOWS"), 5.0);
		assert_eq!(node_radius(&config, "KNOWS"), 30.0);
		assert_eq!(node_caption_key(&config, "KNOWS").as_deref(), Some("name"));
	}

	proptest! {
		#[test]
		fn label_color_is_order_independent(labels in prop::collection::vec("[A-Za-z]{1,12}", 1..8)) {
			let forward: Vec<Color> = labels.iter().map(|l| label_color(l)).collect();
			let mut backward: Vec<Color> = labels.iter().rev().map(|l| label_color(l)).collect();
			backward.reverse();
			prop_assert_eq!(forward, backward);
		}

		#[test]
		fn label_color_comes_from_palette(label in ".{0,24}") {
			prop_assert!(BASE_COLORS.contains(&label_color(&label)));
		}
	}
}
