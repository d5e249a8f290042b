//! User-supplied overlay drawing with a failure boundary.
//!
//! Hooks never touch the canvas directly. Each one records primitives into
//! its own [`Overlay`]; only hooks that return `Ok` get their primitives
//! drawn, so a failing hook leaves no partial output behind.

use anyhow::Result;
use log::warn;

use super::graph::{Graph, Vec2};
use super::interaction::ViewTransform;
use super::scene::Scene;

/// A drawing primitive in world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayOp {
	Circle {
		center: Vec2,
		radius: f64,
		color: String,
	},
	Line {
		from: Vec2,
		to: Vec2,
		color: String,
		width: f64,
	},
	Text {
		text: String,
		at: Vec2,
		color: String,
	},
}

/// The drawing capabilities handed to a hook.
#[derive(Debug, Default)]
pub struct Overlay {
	ops: Vec<OverlayOp>,
}

impl Overlay {
	/// Fills a circle.
	pub fn circle(&mut self, center: Vec2, radius: f64, color: impl Into<String>) {
		self.ops.push(OverlayOp::Circle {
			center,
			radius,
			color: color.into(),
		});
	}

	/// Strokes a straight segment `width` units wide.
	pub fn line(&mut self, from: Vec2, to: Vec2, color: impl Into<String>, width: f64) {
		self.ops.push(OverlayOp::Line {
			from,
			to,
			color: color.into(),
			width,
		});
	}

	/// Writes left-aligned text with its baseline at `at`.
	pub fn text(&mut self, text: impl Into<String>, at: Vec2, color: impl Into<String>) {
		self.ops.push(OverlayOp::Text {
			text: text.into(),
			at,
			color: color.into(),
		});
	}
}

/// Read-only view of the current frame.
pub struct HookContext<'a> {
	/// Nodes and edges with their current positions.
	pub graph: &'a Graph,
	/// Geometry as drawn this frame.
	pub scene: &'a Scene,
	/// Current pan and zoom.
	pub view: &'a ViewTransform,
}

/// Extra drawing on top of the network.
pub trait OverlayHook {
	/// Name used when reporting a failure.
	fn name(&self) -> &str {
		"overlay"
	}

	/// Records this frame's primitives. On `Err` nothing recorded is drawn.
	fn draw(&mut self, overlay: &mut Overlay, ctx: &HookContext<'_>) -> Result<()>;
}

/// Runs every hook and returns the primitives of those that succeeded.
pub fn run_guarded(hooks: &mut [Box<dyn OverlayHook>], ctx: &HookContext<'_>) -> Vec<OverlayOp> {
	let mut ops = Vec::new();
	for hook in hooks.iter_mut() {
		let mut overlay = Overlay::default();
		match hook.draw(&mut overlay, ctx) {
			Ok(()) => ops.append(&mut overlay.ops),
			Err(err) => warn!("network-viz: overlay `{}` failed: {err:#}", hook.name()),
		}
	}
	ops
}
