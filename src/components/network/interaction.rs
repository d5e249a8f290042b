//! Pointer-driven view and selection state.
//!
//! What the info panel shows is a single [`Focus`] value, so hover and
//! selection can never both claim it. Zoom and pan only touch the
//! [`ViewTransform`] and leave focus alone.

use super::graph::{EdgeIdx, Graph, NodeIdx, Vec2};
use super::scene::Scene;

/// Smallest zoom factor reachable with the wheel.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom factor reachable with the wheel.
pub const MAX_ZOOM: f64 = 3.0;
/// Margin kept around the layout when fitting it to the surface.
pub const ZOOM_FIT_PADDING: f64 = 0.05;
/// Pointer travel, in pixels, before a press becomes a drag.
pub const DRAG_TOLERANCE: f64 = 5.0;

/// Something the pointer can hover or select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
	Node(NodeIdx),
	Edge(EdgeIdx),
}

/// What the info panel is about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
	#[default]
	Overview,
	Hovering(Target),
	Selected(Target),
}

/// How strongly a shape should be highlighted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
	None,
	Hovered,
	Selected,
}

/// Pan and zoom applied to the whole scene: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor, clamped to `MIN_ZOOM..=MAX_ZOOM`.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
		Vec2::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
	}

	pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
		Vec2::new(world.x * self.k + self.x, world.y * self.k + self.y)
	}

	/// Scales by `factor` keeping the world point under `anchor` fixed.
	pub fn zoom_at(&mut self, anchor: Vec2, factor: f64) {
		let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.k;
		self.x = anchor.x - (anchor.x - self.x) * ratio;
		self.y = anchor.y - (anchor.y - self.y) * ratio;
		self.k = k;
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.x += dx;
		self.y += dy;
	}

	/// Centres the layout in a `width` x `height` surface, shrinking it to fit
	/// with some padding but never magnifying past 1.
	pub fn fit(graph: &Graph, width: f64, height: f64) -> Self {
		let Some((min, max)) = layout_bounds(graph) else {
			return Self {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			};
		};
		let span = max - min;
		let k = if span.x > 0.0 && span.y > 0.0 {
			((1.0 - ZOOM_FIT_PADDING) * (width / span.x).min(height / span.y)).min(1.0)
		} else {
			1.0
		}
		.clamp(MIN_ZOOM, MAX_ZOOM);
		let centre = (min + max) * 0.5;
		Self {
			x: width / 2.0 - centre.x * k,
			y: height / 2.0 - centre.y * k,
			k,
		}
	}
}

/// Smallest box holding every node circle.
pub fn layout_bounds(graph: &Graph) -> Option<(Vec2, Vec2)> {
	graph.nodes().iter().fold(None, |acc, node| {
		let r = Vec2::new(node.radius, node.radius);
		let (lo, hi) = (node.position - r, node.position + r);
		Some(match acc {
			None => (lo, hi),
			Some((min, max)) => (
				Vec2::new(min.x.min(lo.x), min.y.min(lo.y)),
				Vec2::new(max.x.max(hi.x), max.y.max(hi.y)),
			),
		})
	})
}

/// Hover, selection and view for one graph.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
	view: ViewTransform,
	focus: Focus,
	selected: Option<Target>,
	under_pointer: Option<Target>,
}

impl Interaction {
	pub fn new(view: ViewTransform) -> Self {
		Self {
			view,
			..Self::default()
		}
	}

	pub fn view(&self) -> &ViewTransform {
		&self.view
	}

	pub fn focus(&self) -> Focus {
		self.focus
	}

	pub fn selected(&self) -> Option<Target> {
		self.selected
	}

	/// A click on `hit`, or on empty canvas when `None`.
	pub fn click(&mut self, hit: Option<Target>) {
		match hit {
			None => {
				self.selected = None;
				self.under_pointer = None;
				self.focus = Focus::Overview;
			}
			Some(target) if self.selected == Some(target) => {
				self.selected = None;
				self.focus = Focus::Overview;
			}
			Some(target) => {
				self.selected = Some(target);
				self.focus = Focus::Selected(target);
			}
		}
	}

	pub fn pointer_over(&mut self, target: Target) {
		self.under_pointer = Some(target);
		self.focus = if self.selected == Some(target) {
			Focus::Selected(target)
		} else {
			Focus::Hovering(target)
		};
	}

	/// Pointer left whatever it was over: fall back to the selection.
	pub fn pointer_out(&mut self) {
		self.under_pointer = None;
		self.focus = match self.selected {
			Some(target) => Focus::Selected(target),
			None => Focus::Overview,
		};
	}

	pub fn zoom_at(&mut self, anchor: Vec2, factor: f64) {
		self.view.zoom_at(anchor, factor);
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.view.pan_by(dx, dy);
	}

	/// Topmost node, else topmost edge, under a screen point.
	pub fn hit_test(&self, scene: &Scene, screen: Vec2) -> Option<Target> {
		let world = self.view.screen_to_world(screen);
		scene
			.node_at(world)
			.map(Target::Node)
			.or_else(|| scene.edge_at(world).map(Target::Edge))
	}

	pub fn emphasis(&self, target: Target) -> Emphasis {
		if self.selected == Some(target) {
			Emphasis::Selected
		} else if self.under_pointer == Some(target) {
			Emphasis::Hovered
		} else {
			Emphasis::None
		}
	}
}

/// Press/move/release tracking that tells clicks from drags.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragGesture {
	#[default]
	Idle,
	Pressed {
		hit: Option<Target>,
		origin: Vec2,
	},
	DraggingNode {
		node: NodeIdx,
	},
	Panning {
		last: Vec2,
	},
}

/// What a pointer move means for the rest of the system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureStep {
	Nothing,
	DragStart(NodeIdx),
	DragMove(NodeIdx),
	Pan(f64, f64),
}

/// What a pointer release means.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEnd {
	Nothing,
	Click(Option<Target>),
	DragEnd(NodeIdx),
}

impl DragGesture {
	pub fn press(&mut self, hit: Option<Target>, at: Vec2) {
		*self = DragGesture::Pressed { hit, origin: at };
	}

	pub fn move_to(&mut self, at: Vec2) -> GestureStep {
		match *self {
			DragGesture::Idle => GestureStep::Nothing,
			DragGesture::Pressed { hit, origin } => {
				if (at - origin).length_sq() <= DRAG_TOLERANCE * DRAG_TOLERANCE {
					return GestureStep::Nothing;
				}
				match hit {
					Some(Target::Node(node)) => {
						*self = DragGesture::DraggingNode { node };
						GestureStep::DragStart(node)
					}
					_ => {
						*self = DragGesture::Panning { last: at };
						let delta = at - origin;
						GestureStep::Pan(delta.x, delta.y)
					}
				}
			}
			DragGesture::DraggingNode { node } => GestureStep::DragMove(node),
			DragGesture::Panning { last } => {
				*self = DragGesture::Panning { last: at };
				GestureStep::Pan(at.x - last.x, at.y - last.y)
			}
		}
	}

	pub fn release(&mut self) -> GestureEnd {
		let end = match *self {
			DragGesture::Idle | DragGesture::Panning { .. } => GestureEnd::Nothing,
			DragGesture::Pressed { hit, .. } => GestureEnd::Click(hit),
			DragGesture::DraggingNode { node } => GestureEnd::DragEnd(node),
		};
		*self = DragGesture::Idle;
		end
	}

	/// Abandons the gesture, e.g. when the pointer leaves the surface.
	pub fn cancel(&mut self) -> Option<NodeIdx> {
		let dragged = match *self {
			DragGesture::DraggingNode { node } => Some(node),
			_ => None,
		};
		*self = DragGesture::Idle;
		dragged
	}
}
