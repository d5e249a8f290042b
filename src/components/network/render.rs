//! Canvas rendering of a [`Scene`].
//!
//! Draw order, back to front:
//! 1. Background (screen space)
//! 2. Edge paths with arrowheads, then hover/selection overlays (world space)
//! 3. Edge captions over a background box
//! 4. Node circles, highlight rings and captions
//! 5. Overlay hook output

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::caption::{CAPTION_FONT_SIZE, Font, TextMeasure};
use super::hooks::OverlayOp;
use super::host::Session;
use super::interaction::{Emphasis, Interaction, Target};
use super::scene::{EdgeShape, NodeShape};
use super::theme::Theme;

/// Measures text with the canvas' own font metrics.
pub struct CanvasMeasure {
	ctx: CanvasRenderingContext2d,
}

impl CanvasMeasure {
	pub fn new(ctx: CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}
}

impl TextMeasure for CanvasMeasure {
	fn measure(&mut self, text: &str, font: &Font) -> f64 {
		self.ctx.set_font(&font.css());
		self.ctx
			.measure_text(text)
			.map(|metrics| metrics.width())
			.unwrap_or_else(|_| text.chars().count() as f64 * font.size * 0.6)
	}
}

/// Renders one frame. `width`/`height` are the surface size in pixels.
pub fn render(
	ctx: &CanvasRenderingContext2d,
	session: &Session,
	theme: &Theme,
	overlays: &[OverlayOp],
	width: f64,
	height: f64,
) {
	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, width, height);

	let interaction = session.interaction();
	let view = interaction.view();
	ctx.save();
	let _ = ctx.translate(view.x, view.y);
	let _ = ctx.scale(view.k, view.k);

	let scene = session.scene();
	for edge in scene.edges.iter().filter(|e| e.visible) {
		draw_edge(ctx, edge);
	}
	for edge in scene.edges.iter().filter(|e| e.visible) {
		draw_edge_overlay(ctx, edge, interaction, theme);
	}
	let caption_font = Font::new(theme.font_family, theme.edge.caption_size);
	ctx.set_font(&caption_font.css());
	for edge in scene.edges.iter().filter(|e| e.visible && !e.label.is_empty()) {
		draw_edge_caption(ctx, edge, theme);
	}

	let node_font = Font::new(theme.font_family, CAPTION_FONT_SIZE);
	ctx.set_font(&node_font.css());
	for node in &scene.nodes {
		draw_node(ctx, node, interaction, theme);
	}

	draw_overlays(ctx, overlays, theme);
	ctx.restore();
}

fn draw_edge(ctx: &CanvasRenderingContext2d, edge: &EdgeShape) {
	ctx.set_stroke_style_str(&edge.color);
	ctx.set_line_width(edge.stroke_width);
	ctx.begin_path();
	ctx.move_to(edge.start.x, edge.start.y);
	ctx.line_to(edge.end.x, edge.end.y);
	ctx.stroke();

	let [tip, left, right] = edge.arrow;
	ctx.set_fill_style_str(&edge.color);
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(left.x, left.y);
	ctx.line_to(right.x, right.y);
	ctx.close_path();
	ctx.fill();
}

fn draw_edge_overlay(
	ctx: &CanvasRenderingContext2d,
	edge: &EdgeShape,
	interaction: &Interaction,
	theme: &Theme,
) {
	let opacity = match interaction.emphasis(Target::Edge(edge.edge)) {
		Emphasis::None => return,
		Emphasis::Hovered => theme.edge.hover_opacity,
		Emphasis::Selected => theme.edge.selected_opacity,
	};
	ctx.set_stroke_style_str(&theme.edge.overlay_color.with_alpha(opacity).to_css());
	ctx.set_line_width(edge.hit_width);
	ctx.set_line_cap("round");
	ctx.begin_path();
	ctx.move_to(edge.start.x, edge.start.y);
	ctx.line_to(edge.arrow[0].x, edge.arrow[0].y);
	ctx.stroke();
	ctx.set_line_cap("butt");
}

fn draw_edge_caption(ctx: &CanvasRenderingContext2d, edge: &EdgeShape, theme: &Theme) {
	let text_width = ctx
		.measure_text(&edge.label)
		.map(|metrics| metrics.width())
		.unwrap_or(0.0);
	let size = theme.edge.caption_size;

	ctx.save();
	let _ = ctx.translate(edge.midpoint.x, edge.midpoint.y);
	let _ = ctx.rotate(edge.angle);
	ctx.set_fill_style_str(&theme.edge.caption_background.to_css());
	ctx.fill_rect(-text_width / 2.0 - 1.0, -size / 2.0 - 1.0, text_width + 2.0, size + 2.0);
	ctx.set_fill_style_str(&theme.edge.caption_color.to_css());
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(&edge.label, 0.0, 0.0);
	ctx.restore();
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &NodeShape,
	interaction: &Interaction,
	theme: &Theme,
) {
	let (x, y) = (node.center.x, node.center.y);

	ctx.set_fill_style_str(&node.color);
	ctx.begin_path();
	let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
	ctx.fill();

	let ring = match interaction.emphasis(Target::Node(node.node)) {
		Emphasis::None => None,
		Emphasis::Hovered => Some(theme.node.hover_opacity),
		Emphasis::Selected => Some(theme.node.selected_opacity),
	};
	if let Some(opacity) = ring {
		ctx.set_stroke_style_str(&theme.node.ring_color.with_alpha(opacity).to_css());
		ctx.set_line_width(theme.node.ring_width);
		ctx.begin_path();
		let _ = ctx.arc(x, y, node.ring_radius + theme.node.ring_width / 2.0, 0.0, 2.0 * PI);
		ctx.stroke();
	}

	if node.caption.is_empty() {
		return;
	}
	ctx.set_fill_style_str(&node.caption_color);
	ctx.set_text_align("center");
	ctx.set_text_baseline("alphabetic");
	for line in &node.caption {
		let _ = ctx.fill_text(&line.text, x, y + line.baseline);
	}
}

fn draw_overlays(ctx: &CanvasRenderingContext2d, overlays: &[OverlayOp], theme: &Theme) {
	for op in overlays {
		match op {
			OverlayOp::Circle { center, radius, color } => {
				ctx.set_fill_style_str(color);
				ctx.begin_path();
				let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
				ctx.fill();
			}
			OverlayOp::Line { from, to, color, width } => {
				ctx.set_stroke_style_str(color);
				ctx.set_line_width(*width);
				ctx.begin_path();
				ctx.move_to(from.x, from.y);
				ctx.line_to(to.x, to.y);
				ctx.stroke();
			}
			OverlayOp::Text { text, at, color } => {
				ctx.set_font(&Font::new(theme.font_family, theme.edge.caption_size).css());
				ctx.set_fill_style_str(color);
				ctx.set_text_align("left");
				ctx.set_text_baseline("alphabetic");
				let _ = ctx.fill_text(text, at.x, at.y);
			}
		}
	}
}
