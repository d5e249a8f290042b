//! Force kernels for the layout engine.
//!
//! Each kernel adds its contribution to node velocities for one tick; the
//! integrator in [`super::simulation`] then applies friction and moves nodes.
//! Positions are only read here, never written.

use std::f64::consts::TAU;

use super::graph::{GraphNode, Vec2};

/// Squared distance below which repulsion stops growing.
const REPULSION_DISTANCE_MIN_SQ: f64 = 1.0;

/// Tiny deterministic nudge for coincident points.
fn jiggle(i: usize, j: usize) -> Vec2 {
	let angle = ((i as f64) * 0.618_034 + (j as f64) * 0.414_214 + 0.37) * TAU;
	Vec2::new(angle.cos(), angle.sin()) * 1e-6
}

/// Spring parameters for one edge, precomputed from styles and degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkForce {
	pub source: usize,
	pub target: usize,
	/// Rest length.
	pub distance: f64,
	pub strength: f64,
	/// Share of the correction applied to the target; the source gets the rest.
	pub bias: f64,
}

/// Pulls or pushes each link's endpoints towards its rest length.
pub fn apply_links(nodes: &mut [GraphNode], links: &[LinkForce], alpha: f64) {
	for link in links {
		if link.source == link.target {
			continue;
		}
		let source = &nodes[link.source];
		let target = &nodes[link.target];
		let mut delta = (target.position + target.velocity) - (source.position + source.velocity);
		if delta.length_sq() == 0.0 {
			delta = jiggle(link.source, link.target);
		}
		let length = delta.length();
		let correction = delta * ((length - link.distance) / length * alpha * link.strength);
		nodes[link.target].velocity -= correction * link.bias;
		nodes[link.source].velocity += correction * (1.0 - link.bias);
	}
}

/// All-pairs many-body force. Negative `strength` repels.
pub fn apply_repulsion(nodes: &mut [GraphNode], strength: f64, alpha: f64) {
	let count = nodes.len();
	for i in 0..count {
		let position = nodes[i].position;
		let mut push = Vec2::ZERO;
		for (j, other) in nodes.iter().enumerate() {
			if i == j {
				continue;
			}
			let mut delta = other.position - position;
			let mut distance_sq = delta.length_sq();
			if distance_sq == 0.0 {
				delta = jiggle(i, j);
				distance_sq = delta.length_sq();
			}
			if distance_sq < REPULSION_DISTANCE_MIN_SQ {
				distance_sq = (REPULSION_DISTANCE_MIN_SQ * distance_sq).sqrt();
			}
			push += delta * (strength * alpha / distance_sq);
		}
		nodes[i].velocity += push;
	}
}

/// Weak spring towards the world origin, per axis.
pub fn apply_centering(nodes: &mut [GraphNode], strength_x: f64, strength_y: f64, alpha: f64) {
	for node in nodes {
		node.velocity.x -= node.position.x * strength_x * alpha;
		node.velocity.y -= node.position.y * strength_y * alpha;
	}
}

/// Separates nodes whose inflated circles overlap.
///
/// Uses each node's predicted position (`position + velocity`) and splits
/// the correction by relative size so small nodes move more.
pub fn apply_collision(nodes: &mut [GraphNode], radii: &[f64]) {
	let count = nodes.len();
	for i in 0..count {
		let predicted = nodes[i].position + nodes[i].velocity;
		let ri = radii[i];
		for j in (i + 1)..count {
			let rj = radii[j];
			let reach = ri + rj;
			let mut delta = predicted - (nodes[j].position + nodes[j].velocity);
			let mut distance_sq = delta.length_sq();
			if distance_sq >= reach * reach {
				continue;
			}
			if distance_sq == 0.0 {
				delta = jiggle(i, j);
				distance_sq = delta.length_sq();
			}
			let distance = distance_sq.sqrt();
			let push = delta * ((reach - distance) / distance);
			let share = (rj * rj) / (ri * ri + rj * rj);
			nodes[i].velocity += push * share;
			nodes[j].velocity -= push * (1.0 - share);
		}
	}
}
