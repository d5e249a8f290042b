//! Colors and canvas theme for the network view.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Parses a CSS color string.
	/// Supports hex (`#RGB`, `#RRGGBB`) and `rgb()`/`rgba()` functional notation.
	pub fn parse(color_str: &str) -> Option<Self> {
		let s = color_str.trim();
		if let Some(hex) = s.strip_prefix('#') {
			let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
			return match hex.len() {
				6 => Some(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
				3 => {
					let short = |i: usize| channel(i..i + 1).map(|v| v * 17);
					Some(Color::rgb(short(0)?, short(1)?, short(2)?))
				}
				_ => None,
			};
		}
		if s.starts_with("rgb") {
			let nums: Vec<&str> = s
				.trim_start_matches("rgba(")
				.trim_start_matches("rgb(")
				.trim_end_matches(')')
				.split(',')
				.collect();
			let r = nums.first()?.trim().parse().ok()?;
			let g = nums.get(1)?.trim().parse().ok()?;
			let b = nums.get(2)?.trim().parse().ok()?;
			let a = nums
				.get(3)
				.and_then(|s| s.trim().parse().ok())
				.unwrap_or(1.0);
			return Some(Color::rgba(r, g, b, a));
		}
		None
	}

	/// Relative luminance in `[0, 1]` (sRGB weights, no gamma correction).
	pub fn luminance(self) -> f64 {
		(0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64) / 255.0
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	pub fn to_css_rgb(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

/// Edge visual style.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	/// Caption text color.
	pub caption_color: Color,
	/// Fill behind the rotated caption so it stays legible over the path.
	pub caption_background: Color,
	/// Caption font size in world units.
	pub caption_size: f64,
	/// Color of the invisible hit/highlight overlay.
	pub overlay_color: Color,
	/// Overlay opacity while hovered.
	pub hover_opacity: f64,
	/// Overlay opacity while selected.
	pub selected_opacity: f64,
}

/// Node visual style.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Caption color over dark fills.
	pub caption_light: Color,
	/// Caption color over light fills.
	pub caption_dark: Color,
	/// Ring stroke color.
	pub ring_color: Color,
	/// Ring stroke width in world units.
	pub ring_width: f64,
	/// Ring opacity while hovered.
	pub hover_opacity: f64,
	/// Ring opacity while selected.
	pub selected_opacity: f64,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Value of the document's `data-theme` attribute.
	pub name: &'static str,
	/// Canvas fill behind everything else.
	pub background: Color,
	/// Edge captions and highlight overlays.
	pub edge: EdgeStyle,
	/// Node captions and highlight rings.
	pub node: NodeStyle,
	/// Font family shared by node and edge captions.
	pub font_family: &'static str,
}

impl Theme {
	/// Light theme matching the dashboard's default look.
	pub fn light() -> Self {
		Self {
			name: "light",
			background: Color::rgb(255, 255, 255),
			edge: EdgeStyle {
				caption_color: Color::rgb(33, 37, 41),
				caption_background: Color::rgb(255, 255, 255),
				caption_size: 6.0,
				overlay_color: Color::rgb(104, 189, 246),
				hover_opacity: 0.3,
				selected_opacity: 0.6,
			},
			node: NodeStyle {
				caption_light: Color::rgb(255, 255, 255),
				caption_dark: Color::rgb(33, 37, 41),
				ring_color: Color::rgb(104, 189, 246),
				ring_width: 8.0,
				hover_opacity: 0.3,
				selected_opacity: 0.75,
			},
			font_family: "sans-serif",
		}
	}

	/// Picks a caption color that reads well over `fill`.
	pub fn caption_color_for(&self, fill: &str) -> Color {
		match Color::parse(fill) {
			Some(color) if color.luminance() > 0.6 => self.node.caption_dark,
			_ => self.node.caption_light,
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::light()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_and_functional_notation() {
		assert_eq!(Color::parse("#a5abb6"), Some(Color::rgb(0xa5, 0xab, 0xb6)));
		assert_eq!(Color::parse("#fff"), Some(Color::rgb(255, 255, 255)));
		assert_eq!(
			Color::parse("rgba(10, 20, 30, 0.5)"),
			Some(Color::rgba(10, 20, 30, 0.5))
		);
		assert_eq!(Color::parse("tomato"), None);
		assert_eq!(Color::parse("#12"), None);
	}

	#[test]
	fn caption_contrasts_with_fill() {
		let theme = Theme::default();
		assert_eq!(theme.caption_color_for("#ffffff"), theme.node.caption_dark);
		assert_eq!(theme.caption_color_for("#002fb4"), theme.node.caption_light);
		assert_eq!(theme.caption_color_for("not-a-color"), theme.node.caption_light);
	}

	#[test]
	fn css_output_drops_alpha_when_opaque() {
		assert_eq!(Color::rgb(1, 2, 3).to_css(), "#010203");
		assert_eq!(Color::rgb(1, 2, 3).with_alpha(0.5).to_css(), "rgba(1, 2, 3, 0.5)");
	}
}
