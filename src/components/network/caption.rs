//! Fits a node caption inside the node's circle.
//!
//! The caption is word-wrapped over horizontal bands stacked around the
//! circle's centre. Each band is as wide as the circle's chord at the band
//! edge furthest from the centre, so text never pokes out of the node. The
//! fitter tries one band, then two, and so on, keeping the candidate that
//! places the most words with no empty band. When greedy packing starves the
//! last bands, the words are re-split over the same bands before more lines
//! are tried. Whatever does not fit is cut with an ellipsis.
//!
//! Width measurement is injected through [`TextMeasure`] so fitting works the
//! same against a canvas context or a fixed-width stub in tests.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde_json::Value;

use super::graph::GraphNode;

/// Caption font size in world units.
pub const CAPTION_FONT_SIZE: f64 = 6.0;
const ELLIPSIS: char = '\u{2026}';
const MEASURE_CACHE_SIZE: usize = 100_000;

/// Font used for captions.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
	pub family: String,
	pub size: f64,
}

impl Font {
	pub fn new(family: impl Into<String>, size: f64) -> Self {
		Self {
			family: family.into(),
			size,
		}
	}

	/// CSS shorthand accepted by `CanvasRenderingContext2d::set_font`.
	pub fn css(&self) -> String {
		format!("normal normal normal {}px/normal {}", self.size, self.family)
	}
}

impl Default for Font {
	fn default() -> Self {
		Self::new("sans-serif", CAPTION_FONT_SIZE)
	}
}

/// Measures rendered text width.
pub trait TextMeasure {
	fn measure(&mut self, text: &str, font: &Font) -> f64;
}

impl<F: FnMut(&str, &Font) -> f64> TextMeasure for F {
	fn measure(&mut self, text: &str, font: &Font) -> f64 {
		self(text, font)
	}
}

/// Memoizes another [`TextMeasure`].
///
/// The cache is bounded; once full it is cleared wholesale rather than
/// evicting entry by entry.
pub struct MeasureCache<M> {
	inner: M,
	widths: HashMap<(String, String), f64>,
}

impl<M: TextMeasure> MeasureCache<M> {
	pub fn new(inner: M) -> Self {
		Self {
			inner,
			widths: HashMap::new(),
		}
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.widths.len()
	}
}

impl<M: TextMeasure> TextMeasure for MeasureCache<M> {
	fn measure(&mut self, text: &str, font: &Font) -> f64 {
		let key = (font.css(), text.to_string());
		if let Some(&width) = self.widths.get(&key) {
			return width;
		}
		let width = self.inner.measure(text, font);
		if self.widths.len() >= MEASURE_CACHE_SIZE {
			self.widths.clear();
		}
		self.widths.insert(key, width);
		width
	}
}

/// One line of a fitted caption.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLine {
	pub text: String,
	/// Baseline offset from the node centre, positive downwards.
	pub baseline: f64,
}

/// Baseline of line `index` out of `line_count`, relative to the centre.
fn baseline(font_size: f64, line_count: usize, index: usize) -> f64 {
	(1.0 + index as f64 - line_count as f64 / 2.0) * font_size
}

/// Chord width available to line `index` out of `line_count`.
///
/// A line occupies `[baseline - font_size, baseline]`; the chord is taken at
/// whichever edge lies further from the centre.
pub fn band_width(radius: f64, font_size: f64, line_count: usize, index: usize) -> f64 {
	let bottom = baseline(font_size, line_count, index);
	let top = bottom - font_size;
	let d = bottom.abs().max(top.abs());
	if d >= radius {
		0.0
	} else {
		2.0 * (radius * radius - d * d).sqrt()
	}
}

/// Rough upper bound on how many characters can fit in the circle.
pub fn max_caption_length(radius: f64, font_size: f64) -> usize {
	((radius * radius * PI) / (font_size * font_size)).floor().max(0.0) as usize
}

struct Band {
	words: Vec<usize>,
	width: f64,
}

struct Candidate {
	bands: Vec<Band>,
	consumed: usize,
}

impl Candidate {
	fn has_empty_band(&self) -> bool {
		self.bands.iter().any(|band| band.words.is_empty())
	}
}

/// Greedy first-fit: each band takes words until the next one overflows it.
fn pack(radius: f64, font_size: f64, line_count: usize, widths: &[f64], space: f64) -> Candidate {
	let mut next = 0;
	let mut bands = Vec::with_capacity(line_count);
	for index in 0..line_count {
		let width = band_width(radius, font_size, line_count, index);
		let mut remaining = width;
		let mut words = Vec::new();
		while next < widths.len() && widths[next] < remaining - space {
			remaining -= widths[next] + space;
			words.push(next);
			next += 1;
		}
		bands.push(Band { words, width });
	}
	Candidate {
		bands,
		consumed: next,
	}
}

/// Splits every word over `line_count` bands, none of them empty.
///
/// Greedy packing can crowd the words into the first bands and starve the
/// last one. This searches all in-order splits instead, so whenever a split
/// exists at some radius it also exists at every larger radius.
fn spread(radius: f64, font_size: f64, line_count: usize, widths: &[f64], space: f64) -> Option<Candidate> {
	let n = widths.len();
	if n < line_count {
		return None;
	}
	let band_widths: Vec<f64> = (0..line_count)
		.map(|index| band_width(radius, font_size, line_count, index))
		.collect();
	// offsets[j]: room taken by the first j words, one space each.
	let mut offsets = Vec::with_capacity(n + 1);
	let mut total = 0.0;
	offsets.push(total);
	for width in widths {
		total += width + space;
		offsets.push(total);
	}
	if total >= band_widths.iter().sum::<f64>() {
		return None;
	}
	let fits = |band: usize, start: usize, end: usize| offsets[end] - offsets[start] < band_widths[band];

	// reachable[b][j]: the first j words fill the first b bands.
	let mut reachable = vec![vec![false; n + 1]; line_count + 1];
	reachable[0][0] = true;
	for band in 0..line_count {
		for start in 0..n {
			if !reachable[band][start] {
				continue;
			}
			for end in start + 1..=n {
				if !fits(band, start, end) {
					break;
				}
				reachable[band + 1][end] = true;
			}
		}
	}
	if !reachable[line_count][n] {
		return None;
	}

	let mut bands = Vec::with_capacity(line_count);
	let mut end = n;
	for band in (0..line_count).rev() {
		let start = (0..end)
			.rev()
			.find(|&start| reachable[band][start] && fits(band, start, end))?;
		bands.push(Band {
			words: (start..end).collect(),
			width: band_widths[band],
		});
		end = start;
	}
	bands.reverse();
	Some(Candidate { bands, consumed: n })
}

/// Ends a line with an ellipsis while keeping it within `width`.
///
/// The last word loses trailing characters first. If not even the bare
/// glyph fits after it, the word is dropped and the one before is trimmed.
fn ellipsize(words: &[&str], width: f64, font: &Font, measure: &mut impl TextMeasure) -> Option<String> {
	for end in (1..=words.len()).rev() {
		let prefix = words[..end - 1].join(" ");
		let chars: Vec<char> = words[end - 1].chars().collect();
		for keep in (0..=chars.len().saturating_sub(2)).rev() {
			let mut tail: String = chars[..keep].iter().collect();
			tail.push(ELLIPSIS);
			let line = if prefix.is_empty() {
				tail
			} else {
				format!("{prefix} {tail}")
			};
			if measure.measure(&line, font) <= width {
				return Some(line);
			}
		}
	}
	None
}

/// Lays `text` out inside a circle of `radius`.
///
/// Returns no lines for empty text or a degenerate circle.
pub fn fit(radius: f64, text: &str, font: &Font, measure: &mut impl TextMeasure) -> Vec<CaptionLine> {
	let font_size = font.size;
	if !(radius > 0.0) || !(font_size > 0.0) {
		return Vec::new();
	}

	let budget = max_caption_length(radius, font_size);
	let truncated: String = text.chars().take(budget).collect();
	let words: Vec<&str> = truncated.split_whitespace().collect();
	if words.is_empty() {
		return Vec::new();
	}

	let widths: Vec<f64> = words.iter().map(|w| measure.measure(w, font)).collect();
	let space = measure.measure(" ", font);
	let max_lines = ((2.0 * radius) / font_size).ceil().max(1.0) as usize;

	let mut best: Option<Candidate> = None;
	for line_count in 1..=max_lines {
		let mut candidate = pack(radius, font_size, line_count, &widths, space);
		if candidate.has_empty_band() || candidate.consumed < words.len() {
			if let Some(split) = spread(radius, font_size, line_count, &widths, space) {
				candidate = split;
			}
		}
		let improves = best
			.as_ref()
			.is_none_or(|b| candidate.consumed > b.consumed);
		if !candidate.has_empty_band() && improves {
			best = Some(candidate);
		}
		if best.as_ref().is_some_and(|b| b.consumed >= words.len()) {
			break;
		}
	}

	let Some(best) = best else {
		// Not even the first word fits on one line: show what we can of it.
		return ellipsize(&words[..1], band_width(radius, font_size, 1, 0), font, measure)
			.map(|text| {
				vec![CaptionLine {
					text,
					baseline: baseline(font_size, 1, 0),
				}]
			})
			.unwrap_or_default();
	};

	let line_count = best.bands.len();
	let mut lines: Vec<CaptionLine> = best
		.bands
		.iter()
		.enumerate()
		.map(|(index, band)| CaptionLine {
			text: band.words.iter().map(|&i| words[i]).collect::<Vec<_>>().join(" "),
			baseline: baseline(font_size, line_count, index),
		})
		.collect();

	if best.consumed < words.len() {
		if let (Some(band), Some(line)) = (best.bands.last(), lines.last_mut()) {
			let band_words: Vec<&str> = band.words.iter().map(|&i| words[i]).collect();
			// Too narrow for any ellipsis: the packed line stays as it is.
			if let Some(text) = ellipsize(&band_words, band.width, font, measure) {
				line.text = text;
			}
		}
	}

	lines
}

/// Caption text for a node: the value of its caption property, if any.
pub fn caption_text(node: &GraphNode) -> String {
	let Some(key) = node.caption_key.as_deref() else {
		return String::new();
	};
	match node.properties.get(key) {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(s)) => s.clone(),
		Some(other) => other.to_string(),
	}
}

/// Fits a node's caption using its resolved radius and caption property.
pub fn fit_node(node: &GraphNode, font: &Font, measure: &mut impl TextMeasure) -> Vec<CaptionLine> {
	fit(node.radius, &caption_text(node), font, measure)
}
