//! network-viz: interactive network visualization of query results.
//!
//! This crate provides a WASM-based component that renders labelled nodes and
//! relationships with a force-directed layout, captions fitted inside nodes,
//! pan/zoom, selection and an info panel.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::network::{GraphData, NetworkCanvas, NetworkOptions, Theme};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("network-viz: logging initialized");
}

/// Reads and parses the JSON body of the `<script>` element with id `id`.
fn load_json<T: DeserializeOwned>(id: &str) -> Option<T> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<T>(&json_text) {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("network-viz: failed to parse #{}: {}", id, e);
			None
		}
	}
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], links: [...] }
fn load_graph_data() -> Option<GraphData> {
	let data = load_json::<GraphData>("graph-data")?;
	info!(
		"network-viz: read {} nodes, {} links",
		data.nodes.len(),
		data.links.len()
	);
	Some(data)
}

/// Load visualization options from a script element with id="graph-options".
fn load_options() -> Option<NetworkOptions> {
	load_json("graph-options")
}

/// Main application component.
/// Loads graph data and options from the DOM and renders the network.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let graph_signal = Signal::derive(move || graph_data.clone());
	let options = load_options().unwrap_or_default();
	let options_signal = Signal::derive(move || options.clone());
	let theme = Theme::default();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=theme.name />
		<Title text="Network Visualization" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-network">
			<NetworkCanvas data=graph_signal options=options_signal />
			<div class="network-overlay">
				<p class="subtitle">"Click a node or relationship for details. Drag nodes to reposition. Scroll to zoom. Drag background to pan."</p>
			</div>
		</div>
	}
}
