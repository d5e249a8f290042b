//! Interactive network (node-link) visualization.
//!
//! Renders labelled nodes and directed, labelled edges on a canvas with:
//! - Per-label styling with documented fallbacks
//! - Captions word-wrapped to fit inside each node
//! - An alpha-cooled force layout that pre-settles before the first paint
//! - Hover, click-to-select, node dragging, pan and zoom
//! - An info panel describing the graph or the focused node/edge
//!
//! # Example
//!
//! ```ignore
//! use network_viz::{GraphData, NetworkCanvas, NetworkOptions};
//!
//! let data: GraphData = serde_json::from_str(r#"{
//!     "nodes": [{"id": "n1", "label__": "Person", "name": "Ada"}],
//!     "links": []
//! }"#)?;
//!
//! view! { <NetworkCanvas data=data options=NetworkOptions::default() /> }
//! ```

mod caption;
mod component;
mod forces;
mod graph;
mod hooks;
mod host;
mod info;
mod interaction;
mod render;
mod scene;
mod simulation;
mod style;
mod theme;
mod types;

pub use component::NetworkCanvas;
pub use graph::Vec2;
pub use hooks::{HookContext, Overlay, OverlayHook};
pub use theme::Theme;
pub use types::{EdgeRecord, GraphData, NetworkOptions, NodeRecord, ObjectStyle, ObjectStyleConfig};
