//! Leptos component wrapping the network canvas.
//!
//! The component owns the browser side of the lifecycle: the canvas and its
//! 2D context, a `ResizeObserver` on the canvas container and the
//! `requestAnimationFrame` loop. Everything else goes through
//! [`NetworkHost`]. All three resources are released together on unmount.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, ResizeObserver, WheelEvent,
};

use super::caption::MeasureCache;
use super::graph::Vec2;
use super::hooks::OverlayHook;
use super::host::NetworkHost;
use super::info::{Details, InfoPanel, LegendEntry, Overview};
use super::render::{self, CanvasMeasure};
use super::theme::Theme;
use super::types::{GraphData, NetworkOptions};

type CanvasHost = NetworkHost<MeasureCache<CanvasMeasure>>;
type SharedContext = Rc<RefCell<Option<CanvasContext>>>;

/// Host plus the canvas it draws on.
struct CanvasContext {
	host: CanvasHost,
	ctx: CanvasRenderingContext2d,
	canvas: HtmlCanvasElement,
}

/// Coalescing `requestAnimationFrame` loop: at most one frame is pending.
#[derive(Clone, Default)]
struct FrameLoop {
	callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	handle: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
	fn request(&self) {
		if self.handle.get().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(ref cb) = *self.callback.borrow() {
			match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				Ok(id) => self.handle.set(Some(id)),
				Err(err) => warn!("network-viz: requestAnimationFrame failed: {err:?}"),
			}
		}
	}

	fn stop(&self) {
		if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		self.callback.borrow_mut().take();
	}
}

/// Renders an interactive network of labelled nodes and edges.
///
/// The canvas fills its container and follows its size. `data` replaces the
/// whole graph when it changes; `options` restyles and re-heats the current
/// one. `overlays` are extra drawing hooks run inside a failure boundary.
#[component]
pub fn NetworkCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] options: Signal<NetworkOptions>,
	#[prop(optional)] overlays: Vec<Box<dyn OverlayHook>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let panel = RwSignal::new(InfoPanel::default());
	let context: SharedContext = Rc::new(RefCell::new(None));
	let frames = FrameLoop::default();
	let observer: Rc<RefCell<Option<(ResizeObserver, Closure<dyn FnMut()>)>>> =
		Rc::new(RefCell::new(None));
	let overlays = RefCell::new(overlays);

	let (context_anim, frames_anim) = (context.clone(), frames.clone());
	*frames.callback.borrow_mut() = Some(Closure::new(move || {
		frames_anim.handle.set(None);
		let wants_more = {
			let mut guard = context_anim.borrow_mut();
			let Some(c) = guard.as_mut() else {
				return;
			};
			draw(c);
			sync_panel(&c.host, panel);
			c.host.wants_frame()
		};
		if wants_more {
			frames_anim.request();
		}
	}));

	let (context_data, frames_data, observer_data) =
		(context.clone(), frames.clone(), observer.clone());
	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		if context_data.borrow().is_none() {
			let Some(mut mounted) = mount(&canvas, options.get_untracked()) else {
				return;
			};
			for hook in overlays.take() {
				mounted.host.add_hook(hook);
			}
			*context_data.borrow_mut() = Some(mounted);
			*observer_data.borrow_mut() = observe_resize(&canvas, &context_data, &frames_data);
		}

		if let Some(c) = context_data.borrow_mut().as_mut() {
			c.host.set_graph(graph);
			let (width, height) = fit_canvas(&c.canvas);
			let _ = c.host.render(width, height);
			sync_panel(&c.host, panel);
		}
		frames_data.request();
	});

	let (context_opts, frames_opts) = (context.clone(), frames.clone());
	Effect::new(move |prev: Option<()>| {
		let next = options.get();
		if prev.is_none() {
			return;
		}
		if let Some(c) = context_opts.borrow_mut().as_mut() {
			c.host.set_options(next);
			sync_panel(&c.host, panel);
		}
		frames_opts.request();
	});

	let cleanup = SendWrapper::new({
		let (context, frames, observer) = (context.clone(), frames.clone(), observer.clone());
		move || {
			frames.stop();
			if let Some((observer, _callback)) = observer.borrow_mut().take() {
				observer.disconnect();
			}
			if let Some(mut c) = context.borrow_mut().take() {
				c.host.destroy();
			}
			debug!("network-viz: canvas unmounted");
		}
	});
	on_cleanup(move || cleanup.take()());

	let (context_md, frames_md) = (context.clone(), frames.clone());
	let on_mousedown = move |ev: MouseEvent| {
		with_host(&context_md, &frames_md, panel, &ev, |host, at| host.pointer_down(at));
	};

	let (context_mm, frames_mm) = (context.clone(), frames.clone());
	let on_mousemove = move |ev: MouseEvent| {
		with_host(&context_mm, &frames_mm, panel, &ev, |host, at| host.pointer_move(at));
	};

	let (context_mu, frames_mu) = (context.clone(), frames.clone());
	let on_mouseup = move |ev: MouseEvent| {
		with_host(&context_mu, &frames_mu, panel, &ev, |host, _| host.pointer_up());
	};

	let (context_ml, frames_ml) = (context.clone(), frames.clone());
	let on_mouseleave = move |ev: MouseEvent| {
		with_host(&context_ml, &frames_ml, panel, &ev, |host, _| host.pointer_leave());
	};

	let (context_wh, frames_wh) = (context, frames);
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let delta = ev.delta_y();
		with_host(&context_wh, &frames_wh, panel, &ev, |host, at| host.wheel(at, delta));
	};

	view! {
		<div class="network-viz">
			<div class="network-surface">
				<canvas
					node_ref=canvas_ref
					class="network-canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:wheel=on_wheel
					style="display: block; width: 100%; height: 100%; cursor: grab;"
				/>
			</div>
			<NetworkInfo panel=panel />
		</div>
	}
}

/// Info panel beside the canvas.
#[component]
fn NetworkInfo(panel: RwSignal<InfoPanel>) -> impl IntoView {
	view! {
		<aside class="network-info">
			{move || match panel.get() {
				InfoPanel::Overview(overview) => overview_view(overview).into_any(),
				InfoPanel::Details(details) => details_view(details).into_any(),
			}}
		</aside>
	}
}

fn overview_view(overview: Overview) -> impl IntoView {
	let summary = overview.summary();
	let legend = |entries: Vec<LegendEntry>| {
		entries
			.into_iter()
			.map(|entry| {
				view! {
					<span class="info-label" style=format!("background-color: {}", entry.color)>
						{format!("{} ({})", entry.label, entry.count)}
					</span>
				}
			})
			.collect_view()
	};
	view! {
		<div class="info-overview">
			<div class="info-legend info-legend-nodes">{legend(overview.node_labels)}</div>
			<div class="info-legend info-legend-edges">{legend(overview.edge_labels)}</div>
			<p class="info-summary">{summary}</p>
		</div>
	}
}

fn details_view(details: Details) -> impl IntoView {
	let header_style = format!("background-color: {}", details.header_color);
	let headers = details
		.labels
		.into_iter()
		.map(|label| view! { <span class="info-header" style=header_style.clone()>{label}</span> })
		.collect_view();
	let endpoints = details.endpoints.map(|(source, target)| {
		view! {
			{property("source".to_string(), source)}
			{property("target".to_string(), target)}
		}
	});
	let rows = details
		.properties
		.into_iter()
		.map(|row| property(row.key, row.value))
		.collect_view();
	view! {
		<div class="info-details">
			<div class="info-header-container">{headers}</div>
			<div class="info-body">
				{property("id".to_string(), details.id)}
				{endpoints}
				{rows}
			</div>
		</div>
	}
}

fn property(key: String, value: String) -> impl IntoView {
	view! {
		<div class="info-key-container">
			<div class="info-key-header">{key}</div>
			<div class="info-key-body">{value}</div>
		</div>
	}
}

/// Creates the host for a freshly mounted canvas.
fn mount(canvas: &HtmlCanvasElement, options: NetworkOptions) -> Option<CanvasContext> {
	let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
		Ok(Some(obj)) => obj.dyn_into().ok()?,
		_ => {
			warn!("network-viz: canvas has no 2d context");
			return None;
		}
	};
	let measure = MeasureCache::new(CanvasMeasure::new(ctx.clone()));
	let host = NetworkHost::new(options, Theme::default(), measure, js_sys::Date::now);
	Some(CanvasContext {
		host,
		ctx,
		canvas: canvas.clone(),
	})
}

/// Watches the canvas container and forwards its size to the host.
fn observe_resize(
	canvas: &HtmlCanvasElement,
	context: &SharedContext,
	frames: &FrameLoop,
) -> Option<(ResizeObserver, Closure<dyn FnMut()>)> {
	let container = canvas.parent_element()?;
	let (context, frames) = (context.clone(), frames.clone());
	let callback: Closure<dyn FnMut()> = Closure::new(move || {
		if let Some(c) = context.borrow_mut().as_mut() {
			let (width, height) = fit_canvas(&c.canvas);
			if c.host.resize(width, height).is_ok() {
				frames.request();
			}
		}
	});
	let observer = match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
		Ok(observer) => observer,
		Err(err) => {
			warn!("network-viz: ResizeObserver unavailable: {err:?}");
			return None;
		}
	};
	observer.observe(&container);
	Some((observer, callback))
}

/// Matches the canvas backing store to its container and returns the size.
fn fit_canvas(canvas: &HtmlCanvasElement) -> (f64, f64) {
	let (width, height) = canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((0.0, 0.0));
	if width > 0.0 && height > 0.0 {
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);
	}
	(width, height)
}

fn draw(c: &mut CanvasContext) {
	if !c.host.frame() {
		return;
	}
	let overlays = c.host.overlays();
	if let (Some(session), Some((width, height))) = (c.host.session(), c.host.surface()) {
		render::render(&c.ctx, session, c.host.theme(), &overlays, width, height);
	}
}

fn sync_panel(host: &CanvasHost, panel: RwSignal<InfoPanel>) {
	let next = host.panel();
	if panel.with_untracked(|current| current != &next) {
		panel.set(next);
	}
}

fn with_host(
	context: &SharedContext,
	frames: &FrameLoop,
	panel: RwSignal<InfoPanel>,
	ev: &MouseEvent,
	f: impl FnOnce(&mut CanvasHost, Vec2),
) {
	let wants_frame = {
		let mut guard = context.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		let rect = c.canvas.get_bounding_client_rect();
		let at = Vec2::new(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		f(&mut c.host, at);
		sync_panel(&c.host, panel);
		c.host.wants_frame()
	};
	if wants_frame {
		frames.request();
	}
}
