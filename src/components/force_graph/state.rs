use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;

use crate::editor::{
	EditorSession, Entity, KindRegistry, LayoutParams, Position, PositionMap, RenderBridge,
	SessionConfig,
};

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Popover currently shown next to the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct PopoverView {
	pub entity: Entity,
	pub title: String,
	pub body: String,
}

/// Canvas-side leftovers of bridge calls, read by the renderer.
#[derive(Clone, Debug, Default)]
pub struct Overlay {
	pub drag_line: Option<(Position, Position)>,
}

/// Bridge from the editing core to the canvas and the popover signal.
pub struct CanvasBridge {
	overlay: Rc<RefCell<Overlay>>,
	popover: RwSignal<Option<PopoverView>>,
}

impl RenderBridge for CanvasBridge {
	// the animation frame loop repaints from the model every frame
	fn request_redraw(&mut self, _: &PositionMap) {}

	fn show_popover(&mut self, entity: Entity, title: &str, body_html: &str) {
		self.popover.set(Some(PopoverView {
			entity,
			title: title.to_string(),
			body: body_html.to_string(),
		}));
	}

	fn hide_popover(&mut self, entity: Entity) {
		if self
			.popover
			.get_untracked()
			.is_some_and(|open| open.entity == entity)
		{
			self.popover.set(None);
		}
	}

	fn show_drag_line(&mut self, from: Position, to: Position) {
		self.overlay.borrow_mut().drag_line = Some((from, to));
	}

	fn hide_drag_line(&mut self) {
		self.overlay.borrow_mut().drag_line = None;
	}
}

pub struct ForceGraphState {
	pub session: EditorSession,
	pub overlay: Rc<RefCell<Overlay>>,
	pub transform: ViewTransform,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64, popover: RwSignal<Option<PopoverView>>) -> Self {
		let overlay = Rc::new(RefCell::new(Overlay::default()));
		let config = SessionConfig {
			layout: LayoutParams {
				width,
				height,
				..Default::default()
			},
			..Default::default()
		};
		let bridge = CanvasBridge {
			overlay: overlay.clone(),
			popover,
		};
		Self {
			session: EditorSession::create(config, KindRegistry::with_builtin_kinds(), bridge),
			overlay,
			transform: ViewTransform {
				x: 0.0,
				y: 0.0,
				k: 1.0,
			},
			pan: PanState::default(),
			width,
			height,
			animation_running: true,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Position {
		Position::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn tick(&mut self) {
		self.session.tick();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.session.resize(width, height);
	}
}
