//! Shared harness: a session wired to a bridge that records every call.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use force_graph_editor::editor::{
	EditorSession, Entity, GraphModel, InputEvent, KindRegistry, Modifiers, NodeId, NodeSpec, Position,
	PositionMap, RenderBridge, SessionConfig,
};

/// One call received by the bridge.
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeCall {
	Redraw(usize),
	ShowPopover {
		entity: Entity,
		title: String,
		body: String,
	},
	HidePopover(Entity),
	ShowDragLine(Position, Position),
	HideDragLine,
}

#[derive(Clone, Default)]
pub struct RecordingBridge {
	calls: Rc<RefCell<Vec<BridgeCall>>>,
}

impl RenderBridge for RecordingBridge {
	fn request_redraw(&mut self, positions: &PositionMap) {
		self.calls.borrow_mut().push(BridgeCall::Redraw(positions.len()));
	}

	fn show_popover(&mut self, entity: Entity, title: &str, body_html: &str) {
		self.calls.borrow_mut().push(BridgeCall::ShowPopover {
			entity,
			title: title.to_string(),
			body: body_html.to_string(),
		});
	}

	fn hide_popover(&mut self, entity: Entity) {
		self.calls.borrow_mut().push(BridgeCall::HidePopover(entity));
	}

	fn show_drag_line(&mut self, from: Position, to: Position) {
		self.calls.borrow_mut().push(BridgeCall::ShowDragLine(from, to));
	}

	fn hide_drag_line(&mut self) {
		self.calls.borrow_mut().push(BridgeCall::HideDragLine);
	}
}

pub struct EditorHarness {
	pub session: EditorSession,
	calls: Rc<RefCell<Vec<BridgeCall>>>,
}

impl EditorHarness {
	pub fn new() -> Self {
		let bridge = RecordingBridge::default();
		let calls = bridge.calls.clone();
		let session = EditorSession::create(
			SessionConfig::default(),
			KindRegistry::with_builtin_kinds(),
			bridge,
		);
		Self { session, calls }
	}

	/// Add a plain node at a fixed spot.
	pub fn node(&mut self, name: &str, x: f64, y: f64) -> NodeId {
		self.session
			.add_node("Node", NodeSpec::new(name).at(Position::new(x, y)))
			.unwrap()
	}

	/// Drain the recorded bridge calls.
	pub fn take_calls(&self) -> Vec<BridgeCall> {
		std::mem::take(&mut *self.calls.borrow_mut())
	}

	/// Recorded calls other than redraws.
	pub fn take_presentation_calls(&self) -> Vec<BridgeCall> {
		self.take_calls()
			.into_iter()
			.filter(|call| !matches!(call, BridgeCall::Redraw(_)))
			.collect()
	}

	pub fn press(&mut self, target: Option<NodeId>, x: f64, y: f64, modifiers: Modifiers) {
		self.session.handle_input(InputEvent::PointerDown {
			target,
			at: Position::new(x, y),
			modifiers,
		});
	}

	pub fn move_to(&mut self, x: f64, y: f64) {
		self.session.handle_input(InputEvent::PointerMove {
			at: Position::new(x, y),
		});
	}

	pub fn release(&mut self, target: Option<NodeId>) {
		self.session.handle_input(InputEvent::PointerUp { target });
	}

	pub fn click(&mut self, target: Option<Entity>) {
		self.session.handle_input(InputEvent::Click { target });
	}

	pub fn position(&self, id: NodeId) -> Position {
		self.session.model().node(id).unwrap().position()
	}

	/// Dispose the session, returning the model and the calls it made on the way out.
	pub fn dispose(self) -> (GraphModel, Vec<BridgeCall>) {
		let model = self.session.dispose();
		let calls = std::mem::take(&mut *self.calls.borrow_mut());
		(model, calls)
	}
}
