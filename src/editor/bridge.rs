//! The seam between the editing core and whatever draws it.

use super::types::{Entity, Position, PositionMap};

/// Presentation collaborator called by [`EditorSession`](super::EditorSession).
///
/// Input flows the other way: the UI layer owns the session and forwards its raw
/// events through [`EditorSession::handle_input`](super::EditorSession::handle_input).
pub trait RenderBridge {
	/// Draw every node at the given positions. Called after each layout step and
	/// after every structural change.
	fn request_redraw(&mut self, positions: &PositionMap);

	/// Show inspection content for `entity`.
	fn show_popover(&mut self, entity: Entity, title: &str, body_html: &str);

	/// Hide the popover of `entity`.
	fn hide_popover(&mut self, entity: Entity);

	/// Draw the linking rubber-band.
	fn show_drag_line(&mut self, _from: Position, _to: Position) {}

	/// Remove the linking rubber-band.
	fn hide_drag_line(&mut self) {}
}

/// Bridge that discards every request, for headless sessions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBridge;

impl RenderBridge for NoopBridge {
	fn request_redraw(&mut self, _: &PositionMap) {}

	fn show_popover(&mut self, _: Entity, _: &str, _: &str) {}

	fn hide_popover(&mut self, _: Entity) {}
}
