//! Pointer gesture interpretation.
//!
//! One press/move/release sequence becomes exactly one of: a node drag, a link
//! rubber-band that may end in a new link, or an inspection click. The controller
//! never touches the model itself; it returns [`GestureEffect`]s for the session to
//! apply. Whether a click should be swallowed because it closed a drag or a link
//! gesture is tracked here, not read off the input event.

use log::debug;

use super::types::{Entity, LinkId, Modifiers, NodeId, Position};

/// Where the controller is within a gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureState {
	/// No gesture in progress.
	Idle,
	/// A node follows the pointer.
	DraggingNode {
		/// Node being dragged.
		node: NodeId,
		/// Pointer position at the previous event.
		last: Position,
		/// Whether any move arrived since the press.
		moved: bool,
	},
	/// A link is being drawn out of `source`.
	Linking {
		/// Pending link source.
		source: NodeId,
		/// Current rubber-band end.
		pointer: Position,
	},
}

/// Work requested by the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEffect {
	/// Pin the node where it currently stands.
	PinNode(NodeId),
	/// Shift a pinned node.
	MoveNode {
		/// Node to move.
		node: NodeId,
		/// Horizontal delta.
		dx: f64,
		/// Vertical delta.
		dy: f64,
	},
	/// Draw or update the rubber-band from `source` to `to`.
	ShowDragLine {
		/// Link source node.
		source: NodeId,
		/// Pointer end.
		to: Position,
	},
	/// Remove the rubber-band.
	HideDragLine,
	/// Create a link.
	CreateLink {
		/// Link source.
		source: NodeId,
		/// Link target.
		target: NodeId,
	},
	/// Open the popover of an entity.
	ShowPopover(Entity),
	/// Close the popover of an entity.
	HidePopover(Entity),
}

/// State machine over pointer input.
#[derive(Clone, Debug)]
pub struct GestureController {
	state: GestureState,
	open_popover: Option<Entity>,
	suppress_click: bool,
}

impl Default for GestureController {
	fn default() -> Self {
		Self::new()
	}
}

impl GestureController {
	/// An idle controller with no popover open.
	pub fn new() -> Self {
		Self {
			state: GestureState::Idle,
			open_popover: None,
			suppress_click: false,
		}
	}

	/// Current state.
	pub fn state(&self) -> GestureState {
		self.state
	}

	/// Entity whose popover is open, if any.
	pub fn open_popover(&self) -> Option<Entity> {
		self.open_popover
	}

	/// A button went down at `at`, over `target` if it is a node.
	pub fn pointer_down(
		&mut self,
		target: Option<NodeId>,
		at: Position,
		modifiers: Modifiers,
	) -> Vec<GestureEffect> {
		let mut effects = Vec::new();
		if self.state != GestureState::Idle {
			debug!("pointer down during {:?}, abandoning it", self.state);
			effects.extend(self.cancel());
		}
		self.suppress_click = false;

		let Some(node) = target else {
			return effects;
		};
		if modifiers.wants_link() {
			debug!("linkstart - source = {}", node);
			self.state = GestureState::Linking {
				source: node,
				pointer: at,
			};
			effects.push(GestureEffect::ShowDragLine {
				source: node,
				to: at,
			});
		} else {
			debug!("dragstart {}", node);
			self.state = GestureState::DraggingNode {
				node,
				last: at,
				moved: false,
			};
			effects.push(GestureEffect::PinNode(node));
		}
		effects
	}

	/// The pointer moved to `at`.
	pub fn pointer_move(&mut self, at: Position) -> Vec<GestureEffect> {
		match &mut self.state {
			GestureState::Idle => Vec::new(),
			GestureState::DraggingNode { node, last, moved } => {
				let (dx, dy) = (at.x - last.x, at.y - last.y);
				*last = at;
				*moved = true;
				vec![GestureEffect::MoveNode {
					node: *node,
					dx,
					dy,
				}]
			}
			GestureState::Linking { source, pointer } => {
				*pointer = at;
				vec![GestureEffect::ShowDragLine {
					source: *source,
					to: at,
				}]
			}
		}
	}

	/// The button was released, over `target` if it is a node.
	pub fn pointer_up(&mut self, target: Option<NodeId>) -> Vec<GestureEffect> {
		match std::mem::replace(&mut self.state, GestureState::Idle) {
			GestureState::Idle => Vec::new(),
			GestureState::DraggingNode { node, moved, .. } => {
				debug!("dragend - moving {}", node);
				self.suppress_click = moved;
				Vec::new()
			}
			GestureState::Linking { source, .. } => {
				self.suppress_click = true;
				match target {
					Some(target) if target != source => {
						debug!("dragend - linking {} to {}", source, target);
						vec![
							GestureEffect::HideDragLine,
							GestureEffect::CreateLink { source, target },
						]
					}
					_ => {
						debug!("dragend - linking abandoned");
						vec![GestureEffect::HideDragLine]
					}
				}
			}
		}
	}

	/// A click landed on `target`, or on empty canvas.
	pub fn plain_click(&mut self, target: Option<Entity>) -> Vec<GestureEffect> {
		if std::mem::take(&mut self.suppress_click) {
			debug!("click prevented");
			return Vec::new();
		}
		if self.state != GestureState::Idle {
			return Vec::new();
		}

		let mut effects = Vec::new();
		let previous = self.open_popover.take();
		if let Some(open) = previous {
			effects.push(GestureEffect::HidePopover(open));
		}
		if let Some(entity) = target {
			if previous != Some(entity) {
				effects.push(GestureEffect::ShowPopover(entity));
				self.open_popover = Some(entity);
			}
		}
		effects
	}

	/// Reserved for modifier-driven behavior; no transition.
	pub fn key_down(&mut self, key: &str) -> Vec<GestureEffect> {
		debug!("keydown {}", key);
		Vec::new()
	}

	/// Reserved for modifier-driven behavior; no transition.
	pub fn key_up(&mut self, key: &str) -> Vec<GestureEffect> {
		debug!("keyup {}", key);
		Vec::new()
	}

	/// The pointer left the canvas.
	pub fn pointer_leave(&mut self) -> Vec<GestureEffect> {
		self.cancel()
	}

	/// Drop any gesture in progress. A dragged node stays pinned.
	pub fn cancel(&mut self) -> Vec<GestureEffect> {
		match std::mem::replace(&mut self.state, GestureState::Idle) {
			GestureState::Linking { .. } => vec![GestureEffect::HideDragLine],
			_ => Vec::new(),
		}
	}

	/// Close whichever popover is open.
	pub fn close_popover(&mut self) -> Vec<GestureEffect> {
		self.open_popover
			.take()
			.map(GestureEffect::HidePopover)
			.into_iter()
			.collect()
	}

	/// Forget a removed node: abandon gestures using it and close its popover.
	pub fn forget_node(&mut self, id: NodeId) -> Vec<GestureEffect> {
		let involved = match self.state {
			GestureState::DraggingNode { node, .. } => node == id,
			GestureState::Linking { source, .. } => source == id,
			GestureState::Idle => false,
		};
		let mut effects = if involved { self.cancel() } else { Vec::new() };
		if self.open_popover == Some(Entity::Node(id)) {
			self.open_popover = None;
			effects.push(GestureEffect::HidePopover(Entity::Node(id)));
		}
		effects
	}

	/// Forget a removed link: close its popover.
	pub fn forget_link(&mut self, id: LinkId) -> Vec<GestureEffect> {
		if self.open_popover == Some(Entity::Link(id)) {
			self.open_popover = None;
			return vec![GestureEffect::HidePopover(Entity::Link(id))];
		}
		Vec::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const A: NodeId = NodeId(1);
	const B: NodeId = NodeId(2);

	fn at(x: f64, y: f64) -> Position {
		Position::new(x, y)
	}

	#[test]
	fn shift_press_starts_linking_without_pinning() {
		let mut gestures = GestureController::new();
		let effects = gestures.pointer_down(Some(A), at(1.0, 1.0), Modifiers::SHIFT);
		assert_eq!(
			effects,
			vec![GestureEffect::ShowDragLine {
				source: A,
				to: at(1.0, 1.0)
			}]
		);
		assert!(matches!(gestures.state(), GestureState::Linking { source: A, .. }));
	}

	#[test]
	fn ctrl_press_also_links() {
		let mut gestures = GestureController::new();
		let ctrl = Modifiers {
			shift: false,
			ctrl: true,
		};
		gestures.pointer_down(Some(A), at(0.0, 0.0), ctrl);
		assert!(matches!(gestures.state(), GestureState::Linking { .. }));
	}

	#[test]
	fn linking_release_on_other_node_creates_link() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		let moved = gestures.pointer_move(at(5.0, 6.0));
		assert_eq!(
			moved,
			vec![GestureEffect::ShowDragLine {
				source: A,
				to: at(5.0, 6.0)
			}]
		);
		let effects = gestures.pointer_up(Some(B));
		assert_eq!(
			effects,
			vec![
				GestureEffect::HideDragLine,
				GestureEffect::CreateLink {
					source: A,
					target: B
				}
			]
		);
		assert_eq!(gestures.state(), GestureState::Idle);
	}

	#[test]
	fn linking_release_on_source_or_nothing_is_abandoned() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		assert_eq!(gestures.pointer_up(Some(A)), vec![GestureEffect::HideDragLine]);

		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		assert_eq!(gestures.pointer_up(None), vec![GestureEffect::HideDragLine]);
		assert_eq!(gestures.state(), GestureState::Idle);
	}

	#[test]
	fn drag_relays_deltas_between_moves() {
		let mut gestures = GestureController::new();
		assert_eq!(
			gestures.pointer_down(Some(A), at(10.0, 10.0), Modifiers::NONE),
			vec![GestureEffect::PinNode(A)]
		);
		assert_eq!(
			gestures.pointer_move(at(13.0, 8.0)),
			vec![GestureEffect::MoveNode {
				node: A,
				dx: 3.0,
				dy: -2.0
			}]
		);
		assert_eq!(
			gestures.pointer_move(at(14.0, 8.0)),
			vec![GestureEffect::MoveNode {
				node: A,
				dx: 1.0,
				dy: 0.0
			}]
		);
		assert!(gestures.pointer_up(None).is_empty());
		assert_eq!(gestures.state(), GestureState::Idle);
	}

	#[test]
	fn click_after_drag_is_suppressed_once() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::NONE);
		gestures.pointer_move(at(4.0, 0.0));
		gestures.pointer_up(Some(A));
		assert!(gestures.plain_click(Some(Entity::Node(A))).is_empty());
		assert_eq!(gestures.open_popover(), None);

		assert_eq!(
			gestures.plain_click(Some(Entity::Node(A))),
			vec![GestureEffect::ShowPopover(Entity::Node(A))]
		);
	}

	#[test]
	fn press_and_release_without_move_still_clicks() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::NONE);
		gestures.pointer_up(Some(A));
		assert_eq!(
			gestures.plain_click(Some(Entity::Node(A))),
			vec![GestureEffect::ShowPopover(Entity::Node(A))]
		);
	}

	#[test]
	fn click_after_link_gesture_is_suppressed() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		gestures.pointer_up(Some(B));
		assert!(gestures.plain_click(Some(Entity::Node(B))).is_empty());
	}

	#[test]
	fn clicks_toggle_a_single_popover() {
		let mut gestures = GestureController::new();
		let (a, b) = (Entity::Node(A), Entity::Link(LinkId(4)));

		assert_eq!(gestures.plain_click(Some(a)), vec![GestureEffect::ShowPopover(a)]);
		assert_eq!(gestures.plain_click(Some(a)), vec![GestureEffect::HidePopover(a)]);
		assert_eq!(gestures.open_popover(), None);

		gestures.plain_click(Some(a));
		assert_eq!(
			gestures.plain_click(Some(b)),
			vec![GestureEffect::HidePopover(a), GestureEffect::ShowPopover(b)]
		);
		assert_eq!(gestures.plain_click(None), vec![GestureEffect::HidePopover(b)]);
		assert!(gestures.plain_click(None).is_empty());
	}

	#[test]
	fn clicks_ignored_mid_gesture() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		assert!(gestures.plain_click(Some(Entity::Node(A))).is_empty());
		assert!(matches!(gestures.state(), GestureState::Linking { .. }));
	}

	#[test]
	fn press_on_empty_canvas_stays_idle() {
		let mut gestures = GestureController::new();
		assert!(gestures.pointer_down(None, at(0.0, 0.0), Modifiers::SHIFT).is_empty());
		assert!(gestures.pointer_move(at(1.0, 1.0)).is_empty());
		assert!(gestures.pointer_up(None).is_empty());
		assert_eq!(gestures.state(), GestureState::Idle);
	}

	#[test]
	fn keys_do_not_transition() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::NONE);
		let before = gestures.state();
		assert!(gestures.key_down("Control").is_empty());
		assert!(gestures.key_up("Control").is_empty());
		assert_eq!(gestures.state(), before);
	}

	#[test]
	fn stale_gesture_is_cancelled_by_next_press() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		let effects = gestures.pointer_down(Some(B), at(0.0, 0.0), Modifiers::NONE);
		assert_eq!(
			effects,
			vec![GestureEffect::HideDragLine, GestureEffect::PinNode(B)]
		);
	}

	#[test]
	fn leaving_the_canvas_cancels_linking() {
		let mut gestures = GestureController::new();
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		assert_eq!(gestures.pointer_leave(), vec![GestureEffect::HideDragLine]);
		assert!(gestures.pointer_up(Some(B)).is_empty());
	}

	#[test]
	fn forgetting_entities_drops_gesture_and_popover() {
		let mut gestures = GestureController::new();
		gestures.plain_click(Some(Entity::Node(B)));
		gestures.pointer_down(Some(A), at(0.0, 0.0), Modifiers::SHIFT);
		assert_eq!(gestures.forget_node(A), vec![GestureEffect::HideDragLine]);
		assert_eq!(gestures.state(), GestureState::Idle);

		assert_eq!(
			gestures.forget_node(B),
			vec![GestureEffect::HidePopover(Entity::Node(B))]
		);
		assert!(gestures.forget_link(LinkId(1)).is_empty());
	}
}
