//! One editor instance: model, layout, gestures and the bridge that draws them.

use std::collections::VecDeque;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::bridge::RenderBridge;
use super::error::{EditorError, Result};
use super::gesture::{GestureController, GestureEffect};
use super::kind::{Decoration, KindRegistry, NodeKind, escape_html, properties_html};
use super::layout::{ForceLayout, LayoutParams, LayoutStatus};
use super::model::{GraphModel, ModelEvent, NodeSpec};
use super::types::{Entity, GraphData, LinkId, Modifiers, NodeId, Position, Properties};

/// Session settings. Every field has a default, so partial JSON is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
	/// Force simulation parameters.
	pub layout: LayoutParams,
	/// Hit radius of a node, in graph units.
	pub node_radius: f64,
	/// How close a click must be to a link to hit it.
	pub link_tolerance: f64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			layout: LayoutParams::default(),
			node_radius: 20.0,
			link_tolerance: 4.0,
		}
	}
}

/// Raw input forwarded by the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
	/// A pointer button went down.
	PointerDown {
		/// Node under the pointer.
		target: Option<NodeId>,
		/// Pointer position in graph space.
		at: Position,
		/// Modifiers held at press time.
		modifiers: Modifiers,
	},
	/// The pointer moved.
	PointerMove {
		/// Pointer position in graph space.
		at: Position,
	},
	/// The button was released.
	PointerUp {
		/// Node under the pointer.
		target: Option<NodeId>,
	},
	/// A click, delivered after the matching release.
	Click {
		/// Entity under the pointer.
		target: Option<Entity>,
	},
	/// A key went down.
	KeyDown(String),
	/// A key went up.
	KeyUp(String),
	/// The pointer left the canvas.
	PointerLeave,
}

/// Owns a [`GraphModel`], its [`ForceLayout`] and [`GestureController`], and the
/// [`RenderBridge`] that presents them.
pub struct EditorSession {
	config: SessionConfig,
	model: GraphModel,
	layout: ForceLayout,
	gestures: GestureController,
	bridge: Box<dyn RenderBridge>,
}

impl EditorSession {
	/// Start a session with the given kinds and presentation.
	pub fn create(
		config: SessionConfig,
		registry: KindRegistry,
		bridge: impl RenderBridge + 'static,
	) -> Self {
		debug!(
			"Editor session ({},{}) initialized",
			config.layout.width, config.layout.height
		);
		Self {
			layout: ForceLayout::new(config.layout.clone()),
			model: GraphModel::with_registry(registry),
			gestures: GestureController::new(),
			bridge: Box::new(bridge),
			config,
		}
	}

	/// Tear the session down, closing popovers and the drag line, and hand back
	/// the model.
	pub fn dispose(mut self) -> GraphModel {
		self.layout.stop();
		let mut effects = self.gestures.cancel();
		effects.extend(self.gestures.close_popover());
		self.apply(effects);
		debug!("Editor session disposed");
		self.model
	}

	/// Session settings.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// The graph.
	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	/// The layout.
	pub fn layout(&self) -> &ForceLayout {
		&self.layout
	}

	/// The gesture state machine.
	pub fn gestures(&self) -> &GestureController {
		&self.gestures
	}

	/// Register a node kind.
	pub fn register_kind(&mut self, tag: impl Into<String>, kind: NodeKind) {
		self.model.register_kind(tag, kind);
	}

	/// Create a node. Without an explicit position it is placed by the layout.
	pub fn add_node(&mut self, kind: &str, spec: NodeSpec) -> Result<NodeId> {
		// a rejected node must not consume a placement
		self.model.check_new_node(kind, spec.name())?;
		let spec = if spec.has_position() {
			spec
		} else {
			spec.at(self.layout.initial_position())
		};
		let id = self.model.add_node(kind, spec)?;
		self.sync();
		Ok(id)
	}

	/// Remove a node and its links.
	pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
		self.model.remove_node(id)?;
		self.sync();
		Ok(())
	}

	/// Create a link.
	pub fn add_link(&mut self, source: NodeId, target: NodeId, properties: Properties) -> Result<LinkId> {
		let id = self.model.add_link(source, target, properties)?;
		self.sync();
		Ok(id)
	}

	/// Remove a link.
	pub fn remove_link(&mut self, id: LinkId) -> Result<()> {
		self.model.remove_link(id)?;
		self.sync();
		Ok(())
	}

	/// Change a node's label.
	pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
		self.model.set_label(id, label)?;
		self.sync();
		Ok(())
	}

	/// Set a node property.
	pub fn set_property(
		&mut self,
		id: NodeId,
		key: impl Into<String>,
		value: impl Into<serde_json::Value>,
	) -> Result<()> {
		self.model.set_property(id, key, value)?;
		self.sync();
		Ok(())
	}

	/// Hold a node at `at`.
	pub fn pin(&mut self, id: NodeId, at: Position) -> Result<()> {
		self.layout.pin(&mut self.model, id, at)?;
		self.redraw();
		Ok(())
	}

	/// Release a pinned node.
	pub fn unpin(&mut self, id: NodeId) -> Result<()> {
		self.layout.unpin(&mut self.model, id)
	}

	/// Change the canvas size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.config.layout.width = width;
		self.config.layout.height = height;
		self.layout.resize(width, height);
	}

	/// Reheat the layout.
	pub fn start(&mut self) {
		self.layout.start();
	}

	/// Suspend the layout.
	pub fn pause(&mut self) {
		self.layout.pause();
	}

	/// Resume a paused layout.
	pub fn resume(&mut self) {
		self.layout.resume();
	}

	/// Freeze the layout.
	pub fn stop(&mut self) {
		self.layout.stop();
	}

	/// Advance the layout one step, redrawing if it moved anything.
	pub fn tick(&mut self) -> LayoutStatus {
		let before = self.layout.ticks();
		let status = self.layout.tick(&mut self.model);
		if self.layout.ticks() != before {
			self.redraw();
		}
		status
	}

	/// Feed one input event through the gesture state machine.
	pub fn handle_input(&mut self, event: InputEvent) {
		let effects = match event {
			InputEvent::PointerDown {
				target,
				at,
				modifiers,
			} => self.gestures.pointer_down(target, at, modifiers),
			InputEvent::PointerMove { at } => self.gestures.pointer_move(at),
			InputEvent::PointerUp { target } => self.gestures.pointer_up(target),
			InputEvent::Click { target } => self.gestures.plain_click(target),
			InputEvent::KeyDown(key) => self.gestures.key_down(&key),
			InputEvent::KeyUp(key) => self.gestures.key_up(&key),
			InputEvent::PointerLeave => self.gestures.pointer_leave(),
		};
		self.apply(effects);
	}

	/// Topmost node under `at`.
	pub fn hit_node(&self, at: Position) -> Option<NodeId> {
		self.model.node_at(at, self.config.node_radius)
	}

	/// Topmost node under `at`, else topmost link.
	pub fn hit_entity(&self, at: Position) -> Option<Entity> {
		self.hit_node(at).map(Entity::Node).or_else(|| {
			self.model
				.link_at(at, self.config.link_tolerance)
				.map(Entity::Link)
		})
	}

	/// How the renderer should decorate a node.
	pub fn decoration(&self, id: NodeId) -> Result<Decoration> {
		let node = self.model.node(id)?;
		let index = self.model.node_index(id).ok_or(EditorError::NodeNotFound(id))?;
		Ok(self.model.registry().get(node.kind())?.decorate(node, index))
	}

	/// Popover title and HTML body for `entity`.
	pub fn popover_content(&self, entity: Entity) -> Result<(String, String)> {
		match entity {
			Entity::Node(id) => {
				let node = self.model.node(id)?;
				let index = self.model.node_index(id).ok_or(EditorError::NodeNotFound(id))?;
				let kind = self.model.registry().get(node.kind())?;
				Ok((kind.popover_title(node, index), kind.popover_body(node, index)))
			}
			Entity::Link(id) => {
				let link = self.model.link(id)?;
				let source = self.model.node(link.source())?;
				let target = self.model.node(link.target())?;
				Ok((
					format!("{} → {}", source.label(), target.label()),
					format!(
						"<dl><dt>Source</dt><dd>{}</dd><dt>Target</dt><dd>{}</dd>{}</dl>",
						escape_html(source.name()),
						escape_html(target.name()),
						properties_html(link.properties())
					),
				))
			}
		}
	}

	/// Exported form of the graph.
	pub fn export(&self) -> GraphData {
		self.model.export()
	}

	fn redraw(&mut self) {
		self.bridge.request_redraw(&self.model.positions());
	}

	fn apply(&mut self, effects: Vec<GestureEffect>) {
		let mut queue: VecDeque<GestureEffect> = effects.into();
		while let Some(effect) = queue.pop_front() {
			if let Err(err) = self.apply_one(effect) {
				warn!("{:?} failed ({}), gesture cancelled", effect, err);
				queue.extend(self.gestures.cancel());
			}
		}
		self.sync();
	}

	fn apply_one(&mut self, effect: GestureEffect) -> Result<()> {
		match effect {
			GestureEffect::PinNode(id) => {
				let at = self.model.node(id)?.position();
				self.layout.pin(&mut self.model, id, at)?;
			}
			GestureEffect::MoveNode { node, dx, dy } => {
				self.layout.move_pinned(&mut self.model, node, dx, dy)?;
				self.redraw();
			}
			GestureEffect::ShowDragLine { source, to } => {
				let from = self.model.node(source)?.position();
				self.bridge.show_drag_line(from, to);
			}
			GestureEffect::HideDragLine => self.bridge.hide_drag_line(),
			GestureEffect::CreateLink { source, target } => {
				self.model.add_link(source, target, Properties::new())?;
			}
			GestureEffect::ShowPopover(entity) => {
				let (title, body) = self.popover_content(entity)?;
				self.bridge.show_popover(entity, &title, &body);
			}
			GestureEffect::HidePopover(entity) => self.bridge.hide_popover(entity),
		}
		Ok(())
	}

	fn sync(&mut self) {
		let events = self.model.take_events();
		if events.is_empty() {
			return;
		}
		let mut effects = Vec::new();
		for event in events {
			match event {
				ModelEvent::NodeAdded(_) | ModelEvent::LinkAdded(_) => self.layout.perturb(),
				ModelEvent::NodeRemoved(id) => {
					self.layout.perturb();
					effects.extend(self.gestures.forget_node(id));
				}
				ModelEvent::LinkRemoved(id) => {
					self.layout.perturb();
					effects.extend(self.gestures.forget_link(id));
				}
				ModelEvent::NodeUpdated(id) => {
					if self.gestures.open_popover() == Some(Entity::Node(id)) {
						effects.push(GestureEffect::ShowPopover(Entity::Node(id)));
					}
				}
			}
		}
		self.apply(effects);
		self.redraw();
	}
}
