//! The authoritative node and link store.
//!
//! Nodes and links are only ever created through [`GraphModel::add_node`] and
//! [`GraphModel::add_link`], so id allocation and the uniqueness and integrity
//! checks live in one place. Every link always references two live, distinct
//! nodes: removing a node removes its incident links in the same call.

use std::collections::HashMap;
use std::fmt;

use log::info;
use serde_json::Value;

use super::error::{EditorError, Result};
use super::kind::{KindRegistry, NodeKind};
use super::types::{
	GraphData, LinkId, LinkRecord, NodeId, NodeRecord, Position, PositionMap, Properties,
};

/// A graph vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	id: NodeId,
	name: String,
	label: String,
	kind: String,
	position: Position,
	pinned: bool,
	properties: Properties,
}

impl Node {
	/// Stable handle.
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Unique human key.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Display text.
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Kind tag.
	pub fn kind(&self) -> &str {
		&self.kind
	}

	/// Current position.
	pub fn position(&self) -> Position {
		self.position
	}

	/// Whether the layout leaves this node where it is.
	pub fn is_pinned(&self) -> bool {
		self.pinned
	}

	/// Kind-specific metadata.
	pub fn properties(&self) -> &Properties {
		&self.properties
	}

	pub(crate) fn set_position(&mut self, position: Position) {
		self.position = position;
	}

	pub(crate) fn set_pinned(&mut self, pinned: bool) {
		self.pinned = pinned;
	}

	/// Exported form.
	pub fn to_record(&self) -> NodeRecord {
		NodeRecord {
			name: self.name.clone(),
			label: self.label.clone(),
			kind: self.kind.clone(),
			properties: self.properties.clone(),
		}
	}
}

impl fmt::Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Node(name='{}',label='{}',type='{}')",
			self.name, self.label, self.kind
		)
	}
}

/// A directed edge between two distinct nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	id: LinkId,
	source: NodeId,
	target: NodeId,
	properties: Properties,
}

impl Link {
	/// Stable handle.
	pub fn id(&self) -> LinkId {
		self.id
	}

	/// Node the link starts from.
	pub fn source(&self) -> NodeId {
		self.source
	}

	/// Node the link points to.
	pub fn target(&self) -> NodeId {
		self.target
	}

	/// Link metadata.
	pub fn properties(&self) -> &Properties {
		&self.properties
	}

	/// Whether `node` is one of the endpoints.
	pub fn touches(&self, node: NodeId) -> bool {
		self.source == node || self.target == node
	}
}

/// Arguments for [`GraphModel::add_node`].
#[derive(Clone, Debug, Default)]
pub struct NodeSpec {
	name: String,
	label: Option<String>,
	position: Option<Position>,
	properties: Properties,
}

impl NodeSpec {
	/// A node called `name`, labelled with its name.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Default::default()
		}
	}

	/// Display text differing from the name.
	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Starting position. Without one the node starts at the origin, or wherever the
	/// owning session places it.
	pub fn at(mut self, position: Position) -> Self {
		self.position = Some(position);
		self
	}

	/// Set one property.
	pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.insert(key.into(), value.into());
		self
	}

	/// Requested name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Whether a starting position was given.
	pub fn has_position(&self) -> bool {
		self.position.is_some()
	}
}

/// Structural change notifications, queued in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelEvent {
	/// A node was created.
	NodeAdded(NodeId),
	/// A node was removed.
	NodeRemoved(NodeId),
	/// A node's label or properties changed.
	NodeUpdated(NodeId),
	/// A link was created.
	LinkAdded(LinkId),
	/// A link was removed, explicitly or by cascade.
	LinkRemoved(LinkId),
}

/// Owns every node and link of one editor.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	registry: KindRegistry,
	nodes: Vec<Node>,
	links: Vec<Link>,
	names: HashMap<String, NodeId>,
	next_node: u64,
	next_link: u64,
	events: Vec<ModelEvent>,
}

impl GraphModel {
	/// An empty model knowing only the base kind.
	pub fn new() -> Self {
		Self::with_registry(KindRegistry::new())
	}

	/// An empty model using `registry` for kind lookups.
	pub fn with_registry(registry: KindRegistry) -> Self {
		Self {
			registry,
			..Default::default()
		}
	}

	/// The kind registry.
	pub fn registry(&self) -> &KindRegistry {
		&self.registry
	}

	/// Register a kind so nodes of it can be created.
	pub fn register_kind(&mut self, tag: impl Into<String>, kind: NodeKind) -> Option<NodeKind> {
		self.registry.register(tag, kind)
	}

	/// Check that a node of `kind` called `name` could be added right now.
	pub fn check_new_node(&self, kind: &str, name: &str) -> Result<()> {
		self.registry.get(kind)?;
		if self.names.contains_key(name) {
			return Err(EditorError::DuplicateName { name: name.to_string() });
		}
		Ok(())
	}

	/// Create a node of `kind`.
	pub fn add_node(&mut self, kind: &str, spec: NodeSpec) -> Result<NodeId> {
		self.check_new_node(kind, &spec.name)?;
		let behavior = self.registry.get(kind)?;

		let NodeSpec {
			name,
			label,
			position,
			mut properties,
		} = spec;
		behavior.init(&mut properties);

		let id = NodeId(self.next_node);
		self.next_node += 1;
		let node = Node {
			id,
			label: label.unwrap_or_else(|| name.clone()),
			name,
			kind: kind.to_string(),
			position: position.unwrap_or_default(),
			pinned: false,
			properties,
		};
		info!("Adding node {}", node);
		self.names.insert(node.name.clone(), id);
		self.nodes.push(node);
		self.events.push(ModelEvent::NodeAdded(id));
		Ok(id)
	}

	/// Remove a node and every link touching it.
	pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
		let index = self.node_index(id).ok_or(EditorError::NodeNotFound(id))?;
		info!("Removing node {}", self.nodes[index].label);

		let events = &mut self.events;
		self.links.retain(|link| {
			if link.touches(id) {
				events.push(ModelEvent::LinkRemoved(link.id));
				false
			} else {
				true
			}
		});

		let node = self.nodes.remove(index);
		self.names.remove(&node.name);
		self.events.push(ModelEvent::NodeRemoved(id));
		Ok(())
	}

	/// Create a link from `source` to `target`. Parallel links are allowed.
	pub fn add_link(
		&mut self,
		source: NodeId,
		target: NodeId,
		properties: Properties,
	) -> Result<LinkId> {
		if source == target {
			return Err(EditorError::InvalidLink { node: source });
		}
		let source_label = self.node(source)?.label.clone();
		let target_label = self.node(target)?.label.clone();

		let id = LinkId(self.next_link);
		self.next_link += 1;
		info!(
			"Adding link{{source={} target={}}}",
			source_label, target_label
		);
		self.links.push(Link {
			id,
			source,
			target,
			properties,
		});
		self.events.push(ModelEvent::LinkAdded(id));
		Ok(id)
	}

	/// Remove a single link.
	pub fn remove_link(&mut self, id: LinkId) -> Result<()> {
		let index = self
			.links
			.iter()
			.position(|link| link.id == id)
			.ok_or(EditorError::LinkNotFound(id))?;
		let link = self.links.remove(index);
		info!("Removing link [source={}, target={}]", link.source, link.target);
		self.events.push(ModelEvent::LinkRemoved(id));
		Ok(())
	}

	/// Change a node's display text.
	pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
		self.node_mut(id)?.label = label.into();
		self.events.push(ModelEvent::NodeUpdated(id));
		Ok(())
	}

	/// Set one property on a node.
	pub fn set_property(
		&mut self,
		id: NodeId,
		key: impl Into<String>,
		value: impl Into<Value>,
	) -> Result<()> {
		self.node_mut(id)?
			.properties
			.insert(key.into(), value.into());
		self.events.push(ModelEvent::NodeUpdated(id));
		Ok(())
	}

	/// Look up a node.
	pub fn node(&self, id: NodeId) -> Result<&Node> {
		self.nodes
			.iter()
			.find(|node| node.id == id)
			.ok_or(EditorError::NodeNotFound(id))
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
		self.nodes
			.iter_mut()
			.find(|node| node.id == id)
			.ok_or(EditorError::NodeNotFound(id))
	}

	/// Look up a link.
	pub fn link(&self, id: LinkId) -> Result<&Link> {
		self.links
			.iter()
			.find(|link| link.id == id)
			.ok_or(EditorError::LinkNotFound(id))
	}

	/// Look up a live node by name.
	pub fn node_by_name(&self, name: &str) -> Option<&Node> {
		let id = *self.names.get(name)?;
		self.node(id).ok()
	}

	/// Insertion-order index of a node, as passed to kind behaviors.
	pub fn node_index(&self, id: NodeId) -> Option<usize> {
		self.nodes.iter().position(|node| node.id == id)
	}

	/// Whether `id` refers to a live node.
	pub fn contains_node(&self, id: NodeId) -> bool {
		self.node_index(id).is_some()
	}

	/// Whether `id` refers to a live link.
	pub fn contains_link(&self, id: LinkId) -> bool {
		self.links.iter().any(|link| link.id == id)
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> std::slice::Iter<'_, Node> {
		self.nodes.iter()
	}

	/// Links in insertion order.
	pub fn links(&self) -> std::slice::Iter<'_, Link> {
		self.links.iter()
	}

	pub(crate) fn nodes_mut(&mut self) -> std::slice::IterMut<'_, Node> {
		self.nodes.iter_mut()
	}

	/// Number of live nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of live links.
	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	/// Links with `id` as source or target.
	pub fn incident_links(&self, id: NodeId) -> impl Iterator<Item = &Link> + Clone + '_ {
		self.links.iter().filter(move |link| link.touches(id))
	}

	/// Current position of every node.
	pub fn positions(&self) -> PositionMap {
		self.nodes
			.iter()
			.map(|node| (node.id, node.position))
			.collect()
	}

	/// Topmost node whose center lies within `radius` of `point`.
	pub fn node_at(&self, point: Position, radius: f64) -> Option<NodeId> {
		self.nodes
			.iter()
			.rev()
			.find(|node| node.position.distance(point) < radius)
			.map(Node::id)
	}

	/// Topmost link whose segment passes within `tolerance` of `point`.
	pub fn link_at(&self, point: Position, tolerance: f64) -> Option<LinkId> {
		self.links
			.iter()
			.rev()
			.find(|link| {
				match (self.node(link.source), self.node(link.target)) {
					(Ok(source), Ok(target)) => {
						point.distance_to_segment(source.position, target.position) < tolerance
					}
					_ => false,
				}
			})
			.map(Link::id)
	}

	/// Exported form of a link, endpoints by name.
	pub fn link_record(&self, id: LinkId) -> Result<LinkRecord> {
		let link = self.link(id)?;
		Ok(LinkRecord {
			source: self.node(link.source)?.name.clone(),
			target: self.node(link.target)?.name.clone(),
			properties: link.properties.clone(),
		})
	}

	/// Text form of a link, endpoints by label.
	pub fn describe_link(&self, id: LinkId) -> Result<String> {
		let link = self.link(id)?;
		Ok(format!(
			"Link(source='{}',target='{}')",
			self.node(link.source)?.label,
			self.node(link.target)?.label
		))
	}

	/// Exported form of the whole graph.
	pub fn export(&self) -> GraphData {
		GraphData {
			nodes: self.nodes.iter().map(Node::to_record).collect(),
			links: self
				.links
				.iter()
				.filter_map(|link| self.link_record(link.id).ok())
				.collect(),
		}
	}

	/// Drain pending change notifications.
	pub fn take_events(&mut self) -> Vec<ModelEvent> {
		std::mem::take(&mut self.events)
	}
}
