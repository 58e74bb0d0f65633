//! Handles, geometry and export records shared across the editor.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Open-ended metadata attached to nodes and links.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Positions of every live node, keyed (and therefore ordered) by id.
pub type PositionMap = BTreeMap<NodeId, Position>;

/// Opaque node handle. Never reused within one model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u64);

/// Opaque link handle. Never reused within one model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub(crate) u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "n{}", self.0)
	}
}

impl fmt::Display for LinkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "l{}", self.0)
	}
}

/// Anything a click can land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
	/// A node.
	Node(NodeId),
	/// A link.
	Link(LinkId),
}

/// A point in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Position {
	/// Build a position from its coordinates.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// This position shifted by `(dx, dy)`.
	pub fn offset(self, dx: f64, dy: f64) -> Self {
		Self::new(self.x + dx, self.y + dy)
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Position) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}

	/// Distance from this point to the segment `a`-`b`.
	pub fn distance_to_segment(self, a: Position, b: Position) -> f64 {
		let (dx, dy) = (b.x - a.x, b.y - a.y);
		let len_sq = dx * dx + dy * dy;
		if len_sq < f64::EPSILON {
			return self.distance(a);
		}
		let t = (((self.x - a.x) * dx + (self.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
		self.distance(Position::new(a.x + t * dx, a.y + t * dy))
	}
}

/// Modifier keys held when a pointer button went down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
	/// Shift key.
	pub shift: bool,
	/// Control key.
	pub ctrl: bool,
}

impl Modifiers {
	/// No modifier held.
	pub const NONE: Modifiers = Modifiers {
		shift: false,
		ctrl: false,
	};

	/// Only shift held.
	pub const SHIFT: Modifiers = Modifiers {
		shift: true,
		ctrl: false,
	};

	/// Whether the press should start a link instead of a drag.
	pub fn wants_link(self) -> bool {
		self.shift || self.ctrl
	}
}

/// Exported form of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	/// Unique human key.
	pub name: String,
	/// Display text.
	pub label: String,
	/// Kind tag.
	#[serde(rename = "type")]
	pub kind: String,
	/// Kind-specific metadata.
	pub properties: Properties,
}

/// Exported form of a link, endpoints referenced by node name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
	/// Source node name.
	pub source: String,
	/// Target node name.
	pub target: String,
	/// Link metadata.
	pub properties: Properties,
}

/// Exported form of a whole graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Nodes in insertion order.
	pub nodes: Vec<NodeRecord>,
	/// Links in insertion order.
	pub links: Vec<LinkRecord>,
}
