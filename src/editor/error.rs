//! Failures surfaced by the graph editing core.
//!
//! Every error is returned synchronously to the immediate caller and leaves the
//! model exactly as it was before the failed call.

use super::types::{LinkId, NodeId};

/// Errors raised by [`GraphModel`](super::GraphModel) and the session on top of it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
	/// Another live node already carries this name.
	#[error("a node named '{name}' already exists")]
	DuplicateName {
		/// The clashing name.
		name: String,
	},

	/// The node handle is stale or was never issued by this model.
	#[error("node {0} not found")]
	NodeNotFound(NodeId),

	/// The link handle is stale or was never issued by this model.
	#[error("link {0} not found")]
	LinkNotFound(LinkId),

	/// A link must connect two distinct nodes.
	#[error("cannot link node {node} to itself")]
	InvalidLink {
		/// Node used as both endpoints.
		node: NodeId,
	},

	/// No behavior bundle is registered under this kind tag.
	#[error("unknown node kind '{kind}'")]
	UnknownKind {
		/// The unregistered tag.
		kind: String,
	},
}

/// Result alias used throughout the editor core.
pub type Result<T> = std::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_name_the_offending_value() {
		let err = EditorError::DuplicateName {
			name: "db".into(),
		};
		assert_eq!(err.to_string(), "a node named 'db' already exists");

		let err = EditorError::InvalidLink { node: NodeId(3) };
		assert_eq!(err.to_string(), "cannot link node n3 to itself");

		let err = EditorError::UnknownKind {
			kind: "Queue".into(),
		};
		assert_eq!(err.to_string(), "unknown node kind 'Queue'");
	}
}
