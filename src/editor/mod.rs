//! Interactive graph editing core: model, force layout and gesture handling.

mod bridge;
mod error;
mod gesture;
mod kind;
mod layout;
mod model;
mod session;
mod types;

pub use bridge::{NoopBridge, RenderBridge};
pub use error::{EditorError, Result};
pub use gesture::{GestureController, GestureEffect, GestureState};
pub use kind::{BASE_KIND, COLORS, Decoration, KindRegistry, NodeKind, escape_html};
pub use layout::{ForceLayout, LayoutParams, LayoutStatus};
pub use model::{GraphModel, Link, ModelEvent, Node, NodeSpec};
pub use session::{EditorSession, InputEvent, SessionConfig};
pub use types::{
	Entity, GraphData, LinkId, LinkRecord, Modifiers, NodeId, NodeRecord, Position, PositionMap,
	Properties,
};
