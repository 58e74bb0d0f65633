//! Node kinds: a tag-keyed table of behavior bundles.
//!
//! A kind only overrides what differs from the base `"Node"` behavior. Building a
//! kind from [`NodeKind::default()`] starts from the base functions, so a subtype
//! that only sets default properties still decorates and renders popovers like a
//! plain node.

use std::collections::HashMap;
use std::fmt::Write as _;

use log::warn;
use serde_json::Value;

use super::error::{EditorError, Result};
use super::model::Node;
use super::types::Properties;

/// Tag of the base kind, always registered.
pub const BASE_KIND: &str = "Node";

/// Palette shared by the built-in kinds.
pub const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// What a renderer draws on top of the node circle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoration {
	/// Short text drawn inside the node.
	pub badge: String,
	/// Fill color.
	pub color: String,
}

/// Applies kind defaults to a fresh node's properties.
pub type InitFn = fn(&mut Properties);
/// Produces the decoration of a node at the given index.
pub type DecorateFn = fn(&Node, usize) -> Decoration;
/// Produces popover text (title or HTML body) for a node at the given index.
pub type PopoverFn = fn(&Node, usize) -> String;

/// Behavior bundle selected by a node's kind tag.
#[derive(Clone, Copy, Debug)]
pub struct NodeKind {
	init: InitFn,
	decorate: DecorateFn,
	popover_title: PopoverFn,
	popover_body: PopoverFn,
}

impl Default for NodeKind {
	fn default() -> Self {
		Self {
			init: base_init,
			decorate: base_decorate,
			popover_title: base_popover_title,
			popover_body: base_popover_body,
		}
	}
}

impl NodeKind {
	/// Override the property defaults.
	pub fn with_init(mut self, init: InitFn) -> Self {
		self.init = init;
		self
	}

	/// Override the decoration.
	pub fn with_decorate(mut self, decorate: DecorateFn) -> Self {
		self.decorate = decorate;
		self
	}

	/// Override the popover title.
	pub fn with_popover_title(mut self, popover_title: PopoverFn) -> Self {
		self.popover_title = popover_title;
		self
	}

	/// Override the popover body.
	pub fn with_popover_body(mut self, popover_body: PopoverFn) -> Self {
		self.popover_body = popover_body;
		self
	}

	/// Fill in kind defaults. Keys already present are left untouched.
	pub fn init(&self, properties: &mut Properties) {
		(self.init)(properties)
	}

	/// Decoration for `node`, drawn at list position `index`.
	pub fn decorate(&self, node: &Node, index: usize) -> Decoration {
		(self.decorate)(node, index)
	}

	/// Popover title for `node`.
	pub fn popover_title(&self, node: &Node, index: usize) -> String {
		(self.popover_title)(node, index)
	}

	/// Popover HTML body for `node`.
	pub fn popover_body(&self, node: &Node, index: usize) -> String {
		(self.popover_body)(node, index)
	}
}

fn base_init(_: &mut Properties) {}

fn base_decorate(_: &Node, index: usize) -> Decoration {
	Decoration {
		badge: index.to_string(),
		color: COLORS[0].into(),
	}
}

fn base_popover_title(node: &Node, _: usize) -> String {
	node.name().to_string()
}

fn base_popover_body(node: &Node, index: usize) -> String {
	let mut content = String::new();
	let _ = write!(
		content,
		"<dt>Type</dt><dd>{}</dd><dt>Index</dt><dd>{}</dd>",
		escape_html(node.kind()),
		index
	);
	content.push_str(&properties_html(node.properties()));
	format!("<dl>{content}</dl>")
}

/// One `<dt>`/`<dd>` pair per property, in key order.
pub fn properties_html(properties: &Properties) -> String {
	let mut out = String::new();
	for (key, value) in properties {
		let _ = write!(
			out,
			"<dt>{}</dt><dd>{}</dd>",
			escape_html(key),
			escape_html(&display_value(value))
		);
	}
	out
}

fn display_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Escape text for inclusion in popover markup.
pub fn escape_html(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
	out
}

fn set_default(properties: &mut Properties, key: &str, value: &str) {
	properties
		.entry(key)
		.or_insert_with(|| Value::String(value.into()));
}

fn database_init(properties: &mut Properties) {
	set_default(properties, "category", "relational");
}

fn database_decorate(_: &Node, _: usize) -> Decoration {
	Decoration {
		badge: "DB".into(),
		color: COLORS[1].into(),
	}
}

fn web_application_init(properties: &mut Properties) {
	set_default(properties, "language", "unspecified");
}

fn web_application_decorate(_: &Node, _: usize) -> Decoration {
	Decoration {
		badge: "WA".into(),
		color: COLORS[2].into(),
	}
}

fn rest_service_init(properties: &mut Properties) {
	set_default(properties, "endpoint", "/");
}

fn rest_service_decorate(_: &Node, _: usize) -> Decoration {
	Decoration {
		badge: "API".into(),
		color: COLORS[4].into(),
	}
}

fn rest_service_title(node: &Node, _: usize) -> String {
	match node.properties().get("endpoint").and_then(Value::as_str) {
		Some(endpoint) => format!("{} {}", node.name(), endpoint),
		None => node.name().to_string(),
	}
}

/// Lookup table from kind tag to behavior bundle.
#[derive(Clone, Debug)]
pub struct KindRegistry {
	kinds: HashMap<String, NodeKind>,
}

impl Default for KindRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl KindRegistry {
	/// A registry holding only the base `"Node"` kind.
	pub fn new() -> Self {
		let mut kinds = HashMap::new();
		kinds.insert(BASE_KIND.to_string(), NodeKind::default());
		Self { kinds }
	}

	/// A registry with the base kind plus `Database`, `WebApplication` and
	/// `RestService`.
	pub fn with_builtin_kinds() -> Self {
		let mut registry = Self::new();
		registry.register(
			"Database",
			NodeKind::default()
				.with_init(database_init)
				.with_decorate(database_decorate),
		);
		registry.register(
			"WebApplication",
			NodeKind::default()
				.with_init(web_application_init)
				.with_decorate(web_application_decorate),
		);
		registry.register(
			"RestService",
			NodeKind::default()
				.with_init(rest_service_init)
				.with_decorate(rest_service_decorate)
				.with_popover_title(rest_service_title),
		);
		registry
	}

	/// Register `kind` under `tag`, returning the bundle it replaced.
	pub fn register(&mut self, tag: impl Into<String>, kind: NodeKind) -> Option<NodeKind> {
		let tag = tag.into();
		let previous = self.kinds.insert(tag.clone(), kind);
		if previous.is_some() {
			warn!("Kind '{}' re-registered, previous behavior replaced", tag);
		}
		previous
	}

	/// Look up the bundle for `tag`.
	pub fn get(&self, tag: &str) -> Result<&NodeKind> {
		self.kinds.get(tag).ok_or_else(|| EditorError::UnknownKind {
			kind: tag.to_string(),
		})
	}

	/// Whether `tag` is registered.
	pub fn contains(&self, tag: &str) -> bool {
		self.kinds.contains_key(tag)
	}

	/// Registered tags, sorted.
	pub fn tags(&self) -> Vec<&str> {
		let mut tags: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
		tags.sort_unstable();
		tags
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn base_kind_is_always_present() {
		let registry = KindRegistry::new();
		assert!(registry.contains(BASE_KIND));
		assert_eq!(registry.tags(), vec!["Node"]);
	}

	#[test]
	fn unknown_tag_is_an_error() {
		let registry = KindRegistry::new();
		assert_eq!(
			registry.get("Queue").unwrap_err(),
			EditorError::UnknownKind {
				kind: "Queue".into()
			}
		);
	}

	#[test]
	fn builtin_kinds_fill_missing_defaults_only() {
		let registry = KindRegistry::with_builtin_kinds();

		let mut props = Properties::new();
		registry.get("Database").unwrap().init(&mut props);
		assert_eq!(props["category"], json!("relational"));

		let mut props = Properties::new();
		props.insert("language".into(), json!("rust"));
		registry.get("WebApplication").unwrap().init(&mut props);
		assert_eq!(props["language"], json!("rust"));
	}

	#[test]
	fn register_replaces_existing_tag() {
		let mut registry = KindRegistry::new();
		assert!(registry.register("Queue", NodeKind::default()).is_none());
		assert!(
			registry
				.register("Queue", NodeKind::default().with_init(database_init))
				.is_some()
		);
		assert_eq!(registry.tags(), vec!["Node", "Queue"]);
	}

	#[test]
	fn escape_html_covers_markup_characters() {
		assert_eq!(
			escape_html("<a href=\"x\">&'"),
			"&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
		);
	}
}
