//! A small three-tier topology used by the home page and the headless binary.

use serde_json::json;

use crate::editor::{EditorSession, NodeSpec, Properties, Result};

/// Fill `session` with a web front end, two services and their databases.
pub fn populate(session: &mut EditorSession) -> Result<()> {
	let shop = session.add_node(
		"WebApplication",
		NodeSpec::new("shop").label("Web Shop").property("language", "rust"),
	)?;
	let orders = session.add_node(
		"RestService",
		NodeSpec::new("orders-api")
			.label("Orders API")
			.property("endpoint", "/orders"),
	)?;
	let catalog = session.add_node(
		"RestService",
		NodeSpec::new("catalog-api")
			.label("Catalog API")
			.property("endpoint", "/products"),
	)?;
	let orders_db = session.add_node("Database", NodeSpec::new("orders-db").label("Orders DB"))?;
	let catalog_db = session.add_node(
		"Database",
		NodeSpec::new("catalog-db")
			.label("Catalog DB")
			.property("category", "document"),
	)?;
	let cache = session.add_node("Node", NodeSpec::new("cache").label("Cache"))?;

	let mut http = Properties::new();
	http.insert("protocol".into(), json!("http"));
	session.add_link(shop, orders, http.clone())?;
	session.add_link(shop, catalog, http)?;
	session.add_link(orders, orders_db, Properties::new())?;
	session.add_link(catalog, catalog_db, Properties::new())?;
	session.add_link(catalog, cache, Properties::new())?;
	Ok(())
}
