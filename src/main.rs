// library-only dependencies, named here for `unused_crate_dependencies`
use {log as _, rand as _, serde as _, thiserror as _};
#[cfg(target_arch = "wasm32")]
use {
	console_error_panic_hook as _, console_log as _, js_sys as _, leptos_meta as _,
	leptos_router as _, serde_json as _, wasm_bindgen as _, web_sys as _,
};

#[cfg(target_arch = "wasm32")]
fn main() {
	force_graph_editor::init_logging();
	leptos::mount::mount_to_body(force_graph_editor::App);
}

/// Lay out the sample topology headless and print the exported graph.
#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
	use force_graph_editor::demo;
	use force_graph_editor::editor::{
		EditorSession, KindRegistry, LayoutStatus, NoopBridge, SessionConfig,
	};

	let mut session = EditorSession::create(
		SessionConfig::default(),
		KindRegistry::with_builtin_kinds(),
		NoopBridge,
	);
	demo::populate(&mut session)?;
	while session.tick() == LayoutStatus::Running {}

	let model = session.dispose();
	println!("{}", serde_json::to_string_pretty(&model.export())?);
	for node in model.nodes() {
		let p = node.position();
		println!("{:>12} ({:8.1}, {:8.1})", node.name(), p.x, p.y);
	}
	Ok(())
}
