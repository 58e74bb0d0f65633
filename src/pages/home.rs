use leptos::prelude::*;

use crate::components::force_graph::ForceGraphEditor;
use crate::demo;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphEditor populate=demo::populate fullscreen=true />
				<div class="graph-overlay">
					<h1>"Topology Editor"</h1>
					<p class="subtitle">
						"Drag nodes to pin them. Shift-drag from one node to another to link them. Click to inspect."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
