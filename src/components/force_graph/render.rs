use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;
use crate::editor::Entity;

/// Gap between the arrow tip and the target node's rim.
const ARROW_GAP: f64 = 4.0;

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_drag_line(state, ctx);
	ctx.restore();
}

fn draw_links(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let model = state.session.model();
	let radius = state.session.config().node_radius;
	let k = state.transform.k;
	let (line_width, arrow_size) = (1.5 / k, 8.0 / k);
	let open = state.session.gestures().open_popover();

	for link in model.links() {
		let (Ok(source), Ok(target)) = (model.node(link.source()), model.node(link.target()))
		else {
			continue;
		};
		let (p1, p2) = (source.position(), target.position());
		let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let alpha = if open == Some(Entity::Link(link.id())) {
			1.0
		} else {
			0.6
		};

		let (ux, uy) = (dx / dist, dy / dist);
		let target_padding = radius + ARROW_GAP;
		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", alpha));
		ctx.set_line_width(line_width);
		ctx.begin_path();
		ctx.move_to(p1.x + ux * radius, p1.y + uy * radius);
		ctx.line_to(
			p2.x - ux * (target_padding + arrow_size),
			p2.y - uy * (target_padding + arrow_size),
		);
		ctx.stroke();

		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {})", alpha));
		let (tip_x, tip_y) = (p2.x - ux * target_padding, p2.y - uy * target_padding);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let session = &state.session;
	let radius = session.config().node_radius;
	let k = state.transform.k;
	let open = session.gestures().open_popover();

	for node in session.model().nodes() {
		let Ok(decoration) = session.decoration(node.id()) else {
			continue;
		};
		let p = node.position();

		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&decoration.color);
		ctx.fill();

		if node.is_pinned() || open == Some(Entity::Node(node.id())) {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		ctx.set_text_align("center");
		ctx.set_fill_style_str("white");
		ctx.set_font(&format!("bold {}px sans-serif", 11.0 / k.max(0.5)));
		let _ = ctx.fill_text(&decoration.badge, p.x, p.y + 4.0);

		ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
		ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
		let _ = ctx.fill_text(node.label(), p.x, p.y + radius + 12.0);
	}
}

fn draw_drag_line(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let Some((from, to)) = state.overlay.borrow().drag_line else {
		return;
	};
	let k = state.transform.k;
	ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
	ctx.set_line_width(1.5 / k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(8.0 / k),
		&JsValue::from_f64(4.0 / k),
	));
	ctx.begin_path();
	ctx.move_to(from.x, from.y);
	ctx.line_to(to.x, to.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}
