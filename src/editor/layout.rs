//! Force-directed layout.
//!
//! Each tick sums three forces per node: inverse-distance repulsion between every
//! pair, a spring along every link pulling toward `link_distance`, and a weak pull
//! toward the canvas center. Forces are scaled by a cooling factor `alpha` that
//! decays every tick, so a graph left alone always comes to rest. Pinned nodes
//! still push and pull on their neighbours but are never moved by the simulation.

use std::collections::HashMap;
use std::f64::consts::TAU;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::model::GraphModel;
use super::types::{NodeId, Position};

/// Floor for pair distances so repulsion stays finite.
const MIN_DISTANCE: f64 = 1.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Simulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
	/// Canvas width; the centering force pulls toward `width / 2`.
	pub width: f64,
	/// Canvas height; the centering force pulls toward `height / 2`.
	pub height: f64,
	/// Pairwise charge. Negative values repel.
	pub charge: f64,
	/// Rest length of link springs.
	pub link_distance: f64,
	/// Spring stiffness.
	pub link_strength: f64,
	/// Strength of the pull toward the center.
	pub gravity: f64,
	/// Fraction of velocity kept after each step.
	pub friction: f64,
	/// Integration step.
	pub time_step: f64,
	/// Cap on the net force applied to one node per tick.
	pub max_force: f64,
	/// Cooling factor after a start or perturbation.
	pub alpha_start: f64,
	/// Multiplier applied to alpha every tick.
	pub alpha_decay: f64,
	/// Alpha below which forces are switched off.
	pub alpha_min: f64,
	/// Total kinetic energy below which the layout counts as settled.
	pub energy_threshold: f64,
	/// Seed for initial placement.
	pub seed: u64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			width: 960.0,
			height: 500.0,
			charge: -800.0,
			link_distance: 100.0,
			link_strength: 0.1,
			gravity: 0.1,
			friction: 0.6,
			time_step: 1.0,
			max_force: 10.0,
			alpha_start: 1.0,
			alpha_decay: 0.98,
			alpha_min: 0.001,
			energy_threshold: 0.01,
			seed: 0,
		}
	}
}

impl LayoutParams {
	/// Point the centering force pulls toward.
	pub fn center(&self) -> Position {
		Position::new(self.width / 2.0, self.height / 2.0)
	}
}

/// Whether [`ForceLayout::tick`] did any work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutStatus {
	/// Nodes are still moving.
	Running,
	/// Kinetic energy is below threshold; ticks are no-ops until perturbed.
	Settled,
	/// Stepping is suspended.
	Paused,
}

/// Force simulation state. Positions themselves live on the model's nodes.
#[derive(Clone, Debug)]
pub struct ForceLayout {
	params: LayoutParams,
	velocities: HashMap<NodeId, (f64, f64)>,
	alpha: f64,
	energy: f64,
	ticks: u64,
	settled: bool,
	paused: bool,
	rng: StdRng,
}

impl Default for ForceLayout {
	fn default() -> Self {
		Self::new(LayoutParams::default())
	}
}

impl ForceLayout {
	/// A running layout with the given parameters.
	pub fn new(params: LayoutParams) -> Self {
		Self {
			alpha: params.alpha_start,
			rng: StdRng::seed_from_u64(params.seed),
			params,
			velocities: HashMap::new(),
			energy: 0.0,
			ticks: 0,
			settled: false,
			paused: false,
		}
	}

	/// Current parameters.
	pub fn params(&self) -> &LayoutParams {
		&self.params
	}

	/// Change the canvas size the centering force uses.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.params.width = width;
		self.params.height = height;
		self.perturb();
	}

	/// Current cooling factor.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Kinetic energy after the last step.
	pub fn energy(&self) -> f64 {
		self.energy
	}

	/// Integration steps run so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Current state.
	pub fn status(&self) -> LayoutStatus {
		if self.paused {
			LayoutStatus::Paused
		} else if self.settled {
			LayoutStatus::Settled
		} else {
			LayoutStatus::Running
		}
	}

	/// A starting point for a new node: somewhere on a ring around the center,
	/// drawn from the seeded generator.
	pub fn initial_position(&mut self) -> Position {
		let angle = self.rng.gen_range(0.0..TAU);
		let radius = self.rng.gen_range(0.5..1.0) * self.params.link_distance;
		self.params
			.center()
			.offset(radius * angle.cos(), radius * angle.sin())
	}

	/// Reheat and unpause.
	pub fn start(&mut self) {
		if self.paused {
			debug!("Layout resumed by start");
		}
		self.paused = false;
		self.perturb();
	}

	/// Suspend stepping without losing velocities.
	pub fn pause(&mut self) {
		if !self.paused {
			debug!("Layout paused at tick {}", self.ticks);
		}
		self.paused = true;
	}

	/// Undo [`pause`](Self::pause).
	pub fn resume(&mut self) {
		self.paused = false;
	}

	/// Freeze every node where it is and mark the layout settled.
	pub fn stop(&mut self) {
		self.alpha = 0.0;
		self.energy = 0.0;
		self.velocities.clear();
		self.settled = true;
	}

	/// Wake the simulation after a topology change, drag or pin change.
	pub fn perturb(&mut self) {
		self.settled = false;
		self.alpha = self.alpha.max(self.params.alpha_start);
	}

	/// Hold `id` at `at`, out of the integration.
	pub fn pin(&mut self, model: &mut GraphModel, id: NodeId, at: Position) -> Result<()> {
		let node = model.node_mut(id)?;
		node.set_position(at);
		node.set_pinned(true);
		self.velocities.remove(&id);
		self.perturb();
		Ok(())
	}

	/// Hand `id` back to the simulation from where it currently is.
	pub fn unpin(&mut self, model: &mut GraphModel, id: NodeId) -> Result<()> {
		model.node_mut(id)?.set_pinned(false);
		self.velocities.remove(&id);
		self.perturb();
		Ok(())
	}

	/// Shift a node by `(dx, dy)`, pinning it where it stands first if needed.
	pub fn move_pinned(
		&mut self,
		model: &mut GraphModel,
		id: NodeId,
		dx: f64,
		dy: f64,
	) -> Result<Position> {
		let node = model.node_mut(id)?;
		let moved = node.position().offset(dx, dy);
		node.set_position(moved);
		node.set_pinned(true);
		self.velocities.remove(&id);
		self.perturb();
		Ok(moved)
	}

	/// Run one integration step over `model`.
	pub fn tick(&mut self, model: &mut GraphModel) -> LayoutStatus {
		if self.paused {
			return LayoutStatus::Paused;
		}
		if self.settled {
			return LayoutStatus::Settled;
		}

		let ids: Vec<NodeId> = model.nodes().map(|node| node.id()).collect();
		let pinned: Vec<bool> = model.nodes().map(|node| node.is_pinned()).collect();
		let mut positions: Vec<Position> = model.nodes().map(|node| node.position()).collect();
		let index: HashMap<NodeId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
		let mut forces = vec![(0.0, 0.0); ids.len()];

		for i in 0..ids.len() {
			for j in i + 1..ids.len() {
				let (ux, uy, d) = separation(positions[j], positions[i], i * 31 + j);
				let k = -self.params.charge / d.max(MIN_DISTANCE);
				forces[i].0 += k * ux;
				forces[i].1 += k * uy;
				forces[j].0 -= k * ux;
				forces[j].1 -= k * uy;
			}
		}

		for link in model.links() {
			let (Some(&s), Some(&t)) = (index.get(&link.source()), index.get(&link.target()))
			else {
				continue;
			};
			let (ux, uy, d) = separation(positions[s], positions[t], s * 31 + t);
			let k = self.params.link_strength * (d - self.params.link_distance);
			forces[s].0 += k * ux;
			forces[s].1 += k * uy;
			forces[t].0 -= k * ux;
			forces[t].1 -= k * uy;
		}

		let center = self.params.center();
		let (dt, friction) = (self.params.time_step, self.params.friction);
		let mut velocities = HashMap::with_capacity(ids.len());
		let mut energy = 0.0;
		for (i, &id) in ids.iter().enumerate() {
			if pinned[i] {
				continue;
			}
			let p = positions[i];
			let mut fx = (forces[i].0 + self.params.gravity * (center.x - p.x)) * self.alpha;
			let mut fy = (forces[i].1 + self.params.gravity * (center.y - p.y)) * self.alpha;
			let magnitude = fx.hypot(fy);
			if magnitude > self.params.max_force {
				let scale = self.params.max_force / magnitude;
				fx *= scale;
				fy *= scale;
			}

			let (vx, vy) = self.velocities.get(&id).copied().unwrap_or_default();
			let (vx, vy) = ((vx + fx * dt) * friction, (vy + fy * dt) * friction);
			positions[i] = p.offset(vx * dt, vy * dt);
			energy += 0.5 * (vx * vx + vy * vy);
			velocities.insert(id, (vx, vy));
		}

		for (node, position) in model.nodes_mut().zip(&positions) {
			if !node.is_pinned() {
				node.set_position(*position);
			}
		}

		self.velocities = velocities;
		self.energy = energy;
		self.ticks += 1;
		self.alpha *= self.params.alpha_decay;
		if self.alpha < self.params.alpha_min {
			self.alpha = 0.0;
		}

		if energy < self.params.energy_threshold {
			debug!("Layout settled after {} ticks", self.ticks);
			self.settled = true;
			LayoutStatus::Settled
		} else {
			LayoutStatus::Running
		}
	}
}

/// Unit vector from `from` to `to` and their distance. Coincident points get a
/// direction derived from `salt` so they separate deterministically.
fn separation(from: Position, to: Position, salt: usize) -> (f64, f64, f64) {
	let (dx, dy) = (to.x - from.x, to.y - from.y);
	let d = dx.hypot(dy);
	if d < f64::EPSILON {
		let angle = salt as f64 * GOLDEN_ANGLE;
		return (angle.cos(), angle.sin(), 0.0);
	}
	(dx / d, dy / d, d)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::editor::model::NodeSpec;
	use crate::editor::types::Properties;

	/// Deterministic pseudo-random sequence for building test graphs.
	fn rand_simple(seed: usize) -> f64 {
		let x = ((seed + 1) * 9301 + 49297) % 233280;
		(x as f64) / 233280.0
	}

	fn random_tree(layout: &mut ForceLayout, n: usize) -> GraphModel {
		let mut model = GraphModel::new();
		let ids: Vec<NodeId> = (0..n)
			.map(|i| {
				let at = layout.initial_position();
				model
					.add_node("Node", NodeSpec::new(format!("n{i}")).at(at))
					.unwrap()
			})
			.collect();
		for i in 1..n {
			let target = (rand_simple(i) * i as f64) as usize;
			model.add_link(ids[i], ids[target], Properties::new()).unwrap();
		}
		model
	}

	fn run_until_settled(layout: &mut ForceLayout, model: &mut GraphModel, limit: usize) -> usize {
		for step in 1..=limit {
			if layout.tick(model) == LayoutStatus::Settled {
				return step;
			}
		}
		panic!("layout did not settle within {limit} ticks");
	}

	#[test]
	fn fifty_nodes_settle_in_bounded_ticks() {
		let mut layout = ForceLayout::default();
		let mut model = random_tree(&mut layout, 50);
		run_until_settled(&mut layout, &mut model, 2000);
		assert_eq!(layout.status(), LayoutStatus::Settled);
		assert!(layout.energy() < layout.params().energy_threshold);

		let before = model.positions();
		assert_eq!(layout.tick(&mut model), LayoutStatus::Settled);
		assert_eq!(model.positions(), before, "settled ticks are no-ops");
	}

	#[test]
	fn energy_falls_monotonically_after_warm_up() {
		let mut layout = ForceLayout::default();
		let mut model = random_tree(&mut layout, 50);
		let mut energies = Vec::new();
		loop {
			let status = layout.tick(&mut model);
			energies.push(layout.energy());
			if status == LayoutStatus::Settled {
				break;
			}
			assert!(energies.len() < 2000, "layout did not settle");
		}

		// index of the first sample after the last rise
		let warm = energies
			.windows(2)
			.rposition(|pair| pair[1] >= pair[0])
			.map_or(0, |i| i + 1);
		assert!(warm < 100, "energy still rising at tick {}", warm + 1);
		assert!(
			energies.len() - warm > 100,
			"monotone tail only {} ticks long",
			energies.len() - warm
		);
		for pair in energies[warm..].windows(2) {
			assert!(pair[1] < pair[0], "energy rose from {} to {}", pair[0], pair[1]);
		}
	}

	#[test]
	fn identical_inputs_give_identical_layouts() {
		let mut first = ForceLayout::new(LayoutParams {
			seed: 7,
			..Default::default()
		});
		let mut second = ForceLayout::new(LayoutParams {
			seed: 7,
			..Default::default()
		});
		let mut a = random_tree(&mut first, 20);
		let mut b = random_tree(&mut second, 20);
		assert_eq!(a.positions().values().collect::<Vec<_>>(), b.positions().values().collect::<Vec<_>>());
		for _ in 0..100 {
			first.tick(&mut a);
			second.tick(&mut b);
		}
		assert_eq!(a.positions(), b.positions());
	}

	#[test]
	fn springs_pull_linked_nodes_toward_rest_length() {
		let mut layout = ForceLayout::default();
		let mut model = GraphModel::new();
		let center = layout.params().center();
		let a = model
			.add_node("Node", NodeSpec::new("a").at(center.offset(-300.0, 0.0)))
			.unwrap();
		let b = model
			.add_node("Node", NodeSpec::new("b").at(center.offset(300.0, 0.0)))
			.unwrap();
		model.add_link(a, b, Properties::new()).unwrap();
		run_until_settled(&mut layout, &mut model, 2000);

		let d = model
			.node(a)
			.unwrap()
			.position()
			.distance(model.node(b).unwrap().position());
		assert!(d < 300.0, "linked pair still {d} apart");
		assert!(d > layout.params().link_distance * 0.5, "pair collapsed to {d}");
	}

	#[test]
	fn pinned_node_stays_put_but_still_repels() {
		let mut layout = ForceLayout::default();
		let mut model = GraphModel::new();
		let center = layout.params().center();
		let anchor = model.add_node("Node", NodeSpec::new("anchor")).unwrap();
		let free = model
			.add_node("Node", NodeSpec::new("free").at(center.offset(10.0, 0.0)))
			.unwrap();
		layout.pin(&mut model, anchor, center).unwrap();
		run_until_settled(&mut layout, &mut model, 2000);

		assert_eq!(model.node(anchor).unwrap().position(), center);
		assert!(model.node(free).unwrap().position().distance(center) > 40.0);
	}

	#[test]
	fn coincident_nodes_separate() {
		let mut layout = ForceLayout::default();
		let mut model = GraphModel::new();
		let center = layout.params().center();
		let a = model.add_node("Node", NodeSpec::new("a").at(center)).unwrap();
		let b = model.add_node("Node", NodeSpec::new("b").at(center)).unwrap();
		layout.tick(&mut model);
		let (pa, pb) = (model.node(a).unwrap().position(), model.node(b).unwrap().position());
		assert!(pa.distance(pb) > 0.0);
		assert!(pa.x.is_finite() && pb.y.is_finite());
	}

	#[test]
	fn unpin_keeps_current_position() {
		let mut layout = ForceLayout::default();
		let mut model = GraphModel::new();
		let id = model.add_node("Node", NodeSpec::new("a")).unwrap();
		let spot = Position::new(12.0, 34.0);
		layout.pin(&mut model, id, spot).unwrap();
		layout.move_pinned(&mut model, id, 3.0, -4.0).unwrap();
		layout.unpin(&mut model, id).unwrap();

		let node = model.node(id).unwrap();
		assert!(!node.is_pinned());
		assert_eq!(node.position(), Position::new(15.0, 30.0));
	}

	#[test]
	fn pin_on_stale_node_fails() {
		let mut layout = ForceLayout::default();
		let mut model = GraphModel::new();
		let id = model.add_node("Node", NodeSpec::new("a")).unwrap();
		model.remove_node(id).unwrap();
		assert!(layout.pin(&mut model, id, Position::default()).is_err());
		assert!(layout.unpin(&mut model, id).is_err());
	}

	#[test]
	fn lifecycle_calls_are_idempotent() {
		let mut layout = ForceLayout::default();
		let mut model = random_tree(&mut layout, 5);

		layout.pause();
		layout.pause();
		assert_eq!(layout.tick(&mut model), LayoutStatus::Paused);
		assert_eq!(layout.ticks(), 0);

		layout.resume();
		assert_eq!(layout.tick(&mut model), LayoutStatus::Running);

		layout.stop();
		layout.stop();
		assert_eq!(layout.status(), LayoutStatus::Settled);
		assert_eq!(layout.tick(&mut model), LayoutStatus::Settled);

		layout.start();
		layout.start();
		assert_eq!(layout.status(), LayoutStatus::Running);
		assert_eq!(layout.alpha(), layout.params().alpha_start);
	}

	#[test]
	fn params_deserialize_with_defaults() {
		let params: LayoutParams =
			serde_json::from_str(r#"{"charge": -300.0, "seed": 42}"#).unwrap();
		assert_eq!(params.charge, -300.0);
		assert_eq!(params.seed, 42);
		assert_eq!(params.link_distance, 100.0);
	}
}
