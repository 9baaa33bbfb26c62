//! The race state machine and its per-frame simulation.
//!
//! A `RaceSession` is driven by three independent clocks: `step` once per
//! rendered frame, `clock_tick` once per second and `sync_tick` at the sync
//! interval. Inputs arrive as `Command`s through `apply`. Nothing in here
//! blocks or fails; commands that do not fit the current phase are ignored.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chatter::{self, Chatter, ChatterContext, DispatchEvent, LineSource, RadioLine};
use crate::collision::{first_contact, ContactBox};
use crate::config::{RaceConfig, PLAYER_ID};
use crate::environment::{lighting_at, Lighting};
use crate::heat::Heat;
use crate::kinematics::{distance_step, integrate_speed, spoiler_angle, Controls};
use crate::lane::{off_road, steer, Steer};
use crate::leaderboard::{self, Entrant, FinishBoard, FinishRecord, Standing};
use crate::npc::{Npc, NpcEvent, PlayerFrame, VehicleKind};

pub type SessionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "count", rename_all = "snake_case")]
pub enum Phase {
	OnGrid,
	Countdown(u8),
	Racing,
	Crashed,
	Busted,
	Finished,
}

impl Phase {
	pub fn is_terminal(self) -> bool {
		matches!(self, Phase::Crashed | Phase::Busted | Phase::Finished)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Command {
	Accelerate(bool),
	Brake(bool),
	SteerLeft,
	SteerRight,
	StartGrid,
	Restart,
	/// Contact reported by an external physics front-end.
	Collide(VehicleKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceEvent {
	Countdown { remaining: u8 },
	RaceStarted,
	Crashed { speed: f32 },
	Busted { by: Option<String> },
	Finished { time_seconds: f32 },
	RivalFinished { racer_id: String, time_seconds: f32 },
	PoliceActivated { id: String },
	PoliceRecycled { id: String },
	Radio(RadioLine),
	Restarted { session: SessionId },
}

/// Authoritative simulation state, advanced every frame.
#[derive(Debug, Clone)]
pub struct LiveState {
	pub phase: Phase,
	pub speed: f32,
	pub lane: f32,
	pub distance: f32,
	pub heat: Heat,
	pub elapsed_time: u32,
	pub spoiler_angle: f32,
	pub controls: Controls,
	pub npcs: Vec<Npc>,
}

impl LiveState {
	fn initial(cfg: &RaceConfig) -> Self {
		Self {
			phase: Phase::OnGrid,
			speed: 0.0,
			lane: 0.0,
			distance: 0.0,
			heat: Heat::default(),
			elapsed_time: 0,
			spoiler_angle: 0.0,
			controls: Controls::default(),
			npcs: cfg.grid.iter().map(Npc::from_spec).collect(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcView {
	pub id: String,
	pub kind: VehicleKind,
	pub lane: f32,
	pub offset: f32,
	pub active: bool,
}

/// Throttled copy of the race published for renderers and the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	pub session: SessionId,
	pub phase: Phase,
	pub speed: f32,
	pub lane: f32,
	pub distance: f32,
	pub heat: f32,
	pub wanted: bool,
	pub elapsed_time: u32,
	pub spoiler_angle: f32,
	pub rank: u32,
	pub npcs: Vec<NpcView>,
	pub finish_times: Vec<FinishRecord>,
	pub leaderboard: Vec<Standing>,
	pub lighting: Lighting,
	pub radio: Vec<RadioLine>,
}

pub struct RaceSession {
	cfg: RaceConfig,
	id: SessionId,
	live: LiveState,
	published: Snapshot,
	finishes: FinishBoard,
	chatter: Chatter,
	events: Vec<RaceEvent>,
	rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for RaceSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RaceSession")
			.field("id", &self.id)
			.field("live", &self.live)
			.field("finishes", &self.finishes)
			.finish_non_exhaustive()
	}
}

fn fresh_id(rng: &mut dyn RngCore) -> SessionId {
	let mut bytes = [0u8; 16];
	rng.fill_bytes(&mut bytes);
	uuid::Builder::from_random_bytes(bytes).into_uuid()
}

impl RaceSession {
	pub fn new(cfg: RaceConfig) -> Self {
		Self::with_rng(cfg, Box::new(StdRng::from_entropy()))
	}

	/// Session drawing police respawn lanes, radio picks and ids from `rng`.
	pub fn with_rng(cfg: RaceConfig, mut rng: Box<dyn RngCore + Send>) -> Self {
		let id = fresh_id(rng.as_mut());
		let live = LiveState::initial(&cfg);
		let mut session = Self {
			published: placeholder_snapshot(id),
			id,
			live,
			finishes: FinishBoard::default(),
			chatter: Chatter::default(),
			events: Vec::new(),
			rng,
			cfg,
		};
		session.publish();
		session
	}

	pub fn with_line_source(mut self, source: Box<dyn LineSource>) -> Self {
		self.chatter = Chatter::new(source);
		self
	}

	pub fn id(&self) -> SessionId {
		self.id
	}

	pub fn config(&self) -> &RaceConfig {
		&self.cfg
	}

	pub fn phase(&self) -> Phase {
		self.live.phase
	}

	pub fn live(&self) -> &LiveState {
		&self.live
	}

	/// Last state committed by `sync_tick`.
	pub fn snapshot(&self) -> &Snapshot {
		&self.published
	}

	pub fn finish_records(&self) -> &[FinishRecord] {
		self.finishes.records()
	}

	pub fn drain_events(&mut self) -> Vec<RaceEvent> {
		std::mem::take(&mut self.events)
	}

	/// Apply one input command. Returns whether it changed anything.
	pub fn apply(&mut self, cmd: Command) -> bool {
		let changed = match cmd {
			Command::Accelerate(on) => {
				let changed = self.live.controls.accelerating != on;
				self.live.controls.accelerating = on;
				changed
			}
			Command::Brake(on) => {
				let changed = self.live.controls.braking != on;
				self.live.controls.braking = on;
				changed
			}
			Command::SteerLeft => self.steer(Steer::Left),
			Command::SteerRight => self.steer(Steer::Right),
			Command::StartGrid => {
				if self.live.phase == Phase::OnGrid {
					let count = self.cfg.countdown_from;
					self.enter(Phase::Countdown(count));
					self.events.push(RaceEvent::Countdown { remaining: count });
					true
				} else {
					false
				}
			}
			Command::Restart => {
				if self.live.phase == Phase::OnGrid {
					false
				} else {
					self.restart();
					true
				}
			}
			Command::Collide(kind) => self.collide(kind, None),
		};
		if !changed {
			debug!(session = %self.id, ?cmd, phase = ?self.live.phase, "command ignored");
		}
		changed
	}

	fn steer(&mut self, dir: Steer) -> bool {
		if self.live.phase.is_terminal() {
			return false;
		}
		let next = steer(self.live.lane, dir, self.cfg.lane_step, self.cfg.lane_bound);
		let changed = next != self.live.lane;
		self.live.lane = next;
		changed
	}

	fn collide(&mut self, kind: VehicleKind, by: Option<String>) -> bool {
		if self.live.phase != Phase::Racing {
			return false;
		}
		let speed = self.live.speed;
		match kind {
			VehicleKind::Rival if speed > self.cfg.crash_min_speed => {
				self.enter(Phase::Crashed);
				self.events.push(RaceEvent::Crashed { speed });
				true
			}
			VehicleKind::Police if speed > self.cfg.bust_min_speed => {
				self.enter(Phase::Busted);
				self.live.heat.max_out();
				self.events.push(RaceEvent::Busted { by });
				self.radio(chatter::scripted_line(DispatchEvent::Ramming));
				true
			}
			_ => false,
		}
	}

	fn enter(&mut self, phase: Phase) {
		let from = self.live.phase;
		self.live.phase = phase;
		info!(session = %self.id, ?from, to = ?phase, speed = self.live.speed, "phase change");
	}

	fn radio(&mut self, line: RadioLine) {
		self.chatter.push(line.clone());
		self.events.push(RaceEvent::Radio(line));
	}

	fn restart(&mut self) {
		self.id = fresh_id(self.rng.as_mut());
		info!(session = %self.id, from = ?self.live.phase, "race restarted");
		self.live = LiveState::initial(&self.cfg);
		self.finishes.clear();
		self.chatter.reset();
		self.events.push(RaceEvent::Restarted { session: self.id });
		self.publish();
	}

	/// Frame tick: integrate the player, move NPCs and test for contact.
	pub fn step(&mut self, dt: f32) {
		if !(dt.is_finite() && dt > 0.0) {
			return;
		}
		let frames = dt * self.cfg.reference_fps;
		let live = &mut self.live;
		live.speed = integrate_speed(
			live.speed,
			live.controls,
			live.phase,
			frames,
			&self.cfg.handling,
			self.cfg.max_speed,
		);
		live.spoiler_angle = spoiler_angle(live.speed);

		if live.phase != Phase::Racing {
			return;
		}
		live.distance += distance_step(live.speed, dt, self.cfg.distance_scale);

		let player = PlayerFrame { speed: live.speed, lane: live.lane, dt, frames };
		let mut npc_events = Vec::new();
		for npc in &mut live.npcs {
			if let Some(event) = npc.advance(player, &self.cfg, self.rng.as_mut()) {
				npc_events.push((npc.id.clone(), npc.kind(), event));
			}
		}
		for (id, kind, event) in npc_events {
			match (kind, event) {
				(VehicleKind::Police, NpcEvent::Activated) => {
					info!(session = %self.id, unit = %id, "police unit in pursuit");
					self.events.push(RaceEvent::PoliceActivated { id });
					self.radio(chatter::scripted_line(DispatchEvent::PursuitStart));
				}
				(VehicleKind::Police, NpcEvent::Recycled) => {
					debug!(session = %self.id, unit = %id, "police unit set up a new ambush");
					self.events.push(RaceEvent::PoliceRecycled { id });
					self.radio(chatter::scripted_line(DispatchEvent::CarLost));
				}
				(_, event) => debug!(session = %self.id, npc = %id, ?event, "npc"),
			}
		}

		if off_road(self.live.lane, self.live.speed, self.cfg.off_road_lane, self.cfg.off_road_speed) {
			self.collide(VehicleKind::Rival, None);
			return;
		}
		let contact = ContactBox {
			half_width: self.cfg.collision_half_width,
			half_length: self.cfg.collision_half_length,
		};
		let hit = first_contact(contact, self.live.lane, &self.live.npcs)
			.map(|(kind, npc)| (kind, npc.id.clone()));
		if let Some((kind, id)) = hit {
			self.collide(kind, Some(id));
		}
	}

	/// One-second race clock: countdown, then elapsed race time.
	pub fn clock_tick(&mut self) {
		match self.live.phase {
			Phase::Countdown(0) => {
				self.enter(Phase::Racing);
				self.events.push(RaceEvent::RaceStarted);
			}
			Phase::Countdown(n) => {
				self.live.phase = Phase::Countdown(n - 1);
				self.events.push(RaceEvent::Countdown { remaining: n - 1 });
			}
			Phase::Racing => self.live.elapsed_time += 1,
			_ => {}
		}
	}

	/// Sync tick: heat, finish line, radio, then publish the snapshot.
	pub fn sync_tick(&mut self) {
		if self.live.phase == Phase::Racing {
			let interval = self.cfg.sync_interval();
			let was_wanted = self.live.heat.is_wanted(self.cfg.wanted_heat);
			self.live.heat.accrue(self.live.speed, self.cfg.heat_speed, self.cfg.heat_rate, interval);
			if !was_wanted && self.live.heat.is_wanted(self.cfg.wanted_heat) {
				info!(session = %self.id, heat = self.live.heat.value(), "player is wanted");
				self.radio(chatter::scripted_line(DispatchEvent::SpikeStrip));
			}
			self.record_rival_finishes();
			self.check_finish();
		}
		if self.live.phase == Phase::Racing {
			let ctx = ChatterContext {
				speed: self.live.speed,
				heat: self.live.heat.value(),
				rank: self.rank(),
			};
			let binned = chatter::intensity(ctx.speed, self.cfg.max_speed, ctx.heat);
			let spoken = self.chatter.tick(self.cfg.sync_interval_ms, binned, &ctx, self.rng.as_mut());
			if let Some(line) = spoken {
				debug!(session = %self.id, situation = ctx.situation(), sender = %line.sender, "radio");
				self.events.push(RaceEvent::Radio(line));
			}
		}
		self.publish();
	}

	fn check_finish(&mut self) {
		if self.live.phase != Phase::Racing || self.live.distance < self.cfg.race_length {
			return;
		}
		let time = self.live.elapsed_time as f32;
		if self.finishes.record(PLAYER_ID, &self.cfg.player_name, time) {
			self.enter(Phase::Finished);
			self.events.push(RaceEvent::Finished { time_seconds: time });
		}
	}

	fn record_rival_finishes(&mut self) {
		let time = self.live.elapsed_time as f32;
		let mut crossed = Vec::new();
		for npc in &self.live.npcs {
			let Some(distance) = npc.course_distance() else {
				continue;
			};
			if self.finishes.has_finished(&npc.id) || distance < self.cfg.race_length {
				continue;
			}
			self.finishes.record(&npc.id, &npc.display_name, time);
			info!(session = %self.id, rival = %npc.id, time, "rival crossed the line");
			crossed.push(npc.id.clone());
		}
		for racer_id in crossed {
			self.events.push(RaceEvent::RivalFinished { racer_id, time_seconds: time });
			self.radio(chatter::scripted_line(DispatchEvent::Taunt));
		}
	}

	/// Live race position of the player among rivals, by course distance.
	/// Rival offsets are recycled for display and do not move the ranking.
	pub fn rank(&self) -> u32 {
		let ahead = self
			.live
			.npcs
			.iter()
			.filter_map(Npc::course_distance)
			.filter(|d| *d > self.live.distance)
			.count();
		ahead as u32 + 1
	}

	pub fn leaderboard(&self) -> Vec<Standing> {
		let player = Entrant {
			racer_id: PLAYER_ID,
			display_name: &self.cfg.player_name,
			base_speed: self.live.speed.max(1.0),
		};
		let rivals = self.live.npcs.iter().filter(|n| n.kind() == VehicleKind::Rival).map(|n| Entrant {
			racer_id: &n.id,
			display_name: &n.display_name,
			base_speed: n.base_speed,
		});
		leaderboard::resolve(
			std::iter::once(player).chain(rivals),
			&self.finishes,
			self.cfg.race_length,
			self.cfg.projection_factor,
		)
	}

	fn publish(&mut self) {
		let live = &self.live;
		self.published = Snapshot {
			session: self.id,
			phase: live.phase,
			speed: live.speed,
			lane: live.lane,
			distance: live.distance,
			heat: live.heat.value(),
			wanted: live.heat.is_wanted(self.cfg.wanted_heat),
			elapsed_time: live.elapsed_time,
			spoiler_angle: live.spoiler_angle,
			rank: self.rank(),
			npcs: live
				.npcs
				.iter()
				.map(|n| NpcView {
					id: n.id.clone(),
					kind: n.kind(),
					lane: n.lane,
					offset: n.offset,
					active: n.is_active(),
				})
				.collect(),
			finish_times: self.finishes.records().to_vec(),
			leaderboard: self.leaderboard(),
			lighting: lighting_at(live.elapsed_time),
			radio: self.chatter.log().cloned().collect(),
		};
	}
}

fn placeholder_snapshot(session: SessionId) -> Snapshot {
	Snapshot {
		session,
		phase: Phase::OnGrid,
		speed: 0.0,
		lane: 0.0,
		distance: 0.0,
		heat: 0.0,
		wanted: false,
		elapsed_time: 0,
		spoiler_angle: 0.0,
		rank: 1,
		npcs: Vec::new(),
		finish_times: Vec::new(),
		leaderboard: Vec::new(),
		lighting: lighting_at(0),
		radio: Vec::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::npc::NpcSpec;

	fn session_with(cfg: RaceConfig) -> RaceSession {
		RaceSession::with_rng(cfg, Box::new(StdRng::seed_from_u64(42)))
	}

	fn empty_track() -> RaceConfig {
		RaceConfig { grid: Vec::new(), ..RaceConfig::default() }
	}

	fn racing(cfg: RaceConfig) -> RaceSession {
		let mut s = session_with(cfg);
		s.apply(Command::StartGrid);
		for _ in 0..4 {
			s.clock_tick();
		}
		assert_eq!(s.phase(), Phase::Racing);
		s
	}

	#[test]
	fn countdown_holds_go_for_one_tick() {
		let mut s = session_with(empty_track());
		assert!(s.apply(Command::StartGrid));
		assert_eq!(s.phase(), Phase::Countdown(3));
		s.clock_tick();
		s.clock_tick();
		s.clock_tick();
		assert_eq!(s.phase(), Phase::Countdown(0));
		s.clock_tick();
		assert_eq!(s.phase(), Phase::Racing);
		let events = s.drain_events();
		assert_eq!(events.first(), Some(&RaceEvent::Countdown { remaining: 3 }));
		assert_eq!(events.last(), Some(&RaceEvent::RaceStarted));
	}

	#[test]
	fn start_grid_only_from_grid() {
		let mut s = racing(empty_track());
		assert!(!s.apply(Command::StartGrid));
		assert_eq!(s.phase(), Phase::Racing);
	}

	#[test]
	fn elapsed_time_counts_only_while_racing() {
		let mut s = session_with(empty_track());
		s.clock_tick();
		assert_eq!(s.live().elapsed_time, 0);
		let mut s = racing(empty_track());
		s.clock_tick();
		s.clock_tick();
		assert_eq!(s.live().elapsed_time, 2);
	}

	#[test]
	fn rival_contact_needs_speed() {
		let mut s = racing(empty_track());
		s.live.speed = 20.0;
		assert!(!s.apply(Command::Collide(VehicleKind::Rival)));
		s.live.speed = 21.0;
		assert!(s.apply(Command::Collide(VehicleKind::Rival)));
		assert_eq!(s.phase(), Phase::Crashed);
	}

	#[test]
	fn police_contact_busts_and_maxes_heat() {
		let mut s = racing(empty_track());
		s.live.speed = 11.0;
		assert!(s.apply(Command::Collide(VehicleKind::Police)));
		assert_eq!(s.phase(), Phase::Busted);
		assert_eq!(s.live().heat.value(), 100.0);
		let events = s.drain_events();
		assert!(events.iter().any(|e| matches!(e, RaceEvent::Busted { .. })));
		assert!(events.iter().any(|e| matches!(e, RaceEvent::Radio(_))));
	}

	#[test]
	fn terminal_phase_ignores_everything_but_decay() {
		let mut s = racing(empty_track());
		s.live.speed = 200.0;
		s.live.lane = 4.0;
		s.apply(Command::Collide(VehicleKind::Rival));
		assert_eq!(s.phase(), Phase::Crashed);

		assert!(!s.apply(Command::Collide(VehicleKind::Police)));
		assert!(!s.apply(Command::SteerLeft));
		s.apply(Command::Accelerate(true));
		let distance = s.live().distance;
		s.step(1.0 / 60.0);
		assert_eq!(s.phase(), Phase::Crashed);
		assert_eq!(s.live().lane, 4.0);
		assert!((s.live().speed - 192.0).abs() < 1e-3);
		assert_eq!(s.live().distance, distance);
		assert_eq!(s.live().heat.value(), 0.0);
	}

	#[test]
	fn finish_records_player_once() {
		let mut s = racing(empty_track());
		s.live.elapsed_time = 95;
		s.live.distance = s.config().race_length;
		s.sync_tick();
		assert_eq!(s.phase(), Phase::Finished);
		assert_eq!(s.finish_records().len(), 1);
		assert_eq!(s.finish_records()[0].racer_id, PLAYER_ID);
		assert_eq!(s.finish_records()[0].finish_time_seconds, 95.0);

		s.live.elapsed_time = 120;
		s.sync_tick();
		s.sync_tick();
		assert_eq!(s.finish_records().len(), 1);
		let finishes = s.drain_events().into_iter().filter(|e| matches!(e, RaceEvent::Finished { .. })).count();
		assert_eq!(finishes, 1);
	}

	#[test]
	fn off_road_at_speed_crashes() {
		let mut s = racing(empty_track());
		s.live.speed = 120.0;
		s.live.controls.accelerating = true;
		for _ in 0..8 {
			s.apply(Command::SteerRight);
		}
		assert_eq!(s.live().lane, 16.0);
		s.step(1.0 / 60.0);
		assert_eq!(s.phase(), Phase::Crashed);
	}

	#[test]
	fn shoulder_is_safe_when_slow() {
		let mut s = racing(empty_track());
		for _ in 0..8 {
			s.apply(Command::SteerLeft);
		}
		s.live.speed = 40.0;
		s.step(1.0 / 60.0);
		assert_eq!(s.phase(), Phase::Racing);
	}

	#[test]
	fn npc_contact_in_lane_crashes() {
		let cfg = RaceConfig {
			grid: vec![NpcSpec::rival("rival-1", "RIVAL 1", 200.0, 0.0, 0.0)],
			..RaceConfig::default()
		};
		let mut s = racing(cfg);
		s.live.speed = 200.0;
		s.step(1.0 / 60.0);
		assert_eq!(s.phase(), Phase::Crashed);
	}

	#[test]
	fn snapshot_only_moves_on_sync() {
		let mut s = racing(empty_track());
		s.apply(Command::Accelerate(true));
		for _ in 0..30 {
			s.step(1.0 / 60.0);
		}
		assert!(s.live().speed > 0.0);
		assert_eq!(s.snapshot().speed, 0.0);
		s.sync_tick();
		assert_eq!(s.snapshot().speed, s.live().speed);
		assert_eq!(s.snapshot().phase, Phase::Racing);
	}

	#[test]
	fn restart_is_ignored_on_grid() {
		let mut s = session_with(empty_track());
		let id = s.id();
		assert!(!s.apply(Command::Restart));
		assert_eq!(s.id(), id);
	}

	#[test]
	fn restart_aborts_a_race_with_new_id() {
		let mut s = racing(RaceConfig::default());
		let id = s.id();
		s.live.speed = 300.0;
		s.step(0.5);
		assert!(s.apply(Command::Restart));
		assert_ne!(s.id(), id);
		assert_eq!(s.phase(), Phase::OnGrid);
		assert_eq!(s.live().speed, 0.0);
		assert_eq!(s.live().distance, 0.0);
		assert_eq!(s.snapshot().session, s.id());
	}

	#[test]
	fn rank_counts_rivals_ahead() {
		let mut s = racing(RaceConfig::default());
		assert_eq!(s.rank(), 1);
		for npc in &mut s.live.npcs {
			if let crate::npc::Behavior::Rival { distance } = &mut npc.behavior {
				*distance = 50.0;
			}
		}
		s.live.distance = 40.0;
		assert_eq!(s.rank(), 4);
		// display offsets, even far behind the player, do not affect rank
		for npc in &mut s.live.npcs {
			npc.offset = 100.0;
		}
		assert_eq!(s.rank(), 4);
	}

	#[test]
	fn becoming_wanted_calls_in_spike_strips() {
		let mut s = racing(empty_track());
		s.live.speed = 300.0;
		s.live.heat.accrue(300.0, 250.0, 1.0, 29.95);
		assert!(!s.live().heat.is_wanted(30.0));
		s.sync_tick();
		s.sync_tick();
		let spike = chatter::scripted_line(DispatchEvent::SpikeStrip);
		let lines: Vec<_> = s
			.drain_events()
			.into_iter()
			.filter_map(|e| match e {
				RaceEvent::Radio(line) => Some(line),
				_ => None,
			})
			.collect();
		assert_eq!(lines.iter().filter(|l| **l == spike).count(), 1);
		assert!(s.snapshot().wanted);
	}

	#[test]
	fn recycled_unit_reports_car_lost() {
		let cfg = RaceConfig {
			grid: vec![NpcSpec::police("police-1", "UNIT 16", 330.0, 18.0, -500.0)],
			..RaceConfig::default()
		};
		let mut s = racing(cfg);
		s.live.npcs[0].behavior = crate::npc::Behavior::Police { state: crate::npc::PoliceState::Active };
		s.live.npcs[0].offset = 151.0;
		s.step(1.0 / 60.0);
		let events = s.drain_events();
		assert!(events.iter().any(|e| matches!(e, RaceEvent::PoliceRecycled { id } if id == "police-1")));
		assert!(events.contains(&RaceEvent::Radio(chatter::scripted_line(DispatchEvent::CarLost))));
	}

	#[test]
	fn rival_finishing_first_taunts_once() {
		let cfg = RaceConfig {
			grid: vec![NpcSpec::rival("rival-1", "RIVAL 1", 280.0, -8.0, -15.0)],
			..RaceConfig::default()
		};
		let mut s = racing(cfg);
		s.live.elapsed_time = 40;
		if let crate::npc::Behavior::Rival { distance } = &mut s.live.npcs[0].behavior {
			*distance = s.cfg.race_length;
		}
		s.sync_tick();
		s.sync_tick();
		let events = s.drain_events();
		let finishes = events.iter().filter(|e| matches!(e, RaceEvent::RivalFinished { .. })).count();
		let taunt = RaceEvent::Radio(chatter::scripted_line(DispatchEvent::Taunt));
		assert_eq!(finishes, 1);
		assert_eq!(events.iter().filter(|e| **e == taunt).count(), 1);
		assert_eq!(s.finish_records()[0].racer_id, "rival-1");
		assert_eq!(s.phase(), Phase::Racing);
	}

	#[test]
	fn ignores_bad_frame_times() {
		let mut s = racing(empty_track());
		s.live.speed = 100.0;
		s.step(0.0);
		s.step(-1.0);
		s.step(f32::NAN);
		assert_eq!(s.live().speed, 100.0);
		assert_eq!(s.live().distance, 0.0);
	}
}
