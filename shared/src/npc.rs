//! Rival and police motion in player-relative road space.
//!
//! Offsets grow as the player drives past things: a negative offset is a car
//! further down the road, a positive one is behind the player.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::{PursuitTuning, RaceConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
	Rival,
	Police,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoliceState {
	Parked,
	Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
	Rival { distance: f32 },
	Police { state: PoliceState },
}

/// Starting grid entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcSpec {
	pub id: String,
	pub display_name: String,
	pub kind: VehicleKind,
	pub base_speed: f32,
	pub lane: f32,
	pub offset: f32,
}

impl NpcSpec {
	pub fn rival(id: &str, display_name: &str, base_speed: f32, lane: f32, offset: f32) -> Self {
		Self {
			id: id.to_string(),
			display_name: display_name.to_string(),
			kind: VehicleKind::Rival,
			base_speed,
			lane,
			offset,
		}
	}

	pub fn police(id: &str, display_name: &str, base_speed: f32, lane: f32, offset: f32) -> Self {
		Self {
			kind: VehicleKind::Police,
			..Self::rival(id, display_name, base_speed, lane, offset)
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
	pub id: String,
	pub display_name: String,
	pub base_speed: f32,
	pub lane: f32,
	pub offset: f32,
	pub behavior: Behavior,
}

/// Per-frame view of the player that NPCs react to.
#[derive(Debug, Clone, Copy)]
pub struct PlayerFrame {
	pub speed: f32,
	pub lane: f32,
	pub dt: f32,
	pub frames: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpcEvent {
	Activated,
	Recycled,
}

impl Npc {
	pub fn from_spec(spec: &NpcSpec) -> Self {
		let behavior = match spec.kind {
			VehicleKind::Rival => Behavior::Rival { distance: 0.0 },
			VehicleKind::Police => Behavior::Police { state: PoliceState::Parked },
		};
		Self {
			id: spec.id.clone(),
			display_name: spec.display_name.clone(),
			base_speed: spec.base_speed,
			lane: spec.lane,
			offset: spec.offset,
			behavior,
		}
	}

	pub fn kind(&self) -> VehicleKind {
		match self.behavior {
			Behavior::Rival { .. } => VehicleKind::Rival,
			Behavior::Police { .. } => VehicleKind::Police,
		}
	}

	/// Whether the car takes part in collisions.
	pub fn is_active(&self) -> bool {
		match self.behavior {
			Behavior::Rival { .. } => true,
			Behavior::Police { state } => state == PoliceState::Active,
		}
	}

	/// Course distance covered, rivals only.
	pub fn course_distance(&self) -> Option<f32> {
		match self.behavior {
			Behavior::Rival { distance } => Some(distance),
			Behavior::Police { .. } => None,
		}
	}

	pub fn advance(
		&mut self,
		player: PlayerFrame,
		cfg: &RaceConfig,
		rng: &mut dyn RngCore,
	) -> Option<NpcEvent> {
		let scale = player.dt * cfg.distance_scale;
		match &mut self.behavior {
			Behavior::Rival { distance } => {
				*distance += self.base_speed * scale;
				self.offset += (player.speed - self.base_speed) * scale;
				if self.offset > cfg.rival_recycle_behind {
					self.offset = cfg.rival_respawn_ahead;
					Some(NpcEvent::Recycled)
				} else if self.offset < cfg.rival_recycle_ahead {
					self.offset = cfg.rival_respawn_behind;
					Some(NpcEvent::Recycled)
				} else {
					None
				}
			}
			Behavior::Police { state } => match *state {
				PoliceState::Parked => {
					self.offset += player.speed * scale;
					if self.offset >= 0.0 {
						*state = PoliceState::Active;
						Some(NpcEvent::Activated)
					} else {
						None
					}
				}
				PoliceState::Active => {
					let tuning = &cfg.pursuit;
					let effective = pursuit_speed(self.offset, player.speed, self.base_speed, tuning);
					self.offset += (player.speed - effective) * scale;

					let rate = if self.offset < tuning.near_range {
						tuning.near_steer_rate
					} else {
						tuning.far_steer_rate
					};
					let blend = (rate * player.frames).min(1.0);
					self.lane += (player.lane - self.lane) * blend;

					if self.offset > tuning.recycle_above {
						self.offset = tuning.respawn_offset;
						self.lane = if rng.gen_bool(0.5) {
							tuning.shoulder_lane
						} else {
							-tuning.shoulder_lane
						};
						*state = PoliceState::Parked;
						Some(NpcEvent::Recycled)
					} else {
						None
					}
				}
			},
		}
	}
}

/// Rubber-band law: effective pursuit speed for an active unit at `offset`,
/// never above the unit's own top speed. A player holding more than that
/// leaves the unit behind until it recycles.
pub fn pursuit_speed(offset: f32, player_speed: f32, top_speed: f32, tuning: &PursuitTuning) -> f32 {
	let band = if offset > tuning.close_above {
		player_speed + tuning.close_bonus
	} else if offset < tuning.back_off_below {
		player_speed - tuning.back_off_penalty
	} else {
		player_speed + tuning.steady_bonus
	};
	band.min(top_speed)
}
