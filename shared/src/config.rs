use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::npc::{NpcSpec, VehicleKind};

/// Id the player uses in finish records and standings.
pub const PLAYER_ID: &str = "player";

/// Speed and decay rates, all expressed per frame at the reference frame rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Handling {
	pub accel: f32,
	pub brake: f32,
	pub drag: f32,
	pub idle_decay: f32,
	pub wreck_decay: f32,
	pub finish_decay: f32,
}

impl Default for Handling {
	fn default() -> Self {
		Self {
			accel: 1.8,
			brake: 6.0,
			drag: 0.4,
			idle_decay: 1.0,
			wreck_decay: 8.0,
			finish_decay: 2.0,
		}
	}
}

/// Three-band rubber band used by active police units. Distances are
/// offsets, so positive means the unit is behind the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitTuning {
	/// Further behind than this, close in fast.
	pub close_above: f32,
	pub close_bonus: f32,
	/// Further ahead than this (overshot), back off.
	pub back_off_below: f32,
	pub back_off_penalty: f32,
	pub steady_bonus: f32,
	/// Steer harder once no more than this far behind.
	pub near_range: f32,
	pub near_steer_rate: f32,
	pub far_steer_rate: f32,
	pub shoulder_lane: f32,
	pub recycle_above: f32,
	pub respawn_offset: f32,
}

impl Default for PursuitTuning {
	fn default() -> Self {
		Self {
			close_above: 15.0,
			close_bonus: 20.0,
			back_off_below: -8.0,
			back_off_penalty: 10.0,
			steady_bonus: 5.0,
			near_range: 30.0,
			near_steer_rate: 0.04,
			far_steer_rate: 0.015,
			shoulder_lane: 18.0,
			recycle_above: 150.0,
			respawn_offset: -500.0,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
	pub max_speed: f32,
	pub race_length: f32,
	pub lane_bound: f32,
	pub lane_step: f32,
	/// World units travelled per unit of speed per second.
	pub distance_scale: f32,
	/// Speed-to-pace factor for finish time estimates.
	pub projection_factor: f32,
	pub reference_fps: f32,
	pub countdown_from: u8,
	pub handling: Handling,
	pub off_road_lane: f32,
	pub off_road_speed: f32,
	pub collision_half_width: f32,
	pub collision_half_length: f32,
	pub crash_min_speed: f32,
	pub bust_min_speed: f32,
	pub heat_speed: f32,
	/// Heat gained per second above `heat_speed`.
	pub heat_rate: f32,
	pub wanted_heat: f32,
	pub sync_interval_ms: u64,
	pub rival_recycle_behind: f32,
	pub rival_recycle_ahead: f32,
	pub rival_respawn_ahead: f32,
	pub rival_respawn_behind: f32,
	pub pursuit: PursuitTuning,
	pub player_name: String,
	pub grid: Vec<NpcSpec>,
}

impl Default for RaceConfig {
	fn default() -> Self {
		Self {
			max_speed: 355.0,
			race_length: 10_000.0,
			lane_bound: 16.0,
			lane_step: 2.0,
			distance_scale: 0.3,
			projection_factor: 0.3,
			reference_fps: 60.0,
			countdown_from: 3,
			handling: Handling::default(),
			off_road_lane: 15.0,
			off_road_speed: 50.0,
			collision_half_width: 2.0,
			collision_half_length: 4.5,
			crash_min_speed: 20.0,
			bust_min_speed: 10.0,
			heat_speed: 250.0,
			heat_rate: 1.0,
			wanted_heat: 30.0,
			sync_interval_ms: 100,
			rival_recycle_behind: 100.0,
			rival_recycle_ahead: -600.0,
			rival_respawn_ahead: -500.0,
			rival_respawn_behind: 100.0,
			pursuit: PursuitTuning::default(),
			player_name: "YOU".to_string(),
			grid: default_grid(),
		}
	}
}

/// Collective start: three rivals just ahead on the grid, two units parked down the road.
pub fn default_grid() -> Vec<NpcSpec> {
	vec![
		NpcSpec::rival("rival-1", "RIVAL 1", 280.0, -8.0, -15.0),
		NpcSpec::rival("rival-2", "RIVAL 2", 310.0, 8.0, -10.0),
		NpcSpec::rival("rival-3", "RIVAL 3", 295.0, -14.0, -20.0),
		NpcSpec::police("police-1", "UNIT 16", 330.0, 18.0, -600.0),
		NpcSpec::police("police-2", "UNIT 04", 330.0, -18.0, -1800.0),
	]
}

impl RaceConfig {
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let cfg: RaceConfig = serde_json::from_str(raw)?;
		cfg.validate()?;
		Ok(cfg)
	}

	pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.display().to_string(),
			source,
		})?;
		Self::from_json_str(&raw)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		let positive = [
			("max_speed", self.max_speed),
			("race_length", self.race_length),
			("lane_bound", self.lane_bound),
			("lane_step", self.lane_step),
			("distance_scale", self.distance_scale),
			("projection_factor", self.projection_factor),
			("reference_fps", self.reference_fps),
			("collision_half_width", self.collision_half_width),
			("collision_half_length", self.collision_half_length),
		];
		for (field, value) in positive {
			if !(value > 0.0) {
				return Err(ConfigError::NotPositive { field, value });
			}
		}
		if self.sync_interval_ms == 0 {
			return Err(ConfigError::NotPositive { field: "sync_interval_ms", value: 0.0 });
		}

		let mut seen = HashSet::new();
		seen.insert(PLAYER_ID);
		for spec in &self.grid {
			if !seen.insert(spec.id.as_str()) {
				return Err(ConfigError::DuplicateRacer(spec.id.clone()));
			}
			if spec.kind == VehicleKind::Police && spec.offset >= 0.0 {
				return Err(ConfigError::PoliceNotAhead(spec.id.clone()));
			}
		}
		Ok(())
	}

	/// Sync period in seconds.
	pub fn sync_interval(&self) -> f32 {
		self.sync_interval_ms as f32 / 1000.0
	}
}
