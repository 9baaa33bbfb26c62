use serde::{Deserialize, Serialize};

use crate::config::Handling;
use crate::session::Phase;

/// Held control flags, set and cleared by input edges and consumed every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
	pub accelerating: bool,
	pub braking: bool,
}

/// Advance speed by `frames` reference frames.
pub fn integrate_speed(
	speed: f32,
	controls: Controls,
	phase: Phase,
	frames: f32,
	handling: &Handling,
	max_speed: f32,
) -> f32 {
	let rate = match phase {
		Phase::Crashed | Phase::Busted => -handling.wreck_decay,
		Phase::Finished => -handling.finish_decay,
		Phase::Racing => {
			if controls.braking {
				-handling.brake
			} else if controls.accelerating {
				handling.accel
			} else {
				-handling.drag
			}
		}
		Phase::OnGrid | Phase::Countdown(_) => -handling.idle_decay,
	};
	(speed + rate * frames).clamp(0.0, max_speed)
}

/// Distance covered in `dt` seconds at `speed`.
pub fn distance_step(speed: f32, dt: f32, scale: f32) -> f32 {
	speed.max(0.0) * dt * scale
}

/// Active aero deployment in degrees.
pub fn spoiler_angle(speed: f32) -> f32 {
	if speed >= 250.0 {
		45.0
	} else if speed >= 150.0 {
		20.0
	} else {
		0.0
	}
}
