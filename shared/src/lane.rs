use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Steer {
	Left,
	Right,
}

/// One discrete lane change, clamped to the drivable range.
pub fn steer(lane: f32, dir: Steer, step: f32, bound: f32) -> f32 {
	let next = match dir {
		Steer::Left => lane - step,
		Steer::Right => lane + step,
	};
	next.clamp(-bound, bound)
}

/// Running the outermost lane at speed means hitting the pillars.
pub fn off_road(lane: f32, speed: f32, edge: f32, min_speed: f32) -> bool {
	lane.abs() > edge && speed > min_speed
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn steps_by_two() {
		assert_eq!(steer(0.0, Steer::Left, 2.0, 16.0), -2.0);
		assert_eq!(steer(0.0, Steer::Right, 2.0, 16.0), 2.0);
	}

	#[test]
	fn clamps_at_bounds() {
		assert_eq!(steer(16.0, Steer::Right, 2.0, 16.0), 16.0);
		assert_eq!(steer(-15.0, Steer::Left, 2.0, 16.0), -16.0);
	}

	#[test]
	fn shoulder_strike_needs_speed() {
		assert!(off_road(16.0, 60.0, 15.0, 50.0));
		assert!(off_road(-16.0, 60.0, 15.0, 50.0));
		assert!(!off_road(16.0, 50.0, 15.0, 50.0));
		assert!(!off_road(14.0, 300.0, 15.0, 50.0));
	}
}
