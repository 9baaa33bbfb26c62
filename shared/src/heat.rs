use serde::{Deserialize, Serialize};

pub const MAX_HEAT: f32 = 100.0;

/// Pursuit intensity. Only ever goes up within a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Heat(f32);

impl Heat {
	pub fn value(self) -> f32 {
		self.0
	}

	/// Accrue `rate` per second for `dt` seconds when running above `threshold`.
	pub fn accrue(&mut self, speed: f32, threshold: f32, rate: f32, dt: f32) {
		if speed > threshold {
			self.0 = (self.0 + rate.max(0.0) * dt).min(MAX_HEAT);
		}
	}

	pub fn max_out(&mut self) {
		self.0 = MAX_HEAT;
	}

	pub fn is_wanted(self, wanted_heat: f32) -> bool {
		self.0 > wanted_heat
	}
}
