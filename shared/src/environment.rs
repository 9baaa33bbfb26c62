//! Time-of-day progression. Night for the first minute, a two minute sunrise,
//! then hazy orange day. Purely an output for the renderer.

use serde::{Deserialize, Serialize};

/// 8-bit colour, as the renderer's CSS-style colour strings expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Rgb {
	pub const fn hex(code: u32) -> Self {
		Self {
			r: ((code >> 16) & 0xff) as u8,
			g: ((code >> 8) & 0xff) as u8,
			b: (code & 0xff) as u8,
		}
	}

	pub fn lerp(self, to: Rgb, t: f32) -> Rgb {
		let t = t.clamp(0.0, 1.0);
		let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
		Rgb {
			r: mix(self.r, to.r),
			g: mix(self.g, to.g),
			b: mix(self.b, to.b),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyPreset {
	Night,
	Sunset,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
	pub fog: Rgb,
	pub sky: Rgb,
	pub key_light: Rgb,
	pub intensity: f32,
	pub preset: SkyPreset,
}

const NIGHT_FOG: Rgb = Rgb::hex(0x050505);
const DAWN_FOG: Rgb = Rgb::hex(0xff4d00);
const DAY_FOG: Rgb = Rgb::hex(0xff9d00);
const NIGHT_SKY: Rgb = Rgb::hex(0x000000);
const DAWN_SKY: Rgb = Rgb::hex(0x220044);
const DAY_SKY: Rgb = Rgb::hex(0x331100);
const MOON_LIGHT: Rgb = Rgb::hex(0xffffff);
const SUN_LIGHT: Rgb = Rgb::hex(0xffccaa);

const SUNRISE_START: u32 = 60;
const SUNRISE_END: u32 = 180;

pub fn lighting_at(elapsed_secs: u32) -> Lighting {
	let key_light = if elapsed_secs > SUNRISE_START { SUN_LIGHT } else { MOON_LIGHT };
	if elapsed_secs < SUNRISE_START {
		Lighting {
			fog: NIGHT_FOG,
			sky: NIGHT_SKY,
			key_light,
			intensity: 0.15,
			preset: SkyPreset::Night,
		}
	} else if elapsed_secs < SUNRISE_END {
		let span = (SUNRISE_END - SUNRISE_START) as f32;
		let factor = ((elapsed_secs - SUNRISE_START) as f32 / span).min(1.0);
		Lighting {
			fog: NIGHT_FOG.lerp(DAWN_FOG, factor * 0.5),
			sky: NIGHT_SKY.lerp(DAWN_SKY, factor),
			key_light,
			intensity: 0.15 + factor * 0.5,
			preset: if factor > 0.5 { SkyPreset::Sunset } else { SkyPreset::Night },
		}
	} else {
		Lighting {
			fog: DAY_FOG,
			sky: DAY_SKY,
			key_light,
			intensity: 1.0,
			preset: SkyPreset::Sunset,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_minute_is_night() {
		let l = lighting_at(0);
		assert_eq!(l.preset, SkyPreset::Night);
		assert_eq!(l.intensity, 0.15);
		assert_eq!(l.sky, NIGHT_SKY);
		assert_eq!(lighting_at(59).key_light, MOON_LIGHT);
	}

	#[test]
	fn sunrise_interpolates() {
		let start = lighting_at(60);
		assert_eq!(start.intensity, 0.15);
		assert_eq!(start.key_light, MOON_LIGHT);

		let mid = lighting_at(120);
		assert!((mid.intensity - 0.4).abs() < 1e-6);
		assert_eq!(mid.preset, SkyPreset::Night);
		assert_eq!(mid.sky, Rgb { r: 0x11, g: 0x00, b: 0x22 });
		assert_eq!(mid.fog, Rgb { r: 68, g: 23, b: 4 });
		assert_eq!(mid.key_light, SUN_LIGHT);

		assert_eq!(lighting_at(121).preset, SkyPreset::Sunset);
	}

	#[test]
	fn day_after_three_minutes() {
		let l = lighting_at(180);
		assert_eq!(l.fog, DAY_FOG);
		assert_eq!(l.intensity, 1.0);
		assert_eq!(l.preset, SkyPreset::Sunset);
	}

	#[test]
	fn intensity_never_drops() {
		let mut last = 0.0;
		for t in 0..400 {
			let i = lighting_at(t).intensity;
			assert!(i >= last);
			last = i;
		}
	}
}
