//! Police radio flavour. Lines come from an optional external source and fall
//! back to a static script; the simulation only decides when to speak.

use std::collections::VecDeque;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

pub const RADIO_LOG_LEN: usize = 8;

const BASE_DELAY_MS: f32 = 12_000.0;
const INTENSITY_DELAY_MS: f32 = 8_000.0;
const MIN_DELAY_MS: f32 = 3_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioLine {
	pub sender: String,
	pub text: String,
}

impl RadioLine {
	pub fn new(sender: &str, text: &str) -> Self {
		Self { sender: sender.to_string(), text: text.to_string() }
	}
}

const FALLBACK_LINES: [(&str, &str); 8] = [
	("DISPATCH", "All units, red Ferrari speeding on the main drag. Code 3!"),
	("UNIT 16", "Visual on the suspect! That thing is fast!"),
	("RIVAL", "You'll never catch me in this machine!"),
	("DISPATCH", "Authorized use of spike strips on Sector 4."),
	("UNIT 04", "Coming in hot for a PIT maneuver. Hold positions."),
	("RIVAL", "You can't even touch the bumper!"),
	("DISPATCH", "Lost primary unit. Requesting air support!"),
	("HELICOPTER", "Suspect in sight. Weaving through traffic."),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchEvent {
	PursuitStart,
	SpikeStrip,
	CarLost,
	Ramming,
	Taunt,
}

/// Canned call for a race event. Taunts come from the rival, the rest from dispatch.
pub fn scripted_line(event: DispatchEvent) -> RadioLine {
	let text = match event {
		DispatchEvent::PursuitStart => "Visual on the suspect! Requesting pit maneuver clearance.",
		DispatchEvent::SpikeStrip => "Deployment zone alpha-6. Watch your speed, units!",
		DispatchEvent::CarLost => "Suspect is ghosting us. Delta units, box him in at Rosewood!",
		DispatchEvent::Ramming => "Target is aggressive! Unit 12 is out, repeat, Unit 12 is out!",
		DispatchEvent::Taunt => {
			"You think those chrome wheels make you fast? I've seen grandma drive better."
		}
	};
	let sender = if event == DispatchEvent::Taunt { "RIVAL" } else { "DISPATCH" };
	RadioLine::new(sender, text)
}

/// What the radio knows about the race when it is asked to speak.
#[derive(Debug, Clone, Copy)]
pub struct ChatterContext {
	pub speed: f32,
	pub heat: f32,
	pub rank: u32,
}

impl ChatterContext {
	pub fn situation(&self) -> &'static str {
		if self.heat > 80.0 {
			"extreme heat, cops closing in fast"
		} else if self.speed > 300.0 {
			"hitting insane speed, pushing the limit"
		} else if self.speed > 200.0 {
			"cruising at high speed through traffic"
		} else if self.rank == 1 {
			"leading the race, dominating"
		} else if self.rank > 2 {
			"falling behind, need to push harder"
		} else {
			"mid-race, holding position"
		}
	}
}

/// Produces dynamic radio lines, e.g. from a generative service.
pub trait LineSource: Send {
	fn line(&mut self, ctx: &ChatterContext) -> Option<RadioLine>;
}

/// No dynamic source attached; every line comes from the fallback script.
#[derive(Debug, Default)]
pub struct ScriptOnly;

impl LineSource for ScriptOnly {
	fn line(&mut self, _ctx: &ChatterContext) -> Option<RadioLine> {
		None
	}
}

/// `speed / max_speed + heat / 100`, binned to one decimal.
pub fn intensity(speed: f32, max_speed: f32, heat: f32) -> f32 {
	let raw = speed / max_speed + heat / 100.0;
	(raw * 10.0).round() / 10.0
}

pub fn interval_ms(binned_intensity: f32) -> u64 {
	(BASE_DELAY_MS - binned_intensity * INTENSITY_DELAY_MS).max(MIN_DELAY_MS) as u64
}

pub struct Chatter {
	since_last_ms: u64,
	log: VecDeque<RadioLine>,
	source: Box<dyn LineSource>,
}

impl Default for Chatter {
	fn default() -> Self {
		Self::new(Box::new(ScriptOnly))
	}
}

impl std::fmt::Debug for Chatter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Chatter")
			.field("since_last_ms", &self.since_last_ms)
			.field("log", &self.log)
			.finish_non_exhaustive()
	}
}

impl Chatter {
	pub fn new(source: Box<dyn LineSource>) -> Self {
		Self { since_last_ms: 0, log: VecDeque::with_capacity(RADIO_LOG_LEN), source }
	}

	/// Newest first.
	pub fn log(&self) -> impl Iterator<Item = &RadioLine> {
		self.log.iter()
	}

	pub fn push(&mut self, line: RadioLine) {
		self.log.push_front(line);
		self.log.truncate(RADIO_LOG_LEN);
	}

	/// Advance the radio clock; returns the line spoken, if any.
	pub fn tick(
		&mut self,
		elapsed_ms: u64,
		binned_intensity: f32,
		ctx: &ChatterContext,
		rng: &mut dyn RngCore,
	) -> Option<RadioLine> {
		self.since_last_ms += elapsed_ms;
		if self.since_last_ms < interval_ms(binned_intensity) {
			return None;
		}
		self.since_last_ms = 0;
		let line = self.source.line(ctx).unwrap_or_else(|| {
			let (sender, text) = FALLBACK_LINES[rng.gen_range(0..FALLBACK_LINES.len())];
			RadioLine::new(sender, text)
		});
		self.push(line.clone());
		Some(line)
	}

	pub fn reset(&mut self) {
		self.since_last_ms = 0;
		self.log.clear();
	}
}
