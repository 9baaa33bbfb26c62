use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishRecord {
	pub racer_id: String,
	pub display_name: String,
	pub finish_time_seconds: f32,
}

/// Finish records in crossing order, at most one per racer.
#[derive(Debug, Clone, Default)]
pub struct FinishBoard {
	records: Vec<FinishRecord>,
	finished: HashSet<String>,
}

impl FinishBoard {
	/// Returns false when the racer already has a record.
	pub fn record(&mut self, racer_id: &str, display_name: &str, finish_time_seconds: f32) -> bool {
		if !self.finished.insert(racer_id.to_string()) {
			return false;
		}
		self.records.push(FinishRecord {
			racer_id: racer_id.to_string(),
			display_name: display_name.to_string(),
			finish_time_seconds,
		});
		true
	}

	pub fn has_finished(&self, racer_id: &str) -> bool {
		self.finished.contains(racer_id)
	}

	pub fn get(&self, racer_id: &str) -> Option<&FinishRecord> {
		self.records.iter().find(|r| r.racer_id == racer_id)
	}

	pub fn records(&self) -> &[FinishRecord] {
		&self.records
	}

	pub fn clear(&mut self) {
		self.records.clear();
		self.finished.clear();
	}
}

/// A racer known to the standings table.
#[derive(Debug, Clone)]
pub struct Entrant<'a> {
	pub racer_id: &'a str,
	pub display_name: &'a str,
	pub base_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
	pub position: u32,
	pub racer_id: String,
	pub display_name: String,
	pub time_seconds: f32,
	pub estimated: bool,
}

/// Projected time for a racer that has not crossed the line.
pub fn projected_time(race_length: f32, base_speed: f32, projection_factor: f32) -> f32 {
	race_length / (base_speed * projection_factor)
}

/// Full standings: recorded times where present, projections otherwise,
/// fastest first with ties kept in entrant order.
pub fn resolve<'a>(
	entrants: impl IntoIterator<Item = Entrant<'a>>,
	board: &FinishBoard,
	race_length: f32,
	projection_factor: f32,
) -> Vec<Standing> {
	let mut rows: Vec<Standing> = entrants
		.into_iter()
		.map(|e| match board.get(e.racer_id) {
			Some(rec) => Standing {
				position: 0,
				racer_id: e.racer_id.to_string(),
				display_name: e.display_name.to_string(),
				time_seconds: rec.finish_time_seconds,
				estimated: false,
			},
			None => Standing {
				position: 0,
				racer_id: e.racer_id.to_string(),
				display_name: e.display_name.to_string(),
				time_seconds: projected_time(race_length, e.base_speed, projection_factor),
				estimated: true,
			},
		})
		.collect();
	rows.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
	for (i, row) in rows.iter_mut().enumerate() {
		row.position = i as u32 + 1;
	}
	rows
}
