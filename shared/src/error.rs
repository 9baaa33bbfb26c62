use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read race config {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},
	#[error("malformed race config: {0}")]
	Json(#[from] serde_json::Error),
	#[error("{field} must be positive, got {value}")]
	NotPositive { field: &'static str, value: f32 },
	#[error("racer id {0:?} appears more than once")]
	DuplicateRacer(String),
	#[error("police unit {0:?} must start parked ahead of the grid (negative offset)")]
	PoliceNotAhead(String),
}
