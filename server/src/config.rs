use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use shared::RaceConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub port: u16,
	pub frame_hz: u32,
	pub race_config: Option<PathBuf>,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { port: 4001, frame_hz: 60, race_config: None }
	}
}

impl ServerConfig {
	/// `PORT`, `FRAME_HZ` and `RACE_CONFIG` from the environment.
	pub fn from_env() -> anyhow::Result<Self> {
		let mut cfg = Self::default();
		if let Ok(port) = std::env::var("PORT") {
			cfg.port = port.parse().with_context(|| format!("invalid PORT {port:?}"))?;
		}
		if let Ok(hz) = std::env::var("FRAME_HZ") {
			cfg.frame_hz = hz.parse().with_context(|| format!("invalid FRAME_HZ {hz:?}"))?;
			anyhow::ensure!(cfg.frame_hz > 0, "FRAME_HZ must be positive");
		}
		cfg.race_config = std::env::var_os("RACE_CONFIG").map(PathBuf::from);
		Ok(cfg)
	}

	pub fn frame_period(&self) -> Duration {
		Duration::from_secs_f64(1.0 / self.frame_hz.max(1) as f64)
	}

	pub fn load_race_config(&self) -> anyhow::Result<RaceConfig> {
		match &self.race_config {
			Some(path) => RaceConfig::from_json_file(path)
				.with_context(|| format!("loading race config from {}", path.display())),
			None => Ok(RaceConfig::default()),
		}
	}
}
