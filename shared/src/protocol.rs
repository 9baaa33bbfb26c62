use serde::{Deserialize, Serialize};

use crate::session::{Command, RaceEvent, SessionId, Snapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientToServer {
	Command(Command),
	Ping(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerToClient {
	Welcome { session: SessionId, race_length: f32, max_speed: f32 },
	Snapshot(Snapshot),
	Event(RaceEvent),
	Pong(u64),
}
