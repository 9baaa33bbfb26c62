//! Simulation core for the pursuit racer: player kinematics, NPC rivals and
//! police, collisions, heat, the race phase machine and standings.

pub mod chatter;
pub mod collision;
pub mod config;
pub mod environment;
pub mod error;
pub mod heat;
pub mod kinematics;
pub mod lane;
pub mod leaderboard;
pub mod npc;
pub mod protocol;
pub mod session;

pub use config::{RaceConfig, PLAYER_ID};
pub use error::ConfigError;
pub use npc::VehicleKind;
pub use protocol::{ClientToServer, ServerToClient};
pub use session::{Command, Phase, RaceEvent, RaceSession, SessionId, Snapshot};
