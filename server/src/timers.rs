use std::time::Duration;

use shared::{ServerToClient, SessionId};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::AppState;

/// Frame, race-clock and sync timers bound to one session id.
///
/// Each task exits by itself once the session it was spawned for has been
/// replaced; dropping the set aborts whatever is still running.
pub struct SessionTimers {
	session: SessionId,
	handles: Vec<JoinHandle<()>>,
}

impl SessionTimers {
	pub fn spawn(state: &AppState, session: SessionId) -> Self {
		let handles = vec![
			tokio::spawn(frame_loop(state.clone(), session)),
			tokio::spawn(clock_loop(state.clone(), session)),
			tokio::spawn(sync_loop(state.clone(), session)),
		];
		debug!(%session, "session timers started");
		Self { session, handles }
	}

	pub fn session(&self) -> SessionId {
		self.session
	}
}

impl Drop for SessionTimers {
	fn drop(&mut self) {
		for handle in &self.handles {
			handle.abort();
		}
		debug!(session = %self.session, "session timers stopped");
	}
}

async fn frame_loop(state: AppState, session: SessionId) {
	let mut ticker = interval(state.server_cfg.frame_period());
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
	let mut last = Instant::now();
	loop {
		ticker.tick().await;
		let now = Instant::now();
		let dt = now.duration_since(last).as_secs_f32();
		last = now;
		let mut sim = state.sim.lock().await;
		if sim.id() != session {
			break;
		}
		sim.step(dt);
	}
}

async fn clock_loop(state: AppState, session: SessionId) {
	let period = Duration::from_secs(1);
	let mut ticker = interval_at(Instant::now() + period, period);
	loop {
		ticker.tick().await;
		let mut sim = state.sim.lock().await;
		if sim.id() != session {
			break;
		}
		sim.clock_tick();
	}
}

async fn sync_loop(state: AppState, session: SessionId) {
	let period = {
		let sim = state.sim.lock().await;
		Duration::from_millis(sim.config().sync_interval_ms)
	};
	let mut ticker = interval(period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	loop {
		ticker.tick().await;
		let (snapshot, events) = {
			let mut sim = state.sim.lock().await;
			if sim.id() != session {
				break;
			}
			sim.sync_tick();
			(sim.snapshot().clone(), sim.drain_events())
		};
		for event in events {
			publish(&state, &ServerToClient::Event(event));
		}
		publish(&state, &ServerToClient::Snapshot(snapshot));
	}
}

pub fn publish(state: &AppState, msg: &ServerToClient) {
	match serde_json::to_string(msg) {
		// no subscribers is fine
		Ok(json) => {
			let _ = state.tx_state.send(json);
		}
		Err(e) => warn!("failed to encode server message: {e}"),
	}
}
