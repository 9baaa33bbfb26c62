use std::{net::SocketAddr, sync::Arc};

use axum::{
	extract::{
		ws::{Message, WebSocket},
		State, WebSocketUpgrade,
	},
	response::IntoResponse,
	routing::get,
	Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use shared::{ClientToServer, Command, RaceSession, ServerToClient};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod timers;

use config::ServerConfig;
use timers::SessionTimers;

#[derive(Clone)]
pub struct AppState {
	sim: Arc<Mutex<RaceSession>>,
	tx_state: broadcast::Sender<String>,
	timers: Arc<Mutex<Option<SessionTimers>>>,
	server_cfg: Arc<ServerConfig>,
}

impl AppState {
	fn new(sim: RaceSession, server_cfg: ServerConfig) -> Self {
		let (tx_state, _rx_state) = broadcast::channel::<String>(64);
		Self {
			sim: Arc::new(Mutex::new(sim)),
			tx_state,
			timers: Arc::new(Mutex::new(None)),
			server_cfg: Arc::new(server_cfg),
		}
	}

	async fn arm_timers(&self) {
		let mut timers = self.timers.lock().await;
		let session = self.sim.lock().await.id();
		*timers = Some(SessionTimers::spawn(self, session));
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let server_cfg = ServerConfig::from_env()?;
	let race_cfg = server_cfg.load_race_config()?;
	info!(
		race_length = race_cfg.race_length,
		rivals = race_cfg.grid.len(),
		frame_hz = server_cfg.frame_hz,
		"race config loaded"
	);

	let state = AppState::new(RaceSession::new(race_cfg), server_cfg);
	state.arm_timers().await;

	let app = Router::new()
		.route("/ws", get(ws_handler))
		.with_state(state.clone());

	let addr = SocketAddr::from(([0, 0, 0, 0], state.server_cfg.port));
	info!("server listening on {addr}");
	let listener = tokio::net::TcpListener::bind(addr).await?;
	axum::serve(listener, app).await?;
	Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
	ws.on_upgrade(move |socket| client_connection(socket, state))
}

/// Apply a command and re-arm the timers when it starts a countdown or a new session.
async fn handle_command(state: &AppState, cmd: Command) {
	if !matches!(cmd, Command::StartGrid | Command::Restart) {
		state.sim.lock().await.apply(cmd);
		return;
	}
	// Held across apply: the installed set always belongs to the newest session.
	let mut timers = state.timers.lock().await;
	let (accepted, session) = {
		let mut sim = state.sim.lock().await;
		let accepted = sim.apply(cmd);
		(accepted, sim.id())
	};
	if !accepted {
		return;
	}
	if let Some(old) = timers.as_ref() {
		info!(old = %old.session(), new = %session, ?cmd, "re-arming session timers");
	}
	*timers = Some(SessionTimers::spawn(state, session));
}

async fn client_connection(socket: WebSocket, state: AppState) {
	let (mut sink, mut stream) = socket.split();
	let mut rx_broadcast = state.tx_state.subscribe();
	let (tx_direct, mut rx_direct) = mpsc::channel::<Message>(16);

	// On connect: introduce the current session
	{
		let sim = state.sim.lock().await;
		let welcome = ServerToClient::Welcome {
			session: sim.id(),
			race_length: sim.config().race_length,
			max_speed: sim.config().max_speed,
		};
		match serde_json::to_string(&welcome) {
			Ok(json) => {
				let _ = sink.send(Message::Text(json)).await;
			}
			Err(e) => error!("failed to encode welcome: {e}"),
		}
	}

	// Writer task: forwards broadcast state and direct messages to client
	let writer_handle = tokio::spawn(async move {
		loop {
			tokio::select! {
				msg = rx_broadcast.recv() => {
					match msg {
						Ok(json) => {
							if sink.send(Message::Text(json)).await.is_err() {
								break;
							}
						}
						Err(broadcast::error::RecvError::Lagged(skipped)) => {
							warn!("client fell behind, skipped {skipped} messages");
						}
						Err(broadcast::error::RecvError::Closed) => break,
					}
				}
				opt = rx_direct.recv() => {
					match opt {
						Some(message) => {
							if sink.send(message).await.is_err() {
								break;
							}
						}
						None => break,
					}
				}
			}
		}
	});

	// Reader: process client messages
	while let Some(Ok(msg)) = stream.next().await {
		match msg {
			Message::Text(txt) => match serde_json::from_str::<ClientToServer>(&txt) {
				Ok(ClientToServer::Command(cmd)) => handle_command(&state, cmd).await,
				Ok(ClientToServer::Ping(n)) => {
					if let Ok(json) = serde_json::to_string(&ServerToClient::Pong(n)) {
						let _ = tx_direct.send(Message::Text(json)).await;
					}
				}
				Err(e) => {
					error!("bad client msg: {e}");
				}
			},
			Message::Close(_) => break,
			_ => {}
		}
	}

	// Drop direct tx to stop writer, then wait for it to end
	drop(tx_direct);
	let _ = writer_handle.await;
	info!("client disconnected");
}

#[cfg(test)]
mod tests {
	use super::*;
	use shared::{Phase, RaceConfig, SessionId};

	async fn armed_state() -> AppState {
		let state = AppState::new(RaceSession::new(RaceConfig::default()), ServerConfig::default());
		state.arm_timers().await;
		state
	}

	async fn armed_session(state: &AppState) -> Option<SessionId> {
		state.timers.lock().await.as_ref().map(SessionTimers::session)
	}

	#[tokio::test]
	async fn start_grid_rearms_the_same_session() {
		let state = armed_state().await;
		let session = state.sim.lock().await.id();
		handle_command(&state, Command::StartGrid).await;
		assert_eq!(state.sim.lock().await.phase(), Phase::Countdown(3));
		assert_eq!(armed_session(&state).await, Some(session));
	}

	#[tokio::test]
	async fn ignored_restart_keeps_the_timers() {
		let state = armed_state().await;
		let session = state.sim.lock().await.id();
		handle_command(&state, Command::Restart).await;
		assert_eq!(armed_session(&state).await, Some(session));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn racing_restarts_leave_timers_on_the_live_session() {
		let state = armed_state().await;
		for _ in 0..50 {
			let mut drivers = Vec::new();
			for _ in 0..4 {
				let state = state.clone();
				drivers.push(tokio::spawn(async move {
					handle_command(&state, Command::StartGrid).await;
					handle_command(&state, Command::Restart).await;
				}));
			}
			for driver in drivers {
				driver.await.expect("driver task");
			}
			let live = state.sim.lock().await.id();
			assert_eq!(armed_session(&state).await, Some(live));
		}
	}
}
