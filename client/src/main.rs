//! Headless driver: connects to the race server, drives with the autopilot
//! and restarts until the requested number of races is done.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Context;
use futures::{Sink, SinkExt, StreamExt};
use shared::{ClientToServer, Command, RaceEvent, ServerToClient};
use tokio_tungstenite::connect_async;
use tracing_subscriber::EnvFilter;
use tungstenite::Message;

mod autopilot;

use autopilot::{Autopilot, Outcome};

#[derive(Default)]
struct PingTracker {
    last_id: u64,
    in_flight: HashMap<u64, Instant>,
    rtt_ms: f32,
}

impl PingTracker {
    fn start(&mut self) -> u64 {
        self.last_id = self.last_id.wrapping_add(1);
        self.in_flight.insert(self.last_id, Instant::now());
        self.last_id
    }

    fn finish(&mut self, id: u64) {
        if let Some(start) = self.in_flight.remove(&id) {
            self.rtt_ms = start.elapsed().as_secs_f32() * 1000.0;
        }
    }
}

async fn send<S>(sink: &mut S, msg: &ClientToServer) -> anyhow::Result<()>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url =
        std::env::var("SERVER_WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:4001/ws".to_string());
    let races: u32 = match std::env::var("AUTOPILOT_RACES") {
        Ok(v) => v.parse().with_context(|| format!("invalid AUTOPILOT_RACES {v:?}"))?,
        Err(_) => 1,
    };

    log::info!("Attempting to connect to WebSocket: {}", url);
    let (ws, _) = connect_async(&url)
        .await
        .with_context(|| format!("websocket connect to {url}"))?;
    log::info!("WebSocket connected to {}", url);
    let (mut write, mut read) = ws.split();

    let mut pilot = Autopilot::default();
    let mut ping = PingTracker::default();
    let mut ping_timer = tokio::time::interval(Duration::from_secs(1));
    let mut completed = 0u32;

    loop {
        tokio::select! {
            _ = ping_timer.tick() => {
                let id = ping.start();
                send(&mut write, &ClientToServer::Ping(id)).await?;
            }
            msg = read.next() => {
                let Some(msg) = msg else {
                    log::warn!("WebSocket connection closed");
                    break;
                };
                let Message::Text(text) = msg.context("websocket read")? else {
                    continue;
                };
                let msg = match serde_json::from_str::<ServerToClient>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        log::error!("bad server msg: {e}");
                        continue;
                    }
                };
                match msg {
                    ServerToClient::Welcome { session, race_length, max_speed } => {
                        log::info!("joined session {session}: {race_length} m, top speed {max_speed}");
                    }
                    ServerToClient::Snapshot(snap) => {
                        for cmd in pilot.decide(&snap) {
                            send(&mut write, &ClientToServer::Command(cmd)).await?;
                        }
                        let Some(outcome) = pilot.outcome(&snap) else {
                            continue;
                        };
                        completed += 1;
                        match outcome {
                            Outcome::Finished => log::info!(
                                "race {completed}/{races} finished in {}s, rank {}",
                                snap.elapsed_time,
                                snap.rank
                            ),
                            Outcome::Crashed | Outcome::Busted => log::info!(
                                "race {completed}/{races} ended {outcome:?} at {:.0} m",
                                snap.distance
                            ),
                        }
                        if completed >= races {
                            log::info!("done, last ping {:.0} ms", ping.rtt_ms);
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                        send(&mut write, &ClientToServer::Command(Command::Restart)).await?;
                    }
                    ServerToClient::Event(RaceEvent::Radio(line)) => {
                        log::info!("[{}] {}", line.sender, line.text);
                    }
                    ServerToClient::Event(event) => log::debug!("{event:?}"),
                    ServerToClient::Pong(id) => {
                        ping.finish(id);
                        log::trace!("rtt {:.1} ms", ping.rtt_ms);
                    }
                }
            }
        }
    }
    Ok(())
}
