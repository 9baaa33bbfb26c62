//! Driving decisions for the headless client. Everything here is pure: it
//! looks at the latest snapshot and returns the commands worth sending.

use shared::session::NpcView;
use shared::{Command, Phase, SessionId, Snapshot};

/// How far down the road (negative offset) a car still counts as in the way.
const LOOKAHEAD: f32 = -40.0;
/// Cars this far behind can still clip the rear of the box.
const LOOKBEHIND: f32 = 5.0;
/// Lateral gap below which a car ahead is treated as blocking our lane.
const BLOCKING_GAP: f32 = 4.0;
/// Stay inside the pillars with some margin.
const SAFE_LANE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Crashed,
    Busted,
}

#[derive(Debug, Default)]
pub struct Autopilot {
    throttle: bool,
    brake: bool,
    grid_requested: Option<SessionId>,
    outcome_seen: Option<SessionId>,
}

impl Autopilot {
    /// The race outcome the first time a terminal snapshot for a session is seen.
    pub fn outcome(&mut self, snap: &Snapshot) -> Option<Outcome> {
        let outcome = match snap.phase {
            Phase::Finished => Outcome::Finished,
            Phase::Crashed => Outcome::Crashed,
            Phase::Busted => Outcome::Busted,
            _ => return None,
        };
        if self.outcome_seen == Some(snap.session) {
            return None;
        }
        self.outcome_seen = Some(snap.session);
        Some(outcome)
    }

    pub fn decide(&mut self, snap: &Snapshot) -> Vec<Command> {
        let mut out = Vec::new();
        match snap.phase {
            Phase::OnGrid => {
                if self.grid_requested != Some(snap.session) {
                    self.grid_requested = Some(snap.session);
                    out.push(Command::StartGrid);
                }
                self.set_pedals(false, false, &mut out);
            }
            Phase::Countdown(_) => {}
            Phase::Racing => {
                let threat = nearest_threat(snap.lane, &snap.npcs);
                let steer = threat.and_then(|npc| escape_direction(snap.lane, npc, &snap.npcs));
                // nowhere to go: scrub speed until the gap opens
                let boxed_in = threat.is_some_and(|npc| npc.offset > -15.0) && steer.is_none();
                self.set_pedals(!boxed_in, boxed_in, &mut out);
                if let Some(cmd) = steer.or_else(|| recentre(snap.lane)) {
                    out.push(cmd);
                }
            }
            Phase::Crashed | Phase::Busted | Phase::Finished => {
                self.set_pedals(false, false, &mut out);
            }
        }
        out
    }

    fn set_pedals(&mut self, throttle: bool, brake: bool, out: &mut Vec<Command>) {
        if self.throttle != throttle {
            self.throttle = throttle;
            out.push(Command::Accelerate(throttle));
        }
        if self.brake != brake {
            self.brake = brake;
            out.push(Command::Brake(brake));
        }
    }
}

fn in_window(npc: &NpcView) -> bool {
    npc.active && npc.offset > LOOKAHEAD && npc.offset < LOOKBEHIND
}

/// Closest active car in or near our lane.
fn nearest_threat(lane: f32, npcs: &[NpcView]) -> Option<&NpcView> {
    npcs.iter()
        .filter(|npc| in_window(npc) && (npc.lane - lane).abs() < BLOCKING_GAP)
        .min_by(|a, b| a.offset.abs().total_cmp(&b.offset.abs()))
}

fn lane_clear(lane: f32, npcs: &[NpcView]) -> bool {
    lane.abs() <= SAFE_LANE
        && !npcs.iter().any(|npc| in_window(npc) && (npc.lane - lane).abs() < BLOCKING_GAP)
}

fn escape_direction(lane: f32, threat: &NpcView, npcs: &[NpcView]) -> Option<Command> {
    // judge a side by where two lane changes would put us
    let left = (Command::SteerLeft, -4.0);
    let right = (Command::SteerRight, 4.0);
    let order = if threat.lane >= lane { [left, right] } else { [right, left] };
    order
        .into_iter()
        .find(|(_, delta)| lane_clear(lane + delta, npcs))
        .map(|(cmd, _)| cmd)
}

fn recentre(lane: f32) -> Option<Command> {
    if lane > SAFE_LANE {
        Some(Command::SteerLeft)
    } else if lane < -SAFE_LANE {
        Some(Command::SteerRight)
    } else {
        None
    }
}
