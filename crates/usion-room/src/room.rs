//! The Room Runtime (§4.5): a match's lifecycle, input admission, tick
//! scheduler, broadcast fan-out, and termination, all owned by one `Room`.

use std::collections::HashMap;
use std::sync::Weak;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use usion_net::{outbound_type, payloads, project, Outbound};
use usion_sim::{self as sim, InputSnapshot, TerminalStatus, World};
use usion_types::{RoomId, SessionId, TerminationReason, UserId};
use usion_webhook::{MatchResult, WebhookConfig};

use crate::config::RoomConfig;
use crate::error::{RoomError, RoomResult};
use crate::latency::smooth;
use crate::outbound::{OutboundMessage, OutboundSender};
use crate::registry::RoomRegistry;
use crate::session::{waiting_for, SessionEntry};

/// Close code used when a mid-match disconnect ends the match for the
/// surviving peer (§4.5.6, §7).
pub const DISCONNECT_CLOSE_CODE: u16 = 4001;

struct RoomInner {
    sessions: HashMap<SessionId, SessionEntry>,
    participant_order: Vec<UserId>,
    world: Option<World>,
    running: bool,
    finished: bool,
    match_session_id: Option<SessionId>,
    last_seq_by_user: HashMap<UserId, u64>,
    ack_seq_by_player: HashMap<UserId, u64>,
    latency_ema_by_user: HashMap<UserId, f64>,
    latest_input_by_user: HashMap<UserId, InputSnapshot>,
    prev_net_state: Option<usion_net::NetWorldState>,
    net_tick: u64,
}

impl RoomInner {
    fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            participant_order: Vec::new(),
            world: None,
            running: false,
            finished: false,
            match_session_id: None,
            last_seq_by_user: HashMap::new(),
            ack_seq_by_player: HashMap::new(),
            latency_ema_by_user: HashMap::new(),
            latest_input_by_user: HashMap::new(),
            prev_net_state: None,
            net_tick: 0,
        }
    }
}

/// Outcome of a join (§4.6). The gateway uses this to decide whether to
/// broadcast `player_joined` or just reply with the existing snapshot.
pub enum JoinOutcome {
    Added { player_ids: Vec<UserId>, waiting_for: u32 },
    AlreadyJoined { player_ids: Vec<UserId>, waiting_for: u32 },
}

/// Outcome of `remove_session` (§4.5.6).
pub enum RemoveOutcome {
    Removed,
    NotPresent,
    MatchEndedByDisconnect { winner_ids: Vec<UserId> },
}

pub struct Room {
    pub room_id: RoomId,
    config: RoomConfig,
    webhook_config: WebhookConfig,
    http_client: reqwest::Client,
    registry: Weak<RoomRegistry>,
    inner: Mutex<RoomInner>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl Room {
    pub fn new(
        room_id: RoomId,
        config: RoomConfig,
        webhook_config: WebhookConfig,
        http_client: reqwest::Client,
        registry: Weak<RoomRegistry>,
    ) -> Self {
        Self {
            room_id,
            config,
            webhook_config,
            http_client,
            registry,
            inner: Mutex::new(RoomInner::new()),
            scheduler: Mutex::new(None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().sessions.is_empty()
    }

    /// True once the room should be deregistered (§3 lifecycle): no
    /// sessions remain, or the match has ended and its webhook was posted.
    pub fn should_teardown(&self) -> bool {
        let inner = self.inner.lock();
        inner.sessions.is_empty() || inner.finished
    }

    /// Adds or refreshes a session (§4.6 `join`). A repeated `session_id`
    /// is a reconnect: the socket handle is swapped, nothing else changes.
    pub fn upsert_session(&self, session_id: SessionId, user_id: UserId, tx: OutboundSender) -> JoinOutcome {
        let mut inner = self.inner.lock();

        if let Some(entry) = inner.sessions.get_mut(&session_id) {
            entry.tx = tx;
            let player_ids = inner.participant_order.clone();
            let wf = waiting_for(player_ids.len());
            return JoinOutcome::AlreadyJoined { player_ids, waiting_for: wf };
        }

        if !inner.participant_order.contains(&user_id) && inner.participant_order.len() < crate::session::MAX_PARTICIPANTS {
            inner.participant_order.push(user_id.clone());
        }
        inner.sessions.insert(session_id, SessionEntry { user_id, tx });

        let player_ids = inner.participant_order.clone();
        let wf = waiting_for(player_ids.len());
        JoinOutcome::Added { player_ids, waiting_for: wf }
    }

    /// Removes a session (`leave` or socket close). Per §4.5.6, if this
    /// drops the room below two connected participants while a match is
    /// running, the match ends immediately with `player_disconnected`.
    #[instrument(skip(self), fields(room_id = %self.room_id))]
    pub fn remove_session(&self, session_id: &SessionId) -> RemoveOutcome {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.sessions.remove(session_id) else {
            return RemoveOutcome::NotPresent;
        };

        let connected_users: std::collections::HashSet<&UserId> = inner.sessions.values().map(|s| &s.user_id).collect();
        let still_connected = connected_users.contains(&entry.user_id);

        if inner.running && !inner.finished && !still_connected && connected_users.len() < crate::session::MAX_PARTICIPANTS {
            let winner_ids: Vec<UserId> = connected_users.into_iter().cloned().collect();
            inner.finished = true;
            inner.running = false;

            let server_tick = inner.world.as_ref().map(|w| w.tick).unwrap_or(0);
            let match_end_payload = payloads::MatchEndPayload {
                room_id: self.room_id.to_string(),
                protocol_version: usion_net::PROTOCOL_VERSION,
                server_ts: Utc::now().timestamp_millis(),
                server_tick,
                winner_ids: winner_ids.clone(),
                reason: TerminationReason::PlayerDisconnected,
                final_stats: final_stats_from_world(inner.world.as_ref()),
            };
            self.broadcast_locked(&mut inner, outbound_type::MATCH_END, match_end_payload);
            for entry in inner.sessions.values() {
                let _ = entry.tx.send(OutboundMessage::Close(DISCONNECT_CLOSE_CODE));
            }

            if let Some(handle) = self.scheduler.lock().take() {
                handle.abort();
            }

            let room_id = self.room_id.clone();
            let registry = self.registry.clone();
            let final_stats = webhook_final_stats(&final_stats_from_world(inner.world.as_ref()));
            let participants = inner.participant_order.clone();
            let match_session_id = inner.match_session_id.clone().unwrap_or_else(|| SessionId::new(uuid::Uuid::new_v4().to_string()));
            let webhook_config = self.webhook_config.clone();
            let http_client = self.http_client.clone();
            let winners_for_webhook = winner_ids.clone();
            tokio::spawn(async move {
                let result = MatchResult {
                    room_id: room_id.clone(),
                    session_id: match_session_id,
                    winner_ids: winners_for_webhook,
                    participants,
                    reason: TerminationReason::PlayerDisconnected,
                    final_stats,
                };
                if let Err(err) = usion_webhook::submit(&http_client, &webhook_config, result).await {
                    warn!(room_id = %room_id, error = %err, "webhook submission failed after disconnect termination");
                }
                if let Some(registry) = registry.upgrade() {
                    registry.prune(&room_id);
                }
            });

            return RemoveOutcome::MatchEndedByDisconnect { winner_ids };
        }

        RemoveOutcome::Removed
    }

    /// Admits one input (§4.5.1).
    pub fn enqueue_input(
        &self,
        user_id: &UserId,
        seq: u64,
        client_sent_at_ms: Option<i64>,
        mut input: InputSnapshot,
    ) -> RoomResult<()> {
        let mut inner = self.inner.lock();
        if !inner.running {
            return Err(RoomError::RoomNotRunning);
        }
        let last_seq = inner.last_seq_by_user.get(user_id).copied().unwrap_or(0);
        if seq <= last_seq {
            return Err(RoomError::StaleInput { expected_gt: last_seq });
        }

        let now_ms = Utc::now().timestamp_millis();
        let previous_ema = inner.latency_ema_by_user.get(user_id).copied().unwrap_or(0.0);
        let smoothed = smooth(previous_ema, now_ms, client_sent_at_ms);
        inner.latency_ema_by_user.insert(user_id.clone(), smoothed);
        input.lag_comp_ms = smoothed;

        inner.last_seq_by_user.insert(user_id.clone(), seq);
        inner.ack_seq_by_player.insert(user_id.clone(), seq);
        inner.latest_input_by_user.insert(user_id.clone(), input);
        Ok(())
    }

    pub fn ack_seq_by_player(&self) -> HashMap<UserId, u64> {
        self.inner.lock().ack_seq_by_player.clone()
    }

    /// Starts the match and its tick scheduler once both seats are filled.
    /// Returns the player ids if this call is what started it.
    pub fn maybe_start(self: &std::sync::Arc<Self>) -> Option<Vec<UserId>> {
        let mut inner = self.inner.lock();
        if inner.running || inner.finished {
            return None;
        }
        if inner.participant_order.len() < crate::session::MAX_PARTICIPANTS {
            return None;
        }

        let seed = usion_types::seed_from_room_id(&self.room_id.0);
        let world = sim::init(&inner.participant_order, seed);
        inner.world = Some(world);
        inner.running = true;
        inner.match_session_id = Some(SessionId::new(uuid::Uuid::new_v4().to_string()));
        let player_ids = inner.participant_order.clone();
        drop(inner);

        let room = std::sync::Arc::clone(self);
        let handle = tokio::spawn(async move { room.run_scheduler().await });
        *self.scheduler.lock() = Some(handle);

        Some(player_ids)
    }

    async fn run_scheduler(self: std::sync::Arc<Self>) {
        let period = Duration::from_secs_f64(1.0 / self.config.sim_tick_hz as f64);
        let mut last_tick_start = Instant::now();
        loop {
            let tick_start = Instant::now();
            let measured = tick_start.duration_since(last_tick_start);
            let dt = measured.clamp(period, period * 2);
            last_tick_start = tick_start;

            let outcome = self.run_one_tick(dt.as_secs_f64() * 1000.0);
            if let Some(outcome) = outcome {
                self.finish_match(outcome).await;
                break;
            }

            let elapsed = tick_start.elapsed();
            let sleep_for = period.checked_sub(elapsed).unwrap_or(Duration::ZERO);
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Runs one simulation step and, if due, a network frame. Returns the
    /// terminal outcome once the match is over (§4.5.3).
    fn run_one_tick(&self, dt_ms: f64) -> Option<TerminalOutcome> {
        let mut inner = self.inner.lock();
        let Some(mut world) = inner.world.take() else {
            return None;
        };

        for user_id in inner.participant_order.clone() {
            if let Some(input) = inner.latest_input_by_user.get_mut(&user_id) {
                sim::apply_input(&mut world, &user_id, input.clone());
                input.fire_pressed = false;
            }
        }

        sim::tick(&mut world, dt_ms);

        let net_every = self.config.net_frame_every_sim_ticks();
        if world.tick % net_every == 0 {
            self.emit_network_frame(&mut inner, &world);
        }

        let status: TerminalStatus = sim::is_terminal(&world);
        if status.terminal {
            inner.finished = true;
            inner.running = false;
            let final_stats = final_stats_from_world(Some(&world));
            let participants = inner.participant_order.clone();
            let match_session_id = inner
                .match_session_id
                .clone()
                .unwrap_or_else(|| SessionId::new(uuid::Uuid::new_v4().to_string()));

            self.broadcast_locked(&mut inner, outbound_type::MATCH_END, payloads::MatchEndPayload {
                room_id: self.room_id.to_string(),
                protocol_version: usion_net::PROTOCOL_VERSION,
                server_ts: Utc::now().timestamp_millis(),
                server_tick: world.tick,
                winner_ids: status.winner_ids.clone(),
                reason: status.reason.unwrap_or(TerminationReason::Elimination),
                final_stats: final_stats.clone(),
            });

            inner.world = Some(world);
            return Some(TerminalOutcome {
                match_session_id,
                winner_ids: status.winner_ids,
                reason: status.reason.unwrap_or(TerminationReason::Elimination),
                participants,
                final_stats,
            });
        }

        inner.world = Some(world);
        None
    }

    fn emit_network_frame(&self, inner: &mut RoomInner, world: &World) {
        let next_state = project(world);
        let ack_seq_by_player = inner.ack_seq_by_player.clone();
        inner.net_tick += 1;
        let server_ts = Utc::now().timestamp_millis();

        let is_full_due = inner.net_tick % (self.config.full_snapshot_interval_net_ticks.max(1) as u64) == 0;
        if inner.prev_net_state.is_none() || is_full_due {
            self.broadcast_locked(inner, outbound_type::STATE_SNAPSHOT, payloads::StateSnapshotPayload {
                room_id: self.room_id.to_string(),
                protocol_version: usion_net::PROTOCOL_VERSION,
                server_ts,
                server_tick: world.tick,
                ack_seq_by_player,
                full_state: next_state.clone(),
                deploy: self.config.deploy_profile(),
            });
        } else {
            let delta = usion_net::build_delta(inner.prev_net_state.as_ref(), &next_state);
            self.broadcast_locked(inner, outbound_type::STATE_DELTA, payloads::StateDeltaPayload {
                room_id: self.room_id.to_string(),
                protocol_version: usion_net::PROTOCOL_VERSION,
                server_ts,
                server_tick: world.tick,
                ack_seq_by_player,
                changed_entities: delta.changed_entities,
                removed_entities: delta.removed_entities,
                deploy: self.config.deploy_profile(),
            });
        }
        inner.prev_net_state = Some(next_state);
    }

    /// Serializes `{type, payload}` once and sends to every open socket
    /// (§4.5.4). Closed sockets are skipped silently.
    fn broadcast_locked<T: serde::Serialize>(&self, inner: &mut RoomInner, msg_type: &'static str, payload: T) {
        let Ok(json) = Outbound::new(msg_type, payload).to_json() else {
            warn!(room_id = %self.room_id, "failed to serialize outbound frame");
            return;
        };
        for entry in inner.sessions.values() {
            let _ = entry.tx.send(OutboundMessage::Frame(json.clone()));
        }
    }

    /// Sends one frame to a single session, ignoring a closed socket.
    pub fn send_to(&self, session_id: &SessionId, msg_type: &'static str, payload: impl serde::Serialize) {
        let inner = self.inner.lock();
        let Some(entry) = inner.sessions.get(session_id) else {
            return;
        };
        if let Ok(json) = Outbound::new(msg_type, payload).to_json() {
            let _ = entry.tx.send(OutboundMessage::Frame(json));
        }
    }

    /// Broadcasts one frame to every session in the room (§4.5.4). Exposed
    /// for the gateway's `join`/`leave` handling (`player_joined`,
    /// `player_left`, `game_start`); the tick path uses `broadcast_locked`
    /// directly since it already holds the lock.
    pub fn broadcast(&self, msg_type: &'static str, payload: impl serde::Serialize) {
        let mut inner = self.inner.lock();
        self.broadcast_locked(&mut inner, msg_type, payload);
    }

    /// Current simulation tick, or 0 before the match has started. Used by
    /// the gateway's `pong` reply.
    pub fn current_tick(&self) -> u64 {
        self.inner.lock().world.as_ref().map(|w| w.tick).unwrap_or(0)
    }

    /// Static per-deployment facts echoed on `joined`/`game_start`/`pong`.
    pub fn deploy_profile(&self) -> usion_net::payloads::DeployProfile {
        self.config.deploy_profile()
    }

    /// Current participant user ids, in join order.
    pub fn participant_ids(&self) -> Vec<UserId> {
        self.inner.lock().participant_order.clone()
    }

    #[instrument(skip(self, outcome), fields(room_id = %self.room_id))]
    async fn finish_match(&self, outcome: TerminalOutcome) {
        info!(reason = ?outcome.reason, "match finished");
        let result = MatchResult {
            room_id: self.room_id.clone(),
            session_id: outcome.match_session_id,
            winner_ids: outcome.winner_ids,
            participants: outcome.participants,
            reason: outcome.reason,
            final_stats: webhook_final_stats(&outcome.final_stats),
        };
        if let Err(err) = usion_webhook::submit(&self.http_client, &self.webhook_config, result).await {
            warn!(room_id = %self.room_id, error = %err, "webhook submission failed");
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.prune(&self.room_id);
        }
    }
}

struct TerminalOutcome {
    match_session_id: SessionId,
    winner_ids: Vec<UserId>,
    reason: TerminationReason,
    participants: Vec<UserId>,
    final_stats: HashMap<UserId, payloads::FinalStats>,
}

/// Per-player stats for the `match_end` wire frame (§6).
fn final_stats_from_world(world: Option<&World>) -> HashMap<UserId, payloads::FinalStats> {
    let Some(world) = world else {
        return HashMap::new();
    };
    world
        .players
        .iter()
        .map(|(uid, ship)| {
            (
                uid.clone(),
                payloads::FinalStats {
                    kills: ship.stats.kills,
                    deaths: ship.stats.deaths,
                    damage_dealt: ship.stats.damage_dealt,
                    pickups_collected: ship.stats.pickups_collected,
                },
            )
        })
        .collect()
}

/// Same stats, shaped for the outbound webhook body (§4.2).
fn webhook_final_stats(wire: &HashMap<UserId, payloads::FinalStats>) -> HashMap<UserId, usion_webhook::FinalStats> {
    wire.iter()
        .map(|(uid, stats)| {
            (
                uid.clone(),
                usion_webhook::FinalStats {
                    kills: stats.kills,
                    deaths: stats.deaths,
                    damage_dealt: stats.damage_dealt,
                    pickups_collected: stats.pickups_collected,
                },
            )
        })
        .collect()
}
