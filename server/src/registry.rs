//! Player connection management for the game server
//!
//! This module owns the server side of every accepted player, including:
//! - Player lifecycle (join, leave, forced removal on misbehavior)
//! - Bounded frame writes and deadline-bounded frame reads per player
//! - Heartbeat-based liveness sweeps with automatic cleanup
//! - The turn pointer, kept consistent with removals
//!
//! All frame I/O on a player's socket goes through this module so that every
//! suspension point carries an explicit deadline and a failed peer can never
//! stall the single game task indefinitely.

use log::{debug, error, info, warn};
use shared::{ClientFrame, ServerFrame, FRAME_SIZE, MAX_PLAYERS};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};

/// Stable identifier for a player, never reused within a server run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one deadline-bounded frame read.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete frame arrived and decoded.
    Frame(ClientFrame),
    /// The deadline expired before any byte arrived.
    TimedOut,
    /// The peer closed cleanly, or the read failed with an I/O error.
    Closed,
    /// A protocol violation: EOF or deadline mid-frame, or a decode failure.
    Malformed(String),
}

/// A connected player and their socket
///
/// The stream is private: all reads and writes go through the bounded
/// helpers so no call site can forget a deadline.
#[derive(Debug)]
pub struct Player {
    /// Unique identifier assigned by the registry
    pub id: PlayerId,
    /// Name carried in the join handshake
    pub username: String,
    /// Peer address, for logging
    pub addr: SocketAddr,
    stream: TcpStream,
}

impl Player {
    /// Writes one frame, giving up after `limit`.
    pub async fn send(&mut self, frame: &ServerFrame, limit: Duration) -> std::io::Result<()> {
        write_frame(&mut self.stream, frame, limit).await
    }

    /// Reads exactly one frame before `deadline`.
    pub async fn read(&mut self, deadline: Instant) -> ReadOutcome {
        read_frame(&mut self.stream, deadline).await
    }
}

/// Writes one encoded frame within `limit`, mapping expiry to `TimedOut`.
pub async fn write_frame(
    stream: &mut TcpStream,
    frame: &ServerFrame,
    limit: Duration,
) -> std::io::Result<()> {
    let buf = frame.encode();
    match timeout(limit, stream.write_all(&buf)).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "frame write timed out",
        )),
    }
}

/// Reads exactly one frame, accumulating until the deadline.
///
/// Progress is tracked explicitly: each iteration awaits a single `read`
/// under `timeout_at`, so cancellation at the deadline can never silently
/// discard bytes that already arrived. A frame cut short by EOF or by the
/// deadline is reported as `Malformed`, because half a frame left on the
/// stream would desynchronize every later read.
pub async fn read_frame(stream: &mut TcpStream, deadline: Instant) -> ReadOutcome {
    let mut buf = [0u8; FRAME_SIZE];
    let mut filled = 0;
    while filled < FRAME_SIZE {
        match timeout_at(deadline, stream.read(&mut buf[filled..])).await {
            Err(_) if filled == 0 => return ReadOutcome::TimedOut,
            Err(_) => return ReadOutcome::Malformed("deadline expired mid-frame".to_string()),
            Ok(Ok(0)) if filled == 0 => return ReadOutcome::Closed,
            Ok(Ok(0)) => return ReadOutcome::Malformed("connection closed mid-frame".to_string()),
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => {
                debug!("socket read failed: {}", e);
                return ReadOutcome::Closed;
            }
        }
    }
    match ClientFrame::decode(&buf) {
        Ok(frame) => ReadOutcome::Frame(frame),
        Err(e) => ReadOutcome::Malformed(e.to_string()),
    }
}

/// Owns every accepted player in join order, plus the turn pointer
///
/// The registry is the single authority on membership. Removal from any
/// path (explicit, failed write, failed liveness probe) funnels through
/// `remove`, which keeps the turn pointer consistent.
pub struct PlayerRegistry {
    players: Vec<Player>,
    current: Option<PlayerId>,
    next_id: u32,
    write_timeout: Duration,
}

impl PlayerRegistry {
    /// Creates an empty registry; `write_timeout` bounds every frame write.
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            players: Vec::new(),
            current: None,
            next_id: 1,
            write_timeout,
        }
    }

    /// Admits a player if there is capacity, returning the assigned id.
    ///
    /// At capacity nothing is mutated and the stream is dropped, which
    /// closes the connection.
    pub fn add(&mut self, stream: TcpStream, addr: SocketAddr, username: String) -> Option<PlayerId> {
        if self.players.len() >= MAX_PLAYERS {
            info!("Rejecting connection from {}: server is full", addr);
            return None;
        }
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        info!("Player {} ({}) joined from {}", id, username, addr);
        self.players.push(Player {
            id,
            username,
            addr,
            stream,
        });
        Some(id)
    }

    /// Removes a player, closing their socket. Idempotent.
    ///
    /// Removing the current player clears the turn pointer, so the next
    /// turn selection starts over from the head of the join order.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let index = match self.players.iter().position(|p| p.id == id) {
            Some(index) => index,
            None => return false,
        };
        let player = self.players.remove(index);
        if self.current == Some(id) {
            self.current = None;
        }
        info!("Player {} ({}) left", id, player.username);
        true
    }

    /// Sends one frame to one player. A failed write removes them and
    /// returns false; so does an unknown id.
    pub async fn send_to(&mut self, id: PlayerId, frame: &ServerFrame) -> bool {
        let limit = self.write_timeout;
        let player = match self.player_mut(id) {
            Some(player) => player,
            None => return false,
        };
        match player.send(frame, limit).await {
            Ok(()) => true,
            Err(e) => {
                error!("Dropping player {}: write failed ({})", id, e);
                self.remove(id);
                false
            }
        }
    }

    /// Sends one frame to every player except `exclude`.
    ///
    /// Failures are collected during the sweep and the failed players are
    /// removed only afterwards, so a removal mid-broadcast can never skip
    /// or double-send a surviving player. Returns the removed ids; callers
    /// should rebroadcast the roster when the list is nonempty.
    pub async fn broadcast(
        &mut self,
        frame: &ServerFrame,
        exclude: Option<PlayerId>,
    ) -> Vec<PlayerId> {
        let limit = self.write_timeout;
        let mut failed = Vec::new();
        for player in self.players.iter_mut() {
            if Some(player.id) == exclude {
                continue;
            }
            if let Err(e) = player.send(frame, limit).await {
                error!(
                    "Dropping player {} ({}): broadcast write failed ({})",
                    player.id, player.username, e
                );
                failed.push(player.id);
            }
        }
        for id in &failed {
            self.remove(*id);
        }
        failed
    }

    /// Probes every player with a heartbeat and removes the ones that do
    /// not answer with a heartbeat ack before `ack_timeout`.
    ///
    /// Players only ever write in response to a prompt, so any other frame
    /// arriving here is a protocol violation and counts as dead too.
    pub async fn check_liveness(&mut self, ack_timeout: Duration) -> Vec<PlayerId> {
        let limit = self.write_timeout;
        let ids = self.ids();
        let mut dead = Vec::new();
        for id in ids {
            let player = match self.player_mut(id) {
                Some(player) => player,
                None => continue,
            };
            let alive = if player.send(&ServerFrame::Heartbeat, limit).await.is_err() {
                false
            } else {
                matches!(
                    player.read(Instant::now() + ack_timeout).await,
                    ReadOutcome::Frame(ClientFrame::HeartbeatAck)
                )
            };
            if !alive {
                warn!("Player {} failed the liveness check", id);
                dead.push(id);
            }
        }
        for id in &dead {
            self.remove(*id);
        }
        dead
    }

    /// Broadcasts the roster, repeating if the broadcast itself removed
    /// players, until the roster that went out matches the membership.
    pub async fn broadcast_roster(&mut self) {
        loop {
            let frame = ServerFrame::UpdatePlayers {
                players: self.usernames(),
            };
            if self.broadcast(&frame, None).await.is_empty() {
                break;
            }
        }
    }

    /// Reads one frame from one player before `deadline`. An unknown id
    /// reads as `Closed`.
    pub async fn read_from(&mut self, id: PlayerId, deadline: Instant) -> ReadOutcome {
        match self.player_mut(id) {
            Some(player) => player.read(deadline).await,
            None => ReadOutcome::Closed,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Player ids in join order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Usernames in join order, as broadcast in the roster frame.
    pub fn usernames(&self) -> Vec<String> {
        self.players.iter().map(|p| p.username.clone()).collect()
    }

    pub fn username(&self, id: PlayerId) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.username.as_str())
    }

    pub fn current(&self) -> Option<PlayerId> {
        self.current
    }

    /// Points the turn at `id`; ignored if the player is gone.
    pub fn set_current(&mut self, id: PlayerId) {
        if self.players.iter().any(|p| p.id == id) {
            self.current = Some(id);
        }
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }
}
