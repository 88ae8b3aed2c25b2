//! The top-level server loop
//!
//! One task owns everything: the listener, the registry, the round, and the
//! turn coordinator. Each iteration accepts at most one pending connection,
//! sweeps liveness, and then plays at most one turn. Every await along the
//! way carries a deadline, so a slow or dead peer costs a bounded slice of
//! the loop and nothing more.

use crate::phrases::PhraseSource;
use crate::registry::{read_frame, PlayerRegistry, ReadOutcome};
use crate::round::RoundState;
use crate::turn::TurnCoordinator;
use log::{debug, error, info, warn};
use shared::{ClientFrame, ServerFrame};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout, Instant};

/// Tunable timings and rules for a server instance.
///
/// `Default` holds the production values; tests shrink the timings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Errors that lose the round.
    pub max_errors: u8,
    /// Letters refused early in the round.
    pub blocked_letters: String,
    /// Resolved attempts required before blocked letters unlock.
    pub blocked_threshold: usize,
    /// How long a fresh connection may take to send its join frame.
    pub join_timeout: Duration,
    /// How long the prompted player may take to pick a letter.
    pub letter_timeout: Duration,
    /// How long the prompted player may take to guess the phrase.
    pub phrase_timeout: Duration,
    /// How long a heartbeat ack may take before the player counts as dead.
    pub heartbeat_timeout: Duration,
    /// Upper bound on any single frame write.
    pub write_timeout: Duration,
    /// How long each iteration waits for a pending connection.
    pub accept_poll: Duration,
    /// Sleep between iterations while nobody is connected.
    pub idle_poll: Duration,
    /// Pause between a round verdict and the next round's start.
    pub round_pause: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_errors: 10,
            blocked_letters: "AEIOU".to_string(),
            blocked_threshold: 3,
            join_timeout: Duration::from_secs(5),
            letter_timeout: Duration::from_secs(5),
            phrase_timeout: Duration::from_secs(10),
            heartbeat_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(1),
            accept_poll: Duration::from_millis(25),
            idle_poll: Duration::from_millis(200),
            round_pause: Duration::from_secs(5),
        }
    }
}

pub struct Session {
    config: ServerConfig,
    listener: TcpListener,
    registry: PlayerRegistry,
    round: RoundState,
    turn: TurnCoordinator,
    phrases: Box<dyn PhraseSource>,
    idle: bool,
}

impl Session {
    /// Binds the listener and deals the first phrase.
    pub async fn bind(
        addr: &str,
        config: ServerConfig,
        mut phrases: Box<dyn PhraseSource>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        let round = RoundState::new(
            phrases.next_phrase(),
            config.max_errors,
            &config.blocked_letters,
            config.blocked_threshold,
        );
        let registry = PlayerRegistry::new(config.write_timeout);
        Ok(Self {
            config,
            listener,
            registry,
            round,
            turn: TurnCoordinator::new(),
            phrases,
            idle: false,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Drives the session forever. Per-connection failures never end the
    /// loop; only startup errors (in `bind`) are fatal.
    pub async fn run(&mut self) {
        debug!("first phrase selected: {:?}", self.round.phrase());
        loop {
            self.accept_pending().await;

            let removed = self
                .registry
                .check_liveness(self.config.heartbeat_timeout)
                .await;
            if !removed.is_empty() {
                self.registry.broadcast_roster().await;
            }

            if self.registry.is_empty() {
                if !self.idle {
                    info!("No players connected, idling");
                    self.idle = true;
                }
                sleep(self.config.idle_poll).await;
                continue;
            }
            if self.idle {
                info!("Exited idle state, {} player(s) ready", self.registry.len());
                self.idle = false;
            }

            self.turn
                .play_turn(
                    &mut self.registry,
                    &mut self.round,
                    self.phrases.as_mut(),
                    &self.config,
                )
                .await;
        }
    }

    /// Accepts at most one pending connection, bounded by the accept poll.
    /// At capacity the connection is accepted and immediately dropped.
    async fn accept_pending(&mut self) {
        let (stream, addr) = match timeout(self.config.accept_poll, self.listener.accept()).await {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                error!("accept failed: {}", e);
                return;
            }
            Err(_) => return,
        };

        if self.registry.is_full() {
            info!("Turning away {}: server is full", addr);
            return;
        }
        self.handshake(stream, addr).await;
    }

    /// Awaits the join frame, admits the player, and catches them up on
    /// the roster and the board. Anything but a timely join discards the
    /// connection without touching game state.
    async fn handshake(&mut self, mut stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed for {}: {}", addr, e);
        }

        let deadline = Instant::now() + self.config.join_timeout;
        let username = match read_frame(&mut stream, deadline).await {
            ReadOutcome::Frame(ClientFrame::Join { username }) => username,
            ReadOutcome::Frame(frame) => {
                warn!("Discarding {}: expected a join, got {:?}", addr, frame);
                return;
            }
            ReadOutcome::TimedOut => {
                warn!("Discarding {}: no join within the handshake window", addr);
                return;
            }
            ReadOutcome::Closed => {
                debug!("{} went away before joining", addr);
                return;
            }
            ReadOutcome::Malformed(reason) => {
                warn!("Discarding {}: {}", addr, reason);
                return;
            }
        };

        let id = match self.registry.add(stream, addr, username) {
            Some(id) => id,
            None => return,
        };
        self.registry.broadcast_roster().await;

        let board = ServerFrame::UpdateShortPhrase {
            errors: self.round.errors(),
            masked: self.round.masked().to_string(),
        };
        let attempts = ServerFrame::UpdateAttempts {
            tried: self.round.attempts().to_vec(),
            errors: self.round.errors(),
            max_errors: self.round.max_errors(),
        };
        if !self.registry.send_to(id, &board).await || !self.registry.send_to(id, &attempts).await {
            self.registry.broadcast_roster().await;
        }
    }
}
