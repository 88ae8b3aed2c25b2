//! # Hangman Server Library
//!
//! This library provides the authoritative server for multiplayer Hangman
//! over TCP. It owns the secret phrase, the board, and the turn order;
//! clients only ever see masked state and answer prompts. All rule
//! decisions are made here, so a modified client can learn nothing the
//! board does not already show.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Rules
//! The server holds the only copy of the secret phrase and resolves every
//! guess. Clients receive masked-phrase and attempt-list updates and render
//! them verbatim.
//!
//! ### Player Management
//! Handles the complete lifecycle of player connections including:
//! - Join handshake and capacity refusal
//! - Heartbeat-based liveness sweeps
//! - Forced removal on protocol violations
//! - Roster broadcasts whenever membership changes
//!
//! ### Turn Scheduling
//! Players take turns in join order, round-robin. Each turn prompts for a
//! letter and, when the letter resolved, for a full phrase guess. Prompt
//! timeouts skip the turn; they never remove the player.
//!
//! ## Architecture Design
//!
//! ### Single-Task Event Loop
//! One tokio task owns the listener and all game state, processing
//! connections, liveness, and turns sequentially. There are no locks and
//! no shared-state races; concurrency is I/O multiplexing with explicit
//! deadlines on every await.
//!
//! ### Fixed-Size TCP Frames
//! All traffic is 128-byte frames (see the `shared` crate). Reads
//! accumulate under a deadline so a slow peer can never wedge the loop,
//! and a frame cut short by EOF or deadline counts as a violation.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! Connected players, join order, the turn pointer, and all per-player
//! frame I/O with bounded writes and deadline reads.
//!
//! ### Round Module (`round`)
//! Pure game rules: masking, letter resolution, phrase comparison, and
//! win/lose detection. No I/O and no timing.
//!
//! ### Turn Module (`turn`)
//! The per-turn state machine: selection, prompts, verdicts, broadcasts,
//! and round rollover.
//!
//! ### Session Module (`session`)
//! The top-level loop tying the listener, registry, round, and turn
//! coordinator together, plus the server configuration.
//!
//! ### Phrases Module (`phrases`)
//! Phrase sourcing for new rounds: a validated phrase file, or a small
//! Markov generator trained on one.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::phrases::PhraseList;
//! use server::session::{ServerConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let phrases = Box::new(PhraseList::from_file("phrases.txt")?);
//!     let mut session =
//!         Session::bind("127.0.0.1:9090", ServerConfig::default(), phrases).await?;
//!     // Runs forever: accepts players, sweeps liveness, plays turns.
//!     session.run().await;
//!     Ok(())
//! }
//! ```

pub mod phrases;
pub mod registry;
pub mod round;
pub mod session;
pub mod turn;
