//! # Game Client Library
//!
//! This library provides the complete client-side implementation for the
//! multiplayer Hangman game. It handles all aspects of client functionality
//! including terminal input, network communication, local game state
//! tracking, and rendering.
//!
//! ## Architecture Overview
//!
//! The client is a thin terminal in front of an authoritative server. It
//! never advances the game on its own; it draws what the server last said
//! and only speaks when spoken to:
//!
//! ### Server Authority
//! Every rule lives on the server. The client holds no phrase, no alphabet
//! and no turn order, only a mirror of the board assembled from incoming
//! frames. A malicious or buggy client can at worst lose its own turn.
//!
//! ### Prompted Input
//! Typed lines are turned into frames only while a prompt from the server is
//! outstanding, and the prompt is cleared as soon as the answer is on the
//! wire. Unsolicited keystrokes never reach the socket, which keeps the
//! fixed request-response rhythm of the protocol intact.
//!
//! ### Liveness
//! Heartbeat frames are acknowledged immediately, ahead of any redraw, so a
//! player who is merely thinking is never mistaken for a dead connection.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Contains the client-side picture of the game:
//! - Masked phrase, error count and tried letters
//! - Player roster and whose turn it is
//! - The currently outstanding prompt, if any
//!
//! ### Input Module (`input`)
//! Handles terminal input:
//! - Stdin wrapped as an async stream of trimmed lines
//! - Cancel safe reads that can be raced against network frames
//! - Extraction of the guessed character from a typed line
//!
//! ### Network Module (`network`)
//! Manages all client-server communication:
//! - TCP connection and the join handshake
//! - A background task that reassembles fixed-size frames
//! - Immediate heartbeat acknowledgements
//! - Translation of typed lines into answer frames
//!
//! ### Rendering Module (`rendering`)
//! Provides the visual representation of the game:
//! - Full-screen redraw of the board on every update
//! - The gallows figure, scaled to the configured error limit
//! - Roster, attempt list and prompt lines
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("127.0.0.1:9090", "alice".to_string());
//!     client.run().await
//! }
//! ```
//!
//! ## Design Philosophy
//!
//! ### Nothing Speculative
//! The client shows confirmed state only. A guess does not appear on the
//! board until the server has judged it, so two players never see different
//! games.
//!
//! ### One Loop, No Locks
//! A single select loop owns the terminal, the frame channel and the write
//! half of the socket. There is no shared mutable state and nothing to
//! poison when a task ends.
//!
//! ### Graceful Exits
//! Closing the terminal or losing the server both unwind through the same
//! path: the loop ends, the reader task is stopped, and the user gets a
//! farewell instead of a panic.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
