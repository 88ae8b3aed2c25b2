//! Integration tests for the multiplayer Hangman server
//!
//! These tests run a real server on a loopback socket and drive it with
//! scripted clients speaking the production wire format.

use client::game::{ClientGameState, Prompt, Turn};
use server::phrases::PhraseSource;
use server::session::{ServerConfig, Session};
use shared::{ClientFrame, FrameError, ServerFrame, FRAME_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// WIRE PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    /// Tests that a frame survives a real TCP hop byte for byte
    #[tokio::test]
    async fn frames_survive_a_tcp_roundtrip() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let echo = tokio::spawn(async move {
            let (mut peer, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; FRAME_SIZE];
            peer.read_exact(&mut buf).await.unwrap();
            peer.write_all(&buf).await.unwrap();
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let sent = ClientFrame::Join {
            username: "alice".to_string(),
        };
        stream.write_all(&sent.encode()).await.unwrap();

        let mut buf = [0u8; FRAME_SIZE];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(ClientFrame::decode(&buf).unwrap(), sent);

        echo.await.unwrap();
    }

    /// Tests that action tags only mean something within their direction
    #[test]
    fn tags_are_scoped_to_a_direction() {
        let bytes = ServerFrame::Win.encode();
        assert_eq!(
            ClientFrame::decode(&bytes).unwrap(),
            ClientFrame::HeartbeatAck
        );

        let bytes = ClientFrame::HeartbeatAck.encode();
        assert_eq!(ServerFrame::decode(&bytes).unwrap(), ServerFrame::Win);
    }

    /// Tests that junk on the wire is refused rather than misread
    #[test]
    fn malformed_frames_are_rejected() {
        let short = [0u8; 12];
        assert_eq!(ClientFrame::decode(&short), Err(FrameError::Length(12)));

        let mut unknown = [0u8; FRAME_SIZE];
        unknown[0..4].copy_from_slice(&99u32.to_le_bytes());
        assert_eq!(ServerFrame::decode(&unknown), Err(FrameError::UnknownTag(99)));
    }
}

/// SESSION AND HANDSHAKE TESTS
mod session_tests {
    use super::*;

    /// Tests that a joiner is announced and caught up on the board
    #[tokio::test]
    async fn joining_yields_the_roster_and_the_board() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("the roster", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players } if *players == ["alice".to_string()])
            })
            .await;
        alice
            .expect("the masked board", |f| {
                matches!(f, ServerFrame::UpdateShortPhrase { errors: 0, masked }
                    if masked.as_str() == "___ ___ ___")
            })
            .await;
        alice
            .expect("the attempt list", |f| {
                matches!(f, ServerFrame::UpdateAttempts { tried, errors: 0, max_errors: 10 }
                    if tried.is_empty())
            })
            .await;
    }

    /// Tests that a late joiner sees the attempts already on the board
    #[tokio::test]
    async fn a_late_joiner_is_caught_up_mid_round() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("her prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        alice.letter('C').await;
        alice
            .expect("the verdict", |f| matches!(f, ServerFrame::LetterAccepted))
            .await;
        alice
            .expect("the phrase prompt", |f| {
                matches!(f, ServerFrame::SendShortPhrase)
            })
            .await;
        alice.guess("WRONG").await;
        alice
            .expect("the refusal", |f| {
                matches!(f, ServerFrame::ShortPhraseRejected)
            })
            .await;

        let mut bob = TestClient::join(addr, "bob").await;
        bob.expect("the roster", |f| {
            matches!(f, ServerFrame::UpdatePlayers { players }
                if *players == ["alice".to_string(), "bob".to_string()])
        })
        .await;
        bob.expect("the revealed letters", |f| {
            matches!(f, ServerFrame::UpdateShortPhrase { masked, .. }
                if masked.as_str() == "C__ ___ ___")
        })
        .await;
        bob.expect("the attempts so far", |f| {
            matches!(f, ServerFrame::UpdateAttempts { tried, .. } if *tried == ['C'])
        })
        .await;
    }

    /// Tests that the fourth connection is turned away at the door
    #[tokio::test]
    async fn a_full_server_turns_connections_away() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("her admission", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 1)
            })
            .await;
        let mut bob = TestClient::join(addr, "bob").await;
        bob.expect("his admission", |f| {
            matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 2)
        })
        .await;
        let mut carol = TestClient::join(addr, "carol").await;
        carol
            .expect("her admission", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 3)
            })
            .await;

        let dave = TestClient::join(addr, "dave").await;
        dave.expect_closed().await;
    }
}

/// GAME FLOW TESTS
mod game_flow_tests {
    use super::*;

    /// Tests that a hit is confirmed to the guesser and broadcast to all
    #[tokio::test]
    async fn a_hit_letter_reaches_every_board() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        play_one_turn(&mut alice, 'C').await;

        let mut bob = TestClient::join(addr, "bob").await;
        bob.expect("his admission", |f| {
            matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 2)
        })
        .await;

        bob.expect("his turn", |f| matches!(f, ServerFrame::YourTurn))
            .await;
        alice
            .expect("the turn announcement", |f| {
                matches!(f, ServerFrame::OtherTurn { name } if name.as_str() == "bob")
            })
            .await;

        bob.expect("his prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        bob.letter('T').await;
        bob.expect("the verdict", |f| matches!(f, ServerFrame::LetterAccepted))
            .await;

        alice
            .expect("the updated board", |f| {
                matches!(f, ServerFrame::UpdateShortPhrase { masked, .. }
                    if masked.as_str() == "C_T ___ ___")
            })
            .await;
        bob.expect("the updated board", |f| {
            matches!(f, ServerFrame::UpdateShortPhrase { masked, .. }
                if masked.as_str() == "C_T ___ ___")
        })
        .await;
        bob.expect("the attempt list", |f| {
            matches!(f, ServerFrame::UpdateAttempts { tried, .. } if *tried == ['C', 'T'])
        })
        .await;

        bob.expect("the phrase prompt", |f| {
            matches!(f, ServerFrame::SendShortPhrase)
        })
        .await;
        bob.guess("WRONG").await;
        bob.expect("the refusal", |f| {
            matches!(f, ServerFrame::ShortPhraseRejected)
        })
        .await;
    }

    /// Tests that a miss is counted and the phrase stage still follows
    #[tokio::test]
    async fn a_missed_letter_is_counted() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("her prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        alice.letter('Z').await;
        alice
            .expect("the verdict", |f| matches!(f, ServerFrame::LetterRejected))
            .await;
        alice
            .expect("the updated board", |f| {
                matches!(f, ServerFrame::UpdateShortPhrase { errors: 1, masked }
                    if masked.as_str() == "___ ___ ___")
            })
            .await;
        alice
            .expect("the attempt list", |f| {
                matches!(f, ServerFrame::UpdateAttempts { tried, errors: 1, .. }
                    if *tried == ['Z'])
            })
            .await;
        alice
            .expect("the phrase prompt", |f| {
                matches!(f, ServerFrame::SendShortPhrase)
            })
            .await;
        alice.guess("WRONG").await;
        alice
            .expect("the refusal", |f| {
                matches!(f, ServerFrame::ShortPhraseRejected)
            })
            .await;
    }

    /// Tests that solving the phrase wins the round and deals the next one
    #[tokio::test]
    async fn solving_the_phrase_starts_a_new_round() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("her prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        alice.letter('C').await;
        alice
            .expect("the verdict", |f| matches!(f, ServerFrame::LetterAccepted))
            .await;
        alice
            .expect("the phrase prompt", |f| {
                matches!(f, ServerFrame::SendShortPhrase)
            })
            .await;
        alice.guess("cat and dog").await;

        alice
            .expect("the acceptance", |f| {
                matches!(f, ServerFrame::ShortPhraseAccepted)
            })
            .await;
        alice
            .expect("the win", |f| matches!(f, ServerFrame::Win))
            .await;
        alice
            .expect("the next round", |f| matches!(f, ServerFrame::NewGame))
            .await;
        alice
            .expect("the fresh board", |f| {
                matches!(f, ServerFrame::UpdateShortPhrase { errors: 0, masked }
                    if masked.as_str() == "___ ___ ___")
            })
            .await;
        alice
            .expect("the cleared attempts", |f| {
                matches!(f, ServerFrame::UpdateAttempts { tried, errors: 0, .. }
                    if tried.is_empty())
            })
            .await;
    }

    /// Tests that turns move round robin in join order
    #[tokio::test]
    async fn turns_rotate_in_join_order() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        play_one_turn(&mut alice, 'C').await;

        let mut bob = TestClient::join(addr, "bob").await;
        bob.expect("his admission", |f| {
            matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 2)
        })
        .await;

        bob.expect("his turn", |f| matches!(f, ServerFrame::YourTurn))
            .await;
        alice
            .expect("the turn announcement", |f| {
                matches!(f, ServerFrame::OtherTurn { name } if name.as_str() == "bob")
            })
            .await;
        play_one_turn(&mut bob, 'X').await;

        alice
            .expect("her turn again", |f| matches!(f, ServerFrame::YourTurn))
            .await;
        bob.expect("the turn announcement", |f| {
            matches!(f, ServerFrame::OtherTurn { name } if name.as_str() == "alice")
        })
        .await;
    }

    /// Tests that blocked letters unlock once enough attempts are resolved
    #[tokio::test]
    async fn blocked_letters_unlock_after_enough_attempts() {
        let mut config = fast_config();
        config.blocked_letters = "AEIOU".to_string();
        config.blocked_threshold = 2;
        let (addr, _server) = start_server(config).await;

        let mut alice = TestClient::join(addr, "alice").await;

        // Too early for a vowel: rejected without being recorded.
        alice
            .expect("her prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        alice.letter('E').await;
        alice
            .expect("the refusal", |f| matches!(f, ServerFrame::LetterRejected))
            .await;

        play_one_turn(&mut alice, 'C').await;
        play_one_turn(&mut alice, 'T').await;

        alice
            .expect("her prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        alice.letter('A').await;
        alice
            .expect("the vowel now accepted", |f| {
                matches!(f, ServerFrame::LetterAccepted)
            })
            .await;
        alice
            .expect("the attempt list", |f| {
                matches!(f, ServerFrame::UpdateAttempts { tried, .. }
                    if *tried == ['C', 'T', 'A'])
            })
            .await;
    }

    /// Tests that a timed-out prompt skips the turn without dropping anyone
    #[tokio::test]
    async fn a_slow_player_is_skipped_not_dropped() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("her prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;

        // Ignore it. The turn lapses and a fresh prompt proves membership.
        alice
            .expect("the next prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        alice.letter('C').await;
        alice
            .expect("the verdict", |f| matches!(f, ServerFrame::LetterAccepted))
            .await;
    }

    /// Tests that a terminal's mirror of the game matches the server
    #[tokio::test]
    async fn a_thin_client_mirror_stays_consistent() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        let mut mirror = ClientGameState::new();

        for _ in 0..40 {
            let frame = alice.next_frame().await;
            mirror.apply(&frame);
            match frame {
                ServerFrame::SendLetter => alice.letter('C').await,
                ServerFrame::SendShortPhrase => alice.guess("WRONG").await,
                ServerFrame::ShortPhraseRejected => break,
                _ => {}
            }
        }

        assert_eq!(mirror.masked, "C__ ___ ___");
        assert_eq!(mirror.tried, vec!['C']);
        assert_eq!(mirror.errors, 0);
        assert_eq!(mirror.players, vec!["alice".to_string()]);
        assert_eq!(mirror.turn, Turn::Mine);
        assert_eq!(mirror.prompt, Prompt::Idle);
    }
}

/// DISCONNECT AND LIVENESS TESTS
mod disconnect_tests {
    use super::*;

    /// Tests that a prompted player vanishing passes the turn on
    #[tokio::test]
    async fn a_mid_prompt_disconnect_passes_the_turn() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("her admission", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 1)
            })
            .await;
        play_one_turn(&mut alice, 'C').await;

        let mut bob = TestClient::join(addr, "bob").await;
        bob.expect("his admission", |f| {
            matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 2)
        })
        .await;
        bob.expect("his prompt", |f| matches!(f, ServerFrame::SendLetter))
            .await;
        drop(bob);

        alice
            .expect("the turn announcement", |f| {
                matches!(f, ServerFrame::OtherTurn { name } if name.as_str() == "bob")
            })
            .await;
        alice
            .expect("the shrunken roster", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players }
                    if *players == ["alice".to_string()])
            })
            .await;
        alice
            .expect("her next turn", |f| matches!(f, ServerFrame::YourTurn))
            .await;
    }

    /// Tests that a client ignoring heartbeats is reaped by the sweep
    #[tokio::test]
    async fn ignoring_heartbeats_gets_a_player_dropped() {
        let (addr, _server) = start_server(fast_config()).await;

        let mut alice = TestClient::join(addr, "alice").await;
        alice
            .expect("her admission", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 1)
            })
            .await;

        let mallory = TestClient::join_deaf(addr, "mallory").await;

        alice
            .expect("the grown roster", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players } if players.len() == 2)
            })
            .await;
        mallory.expect_closed().await;
        alice
            .expect("the shrunken roster", |f| {
                matches!(f, ServerFrame::UpdatePlayers { players }
                    if *players == ["alice".to_string()])
            })
            .await;
    }
}

// HELPER FUNCTIONS

fn fast_config() -> ServerConfig {
    ServerConfig {
        blocked_letters: String::new(),
        join_timeout: Duration::from_secs(1),
        letter_timeout: Duration::from_millis(500),
        phrase_timeout: Duration::from_millis(500),
        heartbeat_timeout: Duration::from_millis(500),
        write_timeout: Duration::from_secs(1),
        accept_poll: Duration::from_millis(10),
        idle_poll: Duration::from_millis(10),
        round_pause: Duration::from_millis(50),
        ..Default::default()
    }
}

struct FixedPhrases(&'static str);

impl PhraseSource for FixedPhrases {
    fn next_phrase(&mut self) -> String {
        self.0.to_string()
    }
}

async fn start_server(config: ServerConfig) -> (SocketAddr, JoinHandle<()>) {
    let mut session = Session::bind("127.0.0.1:0", config, Box::new(FixedPhrases("CAT AND DOG")))
        .await
        .expect("bind the server");
    let addr = session.local_addr().expect("server address");
    let handle = tokio::spawn(async move { session.run().await });
    (addr, handle)
}

/// Drives one full turn: a letter guess, then a wrong phrase guess.
async fn play_one_turn(player: &mut TestClient, letter: char) {
    player
        .expect("the letter prompt", |f| matches!(f, ServerFrame::SendLetter))
        .await;
    player.letter(letter).await;
    player
        .expect("the letter verdict", |f| {
            matches!(
                f,
                ServerFrame::LetterAccepted | ServerFrame::LetterRejected
            )
        })
        .await;
    player
        .expect("the phrase prompt", |f| {
            matches!(f, ServerFrame::SendShortPhrase)
        })
        .await;
    player.guess("WRONG").await;
    player
        .expect("the phrase verdict", |f| {
            matches!(f, ServerFrame::ShortPhraseRejected)
        })
        .await;
}

/// A scripted player: joins on construction, acks heartbeats from a
/// background task, and hands every other frame to the test body.
struct TestClient {
    name: String,
    frames: mpsc::Receiver<ServerFrame>,
    outgoing: mpsc::Sender<ClientFrame>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl TestClient {
    async fn join(addr: SocketAddr, username: &str) -> TestClient {
        Self::join_with(addr, username, true).await
    }

    /// A client that never answers heartbeats.
    async fn join_deaf(addr: SocketAddr, username: &str) -> TestClient {
        Self::join_with(addr, username, false).await
    }

    async fn join_with(addr: SocketAddr, username: &str, ack_heartbeats: bool) -> TestClient {
        let stream = TcpStream::connect(addr).await.expect("connect to the server");
        let (mut read_half, mut write_half) = stream.into_split();

        let (frame_tx, frames) = mpsc::channel::<ServerFrame>(64);
        let (outgoing, mut out_rx) = mpsc::channel::<ClientFrame>(64);

        let writer = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if write_half.write_all(&frame.encode()).await.is_err() {
                    break;
                }
            }
        });

        let ack_tx = outgoing.clone();
        let reader = tokio::spawn(async move {
            let mut buf = [0u8; FRAME_SIZE];
            loop {
                if read_half.read_exact(&mut buf).await.is_err() {
                    break;
                }
                let frame = ServerFrame::decode(&buf).expect("well-formed server frame");
                if matches!(frame, ServerFrame::Heartbeat) {
                    if ack_heartbeats && ack_tx.send(ClientFrame::HeartbeatAck).await.is_err() {
                        break;
                    }
                } else if frame_tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        outgoing
            .send(ClientFrame::Join {
                username: username.to_string(),
            })
            .await
            .expect("queue the join frame");

        TestClient {
            name: username.to_string(),
            frames,
            outgoing,
            reader,
            writer,
        }
    }

    async fn send(&self, frame: ClientFrame) {
        self.outgoing.send(frame).await.expect("queue a frame");
    }

    async fn letter(&self, letter: char) {
        self.send(ClientFrame::Letter { letter }).await;
    }

    async fn guess(&self, guess: &str) {
        self.send(ClientFrame::ShortPhrase {
            guess: guess.to_string(),
        })
        .await;
    }

    /// Waits for the next frame the predicate accepts, discarding others.
    async fn expect<F>(&mut self, what: &str, pred: F) -> ServerFrame
    where
        F: Fn(&ServerFrame) -> bool,
    {
        let name = self.name.clone();
        timeout(Duration::from_secs(5), async {
            loop {
                match self.frames.recv().await {
                    Some(frame) if pred(&frame) => return frame,
                    Some(_) => continue,
                    None => panic!("{}: connection ended while waiting for {}", name, what),
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{}: timed out waiting for {}", name, what))
    }

    /// Receives the next frame, whatever it is.
    async fn next_frame(&mut self) -> ServerFrame {
        let name = self.name.clone();
        timeout(Duration::from_secs(5), self.frames.recv())
            .await
            .unwrap_or_else(|_| panic!("{}: timed out waiting for a frame", name))
            .unwrap_or_else(|| panic!("{}: connection ended unexpectedly", name))
    }

    /// Waits for the server to close this connection.
    async fn expect_closed(mut self) {
        let name = self.name.clone();
        timeout(Duration::from_secs(5), async {
            while self.frames.recv().await.is_some() {}
        })
        .await
        .unwrap_or_else(|_| panic!("{}: timed out waiting for the connection to close", name));
    }
}

impl Drop for TestClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
