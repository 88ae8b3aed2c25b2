use crate::game::{ClientGameState, Prompt};
use crate::input::{first_letter, InputReader};
use crate::rendering::Renderer;
use log::{debug, error, info};
use shared::{ClientFrame, ServerFrame, FRAME_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub struct Client {
    server_addr: String,
    username: String,
    game_state: ClientGameState,
    renderer: Renderer,
}

impl Client {
    pub fn new(server_addr: &str, username: String) -> Self {
        Client {
            server_addr: server_addr.to_string(),
            username,
            game_state: ClientGameState::new(),
            renderer: Renderer::new(),
        }
    }

    /// Connects, joins, and plays until the server or the terminal goes away.
    ///
    /// Frames are pulled off the socket by a background task and handed over
    /// a channel, so the main loop can race them against typed lines without
    /// tearing a half-read frame. Heartbeats are acknowledged here before any
    /// other work so the server never mistakes a thinking player for a dead
    /// one.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.server_addr);
        let stream = TcpStream::connect(&self.server_addr).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle: {}", e);
        }
        let (mut read_half, mut write_half) = stream.into_split();

        write_half
            .write_all(
                &ClientFrame::Join {
                    username: self.username.clone(),
                }
                .encode(),
            )
            .await?;
        info!("Joined as {}", self.username);

        let (tx, mut rx) = mpsc::channel::<ServerFrame>(64);
        let reader = tokio::spawn(async move {
            let mut buf = [0u8; FRAME_SIZE];
            loop {
                if let Err(e) = read_half.read_exact(&mut buf).await {
                    debug!("Read loop finished: {}", e);
                    break;
                }
                match ServerFrame::decode(&buf) {
                    Ok(frame) => {
                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Stream is desynchronized: {}", e);
                        break;
                    }
                }
            }
        });

        let mut input = InputReader::new();
        self.renderer.present(&self.game_state);

        loop {
            tokio::select! {
                maybe_frame = rx.recv() => {
                    match maybe_frame {
                        Some(ServerFrame::Heartbeat) => {
                            write_half
                                .write_all(&ClientFrame::HeartbeatAck.encode())
                                .await?;
                        }
                        Some(frame) => {
                            self.game_state.apply(&frame);
                            self.renderer.present(&self.game_state);
                        }
                        None => {
                            info!("Server closed the connection");
                            break;
                        }
                    }
                },

                maybe_line = input.next_line() => {
                    match maybe_line {
                        Some(line) => {
                            self.handle_line(&line, &mut write_half).await?;
                        }
                        None => {
                            info!("Terminal input ended, leaving");
                            break;
                        }
                    }
                },
            }
        }

        reader.abort();
        Ok(())
    }

    /// Turns a typed line into a frame when the server asked for one.
    ///
    /// The prompt is cleared the moment an answer is sent. The server reads
    /// exactly one frame per prompt, and a second one would be picked up
    /// later by the liveness sweep and get the player dropped.
    async fn handle_line(
        &mut self,
        line: &str,
        writer: &mut OwnedWriteHalf,
    ) -> std::io::Result<()> {
        match self.game_state.prompt {
            Prompt::Letter => {
                if let Some(letter) = first_letter(line) {
                    writer
                        .write_all(&ClientFrame::Letter { letter }.encode())
                        .await?;
                    self.game_state.prompt = Prompt::Idle;
                    self.renderer.present(&self.game_state);
                } else {
                    self.game_state.notice = Some("Type a letter first".to_string());
                    self.renderer.present(&self.game_state);
                }
            }
            Prompt::Phrase => {
                if line.is_empty() {
                    self.game_state.notice =
                        Some("Type the whole phrase, or sit out the clock".to_string());
                    self.renderer.present(&self.game_state);
                } else {
                    writer
                        .write_all(
                            &ClientFrame::ShortPhrase {
                                guess: line.to_string(),
                            }
                            .encode(),
                        )
                        .await?;
                    self.game_state.prompt = Prompt::Idle;
                    self.renderer.present(&self.game_state);
                }
            }
            Prompt::Idle => {
                self.game_state.notice = Some("Nothing is expected from you right now".to_string());
                self.renderer.present(&self.game_state);
            }
        }
        Ok(())
    }
}
