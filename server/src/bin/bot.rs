//! Scripted player for manual testing: joins, acks heartbeats, and answers
//! prompts with random unused letters. Run a few of these against a server
//! to watch a full multiplayer round without real humans.

use clap::Parser;
use log::{debug, info, warn};
use rand::Rng;
use shared::{ClientFrame, ServerFrame, FRAME_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:9090")]
    server: String,

    /// Name to join with
    #[arg(short = 'u', long, default_value = "bot")]
    username: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut stream = TcpStream::connect(&args.server).await?;
    stream
        .write_all(
            &ClientFrame::Join {
                username: args.username.clone(),
            }
            .encode(),
        )
        .await?;
    info!("Joined {} as {}", args.server, args.username);

    let mut tried: Vec<char> = Vec::new();
    let mut buf = [0u8; FRAME_SIZE];
    loop {
        if let Err(e) = stream.read_exact(&mut buf).await {
            info!("Server went away: {}", e);
            return Ok(());
        }
        let frame = match ServerFrame::decode(&buf) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Stream is desynchronized: {}", e);
                return Err(e.into());
            }
        };

        match frame {
            ServerFrame::Heartbeat => {
                stream.write_all(&ClientFrame::HeartbeatAck.encode()).await?;
            }
            ServerFrame::SendLetter => {
                let letter = pick_letter(&tried);
                info!("Guessing {}", letter);
                stream
                    .write_all(&ClientFrame::Letter { letter }.encode())
                    .await?;
            }
            ServerFrame::SendShortPhrase => {
                // Not clever enough to solve phrases.
                stream
                    .write_all(
                        &ClientFrame::ShortPhrase {
                            guess: "NO IDEA".to_string(),
                        }
                        .encode(),
                    )
                    .await?;
            }
            ServerFrame::UpdateAttempts { tried: letters, .. } => {
                tried = letters;
            }
            ServerFrame::UpdateShortPhrase { errors, masked } => {
                info!("Board: {} ({} errors)", masked, errors);
            }
            ServerFrame::NewGame => {
                tried.clear();
                info!("New round");
            }
            ServerFrame::Win => info!("Round won"),
            ServerFrame::Lose => info!("Round lost"),
            other => debug!("{:?}", other),
        }
    }
}

fn pick_letter(tried: &[char]) -> char {
    if tried.len() >= 26 {
        return 'A';
    }
    let mut rng = rand::thread_rng();
    loop {
        let letter = (b'A' + rng.gen_range(0..26)) as char;
        if !tried.contains(&letter) {
            return letter;
        }
    }
}
