mod game;
mod input;
mod network;
mod rendering;

use clap::Parser;
use log::info;
use std::io::{self, Write};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:9090")]
    server: String,

    /// Username to join with (prompted for when omitted)
    #[arg(short = 'u', long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let username = match args.username {
        Some(name) => name.trim().to_string(),
        None => ask_username()?,
    };
    let username = if username.is_empty() {
        "player".to_string()
    } else {
        username
    };

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = network::Client::new(&args.server, username);
    client.run().await?;

    println!("Goodbye!");
    Ok(())
}

fn ask_username() -> io::Result<String> {
    print!("Choose a username: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
