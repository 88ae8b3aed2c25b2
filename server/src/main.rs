mod phrases;
mod registry;
mod round;
mod session;
mod turn;

use clap::Parser;
use log::info;
use phrases::{MarkovPhrases, PhraseList, PhraseSource};
use session::{ServerConfig, Session};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "9090")]
    port: u16,

    /// Phrase file, one phrase per line
    #[arg(long, default_value = "phrases.txt")]
    phrases: String,

    /// Invent phrases with a Markov chain trained on the phrase file
    #[arg(long)]
    markov: bool,

    /// Errors that lose the round
    #[arg(long, default_value = "10")]
    max_errors: u8,

    /// Letters refused until enough attempts have resolved
    #[arg(long, default_value = "AEIOU")]
    blocked_letters: String,

    /// Resolved attempts required before blocked letters unlock
    #[arg(long, default_value = "3")]
    blocked_attempts: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let phrases: Box<dyn PhraseSource> = if args.markov {
        info!("Inventing phrases with a chain trained on {}", args.phrases);
        Box::new(MarkovPhrases::from_file(&args.phrases)?)
    } else {
        let list = PhraseList::from_file(&args.phrases)?;
        info!("Loaded {} phrases from {}", list.len(), args.phrases);
        Box::new(list)
    };

    let config = ServerConfig {
        max_errors: args.max_errors,
        blocked_letters: args.blocked_letters,
        blocked_threshold: args.blocked_attempts,
        ..Default::default()
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut session = Session::bind(&address, config, phrases).await?;
    info!(
        "Hangman server ready on {} (up to {} players)",
        session.local_addr()?,
        shared::MAX_PLAYERS
    );
    session.run().await;
    Ok(())
}
