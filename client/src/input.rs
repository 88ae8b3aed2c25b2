//! Terminal input as an async line stream.

use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Wraps stdin as a stream of trimmed lines.
///
/// `next_line` is cancel safe, so the network loop can race it against
/// incoming frames without losing typed characters.
pub struct InputReader {
    lines: Lines<BufReader<Stdin>>,
}

impl InputReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next line from the terminal, trimmed. None once stdin closes.
    pub async fn next_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read from the terminal: {}", e);
                None
            }
        }
    }
}

impl Default for InputReader {
    fn default() -> Self {
        Self::new()
    }
}

/// First non-whitespace character of a typed line, if any.
///
/// The server judges whether the character is a valid guess; the client only
/// refuses to send an empty answer.
pub fn first_letter(line: &str) -> Option<char> {
    line.chars().find(|c| !c.is_whitespace())
}
