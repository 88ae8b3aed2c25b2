use crate::game::{ClientGameState, Prompt, Turn};
use std::io::{self, Write};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";
const GALLOWS_PARTS: usize = 6;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    /// Redraws the whole screen from the current state.
    pub fn present(&self, state: &ClientGameState) {
        print!("{}{}", CLEAR_SCREEN, self.frame(state));
        let _ = io::stdout().flush();
    }

    /// Builds the full screen contents as one string.
    pub fn frame(&self, state: &ClientGameState) -> String {
        let mut out = String::new();

        out.push_str("=== HANGMAN ===\n\n");
        out.push_str(&gallows(gallows_stage(state.errors, state.max_errors)));
        out.push('\n');

        if state.masked.is_empty() {
            out.push_str("Waiting for the first round...\n");
        } else {
            out.push_str("Phrase: ");
            out.push_str(&spaced(&state.masked));
            out.push('\n');
        }

        if !state.tried.is_empty() {
            out.push_str("Tried:  ");
            for (i, letter) in state.tried.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push(*letter);
            }
            out.push('\n');
        }
        out.push_str(&format!("Errors: {}/{}\n", state.errors, state.max_errors));

        out.push_str("\nPlayers:\n");
        if state.players.is_empty() {
            out.push_str("  (nobody yet)\n");
        } else {
            for name in &state.players {
                out.push_str(&format!("  {}\n", name));
            }
        }

        out.push('\n');
        match &state.turn {
            Turn::Mine => out.push_str("It is your turn.\n"),
            Turn::Other(name) => out.push_str(&format!("{} is playing.\n", name)),
            Turn::Nobody => out.push_str("Waiting for the round.\n"),
        }

        if let Some(notice) = &state.notice {
            out.push_str(&format!("* {}\n", notice));
        }

        match state.prompt {
            Prompt::Letter => out.push_str("\nGuess a letter: "),
            Prompt::Phrase => out.push_str("\nType the whole phrase: "),
            Prompt::Idle => {}
        }

        out
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// How many body parts to draw for the given error count.
///
/// Scales linearly so the figure completes exactly when the error limit is
/// reached, whatever the limit is configured to.
fn gallows_stage(errors: u8, max_errors: u8) -> usize {
    if max_errors == 0 {
        return 0;
    }
    (errors as usize * GALLOWS_PARTS / max_errors as usize).min(GALLOWS_PARTS)
}

fn gallows(parts: usize) -> String {
    let head = if parts >= 1 { "O" } else { " " };
    let body = if parts >= 2 { "|" } else { " " };
    let left_arm = if parts >= 3 { "/" } else { " " };
    let right_arm = if parts >= 4 { "\\" } else { " " };
    let left_leg = if parts >= 5 { "/" } else { " " };
    let right_leg = if parts >= 6 { "\\" } else { " " };

    format!(
        "  +---+\n  |   |\n  {}   |\n {}{}{}  |\n {} {}  |\n      |\n =======\n",
        head, left_arm, body, right_arm, left_leg, right_leg
    )
}

fn spaced(masked: &str) -> String {
    let mut out = String::new();
    for (i, c) in masked.chars().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
