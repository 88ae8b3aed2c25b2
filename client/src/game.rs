use shared::ServerFrame;

/// Whose turn the server last announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Nobody,
    Mine,
    Other(String),
}

/// What the server is currently waiting to read from this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Idle,
    Letter,
    Phrase,
}

/// Local mirror of the board as the server last described it.
///
/// The client never advances the game on its own. Every field here is
/// overwritten by incoming frames, and the prompt is cleared as soon as an
/// answer is on the wire so a stray keystroke cannot send a second frame.
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub masked: String,
    pub errors: u8,
    pub max_errors: u8,
    pub tried: Vec<char>,
    pub players: Vec<String>,
    pub turn: Turn,
    pub prompt: Prompt,
    pub notice: Option<String>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            masked: String::new(),
            errors: 0,
            max_errors: 0,
            tried: Vec::new(),
            players: Vec::new(),
            turn: Turn::Nobody,
            prompt: Prompt::Idle,
            notice: None,
        }
    }

    /// Folds one server frame into the local picture.
    pub fn apply(&mut self, frame: &ServerFrame) {
        match frame {
            ServerFrame::UpdateShortPhrase { errors, masked } => {
                self.errors = *errors;
                self.masked = masked.clone();
            }
            ServerFrame::UpdatePlayers { players } => {
                self.players = players.clone();
            }
            ServerFrame::UpdateAttempts {
                tried,
                errors,
                max_errors,
            } => {
                self.tried = tried.clone();
                self.errors = *errors;
                self.max_errors = *max_errors;
            }
            ServerFrame::YourTurn => {
                self.turn = Turn::Mine;
                self.notice = None;
            }
            ServerFrame::OtherTurn { name } => {
                self.turn = Turn::Other(name.clone());
                self.prompt = Prompt::Idle;
                self.notice = None;
            }
            ServerFrame::SendLetter => {
                self.prompt = Prompt::Letter;
            }
            ServerFrame::SendShortPhrase => {
                self.prompt = Prompt::Phrase;
            }
            ServerFrame::LetterAccepted => {
                self.prompt = Prompt::Idle;
                self.notice = Some("Letter accepted".to_string());
            }
            ServerFrame::LetterRejected => {
                self.prompt = Prompt::Idle;
                self.notice = Some("Letter rejected".to_string());
            }
            ServerFrame::ShortPhraseAccepted => {
                self.prompt = Prompt::Idle;
                self.notice = Some("You solved the phrase".to_string());
            }
            ServerFrame::ShortPhraseRejected => {
                self.prompt = Prompt::Idle;
                self.notice = Some("That is not the phrase".to_string());
            }
            ServerFrame::Win => {
                self.turn = Turn::Nobody;
                self.prompt = Prompt::Idle;
                self.notice = Some("Round won!".to_string());
            }
            ServerFrame::Lose => {
                self.turn = Turn::Nobody;
                self.prompt = Prompt::Idle;
                self.notice = Some("Round lost, the figure is complete".to_string());
            }
            ServerFrame::NewGame => {
                self.turn = Turn::Nobody;
                self.prompt = Prompt::Idle;
                self.tried.clear();
                self.errors = 0;
                self.notice = Some("A new round begins".to_string());
            }
            ServerFrame::Heartbeat => {}
        }
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
