//! Wire protocol shared by the Hangman server and client.
//!
//! Every message is one fixed-size frame of [`FRAME_SIZE`] bytes: a
//! little-endian `u32` action tag in bytes `[0..4)` followed by a 124-byte
//! payload. Encoding starts from an all-zero buffer, so unused payload bytes
//! are always zero and text fields are NUL-terminated unless they fill their
//! slot exactly. Tags are direction-scoped: [`ClientFrame`] holds everything
//! a client may send, [`ServerFrame`] everything a server may send, and each
//! decoder rejects the other side's tags.

use thiserror::Error;

/// Size of every frame in both directions.
pub const FRAME_SIZE: usize = 128;
/// Bytes available after the action tag.
pub const PAYLOAD_SIZE: usize = FRAME_SIZE - 4;
/// Server capacity, and the number of name slots in a roster frame.
pub const MAX_PLAYERS: usize = 3;
/// Longest username the server keeps, in bytes.
pub const MAX_USERNAME: usize = 63;
/// Longest name carried per slot in a roster frame, in bytes.
pub const ROSTER_NAME: usize = 40;
/// Longest phrase, masked phrase, or phrase guess, in bytes.
pub const MAX_PHRASE: usize = 123;
/// Capacity of the tried-letter list on the wire.
pub const ALPHABET: usize = 26;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame is {0} bytes, expected {FRAME_SIZE}")]
    Length(usize),
    #[error("unknown action tag {0}")]
    UnknownTag(u32),
    #[error("text field is not valid UTF-8")]
    Utf8,
    #[error("malformed field: {0}")]
    Field(&'static str),
}

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Join { username: String },
    Letter { letter: char },
    ShortPhrase { guess: String },
    HeartbeatAck,
}

impl ClientFrame {
    fn tag(&self) -> u32 {
        match self {
            ClientFrame::Join { .. } => 0,
            ClientFrame::Letter { .. } => 1,
            ClientFrame::ShortPhrase { .. } => 2,
            ClientFrame::HeartbeatAck => 3,
        }
    }

    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut buf = [0u8; FRAME_SIZE];
        buf[0..4].copy_from_slice(&self.tag().to_le_bytes());
        match self {
            ClientFrame::Join { username } => {
                put_str(&mut buf[4..68], username, MAX_USERNAME);
            }
            ClientFrame::Letter { letter } => {
                buf[4] = ascii_byte(*letter);
            }
            ClientFrame::ShortPhrase { guess } => {
                put_str(&mut buf[4..128], guess, MAX_PHRASE);
            }
            ClientFrame::HeartbeatAck => {}
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != FRAME_SIZE {
            return Err(FrameError::Length(buf.len()));
        }
        let tag = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        match tag {
            0 => Ok(ClientFrame::Join {
                username: get_str(&buf[4..68], MAX_USERNAME)?,
            }),
            1 => Ok(ClientFrame::Letter {
                letter: buf[4] as char,
            }),
            2 => Ok(ClientFrame::ShortPhrase {
                guess: get_str(&buf[4..128], MAX_PHRASE)?,
            }),
            3 => Ok(ClientFrame::HeartbeatAck),
            other => Err(FrameError::UnknownTag(other)),
        }
    }
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Error count plus the masked phrase as currently revealed.
    UpdateShortPhrase { errors: u8, masked: String },
    /// Roster in join order, truncated to [`ROSTER_NAME`] bytes per name.
    UpdatePlayers { players: Vec<String> },
    /// Tried letters in the order they were resolved.
    UpdateAttempts {
        tried: Vec<char>,
        errors: u8,
        max_errors: u8,
    },
    Win,
    Lose,
    YourTurn,
    /// Somebody else's turn started; payload names them.
    OtherTurn { name: String },
    /// Prompt: reply with a `Letter` frame.
    SendLetter,
    /// Prompt: reply with a `ShortPhrase` frame.
    SendShortPhrase,
    LetterAccepted,
    LetterRejected,
    ShortPhraseAccepted,
    ShortPhraseRejected,
    NewGame,
    /// Liveness probe: reply with `HeartbeatAck`.
    Heartbeat,
}

impl ServerFrame {
    fn tag(&self) -> u32 {
        match self {
            ServerFrame::UpdateShortPhrase { .. } => 0,
            ServerFrame::UpdatePlayers { .. } => 1,
            ServerFrame::UpdateAttempts { .. } => 2,
            ServerFrame::Win => 3,
            ServerFrame::Lose => 4,
            ServerFrame::YourTurn => 5,
            ServerFrame::OtherTurn { .. } => 6,
            ServerFrame::SendLetter => 7,
            ServerFrame::SendShortPhrase => 8,
            ServerFrame::LetterAccepted => 9,
            ServerFrame::LetterRejected => 10,
            ServerFrame::ShortPhraseAccepted => 11,
            ServerFrame::ShortPhraseRejected => 12,
            ServerFrame::NewGame => 13,
            ServerFrame::Heartbeat => 14,
        }
    }

    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut buf = [0u8; FRAME_SIZE];
        buf[0..4].copy_from_slice(&self.tag().to_le_bytes());
        match self {
            ServerFrame::UpdateShortPhrase { errors, masked } => {
                buf[4] = *errors;
                put_str(&mut buf[5..128], masked, MAX_PHRASE);
            }
            ServerFrame::UpdatePlayers { players } => {
                buf[4] = players.len().min(MAX_PLAYERS) as u8;
                for (i, name) in players.iter().take(MAX_PLAYERS).enumerate() {
                    let start = 5 + i * (ROSTER_NAME + 1);
                    put_str(&mut buf[start..start + ROSTER_NAME + 1], name, ROSTER_NAME);
                }
            }
            ServerFrame::UpdateAttempts {
                tried,
                errors,
                max_errors,
            } => {
                buf[4] = tried.len().min(ALPHABET) as u8;
                buf[5] = *errors;
                buf[6] = *max_errors;
                for (i, letter) in tried.iter().take(ALPHABET).enumerate() {
                    buf[7 + i] = ascii_byte(*letter);
                }
            }
            ServerFrame::OtherTurn { name } => {
                put_str(&mut buf[4..68], name, MAX_USERNAME);
            }
            _ => {}
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != FRAME_SIZE {
            return Err(FrameError::Length(buf.len()));
        }
        let tag = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        match tag {
            0 => Ok(ServerFrame::UpdateShortPhrase {
                errors: buf[4],
                masked: get_str(&buf[5..128], MAX_PHRASE)?,
            }),
            1 => {
                let count = buf[4] as usize;
                if count > MAX_PLAYERS {
                    return Err(FrameError::Field("player count exceeds capacity"));
                }
                let mut players = Vec::with_capacity(count);
                for i in 0..count {
                    let start = 5 + i * (ROSTER_NAME + 1);
                    players.push(get_str(&buf[start..start + ROSTER_NAME + 1], ROSTER_NAME)?);
                }
                Ok(ServerFrame::UpdatePlayers { players })
            }
            2 => {
                let count = buf[4] as usize;
                if count > ALPHABET {
                    return Err(FrameError::Field("tried letter count exceeds alphabet"));
                }
                let tried = buf[7..7 + count].iter().map(|&b| b as char).collect();
                Ok(ServerFrame::UpdateAttempts {
                    tried,
                    errors: buf[5],
                    max_errors: buf[6],
                })
            }
            3 => Ok(ServerFrame::Win),
            4 => Ok(ServerFrame::Lose),
            5 => Ok(ServerFrame::YourTurn),
            6 => Ok(ServerFrame::OtherTurn {
                name: get_str(&buf[4..68], MAX_USERNAME)?,
            }),
            7 => Ok(ServerFrame::SendLetter),
            8 => Ok(ServerFrame::SendShortPhrase),
            9 => Ok(ServerFrame::LetterAccepted),
            10 => Ok(ServerFrame::LetterRejected),
            11 => Ok(ServerFrame::ShortPhraseAccepted),
            12 => Ok(ServerFrame::ShortPhraseRejected),
            13 => Ok(ServerFrame::NewGame),
            14 => Ok(ServerFrame::Heartbeat),
            other => Err(FrameError::UnknownTag(other)),
        }
    }
}

fn ascii_byte(ch: char) -> u8 {
    if ch.is_ascii() {
        ch as u8
    } else {
        b'?'
    }
}

fn put_str(slot: &mut [u8], s: &str, max: usize) {
    let s = truncate_str(s, max.min(slot.len()));
    slot[..s.len()].copy_from_slice(s.as_bytes());
}

fn get_str(field: &[u8], max: usize) -> Result<String, FrameError> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let s = std::str::from_utf8(&field[..end]).map_err(|_| FrameError::Utf8)?;
    Ok(truncate_str(s, max).to_string())
}

// Byte-capped truncation that never splits a UTF-8 character.
fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
