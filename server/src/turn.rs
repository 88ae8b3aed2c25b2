//! Turn sequencing: who plays, what they are asked, and how a round ends.
//!
//! One call to [`TurnCoordinator::play_turn`] runs at most one player's
//! turn to completion: announce, prompt for a letter, optionally prompt for
//! a phrase guess, and finish the round if the board is decided. Prompt
//! timeouts skip the rest of the turn without removing the player; protocol
//! violations and disconnects remove them and trigger a roster rebroadcast.

use crate::phrases::PhraseSource;
use crate::registry::{PlayerId, PlayerRegistry, ReadOutcome};
use crate::round::{Outcome, RoundState};
use crate::session::ServerConfig;
use log::{debug, info, warn};
use shared::{ClientFrame, ServerFrame};
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    AwaitLetter,
    AwaitPhrase,
    RoundEnd,
}

pub struct TurnCoordinator {
    phase: TurnPhase,
}

impl TurnCoordinator {
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::Idle,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Runs one turn. Returns with the phase back at `Idle`.
    pub async fn play_turn(
        &mut self,
        registry: &mut PlayerRegistry,
        round: &mut RoundState,
        phrases: &mut dyn PhraseSource,
        config: &ServerConfig,
    ) {
        let current = match select_player(registry) {
            Some(id) => id,
            None => {
                self.phase = TurnPhase::Idle;
                return;
            }
        };
        let name = registry.username(current).unwrap_or_default().to_string();
        debug!("turn goes to player {} ({})", current, name);

        if !registry.send_to(current, &ServerFrame::YourTurn).await {
            registry.broadcast_roster().await;
            self.phase = TurnPhase::Idle;
            return;
        }
        let removed = registry
            .broadcast(&ServerFrame::OtherTurn { name }, Some(current))
            .await;
        if !removed.is_empty() {
            registry.broadcast_roster().await;
        }

        self.phase = TurnPhase::AwaitLetter;
        if !registry.send_to(current, &ServerFrame::SendLetter).await {
            registry.broadcast_roster().await;
            self.phase = TurnPhase::Idle;
            return;
        }

        let deadline = Instant::now() + config.letter_timeout;
        let letter = match registry.read_from(current, deadline).await {
            ReadOutcome::Frame(ClientFrame::Letter { letter }) => letter,
            ReadOutcome::TimedOut => {
                warn!(
                    "Player {} took too long to pick a letter, turn skipped",
                    current
                );
                self.phase = TurnPhase::Idle;
                return;
            }
            other => {
                drop_violator(registry, current, &other).await;
                self.phase = TurnPhase::Idle;
                return;
            }
        };

        let outcome = round.try_letter(letter);
        let current_alive = match outcome {
            Outcome::Invalid | Outcome::Blocked | Outcome::Repeated => {
                debug!(
                    "Player {} guessed {:?}: rejected without penalty ({:?})",
                    current, letter, outcome
                );
                let alive = registry.send_to(current, &ServerFrame::LetterRejected).await;
                if !alive {
                    registry.broadcast_roster().await;
                }
                self.phase = TurnPhase::Idle;
                return;
            }
            Outcome::Hit => {
                info!("Player {} guessed {:?}: hit", current, letter);
                registry.send_to(current, &ServerFrame::LetterAccepted).await
            }
            Outcome::Miss => {
                info!(
                    "Player {} guessed {:?}: miss ({}/{} errors)",
                    current,
                    letter,
                    round.errors(),
                    round.max_errors()
                );
                registry.send_to(current, &ServerFrame::LetterRejected).await
            }
        };
        if !current_alive {
            registry.broadcast_roster().await;
        }
        broadcast_board(registry, round).await;

        if round.is_won() {
            self.finish_round(registry, round, phrases, config, true).await;
            return;
        }
        if round.is_lost() {
            self.finish_round(registry, round, phrases, config, false).await;
            return;
        }
        if !current_alive {
            self.phase = TurnPhase::Idle;
            return;
        }

        self.phase = TurnPhase::AwaitPhrase;
        if !registry.send_to(current, &ServerFrame::SendShortPhrase).await {
            registry.broadcast_roster().await;
            self.phase = TurnPhase::Idle;
            return;
        }

        let deadline = Instant::now() + config.phrase_timeout;
        match registry.read_from(current, deadline).await {
            ReadOutcome::Frame(ClientFrame::ShortPhrase { guess }) => {
                if round.try_phrase(&guess) {
                    info!("Player {} solved the phrase", current);
                    registry
                        .send_to(current, &ServerFrame::ShortPhraseAccepted)
                        .await;
                    self.finish_round(registry, round, phrases, config, true).await;
                    return;
                }
                debug!("Player {} guessed the phrase wrong", current);
                let alive = registry
                    .send_to(current, &ServerFrame::ShortPhraseRejected)
                    .await;
                if !alive {
                    registry.broadcast_roster().await;
                }
            }
            ReadOutcome::TimedOut => {
                debug!("Player {} let the phrase prompt lapse", current);
            }
            other => drop_violator(registry, current, &other).await,
        }
        self.phase = TurnPhase::Idle;
    }

    /// Announces the result, pauses, then resets the board for the next
    /// phrase and broadcasts the fresh state.
    async fn finish_round(
        &mut self,
        registry: &mut PlayerRegistry,
        round: &mut RoundState,
        phrases: &mut dyn PhraseSource,
        config: &ServerConfig,
        won: bool,
    ) {
        self.phase = TurnPhase::RoundEnd;
        let result = if won { ServerFrame::Win } else { ServerFrame::Lose };
        info!(
            "Round over, {}: the phrase was {:?}",
            if won { "won" } else { "lost" },
            round.phrase()
        );
        if !registry.broadcast(&result, None).await.is_empty() {
            registry.broadcast_roster().await;
        }

        sleep(config.round_pause).await;

        round.new_round(phrases.next_phrase());
        registry.clear_current();
        registry.broadcast(&ServerFrame::NewGame, None).await;
        registry.broadcast_roster().await;
        broadcast_board(registry, round).await;
        self.phase = TurnPhase::Idle;
    }
}

/// Advances the turn pointer round-robin in join order and returns the
/// player now on turn. With no prior pointer (fresh round, or the current
/// player left) selection restarts at the head of the join order.
fn select_player(registry: &mut PlayerRegistry) -> Option<PlayerId> {
    let ids = registry.ids();
    let position = registry
        .current()
        .and_then(|current| ids.iter().position(|&id| id == current));
    let next = ids[next_position(ids.len(), position)?];
    registry.set_current(next);
    Some(next)
}

pub(crate) fn next_position(count: usize, current: Option<usize>) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some(match current {
        Some(position) => (position + 1) % count,
        None => 0,
    })
}

/// Sends the masked phrase and the attempt list to everyone.
async fn broadcast_board(registry: &mut PlayerRegistry, round: &RoundState) {
    let phrase_frame = ServerFrame::UpdateShortPhrase {
        errors: round.errors(),
        masked: round.masked().to_string(),
    };
    let attempts_frame = ServerFrame::UpdateAttempts {
        tried: round.attempts().to_vec(),
        errors: round.errors(),
        max_errors: round.max_errors(),
    };
    let mut removed = registry.broadcast(&phrase_frame, None).await;
    removed.extend(registry.broadcast(&attempts_frame, None).await);
    if !removed.is_empty() {
        registry.broadcast_roster().await;
    }
}

async fn drop_violator(registry: &mut PlayerRegistry, id: PlayerId, outcome: &ReadOutcome) {
    match outcome {
        ReadOutcome::Closed => info!("Player {} disconnected during their turn", id),
        ReadOutcome::Malformed(reason) => warn!("Dropping player {}: {}", id, reason),
        ReadOutcome::Frame(frame) => {
            warn!("Dropping player {}: unexpected {:?} frame", id, frame)
        }
        ReadOutcome::TimedOut => {}
    }
    registry.remove(id);
    registry.broadcast_roster().await;
}
