use log::debug;

/// How a single letter guess resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not an ASCII letter. Free, nothing recorded.
    Invalid,
    /// Letter is on the blocked list and too few attempts have resolved.
    Blocked,
    /// Letter was already tried this round. Free, nothing recorded.
    Repeated,
    /// Letter occurs in the phrase; all occurrences are now revealed.
    Hit,
    /// Letter does not occur; costs one error.
    Miss,
}

#[derive(Debug, Clone)]
pub struct RoundState {
    phrase: String,
    masked: String,
    attempts: Vec<char>,
    errors: u8,
    max_errors: u8,
    blocked: Vec<char>,
    blocked_threshold: usize,
}

impl RoundState {
    pub fn new(
        phrase: String,
        max_errors: u8,
        blocked_letters: &str,
        blocked_threshold: usize,
    ) -> Self {
        let blocked = blocked_letters
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let mut round = Self {
            phrase: String::new(),
            masked: String::new(),
            attempts: Vec::new(),
            errors: 0,
            max_errors,
            blocked,
            blocked_threshold,
        };
        round.new_round(phrase);
        round
    }

    /// Resets the board for a fresh phrase. Rule parameters persist.
    pub fn new_round(&mut self, phrase: String) {
        self.phrase = phrase.to_ascii_uppercase();
        self.masked = self
            .phrase
            .chars()
            .map(|c| if c == ' ' { ' ' } else { '_' })
            .collect();
        self.attempts.clear();
        self.errors = 0;
        debug!("new round started, phrase length {}", self.phrase.len());
    }

    pub fn try_letter(&mut self, letter: char) -> Outcome {
        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_alphabetic() {
            return Outcome::Invalid;
        }
        if self.blocked.contains(&letter) && self.attempts.len() < self.blocked_threshold {
            return Outcome::Blocked;
        }
        if self.attempts.contains(&letter) {
            return Outcome::Repeated;
        }

        self.attempts.push(letter);
        let mut hit = false;
        let mut revealed = String::with_capacity(self.masked.len());
        for (secret, shown) in self.phrase.chars().zip(self.masked.chars()) {
            if secret == letter {
                revealed.push(secret);
                hit = true;
            } else {
                revealed.push(shown);
            }
        }
        self.masked = revealed;

        if hit {
            Outcome::Hit
        } else {
            self.errors += 1;
            Outcome::Miss
        }
    }

    /// Case-insensitive comparison against the secret phrase.
    /// A wrong guess mutates nothing.
    pub fn try_phrase(&self, guess: &str) -> bool {
        guess.eq_ignore_ascii_case(&self.phrase)
    }

    pub fn is_won(&self) -> bool {
        !self.masked.contains('_') && self.masked.eq_ignore_ascii_case(&self.phrase)
    }

    pub fn is_lost(&self) -> bool {
        self.errors >= self.max_errors
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn attempts(&self) -> &[char] {
        &self.attempts
    }

    pub fn errors(&self) -> u8 {
        self.errors
    }

    pub fn max_errors(&self) -> u8 {
        self.max_errors
    }
}
