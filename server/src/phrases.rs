//! Phrase sourcing for new rounds.
//!
//! Both sources load the same newline-separated file format. `PhraseList`
//! serves lines verbatim; `MarkovPhrases` trains a small letter-level chain
//! on the file and invents new phrases, which keeps long-running servers
//! from cycling through a short list.

use log::warn;
use rand::Rng;
use shared::MAX_PHRASE;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhraseError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable phrases in {0}")]
    Empty(String),
}

/// Where each round's secret phrase comes from.
pub trait PhraseSource: Send {
    fn next_phrase(&mut self) -> String;
}

/// Uniform random picks from a fixed list.
pub struct PhraseList {
    phrases: Vec<String>,
}

impl PhraseList {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PhraseError> {
        let phrases = load_phrases(path.as_ref())?;
        Ok(Self { phrases })
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl PhraseSource for PhraseList {
    fn next_phrase(&mut self) -> String {
        let i = rand::thread_rng().gen_range(0..self.phrases.len());
        self.phrases[i].clone()
    }
}

/// Order-2 letter chain trained per word, with word counts sampled from the
/// training phrases. Generated words are capped at `MAX_WORD` letters.
pub struct MarkovPhrases {
    starts: Vec<(char, char)>,
    // None marks end-of-word.
    transitions: HashMap<(char, char), Vec<Option<char>>>,
    words_per_phrase: Vec<usize>,
}

const MAX_WORD: usize = 12;

impl MarkovPhrases {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PhraseError> {
        let phrases = load_phrases(path.as_ref())?;
        Self::train(&phrases)
            .ok_or_else(|| PhraseError::Empty(path.as_ref().display().to_string()))
    }

    fn train(phrases: &[String]) -> Option<Self> {
        let mut starts = Vec::new();
        let mut transitions: HashMap<(char, char), Vec<Option<char>>> = HashMap::new();
        let mut words_per_phrase = Vec::new();

        for phrase in phrases {
            words_per_phrase.push(phrase.split(' ').filter(|w| !w.is_empty()).count());
            for word in phrase.split(' ') {
                let letters: Vec<char> = word.chars().collect();
                if letters.len() < 2 {
                    continue;
                }
                starts.push((letters[0], letters[1]));
                for window in letters.windows(3) {
                    transitions
                        .entry((window[0], window[1]))
                        .or_default()
                        .push(Some(window[2]));
                }
                let last = (letters[letters.len() - 2], letters[letters.len() - 1]);
                transitions.entry(last).or_default().push(None);
            }
        }

        if starts.is_empty() {
            return None;
        }
        Some(Self {
            starts,
            transitions,
            words_per_phrase,
        })
    }

    fn generate_word(&self, rng: &mut impl Rng) -> String {
        let (a, b) = self.starts[rng.gen_range(0..self.starts.len())];
        let mut word = String::new();
        word.push(a);
        word.push(b);
        let (mut prev, mut cur) = (a, b);
        while word.len() < MAX_WORD {
            let nexts = match self.transitions.get(&(prev, cur)) {
                Some(nexts) => nexts,
                None => break,
            };
            match nexts[rng.gen_range(0..nexts.len())] {
                Some(next) => {
                    word.push(next);
                    prev = cur;
                    cur = next;
                }
                None => break,
            }
        }
        word
    }
}

impl PhraseSource for MarkovPhrases {
    fn next_phrase(&mut self) -> String {
        let mut rng = rand::thread_rng();
        let words = self.words_per_phrase[rng.gen_range(0..self.words_per_phrase.len())].max(1);
        let mut phrase = String::new();
        for _ in 0..words {
            let word = self.generate_word(&mut rng);
            if phrase.len() + word.len() + 1 > MAX_PHRASE {
                break;
            }
            if !phrase.is_empty() {
                phrase.push(' ');
            }
            phrase.push_str(&word);
        }
        phrase
    }
}

fn load_phrases(path: &Path) -> Result<Vec<String>, PhraseError> {
    let text = std::fs::read_to_string(path).map_err(|source| PhraseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let phrases = parse_phrases(&text);
    if phrases.is_empty() {
        return Err(PhraseError::Empty(path.display().to_string()));
    }
    Ok(phrases)
}

// One phrase per line, trimmed and uppercased; anything that would not fit
// a frame or contains characters outside letters and spaces is skipped.
fn parse_phrases(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    for line in text.lines() {
        let phrase = line.trim().to_ascii_uppercase();
        if phrase.is_empty() {
            continue;
        }
        if phrase.len() > MAX_PHRASE
            || !phrase.chars().all(|c| c.is_ascii_uppercase() || c == ' ')
        {
            warn!("skipping unusable phrase line: {:?}", line);
            continue;
        }
        phrases.push(phrase);
    }
    phrases
}
