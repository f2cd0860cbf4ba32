//! Puzzles and the shuffled order a session plays them in.

pub mod catalog;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, GameResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub emoji: String,
    pub answer: String,
}

impl Puzzle {
    pub fn new(emoji: impl ToString, answer: impl ToString) -> Self {
        Self {
            emoji: emoji.to_string(),
            answer: answer.to_string(),
        }
    }

    /// Exact match after normalizing both sides.
    pub fn matches(&self, guess: &str) -> bool {
        normalize(guess) == normalize(&self.answer)
    }
}

pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Answer of the puzzle that always opens the session.
    pub pin_first: Option<String>,
}

/// Ordered puzzles of one session. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleSet(Vec<Puzzle>);

impl PuzzleSet {
    pub fn build(catalog: &[Puzzle], options: &BuildOptions) -> GameResult<Self> {
        Self::build_with_rng(catalog, options, &mut rand::rng())
    }

    pub fn build_with_rng<R: Rng + ?Sized>(catalog: &[Puzzle], options: &BuildOptions, rng: &mut R) -> GameResult<Self> {
        if catalog.is_empty() {
            return Err(ErrorKind::EmptyCatalog);
        }
        Ok(Self(arrange(catalog, options, rng)))
    }

    /// A fresh order of the same puzzles, for restarting a session. The pin
    /// only applies to the opening order; a restart shuffles everything.
    pub fn reshuffled(&self) -> Self {
        self.reshuffled_with_rng(&mut rand::rng())
    }

    pub fn reshuffled_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        Self(shuffle_with_rng(&self.0, rng))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Panics when `idx` is out of range; the engine keeps `idx < len()`.
    pub fn at(&self, idx: usize) -> &Puzzle {
        &self.0[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Puzzle> {
        self.0.iter()
    }

    pub fn answers(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.answer.as_str()).collect()
    }
}

fn arrange<R: Rng + ?Sized>(puzzles: &[Puzzle], options: &BuildOptions, rng: &mut R) -> Vec<Puzzle> {
    let pinned = options.pin_first.as_deref().map(normalize).and_then(|pin| {
        puzzles.iter().position(|p| normalize(&p.answer) == pin)
    });
    match pinned {
        Some(pos) => {
            let mut rest = puzzles.to_vec();
            let head = rest.remove(pos);
            let mut arranged = Vec::with_capacity(puzzles.len());
            arranged.push(head);
            arranged.extend(shuffle_with_rng(&rest, rng));
            arranged
        }
        None => shuffle_with_rng(puzzles, rng),
    }
}

/// Uniformly random permutation of `seq` (Fisher–Yates).
pub fn shuffle<T: Clone>(seq: &[T]) -> Vec<T> {
    shuffle_with_rng(seq, &mut rand::rng())
}

pub fn shuffle_with_rng<T: Clone, R: Rng + ?Sized>(seq: &[T], rng: &mut R) -> Vec<T> {
    let mut out = seq.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}
