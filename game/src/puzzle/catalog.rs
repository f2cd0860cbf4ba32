use std::path::Path;

use super::Puzzle;
use crate::error::{io_err, json_err, GameResult};

const BUILTIN: [(&str, &str); 11] = [
    ("1️⃣🥊👨", "one punch man"),
    ("👦🍜🍥", "naruto"),
    ("⚔️😱🏰", "attack on titan"),
    ("🦸‍♂️🏫🇯🇵", "my hero academia"),
    ("🐉🥊🌌", "dragon ball"),
    ("📝💀", "death note"),
    ("👹🗡️🌸", "demon slayer"),
    ("⚗️🧑‍🤝‍🧑🔧", "fullmetal alchemist"),
    ("🌙🪄👧", "sailor moon"),
    ("🤠🚀🎷", "cowboy bebop"),
    ("⚔️🩸👻", "bleach"),
];

pub fn builtin() -> Vec<Puzzle> {
    BUILTIN.iter().map(|(emoji, answer)| Puzzle::new(emoji, answer)).collect()
}

/// Reads a JSON array of `{"emoji": .., "answer": ..}`.
pub fn load(path: &Path) -> GameResult<Vec<Puzzle>> {
    let raw = std::fs::read_to_string(path).map_err(io_err)?;
    from_json(&raw)
}

pub fn from_json(raw: &str) -> GameResult<Vec<Puzzle>> {
    serde_json::from_str(raw).map_err(json_err)
}
