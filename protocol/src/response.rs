use serde::{Serialize, Deserialize};
use crate::BinCodeMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerResponse {
    RoundStart {
        index: u32,
        total: u32,
        emoji: String,
        time_allotted: u32,
    },
    CountDown(u32),
    Correct {
        guess_count: u32,
    },
    /// `None` once the lookup settled without a usable GIF.
    Media {
        gif_url: Option<String>,
    },
    PlaySound {
        ticket: u64,
        clip: String,
        volume: u8,
    },
    PlayTone {
        freq_hz: f32,
        gain: f32,
        attack_ms: u32,
        decay_ms: u32,
    },
    Lost {
        answer: String,
        guess_count: u32,
    },
    Won {
        guess_count: u32,
    },
    Volume(u8),
}

impl BinCodeMessage<'_> for PlayerResponse {}
