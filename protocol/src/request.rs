use serde::{Deserialize, Serialize};
use crate::BinCodeMessage;

/// What the page sends to the game server.
#[derive(Deserialize, Serialize, PartialEq, Debug, Clone)]
pub enum PlayerRequest {
    /// The whole content of the guess box after a change.
    Input {
        text: String,
    },
    Submit,
    Restart,
    SetVolume {
        percent: u8,
    },
    /// Acknowledges a `PlaySound` once the clip finished.
    SoundEnded {
        ticket: u64,
    },
    /// The page could not play the clip (autoplay blocked, bad format, ...).
    SoundFailed {
        ticket: u64,
    },
}

impl BinCodeMessage<'_> for PlayerRequest {}
