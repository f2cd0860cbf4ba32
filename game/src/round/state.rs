use crate::consts::*;
use crate::media::Volume;
use super::request::Ticket;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Round shown, clock waits for the first keystroke.
    NotStarted,
    Active,
    Celebrating(Celebration),
    Lost { answer: String },
    Won,
}

impl Phase {
    pub fn is_over(&self) -> bool {
        matches!(self, Phase::Lost { .. } | Phase::Won)
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self, Phase::NotStarted | Phase::Active)
    }
}

/// Media of the correct answer being celebrated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Celebration {
    pub gif_url: Option<String>,
    pub loading: bool,
    pub awaiting_audio: bool,
}

#[derive(Debug, Clone)]
pub struct RoundState {
    pub index: usize,
    pub input: String,
    pub time_remaining: u32,
    pub time_allotted: u32,
    pub guess_count: u32,
    pub phase: Phase,
    pub ticket: Ticket,
    pub volume: Volume,
}

impl RoundState {
    pub fn new(volume: Volume) -> Self {
        Self {
            index: 0,
            input: String::new(),
            time_remaining: time_allotted(0),
            time_allotted: time_allotted(0),
            guess_count: 0,
            phase: Phase::NotStarted,
            ticket: 0,
            volume,
        }
    }
}

/// 20s for the first three rounds, 5s less every three rounds after, never below 5s.
pub fn time_allotted(index: usize) -> u32 {
    let steps = u32::try_from(index / ROUNDS_PER_STEP).unwrap_or(u32::MAX);
    INITIAL_SECS.saturating_sub(steps.saturating_mul(STEP_SECS)).max(FLOOR_SECS)
}
