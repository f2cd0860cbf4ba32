mod config;
mod state;
mod request;
mod timer;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::{Sender, Receiver, channel};

use protocol::PlayerResponse as PlayerResp;
use crate::consts::*;
use crate::error::GameResult;
use crate::media::{AudioBackend, GifLookup, Tone, Volume};
use crate::puzzle::{Puzzle, PuzzleSet};
use timer::Timers;

pub use config::Config;
pub use request::{Request as GameReq, Ticket};
pub use state::{time_allotted, Celebration, Phase, RoundState};

/// One player's session: owns the puzzle order, the round state and every
/// timer. All events arrive as `GameReq` messages and are handled in order.
pub struct Game {
    config: Config,
    puzzles: PuzzleSet,
    state: RoundState,
    timers: Timers,

    lookup: Arc<dyn GifLookup>,
    audio: Arc<dyn AudioBackend>,
    out: Sender<PlayerResp>,

    game_rx: Receiver<GameReq>,
    loopback: Sender<GameReq>,
}

impl Game {
    pub fn new(
        config: Config,
        catalog: &[Puzzle],
        lookup: Arc<dyn GifLookup>,
        audio: Arc<dyn AudioBackend>,
        out: Sender<PlayerResp>,
    ) -> GameResult<Self> {
        let puzzles = PuzzleSet::build(catalog, &config.build)?;
        let (loopback, game_rx) = channel::<GameReq>(QUEUE_SIZE);
        Ok(Self {
            state: RoundState::new(config.volume),
            timers: Timers::new(loopback.clone()),
            config,
            puzzles,
            lookup,
            audio,
            out,
            game_rx,
            loopback,
        })
    }

    pub fn get_tx(&self) -> Sender<GameReq> {
        self.loopback.clone()
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn puzzles(&self) -> &PuzzleSet {
        &self.puzzles
    }

    pub fn current(&self) -> &Puzzle {
        self.puzzles.at(self.state.index)
    }

    pub async fn run(&mut self) {
        self.begin_round().await;
        while self.step().await {}
        self.timers.cancel_all();
        info!("session closed after {} correct answers", self.state.guess_count);
    }

    /// Handles one queued message; `false` once the session is over.
    pub async fn step(&mut self) -> bool {
        match self.game_rx.recv().await {
            Some(req) => self.handle(req).await,
            None => false,
        }
    }

    pub async fn handle(&mut self, req: GameReq) -> bool {
        match req {
            GameReq::Input(text) => self.on_input(text).await,
            GameReq::Submit => self.on_submit().await,
            GameReq::Restart => {
                if self.state.phase.is_over() {
                    self.restart().await;
                }
            }
            GameReq::SetVolume(percent) => {
                self.state.volume = Volume::new(percent);
                self.send(PlayerResp::Volume(self.state.volume.percent())).await;
            }
            GameReq::AutoSubmit(ticket) => {
                if self.is_live(ticket) && self.state.phase.accepts_input() {
                    self.on_submit().await;
                }
            }
            GameReq::CountDown(ticket) => {
                if self.is_live(ticket) && self.state.phase == Phase::Active {
                    self.on_tick().await;
                }
            }
            GameReq::MediaResolved { ticket, gif_url } => {
                if self.is_live(ticket) {
                    self.on_media(gif_url).await;
                }
            }
            GameReq::AudioEnded(ticket) | GameReq::AudioFailed(ticket) => {
                if self.is_live(ticket) && self.awaiting_audio() {
                    self.advance().await;
                }
            }
            GameReq::Advance(ticket) => {
                if self.is_live(ticket) && matches!(self.state.phase, Phase::Celebrating(_)) {
                    self.advance().await;
                }
            }
            GameReq::Shutdown => {
                self.timers.cancel_all();
                return false;
            }
        }
        true
    }

    fn is_live(&self, ticket: Ticket) -> bool {
        ticket == self.state.ticket
    }

    fn awaiting_audio(&self) -> bool {
        matches!(&self.state.phase, Phase::Celebrating(c) if c.awaiting_audio)
    }

    /// The only place the phase changes. Whatever the old phase scheduled is
    /// cancelled and its late messages become stale.
    fn enter(&mut self, phase: Phase) {
        self.timers.cancel_all();
        self.state.ticket += 1;
        self.state.phase = phase;
    }

    async fn on_input(&mut self, text: String) {
        match self.state.phase {
            Phase::NotStarted => {
                self.enter(Phase::Active);
                self.timers.start_countdown(self.state.ticket);
            }
            Phase::Active => {}
            _ => return,
        }
        self.state.input = text;
        if self.current().matches(&self.state.input) {
            self.timers.schedule_auto_submit(self.config.auto_submit_delay, self.state.ticket);
        } else {
            self.timers.cancel_auto_submit();
        }
    }

    async fn on_submit(&mut self) {
        match self.state.phase {
            Phase::Lost { .. } | Phase::Won => self.restart().await,
            // a correct answer is already being handled
            Phase::Celebrating(_) => {}
            Phase::NotStarted | Phase::Active => {
                if self.current().matches(&self.state.input) {
                    self.celebrate().await;
                }
            }
        }
    }

    async fn on_tick(&mut self) {
        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        self.send(PlayerResp::CountDown(self.state.time_remaining)).await;
        if self.state.time_remaining == 0 {
            let answer = self.current().answer.clone();
            info!("time is up on round {}, answer was {:?}", self.state.index, answer);
            self.enter(Phase::Lost { answer: answer.clone() });
            self.send(PlayerResp::Lost { answer, guess_count: self.state.guess_count }).await;
        }
    }

    async fn celebrate(&mut self) {
        let answer = self.current().answer.clone();
        self.state.guess_count += 1;
        self.state.input.clear();
        self.enter(Phase::Celebrating(Celebration { loading: true, ..Celebration::default() }));
        let ticket = self.state.ticket;
        self.timers.schedule_advance(self.config.celebration_ceiling, ticket);
        debug!("round {} solved: {:?}", self.state.index, answer);

        self.send(PlayerResp::Correct { guess_count: self.state.guess_count }).await;
        if let Err(e) = self.audio.chime(Tone::CHIME, self.state.volume) {
            debug!("chime skipped: {:?}", e);
        }

        let curated = self.config.media.gif_for(&answer).map(str::to_string);
        if curated.is_some() {
            self.on_media(curated).await;
            return;
        }
        let lookup = self.lookup.clone();
        let loopback_tx = self.loopback.clone();
        self.timers.watch_media(tokio::spawn(async move {
            let gif_url = match lookup.lookup(&answer).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("no gif for {:?}: {}", answer, e);
                    None
                }
            };
            loopback_tx.send(GameReq::MediaResolved { ticket, gif_url }).await.unwrap_or_default();
        }));
    }

    async fn on_media(&mut self, gif_url: Option<String>) {
        let clip = if self.audio.enabled() {
            self.config.media.clip_for(&self.current().answer).map(str::to_string)
        } else {
            None
        };
        let shown = gif_url.is_some();
        match &mut self.state.phase {
            Phase::Celebrating(celebration) => {
                celebration.gif_url = gif_url.clone();
                celebration.loading = false;
                celebration.awaiting_audio = shown && clip.is_some();
            }
            _ => return,
        }
        self.send(PlayerResp::Media { gif_url }).await;

        let ticket = self.state.ticket;
        match (shown, clip) {
            // advance when the clip ends
            (true, Some(clip)) => {
                self.timers.schedule_advance(self.config.clip_ceiling, ticket);
                self.play_clip(clip, ticket);
            }
            (true, None) => self.timers.schedule_advance(self.config.display_delay, ticket),
            (false, clip) => {
                if let Some(clip) = clip {
                    self.play_clip(clip, ticket);
                }
                self.timers.schedule_advance(self.config.failure_delay, ticket);
            }
        }
    }

    fn play_clip(&mut self, clip: String, ticket: Ticket) {
        let audio = self.audio.clone();
        let volume = self.state.volume;
        let loopback_tx = self.loopback.clone();
        self.timers.watch_audio(tokio::spawn(async move {
            let req = match audio.play(&clip, volume).await {
                Ok(()) => GameReq::AudioEnded(ticket),
                Err(e) => {
                    debug!("clip {} not played: {:?}", clip, e);
                    GameReq::AudioFailed(ticket)
                }
            };
            loopback_tx.send(req).await.unwrap_or_default();
        }));
    }

    async fn advance(&mut self) {
        let next = self.state.index + 1;
        if next >= self.puzzles.len() {
            info!("all {} puzzles solved", self.puzzles.len());
            self.enter(Phase::Won);
            self.send(PlayerResp::Won { guess_count: self.state.guess_count }).await;
            return;
        }
        self.state.index = next;
        self.begin_round().await;
    }

    async fn restart(&mut self) {
        self.puzzles = self.puzzles.reshuffled();
        self.state.index = 0;
        self.state.guess_count = 0;
        info!("session restarted");
        self.begin_round().await;
    }

    async fn begin_round(&mut self) {
        self.state.time_allotted = time_allotted(self.state.index);
        self.state.time_remaining = self.state.time_allotted;
        self.state.input.clear();
        self.enter(Phase::NotStarted);
        let puzzle = self.current();
        let resp = PlayerResp::RoundStart {
            index: self.state.index as u32,
            total: self.puzzles.len() as u32,
            emoji: puzzle.emoji.clone(),
            time_allotted: self.state.time_allotted,
        };
        self.send(resp).await;
    }

    async fn send(&self, resp: PlayerResp) {
        self.out.send(resp).await.unwrap_or_default()
    }
}
