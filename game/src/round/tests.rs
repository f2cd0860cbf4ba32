use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;
use tokio::time::{sleep, Duration, Instant};

use super::*;
use crate::media::{AudioError, LookupError, MediaMaps, Silent};
use crate::puzzle::{catalog, BuildOptions};

#[derive(Default)]
struct FailingLookup {
    calls: AtomicUsize,
}

#[async_trait]
impl GifLookup for FailingLookup {
    async fn lookup(&self, _query: &str) -> Result<String, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LookupError::Status(404))
    }
}

struct FixedLookup(&'static str);

#[async_trait]
impl GifLookup for FixedLookup {
    async fn lookup(&self, _query: &str) -> Result<String, LookupError> {
        Ok(self.0.to_string())
    }
}

enum Clip {
    EndsAfter(Duration),
    Fails,
    Never,
}

struct ScriptedAudio {
    clip: Clip,
    played: AtomicUsize,
    chimes: AtomicUsize,
    volumes: Mutex<Vec<Volume>>,
}

impl ScriptedAudio {
    fn new(clip: Clip) -> Self {
        Self {
            clip,
            played: AtomicUsize::new(0),
            chimes: AtomicUsize::new(0),
            volumes: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl AudioBackend for ScriptedAudio {
    async fn play(&self, _clip: &str, volume: Volume) -> Result<(), AudioError> {
        self.played.fetch_add(1, Ordering::SeqCst);
        self.volumes.lock().unwrap().push(volume);
        match self.clip {
            Clip::EndsAfter(after) => {
                sleep(after).await;
                Ok(())
            }
            Clip::Fails => Err(AudioError::Rejected),
            Clip::Never => {
                futures::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    // the chime never works here; rounds must not care
    fn chime(&self, _tone: Tone, volume: Volume) -> Result<(), AudioError> {
        self.chimes.fetch_add(1, Ordering::SeqCst);
        self.volumes.lock().unwrap().push(volume);
        Err(AudioError::Unsupported)
    }
}

fn xyz() -> Vec<Puzzle> {
    vec![Puzzle::new("A", "x"), Puzzle::new("B", "y"), Puzzle::new("C", "z")]
}

fn quiet_config() -> Config {
    Config { media: MediaMaps::default(), ..Config::new() }
}

fn pinned(answer: &str) -> Config {
    Config {
        build: BuildOptions { pin_first: Some(answer.to_string()) },
        ..quiet_config()
    }
}

fn curated_config() -> Config {
    let gifs = ["x", "y", "z"].iter().map(|a| (a.to_string(), format!("https://media.giphy.com/{}.gif", a)));
    let clips = ["x", "y", "z"].iter().map(|a| (a.to_string(), format!("/audio/{}.mp3", a)));
    Config { media: MediaMaps::new(gifs, clips), ..Config::new() }
}

fn new_game(
    config: Config,
    catalog: &[Puzzle],
    lookup: Arc<dyn GifLookup>,
    audio: Arc<dyn AudioBackend>,
) -> (Game, Receiver<PlayerResp>) {
    let (out, page) = channel(1024);
    let game = Game::new(config, catalog, lookup, audio, out).unwrap();
    (game, page)
}

fn failing_game(config: Config, catalog: &[Puzzle]) -> (Game, Receiver<PlayerResp>, Arc<FailingLookup>) {
    let lookup = Arc::new(FailingLookup::default());
    let (game, page) = new_game(config, catalog, lookup.clone(), Arc::new(Silent));
    (game, page, lookup)
}

async fn pump_until(game: &mut Game, done: impl Fn(&Game) -> bool) {
    for _ in 0..500 {
        if done(game) {
            return;
        }
        assert!(game.step().await, "session ended early");
    }
    panic!("condition never reached, phase {:?}", game.state().phase);
}

fn celebrating(game: &Game) -> bool {
    matches!(game.state().phase, Phase::Celebrating(_))
}

fn next_round_or_over(game: &Game) -> bool {
    game.state().phase == Phase::NotStarted || game.state().phase.is_over()
}

fn assert_near(elapsed: Duration, expected: Duration) {
    let slack = Duration::from_millis(100);
    assert!(
        elapsed + slack >= expected && elapsed <= expected + slack,
        "took {:?}, expected about {:?}",
        elapsed,
        expected
    );
}

async fn answer_current(game: &mut Game) {
    let answer = game.current().answer.clone();
    game.handle(GameReq::Input(answer)).await;
    game.handle(GameReq::Submit).await;
}

fn drain(page: &mut Receiver<PlayerResp>) -> Vec<PlayerResp> {
    let mut seen = vec![];
    while let Ok(resp) = page.try_recv() {
        seen.push(resp);
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_answering_everything_wins() {
    let (mut game, _page, lookup) = failing_game(quiet_config(), &xyz());
    for round in 0..3 {
        assert_eq!(game.state().index, round);
        answer_current(&mut game).await;
        assert!(celebrating(&game));
        pump_until(&mut game, next_round_or_over).await;
    }
    assert_eq!(game.state().phase, Phase::Won);
    assert_eq!(game.state().guess_count, 3);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failed_lookup_moves_on_after_short_delay() {
    let (mut game, _page, _) = failing_game(quiet_config(), &xyz());
    answer_current(&mut game).await;
    let started = Instant::now();
    pump_until(&mut game, |g| !celebrating(g)).await;
    assert_near(started.elapsed(), FAILURE_DELAY);
    assert_eq!(game.state().phase, Phase::NotStarted);
    assert_eq!(game.state().index, 1);
    assert_eq!(game.state().input, "");
}

#[tokio::test(start_paused = true)]
async fn test_expired_clock_loses_and_exposes_answer() {
    let (mut game, mut page, _) = failing_game(pinned("x"), &xyz());
    let started = Instant::now();
    game.handle(GameReq::Input("q".to_string())).await;
    assert_eq!(game.state().phase, Phase::Active);
    pump_until(&mut game, |g| g.state().phase.is_over()).await;

    assert_near(started.elapsed(), Duration::from_secs(20));
    assert_eq!(game.state().phase, Phase::Lost { answer: "x".to_string() });
    assert_eq!(game.state().guess_count, 0);
    assert_eq!(game.state().time_remaining, 0);

    let seen = drain(&mut page);
    let ticks = seen.iter().filter(|r| matches!(r, PlayerResp::CountDown(_))).count();
    assert_eq!(ticks, 20);
    assert_eq!(seen.last(), Some(&PlayerResp::Lost { answer: "x".to_string(), guess_count: 0 }));
}

#[tokio::test(start_paused = true)]
async fn test_clock_waits_for_first_keystroke() {
    let (mut game, _page, _) = failing_game(quiet_config(), &xyz());
    sleep(Duration::from_secs(60)).await;
    assert!(game.game_rx.try_recv().is_err());
    assert_eq!(game.state().phase, Phase::NotStarted);
    assert_eq!(game.state().time_remaining, 20);
}

#[tokio::test(start_paused = true)]
async fn test_double_submit_counts_once() {
    let (mut game, _page, lookup) = failing_game(quiet_config(), &xyz());
    let answer = game.current().answer.clone();
    game.handle(GameReq::Input(answer)).await;
    game.handle(GameReq::Submit).await;
    game.handle(GameReq::Submit).await;
    assert_eq!(game.state().guess_count, 1);

    pump_until(&mut game, next_round_or_over).await;
    assert_eq!(game.state().index, 1);
    assert_eq!(game.state().guess_count, 1);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_matching_input_submits_itself() {
    let (mut game, _page, _) = failing_game(quiet_config(), &xyz());
    let answer = game.current().answer.to_uppercase();
    let started = Instant::now();
    game.handle(GameReq::Input(format!("  {} ", answer))).await;
    pump_until(&mut game, celebrating).await;
    assert_near(started.elapsed(), AUTO_SUBMIT_DELAY);
    assert_eq!(game.state().guess_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_typing_past_the_answer_cancels_auto_submit() {
    let (mut game, _page, _) = failing_game(quiet_config(), &xyz());
    let answer = game.current().answer.clone();
    game.handle(GameReq::Input(answer.clone())).await;
    game.handle(GameReq::Input(format!("{}q", answer))).await;
    pump_until(&mut game, |g| g.state().time_remaining == 18).await;
    assert_eq!(game.state().phase, Phase::Active);
    assert_eq!(game.state().guess_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_guess_stays_visible() {
    let (mut game, _page, _) = failing_game(quiet_config(), &xyz());
    game.handle(GameReq::Input("nope".to_string())).await;
    game.handle(GameReq::Submit).await;
    assert_eq!(game.state().phase, Phase::Active);
    assert_eq!(game.state().input, "nope");
    assert_eq!(game.state().guess_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_tick_never_reaches_next_round() {
    let (mut game, _page, _) = failing_game(quiet_config(), &xyz());
    game.handle(GameReq::Input("q".to_string())).await;
    let stale = game.state().ticket;

    answer_current(&mut game).await;
    // a tick of round 0 already queued when the round ends
    game.get_tx().send(GameReq::CountDown(stale)).await.unwrap();
    pump_until(&mut game, next_round_or_over).await;
    assert_eq!(game.state().index, 1);
    assert_eq!(game.state().time_remaining, time_allotted(1));

    game.handle(GameReq::CountDown(stale)).await;
    assert_eq!(game.state().time_remaining, time_allotted(1));

    game.handle(GameReq::Input("q".to_string())).await;
    game.handle(GameReq::CountDown(stale)).await;
    assert_eq!(game.state().time_remaining, time_allotted(1));
    pump_until(&mut game, |g| g.state().time_remaining < time_allotted(1)).await;
    assert_eq!(game.state().time_remaining, time_allotted(1) - 1);
}

#[tokio::test(start_paused = true)]
async fn test_curated_gif_waits_for_clip() {
    let lookup = Arc::new(FailingLookup::default());
    let audio = Arc::new(ScriptedAudio::new(Clip::EndsAfter(Duration::from_secs(2))));
    let (mut game, _page) = new_game(curated_config(), &xyz(), lookup.clone(), audio.clone());

    let answer = game.current().answer.clone();
    answer_current(&mut game).await;
    match &game.state().phase {
        Phase::Celebrating(c) => {
            assert_eq!(c.gif_url, Some(format!("https://media.giphy.com/{}.gif", answer)));
            assert!(!c.loading);
            assert!(c.awaiting_audio);
        }
        other => panic!("unexpected {:?}", other),
    }
    let started = Instant::now();
    pump_until(&mut game, |g| !celebrating(g)).await;

    assert_near(started.elapsed(), Duration::from_secs(2));
    assert_eq!(game.state().index, 1);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    assert_eq!(audio.played.load(Ordering::SeqCst), 1);
    assert_eq!(audio.chimes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unplayable_clip_advances_at_once() {
    let audio = Arc::new(ScriptedAudio::new(Clip::Fails));
    let (mut game, _page) = new_game(curated_config(), &xyz(), Arc::new(FailingLookup::default()), audio);
    answer_current(&mut game).await;
    let started = Instant::now();
    pump_until(&mut game, |g| !celebrating(g)).await;
    assert!(started.elapsed() < AUTO_SUBMIT_DELAY);
    assert_eq!(game.state().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetched_gif_shown_for_display_delay() {
    let lookup = Arc::new(FixedLookup("https://media.giphy.com/media/abc/giphy.gif"));
    let (mut game, mut page) = new_game(quiet_config(), &xyz(), lookup, Arc::new(Silent));
    answer_current(&mut game).await;
    match &game.state().phase {
        Phase::Celebrating(c) => assert!(c.loading && c.gif_url.is_none()),
        other => panic!("unexpected {:?}", other),
    }
    let started = Instant::now();
    pump_until(&mut game, |g| matches!(&g.state().phase, Phase::Celebrating(c) if !c.loading)).await;
    match &game.state().phase {
        Phase::Celebrating(c) => {
            assert_eq!(c.gif_url.as_deref(), Some("https://media.giphy.com/media/abc/giphy.gif"));
            assert!(!c.awaiting_audio);
        }
        other => panic!("unexpected {:?}", other),
    }
    pump_until(&mut game, |g| !celebrating(g)).await;
    assert_near(started.elapsed(), DISPLAY_DELAY);

    let seen = drain(&mut page);
    assert!(seen.contains(&PlayerResp::Correct { guess_count: 1 }));
    assert!(seen.contains(&PlayerResp::Media {
        gif_url: Some("https://media.giphy.com/media/abc/giphy.gif".to_string())
    }));
}

#[tokio::test(start_paused = true)]
async fn test_endless_clip_is_cut_off() {
    let audio = Arc::new(ScriptedAudio::new(Clip::Never));
    let (mut game, _page) = new_game(curated_config(), &xyz(), Arc::new(FailingLookup::default()), audio);
    answer_current(&mut game).await;
    let started = Instant::now();
    pump_until(&mut game, |g| !celebrating(g)).await;
    assert_near(started.elapsed(), CLIP_CEILING);
    assert_eq!(game.state().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_long_clip_plays_to_the_end() {
    let audio = Arc::new(ScriptedAudio::new(Clip::EndsAfter(Duration::from_secs(25))));
    let (mut game, _page) = new_game(curated_config(), &xyz(), Arc::new(FailingLookup::default()), audio);
    answer_current(&mut game).await;
    let started = Instant::now();
    pump_until(&mut game, |g| !celebrating(g)).await;
    assert!(CELEBRATION_CEILING < Duration::from_secs(25));
    assert_near(started.elapsed(), Duration::from_secs(25));
    assert_eq!(game.state().index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_muted_session_shows_curated_gif() {
    let config = Config { build: BuildOptions { pin_first: Some("naruto".to_string()) }, ..Config::new() };
    let (mut game, mut page) = new_game(config, &catalog::builtin(), Arc::new(FailingLookup::default()), Arc::new(Silent));
    assert!(game.config.media.clip_for("naruto").is_some());

    answer_current(&mut game).await;
    match &game.state().phase {
        Phase::Celebrating(c) => {
            assert!(c.gif_url.is_some());
            assert!(!c.awaiting_audio);
        }
        other => panic!("unexpected {:?}", other),
    }
    let started = Instant::now();
    pump_until(&mut game, |g| !celebrating(g)).await;
    assert_near(started.elapsed(), DISPLAY_DELAY);
    assert_eq!(game.state().index, 1);
    assert!(!drain(&mut page).iter().any(|r| matches!(r, PlayerResp::PlaySound { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_volume_reaches_clip_and_chime() {
    let audio = Arc::new(ScriptedAudio::new(Clip::EndsAfter(Duration::from_secs(1))));
    let (mut game, _page) = new_game(curated_config(), &xyz(), Arc::new(FailingLookup::default()), audio.clone());
    game.handle(GameReq::SetVolume(35)).await;
    answer_current(&mut game).await;
    pump_until(&mut game, |g| !celebrating(g)).await;

    assert_eq!(audio.played.load(Ordering::SeqCst), 1);
    assert_eq!(audio.chimes.load(Ordering::SeqCst), 1);
    assert_eq!(*audio.volumes.lock().unwrap(), vec![Volume::new(35), Volume::new(35)]);
}

#[tokio::test(start_paused = true)]
async fn test_clip_after_failed_lookup_is_not_awaited() {
    let clips = vec![("x".to_string(), "/audio/x.mp3".to_string())];
    let config = Config {
        media: MediaMaps::new(vec![], clips),
        ..pinned("x")
    };
    let audio = Arc::new(ScriptedAudio::new(Clip::EndsAfter(Duration::from_secs(5))));
    let (mut game, _page) = new_game(config, &xyz(), Arc::new(FailingLookup::default()), audio.clone());
    answer_current(&mut game).await;
    let started = Instant::now();
    pump_until(&mut game, |g| !celebrating(g)).await;
    assert_near(started.elapsed(), FAILURE_DELAY);
    assert_eq!(audio.played.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_reshuffles_from_scratch() {
    let (mut game, _page, _) = failing_game(quiet_config(), &catalog::builtin());

    game.handle(GameReq::Input("q".to_string())).await;
    // restart is only honoured once the session is over
    game.handle(GameReq::Restart).await;
    assert_eq!(game.state().phase, Phase::Active);

    pump_until(&mut game, |g| g.state().phase.is_over()).await;
    game.handle(GameReq::Submit).await;
    assert_eq!(game.state().phase, Phase::NotStarted);
    assert_eq!(game.state().index, 0);
    assert_eq!(game.state().guess_count, 0);
    assert_eq!(game.state().time_remaining, 20);
    let first: Vec<String> = game.puzzles().iter().map(|p| p.answer.clone()).collect();

    game.handle(GameReq::Input("q".to_string())).await;
    pump_until(&mut game, |g| g.state().phase.is_over()).await;
    game.handle(GameReq::Restart).await;
    assert_eq!(game.state().phase, Phase::NotStarted);
    let second: Vec<String> = game.puzzles().iter().map(|p| p.answer.clone()).collect();
    assert_ne!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_restart_does_not_keep_the_pin() {
    let config = Config { build: BuildOptions { pin_first: Some("demon slayer".to_string()) }, ..quiet_config() };
    let (mut game, _page, _) = failing_game(config, &catalog::builtin());
    assert_eq!(game.current().answer, "demon slayer");

    let mut heads = vec![];
    for _ in 0..10 {
        game.handle(GameReq::Input("q".to_string())).await;
        pump_until(&mut game, |g| g.state().phase.is_over()).await;
        game.handle(GameReq::Restart).await;
        assert_eq!(game.state().index, 0);
        heads.push(game.current().answer.clone());
    }
    assert!(heads.iter().any(|h| h != "demon slayer"), "every restart opened with {:?}", heads);
}

#[tokio::test(start_paused = true)]
async fn test_input_locked_outside_rounds() {
    let (mut game, _page, _) = failing_game(pinned("x"), &xyz());
    answer_current(&mut game).await;
    game.handle(GameReq::Input("zzz".to_string())).await;
    assert!(celebrating(&game));
    assert_eq!(game.state().input, "");

    pump_until(&mut game, next_round_or_over).await;
    answer_current(&mut game).await;
    pump_until(&mut game, next_round_or_over).await;
    answer_current(&mut game).await;
    pump_until(&mut game, next_round_or_over).await;
    assert_eq!(game.state().phase, Phase::Won);

    game.handle(GameReq::Input("x".to_string())).await;
    assert_eq!(game.state().phase, Phase::Won);
    assert_eq!(game.state().input, "");
}

#[tokio::test(start_paused = true)]
async fn test_rounds_get_shorter() {
    let catalog: Vec<Puzzle> = ["a", "b", "c", "d"].iter().map(|a| Puzzle::new("?", a)).collect();
    let (mut game, _page, _) = failing_game(quiet_config(), &catalog);
    for _ in 0..3 {
        assert_eq!(game.state().time_allotted, 20);
        answer_current(&mut game).await;
        pump_until(&mut game, next_round_or_over).await;
    }
    assert_eq!(game.state().index, 3);
    assert_eq!(game.state().time_allotted, 15);
    assert_eq!(game.state().time_remaining, 15);
}

#[tokio::test(start_paused = true)]
async fn test_volume_is_clamped() {
    let (mut game, mut page, _) = failing_game(quiet_config(), &xyz());
    game.handle(GameReq::SetVolume(250)).await;
    assert_eq!(game.state().volume, Volume::MAX);
    game.handle(GameReq::SetVolume(35)).await;
    assert_eq!(game.state().volume.percent(), 35);
    assert_eq!(drain(&mut page), vec![PlayerResp::Volume(100), PlayerResp::Volume(35)]);
}

#[tokio::test(start_paused = true)]
async fn test_run_until_shutdown() {
    let (mut game, mut page, _) = failing_game(pinned("y"), &xyz());
    let tx = game.get_tx();
    let session = tokio::spawn(async move {
        game.run().await;
        game
    });
    tx.send(GameReq::Input("y".to_string())).await.unwrap();
    match page.recv().await {
        Some(PlayerResp::RoundStart { index, total, emoji, time_allotted }) => {
            assert_eq!((index, total, emoji.as_str(), time_allotted), (0, 3, "B", 20));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(page.recv().await, Some(PlayerResp::Correct { guess_count: 1 }));
    tx.send(GameReq::Shutdown).await.unwrap();

    let game = session.await.unwrap();
    assert_eq!(game.state().guess_count, 1);
    assert!(celebrating(&game));
}

#[test]
fn test_empty_catalog_is_fatal() {
    let (out, _page) = channel(1);
    let res = Game::new(quiet_config(), &[], Arc::new(FailingLookup::default()), Arc::new(Silent), out);
    assert!(matches!(res, Err(crate::error::ErrorKind::EmptyCatalog)));
}
