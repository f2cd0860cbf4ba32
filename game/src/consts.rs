use tokio::time::Duration;

pub const DEFAULT_PORT: u16 = 9000;
pub const PLAY_PATH: &str = "/play";
pub const GIF_ENDPOINT: &str = "http://127.0.0.1:3030/api/gif";

pub const HB_DURATION: Duration = Duration::from_secs(10);
pub const QUEUE_SIZE: usize = 64;
pub const OUTBOX_SIZE: usize = 128;

// per-round clock
pub const INITIAL_SECS: u32 = 20;
pub const STEP_SECS: u32 = 5;
pub const ROUNDS_PER_STEP: usize = 3;
pub const FLOOR_SECS: u32 = 5;
pub const TICK: Duration = Duration::from_secs(1);

pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(50);
pub const DISPLAY_DELAY: Duration = Duration::from_millis(3000);
pub const FAILURE_DELAY: Duration = Duration::from_millis(700);
pub const CELEBRATION_CEILING: Duration = Duration::from_secs(15);
pub const CLIP_CEILING: Duration = Duration::from_secs(90);

pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
