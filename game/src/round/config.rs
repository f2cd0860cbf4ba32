use tokio::time::Duration;

use crate::consts::*;
use crate::media::{MediaMaps, Volume};
use crate::puzzle::BuildOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub build: BuildOptions,
    pub media: MediaMaps,
    pub auto_submit_delay: Duration,
    /// How long a GIF stays up when no clip accompanies it.
    pub display_delay: Duration,
    /// Pause before moving on when no GIF could be found.
    pub failure_delay: Duration,
    /// Upper bound on a celebration that is not waiting for a clip.
    pub celebration_ceiling: Duration,
    /// Upper bound while a clip plays to its end.
    pub clip_ceiling: Duration,
    pub volume: Volume,
}

impl Config {
    pub fn new() -> Self {
        Self {
            build: BuildOptions::default(),
            media: MediaMaps::builtin(),
            auto_submit_delay: AUTO_SUBMIT_DELAY,
            display_delay: DISPLAY_DELAY,
            failure_delay: FAILURE_DELAY,
            celebration_ceiling: CELEBRATION_CEILING,
            clip_ceiling: CLIP_CEILING,
            volume: Volume::MAX,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
