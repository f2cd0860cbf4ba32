//! Celebration media: curated tables, the GIF lookup and audio playback.

pub mod remote;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tokio::time::Duration;

use protocol::GifReply;
use crate::consts::LOOKUP_TIMEOUT;
use crate::error::{io_err, json_err, ErrorKind, GameResult};
use crate::puzzle::normalize;

/// Session volume in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: Volume = Volume(100);

    pub fn new(percent: u8) -> Self {
        Volume(percent.min(100))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn gain(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

/// A synthesized sine blip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq_hz: f32,
    pub peak_gain: f32,
    pub attack: Duration,
    pub decay: Duration,
}

impl Tone {
    pub const CHIME: Tone = Tone {
        freq_hz: 660.0,
        peak_gain: 0.12,
        attack: Duration::from_millis(10),
        decay: Duration::from_millis(600),
    };
}

/// Curated GIF and sound tables, keyed by normalized answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaMaps {
    #[serde(default)]
    gifs: HashMap<String, String>,
    #[serde(default)]
    clips: HashMap<String, String>,
}

const BUILTIN_GIFS: [(&str, &str); 7] = [
    ("demon slayer", "https://media.giphy.com/media/jh7F7XwHTywg85ekdl/giphy.gif"),
    ("naruto", "https://media.giphy.com/media/Mscw2tH9hcAne/giphy.gif"),
    ("sailor moon", "https://media.giphy.com/media/10IIs7CN98Skw0/giphy.gif"),
    ("dragon ball", "https://media.giphy.com/media/ul1omlrGG6kpO/giphy.gif"),
    ("attack on titan", "https://media.giphy.com/media/3ohzdR9BDaFTp51opG/giphy.gif"),
    ("bleach", "https://media.giphy.com/media/XqrWxZms37M7ALU5Ke/giphy.gif"),
    ("one punch man", "https://media.giphy.com/media/jj1xut6ZsokKI/giphy.gif"),
];

const BUILTIN_CLIPS: [(&str, &str); 7] = [
    ("demon slayer", "/audio/demon-slayer.mp3"),
    ("naruto", "/audio/naruto.mp3"),
    ("sailor moon", "/audio/sailor-moon.mp3"),
    ("dragon ball", "/audio/dragon-ball.mp3"),
    ("attack on titan", "/audio/attack-on-titan.mp3"),
    ("bleach", "/audio/bleach.mp3"),
    ("one punch man", "/audio/one-punch-man.mp3"),
];

impl MediaMaps {
    pub fn new<G, C>(gifs: G, clips: C) -> Self
    where
        G: IntoIterator<Item = (String, String)>,
        C: IntoIterator<Item = (String, String)>,
    {
        Self {
            gifs: gifs.into_iter().map(|(k, v)| (normalize(&k), v)).collect(),
            clips: clips.into_iter().map(|(k, v)| (normalize(&k), v)).collect(),
        }
    }

    pub fn builtin() -> Self {
        let owned = |table: &[(&str, &str)]| -> Vec<(String, String)> {
            table.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        Self::new(owned(&BUILTIN_GIFS), owned(&BUILTIN_CLIPS))
    }

    /// Reads `{"gifs": {answer: url}, "clips": {answer: path}}`.
    pub fn load(path: &Path) -> GameResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(io_err)?;
        let maps: MediaMaps = serde_json::from_str(&raw).map_err(json_err)?;
        Ok(Self::new(maps.gifs, maps.clips))
    }

    pub fn gif_for(&self, answer: &str) -> Option<&str> {
        self.gifs.get(&normalize(answer)).map(String::as_str)
    }

    pub fn clip_for(&self, answer: &str) -> Option<&str> {
        self.clips.get(&normalize(answer)).map(String::as_str)
    }
}

#[derive(Debug)]
pub enum LookupError {
    MissingQuery,
    Http(reqwest::Error),
    Status(u16),
    Decode(serde_json::Error),
    BadUrl(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::MissingQuery => write!(f, "missing query"),
            LookupError::Http(e) => write!(f, "request failed: {}", e),
            LookupError::Status(code) => write!(f, "lookup answered {}", code),
            LookupError::Decode(e) => write!(f, "undecodable reply: {}", e),
            LookupError::BadUrl(url) => write!(f, "unusable gif url {:?}", url),
        }
    }
}

#[async_trait]
pub trait GifLookup: Send + Sync {
    /// One best-effort search; returns a usable media URL.
    async fn lookup(&self, query: &str) -> Result<String, LookupError>;
}

/// Client of the `gifproxy` endpoint.
pub struct HttpGifLookup {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpGifLookup {
    pub fn new(endpoint: &str) -> GameResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|_| ErrorKind::BadEndpoint(endpoint.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(ErrorKind::Http)?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl GifLookup for HttpGifLookup {
    async fn lookup(&self, query: &str) -> Result<String, LookupError> {
        if query.trim().is_empty() {
            return Err(LookupError::MissingQuery);
        }
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);

        let resp = self.client.get(url).send().await.map_err(LookupError::Http)?;
        if !resp.status().is_success() {
            return Err(LookupError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await.map_err(LookupError::Http)?;
        parse_reply(&body)
    }
}

pub(crate) fn parse_reply(body: &str) -> Result<String, LookupError> {
    let reply: GifReply = serde_json::from_str(body).map_err(LookupError::Decode)?;
    match Url::parse(&reply.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(reply.url),
        _ => Err(LookupError::BadUrl(reply.url)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    Unsupported,
    Rejected,
    Disconnected,
}

#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Resolves once the clip finished playing.
    async fn play(&self, clip: &str, volume: Volume) -> Result<(), AudioError>;

    fn chime(&self, tone: Tone, volume: Volume) -> Result<(), AudioError>;

    /// `false` when the session chose not to hear anything. Clips are then
    /// never started, which is not the same as a clip failing to play.
    fn enabled(&self) -> bool {
        true
    }
}

/// No audio device at all, or a muted session.
pub struct Silent;

#[async_trait]
impl AudioBackend for Silent {
    async fn play(&self, _clip: &str, _volume: Volume) -> Result<(), AudioError> {
        Err(AudioError::Unsupported)
    }

    fn chime(&self, _tone: Tone, _volume: Volume) -> Result<(), AudioError> {
        Err(AudioError::Unsupported)
    }

    fn enabled(&self) -> bool {
        false
    }
}
