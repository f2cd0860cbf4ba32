use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

const GIPHY_SEARCH: &str = "https://api.giphy.com/v1/gifs/search";
/// GIPHY's public beta key, used when no key is configured.
pub const PUBLIC_BETA_KEY: &str = "dc6zaTOxFJmzC";

#[derive(Debug)]
pub enum ErrorKind {
    Http(reqwest::Error),
    Upstream(u16),
    Decode(serde_json::Error),
    NoGif,
    NoUrl,
}

fn http_err(e: reqwest::Error) -> ErrorKind {
    ErrorKind::Http(e)
}

fn decode_err(e: serde_json::Error) -> ErrorKind {
    ErrorKind::Decode(e)
}

#[derive(Clone)]
pub struct Giphy {
    client: Client,
    api_key: String,
    search_url: String,
}

impl Giphy {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_search_url(api_key, GIPHY_SEARCH)
    }

    pub fn with_search_url(api_key: Option<String>, search_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()).unwrap_or_else(|| PUBLIC_BETA_KEY.to_string()),
            search_url: search_url.to_string(),
        }
    }
}

#[async_trait]
pub trait Query {
    type Reply;
    async fn query(&self, giphy: &Giphy) -> Result<Self::Reply, ErrorKind>;
}

/// First search hit for a phrase, as a displayable URL.
pub struct Search(pub String);

#[async_trait]
impl Query for Search {
    type Reply = String;
    async fn query(&self, giphy: &Giphy) -> Result<Self::Reply, ErrorKind> {
        let url = Url::parse_with_params(&giphy.search_url, &[
            ("api_key", giphy.api_key.as_str()),
            ("q", self.0.as_str()),
            ("limit", "1"),
            ("rating", "pg-13"),
            ("lang", "en"),
        ]).map_err(|_| ErrorKind::NoUrl)?;

        let resp = giphy.client.get(url).send().await.map_err(http_err)?;
        if !resp.status().is_success() {
            return Err(ErrorKind::Upstream(resp.status().as_u16()));
        }
        let body = resp.text().await.map_err(http_err)?;
        pick_url(&body)
    }
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    data: Vec<GifObject>,
}

#[derive(Deserialize)]
struct GifObject {
    #[serde(default)]
    images: Option<Images>,
}

#[derive(Deserialize)]
struct Images {
    downsized: Option<Rendition>,
    original: Option<Rendition>,
}

#[derive(Deserialize)]
struct Rendition {
    url: Option<String>,
}

/// Prefers the downsized rendition over the original.
pub fn pick_url(body: &str) -> Result<String, ErrorKind> {
    let body: SearchBody = serde_json::from_str(body).map_err(decode_err)?;
    let gif = body.data.into_iter().next().ok_or(ErrorKind::NoGif)?;
    let images = gif.images.ok_or(ErrorKind::NoUrl)?;
    [images.downsized, images.original]
        .into_iter()
        .flatten()
        .filter_map(|r| r.url)
        .find(|url| !url.is_empty())
        .ok_or(ErrorKind::NoUrl)
}
