use std::convert::Infallible;

use clap::Parser;
use giphy::{ErrorKind, Giphy, Query, Search};
use log::{info, warn};
use serde::Deserialize;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};
use warp::reply::{json, with_status};

use protocol::{GifError, GifReply};

mod giphy;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, default_value_t = 3030)]
    port: u16,
    #[clap(long, env = "GIPHY_API_KEY")]
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GifQuery {
    q: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let args = Args::parse();
    let giphy = Giphy::new(args.api_key);

    info!("gif lookup on port {}", args.port);
    warp::serve(routes(giphy))
        .run(([0, 0, 0, 0], args.port))
        .await;
}

fn routes(giphy: Giphy) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let cors = warp::cors().allow_any_origin().allow_methods(vec!["GET"]);

    warp::path!("api" / "gif")
        .and(warp::get())
        .and(warp::query::<GifQuery>())
        .and(warp::any().map(move || giphy.clone()))
        .and_then(gif_handle)
        .with(cors)
}

async fn gif_handle(query: GifQuery, giphy: Giphy) -> Result<impl Reply, Infallible> {
    let q = query.q.unwrap_or_default();
    if q.is_empty() {
        return Ok(with_status(json(&GifError::new("missing query")), StatusCode::BAD_REQUEST));
    }
    match Search(q.clone()).query(&giphy).await {
        Ok(url) => Ok(with_status(json(&GifReply { url }), StatusCode::OK)),
        Err(err) => {
            warn!("lookup {:?} failed: {:?}", q, err);
            let (status, msg) = status_of(&err);
            Ok(with_status(json(&GifError::new(msg)), status))
        }
    }
}

fn status_of(err: &ErrorKind) -> (StatusCode, &'static str) {
    match err {
        ErrorKind::Upstream(_) => (StatusCode::BAD_GATEWAY, "giphy fetch error"),
        ErrorKind::NoGif => (StatusCode::NOT_FOUND, "no gif found"),
        ErrorKind::NoUrl => (StatusCode::NOT_FOUND, "no gif url"),
        ErrorKind::Http(_) | ErrorKind::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server error"),
    }
}
