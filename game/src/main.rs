mod logger;
mod error;
mod types;
mod consts;
mod puzzle;
mod media;
mod round;

mod player;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use protocol::PlayerResponse;
use consts::*;
use error::GameResult;
use media::{AudioBackend, GifLookup, HttpGifLookup, MediaMaps, Silent, Volume};
use media::remote::RemoteAudio;
use puzzle::{BuildOptions, Puzzle};
use round::{Config, Game};
use player::Player;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[clap(short, long, default_value = GIF_ENDPOINT)]
    gif_endpoint: String,
    /// Answer of the puzzle every session opens with
    #[clap(long)]
    pin_first: Option<String>,
    /// JSON array of {"emoji", "answer"}; the builtin anime set otherwise
    #[clap(long)]
    catalog: Option<PathBuf>,
    /// JSON {"gifs": {..}, "clips": {..}}
    #[clap(long)]
    media: Option<PathBuf>,
    #[clap(long, default_value_t = 100)]
    volume: u8,
    /// Never ask the page to play sound
    #[clap(long)]
    mute: bool,
}

/// Everything a new session is built from.
struct Setup {
    config: Config,
    catalog: Vec<Puzzle>,
    lookup: Arc<dyn GifLookup>,
    mute: bool,
}

#[tokio::main]
async fn main() {
    logger::init();
    let args = Args::parse();
    if let Err(e) = serve(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn serve(args: Args) -> GameResult<()> {
    let catalog = match args.catalog {
        Some(ref path) => puzzle::catalog::load(path)?,
        None => puzzle::catalog::builtin(),
    };
    let mut config = Config::new();
    config.build = BuildOptions { pin_first: args.pin_first };
    config.volume = Volume::new(args.volume);
    if let Some(ref path) = args.media {
        config.media = MediaMaps::load(path)?;
    }
    // fail before accepting anyone
    puzzle::PuzzleSet::build(&catalog, &config.build)?;

    let setup = Arc::new(Setup {
        config,
        catalog,
        lookup: Arc::new(HttpGifLookup::new(&args.gif_endpoint)?),
        mute: args.mute,
    });

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await.map_err(error::io_err)?;
    info!("listening on port {}, gifs from {}", args.port, args.gif_endpoint);

    while let Ok((stream, addr)) = listener.accept().await {
        let setup = setup.clone();
        tokio::spawn(async move {
            info!("connection from {}", addr);
            if let Err(e) = play(stream, setup).await {
                warn!("session {} failed: {}", addr, e);
            }
        });
    }
    Ok(())
}

async fn play(stream: TcpStream, setup: Arc<Setup>) -> GameResult<()> {
    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, Callback).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("handshake refused: {}", e);
            return Ok(());
        }
    };

    let (out_tx, out_rx) = mpsc::channel::<PlayerResponse>(OUTBOX_SIZE);
    let remote = Arc::new(RemoteAudio::new(out_tx.clone()));
    let audio: Arc<dyn AudioBackend> = if setup.mute { Arc::new(Silent) } else { remote.clone() };

    let mut game = Game::new(setup.config.clone(), &setup.catalog, setup.lookup.clone(), audio, out_tx)?;
    let player = Player::new(ws_stream, game.get_tx(), remote, out_rx);
    game.run().await;
    player.abort();
    Ok(())
}

use tokio_tungstenite::tungstenite::handshake::server::Request as HsReq;
use tokio_tungstenite::tungstenite::handshake::server::Response as HsResp;
use tokio_tungstenite::tungstenite::handshake::server::ErrorResponse as HsError;
use tokio_tungstenite::tungstenite::handshake::server::Callback as HsCallback;

/// Only `/play` upgrades to a game session.
struct Callback;

impl HsCallback for Callback {
    fn on_request(self, req: &HsReq, resp: HsResp) -> Result<HsResp, HsError> {
        if req.uri().path() == PLAY_PATH {
            return Ok(resp);
        }
        let mut refusal = HsError::new(Some("PathError".to_string()));
        *refusal.status_mut() = tokio_tungstenite::tungstenite::http::StatusCode::NOT_FOUND;
        Err(refusal)
    }
}
