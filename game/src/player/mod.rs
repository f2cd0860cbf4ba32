use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use futures::{StreamExt, SinkExt};

use protocol::{BinCodeMessage, PlayerRequest, PlayerResponse};
use crate::consts::*;
use crate::media::remote::RemoteAudio;
use crate::round::GameReq;
use crate::types::*;

/// The websocket side of one session.
#[derive(Debug)]
pub struct Player {
    pub(crate) _tx_handle: JoinHandle<()>,
    pub(crate) _rx_handle: JoinHandle<()>,
    pub(crate) _ping_handle: JoinHandle<()>,
    pub(crate) _outbox_handle: JoinHandle<()>,
}

impl Player {
    pub(crate) fn new(
        stream: WsStream,
        game_tx: mpsc::Sender<GameReq>,
        audio: Arc<RemoteAudio>,
        mut outbox: mpsc::Receiver<PlayerResponse>,
    ) -> Self {
        let (ws_tx, ws_rx) = stream.split();
        let (ws_from_game_tx, ws_from_game_rx) = mpsc::channel::<WsMsg>(OUTBOX_SIZE);

        let tx_ping = ws_from_game_tx.clone();
        let _ping_handle = tokio::spawn(async move {
            loop {
                tx_ping.send(WsMsg::Ping(Vec::new())).await.unwrap_or_default();
                time::sleep(HB_DURATION).await;
            }
        });

        let tx_outbox = ws_from_game_tx;
        let _outbox_handle = tokio::spawn(async move {
            while let Some(resp) = outbox.recv().await {
                if let Ok(msg) = resp.ser() {
                    if tx_outbox.send(msg).await.is_err() {
                        break;
                    }
                }
            }
        });

        let _rx_handle = tokio::spawn(receive(ws_rx, game_tx.clone(), audio));
        let _tx_handle = tokio::spawn(transmit(ws_tx, ws_from_game_rx, game_tx));

        Self {
            _tx_handle,
            _rx_handle,
            _ping_handle,
            _outbox_handle,
        }
    }

    pub(crate) fn abort(&self) {
        self._rx_handle.abort();
        self._tx_handle.abort();
        self._ping_handle.abort();
        self._outbox_handle.abort();
    }
}

async fn receive(mut ws_rx: WsRx, game_tx: mpsc::Sender<GameReq>, audio: Arc<RemoteAudio>) {
    while let Some(Ok(ws_msg)) = ws_rx.next().await {
        match ws_msg {
            WsMsg::Binary(bin) => {
                match PlayerRequest::deser(&bin) {
                    Ok(req) => route(req, &game_tx, &audio).await,
                    Err(e) => debug!("dropping undecodable frame: {}", e),
                }
            },
            WsMsg::Close(_) => break,
            _ => {}
        }
    }
    info!("page went away");
    game_tx.send(GameReq::Shutdown).await.unwrap_or_default();
}

async fn route(req: PlayerRequest, game_tx: &mpsc::Sender<GameReq>, audio: &RemoteAudio) {
    let game_req = match req {
        PlayerRequest::Input { text } => GameReq::Input(text),
        PlayerRequest::Submit => GameReq::Submit,
        PlayerRequest::Restart => GameReq::Restart,
        PlayerRequest::SetVolume { percent } => GameReq::SetVolume(percent),
        PlayerRequest::SoundEnded { ticket } => return audio.settle(ticket, true),
        PlayerRequest::SoundFailed { ticket } => return audio.settle(ticket, false),
    };
    game_tx.send(game_req).await.unwrap_or_default();
}

async fn transmit(mut ws_tx: WsTx, mut ws_from_game_rx: mpsc::Receiver<WsMsg>, game_tx: mpsc::Sender<GameReq>) {
    use tokio_tungstenite::tungstenite::error::Error::AlreadyClosed
    as AlreadyClosed;
    while let Some(ws_msg) = ws_from_game_rx.recv().await {
        match ws_tx.send(ws_msg).await {
            Err(AlreadyClosed) => {
                game_tx.send(GameReq::Shutdown).await.unwrap_or_default();
                break;
            }
            _ => {},
        };
    }
}
