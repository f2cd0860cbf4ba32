use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use protocol::PlayerResponse;
use super::{AudioBackend, AudioError, Tone, Volume};

/// Audio played by the connected page. `play` waits for the page to
/// acknowledge the clip with `SoundEnded` or `SoundFailed`.
pub struct RemoteAudio {
    out: mpsc::Sender<PlayerResponse>,
    pending: Mutex<HashMap<u64, oneshot::Sender<bool>>>,
    next_ticket: AtomicU64,
}

impl RemoteAudio {
    pub fn new(out: mpsc::Sender<PlayerResponse>) -> Self {
        Self {
            out,
            pending: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Called by the session when the page reports on a clip.
    pub fn settle(&self, ticket: u64, played: bool) {
        if let Some(waiter) = self.forget(ticket) {
            waiter.send(played).unwrap_or_default();
        }
    }

    fn forget(&self, ticket: u64) -> Option<oneshot::Sender<bool>> {
        // the lock is never held across an await, a poisoned map is still usable
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.remove(&ticket)
    }
}

/// Removes its waiter when `play` ends, including when the engine aborts
/// the task before the page answered.
struct Waiting<'a> {
    audio: &'a RemoteAudio,
    ticket: u64,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.audio.forget(self.ticket);
    }
}

#[async_trait]
impl AudioBackend for RemoteAudio {
    async fn play(&self, clip: &str, volume: Volume) -> Result<(), AudioError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).insert(ticket, tx);
        let _waiting = Waiting { audio: self, ticket };

        let req = PlayerResponse::PlaySound {
            ticket,
            clip: clip.to_string(),
            volume: volume.percent(),
        };
        if self.out.send(req).await.is_err() {
            return Err(AudioError::Disconnected);
        }
        match rx.await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AudioError::Rejected),
            Err(_) => Err(AudioError::Disconnected),
        }
    }

    fn chime(&self, tone: Tone, volume: Volume) -> Result<(), AudioError> {
        let req = PlayerResponse::PlayTone {
            freq_hz: tone.freq_hz,
            gain: tone.peak_gain * volume.gain(),
            attack_ms: tone.attack.as_millis() as u32,
            decay_ms: tone.decay.as_millis() as u32,
        };
        self.out.try_send(req).map_err(|_| AudioError::Disconnected)
    }
}
