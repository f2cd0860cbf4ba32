use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::consts::TICK;
use super::request::{Request, Ticket};

/// Everything the engine has scheduled for the live phase. At most one of
/// each kind is outstanding; `cancel_all` runs on every phase change.
pub struct Timers {
    loopback: Sender<Request>,
    countdown: Option<oneshot::Sender<()>>,
    auto_submit: Option<JoinHandle<()>>,
    advance: Option<JoinHandle<()>>,
    media: Option<JoinHandle<()>>,
    audio: Option<JoinHandle<()>>,
}

impl Timers {
    pub fn new(loopback: Sender<Request>) -> Self {
        Self {
            loopback,
            countdown: None,
            auto_submit: None,
            advance: None,
            media: None,
            audio: None,
        }
    }

    /// Ticks once per second until stopped.
    pub fn start_countdown(&mut self, ticket: Ticket) {
        let (tx, mut rx) = oneshot::channel::<()>();
        let loopback_tx = self.loopback.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut rx => return,
                    _ = sleep(TICK) => {}
                }
                if loopback_tx.send(Request::CountDown(ticket)).await.is_err() {
                    return;
                }
            }
        });
        stop(self.countdown.replace(tx));
    }

    pub fn schedule_auto_submit(&mut self, after: Duration, ticket: Ticket) {
        let task = self.delayed(after, Request::AutoSubmit(ticket));
        abort(self.auto_submit.replace(task));
    }

    pub fn cancel_auto_submit(&mut self) {
        abort(self.auto_submit.take());
    }

    /// Replaces whatever advancement was pending.
    pub fn schedule_advance(&mut self, after: Duration, ticket: Ticket) {
        let task = self.delayed(after, Request::Advance(ticket));
        abort(self.advance.replace(task));
    }

    pub fn watch_media(&mut self, task: JoinHandle<()>) {
        abort(self.media.replace(task));
    }

    pub fn watch_audio(&mut self, task: JoinHandle<()>) {
        abort(self.audio.replace(task));
    }

    pub fn cancel_all(&mut self) {
        stop(self.countdown.take());
        abort(self.auto_submit.take());
        abort(self.advance.take());
        abort(self.media.take());
        abort(self.audio.take());
    }

    fn delayed(&self, after: Duration, req: Request) -> JoinHandle<()> {
        let loopback_tx = self.loopback.clone();
        tokio::spawn(async move {
            sleep(after).await;
            loopback_tx.send(req).await.unwrap_or_default();
        })
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn stop(stopper: Option<oneshot::Sender<()>>) {
    if let Some(stopper) = stopper {
        let _ = stopper.send(());
    }
}

fn abort(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        task.abort();
    }
}
