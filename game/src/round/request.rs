/// Serial of the live phase. Bumped on every phase change; timer and media
/// messages carrying an older ticket are dropped.
pub type Ticket = u64;

#[derive(Debug)]
pub enum Request {
    Input(String),
    Submit,
    Restart,
    SetVolume(u8),

    AutoSubmit(Ticket),
    CountDown(Ticket),
    MediaResolved {
        ticket: Ticket,
        gif_url: Option<String>,
    },
    AudioEnded(Ticket),
    AudioFailed(Ticket),
    Advance(Ticket),

    Shutdown,
}
