//! The channel a Room uses to push frames at one socket, without owning
//! the socket itself (§4.5.4, §5). The gateway's writer task owns the
//! receiving half and is the only place that touches the real transport.

use tokio::sync::mpsc;

/// What the Room asks a socket's writer task to do. `Close` carries the
/// service-defined code used for mid-match disconnect termination (§4.5.6).
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Frame(String),
    Close(u16),
}

pub type OutboundSender = mpsc::UnboundedSender<OutboundMessage>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<OutboundMessage>;

pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}
