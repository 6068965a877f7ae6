//! Per-socket connection state: the pre-auth frame buffer and the identity
//! bound once a token verifies (§3 Session, §4.6).

use usion_net::InboundEnvelope;
use usion_types::{RoomId, SessionId, UserId};

/// Bound once [`crate::GatewayState::authenticate`] succeeds. Cheap to
/// clone; held by the socket's reader task for the life of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub session_id: SessionId,
}

/// Upper bound on frames a socket may stash before authentication completes.
/// Verification is a JWKS network round-trip that can take seconds; without
/// a cap, an unauthenticated client could stream frames indefinitely and
/// grow this buffer without bound.
pub const MAX_PREAUTH_FRAMES: usize = 64;

/// A finite queue of frames received before authentication completed.
/// Frames are parsed eagerly (§4.6 step 2: "any inbound frames are parsed
/// and stashed") so a malformed frame is dropped at arrival time rather than
/// surfacing a parse error after the flush. Capped at
/// [`MAX_PREAUTH_FRAMES`]; frames arriving once the cap is reached are
/// dropped silently, the same as any other `MalformedFrame` (§7).
#[derive(Debug, Default)]
pub struct PreAuthBuffer {
    frames: Vec<InboundEnvelope>,
}

impl PreAuthBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `envelope` unless the buffer is already at
    /// [`MAX_PREAUTH_FRAMES`]; returns whether it was accepted.
    pub fn push(&mut self, envelope: InboundEnvelope) -> bool {
        if self.frames.len() >= MAX_PREAUTH_FRAMES {
            return false;
        }
        self.frames.push(envelope);
        true
    }

    /// Drains the buffer in arrival order (§3.2 of SPEC_FULL.md: frames
    /// queued pre-auth are treated as arrival-order, post-auth — not
    /// re-numbered against any `seq` they may have carried).
    pub fn drain(&mut self) -> Vec<InboundEnvelope> {
        std::mem::take(&mut self.frames)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(msg_type: &str) -> InboundEnvelope {
        serde_json::from_value(serde_json::json!({"type": msg_type, "payload": {}})).unwrap()
    }

    #[test]
    fn drains_in_arrival_order() {
        let mut buf = PreAuthBuffer::new();
        buf.push(envelope("input"));
        buf.push(envelope("ping"));
        let drained = buf.drain();
        assert_eq!(drained[0].msg_type, "input");
        assert_eq!(drained[1].msg_type, "ping");
        assert!(buf.is_empty());
    }

    #[test]
    fn push_is_capped_at_max_preauth_frames() {
        let mut buf = PreAuthBuffer::new();
        for _ in 0..MAX_PREAUTH_FRAMES {
            assert!(buf.push(envelope("ping")));
        }
        assert!(!buf.push(envelope("ping")), "push beyond the cap must be rejected");
        assert_eq!(buf.len(), MAX_PREAUTH_FRAMES);
    }
}
