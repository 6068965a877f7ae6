//! Wire protocol for the Usion arena server: envelopes, network-state
//! projection, the per-tick delta builder and outbound payload bodies (§4.4,
//! §6).

pub mod delta;
pub mod envelope;
pub mod input;
pub mod payloads;
pub mod projection;

pub use delta::{build_delta, apply_delta, ChangedEntities, Delta, RemovedEntities};
pub use envelope::{inbound_type, outbound_type, InboundEnvelope, Outbound};
pub use input::{resolve_input_payload, InputPayloadError};
pub use payloads::{
    error_code, DeployProfile, ErrorPayload, FinalStats, GameStartPayload, JoinedPayload,
    MatchEndPayload, PlayerJoinedPayload, PlayerLeftPayload, PongPayload, StateDeltaPayload,
    StateSnapshotPayload,
};
pub use projection::{project, NetEffect, NetPickup, NetProjectile, NetShip, NetWorldState};

/// Wire protocol version advertised on every frame that carries one (§6).
pub const PROTOCOL_VERSION: &str = "2";
