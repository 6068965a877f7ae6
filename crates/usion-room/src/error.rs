//! Room Runtime error type (§4.5, §7).

use thiserror::Error;

pub type RoomResult<T> = Result<T, RoomError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("room is not running")]
    RoomNotRunning,

    #[error("stale input sequence, expected greater than {expected_gt}")]
    StaleInput { expected_gt: u64 },
}
