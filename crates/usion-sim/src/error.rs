//! Reserved for truly-impossible simulation states (§2.2 of SPEC_FULL.md).
//!
//! `tick`/`apply_input`/`init`/`is_terminal` never return this: every
//! in-band condition (out-of-range input, a missing or dead ship, a
//! rewind with no history) is clamped or treated as a no-op at the call
//! site instead. This type exists so a caller that *does* discover an
//! invariant violation (e.g. while replaying a recorded match for a bug
//! report) has somewhere to put it rather than reaching for `panic!`.

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("world invariant violated: {0}")]
    InvariantViolated(String),
}
