//! Daily time record accounting.
//!
//! Everything in here is pure: handlers load rows, call into these functions
//! and persist what comes back. Durations are whole seconds (`Hms`) and only
//! become `HH:MM:SS` strings at the JSON boundary.

pub mod accumulate;
pub mod classify;
pub mod hms;
pub mod leave;
pub mod scan;

use thiserror::Error;

use self::scan::Slot;

#[derive(Debug, Error)]
pub enum DtrError {
    #[error("invalid duration '{0}', expected HH:MM:SS")]
    InvalidDuration(String),

    #[error("invalid time '{0}', expected HH:MM:SS")]
    InvalidTime(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("{0} already set")]
    SlotTaken(Slot),

    #[error("{0} is missing")]
    MissingTimeIn(Slot),

    #[error("no open session to time out of")]
    NoOpenSession,

    #[error("return time must be after leave request time")]
    ReturnBeforeLeave,
}
