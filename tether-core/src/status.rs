//! Liveness codes broadcast about registered components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Component liveness, transmitted as a single integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
#[repr(i32)]
pub enum Status {
    /// An unknown code was received.
    Invalid = -1,
    /// Not running.
    Offline = 0,
    /// The owning object is missing.
    ParentMissing = 1,
    /// The owning object exists but is not ready.
    ParentNotReady = 2,
    /// Created but not initialized.
    Uninitialized = 3,
    /// Initialization in progress.
    Initializing = 4,
    /// Running and accepting control messages.
    Ready = 5,
    /// Stopped answering.
    NoResponse = 6,
    /// Removed.
    Deleted = 7,
    /// Busy with a long-running job.
    Working = 8,
    /// Shut down for good.
    Terminated = 9,
}

impl Status {
    /// The wire code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire code. Unknown codes map to [`Status::Invalid`].
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Offline,
            1 => Self::ParentMissing,
            2 => Self::ParentNotReady,
            3 => Self::Uninitialized,
            4 => Self::Initializing,
            5 => Self::Ready,
            6 => Self::NoResponse,
            7 => Self::Deleted,
            8 => Self::Working,
            9 => Self::Terminated,
            _ => Self::Invalid,
        }
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "invalid",
            Self::Offline => "offline",
            Self::ParentMissing => "parent-missing",
            Self::ParentNotReady => "parent-not-ready",
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::NoResponse => "no-response",
            Self::Deleted => "deleted",
            Self::Working => "working",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in -1..=9 {
            assert_eq!(Status::from_code(code).code(), code);
        }
        assert_eq!(Status::from_code(42), Status::Invalid);
        assert_eq!(Status::Ready.code(), 5);
        assert_eq!(Status::Terminated.code(), 9);
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Status::Ready).unwrap(), "5");
        let s: Status = serde_json::from_str("9").unwrap();
        assert_eq!(s, Status::Terminated);
    }
}
