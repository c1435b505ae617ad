use std::fmt;

use crate::store::StoreError;

use super::events::ServerEvent;

/// Why a join or send was refused. Always reported to the acting connection
/// only; the room never sees another member's failures.
#[derive(Debug)]
pub enum ChatError {
    /// Not a confirmed participant of the target match.
    NotAuthorized(&'static str),
    /// A blocked relationship exists with a confirmed participant.
    Blocked(&'static str),
    /// Malformed input (empty or oversized message body).
    Validation(&'static str),
    /// The underlying store failed; reported generically, logged with cause.
    Store(StoreError),
}

impl ChatError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthorized(_) => "NOT_AUTHORIZED",
            Self::Blocked(_) => "BLOCKED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert into the error event sent back to the actor. Store faults are
    /// logged here and replaced with a generic message.
    pub fn into_event(self) -> ServerEvent {
        match self {
            Self::Store(err) => {
                tracing::error!(%err, "store error during chat action");
                ServerEvent::error("INTERNAL_ERROR", "Something went wrong, please retry")
            }
            other => ServerEvent::error(other.code(), other.message()),
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::NotAuthorized(msg) | Self::Blocked(msg) | Self::Validation(msg) => msg,
            Self::Store(_) => "Something went wrong, please retry",
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            other => write!(f, "{}: {}", other.code(), other.message()),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
