//! Typed outcomes of mutating routing operations.
//!
//! Every request or connection transition reports one of these instead of
//! failing: the caller branches on the outcome code, and on `Error` reads the
//! diagnostic message.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::connection::{Connection, ConnectionRequest};

/// Outcome of a connection request operation.
///
/// Accepted requests are reported through [`ConnectionResult`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The request was stored and is now pending.
    Ok,
    /// A pending request from the same participant already exists.
    AlreadyRequested,
    /// No aggregation endpoint exists, so nobody could accept the request.
    NotSetup,
    /// The request no longer exists and was not accepted (withdrawn or rejected).
    Rejected,
    /// See the error message.
    Error,
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestOutcome::Ok => write!(f, "ok"),
            RequestOutcome::AlreadyRequested => write!(f, "already_requested"),
            RequestOutcome::NotSetup => write!(f, "not_setup"),
            RequestOutcome::Rejected => write!(f, "rejected"),
            RequestOutcome::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequestResult {
    pub outcome: RequestOutcome,
    pub request: ConnectionRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ConnectionRequestResult {
    pub fn new(outcome: RequestOutcome, request: ConnectionRequest) -> Self {
        Self {
            outcome,
            request,
            error_message: None,
        }
    }

    pub fn error(request: ConnectionRequest, message: impl Into<String>) -> Self {
        Self {
            outcome: RequestOutcome::Error,
            request,
            error_message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome == RequestOutcome::Error
    }
}

/// Outcome of a connection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionOutcome {
    Connected,
    Disconnected,
    Error,
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionOutcome::Connected => write!(f, "connected"),
            ConnectionOutcome::Disconnected => write!(f, "disconnected"),
            ConnectionOutcome::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResult {
    pub outcome: ConnectionOutcome,
    pub connection: Connection,
    /// The pending request consumed by an accept, if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ConnectionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ConnectionResult {
    pub fn new(outcome: ConnectionOutcome, connection: Connection) -> Self {
        Self {
            outcome,
            connection,
            request: None,
            error_message: None,
        }
    }

    pub fn error(connection: Connection, message: impl Into<String>) -> Self {
        Self {
            outcome: ConnectionOutcome::Error,
            connection,
            request: None,
            error_message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome == ConnectionOutcome::Error
    }
}

/// One step of a participant removal cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CascadeOutcome {
    Request(ConnectionRequestResult),
    Connection(ConnectionResult),
}

impl CascadeOutcome {
    pub fn is_error(&self) -> bool {
        match self {
            CascadeOutcome::Request(r) => r.is_error(),
            CascadeOutcome::Connection(c) => c.is_error(),
        }
    }
}

/// Everything a participant removal did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantRemoval {
    /// Number of entries removed from the user and bot registries.
    pub removed: usize,
    /// Cascade outcomes in the order they happened: requests first, then connections.
    pub outcomes: Vec<CascadeOutcome>,
}

impl ParticipantRemoval {
    /// True if nothing matched: no registry entry, request, or connection.
    pub fn is_not_found(&self) -> bool {
        self.removed == 0 && self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Participant;
    use chrono::Utc;

    fn request() -> ConnectionRequest {
        ConnectionRequest::new(
            Participant::user("web", "c1", "https://relay.example", "u1"),
            Utc::now(),
        )
    }

    #[test]
    fn test_request_result_error_carries_message() {
        let result = ConnectionRequestResult::error(request(), "storage unavailable");
        assert!(result.is_error());
        assert_eq!(result.error_message.as_deref(), Some("storage unavailable"));
    }

    #[test]
    fn test_request_outcome_serde() {
        let json = serde_json::to_string(&RequestOutcome::AlreadyRequested).unwrap();
        assert_eq!(json, "\"already_requested\"");
        assert_eq!(RequestOutcome::NotSetup.to_string(), "not_setup");
    }

    #[test]
    fn test_cascade_outcome_tagged() {
        let outcome = CascadeOutcome::Request(ConnectionRequestResult::new(
            RequestOutcome::Rejected,
            request(),
        ));
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"kind\":\"request\""));
        assert!(json.contains("\"outcome\":\"rejected\""));
        assert!(!json.contains("error_message"));
        assert!(!outcome.is_error());
    }

    #[test]
    fn test_participant_removal_not_found() {
        assert!(ParticipantRemoval::default().is_not_found());
        let removal = ParticipantRemoval {
            removed: 1,
            outcomes: Vec::new(),
        };
        assert!(!removal.is_not_found());
    }
}
