//! Connection requests and active connections.
//!
//! A [`ConnectionRequest`] is a participant asking to be paired with an
//! operator. Once an operator accepts, the pairing becomes a [`Connection`]
//! through which messages are relayed in both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::participant::{Participant, is_same_participant};

/// A pending ask from a participant to be paired with an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub requestor: Participant,
    /// When the request was submitted.
    pub requested_at: DateTime<Utc>,
}

impl ConnectionRequest {
    pub fn new(requestor: Participant, requested_at: DateTime<Utc>) -> Self {
        Self {
            requestor,
            requested_at,
        }
    }

    /// True if the requestor is the same participant as `participant`.
    pub fn is_from(&self, participant: &Participant) -> bool {
        is_same_participant(&self.requestor, participant)
    }
}

/// An active pairing between two participants.
///
/// Equality is symmetric over the two parties and ignores the activity
/// timestamp: `(A, B) == (B, A)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub party_a: Participant,
    pub party_b: Participant,
    /// Last time either party interacted through this connection.
    pub last_activity_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(party_a: Participant, party_b: Participant, last_activity_at: DateTime<Utc>) -> Self {
        Self {
            party_a,
            party_b,
            last_activity_at,
        }
    }

    /// True if either side is the same participant as `participant`.
    pub fn involves(&self, participant: &Participant) -> bool {
        is_same_participant(&self.party_a, participant)
            || is_same_participant(&self.party_b, participant)
    }

    /// The side opposite `participant`, or `None` if it is not part of this connection.
    pub fn counterpart_of(&self, participant: &Participant) -> Option<&Participant> {
        if is_same_participant(&self.party_a, participant) {
            Some(&self.party_b)
        } else if is_same_participant(&self.party_b, participant) {
            Some(&self.party_a)
        } else {
            None
        }
    }

    /// Symmetric pair match under the participant identity rule.
    pub fn same_pair(&self, other: &Connection) -> bool {
        (is_same_participant(&self.party_a, &other.party_a)
            && is_same_participant(&self.party_b, &other.party_b))
            || (is_same_participant(&self.party_a, &other.party_b)
                && is_same_participant(&self.party_b, &other.party_a))
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.same_pair(other)
    }
}
