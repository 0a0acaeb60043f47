//! Routing store trait definition (port).
//!
//! The registry owns no state: users, bot instances, aggregation endpoints,
//! pending requests, and connections all live behind this trait.
//! Implementations live in handoff-infra (SQLite) and in [`super::memory`].

use std::future::Future;

use handoff_types::connection::{Connection, ConnectionRequest};
use handoff_types::error::RepositoryError;
use handoff_types::participant::Participant;

/// Durable storage for the four routing collections.
///
/// Each collection must behave as a linearizable list under concurrent callers:
/// every single call is atomic, sequences of calls are not.
///
/// Mutations return `Ok(true)` when the entry was stored or removed and
/// `Ok(false)` when nothing changed (including "not found"). `Err` is reserved
/// for storage failures. Removals drop at most one entry and match:
/// - participants and endpoints by structural equality,
/// - requests by requestor under the participant identity rule,
/// - connections by the symmetric pair rule, ignoring timestamps.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait RoutingStore: Send + Sync {
    /// Participants acting as end-users, in insertion order.
    fn list_users(&self) -> impl Future<Output = Result<Vec<Participant>, RepositoryError>> + Send;

    /// Participants acting as the bot itself, in insertion order.
    fn list_bot_instances(
        &self,
    ) -> impl Future<Output = Result<Vec<Participant>, RepositoryError>> + Send;

    fn list_aggregation_endpoints(
        &self,
    ) -> impl Future<Output = Result<Vec<Participant>, RepositoryError>> + Send;

    /// Store in the bot instances if the participant carries a bot account,
    /// otherwise in the users.
    fn add_user_or_bot(
        &self,
        participant: &Participant,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn remove_user_or_bot(
        &self,
        participant: &Participant,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn add_aggregation_endpoint(
        &self,
        endpoint: &Participant,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn remove_aggregation_endpoint(
        &self,
        endpoint: &Participant,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn list_pending_requests(
        &self,
    ) -> impl Future<Output = Result<Vec<ConnectionRequest>, RepositoryError>> + Send;

    fn add_pending_request(
        &self,
        request: &ConnectionRequest,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn remove_pending_request(
        &self,
        request: &ConnectionRequest,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn list_connections(
        &self,
    ) -> impl Future<Output = Result<Vec<Connection>, RepositoryError>> + Send;

    fn add_connection(
        &self,
        connection: &Connection,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn remove_connection(
        &self,
        connection: &Connection,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}
