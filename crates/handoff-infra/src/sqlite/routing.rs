//! SQLite routing store implementation.
//!
//! Implements `RoutingStore` from `handoff-core`. Each entity is stored as a
//! JSON body next to the key columns its removal rule matches on. Every
//! mutation is a single statement on the single-connection writer pool, and
//! removals delete at most one row (the oldest match).

use chrono::{DateTime, Utc};
use handoff_core::routing::store::RoutingStore;
use handoff_types::connection::{Connection, ConnectionRequest};
use handoff_types::error::RepositoryError;
use handoff_types::participant::Participant;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `RoutingStore`.
#[derive(Clone, Debug)]
pub struct SqliteRoutingStore {
    pool: DatabasePool,
}

impl SqliteRoutingStore {
    /// Create a new routing store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn list_participants(&self, role: Role) -> Result<Vec<Participant>, RepositoryError> {
        let rows = sqlx::query("SELECT body FROM participants WHERE role = ? ORDER BY seq")
            .bind(role.as_str())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(decode_body::<Participant>).collect()
    }

    async fn insert_participant(
        &self,
        role: Role,
        participant: &Participant,
    ) -> Result<bool, RepositoryError> {
        let (kind, id) = account_key(participant);
        let result = sqlx::query(
            r#"INSERT INTO participants
                   (role, channel_id, conversation_id, service_url, account_kind, account_id, body)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(role.as_str())
        .bind(&participant.channel_id)
        .bind(&participant.conversation_id)
        .bind(&participant.service_url)
        .bind(kind)
        .bind(id)
        .bind(to_json(participant)?)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_participant(
        &self,
        role: Role,
        participant: &Participant,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"DELETE FROM participants WHERE seq = (
                   SELECT seq FROM participants WHERE role = ? AND body = ? ORDER BY seq LIMIT 1
               )"#,
        )
        .bind(role.as_str())
        .bind(to_json(participant)?)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Role {
    User,
    Bot,
    Endpoint,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
            Role::Endpoint => "endpoint",
        }
    }

    fn of(participant: &Participant) -> Self {
        if participant.is_bot() {
            Role::Bot
        } else {
            Role::User
        }
    }
}

fn account_key(participant: &Participant) -> (Option<String>, Option<String>) {
    match participant.account() {
        Some(account) => (Some(account.kind.to_string()), Some(account.id.clone())),
        None => (None, None),
    }
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        e => RepositoryError::Query(e.to_string()),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|e| RepositoryError::Query(format!("failed to serialize body: {e}")))
}

fn decode_body<T: DeserializeOwned>(row: &sqlx::sqlite::SqliteRow) -> Result<T, RepositoryError> {
    let body: String = row.try_get("body").map_err(query_error)?;
    serde_json::from_str(&body).map_err(|e| RepositoryError::Query(format!("invalid JSON body: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// RoutingStore implementation
// ---------------------------------------------------------------------------

impl RoutingStore for SqliteRoutingStore {
    async fn list_users(&self) -> Result<Vec<Participant>, RepositoryError> {
        self.list_participants(Role::User).await
    }

    async fn list_bot_instances(&self) -> Result<Vec<Participant>, RepositoryError> {
        self.list_participants(Role::Bot).await
    }

    async fn list_aggregation_endpoints(&self) -> Result<Vec<Participant>, RepositoryError> {
        self.list_participants(Role::Endpoint).await
    }

    async fn add_user_or_bot(&self, participant: &Participant) -> Result<bool, RepositoryError> {
        self.insert_participant(Role::of(participant), participant)
            .await
    }

    async fn remove_user_or_bot(&self, participant: &Participant) -> Result<bool, RepositoryError> {
        self.delete_participant(Role::of(participant), participant)
            .await
    }

    async fn add_aggregation_endpoint(&self, endpoint: &Participant) -> Result<bool, RepositoryError> {
        self.insert_participant(Role::Endpoint, endpoint).await
    }

    async fn remove_aggregation_endpoint(
        &self,
        endpoint: &Participant,
    ) -> Result<bool, RepositoryError> {
        self.delete_participant(Role::Endpoint, endpoint).await
    }

    async fn list_pending_requests(&self) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        let rows = sqlx::query("SELECT body FROM connection_requests ORDER BY seq")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(decode_body::<ConnectionRequest>).collect()
    }

    async fn add_pending_request(&self, request: &ConnectionRequest) -> Result<bool, RepositoryError> {
        let (kind, id) = account_key(&request.requestor);
        let result = sqlx::query(
            r#"INSERT INTO connection_requests (requestor_kind, requestor_id, requested_at, body)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(kind)
        .bind(id)
        .bind(format_datetime(&request.requested_at))
        .bind(to_json(request)?)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_pending_request(
        &self,
        request: &ConnectionRequest,
    ) -> Result<bool, RepositoryError> {
        let (kind, id) = account_key(&request.requestor);
        // NULL keys never compare equal, so requests without an account are never matched.
        let result = sqlx::query(
            r#"DELETE FROM connection_requests WHERE seq = (
                   SELECT seq FROM connection_requests
                   WHERE requestor_kind = ? AND requestor_id = ?
                   ORDER BY seq LIMIT 1
               )"#,
        )
        .bind(kind)
        .bind(id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, RepositoryError> {
        let rows = sqlx::query("SELECT body FROM connections ORDER BY seq")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(decode_body::<Connection>).collect()
    }

    async fn add_connection(&self, connection: &Connection) -> Result<bool, RepositoryError> {
        let (a_kind, a_id) = account_key(&connection.party_a);
        let (b_kind, b_id) = account_key(&connection.party_b);
        let result = sqlx::query(
            r#"INSERT INTO connections
                   (party_a_kind, party_a_id, party_b_kind, party_b_id, last_activity_at, body)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(a_kind)
        .bind(a_id)
        .bind(b_kind)
        .bind(b_id)
        .bind(format_datetime(&connection.last_activity_at))
        .bind(to_json(connection)?)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_connection(&self, connection: &Connection) -> Result<bool, RepositoryError> {
        let (a_kind, a_id) = account_key(&connection.party_a);
        let (b_kind, b_id) = account_key(&connection.party_b);
        let result = sqlx::query(
            r#"DELETE FROM connections WHERE seq = (
                   SELECT seq FROM connections
                   WHERE (party_a_kind = ? AND party_a_id = ? AND party_b_kind = ? AND party_b_id = ?)
                      OR (party_a_kind = ? AND party_a_id = ? AND party_b_kind = ? AND party_b_id = ?)
                   ORDER BY seq LIMIT 1
               )"#,
        )
        .bind(&a_kind)
        .bind(&a_id)
        .bind(&b_kind)
        .bind(&b_id)
        .bind(&b_kind)
        .bind(&b_id)
        .bind(&a_kind)
        .bind(&a_id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::{DatabasePool, database_url};
    use chrono::TimeDelta;
    use handoff_core::routing::registry::RoutingRegistry;
    use handoff_types::result::{ConnectionOutcome, RequestOutcome};

    async fn test_store() -> SqliteRoutingStore {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        std::mem::forget(dir);
        SqliteRoutingStore::new(DatabasePool::new(&url).await.unwrap())
    }

    fn user(id: &str) -> Participant {
        Participant::user("web", "c1", "https://relay.example", id)
    }

    fn agent(id: &str) -> Participant {
        Participant::bot("web", "c1", "https://relay.example", id).named("Agent")
    }

    #[test]
    fn test_query_error_classifies_pool_failures() {
        assert!(matches!(
            query_error(sqlx::Error::PoolTimedOut),
            RepositoryError::Connection
        ));
        assert!(matches!(
            query_error(sqlx::Error::RowNotFound),
            RepositoryError::Query(_)
        ));
    }

    #[tokio::test]
    async fn test_closed_pool_is_connection_error() {
        let store = test_store().await;
        store.pool.reader.close().await;

        let err = store.list_users().await.unwrap_err();
        assert!(matches!(err, RepositoryError::Connection));
    }

    #[tokio::test]
    async fn test_participant_roundtrip_by_role() {
        let store = test_store().await;
        assert!(store.add_user_or_bot(&user("u1")).await.unwrap());
        assert!(store.add_user_or_bot(&agent("b1")).await.unwrap());
        let endpoint = Participant::endpoint("web", "ops", "https://relay.example");
        assert!(store.add_aggregation_endpoint(&endpoint).await.unwrap());

        assert_eq!(store.list_users().await.unwrap(), vec![user("u1")]);
        assert_eq!(store.list_bot_instances().await.unwrap(), vec![agent("b1")]);
        assert_eq!(store.list_aggregation_endpoints().await.unwrap(), vec![endpoint]);
    }

    #[tokio::test]
    async fn test_remove_participant_removes_one_exact_match() {
        let store = test_store().await;
        store.add_user_or_bot(&user("u1")).await.unwrap();
        store.add_user_or_bot(&user("u1")).await.unwrap();

        assert!(store.remove_user_or_bot(&user("u1")).await.unwrap());
        assert_eq!(store.list_users().await.unwrap().len(), 1);

        // Same account on another channel is a different row
        let elsewhere = Participant::user("teams", "c1", "https://relay.example", "u1");
        assert!(!store.remove_user_or_bot(&elsewhere).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_pending_request_by_requestor() {
        let store = test_store().await;
        let request = ConnectionRequest::new(user("u1"), Utc::now());
        store.add_pending_request(&request).await.unwrap();

        let other_handle = ConnectionRequest::new(
            Participant::user("teams", "c9", "https://other.example", "u1"),
            Utc::now() + TimeDelta::minutes(5),
        );
        assert!(store.remove_pending_request(&other_handle).await.unwrap());
        assert!(store.list_pending_requests().await.unwrap().is_empty());
        assert!(!store.remove_pending_request(&request).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_connection_symmetric() {
        let store = test_store().await;
        let stored = Connection::new(user("u1"), agent("b1"), Utc::now());
        store.add_connection(&stored).await.unwrap();

        let reversed = Connection::new(agent("b1"), user("u1"), Utc::now());
        assert!(store.remove_connection(&reversed).await.unwrap());
        assert!(store.list_connections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_timestamp_survives() {
        let store = test_store().await;
        let at = Utc::now() - TimeDelta::hours(2);
        store
            .add_connection(&Connection::new(user("u1"), agent("b1"), at))
            .await
            .unwrap();

        let listed = store.list_connections().await.unwrap();
        assert_eq!(listed[0].last_activity_at, at);
    }

    #[tokio::test]
    async fn test_registry_over_sqlite() {
        let registry = RoutingRegistry::new(test_store().await);
        let u = user("u1");
        let a = agent("agent1");

        let submitted = registry.submit_request(&u, false).await.unwrap();
        assert_eq!(submitted.outcome, RequestOutcome::Ok);

        let connected = registry
            .accept_request(Connection::new(u.clone(), a.clone(), Utc::now()), &u)
            .await
            .unwrap();
        assert_eq!(connected.outcome, ConnectionOutcome::Connected);
        assert!(registry.pending_requests().await.unwrap().is_empty());
        assert_eq!(registry.find_counterpart(&u).await.unwrap(), Some(a.clone()));

        let removal = registry.remove_participant(&a).await.unwrap();
        assert_eq!(removal.outcomes.len(), 1);
        assert!(!registry.is_connected(&u).await.unwrap());
    }
}
