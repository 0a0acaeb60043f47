//! In-process routing store.
//!
//! Keeps every collection in a `Vec` behind its own `RwLock`. Each call takes
//! one lock once, which makes single calls linearizable. Nothing survives a
//! restart; use the SQLite store in handoff-infra for that.

use handoff_types::connection::{Connection, ConnectionRequest};
use handoff_types::error::RepositoryError;
use handoff_types::participant::Participant;
use tokio::sync::RwLock;

use super::store::RoutingStore;

#[derive(Debug, Default)]
pub struct MemoryRoutingStore {
    users: RwLock<Vec<Participant>>,
    bot_instances: RwLock<Vec<Participant>>,
    aggregation_endpoints: RwLock<Vec<Participant>>,
    pending_requests: RwLock<Vec<ConnectionRequest>>,
    connections: RwLock<Vec<Connection>>,
}

impl MemoryRoutingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn participants_for(&self, participant: &Participant) -> &RwLock<Vec<Participant>> {
        if participant.is_bot() {
            &self.bot_instances
        } else {
            &self.users
        }
    }
}

fn remove_first<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    match items.iter().position(matches) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

impl RoutingStore for MemoryRoutingStore {
    async fn list_users(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.users.read().await.clone())
    }

    async fn list_bot_instances(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.bot_instances.read().await.clone())
    }

    async fn list_aggregation_endpoints(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.aggregation_endpoints.read().await.clone())
    }

    async fn add_user_or_bot(&self, participant: &Participant) -> Result<bool, RepositoryError> {
        self.participants_for(participant)
            .write()
            .await
            .push(participant.clone());
        Ok(true)
    }

    async fn remove_user_or_bot(&self, participant: &Participant) -> Result<bool, RepositoryError> {
        let mut items = self.participants_for(participant).write().await;
        Ok(remove_first(&mut items, |p| p == participant))
    }

    async fn add_aggregation_endpoint(&self, endpoint: &Participant) -> Result<bool, RepositoryError> {
        self.aggregation_endpoints
            .write()
            .await
            .push(endpoint.clone());
        Ok(true)
    }

    async fn remove_aggregation_endpoint(
        &self,
        endpoint: &Participant,
    ) -> Result<bool, RepositoryError> {
        let mut items = self.aggregation_endpoints.write().await;
        Ok(remove_first(&mut items, |e| e == endpoint))
    }

    async fn list_pending_requests(&self) -> Result<Vec<ConnectionRequest>, RepositoryError> {
        Ok(self.pending_requests.read().await.clone())
    }

    async fn add_pending_request(&self, request: &ConnectionRequest) -> Result<bool, RepositoryError> {
        self.pending_requests.write().await.push(request.clone());
        Ok(true)
    }

    async fn remove_pending_request(
        &self,
        request: &ConnectionRequest,
    ) -> Result<bool, RepositoryError> {
        let mut items = self.pending_requests.write().await;
        Ok(remove_first(&mut items, |r| r.is_from(&request.requestor)))
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, RepositoryError> {
        Ok(self.connections.read().await.clone())
    }

    async fn add_connection(&self, connection: &Connection) -> Result<bool, RepositoryError> {
        self.connections.write().await.push(connection.clone());
        Ok(true)
    }

    async fn remove_connection(&self, connection: &Connection) -> Result<bool, RepositoryError> {
        let mut items = self.connections.write().await;
        Ok(remove_first(&mut items, |c| c.same_pair(connection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str) -> Participant {
        Participant::user("web", "c1", "https://relay.example", id)
    }

    fn bot(id: &str) -> Participant {
        Participant::bot("web", "c1", "https://relay.example", id)
    }

    #[tokio::test]
    async fn test_add_user_or_bot_selects_collection() {
        let store = MemoryRoutingStore::new();
        assert!(store.add_user_or_bot(&user("u1")).await.unwrap());
        assert!(store.add_user_or_bot(&bot("b1")).await.unwrap());

        assert_eq!(store.list_users().await.unwrap(), vec![user("u1")]);
        assert_eq!(store.list_bot_instances().await.unwrap(), vec![bot("b1")]);
    }

    #[tokio::test]
    async fn test_remove_missing_returns_false() {
        let store = MemoryRoutingStore::new();
        assert!(!store.remove_user_or_bot(&user("u1")).await.unwrap());
        assert!(
            !store
                .remove_aggregation_endpoint(&Participant::endpoint("web", "ops", "https://relay.example"))
                .await
                .unwrap()
        );
        let conn = Connection::new(user("u1"), bot("b1"), Utc::now());
        assert!(!store.remove_connection(&conn).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_connection_ignores_order_and_timestamp() {
        let store = MemoryRoutingStore::new();
        let stored = Connection::new(user("u1"), bot("b1"), Utc::now());
        store.add_connection(&stored).await.unwrap();

        let handle = Connection::new(bot("b1"), user("u1"), Utc::now() + chrono::TimeDelta::hours(1));
        assert!(store.remove_connection(&handle).await.unwrap());
        assert!(store.list_connections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_pending_request_removes_one() {
        let store = MemoryRoutingStore::new();
        let request = ConnectionRequest::new(user("u1"), Utc::now());
        store.add_pending_request(&request).await.unwrap();
        store.add_pending_request(&request).await.unwrap();

        assert!(store.remove_pending_request(&request).await.unwrap());
        assert_eq!(store.list_pending_requests().await.unwrap().len(), 1);
    }
}
