//! Routing registry: registration, request, and connection lifecycles.
//!
//! The registry is a stateless facade over a [`RoutingStore`]. It enforces the
//! lifecycle rules and turns every conflict, missing entity, or failed write
//! into a typed outcome. It performs no locking of its own: operations that
//! issue more than one store call (activity refresh, removal cascade, accept)
//! can interleave with concurrent callers between those calls.
//!
//! Participant lifecycle:
//! ```text
//! unregistered -> pending (request) -> connected (accept) -> disconnected
//!                         \-> rejected (withdraw)
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use handoff_types::connection::{Connection, ConnectionRequest};
use handoff_types::error::RoutingError;
use handoff_types::participant::Participant;
use handoff_types::result::{
    CascadeOutcome, ConnectionOutcome, ConnectionRequestResult, ConnectionResult,
    ParticipantRemoval, RequestOutcome,
};
use tracing::{debug, warn};

use super::lookup::{SearchCriteria, find_by_criteria};
use super::store::RoutingStore;
use crate::clock::{Clock, SystemClock};

/// Stateless facade enforcing routing rules atop a [`RoutingStore`].
///
/// Generic over the store and the clock so tests can pin both.
pub struct RoutingRegistry<S: RoutingStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: RoutingStore> RoutingRegistry<S, SystemClock> {
    /// Create a registry that stamps events with wall-clock time.
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl<S: RoutingStore, C: Clock> RoutingRegistry<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Collection accessors
    // -----------------------------------------------------------------------

    pub async fn users(&self) -> Result<Vec<Participant>, RoutingError> {
        Ok(self.store.list_users().await?)
    }

    pub async fn bot_instances(&self) -> Result<Vec<Participant>, RoutingError> {
        Ok(self.store.list_bot_instances().await?)
    }

    pub async fn aggregation_endpoints(&self) -> Result<Vec<Participant>, RoutingError> {
        Ok(self.store.list_aggregation_endpoints().await?)
    }

    pub async fn pending_requests(&self) -> Result<Vec<ConnectionRequest>, RoutingError> {
        Ok(self.store.list_pending_requests().await?)
    }

    pub async fn connections(&self) -> Result<Vec<Connection>, RoutingError> {
        Ok(self.store.list_connections().await?)
    }

    // -----------------------------------------------------------------------
    // Participant registration
    // -----------------------------------------------------------------------

    /// Register a user or bot instance.
    ///
    /// Returns `Ok(false)` if the same participant is already registered in the
    /// collection its account kind selects, or if the store declined the write.
    /// A store failure is returned as [`RoutingError::Storage`].
    pub async fn register_participant(
        &self,
        participant: &Participant,
    ) -> Result<bool, RoutingError> {
        if !participant.has_account() {
            return Err(RoutingError::InvalidArgument(
                "participant must carry a user or bot account".to_string(),
            ));
        }

        let existing = if participant.is_bot() {
            self.store.list_bot_instances().await?
        } else {
            self.store.list_users().await?
        };

        if existing.iter().any(|p| p.matches(participant)) {
            debug!(%participant, "participant already registered");
            return Ok(false);
        }

        self.store.add_user_or_bot(participant).await.map_err(|e| {
            warn!(%participant, error = %e, "failed to store participant");
            RoutingError::from(e)
        })
    }

    /// Remove a participant and everything that references it.
    ///
    /// Registry entries go first, then every pending request from the
    /// participant (each reported as `Rejected`), then every connection it is
    /// part of (each reported as `Disconnected`). Request and connection sweeps
    /// repeat until a full pass removes nothing. Entries whose removal failed
    /// are reported once and skipped on later passes.
    pub async fn remove_participant(
        &self,
        participant: &Participant,
    ) -> Result<ParticipantRemoval, RoutingError> {
        let mut removal = ParticipantRemoval::default();

        let registered = if participant.is_bot() {
            self.store.list_bot_instances().await?
        } else {
            self.store.list_users().await?
        };

        for entry in registered.iter().filter(|p| p.matches(participant)) {
            match self.store.remove_user_or_bot(entry).await {
                Ok(true) => removal.removed += 1,
                Ok(false) => debug!(%entry, "registry entry already gone"),
                Err(e) => warn!(%entry, error = %e, "failed to remove registry entry"),
            }
        }

        let mut failed_requests: Vec<ConnectionRequest> = Vec::new();
        loop {
            let matching: Vec<ConnectionRequest> = self
                .store
                .list_pending_requests()
                .await?
                .into_iter()
                .filter(|r| r.is_from(participant))
                .filter(|r| !failed_requests.iter().any(|f| f.is_from(&r.requestor)))
                .collect();

            if matching.is_empty() {
                break;
            }

            let mut removed_any = false;
            for request in matching {
                let result = self.withdraw_request(&request).await?;
                if result.outcome == RequestOutcome::Rejected {
                    removed_any = true;
                } else {
                    failed_requests.push(request);
                }
                removal.outcomes.push(CascadeOutcome::Request(result));
            }

            if !removed_any {
                break;
            }
        }

        let mut failed_connections: Vec<Connection> = Vec::new();
        loop {
            let matching: Vec<Connection> = self
                .store
                .list_connections()
                .await?
                .into_iter()
                .filter(|c| c.involves(participant))
                .filter(|c| !failed_connections.iter().any(|f| f.same_pair(c)))
                .collect();

            if matching.is_empty() {
                break;
            }

            let mut removed_any = false;
            for connection in matching {
                let result = self.disconnect(&connection).await?;
                if result.outcome == ConnectionOutcome::Disconnected {
                    removed_any = true;
                } else {
                    failed_connections.push(connection);
                }
                removal.outcomes.push(CascadeOutcome::Connection(result));
            }

            if !removed_any {
                break;
            }
        }

        debug!(
            %participant,
            removed = removal.removed,
            cascaded = removal.outcomes.len(),
            "participant removed"
        );
        Ok(removal)
    }

    /// Display name of the bot instance sharing `participant`'s channel and conversation.
    pub async fn resolve_bot_name_in_conversation(
        &self,
        participant: &Participant,
    ) -> Result<Option<String>, RoutingError> {
        let criteria = SearchCriteria::new()
            .channel(participant.channel_id.clone())
            .conversation(participant.conversation_id.clone())
            .bots_only();

        Ok(self
            .find_one(&criteria)
            .await?
            .and_then(|bot| bot.account_name().map(str::to_string)))
    }

    // -----------------------------------------------------------------------
    // Aggregation endpoints
    // -----------------------------------------------------------------------

    /// Add a conversation-only destination for new connection requests.
    ///
    /// Returns `Ok(false)` if an identical endpoint already exists. A store
    /// failure is returned as [`RoutingError::Storage`].
    pub async fn add_aggregation_endpoint(
        &self,
        endpoint: &Participant,
    ) -> Result<bool, RoutingError> {
        if endpoint.has_account() {
            return Err(RoutingError::InvalidArgument(
                "an aggregation endpoint cannot carry a user or bot account".to_string(),
            ));
        }

        let endpoints = self.store.list_aggregation_endpoints().await?;
        if endpoints.contains(endpoint) {
            return Ok(false);
        }

        self.store.add_aggregation_endpoint(endpoint).await.map_err(|e| {
            warn!(%endpoint, error = %e, "failed to store aggregation endpoint");
            RoutingError::from(e)
        })
    }

    /// Returns `Ok(false)` if no such endpoint was stored, and
    /// [`RoutingError::Storage`] if the store failed.
    pub async fn remove_aggregation_endpoint(
        &self,
        endpoint: &Participant,
    ) -> Result<bool, RoutingError> {
        self.store.remove_aggregation_endpoint(endpoint).await.map_err(|e| {
            warn!(%endpoint, error = %e, "failed to remove aggregation endpoint");
            RoutingError::from(e)
        })
    }

    /// True if some aggregation endpoint shares `participant`'s conversation,
    /// service URL, and channel. Account identity plays no part here.
    pub async fn is_aggregation_endpoint(
        &self,
        participant: &Participant,
    ) -> Result<bool, RoutingError> {
        Ok(self
            .store
            .list_aggregation_endpoints()
            .await?
            .iter()
            .any(|e| e.shares_conversation(participant)))
    }

    // -----------------------------------------------------------------------
    // Connection requests
    // -----------------------------------------------------------------------

    /// Submit a connection request for `requestor`, stamped with the current time.
    ///
    /// - `AlreadyRequested` carries the request that is already pending.
    /// - `NotSetup` when `reject_if_no_endpoint` is set and no aggregation
    ///   endpoint exists; nothing is stored.
    /// - `Error` when the store did not take the request.
    pub async fn submit_request(
        &self,
        requestor: &Participant,
        reject_if_no_endpoint: bool,
    ) -> Result<ConnectionRequestResult, RoutingError> {
        if let Some(existing) = self.find_request(requestor).await? {
            return Ok(ConnectionRequestResult::new(
                RequestOutcome::AlreadyRequested,
                existing,
            ));
        }

        let request = ConnectionRequest::new(requestor.clone(), self.clock.now());

        if reject_if_no_endpoint && self.store.list_aggregation_endpoints().await?.is_empty() {
            debug!(%requestor, "no aggregation endpoint, request not set up");
            return Ok(ConnectionRequestResult::new(RequestOutcome::NotSetup, request));
        }

        match self.store.add_pending_request(&request).await {
            Ok(true) => {
                debug!(%requestor, "connection request pending");
                Ok(ConnectionRequestResult::new(RequestOutcome::Ok, request))
            }
            Ok(false) => Ok(ConnectionRequestResult::error(
                request,
                "failed to add the connection request: the store declined the write",
            )),
            Err(e) => Ok(ConnectionRequestResult::error(
                request,
                format!("failed to add the connection request: {e}"),
            )),
        }
    }

    /// Withdraw (or reject) a pending request. Success is reported as `Rejected`.
    pub async fn withdraw_request(
        &self,
        request: &ConnectionRequest,
    ) -> Result<ConnectionRequestResult, RoutingError> {
        let Some(stored) = self.find_request(&request.requestor).await? else {
            return Ok(ConnectionRequestResult::error(
                request.clone(),
                "could not find a connection request associated with the given participant",
            ));
        };

        match self.store.remove_pending_request(&stored).await {
            Ok(true) => {
                debug!(requestor = %stored.requestor, "connection request removed");
                Ok(ConnectionRequestResult::new(RequestOutcome::Rejected, stored))
            }
            Ok(false) => Ok(ConnectionRequestResult::error(
                stored,
                "failed to remove the connection request associated with the given participant",
            )),
            Err(e) => Ok(ConnectionRequestResult::error(
                stored,
                format!("failed to remove the connection request: {e}"),
            )),
        }
    }

    /// First pending request from the same participant as `participant`.
    ///
    /// Requests from participants that collide under the identity rule are
    /// indistinguishable; the earliest stored one wins.
    pub async fn find_request(
        &self,
        participant: &Participant,
    ) -> Result<Option<ConnectionRequest>, RoutingError> {
        Ok(self
            .store
            .list_pending_requests()
            .await?
            .into_iter()
            .find(|r| r.is_from(participant)))
    }

    /// Pending requests ordered by how long they have waited, longest first.
    pub async fn pending_requests_by_wait(&self) -> Result<Vec<ConnectionRequest>, RoutingError> {
        let mut requests = self.store.list_pending_requests().await?;
        requests.sort_by_key(|r| r.requested_at);
        Ok(requests)
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Accept `requestor`'s pending request by persisting `connection`.
    ///
    /// The connection is stamped with the current time. Only after it is
    /// stored is the matching pending request withdrawn; a missing request is
    /// logged and does not fail the accept. Either party already being in an
    /// active connection is an `Error` and nothing is stored.
    pub async fn accept_request(
        &self,
        mut connection: Connection,
        requestor: &Participant,
    ) -> Result<ConnectionResult, RoutingError> {
        let connections = self.store.list_connections().await?;
        let busy = [&connection.party_a, &connection.party_b]
            .into_iter()
            .find(|p| connections.iter().any(|c| c.involves(p)))
            .map(|p| p.to_string());
        if let Some(busy) = busy {
            let message = format!("{busy} is already connected");
            return Ok(ConnectionResult::error(connection, message));
        }

        connection.last_activity_at = self.clock.now();

        match self.store.add_connection(&connection).await {
            Ok(true) => {}
            Ok(false) => {
                return Ok(ConnectionResult::error(
                    connection,
                    "failed to add the connection: the store declined the write",
                ));
            }
            Err(e) => {
                let message = format!("failed to add the connection: {e}");
                return Ok(ConnectionResult::error(connection, message));
            }
        }

        // The connection is stored from here on, so request cleanup only warns
        let accepted = match self.find_request(requestor).await {
            Ok(Some(request)) => {
                match self.withdraw_request(&request).await {
                    Ok(withdrawn) if withdrawn.is_error() => warn!(
                        %requestor,
                        error = withdrawn.error_message.as_deref().unwrap_or_default(),
                        "connected but failed to clear the accepted request"
                    ),
                    Ok(_) => {}
                    Err(e) => warn!(
                        %requestor,
                        error = %e,
                        "connected but failed to clear the accepted request"
                    ),
                }
                Some(request)
            }
            Ok(None) => {
                warn!(%requestor, "connected without a pending request to clear");
                None
            }
            Err(e) => {
                warn!(%requestor, error = %e, "connected but could not look up the accepted request");
                None
            }
        };

        debug!(
            party_a = %connection.party_a,
            party_b = %connection.party_b,
            "connection established"
        );

        let mut result = ConnectionResult::new(ConnectionOutcome::Connected, connection);
        result.request = accepted;
        Ok(result)
    }

    /// Refresh a connection's activity time by removing and re-adding it.
    ///
    /// Returns the refreshed connection, or `None` if the connection was not
    /// stored. A stale handle never resurrects a connection that is gone. The
    /// two store calls are not atomic.
    pub async fn refresh_activity(
        &self,
        connection: &Connection,
    ) -> Result<Option<Connection>, RoutingError> {
        if !self.store.remove_connection(connection).await? {
            debug!(
                party_a = %connection.party_a,
                party_b = %connection.party_b,
                "refresh skipped, connection not found"
            );
            return Ok(None);
        }

        let mut refreshed = connection.clone();
        refreshed.last_activity_at = self.clock.now();

        if self.store.add_connection(&refreshed).await? {
            Ok(Some(refreshed))
        } else {
            warn!(
                party_a = %connection.party_a,
                party_b = %connection.party_b,
                "connection dropped during refresh, re-add declined"
            );
            Ok(None)
        }
    }

    /// Remove the stored connection equal to `connection` (symmetric pair match).
    pub async fn disconnect(&self, connection: &Connection) -> Result<ConnectionResult, RoutingError> {
        let stored = self
            .store
            .list_connections()
            .await?
            .into_iter()
            .find(|c| c.same_pair(connection));

        let Some(stored) = stored else {
            return Ok(ConnectionResult::error(
                connection.clone(),
                "connection not found",
            ));
        };

        match self.store.remove_connection(&stored).await {
            Ok(true) => {
                debug!(
                    party_a = %stored.party_a,
                    party_b = %stored.party_b,
                    "disconnected"
                );
                Ok(ConnectionResult::new(ConnectionOutcome::Disconnected, stored))
            }
            Ok(false) => Ok(ConnectionResult::error(stored, "failed to remove the connection")),
            Err(e) => {
                let message = format!("failed to remove the connection: {e}");
                Ok(ConnectionResult::error(stored, message))
            }
        }
    }

    /// First active connection that `participant` is part of.
    pub async fn find_connection(
        &self,
        participant: &Participant,
    ) -> Result<Option<Connection>, RoutingError> {
        Ok(self
            .store
            .list_connections()
            .await?
            .into_iter()
            .find(|c| c.involves(participant)))
    }

    pub async fn is_connected(&self, participant: &Participant) -> Result<bool, RoutingError> {
        Ok(self.find_connection(participant).await?.is_some())
    }

    /// The participant on the other side of `participant`'s connection.
    pub async fn find_counterpart(
        &self,
        participant: &Participant,
    ) -> Result<Option<Participant>, RoutingError> {
        Ok(self
            .store
            .list_connections()
            .await?
            .iter()
            .find_map(|c| c.counterpart_of(participant).cloned()))
    }

    /// Connections with no activity for longer than `max_idle`.
    pub async fn idle_connections(&self, max_idle: TimeDelta) -> Result<Vec<Connection>, RoutingError> {
        // A threshold reaching past the earliest representable time idles nothing
        let Some(cutoff) = self.clock.now().checked_sub_signed(max_idle) else {
            return Ok(Vec::new());
        };
        Ok(self
            .store
            .list_connections()
            .await?
            .into_iter()
            .filter(|c| c.last_activity_at < cutoff)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Find one participant matching `criteria`, widening the search in order:
    /// 1. registered users (skipped when `bots_only`) and bot instances
    /// 2. pending request requestors
    /// 3. both sides of active connections
    ///
    /// Returns the first match of the first pool that yields any.
    pub async fn find_one(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Option<Participant>, RoutingError> {
        if criteria.is_empty() {
            return Err(RoutingError::InvalidArgument(
                "at least one search criterion must be defined".to_string(),
            ));
        }

        let mut registered = if criteria.bots_only {
            Vec::new()
        } else {
            self.store.list_users().await?
        };
        registered.extend(self.store.list_bot_instances().await?);
        if let Some(found) = find_by_criteria(&registered, criteria)?.into_iter().next() {
            return Ok(Some(found));
        }

        let requestors: Vec<Participant> = self
            .store
            .list_pending_requests()
            .await?
            .into_iter()
            .map(|r| r.requestor)
            .collect();
        if let Some(found) = find_by_criteria(&requestors, criteria)?.into_iter().next() {
            return Ok(Some(found));
        }

        let connected: Vec<Participant> = self
            .store
            .list_connections()
            .await?
            .into_iter()
            .flat_map(|c| [c.party_a, c.party_b])
            .collect();
        Ok(find_by_criteria(&connected, criteria)?.into_iter().next())
    }
}

impl<S: RoutingStore + std::fmt::Debug, C: Clock> std::fmt::Debug for RoutingRegistry<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingRegistry")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
