//! Application state wiring the routing registry to its SQLite store.
//!
//! The registry is generic over its store and clock; AppState pins it to the
//! concrete infra implementation and the wall clock.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use handoff_core::routing::{RoutingRegistry, SearchCriteria};
use handoff_infra::config::{load_config, resolve_data_dir};
use handoff_infra::sqlite::pool::{DatabasePool, database_url};
use handoff_infra::sqlite::routing::SqliteRoutingStore;
use handoff_types::config::HandoffConfig;
use handoff_types::participant::Participant;

pub type ConcreteRegistry = RoutingRegistry<SqliteRoutingStore>;

/// Shared state for every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConcreteRegistry>,
    pub config: HandoffConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Create the data directory, open the database, and load config.
    pub async fn init() -> anyhow::Result<Self> {
        Self::init_at(resolve_data_dir()).await
    }

    pub async fn init_at(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("Failed to open routing database")?;
        let config = load_config(&data_dir).await;

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");

        Ok(Self {
            registry: Arc::new(RoutingRegistry::new(SqliteRoutingStore::new(db_pool))),
            config,
            data_dir,
        })
    }

    /// Resolve an account ID to a participant anywhere in the registry.
    pub async fn resolve_account(&self, account_id: &str) -> anyhow::Result<Participant> {
        self.registry
            .find_one(&SearchCriteria::new().account(account_id))
            .await?
            .with_context(|| format!("No participant with account '{account_id}'"))
    }
}
