//! Shared application state.

use mongodb::{Client, Database};

/// Cloned into the readiness handler; `Client` and `Database` are cheap
/// handles over one connection pool.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub mongo_client: Client,
    pub db: Database,
}
