use axum::extract::FromRef;

use crate::event_store::EventStore;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::csrf::TokenForge;
use super::ServerConfig;

pub type GuardedEventStore = Arc<dyn EventStore>;
pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedTokenForge = Arc<TokenForge>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub event_store: GuardedEventStore,
    pub user_manager: GuardedUserManager,
    pub token_forge: GuardedTokenForge,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedEventStore {
    fn from_ref(input: &ServerState) -> Self {
        input.event_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedTokenForge {
    fn from_ref(input: &ServerState) -> Self {
        input.token_forge.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
