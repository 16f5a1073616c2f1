//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases.

use super::constants::*;
use super::fixtures::create_test_db_with_users;
use sagra_server::event_store::SqliteEventStore;
use sagra_server::server::csrf::TokenForge;
use sagra_server::server::server::make_app;
use sagra_server::user::{SqliteUserStore, UserManager};
use sagra_server::{RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Event store for seeding and direct database access in tests
    pub event_store: Arc<SqliteEventStore>,

    /// User store for direct database access in tests
    pub user_store: Arc<SqliteUserStore>,

    // Private fields - keep resources alive until drop
    _temp_events_dir: TempDir,
    _temp_users_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with the default page size.
    pub async fn spawn() -> Self {
        Self::spawn_with_page_size(3).await
    }

    /// Spawns a new test server with a specific listing page size.
    pub async fn spawn_with_page_size(page_size: u32) -> Self {
        let temp_events_dir = TempDir::new().expect("Failed to create events temp dir");
        let event_store = Arc::new(
            SqliteEventStore::new(temp_events_dir.path().join("events.db"))
                .expect("Failed to open event store"),
        );

        let (temp_users_dir, user_store) =
            create_test_db_with_users().expect("Failed to create test database");

        let user_manager = Arc::new(UserManager::new(user_store.clone()));
        let token_forge = Arc::new(TokenForge::new(Some(TEST_TOKEN_SECRET.to_vec())));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            page_size,
            utc_offset_minutes: 0,
        };

        let app = make_app(
            config,
            event_store.clone(),
            user_manager,
            token_forge,
        )
        .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            event_store,
            user_store,
            _temp_events_dir: temp_events_dir,
            _temp_users_dir: temp_users_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the status endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/v1/status", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDirs are cleaned up automatically
    }
}
