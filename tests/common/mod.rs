//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, ADMIN_USER, ADMIN_PASS};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_create_event() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!     client.login(ADMIN_USER, ADMIN_PASS).await;
//!
//!     let response = client.create_event("Fair").await;
//!     assert_eq!(response.status(), StatusCode::CREATED);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::{extract_csrf_token, extract_pager_token, TestClient};
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{date_from_today, seed_event};
pub use server::TestServer;
