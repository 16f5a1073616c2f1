//! End-to-end tests for the load-more pagination endpoint.

mod common;

use common::{date_from_today, seed_event, TestClient, TestServer};
use reqwest::StatusCode;

fn count_items(html: &str) -> usize {
    html.matches("class=\"event-item\"").count()
}

async fn seed_seven(server: &TestServer) {
    for day in 1..=7 {
        seed_event(
            server.event_store.as_ref(),
            &format!("Event {}", day),
            Some(date_from_today(day)),
            "",
        );
    }
}

#[tokio::test]
async fn seven_events_paginate_three_three_one() {
    let server = TestServer::spawn().await;
    seed_seven(&server).await;

    let client = TestClient::new(server.base_url.clone());
    let token = client.page_token().await;

    for (page, expected_items) in [("1", 3), ("2", 3), ("3", 1)] {
        let response = client.load_more(page, &token).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["max_pages"], 3);
        let html = body["data"]["html"].as_str().unwrap();
        assert_eq!(count_items(html), expected_items, "page {}", page);
    }
}

#[tokio::test]
async fn pages_continue_in_date_order() {
    let server = TestServer::spawn().await;
    seed_seven(&server).await;

    let client = TestClient::new(server.base_url.clone());
    let token = client.page_token().await;

    let response = client.load_more("2", &token).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let html = body["data"]["html"].as_str().unwrap();
    assert!(html.contains("Event 4"));
    assert!(html.contains("Event 6"));
    assert!(!html.contains("Event 3"));
    assert!(!html.contains("Event 7"));
}

#[tokio::test]
async fn page_beyond_the_last_returns_empty_set_and_same_max_pages() {
    let server = TestServer::spawn().await;
    seed_seven(&server).await;

    let client = TestClient::new(server.base_url.clone());
    let token = client.page_token().await;

    let response = client.load_more("9", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["html"], "");
    assert_eq!(body["data"]["max_pages"], 3);
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.load_more_without_token("1").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid token");
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.load_more("1", "forged-token").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_numeric_page_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let token = client.page_token().await;

    for bad_page in ["abc", "", "2.5", "1e3"] {
        let response = client.load_more(bad_page, &token).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "page {:?}",
            bad_page
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn zero_and_negative_pages_are_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let token = client.page_token().await;

    for bad_page in ["0", "-1"] {
        let response = client.load_more(bad_page, &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn the_page_token_works_without_a_session() {
    let server = TestServer::spawn().await;
    seed_seven(&server).await;

    // One client reads the page, a different anonymous client uses the token.
    let reader = TestClient::new(server.base_url.clone());
    let token = reader.page_token().await;

    let anonymous = TestClient::new(server.base_url.clone());
    let response = anonymous.load_more("2", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}
