//! HTTP client wrapper for end-to-end tests

use super::constants::REQUEST_TIMEOUT_SECS;
use reqwest::{Client, Response};
use std::time::Duration;

pub struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");
        Self { client, base_url }
    }

    pub async fn login(&self, user_handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&serde_json::json!({
                "user_handle": user_handle,
                "password": password,
            }))
            .send()
            .await
            .expect("login request failed")
    }

    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("logout request failed")
    }

    pub async fn get_status(&self) -> Response {
        self.client
            .get(format!("{}/v1/status", self.base_url))
            .send()
            .await
            .expect("status request failed")
    }

    pub async fn get_events_page(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("events page request failed")
    }

    pub async fn get_events_page_with(&self, per_page: u32) -> Response {
        self.client
            .get(format!("{}/?per_page={}", self.base_url, per_page))
            .send()
            .await
            .expect("events page request failed")
    }

    /// Fetches the public page and returns the pager token injected for the
    /// client script.
    pub async fn page_token(&self) -> String {
        let html = self
            .get_events_page()
            .await
            .text()
            .await
            .expect("failed to read events page body");
        extract_pager_token(&html)
    }

    /// Posts to the load-more endpoint. `page` is a raw string so tests can
    /// send non-numeric values.
    pub async fn load_more(&self, page: &str, token: &str) -> Response {
        self.client
            .post(format!("{}/v1/events/page", self.base_url))
            .form(&[("page", page), ("token", token)])
            .send()
            .await
            .expect("load-more request failed")
    }

    /// Posts to the load-more endpoint without a token field.
    pub async fn load_more_without_token(&self, page: &str) -> Response {
        self.client
            .post(format!("{}/v1/events/page", self.base_url))
            .form(&[("page", page)])
            .send()
            .await
            .expect("load-more request failed")
    }

    pub async fn create_event(&self, title: &str) -> Response {
        self.client
            .post(format!("{}/v1/admin/event", self.base_url))
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .expect("create-event request failed")
    }

    pub async fn get_edit_form(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/admin/event/{}/edit", self.base_url, id))
            .send()
            .await
            .expect("edit-form request failed")
    }

    /// Fetches the edit form and returns the anti-forgery token embedded in
    /// it.
    pub async fn edit_token(&self, id: &str) -> String {
        let html = self
            .get_edit_form(id)
            .await
            .text()
            .await
            .expect("failed to read edit form body");
        extract_csrf_token(&html)
    }

    /// Posts the editor save form. Fields set to None are omitted from the
    /// form entirely.
    pub async fn save_event(
        &self,
        id: &str,
        date: Option<&str>,
        place: Option<&str>,
        token: Option<&str>,
    ) -> Response {
        let mut form: Vec<(&str, &str)> = Vec::new();
        if let Some(date) = date {
            form.push(("date", date));
        }
        if let Some(place) = place {
            form.push(("place", place));
        }
        if let Some(token) = token {
            form.push(("csrf_token", token));
        }
        self.client
            .post(format!("{}/v1/admin/event/{}/edit", self.base_url, id))
            .form(&form)
            .send()
            .await
            .expect("save-event request failed")
    }
}

/// Pulls the pager token out of the `window.eventsPager` config object on
/// the public page.
pub fn extract_pager_token(html: &str) -> String {
    let marker = "\"token\":\"";
    let start = html
        .find(marker)
        .expect("page does not embed a pager token")
        + marker.len();
    let end = html[start..]
        .find('"')
        .expect("unterminated pager token")
        + start;
    html[start..end].to_string()
}

/// Pulls the anti-forgery token out of the editor form markup.
pub fn extract_csrf_token(html: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html
        .find(marker)
        .expect("form does not embed a csrf token")
        + marker.len();
    let end = html[start..]
        .find('"')
        .expect("unterminated csrf token")
        + start;
    html[start..end].to_string()
}
