//! Public listing routes and the admin event editor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::csrf::{ACTION_EVENT_EDIT, ACTION_LOAD_MORE};
use super::session::Session;
use super::state::ServerState;
use crate::listing::{max_pages, today_with_offset, Paging};
use crate::render;
use crate::sanitize::sanitize_text_field;
use crate::user::Permission;

const EVENTS_PAGE_ENDPOINT: &str = "/v1/events/page";
const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize)]
struct LoadMoreData {
    html: String,
    max_pages: u32,
}

#[derive(Serialize)]
struct LoadMoreSuccess {
    success: bool,
    data: LoadMoreData,
}

#[derive(Serialize)]
struct SaveSuccess {
    success: bool,
}

#[derive(Serialize)]
struct ApiFailure {
    success: bool,
    error: String,
}

fn failure(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ApiFailure {
            success: false,
            error: error.to_string(),
        }),
    )
        .into_response()
}

#[derive(Deserialize, Debug)]
pub(super) struct EventsPageQuery {
    per_page: Option<u32>,
}

/// The public events page: first page of upcoming events, the load-more
/// button and the pager configuration for the client script.
pub(super) async fn events_page(
    State(state): State<ServerState>,
    Query(query): Query<EventsPageQuery>,
) -> Response {
    let page_size = query.per_page.unwrap_or(state.config.page_size);
    let paging = match Paging::new(1, page_size) {
        Ok(paging) => paging,
        Err(err) => return failure(StatusCode::BAD_REQUEST, &err.to_string()),
    };

    let today = today_with_offset(state.config.utc_offset_minutes);
    let slice = match state.event_store.list_upcoming(today, &paging) {
        Ok(slice) => slice,
        Err(err) => {
            error!("Failed to list upcoming events: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let token = state.token_forge.mint(ACTION_LOAD_MORE, "");
    Html(render::render_events_page(
        &slice.events,
        max_pages(slice.total_matching, paging.page_size()),
        EVENTS_PAGE_ENDPOINT,
        &token,
    ))
    .into_response()
}

#[derive(Deserialize, Debug)]
struct LoadMoreBody {
    page: Option<String>,
    token: Option<String>,
}

async fn load_more_events(
    State(state): State<ServerState>,
    Form(body): Form<LoadMoreBody>,
) -> Response {
    let token = body.token.unwrap_or_default();
    if !state.token_forge.verify(ACTION_LOAD_MORE, "", &token) {
        warn!("Rejected load-more request with missing or invalid token");
        return failure(StatusCode::FORBIDDEN, "invalid token");
    }

    // Strict by choice: "page=abc" or "page=0" is a client bug, not a request
    // for page 1.
    let page: u32 = match body.page.as_deref().unwrap_or("").trim().parse() {
        Ok(page) if page >= 1 => page,
        _ => return failure(StatusCode::BAD_REQUEST, "invalid page"),
    };

    let paging = match Paging::new(page, state.config.page_size) {
        Ok(paging) => paging,
        Err(err) => return failure(StatusCode::BAD_REQUEST, &err.to_string()),
    };

    let today = today_with_offset(state.config.utc_offset_minutes);
    match state.event_store.list_upcoming(today, &paging) {
        Ok(slice) => Json(LoadMoreSuccess {
            success: true,
            data: LoadMoreData {
                html: render::render_events_list(&slice.events),
                max_pages: max_pages(slice.total_matching, paging.page_size()),
            },
        })
        .into_response(),
        Err(err) => {
            error!("Failed to list upcoming events: {}", err);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "storage error")
        }
    }
}

#[derive(Deserialize, Debug)]
struct CreateEventBody {
    title: String,
}

async fn create_event(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<CreateEventBody>,
) -> Response {
    if !session.has_permission(Permission::EditEvents) {
        warn!(
            "User {} tried to create an event without the EditEvents permission",
            session.user_id
        );
        return failure(StatusCode::FORBIDDEN, "missing permission");
    }

    let title = sanitize_text_field(&body.title);
    if title.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "title must not be empty");
    }

    match state.event_store.create_event(&title) {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(err) => {
            error!("Failed to create event: {}", err);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "storage error")
        }
    }
}

async fn event_edit_form(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    if !session.has_permission(Permission::EditEvents) {
        warn!(
            "User {} tried to open the editor without the EditEvents permission",
            session.user_id
        );
        return failure(StatusCode::FORBIDDEN, "missing permission");
    }

    match state.event_store.get_event(&id) {
        Ok(Some(event)) => {
            let token = state.token_forge.mint(ACTION_EVENT_EDIT, &session.token);
            Html(render::render_edit_form(&event, &token)).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to load event {}: {}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, Debug)]
struct EventEditBody {
    date: Option<String>,
    place: Option<String>,
    csrf_token: Option<String>,
}

async fn save_event_details(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Form(body): Form<EventEditBody>,
) -> Response {
    if !session.has_permission(Permission::EditEvents) {
        warn!(
            "User {} tried to save event {} without the EditEvents permission",
            session.user_id, id
        );
        return failure(StatusCode::FORBIDDEN, "missing permission");
    }

    let token = body.csrf_token.unwrap_or_default();
    if !state
        .token_forge
        .verify(ACTION_EVENT_EDIT, &session.token, &token)
    {
        warn!("Rejected save of event {} with missing or invalid token", id);
        return failure(StatusCode::FORBIDDEN, "invalid token");
    }

    let current = match state.event_store.get_event(&id) {
        Ok(Some(event)) => event,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to load event {}: {}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // A field absent from the form keeps its stored value; submitted fields
    // are reduced to plain text first. An empty date clears the date.
    let date = match &body.date {
        None => current.date,
        Some(raw) => {
            let raw = sanitize_text_field(raw);
            if raw.is_empty() {
                None
            } else {
                match NaiveDate::parse_from_str(&raw, DATE_INPUT_FORMAT) {
                    Ok(date) => Some(date),
                    Err(_) => return failure(StatusCode::BAD_REQUEST, "invalid date"),
                }
            }
        }
    };
    let place = match &body.place {
        None => current.place,
        Some(raw) => sanitize_text_field(raw),
    };

    match state.event_store.update_event_details(&id, date, &place) {
        Ok(true) => Json(SaveSuccess { success: true }).into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to save event {}: {}", id, err);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "storage error")
        }
    }
}

pub(super) fn make_public_event_routes(state: ServerState) -> Router {
    Router::new()
        .route("/page", post(load_more_events))
        .with_state(state)
}

pub(super) fn make_admin_routes(state: ServerState) -> Router {
    Router::new()
        .route("/event", post(create_event))
        .route("/event/{id}/edit", get(event_edit_form))
        .route("/event/{id}/edit", post(save_event_details))
        .with_state(state)
}
