use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use axum::{
    body::Body,
    extract::State,
    http::{header, response, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use super::events_routes::{events_page, make_admin_routes, make_public_event_routes};
#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::session::Session;
use super::state::{GuardedEventStore, GuardedTokenForge, GuardedUserManager, ServerState};
use super::{log_requests, ServerConfig};
use crate::user::auth::AuthTokenValue;

const EVENTS_JS: &str = include_str!("../../assets/events.js");
const EVENTS_CSS: &str = include_str!("../../assets/events.css");

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub events_count: usize,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn status(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        events_count: state.event_store.events_count(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn events_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        EVENTS_JS,
    )
}

async fn events_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], EVENTS_CSS)
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for {}", body.user_handle);

    let credentials = match user_manager.get_user_credentials(&body.user_handle) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => {
            error!("Error loading credentials: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let password_credentials = match &credentials.username_password {
        Some(password_credentials) => password_credentials,
        None => return StatusCode::UNAUTHORIZED.into_response(),
    };

    match password_credentials.hasher.verify(
        body.password.as_str(),
        password_credentials.hash.as_str(),
        password_credentials.salt.as_str(),
    ) {
        Ok(true) => {}
        _ => return StatusCode::UNAUTHORIZED.into_response(),
    }

    match user_manager.generate_auth_token(&credentials) {
        Ok(auth_token) => {
            let response_body = LoginSuccessResponse {
                token: auth_token.value.0.clone(),
            };
            let response_body = serde_json::to_string(&response_body).unwrap();

            let cookie_value = HeaderValue::from_str(&format!(
                "session_token={}; Path=/; HttpOnly",
                auth_token.value.0
            ))
            .unwrap();
            response::Builder::new()
                .status(StatusCode::CREATED)
                .header(header::SET_COOKIE, cookie_value)
                .body(Body::from(response_body))
                .unwrap()
        }
        Err(err) => {
            error!("Error with auth token generation: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager.delete_auth_token(session.user_id, &AuthTokenValue(session.token)) {
        Ok(()) => {
            let cookie_value = Cookie::build(Cookie::new("session_token", ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
                .unwrap()
        }
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        event_store: GuardedEventStore,
        user_manager: GuardedUserManager,
        token_forge: GuardedTokenForge,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            event_store,
            user_manager,
            token_forge,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    event_store: GuardedEventStore,
    user_manager: GuardedUserManager,
    token_forge: GuardedTokenForge,
) -> Result<Router> {
    let state = ServerState::new(config, event_store, user_manager, token_forge);

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let events_routes = make_public_event_routes(state.clone());
    let admin_routes = make_admin_routes(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(events_page))
        .route("/assets/events.js", get(events_js))
        .route("/assets/events.css", get(events_css))
        .route("/v1/status", get(status))
        .with_state(state.clone())
        .nest("/v1/auth", auth_routes)
        .nest("/v1/events", events_routes)
        .nest("/v1/admin", admin_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    event_store: GuardedEventStore,
    user_manager: GuardedUserManager,
    token_forge: GuardedTokenForge,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, event_store, user_manager, token_forge)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
