use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use server_api::{
    add_session_to_attendee, create_attendee, create_session, delete_session, get_attendee,
    get_session, get_speaker, list_attendee_sessions, list_sessions, list_speakers,
    remove_session_from_attendee, search, update_session, ApiContext,
};
use shared::{
    domain::{SessionId, SpeakerId},
    error::{ApiError, ErrorCode},
    protocol::{
        AttendeeRequest, AttendeeResponse, SearchRequest, SearchResult, SessionRequest,
        SessionResponse, SpeakerResponse,
    },
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "conference api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/sessions", get(http_list_sessions).post(http_create_session))
        .route(
            "/api/sessions/:session_id",
            get(http_get_session)
                .put(http_update_session)
                .delete(http_delete_session),
        )
        .route("/api/speakers", get(http_list_speakers))
        .route("/api/speakers/:speaker_id", get(http_get_speaker))
        .route("/api/attendees", post(http_create_attendee))
        .route("/api/attendees/:user_name", get(http_get_attendee))
        .route(
            "/api/attendees/:user_name/sessions",
            get(http_list_attendee_sessions),
        )
        .route(
            "/api/attendees/:user_name/session/:session_id",
            post(http_add_attendee_session).delete(http_remove_attendee_session),
        )
        .route("/api/search", post(http_search))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = status_for(err.code);
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_list_sessions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = list_sessions(&state.api).await.map_err(reject)?;
    Ok(Json(sessions))
}

async fn http_get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
) -> ApiResult<Json<SessionResponse>> {
    let session = get_session(&state.api, SessionId(session_id))
        .await
        .map_err(reject)?;
    Ok(Json(session))
}

async fn http_create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = create_session(&state.api, &req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn http_update_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = update_session(&state.api, SessionId(session_id), &req)
        .await
        .map_err(reject)?;
    Ok(Json(session))
}

async fn http_delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<i64>,
) -> ApiResult<StatusCode> {
    delete_session(&state.api, SessionId(session_id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_list_speakers(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SpeakerResponse>>> {
    let speakers = list_speakers(&state.api).await.map_err(reject)?;
    Ok(Json(speakers))
}

async fn http_get_speaker(
    State(state): State<Arc<AppState>>,
    Path(speaker_id): Path<i64>,
) -> ApiResult<Json<SpeakerResponse>> {
    let speaker = get_speaker(&state.api, SpeakerId(speaker_id))
        .await
        .map_err(reject)?;
    Ok(Json(speaker))
}

async fn http_get_attendee(
    State(state): State<Arc<AppState>>,
    Path(user_name): Path<String>,
) -> ApiResult<Json<AttendeeResponse>> {
    let attendee = get_attendee(&state.api, &user_name)
        .await
        .map_err(reject)?;
    Ok(Json(attendee))
}

async fn http_create_attendee(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AttendeeRequest>,
) -> ApiResult<(StatusCode, Json<AttendeeResponse>)> {
    let attendee = create_attendee(&state.api, &req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(attendee)))
}

async fn http_list_attendee_sessions(
    State(state): State<Arc<AppState>>,
    Path(user_name): Path<String>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = list_attendee_sessions(&state.api, &user_name)
        .await
        .map_err(reject)?;
    Ok(Json(sessions))
}

async fn http_add_attendee_session(
    State(state): State<Arc<AppState>>,
    Path((user_name, session_id)): Path<(String, i64)>,
) -> ApiResult<StatusCode> {
    add_session_to_attendee(&state.api, &user_name, SessionId(session_id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_remove_attendee_session(
    State(state): State<Arc<AppState>>,
    Path((user_name, session_id)): Path<(String, i64)>,
) -> ApiResult<StatusCode> {
    remove_session_from_attendee(&state.api, &user_name, SessionId(session_id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let results = search(&state.api, &req.query).await.map_err(reject)?;
    Ok(Json(results))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
