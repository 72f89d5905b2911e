use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, uri::PathAndQuery, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use client_core::{
    add_session, group_by_slot, membership, read_agenda, register, registered_ids,
    remove_session, ApiClientError, ConferenceApi, RegistrationError, RegistrationForm,
};
use serde::Deserialize;
use shared::{
    domain::{SessionId, SpeakerId},
    validation::MAX_NAME_CHARS,
};
use tracing::info;

use crate::{
    app_state::AppState,
    error::PageError,
    identity::{cleared_cookie, session_cookie, CallerIdentity},
    render,
};

const LOGIN_PATH: &str = "/Account/Login";

type PageResult = Result<Response, PageError>;

fn html(title: &str, caller: &CallerIdentity, body: &str) -> Response {
    Html(render::page(title, caller.user_name(), body)).into_response()
}

async fn registered_for(
    api: &dyn ConferenceApi,
    caller: &CallerIdentity,
) -> Result<Option<HashSet<SessionId>>, ApiClientError> {
    let Some(user_name) = caller.user_name() else {
        return Ok(None);
    };
    let attendee = api.get_attendee(user_name).await?;
    Ok(Some(
        attendee.as_ref().map(registered_ids).unwrap_or_default(),
    ))
}

/// Only same-site absolute paths are accepted as redirect targets.
fn local_path(candidate: Option<&str>) -> &str {
    match candidate {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

/// Rejects control characters and whitespace: browsers strip them from
/// `Location`, turning `/\t/host` into `//host`.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(|c| c.is_control() || c.is_whitespace())
        && path.parse::<PathAndQuery>().is_ok()
}

pub(crate) async fn index(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> PageResult {
    let api = state.api.as_ref();
    let (sessions, registered) =
        tokio::try_join!(api.list_sessions(), registered_for(api, &caller))?;
    let days = group_by_slot(sessions);
    Ok(html(
        "Agenda",
        &caller,
        &render::schedule(&days, registered.as_ref()),
    ))
}

pub(crate) async fn session(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(session_id): Path<i64>,
) -> PageResult {
    let api = state.api.as_ref();
    let session_id = SessionId(session_id);
    let (session, registered) =
        tokio::try_join!(api.get_session(session_id), registered_for(api, &caller))?;
    let session = session.ok_or_else(|| PageError::NotFound("Session not found.".into()))?;
    let agenda_state = registered.map(|ids| membership(session_id, &ids));
    Ok(html(
        &session.title,
        &caller,
        &render::session_detail(&session, agenda_state),
    ))
}

pub(crate) async fn speakers(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> PageResult {
    let speakers = state.api.list_speakers().await?;
    Ok(html("Speakers", &caller, &render::speaker_list(&speakers)))
}

pub(crate) async fn speaker(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Path(speaker_id): Path<i64>,
) -> PageResult {
    let speaker = state
        .api
        .get_speaker(SpeakerId(speaker_id))
        .await?
        .ok_or_else(|| PageError::NotFound("Speaker not found.".into()))?;
    Ok(html(&speaker.name, &caller, &render::speaker_detail(&speaker)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    term: String,
}

pub(crate) async fn search(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Query(query): Query<SearchQuery>,
) -> PageResult {
    let term = query.term.trim();
    if term.is_empty() {
        return Ok(html("Search", &caller, &render::search("", None)));
    }
    let results = state.api.search(term).await?;
    Ok(html(
        "Search",
        &caller,
        &render::search(term, Some(&results)),
    ))
}

pub(crate) async fn my_agenda(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> PageResult {
    let Some(user_name) = caller.user_name() else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let sessions = read_agenda(state.api.as_ref(), user_name).await?;
    Ok(html("My agenda", &caller, &render::my_agenda(&sessions)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgendaForm {
    session_id: i64,
    return_to: Option<String>,
}

pub(crate) async fn agenda_add(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Form(form): Form<AgendaForm>,
) -> PageResult {
    let Some(user_name) = caller.user_name() else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    add_session(state.api.as_ref(), user_name, SessionId(form.session_id)).await?;
    Ok(Redirect::to(local_path(form.return_to.as_deref())).into_response())
}

pub(crate) async fn agenda_remove(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Form(form): Form<AgendaForm>,
) -> PageResult {
    let Some(user_name) = caller.user_name() else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    remove_session(state.api.as_ref(), user_name, SessionId(form.session_id)).await?;
    Ok(Redirect::to(local_path(form.return_to.as_deref())).into_response())
}

pub(crate) async fn welcome(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> PageResult {
    let Some(user_name) = caller.user_name() else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    if state.api.get_attendee(user_name).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(html(
        "Welcome",
        &caller,
        &render::welcome_form(user_name, &RegistrationForm::default(), &[], None),
    ))
}

pub(crate) async fn welcome_submit(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Form(form): Form<RegistrationForm>,
) -> PageResult {
    let Some(user_name) = caller.user_name() else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    match register(state.api.as_ref(), user_name, &form).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(RegistrationError::Invalid(errors)) => Ok(html(
            "Welcome",
            &caller,
            &render::welcome_form(user_name, &form, &errors, None),
        )),
        Err(err @ RegistrationError::AlreadyRegistered) => {
            let body = render::welcome_form(user_name, &form, &[], Some(&err.to_string()));
            Ok((StatusCode::CONFLICT, html("Welcome", &caller, &body)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) async fn login(caller: CallerIdentity) -> Response {
    html("Log in", &caller, &render::login_form(None))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    user_name: String,
}

pub(crate) async fn login_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> PageResult {
    let user_name = form.user_name.trim();
    let problem = if user_name.is_empty() {
        Some("User name is required.".to_string())
    } else if user_name.chars().count() > MAX_NAME_CHARS {
        Some(format!("User name must be at most {MAX_NAME_CHARS} characters."))
    } else {
        None
    };
    if let Some(problem) = problem {
        let body = render::login_form(Some(&problem));
        return Ok((
            StatusCode::BAD_REQUEST,
            html("Log in", &CallerIdentity::Anonymous, &body),
        )
            .into_response());
    }

    let token = state.identity.mint(user_name)?;
    info!(%user_name, "signed in");
    Ok((
        [(SET_COOKIE, session_cookie(token).to_string())],
        Redirect::to("/"),
    )
        .into_response())
}

pub(crate) async fn logout(caller: CallerIdentity) -> Response {
    if let Some(user_name) = caller.user_name() {
        info!(%user_name, "signed out");
    }
    (
        [(SET_COOKIE, cleared_cookie().to_string())],
        Redirect::to("/"),
    )
        .into_response()
}

pub(crate) async fn healthz() -> &'static str {
    "ok"
}

const STATIC_ROUTES: [&str; 8] = [
    "/Speakers",
    "/Search",
    "/MyAgenda",
    "/Welcome",
    "/Account/Login",
    "/Account/Logout",
    "/agenda/add",
    "/agenda/remove",
];
const PARAM_ROUTES: [&str; 2] = ["/Session/", "/Speaker/"];

/// Route paths match case-insensitively: a differently cased (or
/// slash-terminated) path redirects to the registered spelling.
fn canonical_route(path: &str) -> Option<String> {
    let trimmed = path.strip_suffix('/').filter(|rest| !rest.is_empty()).unwrap_or(path);
    if let Some(route) = STATIC_ROUTES
        .iter()
        .find(|route| route.eq_ignore_ascii_case(trimmed))
    {
        return Some((*route).to_string());
    }
    PARAM_ROUTES.iter().find_map(|prefix| {
        let head = trimmed.get(..prefix.len())?;
        let id = &trimmed[prefix.len()..];
        (head.eq_ignore_ascii_case(prefix) && !id.is_empty() && !id.contains('/'))
            .then(|| format!("{prefix}{id}"))
    })
}

pub(crate) async fn not_found(caller: CallerIdentity, uri: Uri) -> Response {
    if let Some(route) = canonical_route(uri.path()).filter(|route| route != uri.path()) {
        let target = match uri.query() {
            Some(query) => format!("{route}?{query}"),
            None => route,
        };
        return Redirect::permanent(&target).into_response();
    }
    let body = format!(
        "<h1>Not Found</h1><p>No page lives at {}.</p>",
        render::text(uri.path())
    );
    (StatusCode::NOT_FOUND, html("Not Found", &caller, &body)).into_response()
}

#[cfg(test)]
#[path = "tests/pages_tests.rs"]
mod tests;
