//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint. Data handlers delegate to
//! the upstream client and, for the timetable, to the refresh pipeline in
//! the service layer.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::auth::{authorize_url, refresh_tokens, with_access_token};
use super::cookies::{
    build_cookie, clear_cookie, read_cookie, SetCookies, ACCESS_TOKEN_COOKIE, OAUTH_STATE_COOKIE,
    OAUTH_STATE_MAX_AGE, REFRESH_TOKEN_COOKIE, SESSION_COOKIE,
};
use super::dto::{
    CallbackQuery, HealthResponse, LogoutResponse, RefreshOutcome, RefreshResponse, TimetableQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::WeekType;
use crate::services;

/// Response for handlers that may set cookies. The cookies are sent on
/// errors too.
pub type CookieResult<T> = (SetCookies, Result<Json<T>, AppError>);

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the upstream
/// is reachable.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream_status = match state.upstream.health_check().await {
        Ok(true) => "reachable".to_string(),
        Ok(false) => "unavailable".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream: format!("{}: {}", state.upstream.name(), upstream_status),
    })
}

// =============================================================================
// Auth
// =============================================================================

/// GET /api/auth/login
///
/// Redirect to the school's authorization page with a fresh `state`.
pub async fn login(State(state): State<AppState>) -> Result<(SetCookies, Redirect), AppError> {
    let login_state = Uuid::new_v4().to_string();
    let url = authorize_url(&state.config.oauth, &login_state)?;

    let mut cookies = SetCookies::none();
    cookies.push(build_cookie(
        OAUTH_STATE_COOKIE,
        &login_state,
        Some(OAUTH_STATE_MAX_AGE),
        &state.config.cookies,
    ));

    Ok((cookies, Redirect::to(&url)))
}

/// GET /api/auth/callback
///
/// Finish the code flow: check `state`, exchange the code and store the
/// tokens in cookies.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<(SetCookies, Redirect), AppError> {
    if let Some(error) = query.error {
        return Err(AppError::BadRequest(format!("Authorization failed: {}", error)));
    }

    let expected = read_cookie(&headers, OAUTH_STATE_COOKIE);
    if expected.is_none() || expected != query.state {
        tracing::warn!("OAuth callback with mismatched state");
        return Err(AppError::BadRequest("OAuth state mismatch".to_string()));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let tokens = state.upstream.exchange_code(&code).await?;
    tracing::info!("login completed, access token expires in {}s", tokens.expires_in);

    let mut cookies = SetCookies::for_tokens(&tokens, &state.config.cookies);
    cookies.push(clear_cookie(OAUTH_STATE_COOKIE, &state.config.cookies));

    Ok((cookies, Redirect::to("/")))
}

/// POST /api/auth/refresh
///
/// Trade the refresh cookie for new tokens.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(SetCookies, Json<RefreshResponse>), AppError> {
    let (tokens, cookies) = refresh_tokens(&state, &headers).await?;

    Ok((
        cookies,
        Json(RefreshResponse {
            ok: true,
            expires_in: tokens.expires_in,
        }),
    ))
}

/// POST /api/auth/logout
///
/// Clear token and session cookies and forget the session's rotation.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> (SetCookies, Json<LogoutResponse>) {
    if let Some(session_id) = read_cookie(&headers, SESSION_COOKIE) {
        state.selections.forget(&session_id);
    }

    let settings = &state.config.cookies;
    let mut cookies = SetCookies::none();
    for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, SESSION_COOKIE] {
        cookies.push(clear_cookie(name, settings));
    }

    (cookies, Json(LogoutResponse { ok: true }))
}

// =============================================================================
// Data Endpoints
// =============================================================================

/// GET /api/timetable?week=A|B
///
/// Fetch the week timetable and narrow today's periods to the active
/// rotation. The session's rotation memory is updated on every call.
pub async fn get_timetable(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TimetableQuery>,
) -> CookieResult<RefreshOutcome> {
    let week_override = query.week.as_deref().and_then(|raw| {
        raw.parse::<WeekType>()
            .map_err(|e| tracing::warn!("ignoring week override: {}", e))
            .ok()
    });

    let (mut cookies, payload) = with_access_token(&state, &headers, |upstream, token| async move {
        upstream.fetch_timetable(&token).await
    })
    .await;
    let payload = match payload {
        Ok(payload) => payload,
        Err(e) => return (cookies, Err(e)),
    };

    let session_id = match read_cookie(&headers, SESSION_COOKIE) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            cookies.push(build_cookie(SESSION_COOKIE, &id, None, &state.config.cookies));
            id
        }
    };

    let memory = state.selections.load(&session_id);
    let (outcome, memory) = services::refresh(&payload, week_override, memory);
    state.selections.store(&session_id, memory);

    tracing::debug!(
        "timetable refresh: week {} via {:?}, day {:?}",
        outcome.week_type,
        outcome.source,
        outcome.day
    );

    (cookies, Ok(Json(outcome)))
}

/// GET /api/notices
pub async fn get_notices(State(state): State<AppState>, headers: HeaderMap) -> CookieResult<Value> {
    let (cookies, notices) = with_access_token(&state, &headers, |upstream, token| async move {
        upstream.fetch_notices(&token).await
    })
    .await;

    (cookies, notices.map(Json))
}

/// GET /api/userinfo
pub async fn get_userinfo(State(state): State<AppState>, headers: HeaderMap) -> CookieResult<Value> {
    let (cookies, userinfo) = with_access_token(&state, &headers, |upstream, token| async move {
        upstream.fetch_userinfo(&token).await
    })
    .await;

    (cookies, userinfo.map(Json))
}
