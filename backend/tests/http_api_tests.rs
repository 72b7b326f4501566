//! End-to-end tests for the REST API against the local upstream.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sbhs_portal::config::AppConfig;
use sbhs_portal::http::{create_router, AppState};
use sbhs_portal::models::TimetablePayload;
use sbhs_portal::upstream::{
    ErrorContext, LocalFixture, LocalUpstream, TokenSet, UpstreamApi, UpstreamError, UpstreamFactory,
    UpstreamResult,
};

const TOKEN: &str = "test-access";

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.cookies.secure = false;
    config.oauth.client_id = "portal".to_string();
    config.oauth.authorize_url = "https://auth.example.test/authorize".to_string();
    config
}

fn setup(day: Value) -> (Router, LocalUpstream) {
    let upstream = LocalUpstream::with_fixture(LocalFixture {
        timetable: support::sample_payload(day),
        notices: json!([{"title": "Athletics carnival", "content": "Bring a hat"}]),
        userinfo: json!({"givenName": "Sam", "yearGroup": "9"}),
    });
    upstream.allow_access_token(TOKEN);

    let state = AppState::new(Arc::new(upstream.clone()), test_config());
    (create_router(state), upstream)
}

/// Local upstream whose data endpoints answer 503 to every authorized call.
struct UnavailableData(LocalUpstream);

impl UnavailableData {
    fn down<T>(result: UpstreamResult<T>, operation: &str) -> UpstreamResult<T> {
        result.and_then(|_| Err(UpstreamError::status(503, "maintenance", ErrorContext::new(operation))))
    }
}

#[async_trait]
impl UpstreamApi for UnavailableData {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn health_check(&self) -> UpstreamResult<bool> {
        Ok(false)
    }

    async fn fetch_timetable(&self, access_token: &str) -> UpstreamResult<TimetablePayload> {
        Self::down(self.0.fetch_timetable(access_token).await, "fetch_timetable")
    }

    async fn fetch_notices(&self, access_token: &str) -> UpstreamResult<Value> {
        Self::down(self.0.fetch_notices(access_token).await, "fetch_notices")
    }

    async fn fetch_userinfo(&self, access_token: &str) -> UpstreamResult<Value> {
        Self::down(self.0.fetch_userinfo(access_token).await, "fetch_userinfo")
    }

    async fn exchange_code(&self, code: &str) -> UpstreamResult<TokenSet> {
        self.0.exchange_code(code).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> UpstreamResult<TokenSet> {
        self.0.refresh_token(refresh_token).await
    }
}

fn request(method: Method, uri: &str, cookies: &[String]) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(COOKIE, cookies.join("; "));
    }
    builder.body(Body::empty()).unwrap()
}

fn get(uri: &str, cookies: &[String]) -> Request<Body> {
    request(Method::GET, uri, cookies)
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `name=value` pairs from the response's Set-Cookie headers.
fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect()
}

fn cookie_value(cookies: &[String], name: &str) -> Option<String> {
    cookies
        .iter()
        .filter_map(|c| c.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

fn access_cookie() -> String {
    format!("access_token={}", TOKEN)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup(json!({}));
    let response = send(&app, get("/health", &[])).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["upstream"], "local: reachable");
}

#[tokio::test]
async fn test_timetable_requires_login() {
    let (app, _) = setup(json!({"dayName": "Monday B"}));
    let response = send(&app, get("/api/timetable", &[])).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_timetable_filters_today_by_upstream_rotation() {
    let (app, _) = setup(json!({"dayName": "Monday B"}));
    let response = send(&app, get("/api/timetable", &[access_cookie()])).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookie_value(&cookies, "sid").is_some());

    let body = json_body(response).await;
    assert_eq!(body["weekType"], "B");
    assert_eq!(body["source"], "upstream");
    assert_eq!(body["day"], "Monday");
    assert_eq!(support::period_labels(&body["timetable"], "Monday"), vec!["1", "3"]);
    assert_eq!(support::period_labels(&body["timetable"], "Tuesday"), vec!["1", "2"]);
}

#[tokio::test]
async fn test_selection_sticks_per_session() {
    let (app, upstream) = setup(json!({"date": "2024-03-11", "weekType": "B"}));

    let first = send(&app, get("/api/timetable", &[access_cookie()])).await;
    let sid = cookie_value(&set_cookies(&first), "sid").unwrap();
    assert_eq!(json_body(first).await["weekType"], "B");

    // Upstream goes quiet.
    upstream.set_timetable(support::sample_payload(json!({"date": "2024-03-11"})));

    let session = vec![access_cookie(), format!("sid={}", sid)];
    let second = send(&app, get("/api/timetable", &session)).await;
    assert!(cookie_value(&set_cookies(&second), "sid").is_none());
    let body = json_body(second).await;
    assert_eq!(body["weekType"], "B");
    assert_eq!(body["source"], "memory");
    assert_eq!(support::period_labels(&body["timetable"], "Monday"), vec!["1", "3"]);

    // A new session has no memory and falls back to the default.
    let other = send(&app, get("/api/timetable", &[access_cookie()])).await;
    let body = json_body(other).await;
    assert_eq!(body["weekType"], "A");
    assert_eq!(body["source"], "default");
    assert_eq!(support::period_labels(&body["timetable"], "Monday"), vec!["1", "2"]);
}

#[tokio::test]
async fn test_week_override() {
    let (app, _) = setup(json!({"dayName": "Monday B"}));

    let response = send(&app, get("/api/timetable?week=a", &[access_cookie()])).await;
    let body = json_body(response).await;
    assert_eq!(body["weekType"], "A");
    assert_eq!(body["source"], "override");

    // Unusable overrides are ignored.
    let response = send(&app, get("/api/timetable?week=C", &[access_cookie()])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["weekType"], "B");
    assert_eq!(body["source"], "upstream");
}

#[tokio::test]
async fn test_missing_access_token_uses_refresh_cookie() {
    let (app, upstream) = setup(json!({"dayName": "Tue A"}));
    upstream.allow_refresh_token("r1");

    let response = send(&app, get("/api/timetable", &["refresh_token=r1".to_string()])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(cookie_value(&cookies, "access_token").unwrap().starts_with("local-access-"));
    assert!(cookie_value(&cookies, "refresh_token").unwrap().starts_with("local-refresh-"));

    let body = json_body(response).await;
    assert_eq!(body["day"], "Tuesday");
    assert_eq!(support::period_labels(&body["timetable"], "Tuesday"), vec!["1"]);
}

#[tokio::test]
async fn test_rejected_access_token_is_refreshed() {
    let (app, upstream) = setup(json!({}));
    upstream.allow_refresh_token("r1");
    upstream.revoke_access_token(TOKEN);

    let response = send(&app, get("/api/notices", &[access_cookie(), "refresh_token=r1".to_string()])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookie_value(&set_cookies(&response), "access_token").is_some());
    assert_eq!(json_body(response).await[0]["title"], "Athletics carnival");
}

#[tokio::test]
async fn test_refreshed_cookies_survive_failed_retry() {
    let local = LocalUpstream::new();
    local.allow_refresh_token("r1");
    let app = create_router(AppState::new(Arc::new(UnavailableData(local)), test_config()));

    let stale = vec!["access_token=expired".to_string(), "refresh_token=r1".to_string()];
    let response = send(&app, get("/api/timetable", &stale)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let cookies = set_cookies(&response);
    assert!(cookie_value(&cookies, "access_token").is_some());
    let refresh = cookie_value(&cookies, "refresh_token").unwrap();
    assert_eq!(json_body(response).await["code"], "UPSTREAM_ERROR");

    // r1 was spent by the refresh; the cookie sent back replaces it.
    let response = send(&app, request(Method::POST, "/api/auth/refresh", &["refresh_token=r1".to_string()])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let renewed = format!("refresh_token={}", refresh);
    let response = send(&app, get("/api/notices", &["access_token=expired".to_string(), renewed])).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(cookie_value(&set_cookies(&response), "refresh_token").is_some());
}

#[tokio::test]
async fn test_rejected_access_token_without_refresh() {
    let (app, upstream) = setup(json!({}));
    upstream.revoke_access_token(TOKEN);

    let response = send(&app, get("/api/userinfo", &[access_cookie()])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_userinfo_proxy() {
    let (app, _) = setup(json!({}));
    let response = send(&app, get("/api/userinfo", &[access_cookie()])).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(json_body(response).await["givenName"], "Sam");
}

#[tokio::test]
async fn test_login_redirects_with_state() {
    let (app, _) = setup(json!({}));
    let response = send(&app, get("/api/auth/login", &[])).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let state = cookie_value(&set_cookies(&response), "oauth_state").unwrap();
    let location = response.headers()[LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://auth.example.test/authorize?"));
    assert!(location.contains("client_id=portal"));
    assert!(location.contains(&format!("state={}", state)));
}

#[tokio::test]
async fn test_callback_sets_token_cookies() {
    let (app, _) = setup(json!({}));
    let response = send(
        &app,
        get("/api/auth/callback?code=abc&state=s1", &["oauth_state=s1".to_string()]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");

    let cookies = set_cookies(&response);
    let access = cookie_value(&cookies, "access_token").unwrap();
    assert!(cookie_value(&cookies, "refresh_token").is_some());
    assert_eq!(cookie_value(&cookies, "oauth_state").as_deref(), Some(""));

    // The new token works.
    let response = send(&app, get("/api/notices", &[format!("access_token={}", access)])).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let (app, _) = setup(json!({}));

    let response = send(
        &app,
        get("/api/auth/callback?code=abc&state=evil", &["oauth_state=s1".to_string()]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, get("/api/auth/callback?code=abc&state=s1", &[])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_reports_denied_access() {
    let (app, _) = setup(json!({}));
    let response = send(&app, get("/api/auth/callback?error=access_denied", &[])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("access_denied"));
}

#[tokio::test]
async fn test_refresh_endpoint() {
    let (app, upstream) = setup(json!({}));
    upstream.allow_refresh_token("r1");

    let response = send(&app, request(Method::POST, "/api/auth/refresh", &["refresh_token=r1".to_string()])).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cookie_value(&set_cookies(&response), "access_token").is_some());
    let body = json_body(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["expiresIn"], 3600);

    // Refresh tokens are single use in the local upstream.
    let response = send(&app, request(Method::POST, "/api/auth/refresh", &["refresh_token=r1".to_string()])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, request(Method::POST, "/api/auth/refresh", &[])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies_and_memory() {
    let (app, upstream) = setup(json!({"dayName": "Monday B"}));

    let first = send(&app, get("/api/timetable", &[access_cookie()])).await;
    let sid = cookie_value(&set_cookies(&first), "sid").unwrap();
    let session = vec![access_cookie(), format!("sid={}", sid)];

    let response = send(&app, request(Method::POST, "/api/auth/logout", &session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = set_cookies(&response);
    for name in ["access_token", "refresh_token", "sid"] {
        assert_eq!(cookie_value(&cleared, name).as_deref(), Some(""), "{}", name);
    }

    // The old session id no longer carries week B.
    upstream.set_timetable(support::sample_payload(json!({"dayName": "Monday"})));
    let body = json_body(send(&app, get("/api/timetable", &session)).await).await;
    assert_eq!(body["source"], "default");
    assert_eq!(body["weekType"], "A");
}

#[tokio::test]
async fn test_bundled_fixture_serves_filtered_monday() {
    let mut config = test_config();
    config.upstream.kind = "local".to_string();
    config.upstream.fixture_path = Some(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/local.json").to_string());

    let upstream = UpstreamFactory::create_local(&config).unwrap();
    upstream.allow_access_token(TOKEN);
    let app = create_router(AppState::new(Arc::new(upstream), config));

    let response = send(&app, get("/api/timetable", &[access_cookie()])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["weekType"], "B");
    assert_eq!(body["day"], "Monday");

    let subjects: Vec<&str> = body["timetable"]["Monday"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["subject"].as_str())
        .collect();
    assert_eq!(subjects, vec!["Roll Call", "English", "Science", "PDHPE"]);
    // Other days are left whole.
    assert_eq!(body["timetable"]["Tuesday"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_cookieless_clients_do_not_grow_sessions() {
    let upstream = LocalUpstream::with_fixture(LocalFixture {
        timetable: support::sample_payload(json!({"dayName": "Monday B"})),
        ..Default::default()
    });
    upstream.allow_access_token(TOKEN);

    let mut config = test_config();
    config.sessions.max_sessions = 5;
    let state = AppState::new(Arc::new(upstream), config);
    let app = create_router(state.clone());

    for _ in 0..50 {
        let response = send(&app, get("/api/timetable", &[access_cookie()])).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(state.selections.len(), 5);
}
