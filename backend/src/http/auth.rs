//! OAuth helpers shared by the auth and data handlers.

use axum::http::HeaderMap;
use reqwest::Url;
use std::future::Future;
use std::sync::Arc;

use super::cookies::{read_cookie, SetCookies, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use super::error::AppError;
use super::state::AppState;
use crate::config::OAuthSettings;
use crate::upstream::{TokenSet, UpstreamApi, UpstreamResult};

/// Authorization endpoint URL for the code flow.
pub fn authorize_url(oauth: &OAuthSettings, state: &str) -> Result<String, AppError> {
    let url = Url::parse_with_params(
        &oauth.authorize_url,
        &[
            ("response_type", "code"),
            ("client_id", oauth.client_id.as_str()),
            ("redirect_uri", oauth.redirect_uri.as_str()),
            ("scope", oauth.scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| AppError::Internal(format!("Invalid authorize URL: {}", e)))?;
    Ok(url.into())
}

/// Exchange the refresh cookie for new tokens.
pub async fn refresh_tokens(state: &AppState, headers: &HeaderMap) -> Result<(TokenSet, SetCookies), AppError> {
    let refresh = read_cookie(headers, REFRESH_TOKEN_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

    let tokens = state.upstream.refresh_token(&refresh).await?;
    tracing::debug!("refreshed access token, expires in {}s", tokens.expires_in);

    let cookies = SetCookies::for_tokens(&tokens, &state.config.cookies);
    Ok((tokens, cookies))
}

/// Run an upstream call with the caller's access token.
///
/// Without an access cookie, or when the upstream rejects it, the refresh
/// cookie is traded for new tokens and the call is made once more. The
/// returned cookies must be set on the response whatever the outcome: once
/// the refresh succeeded, the old refresh token is spent and only the new
/// cookies keep the browser logged in.
pub async fn with_access_token<T, F, Fut>(
    state: &AppState,
    headers: &HeaderMap,
    call: F,
) -> (SetCookies, Result<T, AppError>)
where
    F: Fn(Arc<dyn UpstreamApi>, String) -> Fut,
    Fut: Future<Output = UpstreamResult<T>>,
{
    let has_refresh = read_cookie(headers, REFRESH_TOKEN_COOKIE).is_some();

    match read_cookie(headers, ACCESS_TOKEN_COOKIE) {
        Some(token) => match call(state.upstream.clone(), token).await {
            Ok(value) => return (SetCookies::none(), Ok(value)),
            Err(e) if e.is_unauthorized() && has_refresh => {
                tracing::info!("access token rejected upstream, refreshing");
            }
            Err(e) => return (SetCookies::none(), Err(e.into())),
        },
        None if !has_refresh => {
            return (
                SetCookies::none(),
                Err(AppError::Unauthorized("Not logged in".to_string())),
            );
        }
        None => {}
    }

    let (tokens, cookies) = match refresh_tokens(state, headers).await {
        Ok(refreshed) => refreshed,
        Err(e) => return (SetCookies::none(), Err(e)),
    };

    let result = call(state.upstream.clone(), tokens.access_token).await;
    if let Err(ref e) = result {
        tracing::warn!("upstream call failed after token refresh: {}", e);
    }
    (cookies, result.map_err(AppError::from))
}
