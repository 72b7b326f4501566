//! Cookie plumbing for tokens and sessions.
//!
//! Tokens never reach browser scripts: every cookie set here is
//! `HttpOnly` with `SameSite=Lax`, and `Secure` unless disabled in config.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use std::convert::Infallible;

use crate::config::CookieSettings;
use crate::upstream::TokenSet;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const SESSION_COOKIE: &str = "sid";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Lifetime of the login `state` cookie in seconds.
pub const OAUTH_STATE_MAX_AGE: u64 = 600;

/// Value of the named cookie from the request, if sent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a cookie scoped to the whole site.
pub fn build_cookie(name: &str, value: &str, max_age: Option<u64>, settings: &CookieSettings) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value);
    if settings.secure {
        cookie.push_str("; Secure");
    }
    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age));
    }
    cookie
}

/// `Set-Cookie` value that deletes a cookie.
pub fn clear_cookie(name: &str, settings: &CookieSettings) -> String {
    build_cookie(name, "", Some(0), settings)
}

/// Response cookies, appended as separate `Set-Cookie` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetCookies(Vec<String>);

impl SetCookies {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cookie: String) {
        self.0.push(cookie);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Cookies for a freshly issued token set.
    ///
    /// The refresh cookie is only rewritten when the token endpoint sent a
    /// new refresh token.
    pub fn for_tokens(tokens: &TokenSet, settings: &CookieSettings) -> Self {
        let mut cookies = Self::none();
        cookies.push(build_cookie(
            ACCESS_TOKEN_COOKIE,
            &tokens.access_token,
            Some(tokens.expires_in),
            settings,
        ));
        if let Some(ref refresh) = tokens.refresh_token {
            cookies.push(build_cookie(
                REFRESH_TOKEN_COOKIE,
                refresh,
                Some(settings.refresh_max_age_secs),
                settings,
            ));
        }
        cookies
    }
}

impl IntoResponseParts for SetCookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.0 {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("dropping unencodable cookie: {}", e),
            }
        }
        Ok(res)
    }
}
