//! The `token` session cookie.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::http::header::InvalidHeaderValue;
use std::time::Duration;

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    secure: bool,
    max_age: Duration,
}

impl SessionCookies {
    pub fn new(secure: bool, max_age: Duration) -> Self {
        Self { secure, max_age }
    }

    /// `Set-Cookie` value carrying a freshly issued token.
    pub fn issue(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        self.build(token, self.max_age)
    }

    /// `Set-Cookie` value telling the client to drop its token immediately.
    pub fn clear(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        self.build("", Duration::ZERO)
    }

    fn build(&self, value: &str, max_age: Duration) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly",
            TOKEN_COOKIE,
            value,
            max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Strict");

        HeaderValue::from_str(&cookie)
    }
}

/// Reads the `token` cookie from a request.
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.trim() == TOKEN_COOKIE).then(|| value.trim().to_string())
        })
}
