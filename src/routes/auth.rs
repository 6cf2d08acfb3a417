use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::{request, response};

/// The refresh token travels exclusively in this cookie; access tokens
/// travel exclusively in the `Authorization` header. No endpoint reads both.
const REFRESH_COOKIE: &str = "refresh_token";

#[instrument(skip(state, params))]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(params): Json<request::LoginData>,
) -> Result<impl IntoResponse, Error> {
    let tokens = state.auth.login(&params.email, &params.password).await?;

    let cookie = refresh_cookie(&tokens.refresh_token, state.auth.refresh_lifetime_secs());

    Ok(([(header::SET_COOKIE, cookie)], Json(tokens)))
}

#[instrument(skip(state, headers))]
pub(crate) async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<response::Refresh>, Error> {
    let token = cookie_value(&headers, REFRESH_COOKIE).ok_or(Error::NoCredentials)?;

    let refreshed = state.auth.refresh(&token).await?;

    Ok(Json(refreshed))
}

/// Stateless logout: the previously issued tokens stay valid until their
/// natural expiry, all this can do is clear the cookie.
#[instrument]
pub(crate) async fn logout() -> impl IntoResponse {
    ([(header::SET_COOKIE, clear_refresh_cookie())], Json("Logged out"))
}

fn refresh_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        REFRESH_COOKIE, token, max_age_secs
    )
}

fn clear_refresh_cookie() -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        REFRESH_COOKIE
    )
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc.def.ghi", 604800);

        assert!(cookie.starts_with("refresh_token=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie();

        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; refresh_token=abc.def.ghi; lang=en".parse().unwrap(),
        );

        assert_eq!(
            cookie_value(&headers, "refresh_token").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(cookie_value(&headers, "session"), None);
    }

    #[test]
    fn test_cookie_value_no_header() {
        let headers = HeaderMap::new();

        assert_eq!(cookie_value(&headers, "refresh_token"), None);
    }
}
