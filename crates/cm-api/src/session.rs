//! Resolving who is calling, and the session cookie that says so.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::HttpRequest;
use base64::Engine;
use chrono::{Duration, Utc};
use cm_core::forms::LoginForm;
use cm_core::service;
use cm_core::{AppError, Requester, Result};

use crate::handlers::AppState;

/// Cookie name and lifetime for browser sessions.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub cookie_name: String,
    pub ttl: Duration,
    /// Sets the `Secure` attribute
    pub secure: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            cookie_name: "sessionid".to_string(),
            ttl: Duration::days(14),
            secure: false,
        }
    }
}

impl SessionPolicy {
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), "").path("/").finish();
        cookie.make_removal();
        cookie
    }
}

/// Raw session token from the request cookie, if any.
pub fn session_token(req: &HttpRequest, state: &AppState) -> Option<String> {
    req.cookie(&state.session.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Identity for page handlers: session cookie or anonymous.
pub async fn page_requester(req: &HttpRequest, state: &AppState) -> Result<Requester> {
    match session_token(req, state) {
        Some(token) => service::resolve_session(&*state.users, &*state.auth, &token, Utc::now()).await,
        None => Ok(Requester::Anonymous),
    }
}

/// Identity for API handlers: HTTP Basic credentials when sent, else the session cookie.
/// Wrong or malformed Basic credentials fail even for reads.
pub async fn api_requester(req: &HttpRequest, state: &AppState) -> Result<Requester> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return page_requester(req, state).await;
    };
    let (username, password) = parse_basic(value.to_str().unwrap_or_default())?;
    let form = LoginForm {
        username,
        password,
        next: None,
    };
    match service::authenticate(&*state.users, &*state.auth, &form).await {
        Ok(user) => Ok(Requester::from_user(&user)),
        Err(AppError::ValidationError(_)) => Err(AppError::AuthenticationRequired),
        Err(other) => Err(other),
    }
}

fn parse_basic(header_value: &str) -> Result<(String, String)> {
    let encoded = header_value
        .strip_prefix("Basic ")
        .ok_or(AppError::AuthenticationRequired)?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::AuthenticationRequired)?;
    let text = String::from_utf8(decoded).map_err(|_| AppError::AuthenticationRequired)?;
    let (username, password) = text.split_once(':').ok_or(AppError::AuthenticationRequired)?;
    Ok((username.to_string(), password.to_string()))
}

/// Accepts only same-site paths as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}
