//! HTTP renderings of `AppError`: HTML pages for the site, JSON for the API.

use std::fmt;

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use cm_core::AppError;
use cm_ui::ErrorTemplate;
use serde_json::json;

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(..) => StatusCode::NOT_FOUND,
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log_if_internal(err: &AppError) {
    if let AppError::Internal(msg) = err {
        log::error!("request failed: {msg}");
    }
}

/// Error returned by the HTML page handlers.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::AuthenticationRequired => StatusCode::SEE_OTHER,
            ref other => status_for(other),
        }
    }

    fn error_response(&self) -> HttpResponse {
        log_if_internal(&self.0);
        if let AppError::AuthenticationRequired = self.0 {
            return HttpResponse::SeeOther()
                .insert_header((header::LOCATION, "/login/"))
                .finish();
        }

        let status = self.status_code();
        let message = match &self.0 {
            AppError::NotFound(..) => "The requested page was not found.".to_string(),
            AppError::Internal(_) => "Something went wrong on our side.".to_string(),
            other => other.to_string(),
        };
        let page = ErrorTemplate {
            current_user: None,
            status: status.as_u16(),
            message: &message,
        };
        match page.render() {
            Ok(html) => HttpResponse::build(status).content_type("text/html; charset=utf-8").body(html),
            Err(err) => {
                log::error!("error template failed to render: {err}");
                HttpResponse::build(status).body(message)
            }
        }
    }
}

/// Error returned by the JSON API handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(&self.0)
    }

    fn error_response(&self) -> HttpResponse {
        log_if_internal(&self.0);
        let mut builder = HttpResponse::build(self.status_code());
        match &self.0 {
            AppError::ValidationError(errors) => builder.json(errors),
            AppError::AuthenticationRequired => builder
                .insert_header((header::WWW_AUTHENTICATE, "Basic realm=\"api\""))
                .json(json!({ "detail": "Authentication credentials were not provided." })),
            AppError::NotFound(..) => builder.json(json!({ "detail": "Not found." })),
            AppError::Forbidden(msg) | AppError::Conflict(msg) => builder.json(json!({ "detail": msg })),
            AppError::Internal(_) => builder.json(json!({ "detail": "A server error occurred." })),
        }
    }
}
