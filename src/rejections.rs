use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use maud::{html, Markup};

use crate::{names, views};

#[derive(Debug)]
pub enum AppError {
    Internal(&'static str),
    Input(&'static str),
    NotFound(&'static str),
    Unauthorized,
    Forbidden,
    Conflict(&'static str),
    NotAcceptable,
    PayloadTooLarge,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AppError::Internal(msg)
            | AppError::Input(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
            AppError::Unauthorized => "Login required",
            AppError::Forbidden => "Forbidden",
            AppError::NotAcceptable => "Not acceptable",
            AppError::PayloadTooLarge => "File too large",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), error_page(self.status(), self.message())).into_response()
    }
}

fn error_page(status: StatusCode, message: &str) -> Markup {
    views::page(
        "Error",
        html! {
            h1 { (status.as_u16()) }
            p { (message) }
            @if status == StatusCode::UNAUTHORIZED {
                a href=(names::LOGIN_URL) role="button" { "Log in" }
            }
        },
    )
}

/// Same error surface as [`AppError`], rendered as `{"error": ...}` JSON.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        (status, Json(serde_json::json!({ "error": self.0.message() }))).into_response()
    }
}

pub trait ResultExt<T> {
    fn reject(self, msg: &'static str) -> Result<T, AppError>;
    fn reject_input(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn reject(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{msg}: {e}");
            AppError::Internal(msg)
        })
    }

    fn reject_input(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::warn!("{msg}: {e}");
            AppError::Input(msg)
        })
    }
}

pub trait OptionExt<T> {
    fn or_not_found(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &'static str) -> Result<T, AppError> {
        self.ok_or(AppError::NotFound(msg))
    }
}
