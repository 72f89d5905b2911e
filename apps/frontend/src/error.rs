use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use client_core::{ApiClientError, RegistrationError};
use shared::error::ErrorCode;
use thiserror::Error;
use tracing::error;

use crate::render;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("conference api unavailable: {0}")]
    Upstream(ApiClientError),
    #[error("failed to issue identity token: {0}")]
    Identity(#[from] jsonwebtoken::errors::Error),
}

impl From<ApiClientError> for PageError {
    fn from(err: ApiClientError) -> Self {
        match &err {
            ApiClientError::Rejected { source, .. } => match source.code {
                ErrorCode::NotFound => Self::NotFound(source.message.clone()),
                ErrorCode::Validation => Self::BadRequest(source.message.clone()),
                _ => Self::Upstream(err),
            },
            _ => Self::Upstream(err),
        }
    }
}

impl From<RegistrationError> for PageError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Api(err) => err.into(),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl PageError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Identity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "page request failed");
        }
        let message = match &self {
            Self::NotFound(message) | Self::BadRequest(message) => message.clone(),
            Self::Upstream(_) => "The conference service is unavailable. Try again shortly.".into(),
            Self::Identity(_) => "Something went wrong while signing you in.".into(),
        };
        let title = status.canonical_reason().unwrap_or("Error");
        let body = render::page(
            title,
            None,
            &format!("<h1>{}</h1><p>{}</p>", render::text(title), render::text(&message)),
        );
        (status, Html(body)).into_response()
    }
}
