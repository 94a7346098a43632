//! Failures that end an asset request, and their user-visible mapping.

use std::error::Error as _;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::response::{image_loading_error, image_not_found, method_not_allowed};
use crate::origin::OriginError;

/// Every way serving an image can fail.
///
/// None of these are retried, except the empty-body condition which gets
/// exactly one second attempt before becoming `EmptyBody`.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    /// The origin answered with a non-success status.
    #[error("Origin responded with {}: {}", .status.as_u16(), .reason)]
    UpstreamStatus { status: StatusCode, reason: String },

    #[error("Received zero-length response after retry")]
    EmptyBody,

    #[error("Invalid content type: {}", .0.as_deref().unwrap_or("none"))]
    InvalidContentType(Option<String>),

    #[error(transparent)]
    Transport(#[from] OriginError),
}

impl ServeError {
    pub fn upstream(status: StatusCode) -> Self {
        Self::UpstreamStatus {
            status,
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Decided from the origin status, never from the message text.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UpstreamStatus { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// The error followed by each of its sources.
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            report.push_str("\n  caused by: ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        match self {
            Self::MethodNotAllowed(_) => method_not_allowed(),
            ref e if e.is_not_found() => image_not_found(),
            e => image_loading_error(&e.to_string()),
        }
    }
}
