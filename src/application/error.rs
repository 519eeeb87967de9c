use std::fmt;

use thiserror::Error;

use crate::{config::LoadError, infra::error::InfraError};

pub(crate) const NETWORK_ERROR_MESSAGE: &str = "Network Error";
pub(crate) const API_ERROR_MESSAGE: &str = "API Error";

/// Where a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No usable response: connection failure, timeout, unreadable or malformed body.
    Transport,
    /// The server answered with a 4xx/5xx status and no application error flag.
    Http,
    /// The response body carried `error: true`.
    Api,
    /// The request was rejected locally before any network call.
    InvalidInput,
}

impl ApiErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Http => "http",
            Self::Api => "api",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified failure value for every remote operation.
///
/// `status()` is `None` exactly when no HTTP response was obtained, which is
/// what callers key retry decisions on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: Option<u16>,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            message: message.into(),
            status: None,
        }
    }

    pub fn network() -> Self {
        Self::transport(NETWORK_ERROR_MESSAGE)
    }

    pub fn http(status: u16, reason: Option<&str>) -> Self {
        let reason = reason.unwrap_or("");
        Self {
            kind: ApiErrorKind::Http,
            message: format!("HTTP Error: {status} - {reason}"),
            status: Some(status),
        }
    }

    pub fn api(message: Option<String>, status: u16) -> Self {
        let message = message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| API_ERROR_MESSAGE.to_string());
        Self {
            kind: ApiErrorKind::Api,
            message,
            status: Some(status),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::InvalidInput,
            message: message.into(),
            status: None,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ApiErrorKind::Transport
    }

    /// The server reported that the requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Top-level error of the `compass` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("failed to render output: {0}")]
    Output(String),
}
