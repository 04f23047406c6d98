use std::sync::Arc;

use thiserror::Error;

use crate::models::FieldError;

/// Failures of the request contract, whichever backend serves it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Service responded with [{status}] for [{path}]: {body}")]
    Status {
        path: String,
        status: u16,
        body: String
    },
    #[error("Resource [{path}] was not found")]
    NotFound {
        path: String
    },
    #[error("Response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Service is unavailable: {0}")]
    Unavailable(String)
}

impl ApiError {
    pub fn status(path: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status { path: path.into(), status, body: body.into() }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Client-side rejections (4xx) will fail again unless the input changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Unavailable(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::NotFound { .. } | Self::Decode(_) | Self::InvalidUrl(_) => false
        }
    }
}

/// Errors surfaced at a controller boundary. None of them escape a controller;
/// they are turned into a notice for the presentation layer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Reference data [{what}] is unavailable: {source}")]
    ReferenceUnavailable {
        what: String,
        #[source]
        source: Arc<ApiError>
    },
    #[error("Form is invalid: {}", summarize(.0))]
    ValidationRejected(Vec<FieldError>),
    #[error("Write [{action}] was rejected: {source}")]
    WriteRejected {
        action: String,
        #[source]
        source: ApiError
    },
    #[error("Read [{what}] failed: {source}")]
    ReadFailed {
        what: String,
        #[source]
        source: ApiError
    },
    #[error("Pagination link [{link}] is malformed")]
    MalformedPaginationLink {
        link: String
    }
}

impl ClientError {
    pub fn reference_unavailable(what: impl Into<String>, source: impl Into<Arc<ApiError>>) -> Self {
        Self::ReferenceUnavailable { what: what.into(), source: source.into() }
    }

    pub fn write_rejected(action: impl Into<String>, source: ApiError) -> Self {
        Self::WriteRejected { action: action.into(), source }
    }

    pub fn read_failed(what: impl Into<String>, source: ApiError) -> Self {
        Self::ReadFailed { what: what.into(), source }
    }

    pub fn malformed_link(link: impl Into<String>) -> Self {
        Self::MalformedPaginationLink { link: link.into() }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ReferenceUnavailable { source, .. } => source.is_retryable(),
            Self::WriteRejected { source, .. } | Self::ReadFailed { source, .. } => source.is_retryable(),
            Self::ValidationRejected(_) | Self::MalformedPaginationLink { .. } => false
        }
    }

    /// Text handed to `Renderer::notify`. Transport details stay in the log.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::ReferenceUnavailable { what, .. } => format!("Could not load {what}"),
            Self::ValidationRejected(errors) => format!("Please correct the form: {}", summarize(errors)),
            Self::WriteRejected { action, .. } => format!("Could not {action}"),
            Self::ReadFailed { what, .. } => format!("Could not load {what}"),
            Self::MalformedPaginationLink { .. } => "Pagination is unavailable, showing the first page".to_string()
        };

        if self.is_retryable() {
            format!("{message}. Please try again.")
        } else {
            message
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
