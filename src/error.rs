use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failure reported by a `RetrievalGateway` implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("navigation to page {0} failed")]
    Navigation(usize),

    #[error("results frame not available")]
    FrameUnavailable,

    #[error("detail fetch failed: {0}")]
    Detail(String),

    #[error("{0}")]
    Other(String),
}

/// Why a single document could not be turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    EmptyDocument,
    MissingBody,
    Gateway,
    /// The saved document could not be read.
    Unreadable,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            FailureReason::EmptyDocument => "empty_document",
            FailureReason::MissingBody => "missing_body",
            FailureReason::Gateway => "gateway",
            FailureReason::Unreadable => "unreadable",
        };
        f.write_str(code)
    }
}

/// Scoped to one document: the caller skips it and moves on.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{reason} for {url}: {detail}")]
pub struct ExtractionFailure {
    pub reason: FailureReason,
    pub url: String,
    pub detail: String,
}

impl ExtractionFailure {
    pub fn new(reason: FailureReason, url: &str, detail: impl Into<String>) -> Self {
        ExtractionFailure {
            reason,
            url: url.to_string(),
            detail: detail.into(),
        }
    }
}
