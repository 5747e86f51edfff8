//! Error taxonomy for the viewer host and viewpoint sync.
//!
//! ERROR HANDLING
//! ==============
//! Load and mount failures are terminal for the host instance that produced
//! them and are always returned to the caller. Publish failures are logged
//! and swallowed by [`crate::sync::publish_logged`]; callers that need the
//! outcome call the publisher directly. Nothing here retries on its own;
//! `retryable()` only tells a caller whether retrying could help.

use crate::host::HostPhase;
use crate::mount::MountRegion;

/// Grepable error code and retryable flag for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Errors produced by viewer lifecycle, capture, transport and publish operations.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The viewer capability could not be resolved or constructed.
    #[error("viewer load failed: {0}")]
    Load(String),

    /// A mount point is missing, detached, or duplicated.
    #[error("invalid mount point {region}: {reason}")]
    Mount { region: MountRegion, reason: String },

    /// `create` was called without any project reference.
    #[error("no project reference supplied")]
    NoProject,

    /// The operation needs a ready viewer and `create` has not completed.
    #[error("viewer not initialized")]
    NotInitialized,

    /// `create` was called while a viewer is loading or ready.
    #[error("viewer already active (phase: {phase})")]
    AlreadyActive { phase: HostPhase },

    /// The host previously failed to load; build a fresh host instead.
    #[error("viewer host failed earlier; create a new host")]
    Failed,

    /// The host was destroyed; no further operations are accepted.
    #[error("viewer host destroyed")]
    Destroyed,

    /// `destroy` was called on an already destroyed host.
    #[error("viewer host already destroyed")]
    AlreadyDestroyed,

    /// The embedded widget rejected a command.
    #[error("viewer command failed: {0}")]
    Widget(String),

    /// The viewpoint could not be serialized for the wire.
    #[error("viewpoint serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The HTTP request to the BCF endpoint failed before a response arrived.
    #[error("viewpoint publish request failed: {0}")]
    Publish(String),

    /// The BCF endpoint answered with a non-success status.
    #[error("viewpoint publish rejected: status {status}")]
    PublishRejected { status: u16, body: String },

    /// The model transport request failed before a response arrived.
    #[error("model transport request failed: {0}")]
    Transport(String),

    /// The model server answered with a non-success status.
    #[error("model transport error: status {status} for {url}")]
    TransportRejected { status: u16, url: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ViewerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Load(_) => "E_VIEWER_LOAD",
            Self::Mount { .. } => "E_VIEWER_MOUNT",
            Self::NoProject => "E_VIEWER_NO_PROJECT",
            Self::NotInitialized => "E_VIEWER_NOT_INITIALIZED",
            Self::AlreadyActive { .. } => "E_VIEWER_ALREADY_ACTIVE",
            Self::Failed => "E_VIEWER_FAILED",
            Self::Destroyed => "E_VIEWER_DESTROYED",
            Self::AlreadyDestroyed => "E_VIEWER_ALREADY_DESTROYED",
            Self::Widget(_) => "E_VIEWER_WIDGET",
            Self::Serialize(_) => "E_VIEWPOINT_SERIALIZE",
            Self::Publish(_) => "E_VIEWPOINT_PUBLISH",
            Self::PublishRejected { .. } => "E_VIEWPOINT_PUBLISH_REJECTED",
            Self::Transport(_) => "E_MODEL_TRANSPORT",
            Self::TransportRejected { .. } => "E_MODEL_TRANSPORT_REJECTED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Publish(_)
                | Self::Transport(_)
                | Self::PublishRejected { status: 429 | 500..=599, .. }
                | Self::TransportRejected { status: 429 | 500..=599, .. }
        )
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
