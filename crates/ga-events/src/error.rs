//! Error types for the analytics broadcaster.

/// Boxed error returned by an event's customization hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while building or delivering a hit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The collection endpoint answered with a non-success status.
    #[error("Collection endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// An event's customization hook refused to build the call.
    #[error("Customization hook for {event} failed: {source}")]
    Hook {
        event: String,
        #[source]
        source: HookError,
    },

    /// The job queue has been shut down.
    #[error("Job queue has been shutdown")]
    Shutdown,
}
