use thiserror::Error;

/// Top-level error type for the `nebula-api` crate.
///
/// Every variant produced by a request carries the URL it was sent to, so a
/// failure surfaced at the end of a sync run still points at the appliance
/// that caused it.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, TLS, timeout).
    #[error("{url}: HTTP transport error: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // ── Protocol ────────────────────────────────────────────────────
    /// The appliance answered with a non-2xx status code.
    #[error("{url}: unexpected status code: {status}")]
    Status { url: String, status: u16 },

    /// Response body could not be decoded, with the raw body for debugging.
    #[error("{url}: deserialization error: {message}")]
    Deserialization {
        url: String,
        message: String,
        body: String,
    },

    /// Login request went through but the appliance reported the session invalid.
    #[error("{url}: authentication failed: {message}")]
    Authentication { url: String, message: String },

    // ── Session ─────────────────────────────────────────────────────
    /// Operation attempted without a valid session. No request was sent.
    #[error("{target}: invalid sid found")]
    NoSession { target: String },

    // ── Configuration ───────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client could not be built (bad TLS setup and similar).
    #[error("TLS error: {0}")]
    Tls(String),
}

/// Coarse error taxonomy used by the sync layer to decide on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, DNS or TLS failure while talking to the appliance.
    Transport,
    /// The appliance answered, but not with something usable.
    Protocol,
    /// No valid session was held when the operation was attempted.
    Session,
    /// Invalid local setup; retrying cannot help.
    Configuration,
}

impl Error {
    /// Which bucket of the taxonomy this error falls into.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Status { .. } | Self::Deserialization { .. } | Self::Authentication { .. } => {
                ErrorKind::Protocol
            }
            Self::NoSession { .. } => ErrorKind::Session,
            Self::InvalidUrl(_) | Self::Tls(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if this is an error worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Protocol)
    }

    /// HTTP status returned by the appliance, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
