//! Error taxonomy for catalog extraction.
//!
//! [`GatewayError`] classifies a single HTTP exchange; [`ExtractError`]
//! classifies pipeline outcomes, and its helpers tell the orchestrator
//! whether a failure aborts the run, skips the leaf, or only warns.

use std::io;

/// Failure of one HTTP exchange with the service.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Connection-level failure before a response was read.
    #[error("transport failure for {url}: {message}")]
    Transport {
        url: String,
        message: String,
        connection_reset: bool,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Body was not the JSON we asked for.
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    /// HTTP success carrying a server-reported `error` object.
    #[error("service error {code} from {url}: {message}")]
    Service {
        url: String,
        code: i64,
        message: String,
    },
}

impl GatewayError {
    /// The forcibly-closed-connection case gets an extra backoff wait.
    pub fn is_connection_reset(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                connection_reset: true,
                ..
            }
        )
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::Decode { url, .. }
            | Self::Service { url, .. } => url,
        }
    }
}

/// A classified extraction failure.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Unreachable or malformed catalog metadata. Aborts the run.
    #[error("catalog resolution failed at {endpoint}: {reason}")]
    Catalog { endpoint: String, reason: String },

    /// The credential provider could not mint a token. Aborts the run.
    #[error("token acquisition failed: {0}")]
    Auth(String),

    /// The layer does not advertise JSON query output. Skips the leaf.
    #[error("{endpoint} does not advertise JSON query support")]
    Capability { endpoint: String },

    /// A row query failed permanently. Fails the leaf, run continues.
    #[error("query failed after {attempts} attempt(s) against {url}: {reason}")]
    Fetch {
        url: String,
        attempts: u32,
        reason: String,
    },

    /// Merged row count disagrees with the discovered identifier count.
    /// Reported as a warning; partial artifacts are retained.
    #[error("{artifact}: merged {actual} rows, expected {expected}")]
    ReconciliationMismatch {
        artifact: String,
        expected: u64,
        actual: u64,
    },

    /// Artifact storage failed. Fails the leaf, run continues.
    #[error("artifact {name}: {source}")]
    Artifact {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    pub fn catalog(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Catalog {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch(url: impl Into<String>, attempts: u32, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            attempts,
            reason: reason.into(),
        }
    }

    pub fn artifact(name: impl Into<String>, source: io::Error) -> Self {
        Self::Artifact {
            name: name.into(),
            source,
        }
    }

    /// Whether this failure aborts the whole run.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::Catalog { .. } | Self::Auth(_))
    }

    /// Whether this failure only skips the current leaf.
    pub fn skips_leaf(&self) -> bool {
        matches!(self, Self::Capability { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_reset_classification() {
        let reset = GatewayError::Transport {
            url: "https://host/q".into(),
            message: "connection reset by peer".into(),
            connection_reset: true,
        };
        assert!(reset.is_connection_reset());

        let timeout = GatewayError::Transport {
            url: "https://host/q".into(),
            message: "operation timed out".into(),
            connection_reset: false,
        };
        assert!(!timeout.is_connection_reset());
        assert!(!GatewayError::Status {
            url: "https://host/q".into(),
            status: 503
        }
        .is_connection_reset());
    }

    #[test]
    fn catalog_and_auth_are_run_fatal() {
        assert!(ExtractError::catalog("https://host/rest", "HTTP 404").is_run_fatal());
        assert!(ExtractError::Auth("bad credentials".into()).is_run_fatal());
        assert!(!ExtractError::fetch("https://host/q", 5, "timeout").is_run_fatal());
    }

    #[test]
    fn capability_skips_leaf_only() {
        let err = ExtractError::Capability {
            endpoint: "https://host/rest/Roads/MapServer/0".into(),
        };
        assert!(err.skips_leaf());
        assert!(!err.is_run_fatal());
        assert!(!ExtractError::fetch("u", 1, "r").skips_leaf());
    }

    #[test]
    fn mismatch_message_carries_both_counts() {
        let err = ExtractError::ReconciliationMismatch {
            artifact: "roads".into(),
            expected: 25_000,
            actual: 24_990,
        };
        let text = err.to_string();
        assert!(text.contains("25000"));
        assert!(text.contains("24990"));
    }
}
