use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for configuration, login, API reads and persistence.
///
/// Variants carry enough context to be logged on their own. All variants are
/// serializable so they can be written next to the run artifacts.
///
/// # Fatal vs. downgraded
///
/// Everything raised before or during login, and by the resource walker,
/// aborts the run. During the appointment sweep the transient variants
/// ([`NetworkError`](Self::NetworkError), [`Timeout`](Self::Timeout),
/// [`UnexpectedStatus`](Self::UnexpectedStatus)) are downgraded to
/// "no appointment" for the affected site only.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ClientError {
    /// The configuration file could not be read or is not valid JSON.
    #[error("Failed to read configuration '{path}': {detail}")]
    ConfigRead {
        /// Path of the configuration source.
        path: String,
        /// Error details.
        detail: String,
    },

    /// The configuration document is neither an object nor an array.
    #[error("Unrecognized configuration shape: expected an object or an array, got {found}")]
    ConfigShape {
        /// JSON type that was found instead.
        found: String,
    },

    /// One entry of the configuration document is not a valid identity.
    #[error("Invalid identity at index {index}: {detail}")]
    InvalidIdentity {
        /// Position of the entry in the configuration sequence.
        index: usize,
        /// Error details.
        detail: String,
    },

    /// No identity is available to authenticate or rotate through.
    #[error("No identities configured")]
    NoIdentities,

    /// The login page did not contain the expected login form.
    #[error("[{username}] Login form not found: {detail}")]
    LoginParse {
        /// Identity whose login failed.
        username: String,
        /// Error details.
        detail: String,
    },

    /// The credential submission did not redirect with an authorization code.
    #[error("[{username}] Login redirect rejected: {detail}")]
    LoginRedirect {
        /// Identity whose login failed.
        username: String,
        /// Error details.
        detail: String,
    },

    /// An authorization header was requested before a usable token existed.
    #[error("No {field} available")]
    MissingToken {
        /// Token pair field that was read.
        field: String,
    },

    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    #[error("Network error: {detail}")]
    NetworkError {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    #[error("Request timeout: {detail}")]
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The API answered with a status the caller does not handle.
    #[error("Unexpected HTTP {status} from {url}")]
    UnexpectedStatus {
        /// Requested URL (without query string).
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A response or stored blob could not be deserialized.
    #[error("Parse error: {detail}")]
    ParseError {
        /// Details about the parse failure.
        detail: String,
    },

    /// A blob could not be written to or read from the store.
    #[error("Storage error for '{name}': {detail}")]
    StorageError {
        /// Blob name.
        name: String,
        /// Error details.
        detail: String,
    },
}

impl ClientError {
    /// Whether the error is a transient request failure.
    ///
    /// These are the failures the appointment sweep downgrades to a "no
    /// appointment" result without aborting the run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::UnexpectedStatus { .. }
        )
    }

    /// Whether the error is caused by user input or upstream state rather than a bug.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::ConfigRead { .. }
                | Self::ConfigShape { .. }
                | Self::InvalidIdentity { .. }
                | Self::NoIdentities
                | Self::LoginParse { .. }
                | Self::LoginRedirect { .. }
        ) || self.is_transient()
    }
}

/// Convenience type alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_config_shape() {
        let e = ClientError::ConfigShape {
            found: "string".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Unrecognized configuration shape: expected an object or an array, got string"
        );
    }

    #[test]
    fn display_login_parse() {
        let e = ClientError::LoginParse {
            username: "alice".to_string(),
            detail: "no element with id 'kc-form-login'".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[alice] Login form not found: no element with id 'kc-form-login'"
        );
    }

    #[test]
    fn display_missing_token() {
        let e = ClientError::MissingToken {
            field: "refresh_token".to_string(),
        };
        assert_eq!(e.to_string(), "No refresh_token available");
    }

    #[test]
    fn display_unexpected_status() {
        let e = ClientError::UnexpectedStatus {
            url: "https://impfzentren.bayern/api/v1/districts/".to_string(),
            status: 503,
        };
        assert_eq!(
            e.to_string(),
            "Unexpected HTTP 503 from https://impfzentren.bayern/api/v1/districts/"
        );
    }

    #[test]
    fn serialize_carries_code_tag() {
        let e = ClientError::LoginRedirect {
            username: "bob".to_string(),
            detail: "no code".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"LoginRedirect\""));
        assert!(json.contains("\"username\":\"bob\""));
    }

    #[test]
    fn transient_variants() {
        assert!(
            ClientError::NetworkError {
                detail: "refused".into()
            }
            .is_transient()
        );
        assert!(
            ClientError::Timeout {
                detail: "30s".into()
            }
            .is_transient()
        );
        assert!(
            ClientError::UnexpectedStatus {
                url: "u".into(),
                status: 500
            }
            .is_transient()
        );
        assert!(
            !ClientError::MissingToken {
                field: "refresh_token".into()
            }
            .is_transient()
        );
        assert!(
            !ClientError::ParseError {
                detail: "bad".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn expected_variants() {
        assert!(ClientError::NoIdentities.is_expected());
        assert!(
            ClientError::LoginParse {
                username: "u".into(),
                detail: "d".into()
            }
            .is_expected()
        );
        assert!(
            !ClientError::StorageError {
                name: "sites".into(),
                detail: "disk full".into()
            }
            .is_expected()
        );
    }
}
