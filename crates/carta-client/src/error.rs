use std::time::Duration;

use thiserror::Error;

/// Errors returned by the storefront API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    Status {
        status: u16,
        url: String,
        /// Message extracted from a JSON error body, when the server sent one.
        message: Option<String>,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A single-record endpoint answered 2xx with no body (or JSON `null`).
    #[error("empty response body for {context}")]
    EmptyBody { context: String },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

impl ClientError {
    /// The server-provided error message, if the failure carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Coarse classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Server,
    Decode,
    Timeout,
}

/// Why a resource is in the failed state.
///
/// Listing pages only need [`crate::ResourceState::is_error`]; the kind and
/// message are there for callers that want to say more than "retrying".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: Option<String>,
}

impl FetchFailure {
    #[must_use]
    pub fn timed_out(after: Duration) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: Some(format!("no response after {} ms", after.as_millis())),
        }
    }
}

impl From<&ClientError> for FetchFailure {
    fn from(err: &ClientError) -> Self {
        let kind = match err {
            ClientError::Http(e) if e.is_timeout() => FailureKind::Timeout,
            ClientError::Http(e) if e.is_decode() => FailureKind::Decode,
            ClientError::Http(_) | ClientError::InvalidBaseUrl { .. } => FailureKind::Network,
            ClientError::Status { .. } => FailureKind::Server,
            ClientError::Deserialize { .. } | ClientError::EmptyBody { .. } => FailureKind::Decode,
            ClientError::Timeout { .. } => FailureKind::Timeout,
        };
        let message = err
            .server_message()
            .map_or_else(|| err.to_string(), str::to_owned);
        Self {
            kind,
            message: Some(message),
        }
    }
}

/// Why an add-to-cart attempt was rejected.
///
/// The `Display` text is what the shopper sees in the cart notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddError {
    #[error("please choose a size before adding this product")]
    SizeRequired,

    #[error("this product is currently unavailable")]
    Unavailable,

    #[error("{0}")]
    VerificationFailed(String),

    /// An add for the same product is still being verified.
    #[error("this product is already being added to the cart")]
    AlreadyPending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_surfaces_server_message() {
        let err = ClientError::Status {
            status: 409,
            url: "http://api.test/categorias/1/productos/2".to_owned(),
            message: Some("Producto agotado".to_owned()),
        };
        let failure = FetchFailure::from(&err);
        assert_eq!(failure.kind, FailureKind::Server);
        assert_eq!(failure.message.as_deref(), Some("Producto agotado"));
    }

    #[test]
    fn decode_errors_classify_as_decode() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ClientError::Deserialize {
            context: "GET /productos".to_owned(),
            source,
        };
        assert_eq!(FetchFailure::from(&err).kind, FailureKind::Decode);
        assert_eq!(
            FetchFailure::from(&ClientError::EmptyBody {
                context: "x".to_owned()
            })
            .kind,
            FailureKind::Decode
        );
    }

    #[test]
    fn timeout_failure_mentions_duration() {
        let failure = FetchFailure::timed_out(Duration::from_millis(1500));
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.message.as_deref(), Some("no response after 1500 ms"));
    }
}
