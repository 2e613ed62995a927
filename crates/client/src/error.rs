//! Error types for taruvi-client.

/// Result type alias for taruvi-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for taruvi-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Structured detail attached by the server or the transport
    /// (failing path/method, server-side validation errors, raw body).
    pub details: Option<serde_json::Value>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            source: None,
            details: None,
        }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            details: None,
        }
    }

    /// Attach structured detail (path, method, server error payload).
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Returns true if this error is retryable by the transport layer.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns the HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        self.kind.status()
    }

    /// Returns true if this is an authentication failure (rejected credentials).
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    /// Returns true if the client never configured a credential and the
    /// server demanded one.
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self.kind, ErrorKind::NotAuthenticated(_))
    }
}

/// The kind of error that occurred.
///
/// API errors map one-to-one onto HTTP status classes and are never retried.
/// Transport errors (`Timeout`, `Connection`) are retried up to the
/// configured bound before being surfaced.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Missing or invalid SDK configuration; surfaced at construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller-side misuse of an SDK method (conflicting parameters,
    /// unknown token type, missing app slug).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request validation failed (HTTP 400).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credentials were rejected (HTTP 401 with a credential configured).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// A 401 was received while no credential was configured at all.
    /// Signals "you never signed in" rather than "your credentials are wrong".
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// Permission denied (HTTP 403).
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource conflict (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Internal server error (HTTP 500).
    #[error("Server error: {0}")]
    Server(String),

    /// Service temporarily unavailable (HTTP 503).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other HTTP error status without a dedicated kind.
    #[error("API error: {status} {message}")]
    Api { status: u16, message: String },

    /// Request timed out after all retries.
    #[error("Request timed out: {method} {path}")]
    Timeout { method: String, path: String },

    /// Connection to the server failed after all retries.
    #[error("Connection failed: {method} {path}")]
    Connection { method: String, path: String },

    /// Unexpected transport-level failure; not retried.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body was not valid JSON. Carries the status and the first
    /// ~500 characters of the raw body for diagnosis; never retried.
    #[error("Failed to parse response body: status {status}")]
    Response { status: u16, body: String },
}

impl ErrorKind {
    /// Returns true if this error kind is retryable.
    ///
    /// Exactly two failure classes are retried: per-attempt timeouts and
    /// connection failures. API errors are never retried, not even 429/503.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout { .. } | ErrorKind::Connection { .. }
        )
    }

    /// Returns the HTTP status this kind corresponds to, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorKind::Validation(_) => Some(400),
            ErrorKind::Authentication(_) | ErrorKind::NotAuthenticated(_) => Some(401),
            ErrorKind::Authorization(_) => Some(403),
            ErrorKind::NotFound(_) => Some(404),
            ErrorKind::Conflict(_) => Some(409),
            ErrorKind::RateLimit(_) => Some(429),
            ErrorKind::Server(_) => Some(500),
            ErrorKind::ServiceUnavailable(_) => Some(503),
            ErrorKind::Api { status, .. } | ErrorKind::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Map an HTTP error status onto the matching error kind.
///
/// Statuses without a dedicated kind fall back to [`ErrorKind::Api`].
pub fn error_from_status(
    status: u16,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> Error {
    let message = message.into();
    let kind = match status {
        400 => ErrorKind::Validation(message),
        401 => ErrorKind::Authentication(message),
        403 => ErrorKind::Authorization(message),
        404 => ErrorKind::NotFound(message),
        409 => ErrorKind::Conflict(message),
        429 => ErrorKind::RateLimit(message),
        500 => ErrorKind::Server(message),
        503 => ErrorKind::ServiceUnavailable(message),
        _ => ErrorKind::Api { status, message },
    };

    let mut error = Error::new(kind);
    if let Some(details) = details {
        error = error.with_details(details);
    }
    error
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(
            ErrorKind::Response {
                status: 0,
                body: err.to_string(),
            },
            err,
        )
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Configuration(format!("invalid URL: {}", err)), err)
    }
}
