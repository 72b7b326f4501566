//! Error types for upstream (SBHS) calls.

use std::fmt;

/// Result type for upstream operations
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Where an upstream call failed.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "fetch_timetable", "refresh_token")
    pub operation: Option<String>,
    /// URL or path that was requested
    pub endpoint: Option<String>,
    /// Whether repeating the call might succeed
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref endpoint) = self.endpoint {
            parts.push(format!("endpoint={}", endpoint));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for upstream operations
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The access or refresh token was missing, expired or revoked.
    #[error("Unauthorized: {message} {context}")]
    Unauthorized {
        message: String,
        context: ErrorContext,
    },

    /// Upstream answered with a non-success status.
    #[error("Upstream returned HTTP {status}: {message} {context}")]
    Status {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    /// Network failure or timeout before a response arrived.
    #[error("Transport error: {message} {context}")]
    Transport {
        message: String,
        context: ErrorContext,
    },

    /// Response body did not have the expected shape.
    #[error("Decode error: {message} {context}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    /// Client could not be built from the given settings.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl UpstreamError {
    pub fn unauthorized(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Unauthorized {
            message: message.into(),
            context,
        }
    }

    /// Status error; 5xx responses are marked retryable.
    pub fn status(status: u16, message: impl Into<String>, context: ErrorContext) -> Self {
        let context = if status >= 500 { context.retryable() } else { context };
        Self::Status {
            status,
            message: message.into(),
            context,
        }
    }

    pub fn transport(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Transport {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn decode(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Decode {
            message: message.into(),
            context,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn is_retryable(&self) -> bool {
        self.context().is_some_and(|c| c.retryable)
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Unauthorized { context, .. }
            | Self::Status { context, .. }
            | Self::Transport { context, .. }
            | Self::Decode { context, .. } => Some(context),
            Self::Configuration(_) => None,
        }
    }
}
