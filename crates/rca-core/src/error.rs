/// HTTP status codes that the transport retries with backoff.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [408, 429, 502, 503, 504];

/// Failures raised by the question-answering API layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Must provide a valid value for the input parameter: {0}")]
    InvalidParameter(String),

    #[error("Must provide an input parameter: {0}")]
    MissingParameter(String),

    #[error("HTTP status {code}")]
    HttpStatus { code: u16 },

    #[error("Conversation error: {0}")]
    ConversationError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No API key configured (set RCA_API_KEY or service.api_key)")]
    MissingApiKey,

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
}

/// Flat discriminant of [`ApiError`] for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    RateLimited,
    InvalidParameter,
    MissingParameter,
    HttpStatus,
    ConversationError,
    Network,
    Decode,
    MissingApiKey,
    RetriesExhausted,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::Timeout,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::MissingParameter(_) => ErrorKind::MissingParameter,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::ConversationError(_) => ErrorKind::ConversationError,
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) => ErrorKind::Decode,
            Self::MissingApiKey => ErrorKind::MissingApiKey,
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
        }
    }

    /// Whether the transport should retry after this failure.
    ///
    /// Timeouts and rate limits always are; other statuses only when listed
    /// in [`RETRYABLE_STATUS_CODES`].
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited { .. } => true,
            Self::HttpStatus { code } => RETRYABLE_STATUS_CODES.contains(code),
            _ => false,
        }
    }
}
