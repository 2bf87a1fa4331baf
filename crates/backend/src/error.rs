use thiserror::Error;

/// Every failure the transport can produce. The transport never retries;
/// retry policy belongs to callers.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("invalid request URL: {0}")]
    BadUrl(String),

    #[error("failed to encode request body: {0}")]
    BadRequestBody(String),

    #[error("server error {code}: {message}")]
    Server { code: u16, message: String },

    #[error("unrecognized response format: {0}")]
    Decode(String),

    #[error("network error: {0}")]
    Transport(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
