use backend::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before any network call was made.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
