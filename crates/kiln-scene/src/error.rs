use thiserror::Error;

/// Errors produced by the scene core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// A transform index outside `[0, count)`. Callers holding cached indices
    /// (selection) must re-validate them.
    #[error("transform index {index} out of range (count {count})")]
    OutOfRange { index: usize, count: usize },

    /// Creating a device resource failed; the whole generation is discarded.
    #[error("failed to create {resource} for resource generation {generation}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        generation: u64,
        reason: String,
    },

    /// Backend failure outside resource creation (encoding, submission).
    #[error("gpu backend error: {0}")]
    Backend(String),
}

/// Result type alias using [`SceneError`].
pub type Result<T> = std::result::Result<T, SceneError>;
