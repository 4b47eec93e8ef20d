//! Error types for brain construction and projection.
//!
//! All errors are deterministic consequences of caller-supplied names or
//! parameters; none are transient and there is no retry policy.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, BrainError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrainError {
    /// A stimulus name used in `project` does not exist in the brain.
    #[error("stimulus `{0}` does not exist in the brain")]
    UnknownStimulus(String),

    /// An area name used in `project` does not exist in the brain.
    #[error("area `{0}` does not exist in the brain")]
    UnknownArea(String),

    /// An area or output area of this name already exists.
    #[error("an area named `{0}` already exists")]
    DuplicateArea(String),

    /// A stimulus of this name already exists.
    #[error("a stimulus named `{0}` already exists")]
    DuplicateStimulus(String),

    /// `remove_output_area` was called for a name with no output area.
    #[error("output area `{0}` does not exist")]
    MissingOutputArea(String),

    /// A size or rate parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
