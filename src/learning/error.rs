//! Error types for the learning framework.

use thiserror::Error;

use crate::error::BrainError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearningError {
    /// A set was built over a different domain than the model.
    #[error(
        "the domain size of {actual_object} must match the domain size of \
         {expected_object} ({expected} bits), but it is {actual}"
    )]
    DomainSizeMismatch {
        expected_object: String,
        actual_object: String,
        expected: usize,
        actual: usize,
    },

    /// The brain does not carry one stimulus pair per input bit.
    #[error("the brain must carry exactly {expected} stimuli for this domain, but carries {actual}")]
    StimuliMismatch { expected: usize, actual: usize },

    /// The architecture references a stimulus the brain does not have.
    #[error("stimulus `{0}` does not exist in the configured brain")]
    MissingStimulus(String),

    /// The architecture references an area the brain does not have.
    #[error("area `{0}` does not exist in the configured brain")]
    MissingArea(String),

    /// Accuracy is undefined over a test set with no data points.
    #[error("the test set contains no data points")]
    EmptyTestSet,

    #[error(transparent)]
    Brain(#[from] BrainError),

    #[error(transparent)]
    DataSet(#[from] DataSetError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSetError {
    /// Value tables describe a full boolean function, so their length must
    /// be a power of two.
    #[error("return values list must have a power-of-two length, got a list of length {0}")]
    BadLength(usize),

    /// A value table entry was neither 0 nor 1.
    #[error("value table entry at index {index} is {value}, which is not a boolean value")]
    NotBoolean { index: usize, value: u8 },

    /// The mask assigns no index to the training side of the domain.
    #[error("the mask selects no training indices in a domain of {domain_points} points")]
    EmptyTrainingSet { domain_points: u64 },
}
