//! Error types for model loading, tensor binding and preprocessing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the inference session and the feature preprocessor.
///
/// Every variant is a single-attempt failure: nothing is retried internally
/// and `run` never returns partial outputs.
#[derive(Error, Debug)]
pub enum InferError {
    /// The model artifact could not be read or is not a valid network.
    #[error("failed to load model from {path}: {message}")]
    Load {
        /// Path of the artifact that failed to load.
        path: PathBuf,
        /// What went wrong.
        message: String,
        /// Underlying runtime error, when there is one.
        #[source]
        source: Option<ort::Error>,
    },

    /// An output name that the model does not declare.
    #[error("output name {name} is not declared by the model")]
    UnknownOutput {
        /// The requested output name.
        name: String,
    },

    /// A declared model input had no matching tensor request.
    #[error("input {name} is not provided")]
    MissingInput {
        /// The declared input that was not bound.
        name: String,
    },

    /// A flat buffer disagrees with the product of its resolved shape.
    #[error("input array {name} has a wrong size of {actual}, expected {expected}")]
    ShapeMismatch {
        /// Input name.
        name: String,
        /// Element count implied by the resolved shape.
        expected: usize,
        /// Element count of the supplied buffer.
        actual: usize,
    },

    /// A resolved shape still contains a dynamic dimension.
    #[error("input {name} has unresolved dimensions {shape:?}; pass an explicit shape")]
    UnresolvedDimension {
        /// Input name.
        name: String,
        /// The shape that could not be resolved.
        shape: Vec<i64>,
    },

    /// The element count of a resolved shape does not fit in memory sizes.
    #[error("input {name} has shape {shape:?} whose element count overflows")]
    ShapeOverflow {
        /// Input name.
        name: String,
        /// The offending shape.
        shape: Vec<i64>,
    },

    /// More than one tensor request carries the same input name.
    #[error("input {name} is provided more than once")]
    DuplicateInput {
        /// The repeated input name.
        name: String,
    },

    /// A channel refers to a feature name the preprocessor does not produce.
    #[error("feature {name} is not produced by the preprocessor")]
    UndeclaredFeature {
        /// The unknown feature name.
        name: String,
    },

    /// The preprocessing layout cannot be packed.
    #[error("invalid preprocessing layout: {0}")]
    InvalidLayout(String),

    /// Batch size must be positive.
    #[error("batch size must be positive")]
    InvalidBatchSize,

    /// The process-wide runtime environment failed to initialize.
    #[error("onnx runtime environment: {0}")]
    Environment(String),

    /// Error raised by ONNX Runtime while binding or running.
    #[error(transparent)]
    Runtime(#[from] ort::Error),
}

impl InferError {
    /// Creates a load error wrapping a runtime failure.
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>, source: Option<ort::Error>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
            source,
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, InferError>;
