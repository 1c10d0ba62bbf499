//! Process-wide ONNX Runtime environment.
//!
//! The environment is committed once per process. Concurrent first callers
//! block on the same initialization and all of them observe its outcome.

use crate::error::{InferError, Result};
use std::sync::OnceLock;
use tracing::{error, info};

const ENVIRONMENT_NAME: &str = "jet-tagger";

static ENVIRONMENT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Commits the ONNX Runtime environment if it has not been committed yet.
pub fn ensure_initialized() -> Result<()> {
    ENVIRONMENT
        .get_or_init(|| match ort::init().with_name(ENVIRONMENT_NAME).commit() {
            Ok(_) => {
                info!(name = ENVIRONMENT_NAME, "ONNX Runtime environment initialized");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "ONNX Runtime environment initialization failed");
                Err(e.to_string())
            }
        })
        .clone()
        .map_err(InferError::Environment)
}

/// Whether the environment has been committed successfully.
pub fn is_initialized() -> bool {
    matches!(ENVIRONMENT.get(), Some(Ok(())))
}
