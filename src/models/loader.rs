//! ONNX model loader

use crate::error::{InferError, Result};
use crate::models::environment;
use crate::models::session::ModelSession;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of intra-op threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        environment::ensure_initialized()?;
        let onnx_threads = onnx_threads.max(1);
        info!(onnx_threads = onnx_threads, "Model loader ready");
        Ok(Self { onnx_threads })
    }

    /// Number of intra-op threads used for each session
    pub fn onnx_threads(&self) -> usize {
        self.onnx_threads
    }

    /// Load a single ONNX model from file and introspect its inputs and outputs
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ModelSession> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        if !path.is_file() {
            return Err(InferError::load(path, "model file is not readable", None));
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(self.onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| InferError::load(path, "failed to create ONNX session", Some(e)))?;

        let model = ModelSession::from_session(session, path)?;

        for input in model.inputs() {
            info!(input = %input.name, shape = ?input.shape, "Model input");
        }
        for output in model.outputs() {
            info!(output = %output.name, shape = ?output.shape, "Model output");
        }
        info!(
            path = %path.display(),
            inputs = model.inputs().len(),
            outputs = model.outputs().len(),
            "Model loaded successfully"
        );

        Ok(model)
    }
}
