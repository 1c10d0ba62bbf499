//! ONNX Runtime session handling and jet inference

pub mod environment;
pub mod inference;
pub mod loader;
pub mod session;

pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use session::{ModelSession, TensorDescriptor, TensorRequest, BATCH_DIM};
