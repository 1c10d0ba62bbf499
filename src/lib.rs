//! Jet Tagger Library
//!
//! Particle-level feature preprocessing and ONNX Runtime inference for a
//! particle transformer jet tagger. Each jet's constituents are turned into
//! fixed-shape normalized tensors, bound to the network inputs by name, and
//! the raw output vector (class scores followed by an embedding) is returned.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod sink;
pub mod source;
pub mod types;

pub use config::AppConfig;
pub use error::InferError;
pub use feature_extractor::{ChannelSpec, Feature, FeatureExtractor, FeatureMap, InputSpec, PackedTensor};
pub use models::{InferenceEngine, ModelLoader, ModelSession, TensorRequest};
pub use sink::RecordWriter;
pub use source::EventReader;
pub use types::{Event, EventRecord, JetPrediction, JetScalars, ParticleRecord};
