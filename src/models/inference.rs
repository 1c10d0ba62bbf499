//! Jet tagging inference engine
//!
//! Binds the preprocessor's packed tensors to the model inputs by name and
//! returns the raw output vector for one jet at a time.

use crate::config::AppConfig;
use crate::error::{InferError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::ModelLoader;
use crate::models::session::{ModelSession, TensorRequest};
use crate::types::particle::{JetScalars, ParticleRecord};
use tracing::{debug, info, warn};

/// Preprocessor plus model session for single-jet inference.
///
/// Each call rebuilds the packed tensors in place; the engine is meant to be
/// driven from one thread at a time.
pub struct InferenceEngine {
    session: ModelSession,
    extractor: FeatureExtractor,
    output_name: String,
    debug: bool,
}

impl InferenceEngine {
    /// Create a new inference engine from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.model.onnx_threads)?;
        let session = loader.load(&config.model.path)?;
        let extractor = FeatureExtractor::new(
            config.preprocessing.inputs.clone(),
            config.preprocessing.slot_length,
        )?
        .with_debug(config.pipeline.debug);

        let engine = Self::from_parts(session, extractor, config.model.output_name.as_deref())?;
        Ok(engine.with_debug(config.pipeline.debug))
    }

    /// Assemble an engine from an already loaded session.
    ///
    /// `output_name` defaults to the first declared output.
    pub fn from_parts(
        session: ModelSession,
        extractor: FeatureExtractor,
        output_name: Option<&str>,
    ) -> Result<Self> {
        let output_name = match output_name {
            Some(name) => {
                session.output_shape(name)?;
                name.to_string()
            }
            None => session
                .output_names()
                .first()
                .map(|name| name.to_string())
                .ok_or_else(|| InferError::UnknownOutput {
                    name: String::new(),
                })?,
        };

        for input in session.inputs() {
            match extractor.inputs().iter().position(|spec| spec.name == input.name) {
                Some(i) => {
                    let packed = extractor.tensors()[i].shape;
                    if input.shape.len() != packed.len()
                        || input.shape.iter().zip(packed).skip(1).any(|(&d, p)| d >= 0 && d != p)
                    {
                        warn!(
                            input = %input.name,
                            declared = ?input.shape,
                            packed = ?packed,
                            "Packed tensor shape differs from the model declaration"
                        );
                    }
                }
                None => warn!(input = %input.name, "Model input has no preprocessing layout"),
            }
        }

        info!(
            inputs = ?session.input_names(),
            output = %output_name,
            slot_length = extractor.slot_length(),
            "Inference engine initialized"
        );

        Ok(Self {
            session,
            extractor,
            output_name,
            debug: false,
        })
    }

    /// Log every raw output vector at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn session(&self) -> &ModelSession {
        &self.session
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Name of the output returned by [`infer`](Self::infer).
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Length of the vector returned by [`infer`](Self::infer) for batch size 1.
    pub fn output_len(&self) -> Option<usize> {
        self.session
            .outputs()
            .iter()
            .find(|d| d.name == self.output_name)
            .and_then(|d| d.elements_per_batch())
    }

    /// Preprocess one jet, run the model with batch size 1 and return the
    /// selected output unmodified.
    pub fn infer(&mut self, particles: &[ParticleRecord], jet: &JetScalars) -> Result<Vec<f32>> {
        let tensors = self.extractor.process(particles, jet);

        let requests: Vec<TensorRequest<'_>> = tensors
            .iter()
            .map(|t| TensorRequest::new(&t.name, &t.data).with_shape(&t.shape))
            .collect();

        let output = self
            .session
            .run(&requests, &[self.output_name.as_str()], 1)?
            .into_iter()
            .next()
            .ok_or_else(|| InferError::UnknownOutput {
                name: self.output_name.clone(),
            })?;

        if self.debug {
            debug!(output = %self.output_name, len = output.len(), values = ?output, "model output");
        } else {
            debug!(particles = particles.len(), output_len = output.len(), "jet inferred");
        }

        Ok(output)
    }
}
