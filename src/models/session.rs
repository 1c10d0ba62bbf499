//! Name- and shape-aware wrapper around an ONNX Runtime session.
//!
//! A [`ModelSession`] records every declared input and output of the network
//! at load time and binds caller-supplied flat `f32` buffers to them by name.

use crate::error::{InferError, Result};
use ort::session::{Session, SessionInputValue};
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Leading-dimension sentinel meaning "batch size, resolved per call".
pub const BATCH_DIM: i64 = -1;

/// Name and shape template of one network input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDescriptor {
    pub name: String,
    pub shape: Vec<i64>,
}

impl TensorDescriptor {
    /// Number of elements per batch entry, or `None` if a non-batch
    /// dimension is dynamic.
    pub fn elements_per_batch(&self) -> Option<usize> {
        self.shape
            .iter()
            .skip(1)
            .map(|&d| usize::try_from(d).ok())
            .product()
    }
}

/// One flat input buffer submitted to [`ModelSession::run`].
#[derive(Debug, Clone, Copy)]
pub struct TensorRequest<'a> {
    pub name: &'a str,
    pub data: &'a [f32],
    /// Explicit shape; when absent the descriptor template is used with the
    /// leading dimension set to the batch size.
    pub shape: Option<&'a [i64]>,
}

impl<'a> TensorRequest<'a> {
    pub fn new(name: &'a str, data: &'a [f32]) -> Self {
        Self {
            name,
            data,
            shape: None,
        }
    }

    pub fn with_shape(mut self, shape: &'a [i64]) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// A request matched to its descriptor with a fully resolved shape.
#[derive(Debug)]
struct BoundInput<'a> {
    name: &'a str,
    shape: Vec<i64>,
    data: &'a [f32],
}

/// A loaded network plus its declared inputs and outputs.
///
/// Descriptors are fixed at load time. Output templates always carry
/// [`BATCH_DIM`] in the leading position.
pub struct ModelSession {
    session: Session,
    path: PathBuf,
    inputs: Vec<TensorDescriptor>,
    outputs: Vec<TensorDescriptor>,
}

impl ModelSession {
    /// Wraps a committed session, introspecting its inputs and outputs.
    pub(crate) fn from_session(session: Session, path: &Path) -> Result<Self> {
        let inputs = session
            .inputs
            .iter()
            .map(|input| descriptor_from_value_type(path, &input.name, &input.input_type))
            .collect::<Result<Vec<_>>>()?;

        let outputs = session
            .outputs
            .iter()
            .map(|output| {
                let mut descriptor =
                    descriptor_from_value_type(path, &output.name, &output.output_type)?;
                // Batch size is decided per call, whatever the artifact says.
                if let Some(first) = descriptor.shape.first_mut() {
                    *first = BATCH_DIM;
                }
                Ok(descriptor)
            })
            .collect::<Result<Vec<_>>>()?;

        if outputs.is_empty() {
            return Err(InferError::load(path, "model declares no outputs", None));
        }

        Ok(Self {
            session,
            path: path.to_path_buf(),
            inputs,
            outputs,
        })
    }

    /// Path the model was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared inputs, in registration order.
    pub fn inputs(&self) -> &[TensorDescriptor] {
        &self.inputs
    }

    /// Declared outputs, in registration order.
    pub fn outputs(&self) -> &[TensorDescriptor] {
        &self.outputs
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|d| d.name.as_str()).collect()
    }

    /// Shape template of a declared output; the leading dimension is
    /// always [`BATCH_DIM`].
    pub fn output_shape(&self, name: &str) -> Result<&[i64]> {
        self.outputs
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.shape.as_slice())
            .ok_or_else(|| InferError::UnknownOutput {
                name: name.to_string(),
            })
    }

    /// Runs the network once.
    ///
    /// Every declared input must be matched by name in `requests`; the order
    /// of `requests` does not matter. Returns one freshly allocated buffer
    /// per requested output, in request order. An empty `output_names`
    /// selects every declared output in registration order.
    pub fn run(
        &mut self,
        requests: &[TensorRequest<'_>],
        output_names: &[&str],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>> {
        let bound = bind_inputs(&self.inputs, requests, batch_size)?;
        let selected = select_outputs(&self.outputs, output_names)?;

        let mut ort_inputs = Vec::with_capacity(bound.len());
        for input in bound {
            let value = Tensor::from_array((input.shape, input.data.to_vec()))?.into_dyn();
            ort_inputs.push((input.name.to_string(), SessionInputValue::from(value)));
        }

        let outputs = self.session.run(ort_inputs)?;

        let mut results = Vec::with_capacity(selected.len());
        for name in selected {
            let value = outputs.get(name).ok_or_else(|| InferError::UnknownOutput {
                name: name.to_string(),
            })?;
            let (_, data) = value.try_extract_tensor::<f32>()?;
            debug!(output = %name, len = data.len(), "extracted model output");
            results.push(data.to_vec());
        }

        Ok(results)
    }
}

fn descriptor_from_value_type(
    path: &Path,
    name: &str,
    value_type: &ValueType,
) -> Result<TensorDescriptor> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        return Err(InferError::load(
            path,
            format!("{name} is not a tensor"),
            None,
        ));
    };
    if *ty != TensorElementType::Float32 {
        return Err(InferError::load(
            path,
            format!("{name} has element type {ty}, expected f32"),
            None,
        ));
    }

    Ok(TensorDescriptor {
        name: name.to_string(),
        shape: shape.iter().copied().collect(),
    })
}

/// Matches requests to descriptors by name and resolves their shapes.
fn bind_inputs<'a>(
    descriptors: &[TensorDescriptor],
    requests: &[TensorRequest<'a>],
    batch_size: usize,
) -> Result<Vec<BoundInput<'a>>> {
    if batch_size == 0 {
        return Err(InferError::InvalidBatchSize);
    }

    descriptors
        .iter()
        .map(|descriptor| {
            let mut matching = requests.iter().filter(|r| r.name == descriptor.name);
            let request = matching.next().ok_or_else(|| InferError::MissingInput {
                name: descriptor.name.clone(),
            })?;
            if matching.next().is_some() {
                return Err(InferError::DuplicateInput {
                    name: descriptor.name.clone(),
                });
            }

            let shape = resolve_shape(descriptor, request, batch_size);
            let expected = element_count(&descriptor.name, &shape)?;
            if expected != request.data.len() {
                return Err(InferError::ShapeMismatch {
                    name: descriptor.name.clone(),
                    expected,
                    actual: request.data.len(),
                });
            }

            Ok(BoundInput {
                name: request.name,
                shape,
                data: request.data,
            })
        })
        .collect()
}

fn resolve_shape(descriptor: &TensorDescriptor, request: &TensorRequest<'_>, batch_size: usize) -> Vec<i64> {
    match request.shape {
        Some(shape) => shape.to_vec(),
        None => {
            let mut shape = descriptor.shape.clone();
            if let Some(first) = shape.first_mut() {
                *first = batch_size as i64;
            }
            shape
        }
    }
}

fn element_count(name: &str, shape: &[i64]) -> Result<usize> {
    shape.iter().try_fold(1usize, |acc, &d| {
        let d = usize::try_from(d).map_err(|_| InferError::UnresolvedDimension {
            name: name.to_string(),
            shape: shape.to_vec(),
        })?;
        acc.checked_mul(d).ok_or_else(|| InferError::ShapeOverflow {
            name: name.to_string(),
            shape: shape.to_vec(),
        })
    })
}

fn select_outputs<'a>(declared: &'a [TensorDescriptor], requested: &[&'a str]) -> Result<Vec<&'a str>> {
    if requested.is_empty() {
        return Ok(declared.iter().map(|d| d.name.as_str()).collect());
    }

    requested
        .iter()
        .map(|&name| {
            if declared.iter().any(|d| d.name == name) {
                Ok(name)
            } else {
                Err(InferError::UnknownOutput {
                    name: name.to_string(),
                })
            }
        })
        .collect()
}
