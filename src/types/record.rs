//! Output records handed to the sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Layout of the flat model output: class scores followed by the embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    /// Length of the class-probability segment
    pub num_classes: usize,
    /// Length of the embedding segment
    pub embedding_size: usize,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            num_classes: 188,
            embedding_size: 128,
        }
    }
}

impl OutputLayout {
    /// Total expected length of the flat output vector
    pub fn len(&self) -> usize {
        self.num_classes + self.embedding_size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prediction for one jet, split into its two output segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetPrediction {
    pub jet_pt: f32,
    /// Number of constituents handed to the preprocessor
    pub num_particles: usize,
    pub probs: Vec<f32>,
    pub hidden: Vec<f32>,
}

impl JetPrediction {
    /// Slices a flat output vector according to `layout`.
    ///
    /// Returns `None` when the vector is shorter than the layout requires.
    pub fn from_output(
        jet_pt: f32,
        num_particles: usize,
        output: &[f32],
        layout: &OutputLayout,
    ) -> Option<Self> {
        if output.len() < layout.len() {
            return None;
        }
        let (probs, rest) = output.split_at(layout.num_classes);
        Some(Self {
            jet_pt,
            num_particles,
            probs: probs.to_vec(),
            hidden: rest[..layout.embedding_size].to_vec(),
        })
    }
}

/// All jet predictions of one event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: u64,
    pub jets: Vec<JetPrediction>,
    pub processed_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(event_id: u64) -> Self {
        Self {
            event_id,
            jets: Vec::new(),
            processed_at: Utc::now(),
        }
    }
}
