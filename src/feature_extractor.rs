//! Feature preprocessing for the particle transformer jet tagger.
//!
//! Derived per-particle features are computed into an enum-indexed
//! [`FeatureMap`] and then packed, channel by channel, into fixed
//! `(1, C, L)` tensors with per-channel normalization and clipping.
//! Particles beyond `L` are ignored; unused slots stay at zero.

use crate::error::{InferError, Result};
use crate::types::particle::{JetScalars, ParticleRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Scale applied to momentum components relative to the jet pt.
pub const MOMENTUM_SCALE: f32 = 500.0;

/// Default number of particle slots per tensor.
pub const DEFAULT_SLOT_LENGTH: usize = 128;

/// Clip bound used for channels that are passed through unchanged.
const PASS: f32 = 1e8;

/// Every per-particle feature the preprocessor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Feature {
    Deta,
    Dphi,
    Charge,
    D0Err,
    DzErr,
    PxScale,
    PyScale,
    PzScale,
    EnergyScale,
    Pt,
    PtScale,
    PtScaleLog,
    EScaleLog,
    LogPtRel,
    LogERel,
    DeltaR,
    D0,
    Dz,
    IsElectron,
    IsMuon,
    IsPhoton,
    IsChargedHadron,
    IsNeutralHadron,
    Mask,
}

impl Feature {
    pub const COUNT: usize = 24;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::Deta,
        Feature::Dphi,
        Feature::Charge,
        Feature::D0Err,
        Feature::DzErr,
        Feature::PxScale,
        Feature::PyScale,
        Feature::PzScale,
        Feature::EnergyScale,
        Feature::Pt,
        Feature::PtScale,
        Feature::PtScaleLog,
        Feature::EScaleLog,
        Feature::LogPtRel,
        Feature::LogERel,
        Feature::DeltaR,
        Feature::D0,
        Feature::Dz,
        Feature::IsElectron,
        Feature::IsMuon,
        Feature::IsPhoton,
        Feature::IsChargedHadron,
        Feature::IsNeutralHadron,
        Feature::Mask,
    ];

    /// Name used by the model's training configuration.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Deta => "part_deta",
            Feature::Dphi => "part_dphi",
            Feature::Charge => "part_charge",
            Feature::D0Err => "part_d0err",
            Feature::DzErr => "part_dzerr",
            Feature::PxScale => "part_px_scale",
            Feature::PyScale => "part_py_scale",
            Feature::PzScale => "part_pz_scale",
            Feature::EnergyScale => "part_energy_scale",
            Feature::Pt => "part_pt",
            Feature::PtScale => "part_pt_scale",
            Feature::PtScaleLog => "part_pt_scale_log",
            Feature::EScaleLog => "part_e_scale_log",
            Feature::LogPtRel => "part_logptrel",
            Feature::LogERel => "part_logerel",
            Feature::DeltaR => "part_deltaR",
            Feature::D0 => "part_d0",
            Feature::Dz => "part_dz",
            Feature::IsElectron => "part_isElectron",
            Feature::IsMuon => "part_isMuon",
            Feature::IsPhoton => "part_isPhoton",
            Feature::IsChargedHadron => "part_isChargedHadron",
            Feature::IsNeutralHadron => "part_isNeutralHadron",
            Feature::Mask => "part_mask",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = InferError;

    fn from_str(s: &str) -> Result<Self> {
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| InferError::UndeclaredFeature { name: s.to_string() })
    }
}

impl TryFrom<String> for Feature {
    type Error = InferError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Serialize for Feature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Derived features for every selected particle of one jet.
///
/// Column `f` holds one value per particle; index `i` refers to the same
/// particle in every column.
#[derive(Debug, Clone)]
pub struct FeatureMap {
    columns: [Vec<f32>; Feature::COUNT],
}

impl FeatureMap {
    pub fn new() -> Self {
        Self {
            columns: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn clear(&mut self) {
        self.columns.iter_mut().for_each(Vec::clear);
    }

    pub fn column(&self, feature: Feature) -> &[f32] {
        &self.columns[feature.index()]
    }

    /// Number of particles held.
    pub fn len(&self) -> usize {
        self.column(Feature::Mask).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, feature: Feature, value: f32) {
        self.columns[feature.index()].push(value);
    }
}

impl Default for FeatureMap {
    fn default() -> Self {
        Self::new()
    }
}

fn flag(condition: bool) -> f32 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Rebuilds `features` from the caller-ordered `particles` of one jet.
///
/// The identity flags are computed in a fixed order: electron, muon and
/// photon first, then the hadron flags, which are defined in terms of them.
pub fn derive_features(particles: &[ParticleRecord], jet: &JetScalars, features: &mut FeatureMap) {
    features.clear();

    for p in particles {
        let px_scale = p.px / jet.pt * MOMENTUM_SCALE;
        let py_scale = p.py / jet.pt * MOMENTUM_SCALE;
        let pz_scale = p.pz / jet.pt * MOMENTUM_SCALE;
        let energy_scale = p.energy / jet.pt * MOMENTUM_SCALE;
        let pt = p.px.hypot(p.py);
        let pt_scale = px_scale.hypot(py_scale);

        let is_electron = p.pid == 11 || p.pid == -11;
        let is_muon = p.pid == 13 || p.pid == -13;
        let is_photon = p.pid == 22;
        let is_charged_hadron = p.charge != 0.0 && !is_electron && !is_muon;
        let is_neutral_hadron = p.charge == 0.0 && !is_photon;

        features.push(Feature::Deta, p.deta);
        features.push(Feature::Dphi, p.dphi);
        features.push(Feature::Charge, p.charge);
        features.push(Feature::D0Err, p.d0err);
        features.push(Feature::DzErr, p.dzerr);
        features.push(Feature::PxScale, px_scale);
        features.push(Feature::PyScale, py_scale);
        features.push(Feature::PzScale, pz_scale);
        features.push(Feature::EnergyScale, energy_scale);
        features.push(Feature::Pt, pt);
        features.push(Feature::PtScale, pt_scale);
        features.push(Feature::PtScaleLog, pt_scale.ln());
        features.push(Feature::EScaleLog, energy_scale.ln());
        features.push(Feature::LogPtRel, (pt / jet.pt).ln());
        features.push(Feature::LogERel, (p.energy / jet.energy).ln());
        features.push(Feature::DeltaR, p.deta.hypot(p.dphi));
        features.push(Feature::D0, p.d0.tanh());
        features.push(Feature::Dz, p.dz.tanh());
        features.push(Feature::IsElectron, flag(is_electron));
        features.push(Feature::IsMuon, flag(is_muon));
        features.push(Feature::IsPhoton, flag(is_photon));
        features.push(Feature::IsChargedHadron, flag(is_charged_hadron));
        features.push(Feature::IsNeutralHadron, flag(is_neutral_hadron));
        features.push(Feature::Mask, 1.0);
    }
}

/// Normalization rule and position of one tensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub feature: Feature,
    pub subtract: f32,
    pub multiply: f32,
    pub clip_min: f32,
    pub clip_max: f32,
}

impl ChannelSpec {
    pub const fn new(feature: Feature, subtract: f32, multiply: f32, clip_min: f32, clip_max: f32) -> Self {
        Self {
            feature,
            subtract,
            multiply,
            clip_min,
            clip_max,
        }
    }

    /// A channel that copies the feature through unchanged.
    pub const fn pass(feature: Feature) -> Self {
        Self::new(feature, 0.0, 1.0, -PASS, PASS)
    }

    /// `clamp((value - subtract) * multiply, clip_min, clip_max)`.
    ///
    /// A NaN result packs as zero clamped into the range.
    pub fn transform(&self, value: f32) -> f32 {
        let v = (value - self.subtract) * self.multiply;
        let v = if v.is_nan() { 0.0 } else { v };
        v.clamp(self.clip_min, self.clip_max)
    }

    fn validate(&self) -> Result<()> {
        if self.clip_min.is_nan() || self.clip_max.is_nan() || self.clip_min > self.clip_max {
            return Err(InferError::InvalidLayout(format!(
                "channel {} has invalid clip range [{}, {}]",
                self.feature, self.clip_min, self.clip_max
            )));
        }
        Ok(())
    }
}

/// One network input: its name and ordered channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub channels: Vec<ChannelSpec>,
}

/// A packed `(1, C, L)` tensor ready to bind to a network input.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedTensor {
    pub name: String,
    pub shape: [i64; 3],
    pub data: Vec<f32>,
}

impl PackedTensor {
    fn zeros(name: &str, channels: usize, slot_length: usize) -> Self {
        Self {
            name: name.to_string(),
            shape: [1, channels as i64, slot_length as i64],
            data: vec![0.0; channels * slot_length],
        }
    }

    /// Slot values of channel `c`.
    pub fn row(&self, c: usize) -> &[f32] {
        let l = self.shape[2] as usize;
        &self.data[c * l..(c + 1) * l]
    }
}

/// Fills `tensor` from `features` following `spec`.
///
/// The tensor is zeroed first; each channel receives
/// `min(L, particle count)` transformed values. Fails with
/// [`InferError::InvalidLayout`] when the tensor does not have one row per
/// channel of `spec`.
pub fn pack_tensor(spec: &InputSpec, features: &FeatureMap, tensor: &mut PackedTensor) -> Result<()> {
    let [_, channels, slot_length] = tensor.shape;
    let rows_match = usize::try_from(channels).is_ok_and(|c| c == spec.channels.len());
    let size_matches = channels
        .checked_mul(slot_length)
        .and_then(|n| usize::try_from(n).ok())
        .is_some_and(|n| n == tensor.data.len());
    if !rows_match || !size_matches {
        return Err(InferError::InvalidLayout(format!(
            "input {} has {} channels but tensor {} has shape {:?} and {} values",
            spec.name,
            spec.channels.len(),
            tensor.name,
            tensor.shape,
            tensor.data.len()
        )));
    }

    fill_rows(spec, features, tensor);
    Ok(())
}

fn fill_rows(spec: &InputSpec, features: &FeatureMap, tensor: &mut PackedTensor) {
    tensor.data.fill(0.0);
    let slot_length = tensor.shape[2] as usize;

    for (c, channel) in spec.channels.iter().enumerate() {
        let values = features.column(channel.feature);
        let row = &mut tensor.data[c * slot_length..(c + 1) * slot_length];
        for (slot, &value) in row.iter_mut().zip(values) {
            *slot = channel.transform(value);
        }
    }
}

/// Input layout of the particle transformer model: 17 particle features,
/// 4 scaled momentum components and the padding mask.
pub fn particle_transformer_inputs() -> Vec<InputSpec> {
    vec![
        InputSpec {
            name: "pf_features".to_string(),
            channels: vec![
                ChannelSpec::new(Feature::PtScaleLog, 1.7, 0.7, -5.0, 5.0),
                ChannelSpec::new(Feature::EScaleLog, 2.0, 0.7, -5.0, 5.0),
                ChannelSpec::new(Feature::LogPtRel, -4.7, 0.7, -5.0, 5.0),
                ChannelSpec::new(Feature::LogERel, -4.7, 0.7, -5.0, 5.0),
                ChannelSpec::new(Feature::DeltaR, 0.2, 4.0, -5.0, 5.0),
                ChannelSpec::pass(Feature::Charge),
                ChannelSpec::pass(Feature::IsChargedHadron),
                ChannelSpec::pass(Feature::IsNeutralHadron),
                ChannelSpec::pass(Feature::IsPhoton),
                ChannelSpec::pass(Feature::IsElectron),
                ChannelSpec::pass(Feature::IsMuon),
                ChannelSpec::pass(Feature::D0),
                ChannelSpec::new(Feature::D0Err, 0.0, 1.0, 0.0, 1.0),
                ChannelSpec::pass(Feature::Dz),
                ChannelSpec::new(Feature::DzErr, 0.0, 1.0, 0.0, 1.0),
                ChannelSpec::pass(Feature::Deta),
                ChannelSpec::pass(Feature::Dphi),
            ],
        },
        InputSpec {
            name: "pf_vectors".to_string(),
            channels: vec![
                ChannelSpec::pass(Feature::PxScale),
                ChannelSpec::pass(Feature::PyScale),
                ChannelSpec::pass(Feature::PzScale),
                ChannelSpec::pass(Feature::EnergyScale),
            ],
        },
        InputSpec {
            name: "pf_mask".to_string(),
            channels: vec![ChannelSpec::pass(Feature::Mask)],
        },
    ]
}

/// Turns one jet's particles into the packed tensors the network expects.
///
/// Buffers are owned by the extractor and rebuilt in place on every call,
/// so an instance must not be shared across threads without locking.
pub struct FeatureExtractor {
    inputs: Vec<InputSpec>,
    slot_length: usize,
    features: FeatureMap,
    tensors: Vec<PackedTensor>,
    debug: bool,
}

impl FeatureExtractor {
    /// Create an extractor for the given input layout.
    pub fn new(inputs: Vec<InputSpec>, slot_length: usize) -> Result<Self> {
        if inputs.is_empty() {
            return Err(InferError::InvalidLayout("at least one input is required".to_string()));
        }
        if slot_length == 0 {
            return Err(InferError::InvalidLayout("slot length must be positive".to_string()));
        }
        for input in &inputs {
            if input.channels.is_empty() {
                return Err(InferError::InvalidLayout(format!("input {} has no channels", input.name)));
            }
            input.channels.iter().try_for_each(ChannelSpec::validate)?;
        }

        Ok(Self::with_layout(inputs, slot_length))
    }

    /// Extractor for the particle transformer layout with 128 slots.
    pub fn particle_transformer() -> Self {
        Self::with_layout(particle_transformer_inputs(), DEFAULT_SLOT_LENGTH)
    }

    fn with_layout(inputs: Vec<InputSpec>, slot_length: usize) -> Self {
        let tensors = inputs
            .iter()
            .map(|input| PackedTensor::zeros(&input.name, input.channels.len(), slot_length))
            .collect();

        Self {
            inputs,
            slot_length,
            features: FeatureMap::new(),
            tensors,
            debug: false,
        }
    }

    /// Dump every packed channel row at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Derive features and pack every tensor for one jet.
    pub fn process(&mut self, particles: &[ParticleRecord], jet: &JetScalars) -> &[PackedTensor] {
        derive_features(particles, jet, &mut self.features);

        // Tensors are allocated from `inputs` at construction, so rows always match.
        for (spec, tensor) in self.inputs.iter().zip(self.tensors.iter_mut()) {
            fill_rows(spec, &self.features, tensor);
        }

        if self.debug {
            self.dump();
        }

        &self.tensors
    }

    fn dump(&self) {
        for (spec, tensor) in self.inputs.iter().zip(&self.tensors) {
            for (c, channel) in spec.channels.iter().enumerate() {
                debug!(input = %spec.name, feature = %channel.feature, values = ?tensor.row(c), "packed channel");
            }
        }
    }

    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    pub fn slot_length(&self) -> usize {
        self.slot_length
    }

    /// Features derived by the most recent call to [`process`](Self::process).
    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    /// Tensors packed by the most recent call to [`process`](Self::process).
    pub fn tensors(&self) -> &[PackedTensor] {
        &self.tensors
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::particle_transformer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(px: f32, py: f32, pz: f32, charge: f32, pid: i32) -> ParticleRecord {
        let pt = px.hypot(py);
        ParticleRecord {
            px,
            py,
            pz,
            energy: (px * px + py * py + pz * pz).sqrt(),
            pt,
            deta: 0.1,
            dphi: -0.2,
            charge,
            pid,
            d0: 0.5,
            d0err: 2.0,
            dz: -0.3,
            dzerr: 0.05,
        }
    }

    fn jet() -> JetScalars {
        JetScalars {
            pt: 500.0,
            energy: 800.0,
            ..Default::default()
        }
    }

    fn particles(n: usize) -> Vec<ParticleRecord> {
        (0..n)
            .map(|i| particle(10.0 + i as f32, 5.0, 20.0, 0.0, 130))
            .collect()
    }

    #[test]
    fn test_feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>().unwrap(), feature);
        }
        assert_eq!(Feature::ALL.len(), Feature::COUNT);
        assert!(Feature::ALL.iter().enumerate().all(|(i, f)| f.index() == i));
    }

    #[test]
    fn test_unknown_feature_name() {
        match "part_bogus".parse::<Feature>() {
            Err(InferError::UndeclaredFeature { name }) => assert_eq!(name, "part_bogus"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_derived_kinematics() {
        let mut features = FeatureMap::new();
        derive_features(&[particle(30.0, 40.0, 0.0, 1.0, 211)], &jet(), &mut features);

        assert_eq!(features.len(), 1);
        assert_eq!(features.column(Feature::Pt)[0], 50.0);
        assert!((features.column(Feature::PxScale)[0] - 30.0).abs() < 1e-4);
        assert!((features.column(Feature::PyScale)[0] - 40.0).abs() < 1e-4);
        assert!((features.column(Feature::PtScale)[0] - 50.0).abs() < 1e-4);
        assert!((features.column(Feature::PtScaleLog)[0] - 50.0f32.ln()).abs() < 1e-5);
        assert!((features.column(Feature::LogPtRel)[0] - 0.1f32.ln()).abs() < 1e-6);
        assert!((features.column(Feature::LogERel)[0] - (50.0f32 / 800.0).ln()).abs() < 1e-6);
        assert!((features.column(Feature::DeltaR)[0] - 0.1f32.hypot(0.2)).abs() < 1e-6);
        assert!((features.column(Feature::D0)[0] - 0.5f32.tanh()).abs() < 1e-6);
        assert!((features.column(Feature::Dz)[0] - (-0.3f32).tanh()).abs() < 1e-6);
        assert_eq!(features.column(Feature::Mask)[0], 1.0);
    }

    #[test]
    fn test_identity_flags_are_exclusive() {
        let cases = [
            (particle(1.0, 1.0, 1.0, -1.0, 11), Feature::IsElectron),
            (particle(1.0, 1.0, 1.0, 1.0, -13), Feature::IsMuon),
            (particle(1.0, 1.0, 1.0, 0.0, 22), Feature::IsPhoton),
            (particle(1.0, 1.0, 1.0, 1.0, 211), Feature::IsChargedHadron),
            (particle(1.0, 1.0, 1.0, 0.0, 130), Feature::IsNeutralHadron),
        ];
        let flags = [
            Feature::IsElectron,
            Feature::IsMuon,
            Feature::IsPhoton,
            Feature::IsChargedHadron,
            Feature::IsNeutralHadron,
        ];

        for (p, expected) in cases {
            let mut features = FeatureMap::new();
            derive_features(&[p], &jet(), &mut features);
            for f in flags {
                let want = if f == expected { 1.0 } else { 0.0 };
                assert_eq!(features.column(f)[0], want, "{f} for pid {}", p.pid);
            }
        }
    }

    #[test]
    fn test_derive_clears_previous_jet() {
        let mut features = FeatureMap::new();
        derive_features(&particles(5), &jet(), &mut features);
        derive_features(&particles(2), &jet(), &mut features);
        assert!(Feature::ALL.iter().all(|&f| features.column(f).len() == 2));
    }

    #[test]
    fn test_padding_law() {
        let mut extractor = FeatureExtractor::particle_transformer();
        let tensors = extractor.process(&particles(3), &jet());

        for tensor in tensors {
            for c in 0..tensor.shape[1] as usize {
                assert!(tensor.row(c)[3..].iter().all(|&v| v == 0.0));
            }
        }
        let mask = &tensors[2];
        assert_eq!(mask.shape, [1, 1, 128]);
        assert_eq!(&mask.row(0)[..3], &[1.0, 1.0, 1.0]);
        assert_eq!(mask.row(0).iter().filter(|&&v| v == 1.0).count(), 3);
    }

    #[test]
    fn test_truncation_law() {
        let mut extractor = FeatureExtractor::particle_transformer();
        let first = extractor.process(&particles(128), &jet()).to_vec();
        let longer = extractor.process(&particles(200), &jet()).to_vec();
        assert_eq!(first, longer);
    }

    #[test]
    fn test_clip_law_with_extreme_inputs() {
        let extreme = [
            particle(1e30, -1e30, 1e30, 1.0, 211),
            particle(0.0, 0.0, 0.0, 0.0, 22),
            particle(-1e-30, 1e-30, -1e-30, -1.0, 11),
            ParticleRecord {
                d0: f32::MAX,
                d0err: -f32::MAX,
                dz: f32::MIN,
                dzerr: f32::MAX,
                deta: f32::MAX,
                dphi: f32::MIN,
                ..particle(1.0, 1.0, 1.0, 1.0, 13)
            },
        ];

        let mut extractor = FeatureExtractor::particle_transformer();
        let specs = extractor.inputs().to_vec();
        let tensors = extractor.process(&extreme, &jet());

        for (spec, tensor) in specs.iter().zip(tensors) {
            for (c, channel) in spec.channels.iter().enumerate() {
                for &v in tensor.row(c) {
                    assert!(
                        v >= channel.clip_min && v <= channel.clip_max,
                        "{} value {v} escapes [{}, {}]",
                        channel.feature,
                        channel.clip_min,
                        channel.clip_max
                    );
                }
            }
        }
    }

    #[test]
    fn test_identity_channel_copies_raw_sequence() {
        let inputs = vec![InputSpec {
            name: "raw".to_string(),
            channels: vec![
                ChannelSpec::new(Feature::Deta, 0.0, 1.0, f32::NEG_INFINITY, f32::INFINITY),
                ChannelSpec::new(Feature::PxScale, 0.0, 1.0, f32::NEG_INFINITY, f32::INFINITY),
            ],
        }];
        let slot_length = 4;
        let mut particles = particles(slot_length);
        for (i, p) in particles.iter_mut().enumerate() {
            p.deta = i as f32 * 0.25 - 0.4;
        }

        let mut extractor = FeatureExtractor::new(inputs, slot_length).unwrap();
        let tensors = extractor.process(&particles, &jet()).to_vec();

        assert_eq!(tensors[0].row(0), extractor.features().column(Feature::Deta));
        assert_eq!(tensors[0].row(1), extractor.features().column(Feature::PxScale));
    }

    #[test]
    fn test_channel_order_follows_spec() {
        let inputs = vec![InputSpec {
            name: "ordered".to_string(),
            channels: vec![ChannelSpec::pass(Feature::Mask), ChannelSpec::pass(Feature::Charge)],
        }];
        let mut extractor = FeatureExtractor::new(inputs, 2).unwrap();
        let tensors = extractor.process(&[particle(1.0, 1.0, 1.0, -1.0, 211)], &jet());
        assert_eq!(tensors[0].data, vec![1.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_pack_rejects_tensor_with_too_few_rows() {
        let spec = InputSpec {
            name: "pf_vectors".to_string(),
            channels: vec![ChannelSpec::pass(Feature::PxScale), ChannelSpec::pass(Feature::PyScale)],
        };
        let mut features = FeatureMap::new();
        derive_features(&[particle(1.0, 1.0, 1.0, 0.0, 130)], &jet(), &mut features);

        let mut tensor = PackedTensor::zeros("pf_vectors", 1, 4);
        assert!(matches!(
            pack_tensor(&spec, &features, &mut tensor),
            Err(InferError::InvalidLayout(_))
        ));

        tensor.shape = [1, 2, 4];
        assert!(matches!(
            pack_tensor(&spec, &features, &mut tensor),
            Err(InferError::InvalidLayout(_))
        ));

        let mut tensor = PackedTensor::zeros("pf_vectors", 2, 4);
        pack_tensor(&spec, &features, &mut tensor).unwrap();
        assert_eq!(tensor.row(0)[0], features.column(Feature::PxScale)[0]);
        assert!(tensor.row(1)[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalization() {
        let channel = ChannelSpec::new(Feature::DeltaR, 0.2, 4.0, -5.0, 5.0);
        assert!((channel.transform(0.45) - 1.0).abs() < 1e-6);
        assert_eq!(channel.transform(10.0), 5.0);
        assert_eq!(channel.transform(f32::NEG_INFINITY), -5.0);
        assert_eq!(channel.transform(f32::NAN), 0.0);
    }

    #[test]
    fn test_invalid_layouts_rejected() {
        assert!(FeatureExtractor::new(Vec::new(), 128).is_err());
        assert!(FeatureExtractor::new(particle_transformer_inputs(), 0).is_err());

        let inverted = vec![InputSpec {
            name: "bad".to_string(),
            channels: vec![ChannelSpec::new(Feature::Mask, 0.0, 1.0, 1.0, -1.0)],
        }];
        assert!(FeatureExtractor::new(inverted, 8).is_err());
    }

    #[test]
    fn test_default_layout_shapes() {
        let extractor = FeatureExtractor::default();
        let shapes: Vec<[i64; 3]> = extractor.tensors().iter().map(|t| t.shape).collect();
        assert_eq!(shapes, vec![[1, 17, 128], [1, 4, 128], [1, 1, 128]]);
    }
}
