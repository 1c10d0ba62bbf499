//! Per-particle and per-jet inputs consumed by the feature preprocessor

use serde::{Deserialize, Serialize};

/// One selected jet constituent, already ordered and filtered by the caller.
///
/// `deta` is signed by the jet eta sign convention and `dphi` is wrapped to
/// [-pi, pi); `dz` is relative to the primary vertex when one is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub energy: f32,
    pub pt: f32,
    pub deta: f32,
    pub dphi: f32,
    pub charge: f32,
    /// Particle identity code (PDG id)
    pub pid: i32,
    pub d0: f32,
    pub d0err: f32,
    pub dz: f32,
    pub dzerr: f32,
}

/// Summary scalars of the jet being classified.
///
/// Only `pt` and `energy` feed the preprocessor; the remaining values are
/// carried for the output records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JetScalars {
    pub pt: f32,
    pub energy: f32,
    pub eta: f32,
    pub phi: f32,
    /// Soft-drop mass
    pub sdmass: f32,
    /// Trimmed mass
    pub trmass: f32,
    /// N-subjettiness tau1..tau4
    pub tau: [f32; 4],
}
