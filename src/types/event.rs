//! Event, jet and constituent records read from the event source
//!
//! Constituent selection lives here, on the caller side of the
//! preprocessor: the preprocessor itself never filters or reorders.

use crate::types::particle::{JetScalars, ParticleRecord};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One collision event with its reconstructed jets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: u64,

    /// z position of the primary vertex, when reconstructed
    #[serde(default)]
    pub primary_vertex_z: Option<f32>,

    /// Jets in the configured jet collection
    #[serde(default)]
    pub jets: Vec<Jet>,
}

/// A reconstructed jet and its constituents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jet {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub mass: f64,
    pub energy: f64,

    #[serde(default)]
    pub sdmass: f64,
    #[serde(default)]
    pub trmass: f64,
    #[serde(default)]
    pub tau: [f64; 4],

    #[serde(default)]
    pub constituents: Vec<Constituent>,
}

/// A jet constituent as stored by the event source
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Constituent {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    #[serde(default)]
    pub mass: f64,
    #[serde(default)]
    pub charge: i32,
    #[serde(default)]
    pub pid: i32,
    #[serde(default)]
    pub d0: f32,
    #[serde(default)]
    pub d0err: f32,
    #[serde(default)]
    pub dz: f32,
    #[serde(default)]
    pub dzerr: f32,
}

/// Cartesian four-momentum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourMomentum {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub energy: f64,
}

/// Constituent quality cuts applied before preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCuts {
    /// Reject constituents with |pz| above this value
    pub max_abs_pz: f64,
    /// Reject constituents with |eta| above this value
    pub max_abs_eta: f64,
    /// Reject constituents with pt at or below this value
    pub min_pt: f64,
}

impl Default for SelectionCuts {
    fn default() -> Self {
        Self {
            max_abs_pz: 10000.0,
            max_abs_eta: 5.0,
            min_pt: 0.0,
        }
    }
}

impl SelectionCuts {
    /// Whether a constituent passes the kinematic sanity cuts
    pub fn accepts(&self, constituent: &Constituent) -> bool {
        let p4 = constituent.four_momentum();
        p4.pz.abs() <= self.max_abs_pz
            && constituent.eta.abs() <= self.max_abs_eta
            && constituent.pt > self.min_pt
    }
}

/// Azimuthal difference wrapped to [-pi, pi)
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let dphi = phi1 - phi2;
    (dphi + PI).rem_euclid(2.0 * PI) - PI
}

impl Constituent {
    /// Four-momentum from (pt, eta, phi, mass)
    pub fn four_momentum(&self) -> FourMomentum {
        let px = self.pt * self.phi.cos();
        let py = self.pt * self.phi.sin();
        let pz = self.pt * self.eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        let energy = (p2 + self.mass * self.mass).sqrt();
        FourMomentum { px, py, pz, energy }
    }
}

impl Jet {
    /// Sign applied to constituent delta-eta so that it points away from
    /// the beam axis on both detector halves
    pub fn eta_sign(&self) -> f64 {
        if self.eta > 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Applies the selection cuts, orders by descending pt and expresses
    /// each surviving constituent relative to this jet.
    pub fn select_particles(
        &self,
        cuts: &SelectionCuts,
        primary_vertex_z: Option<f32>,
    ) -> Vec<ParticleRecord> {
        let mut selected: Vec<&Constituent> = self
            .constituents
            .iter()
            .filter(|c| cuts.accepts(c))
            .collect();

        selected.sort_by(|a, b| b.pt.total_cmp(&a.pt));

        let eta_sign = self.eta_sign();
        selected
            .into_iter()
            .map(|c| {
                let p4 = c.four_momentum();
                let dz = match primary_vertex_z {
                    Some(pv_z) if c.dz != 0.0 => c.dz - pv_z,
                    _ => c.dz,
                };
                ParticleRecord {
                    px: p4.px as f32,
                    py: p4.py as f32,
                    pz: p4.pz as f32,
                    energy: p4.energy as f32,
                    pt: c.pt as f32,
                    deta: (eta_sign * (c.eta - self.eta)) as f32,
                    dphi: delta_phi(c.phi, self.phi) as f32,
                    charge: c.charge as f32,
                    pid: c.pid,
                    d0: c.d0,
                    d0err: c.d0err,
                    dz,
                    dzerr: c.dzerr,
                }
            })
            .collect()
    }

    /// Summary scalars handed to the preprocessor alongside the particles
    pub fn scalars(&self) -> JetScalars {
        JetScalars {
            pt: self.pt as f32,
            energy: self.energy as f32,
            eta: self.eta as f32,
            phi: self.phi as f32,
            sdmass: self.sdmass as f32,
            trmass: self.trmass as f32,
            tau: self.tau.map(|t| t as f32),
        }
    }
}
