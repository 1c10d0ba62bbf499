//! Type definitions for the jet tagging pipeline

pub mod event;
pub mod particle;
pub mod record;

pub use event::{Constituent, Event, Jet, SelectionCuts};
pub use particle::{JetScalars, ParticleRecord};
pub use record::{EventRecord, JetPrediction, OutputLayout};
