//! Synthetic Event Generator
//!
//! Writes random jet events in the JSON-lines format read by `jet-tagger`,
//! for smoke-testing the pipeline without a detector simulation.

use jet_tagger::types::{Constituent, Event, Jet};
use rand::Rng;
use std::f64::consts::PI;
use std::io::{BufWriter, Write};
use tracing::info;

/// Event generator for testing
struct EventGenerator {
    rng: rand::rngs::ThreadRng,
    event_counter: u64,
}

impl EventGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            event_counter: 0,
        }
    }

    fn generate_event(&mut self) -> Event {
        self.event_counter += 1;
        let num_jets = self.rng.gen_range(1..=3);
        let jets = (0..num_jets).map(|_| self.generate_jet()).collect();

        Event {
            id: self.event_counter,
            primary_vertex_z: Some(self.rng.gen_range(-5.0..5.0)),
            jets,
        }
    }

    /// A boosted jet whose constituents share its momentum unevenly
    fn generate_jet(&mut self) -> Jet {
        let pt: f64 = self.rng.gen_range(300.0..1200.0);
        let eta: f64 = self.rng.gen_range(-2.4..2.4);
        let phi: f64 = self.rng.gen_range(-PI..PI);
        let mass: f64 = self.rng.gen_range(20.0..200.0);
        let energy = ((pt * eta.cosh()).powi(2) + mass * mass).sqrt();

        let num_constituents = self.rng.gen_range(10..180);
        let mut constituents = Vec::with_capacity(num_constituents);
        let mut remaining = pt;
        for _ in 0..num_constituents {
            let share: f64 = self.rng.gen_range(0.01..0.2);
            let c_pt = (remaining * share).max(0.5);
            remaining -= c_pt * 0.5;
            constituents.push(self.generate_constituent(c_pt, eta, phi));
        }

        Jet {
            pt,
            eta,
            phi,
            mass,
            energy,
            sdmass: mass * self.rng.gen_range(0.7..1.0),
            trmass: mass * self.rng.gen_range(0.8..1.0),
            tau: [
                self.rng.gen_range(0.2..0.6),
                self.rng.gen_range(0.1..0.4),
                self.rng.gen_range(0.05..0.3),
                self.rng.gen_range(0.02..0.2),
            ],
            constituents,
        }
    }

    fn generate_constituent(&mut self, pt: f64, jet_eta: f64, jet_phi: f64) -> Constituent {
        let (charge, pid) = match self.rng.gen_range(0..10) {
            0 => (-1, 11),
            1 => (1, -13),
            2..=4 => (0, 22),
            5..=7 => (if self.rng.gen_bool(0.5) { 1 } else { -1 }, 211),
            _ => (0, 130),
        };
        let charged = charge != 0;

        Constituent {
            pt,
            eta: jet_eta + self.rng.gen_range(-0.8..0.8),
            phi: jet_phi + self.rng.gen_range(-0.8..0.8),
            mass: if pid == 211 { 0.1396 } else { 0.0 },
            charge,
            pid,
            d0: if charged { self.rng.gen_range(-0.5..0.5) } else { 0.0 },
            d0err: if charged { self.rng.gen_range(0.001..0.1) } else { 0.0 },
            dz: if charged { self.rng.gen_range(-5.0..5.0) } else { 0.0 },
            dzerr: if charged { self.rng.gen_range(0.001..0.1) } else { 0.0 },
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_events=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("events.jsonl");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(output = %output, count = count, "Generating synthetic events");

    let file = std::fs::File::create(output)?;
    let mut writer = BufWriter::new(file);
    let mut generator = EventGenerator::new();

    for i in 0..count {
        let event = generator.generate_event();
        serde_json::to_writer(&mut writer, &event)?;
        writer.write_all(b"\n")?;

        if (i + 1) % 100 == 0 {
            info!("Generated {}/{} events", i + 1, count);
        }
    }
    writer.flush()?;

    info!("Completed! Wrote {} events to {}", count, output);
    Ok(())
}
