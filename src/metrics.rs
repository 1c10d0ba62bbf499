//! Performance metrics and statistics tracking for the jet tagging pipeline.

use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for a pipeline run
pub struct PipelineMetrics {
    /// Events read from the source
    pub events_processed: u64,
    /// Jets passed through inference
    pub jets_processed: u64,
    /// Jets whose inference failed
    pub jets_failed: u64,
    /// Jets with more selected constituents than tensor slots
    pub jets_truncated: u64,
    /// Per-jet inference times (in microseconds)
    inference_times: Vec<u64>,
    /// Selected constituents per jet
    particle_counts: Vec<usize>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            events_processed: 0,
            jets_processed: 0,
            jets_failed: 0,
            jets_truncated: 0,
            inference_times: Vec::with_capacity(1000),
            particle_counts: Vec::with_capacity(1000),
            start_time: Instant::now(),
        }
    }

    pub fn record_event(&mut self) {
        self.events_processed += 1;
    }

    /// Record one inferred jet
    pub fn record_jet(&mut self, inference_time: Duration, particles: usize, slot_length: usize) {
        self.jets_processed += 1;
        if particles > slot_length {
            self.jets_truncated += 1;
        }

        self.inference_times.push(inference_time.as_micros() as u64);
        // Keep only last 10000 for memory efficiency
        if self.inference_times.len() > 10000 {
            self.inference_times.drain(0..5000);
        }

        self.particle_counts.push(particles);
        if self.particle_counts.len() > 10000 {
            self.particle_counts.drain(0..5000);
        }
    }

    pub fn record_failure(&mut self) {
        self.jets_failed += 1;
    }

    /// Get inference time statistics
    pub fn get_inference_stats(&self) -> InferenceStats {
        if self.inference_times.is_empty() {
            return InferenceStats::default();
        }

        let mut sorted = self.inference_times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        InferenceStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Mean number of selected constituents per jet
    pub fn mean_particles(&self) -> f64 {
        if self.particle_counts.is_empty() {
            return 0.0;
        }
        self.particle_counts.iter().sum::<usize>() as f64 / self.particle_counts.len() as f64
    }

    /// Get current throughput (jets per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.jets_processed as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let stats = self.get_inference_stats();

        info!("** Processed {} events **", self.events_processed);
        info!(
            jets = self.jets_processed,
            failed = self.jets_failed,
            truncated = self.jets_truncated,
            mean_particles = format!("{:.1}", self.mean_particles()),
            throughput = format!("{:.1} jets/s", self.get_throughput()),
            "Jet summary"
        );
        info!(
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            max_us = stats.max_us,
            "Inference time"
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference time statistics
#[derive(Debug, Default)]
pub struct InferenceStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}
