//! Jet Tagger - Main Entry Point
//!
//! Reads events, selects each jet's constituents, runs the particle
//! transformer on every jet and writes one prediction record per event.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use jet_tagger::{
    config::{AppConfig, LoggingConfig},
    metrics::PipelineMetrics,
    models::InferenceEngine,
    sink::RecordWriter,
    source::EventReader,
    types::{Event, EventRecord, JetPrediction},
};
use std::io::Write;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        AppConfig::load_from_path(&cli.config)?
    } else {
        AppConfig::default()
    };
    apply_overrides(&mut config, &cli);

    init_logging(&config.logging)?;

    info!("Starting Jet Tagger");
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "Configuration file not found, using defaults");
    }

    let mut engine = InferenceEngine::new(&config).context("Failed to initialize inference engine")?;
    if let Some(len) = engine.output_len() {
        if len != config.output.len() {
            warn!(
                model_output = len,
                expected = config.output.len(),
                "Model output length differs from the configured class/embedding layout"
            );
        }
    }

    let events = EventReader::open(&cli.input)?;
    let mut writer = RecordWriter::create(&cli.output)?;
    let mut metrics = PipelineMetrics::new();

    info!(
        max_events = ?config.pipeline.max_events,
        slot_length = engine.extractor().slot_length(),
        "Processing events"
    );

    // The summary is printed even when a jet fails, so failures are counted.
    let result = process_events(&config, &mut engine, events, &mut writer, &mut metrics);
    metrics.print_summary();
    result?;

    writer.finish()?;

    Ok(())
}

fn process_events<I, W>(
    config: &AppConfig,
    engine: &mut InferenceEngine,
    events: I,
    writer: &mut RecordWriter<W>,
    metrics: &mut PipelineMetrics,
) -> Result<()>
where
    I: Iterator<Item = Result<Event>>,
    W: Write,
{
    let slot_length = engine.extractor().slot_length();

    for (entry, event) in events.enumerate() {
        if config
            .pipeline
            .max_events
            .is_some_and(|max| entry as u64 >= max)
        {
            break;
        }
        let event = event?;

        if entry % 100 == 0 {
            info!("processing {} events so far", entry);
        }

        let mut record = EventRecord::new(event.id);
        for jet in &event.jets {
            let particles = jet.select_particles(&config.selection, event.primary_vertex_z);
            let scalars = jet.scalars();

            let start = Instant::now();
            let output = match engine.infer(&particles, &scalars) {
                Ok(output) => output,
                Err(e) => {
                    metrics.record_failure();
                    error!(event_id = event.id, jet_pt = scalars.pt, error = %e, "Inference failed");
                    return Err(e).context(format!("Inference failed for event {}", event.id));
                }
            };
            metrics.record_jet(start.elapsed(), particles.len(), slot_length);

            let Some(prediction) =
                JetPrediction::from_output(scalars.pt, particles.len(), &output, &config.output)
            else {
                error!(
                    event_id = event.id,
                    len = output.len(),
                    expected = config.output.len(),
                    "Model output shorter than the configured layout"
                );
                anyhow::bail!("model output has {} values, expected {}", output.len(), config.output.len());
            };
            record.jets.push(prediction);
        }

        writer.write(&record)?;
        metrics.record_event();
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.model.path = model.clone();
    }
    if let Some(max_events) = cli.max_events {
        config.pipeline.max_events = Some(max_events);
    }
    if let Some(threads) = cli.threads {
        config.model.onnx_threads = threads;
    }
    if cli.debug {
        config.pipeline.debug = true;
        config.logging.level = "debug".to_string();
    }
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("jet_tagger={}", logging.level).parse()?);

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}
