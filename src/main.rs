use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use steptrace::profiler::{Tracer, TracerKind, TracerRegistry};
use steptrace::{FileWriter, TracerConfig};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const EPOCHS: usize = 3;
const STEPS_PER_EPOCH: usize = 8;
const LOADER_WORKERS: usize = 4;

/// Runs a short simulated training loop and writes one trace per epoch.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with the tracer settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory receiving traces and checkpoints.
    #[arg(long, default_value = "trace_out")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let Args { config, out_dir } = Args::parse();
    let config = match config {
        Some(path) => TracerConfig::from_json_file(&path)
            .with_context(|| format!("loading tracer config from {}", path.display()))?,
        None => TracerConfig::default(),
    };

    let registry = TracerRegistry::new(config);
    let tracer = registry.get_tracer(TracerKind::Chrome)?;
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let writer = FileWriter::new(&out_dir);

    tracing::info!("Tracing {} epochs into {}", EPOCHS, out_dir.display());

    let mut cadence = tokio::time::interval(Duration::from_millis(5));
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    for epoch in 0..EPOCHS {
        for step in 0..STEPS_PER_EPOCH {
            cadence.tick().await;
            let batch = load_batch(&tracer, step).await?;
            tracer
                .instrument("train_step", async {
                    tokio::time::sleep(Duration::from_micros(200 * batch.len() as u64)).await;
                })
                .await;
        }

        evaluate(&tracer).await?;

        let name = format!("trace_epoch_{}.json", epoch);
        tracer.flush(&name, &writer)?;
        tracing::info!("Epoch {} trace written to {}", epoch, name);

        if let Some(recorder) = tracer.as_chrome() {
            let state = recorder.state_dict()?;
            let checkpoint = out_dir.join(format!("tracer_state_{}.json", epoch));
            std::fs::write(&checkpoint, state.to_json()?)
                .with_context(|| format!("writing {}", checkpoint.display()))?;
        }

        registry.clear_tracer()?;
    }

    tracing::info!("Done.");
    Ok(())
}

/// Blocking evaluation pass, kept off the runtime's worker threads.
async fn evaluate(tracer: &Arc<Tracer>) -> Result<()> {
    let tracer = Arc::clone(tracer);
    tokio::task::spawn_blocking(move || {
        tracer.trace("evaluate", || std::thread::sleep(Duration::from_millis(2)))
    })
    .await
    .context("evaluation worker panicked")
}

/// Fans a batch out over blocking loader threads, one span per shard.
async fn load_batch(tracer: &Arc<Tracer>, step: usize) -> Result<Vec<u64>> {
    let mut handles = Vec::with_capacity(LOADER_WORKERS);
    for worker in 0..LOADER_WORKERS {
        let tracer = Arc::clone(tracer);
        handles.push(tokio::task::spawn_blocking(move || {
            tracer.trace("data_load", || {
                std::thread::sleep(Duration::from_micros(100 * (worker as u64 + 1)));
                (step * LOADER_WORKERS + worker) as u64
            })
        }));
    }

    let mut batch = Vec::with_capacity(LOADER_WORKERS);
    for handle in handles {
        batch.push(handle.await.context("loader worker panicked")?);
    }
    Ok(batch)
}
