use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use vitals_monitor::config::{Cli, Commands, Config};
use vitals_monitor::engine::{
    AlertSink, EvaluationEngine, EvaluationSummary, JsonLinesSink, TracingSink,
};
use vitals_monitor::health::{MeasurementStore, PatientId};
use vitals_monitor::ingest;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_cli(&cli)?;

    let _log_guard = config.init_logging()?;

    match cli.command {
        Commands::Replay {
            path,
            now,
            patient,
            json,
        } => replay(&config, &path, now, patient.map(PatientId), json).await?,
        Commands::Patients { path } => {
            let store = load(&path)?;
            for id in store.list_patients() {
                println!("{id}\t{}", store.measurement_count(id));
            }
        }
        Commands::DefaultConfig { output: Some(path) } => {
            Config::default().save_to_file(&path)?;
            tracing::info!("default configuration written to {}", path.display());
        }
        Commands::DefaultConfig { output: None } => {
            print!("{}", Config::generate_default_config()?);
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<MeasurementStore> {
    let store = MeasurementStore::new();
    let report = ingest::load_path(path, &store)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(
        "loaded {} measurements from {} file(s), {} rejected",
        report.recorded,
        report.files,
        report.rejected
    );
    Ok(store)
}

/// Latest timestamp in the store, if any
fn latest_timestamp(store: &MeasurementStore) -> Option<i64> {
    store
        .list_patients()
        .into_iter()
        .flat_map(|id| store.range(id, i64::MIN, i64::MAX))
        .map(|m| m.timestamp_millis)
        .max()
}

async fn replay(
    config: &Config,
    path: &Path,
    now: Option<i64>,
    patient: Option<PatientId>,
    json: bool,
) -> Result<()> {
    let store = Arc::new(load(path)?);

    let now = now
        .or_else(|| latest_timestamp(&store))
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    tracing::info!("evaluating at {}", now);

    let sink: Arc<dyn AlertSink> = if json {
        Arc::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Arc::new(TracingSink)
    };
    let engine = Arc::new(EvaluationEngine::with_standard_detectors(
        store.clone(),
        sink,
        &config.thresholds,
    ));

    let patients: Vec<PatientId> = match patient {
        Some(id) => vec![id],
        None => store.list_patients().into_iter().collect(),
    };

    // Patients are independent, so evaluate them side by side
    let mut tasks = JoinSet::new();
    for id in patients {
        let engine = engine.clone();
        tasks.spawn_blocking(move || engine.evaluate(id, now));
    }

    let mut total = EvaluationSummary::default();
    while let Some(joined) = tasks.join_next().await {
        let summary = joined.context("evaluation task failed")??;
        total.alerts += summary.alerts;
        total.faults += summary.faults;
    }

    tracing::info!(
        alerts = total.alerts,
        faults = total.faults,
        "replay finished"
    );
    if !json {
        println!("{} alert(s), {} detector fault(s)", total.alerts, total.faults);
    }
    Ok(())
}
