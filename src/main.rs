use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use log::{info, warn};

use arm_engine::{EngineConfig, RulesEngine, RunRequest};

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(dataset) = args.next().map(PathBuf::from) else {
        warn!("usage: arm-engine <dataset.csv> [request.json]");
        return Ok(());
    };

    info!("loading dataset from: {}", dataset.display());
    let start = Instant::now();
    let engine = RulesEngine::from_path(&dataset, EngineConfig::default())?;
    info!(
        "engine ready with {} tokens in {:?}",
        engine.tokens().len(),
        start.elapsed()
    );

    let bootstrap = engine.bootstrap();
    println!("{}", serde_json::to_string_pretty(&bootstrap)?);

    if let Some(request_path) = args.next().map(PathBuf::from) {
        let raw = std::fs::read_to_string(&request_path)
            .with_context(|| format!("failed to read request file {}", request_path.display()))?;
        let request: RunRequest = serde_json::from_str(&raw)
            .with_context(|| format!("invalid run request in {}", request_path.display()))?;

        let start = Instant::now();
        let result = engine.run(&request)?;
        info!(
            "{} rules over {} pre-filtered records in {:?}",
            result.rules.len(),
            result.stats.pre_filtered_records,
            start.elapsed()
        );
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
