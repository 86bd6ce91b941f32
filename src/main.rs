use std::env;
use std::path::Path;

use anyhow::Context;
use log::info;
use songplays_etl::config::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, EtlConfig, PROFILE_ENV, resolve_profile_name,
};
use songplays_etl::Pipeline;

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let profile = resolve_profile_name(env::var(PROFILE_ENV).ok().as_deref());

    let config = EtlConfig::from_path(Path::new(&config_path))
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;
    let settings = config
        .settings(&profile)
        .with_context(|| format!("Failed to resolve profile {profile}"))?;
    info!("Using profile {profile} from {config_path}");

    let pipeline = Pipeline::new(settings).context("Failed to open storage")?;
    let summary = pipeline.run().context("ETL run failed")?;

    info!("{summary}");
    info!("Wrote {} rows in total", summary.total_rows());
    Ok(())
}
