use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

// sqlx logs every statement at info
const QUIET_DEPENDENCIES: &str = "sqlx=warn";

pub(crate) fn init_logging(default_level: &str) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(default_level))
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{default_level},{QUIET_DEPENDENCIES}")))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{QUIET_DEPENDENCIES}")))
}

