//! Instalação do subscriber de `tracing`.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV;

/// Instala um subscriber `fmt` em stderr.
///
/// `JOBFLOW_LOG` vence `fallback`; um filtro inválido cai para `"info"`.
pub fn init(fallback: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_filter(std::env::var(LOG_ENV).ok(), fallback))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

fn build_filter(from_env: Option<String>, fallback: &str) -> EnvFilter {
    from_env
        .filter(|f| !f.is_empty())
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
