// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

pub const LOG_FILE_PREFIX: &str = "cytoview.log";

/// Installs the global subscriber writing JSON lines to a daily file.
///
/// The terminal belongs to the TUI, so nothing is written to stdout or
/// stderr. Keep the returned guard alive until exit or buffered lines are
/// lost.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;

    let filter = build_filter(level, std::env::var("RUST_LOG").ok())?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));
    let file_layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true);

    Registry::default()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(guard)
}

/// `RUST_LOG` wins over the configured level when set.
fn build_filter(configured: &str, env_override: Option<String>) -> Result<EnvFilter> {
    match env_override.filter(|value| !value.trim().is_empty()) {
        Some(directive) => {
            EnvFilter::try_new(&directive).with_context(|| format!("invalid RUST_LOG {directive:?}"))
        }
        None => EnvFilter::try_new(configured)
            .with_context(|| format!("invalid log.level {configured:?}")),
    }
}
