//! # Structured Logging
//!
//! Installs the global `tracing` subscriber for a process embedding the
//! pipeline. `RUST_LOG` takes precedence over the configured level.

use crate::errors::{GuardError, GuardResult};
use config_rs::LoggingConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Filter directives for a configured level; dependencies stay at warn
pub fn filter_directives(config: &LoggingConfig) -> String {
    let level = config.level.to_lowercase();
    format!(
        "warn,config_rs={level},input_sanitizer={level},sql_validator={level},query_router={level},query_guard={level}",
        level = level
    )
}

/// Initialize logging once. Later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) -> GuardResult<()> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));
    let subscriber = Registry::default().with(filter);

    let result = if config.json_format {
        let json_layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(config.with_target);
        tracing::subscriber::set_global_default(subscriber.with(json_layer))
    } else {
        let text_layer = fmt::layer().with_target(config.with_target).with_thread_names(true);
        tracing::subscriber::set_global_default(subscriber.with(text_layer))
    };

    if let Err(e) = result {
        LOGGING_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(GuardError::Logging(format!("Failed to set global subscriber: {}", e)));
    }

    tracing::info!(
        level = %config.level,
        json = config.json_format,
        "Structured logging initialized"
    );
    Ok(())
}

pub fn is_initialized() -> bool {
    LOGGING_INITIALIZED.load(Ordering::SeqCst)
}
