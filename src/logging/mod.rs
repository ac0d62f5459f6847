/*!
 * Logging Module
 * Subscriber setup and request logging middleware
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogSettings;

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_directive(level: &str) -> String {
    format!("portfolio_cms={level},tower_http=debug,axum=debug")
}

/// Initialize the logging system.
///
/// Writes daily-rolled `app.log` and `error.log` under `settings.dir` plus
/// console output; JSON everywhere when `settings.json` is set. The returned
/// guards flush the background writers and must live as long as the process.
pub fn init(settings: &LogSettings) -> Vec<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(&settings.dir) {
        eprintln!("Failed to create log directory {:?}: {}", settings.dir, e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(&settings.dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&settings.dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&settings.level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if settings.json {
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty()
            .with_thread_ids(false)
            .with_thread_names(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .init();
    }

    tracing::info!(level = %settings.level, json = settings.json, "Logging initialized");

    vec![file_guard, error_guard, console_guard]
}
