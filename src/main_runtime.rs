use drl_ensemble::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Console logging plus a daily-rotated file under `DRL_LOG_DIR` when set.
///
/// The returned guard flushes the file writer on drop and must outlive `main`'s work.
pub fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},drl_ensemble=debug", logging.level))
    });

    let (file_layer, guard) = match std::env::var("DRL_LOG_DIR") {
        Ok(log_dir) => match std::fs::create_dir_all(&log_dir) {
            Ok(()) => {
                // Daily rotating file appender
                let file_appender = tracing_appender::rolling::daily(&log_dir, "drl-ensemble.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                eprintln!("Logging to: {}/drl-ensemble.log", log_dir);
                (
                    Some(
                        tracing_subscriber::fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false) // No color codes in file
                            .with_target(true),
                    ),
                    Some(guard),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not create log directory {} ({}), file logging disabled",
                    log_dir, e
                );
                (None, None)
            }
        },
        Err(_) => (None, None),
    };

    let json_layer = logging
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));
    let console_layer = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();

    guard
}

pub fn init_logging_simple() {
    // Minimal logging for one-shot commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
