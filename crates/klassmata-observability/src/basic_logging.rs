use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a console-only subscriber.
///
/// Used when observability is compiled out or disabled with
/// `OBSERVABILITY_ENABLED=false`. The level comes from `LOG_LEVEL`
/// (default: "info") unless `RUST_LOG` is set; noisy dependencies are held
/// at warn.
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "klassmata={level},klassmata_db={level},klassmata_cli={level},tower_http=warn,hyper=warn,sqlx=warn",
            level = log_level
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    // A second init (e.g. from tests) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
