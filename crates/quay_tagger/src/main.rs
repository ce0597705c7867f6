mod api;
mod app_state;
mod config;
mod dto;
mod error;
mod publisher;
mod registry;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::ServiceExt;
use axum_server::tls_rustls::RustlsConfig;
use tower_http::normalize_path::NormalizePathLayer;
use tower_layer::Layer;
use tracing::metadata::LevelFilter;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter, EnvFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_state::AppState;
use config::{Config, LogConfig, LogFormat, RollPeriod};

/// Install the global subscriber. The returned guards must be kept alive for
/// the non blocking writers to flush.
fn init_logging(logc: &LogConfig) -> anyhow::Result<Vec<WorkerGuard>> {
    let mut logging_guards = Vec::new();

    let (stdout_nb, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    logging_guards.push(stdout_guard);

    // Get a rolling file appender depending on the config
    let file_nb = logc.path.as_ref().map(|log_path| {
        let file_appender = match logc.roll_period {
            RollPeriod::Minutely => tracing_appender::rolling::minutely(log_path, "quay-tagger.log"),
            RollPeriod::Hourly => tracing_appender::rolling::hourly(log_path, "quay-tagger.log"),
            RollPeriod::Daily => tracing_appender::rolling::daily(log_path, "quay-tagger.log"),
            RollPeriod::Never => tracing_appender::rolling::never(log_path, "quay-tagger.log"),
        };

        let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
        logging_guards.push(file_guard);
        file_nb
    });

    // Get json or text layers
    let (json_stdout, json_file, plain_stdout, plain_file) = match logc.format {
        LogFormat::Json => (
            Some(tracing_subscriber::fmt::layer().with_writer(stdout_nb).json()),
            file_nb.map(|w| tracing_subscriber::fmt::layer().with_writer(w).json()),
            None,
            None,
        ),
        LogFormat::Human => (
            None,
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(stdout_nb)),
            file_nb.map(|w| tracing_subscriber::fmt::layer().with_writer(w)),
        ),
    };

    // Only log quay_tagger at the configured level unless a filter is specified
    let targets_filter = if logc.env_filter.is_some() {
        None
    } else {
        Some(
            filter::Targets::new()
                .with_target("quay_tagger", logc.level)
                .with_target("tower_http", logc.level)
                .with_default(LevelFilter::INFO)
        )
    };

    let env_filter = match &logc.env_filter {
        Some(env_filter) => Some(EnvFilter::from_str(env_filter)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(json_stdout)
        .with(json_file)
        .with(plain_stdout)
        .with(plain_file)
        .with(targets_filter)
        .with(env_filter)
        .try_init()?;

    Ok(logging_guards)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new()?;

    let _logging_guards = init_logging(&config.log)?;

    if config.quay_token.is_empty() {
        warn!("No Quay token configured, the registry will likely reject every call");
    }

    let app_addr = SocketAddr::from_str(&format!("{}:{}", config.listen_address, config.listen_port))?;

    let tls_config = config.tls.clone();
    let state = Arc::new(AppState::from_config(&config)?);
    info!("Tagging against {}", state.publisher.registry().api_url());

    let app = api::router(state);
    let layered_app = NormalizePathLayer::trim_trailing_slash().layer(app);

    match tls_config {
        Some(tls) if tls.enable => {
            info!("Starting https server, listening on {}", app_addr);

            let config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

            axum_server::bind_rustls(app_addr, config)
                .serve(layered_app.into_make_service())
                .await?;
        },
        _ => {
            info!("Starting http server, listening on {}", app_addr);
            axum::Server::bind(&app_addr)
                .serve(layered_app.into_make_service())
                .await?;
        }
    }

    Ok(())
}
