use std::{future::IntoFuture as _, io, sync::OnceLock};

use application::{server, Args, Config};
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tracing as log;
use tracing_subscriber::{
    filter::{filter_fn, FilterFn},
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

/// [`log::Level`]s written to [`io::stderr`] rather than [`io::stdout`].
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum [`log::Level`] set from the [`Config`].
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

/// Filters out events not meant for the [`io::stderr`] (if `stderr` is
/// `true`) or the [`io::stdout`] otherwise.
fn level_filter(
    stderr: bool,
) -> FilterFn<impl Fn(&log::Metadata<'_>) -> bool> {
    filter_fn(move |meta| {
        let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
        meta.is_span()
            || STDERR_LEVELS.contains(meta.level()) == stderr
                && max >= *meta.level()
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(level_filter(false)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(level_filter(true)),
        )
        .init();

    _ = run().await;
}

/// Resolves once the process receives `Ctrl+C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for `Ctrl+C`: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        auth,
        service,
        postgres,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    _ = LOG_LEVEL.set(log.level.into());

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let service_config = service.into_config(&auth).map_err(|e| {
        log::error!("invalid `Service` configuration: {e}");
    })?;
    let (service, background) = Service::new(service_config, postgres);

    let cors = server::cors(&server.cors.origins).map_err(|e| {
        log::error!("invalid CORS origin: {e}");
    })?;
    let app = server::router(service, cors);

    let addr = (server.host.clone(), server.port);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        log::error!(
            "failed to listen on `{}:{}`: {e}",
            server.host,
            server.port,
        );
    })?;
    log::info!("listening on `{}:{}`", server.host, server.port);

    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        res = serve => res.map_err(|e| log::error!("webserver failed: {e}")),
        res = background.into_future() => res.map_err(|e| log::error!("{e}")),
    }
}
