use std::{
    error::Error,
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use farm_budget_rs::{
    AppState, Environment, PaginationConfig, build_cors_layer, build_router, get_local_timezone,
    graceful_shutdown, logging_middleware,
};

/// The REST API server for tracking farm expenses against monthly budgets.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The address to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Directory containing an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The server uses plain HTTP if this is not set.
    #[arg(long, env = "CERT_PATH")]
    cert_path: Option<PathBuf>,

    /// Whether to show internal error details to clients and allow the local front-end dev
    /// servers.
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Development)]
    environment: Environment,

    /// The canonical name of the local timezone, e.g. "Asia/Kolkata". Decides when a month
    /// starts and ends.
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The origin of the front-end allowed to make cross-origin requests.
    #[arg(long, env = "FRONTEND_URL")]
    frontend_url: Option<String>,

    /// The page size for list endpoints when a request does not give one.
    #[arg(long, env = "DEFAULT_PAGE_SIZE", default_value_t = 10)]
    default_page_size: u64,

    /// The largest page size a request may ask for.
    #[arg(long, env = "MAX_PAGE_SIZE", default_value_t = 100)]
    max_page_size: u64,

    /// File to append debug level logs to.
    #[arg(long, env = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Turn off logging of request and response bodies.
    #[arg(long, env = "NO_REQUEST_LOG")]
    no_request_log: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(args.log_file.as_deref())?;

    if get_local_timezone(&args.timezone).is_none() {
        return Err(format!("Unknown timezone \"{}\"", args.timezone).into());
    }

    if args.default_page_size == 0 || args.default_page_size > args.max_page_size {
        return Err(format!(
            "The default page size must be between 1 and the max page size {}, got {}",
            args.max_page_size, args.default_page_size
        )
        .into());
    }

    let connection = Connection::open(&args.db_path)?;
    let state = AppState::new(
        connection,
        &args.timezone,
        PaginationConfig {
            default_page_size: args.default_page_size,
            max_page_size: args.max_page_size,
        },
        args.environment,
    )?;

    let mut router = build_router(state);

    if !args.no_request_log {
        router = router.layer(middleware::from_fn(logging_middleware));
    }

    let router = add_tracing_layer(router).layer(build_cors_layer(
        args.environment,
        args.frontend_url.as_deref(),
    )?);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::new(args.host, args.port);
    tracing::info!(
        "Running in {} mode with timezone {}",
        args.environment,
        args.timezone
    );

    match args.cert_path {
        Some(cert_path) => {
            let tls_config = RustlsConfig::from_pem_file(
                cert_path.join("cert.pem"),
                cert_path.join("key.pem"),
            )
            .await?;

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
    }

    Ok(())
}

fn setup_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let debug_log = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(filter::LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .try_init()?;

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Internal errors are already logged where they happen.
        .on_failure(());

    router.layer(tracing_layer)
}
