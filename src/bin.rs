//! Binary entry point for `pr-notifier`.
//!
//! This module provides the command-line interface for pr-notifier with options
//! for configuration file paths and logging verbosity. It initializes the
//! necessary components and starts the service.

use clap::Parser;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use pr_notifier::base::{config::Config, types::Void};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Pr-notifier – announces pull-request events in a Telegram chat.
///
/// Configuration can come from `config.toml` or `PR_NOTIFIER_*` environment
/// variables. CI workflows post events to the webhook endpoints, and the
/// service sends one Markdown message per event to the configured chat.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    /// Override the config file path (optional).
    ///
    /// By default, the service will look for a config file at `.hidden/config.toml`
    /// in the current directory.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: INFO level
    /// - -v: DEBUG level
    /// - -vv or more: TRACE level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Main entry point for the pr-notifier binary.
///
/// Sets up logging based on verbosity, loads configuration, and serves until
/// shutdown. Buffered spans are flushed to the collector before exiting.
#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    });

    // Human-readable log lines, one per closed span.

    let stdout = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    // Spans for the OTLP collector; the batch exporter keeps requests off the hot path.

    let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
    let provider = SdkTracerProvider::builder().with_batch_exporter(exporter).build();
    let otel = tracing_opentelemetry::layer().with_tracer(provider.tracer("pr-notifier"));

    tracing_subscriber::registry().with(otel).with(level_filter).with(stdout).init();

    let config = Config::load(args.config.as_deref())?;
    let result = pr_notifier::start(config).await;

    if let Err(err) = provider.shutdown() {
        tracing::warn!("Failed to shut down the tracer provider: {}", err);
    }

    result
}
