// =============================================================================
// Ticker Pulse — Main Entry Point
// =============================================================================
//
// Two modes:
//   analyze  one-shot analysis of a ticker, printed to stdout
//   serve    JSON API for a charting front-end
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ticker_pulse::analysis::{AnalysisEngine, AnalysisReport, AnalysisRequest, Snapshot};
use ticker_pulse::api;
use ticker_pulse::config::AppConfig;
use ticker_pulse::market_data::{PriceSeriesStore, SeriesCache};
use ticker_pulse::narration::Narrator;
use ticker_pulse::provider::YahooChartClient;
use ticker_pulse::signals::SignalPolicy;

// ── Command line ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Single-ticker RSI/MACD dashboard engine")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, env = "TICKER_PULSE_CONFIG", default_value = "ticker_pulse.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse one ticker and print the result.
    Analyze {
        /// Ticker symbol, e.g. "RELIANCE.NS". Defaults to the configured symbol.
        #[arg(short, long)]
        symbol: Option<String>,

        /// History range: 1mo, 3mo, 6mo, 1y or 5y.
        #[arg(short, long)]
        period: Option<String>,

        /// Include the narration sentence.
        #[arg(long)]
        speak: bool,

        /// Override the configured policy ("rsi" or "rsi-macd").
        #[arg(long)]
        policy: Option<String>,

        /// Print the full snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write the effective configuration (defaults if no file exists) to
    /// the config path.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Serve the JSON API.
    Serve {
        #[arg(long, env = "TICKER_PULSE_BIND_ADDR")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            symbol,
            period,
            speak,
            policy,
            json,
        } => {
            if let Some(name) = policy {
                config.policy = SignalPolicy::preset(&name)?;
            }
            let engine = build_engine(&config)?;

            let symbol = symbol.unwrap_or_else(|| config.default_symbol.clone());
            let period = period.unwrap_or_else(|| config.default_period.to_string());
            let request = AnalysisRequest::parse(&symbol, &period, speak)?;

            run_analyze(&engine, &request, json).await
        }
        Commands::InitConfig { force } => {
            if std::path::Path::new(&cli.config).exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", cli.config);
            }
            config.save(&cli.config)?;
            println!("Wrote {}", cli.config);
            Ok(())
        }
        Commands::Serve { bind } => {
            let engine = Arc::new(build_engine(&config)?);
            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            run_serve(engine, &bind_addr).await
        }
    }
}

// ── Wiring ───────────────────────────────────────────────────────────────────

fn build_engine(config: &AppConfig) -> anyhow::Result<AnalysisEngine> {
    let provider = Arc::new(YahooChartClient::new(&config.provider)?);
    let store = PriceSeriesStore::new(provider, Arc::new(SeriesCache::new()), config.cache.clone());
    let engine = AnalysisEngine::new(
        store,
        config.indicators.clone(),
        config.policy,
        Narrator::new(config.narration.clone()),
    )?;
    Ok(engine)
}

// ── analyze ──────────────────────────────────────────────────────────────────

async fn run_analyze(
    engine: &AnalysisEngine,
    request: &AnalysisRequest,
    json: bool,
) -> anyhow::Result<()> {
    // One retry on transient retrieval failures; nothing was cached for them.
    let result = match engine.analyze(request).await {
        Err(e) if e.is_retryable() => {
            warn!(error = %e, "retrieval failed, retrying once");
            engine.analyze(request).await
        }
        other => other,
    };
    let snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e).with_context(|| format!("analysis of {} failed", request.symbol));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    match snapshot {
        Snapshot::NotFound { .. } => println!("Invalid ticker or no data found."),
        Snapshot::Ready(report) => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("{} ({})", report.symbol, report.period);
    match report.price_change {
        Some(change) => println!("  Price   {:.2} ({:+.2})", report.current_price, change),
        None => println!("  Price   {:.2}", report.current_price),
    }
    match report.latest.rsi {
        Some(rsi) => println!("  RSI     {rsi:.2}"),
        None => println!("  RSI     n/a"),
    }
    if let (Some(macd), Some(signal)) = (report.latest.macd, report.latest.signal_line) {
        println!("  MACD    {macd:.3} / signal {signal:.3}");
    }
    if let Some(ema) = report.latest.ema {
        println!("  EMA     {ema:.2}");
    }
    println!("  Signal  {}", report.signal_label);
    if let Some(text) = &report.narration {
        println!();
        println!("{text}");
    }
}

// ── serve ────────────────────────────────────────────────────────────────────

async fn run_serve(engine: Arc<AnalysisEngine>, bind_addr: &str) -> anyhow::Result<()> {
    let app = api::router(engine.clone());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, policy = ?engine.policy(), "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("Ticker Pulse shut down complete.");
    Ok(())
}
