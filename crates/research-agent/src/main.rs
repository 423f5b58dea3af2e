use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fusion_core::types::ReportStatus;
use fusion_core::SourceAdapter;
use signal_orchestrator::Orchestrator;
use source_adapters::{NewsAdapter, PriceAdapter, RedditAdapter, TwitterAdapter};
use synth_client::SynthClient;
use text_scorer::TextScorer;
use tokio::time;

mod config;

use config::EngineConfig;

const DEFAULT_TOKENS: &[&str] = &["BTC", "ETH", "SONIC"];
const SYNTH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Analyze,
    Monitor,
    Test,
}

impl Command {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "analyze" => Some(Self::Analyze),
            "monitor" => Some(Self::Monitor),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // 2. Resolve the command before anything else so a typo gets usage, not
    // a configuration error
    let args: Vec<String> = std::env::args().collect();
    let raw_command = args.get(1).map(String::as_str).unwrap_or("analyze");
    let command = match Command::parse(raw_command) {
        Some(command) => command,
        None => {
            eprintln!("unknown command: {raw_command}");
            eprintln!("usage: research-agent [analyze|monitor|test] [TOKEN ...]");
            std::process::exit(1);
        }
    };
    let tokens = parse_tokens(args.get(2..).unwrap_or(&[]));

    // 3. Load configuration; the synthesizer key is required up front
    let config = EngineConfig::from_env()?;
    tracing::info!("Starting token research agent");
    tracing::info!("  Synthesizer: {} via {}", config.synth_model, config.synth_base_url);
    tracing::info!("  Analysis timeout: {:?}", config.analysis_timeout);
    tracing::info!("  Cache TTL: {:?}", config.cache_ttl);

    let orchestrator = build_orchestrator(&config)?;

    match command {
        Command::Analyze => run_analyze(&orchestrator, &config, &tokens).await,
        Command::Monitor => run_monitor(&orchestrator, &config, &tokens).await,
        Command::Test => run_test(&config),
    }
}

fn parse_tokens(args: &[String]) -> Vec<String> {
    if args.is_empty() {
        DEFAULT_TOKENS.iter().map(|t| t.to_string()).collect()
    } else {
        args.to_vec()
    }
}

fn build_orchestrator(config: &EngineConfig) -> Result<Orchestrator> {
    let scorer = Arc::new(TextScorer::without_models());

    let news = NewsAdapter::new(config.newsapi_key.clone(), Arc::clone(&scorer));
    let twitter = TwitterAdapter::new(config.twitter_bearer_token.clone(), Arc::clone(&scorer));
    let reddit = RedditAdapter::new(
        config.reddit_client_id.clone(),
        config.reddit_client_secret.clone(),
        Arc::clone(&scorer),
    );

    tracing::info!(
        news = news.is_enabled(),
        twitter = twitter.is_enabled(),
        reddit = reddit.is_enabled(),
        "source adapters configured"
    );

    let adapters: Vec<Arc<dyn SourceAdapter>> =
        vec![Arc::new(news), Arc::new(twitter), Arc::new(reddit)];

    let synth = SynthClient::new(
        config.synth_base_url.clone(),
        config.synth_api_key.clone(),
        config.synth_model.clone(),
        SYNTH_TIMEOUT,
    )?;

    Ok(Orchestrator::new(
        adapters,
        Arc::new(PriceAdapter::new()),
        Some(synth),
        config.cache_ttl,
    ))
}

async fn run_analyze(
    orchestrator: &Orchestrator,
    config: &EngineConfig,
    tokens: &[String],
) -> Result<()> {
    let report = orchestrator.run(tokens, config.analysis_timeout).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!();
    println!("confidence_score: {:.3}", report.overall_confidence);
    println!("content_hash: {}", report.content_hash);

    if report.status == ReportStatus::Timeout {
        tracing::warn!("analysis hit the global deadline; report is partial");
    }
    Ok(())
}

async fn run_monitor(
    orchestrator: &Orchestrator,
    config: &EngineConfig,
    tokens: &[String],
) -> Result<()> {
    tracing::info!(
        interval = ?config.monitor_interval,
        tokens = ?tokens,
        "monitor loop started, Ctrl-C to stop"
    );

    let mut interval = time::interval(config.monitor_interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match orchestrator.run(tokens, config.analysis_timeout).await {
                    Ok(report) => {
                        println!(
                            "[{}] confidence_score={:.3} status={:?} content_hash={}",
                            report.timestamp.to_rfc3339(),
                            report.overall_confidence,
                            report.status,
                            report.content_hash,
                        );
                    }
                    Err(e) => tracing::error!(error = %e, "analysis cycle failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested, exiting monitor loop");
                return Ok(());
            }
        }
    }
}

/// Configuration check only: reports which sources are credentialed and how
/// the synthesizer is pointed, without touching the network. Reaching this
/// point at all means the required configuration parsed.
fn run_test(config: &EngineConfig) -> Result<()> {
    println!("synthesizer: {} via {}", config.synth_model, config.synth_base_url);
    println!(
        "news: {}",
        if config.newsapi_key.is_some() { "enabled" } else { "disabled (no NEWSAPI_KEY)" }
    );
    println!(
        "twitter: {}",
        if config.twitter_bearer_token.is_some() {
            "enabled"
        } else {
            "disabled (no TWITTER_BEARER_TOKEN)"
        }
    );
    println!(
        "reddit: {}",
        if config.reddit_client_id.is_some() && config.reddit_client_secret.is_some() {
            "enabled"
        } else {
            "disabled (no REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET)"
        }
    );
    println!("analysis timeout: {:?}", config.analysis_timeout);
    println!("monitor interval: {:?}", config.monitor_interval);
    println!("cache ttl: {:?}", config.cache_ttl);
    println!("configuration ok");
    Ok(())
}
