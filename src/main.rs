// leadscrape: harvest leads from the list open in a Chromium tab
//
// Envelopes stream to stdout as JSON lines; logs and the final summary go
// to stderr. With --serve, UI commands are read from stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kodegen_tools_leadscrape::browser::{ChromiumListSurface, ChromiumProfileFrame, open_browser};
use kodegen_tools_leadscrape::ingest::BackendHttp;
use kodegen_tools_leadscrape::messaging::{forward_from_reader, forward_to_writer};
use kodegen_tools_leadscrape::utils::TOKEN_ENV_VAR;
use kodegen_tools_leadscrape::{
    Extractor, HarvestConfig, HarvestConfigBuilder, HarvestSession, IngestionClient, LeadKind, Messenger,
    Platform, ProfileEnricher, QuotaClient, SessionReport, extractor_for, serve,
};

#[derive(Parser)]
#[command(name = "leadscrape", version, about = "Harvest leads from LinkedIn and WhatsApp Web lists")]
struct Cli {
    /// JSON config file; missing keys fall back to defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend bearer token
    #[arg(long, global = true, env = TOKEN_ENV_VAR, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape one list and upload the results
    Run(RunArgs),
    /// Print today's scraping limit and usage
    Quota,
}

#[derive(clap::Args)]
struct RunArgs {
    #[arg(long, default_value = "linkedin")]
    platform: Platform,

    /// comments, reactions, connections, followers, search or group
    #[arg(long)]
    kind: LeadKind,

    /// Page holding the list; an open tab with this prefix is reused
    #[arg(long)]
    url: String,

    #[arg(long)]
    max_items: Option<usize>,

    #[arg(long)]
    headless: bool,

    /// Attach to a running browser (e.g. http://127.0.0.1:9222)
    #[arg(long)]
    debugger_url: Option<String>,

    #[arg(long)]
    no_enrich: bool,

    /// Keep records local instead of uploading them
    #[arg(long)]
    no_upload: bool,

    /// Wait for start/pause/resume/stop commands on stdin
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => HarvestConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HarvestConfig::default(),
    };
    config.apply_token(cli.token.clone());

    match cli.command {
        Command::Run(args) => run(config, args).await,
        Command::Quota => quota(&config).await,
    }
}

async fn quota(config: &HarvestConfig) -> Result<()> {
    let client = QuotaClient::new(BackendHttp::from_config(config)?);
    let limit = client.fetch_limit().await.context("Failed to fetch scraping limit")?;
    println!("{}", serde_json::to_string_pretty(&limit)?);
    Ok(())
}

async fn run(config: HarvestConfig, args: RunArgs) -> Result<()> {
    let mut builder = HarvestConfigBuilder::from_config(config);
    if let Some(max) = args.max_items {
        builder = builder.max_items(max);
    }
    if args.headless {
        builder = builder.headless(true);
    }
    if let Some(url) = &args.debugger_url {
        builder = builder.debugger_url(url.clone());
    }
    if args.no_enrich {
        builder = builder.enrichment(false);
    }
    let config = builder.build()?;

    let extractor = extractor_for(args.platform, args.kind).with_context(|| {
        format!("{} does not offer a {} list", args.platform, args.kind)
    })?;
    let extractor: Arc<dyn Extractor> = Arc::from(extractor);

    let page_timeout = Duration::from_secs(config.browser().page_timeout_secs);
    let mut browser = open_browser(config.browser()).await?;
    let page = browser.page_for(&args.url).await?;
    let surface = Arc::new(ChromiumListSurface::new(page.clone(), page_timeout));

    let messenger = Messenger::default();
    let stream_messenger = messenger.clone();
    let stdout_task = tokio::spawn(async move {
        if let Err(e) = forward_to_writer(&stream_messenger, tokio::io::stdout()).await {
            warn!("Envelope stream closed: {}", e);
        }
    });

    let enrich_wanted = config.enrich().enabled && extractor.profile().enrich;
    let mut session = HarvestSession::new(config.clone(), surface, extractor, messenger.clone());
    if enrich_wanted {
        let frame = ChromiumProfileFrame::new(page.clone(), page_timeout);
        session = session.with_enricher(Arc::new(ProfileEnricher::new(
            Box::new(frame),
            config.enrich().clone(),
            config.pacing().navigation_rate,
        )));
    }
    if !args.no_upload {
        session = session
            .with_quota(Arc::new(QuotaClient::new(BackendHttp::from_config(&config)?)))
            .with_sink(Arc::new(IngestionClient::from_config(&config)?));
    }
    let session = Arc::new(session);

    let reports: Vec<SessionReport> = if args.serve {
        let command_messenger = messenger.clone();
        let stdin_task = tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            if let Err(e) = forward_from_reader(reader, &command_messenger).await {
                warn!("Command stream closed: {}", e);
            }
        });
        info!("Waiting for commands on stdin");
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        let reports = serve(Arc::clone(&session), shutdown).await;
        stdin_task.abort();
        reports
    } else {
        let controller = Arc::clone(session.controller());
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping");
                controller.stop();
            }
        });
        let report = session.run().await?;
        interrupt.abort();
        vec![report]
    };

    for report in &reports {
        eprintln!("{}", serde_json::to_string_pretty(&report.summary())?);
    }
    stdout_task.abort();
    Ok(())
}
