use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use shared::briefing::DEFAULT_START_URL;
use shared::claude::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use shared::{
    write_site, BriefingCollector, BriefingGenerator, CancelFlag, ClaudeClient, Config,
    FetchPolicy, SectionFetcher, SiteFiles, DEFAULT_SECTIONS,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate-briefing")]
#[command(about = "Search the web with Claude and build today's installable news briefing page")]
struct Args {
    /// Directory to write index.html, manifest.json and sw.js into
    #[arg(short, long, default_value = "docs")]
    output_dir: PathBuf,

    /// Claude model to use
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum tokens per response
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Seconds to wait between sections
    #[arg(long, default_value = "2")]
    section_delay: u64,

    /// Cap on web searches per request
    #[arg(long)]
    max_searches: Option<u32>,

    /// start_url written into the web app manifest
    #[arg(long, default_value = DEFAULT_START_URL)]
    start_url: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::from_env()?;

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; finishing with the stories collected so far");
                cancel.cancel();
            }
        });
    }

    let today = Local::now().format("%A, %B %d, %Y").to_string();
    println!("🔍 Generating today's briefing for {}...", today);

    let client = ClaudeClient::new(config.anthropic_api_key)?;
    let policy = FetchPolicy {
        model: args.model,
        max_tokens: args.max_tokens,
        max_searches: args.max_searches,
        ..FetchPolicy::default()
    };
    info!(model = %policy.model, sections = DEFAULT_SECTIONS.len(), "Starting collection");

    let fetcher = SectionFetcher::new(Arc::new(client), policy);
    let collector = BriefingCollector::new(fetcher, Duration::from_secs(args.section_delay));
    let report = collector.collect(&DEFAULT_SECTIONS, &today, &cancel).await;

    println!("\n📰 Got {} stories", report.stories.len());
    let empty = report.empty_sections();
    if !empty.is_empty() {
        println!("\n⚠ No stories for {} sections:", empty.len());
        for label in &empty {
            println!("  ✗ {}", label);
        }
    }
    if report.cancelled {
        println!("\n⚠ Run was interrupted; writing a partial briefing.");
    }

    println!("\n📝 Rendering briefing page...");
    let site = SiteFiles {
        index_html: BriefingGenerator::generate(&report.stories, &today, Utc::now()),
        manifest_json: BriefingGenerator::generate_manifest(&args.start_url)?,
        service_worker_js: BriefingGenerator::generate_service_worker(),
    };
    let written = write_site(&args.output_dir, &site).context("Failed to write briefing files")?;

    for path in &written {
        info!(path = %path.display(), "Wrote file");
    }
    println!(
        "\n✅ Briefing generated at {}",
        args.output_dir.join("index.html").display()
    );

    Ok(())
}
