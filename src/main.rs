use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wikilinks::config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikilinks")]
#[command(about = "Extract external links from Wikipedia dumps and narrow them to rarely-cited domains")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one "url, title" line per external link in every main-namespace page
    Extract(ExtractArgs),
    /// Count link lines per hostname and write the table as JSON
    CountDomains(CountDomainsArgs),
    /// Keep the link lines whose hostname is cited at most --threshold times
    Filter(FilterArgs),
    /// Print the URLs that each host's robots.txt allows
    Robots(RobotsArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Path to the Wikipedia dump file (.xml.bz2 or plain .xml)
    #[arg(short, long, default_value = config::DEFAULT_DUMP_PATH)]
    input: String,

    /// Link file to write
    #[arg(short, long, default_value = config::DEFAULT_LINKS_PATH)]
    output: String,

    /// Limit number of article pages to process (for testing)
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Args)]
struct CountDomainsArgs {
    /// Link file produced by `extract`
    #[arg(short, long, default_value = config::DEFAULT_LINKS_PATH)]
    input: String,

    /// JSON file to write the hostname counts to
    #[arg(short, long, default_value = config::DEFAULT_COUNTS_PATH)]
    output: String,
}

#[derive(Args)]
struct FilterArgs {
    /// Link file produced by `extract`
    #[arg(short, long, default_value = config::DEFAULT_LINKS_PATH)]
    input: String,

    /// Hostname counts produced by `count-domains` from the same link file
    #[arg(short, long, default_value = config::DEFAULT_COUNTS_PATH)]
    counts: String,

    /// File to write the kept link lines to
    #[arg(short, long, default_value = config::DEFAULT_TARGETS_PATH)]
    output: String,

    /// Highest hostname count that is still considered rare
    #[arg(long, default_value_t = config::DEFAULT_DOMAIN_THRESHOLD)]
    threshold: u64,
}

#[derive(Args)]
struct RobotsArgs {
    /// File with one URL per line
    #[arg(short, long, default_value = config::DEFAULT_URLS_PATH)]
    input: String,

    /// Write allowed URLs here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Agent the robots.txt rules are evaluated for
    #[arg(long, default_value = config::ROBOTS_USER_AGENT)]
    user_agent: String,
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let start = Instant::now();
    let stats = wikilinks::extract::run_extraction(&args.input, &args.output, args.limit)
        .with_context(|| format!("Failed to extract links from: {}", args.input))?;
    let duration = start.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Extraction time:    {:.2}s", duration.as_secs_f64());
    println!("Pages seen:         {}", stats.pages_seen);
    println!("Articles scanned:   {}", stats.articles_scanned);
    println!("Links written:      {}", stats.links_written);
    Ok(())
}

fn run_count_domains(args: CountDomainsArgs) -> Result<()> {
    wikilinks::domains::run_count_domains(&args.input, &args.output)
        .with_context(|| format!("Failed to count domains in: {}", args.input))?;
    Ok(())
}

fn run_filter(args: FilterArgs) -> Result<()> {
    let stats = wikilinks::filter::run_filter(&args.input, &args.counts, &args.output, args.threshold)
        .with_context(|| {
            format!(
                "Failed to filter {} against counts in {}",
                args.input, args.counts
            )
        })?;
    println!("{}", stats.lines_accepted);
    Ok(())
}

fn run_robots(args: RobotsArgs) -> Result<()> {
    wikilinks::robots::run_robots(&args.input, args.output.as_deref(), &args.user_agent)
        .with_context(|| format!("Failed to check robots.txt for URLs in: {}", args.input))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG, when set, takes precedence over -v
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::CountDomains(args) => run_count_domains(args),
        Commands::Filter(args) => run_filter(args),
        Commands::Robots(args) => run_robots(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
