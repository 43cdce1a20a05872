use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_fuse::{
    config::{Config, FetchConfig, GrabberSettings, MergeConfig},
    models::Site,
    pipeline,
};

/// The grabber working tree exposes its grab entry point as an npm script;
/// `---` separates npm's own arguments from the grabber's.
const GRABBER_PROGRAM: &str = "npm";
const GRABBER_LEADING_ARGS: [&str; 3] = ["run", "grab", "---"];

#[derive(Parser)]
#[command(name = "epg-fuse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run per-site EPG grabbers and merge their XMLTV output into one guide")]
struct Cli {
    /// Input list of grabber sites, one hostname per line
    #[arg(long = "sites", default_value = "epgsites.txt")]
    sites: PathBuf,

    /// Final merged XMLTV output
    #[arg(long = "out", default_value = "guide.xml")]
    out: PathBuf,

    /// Artifact directory, kept stable across runs for --resume
    #[arg(long = "tmpDir", default_value = ".epg-tmp")]
    tmp_dir: PathBuf,

    /// Days of guide data to request from each grabber
    #[arg(long = "days")]
    days: Option<u32>,

    /// Per-site grabber connection count (pass-through)
    #[arg(long = "maxConnections", default_value_t = 10)]
    max_connections: u32,

    /// Number of sites grabbed in parallel
    #[arg(long = "siteConcurrency", default_value_t = 3)]
    site_concurrency: usize,

    /// Grabber HTTP timeout in milliseconds (pass-through + TIMEOUT env)
    #[arg(long = "timeout")]
    timeout: Option<u64>,

    /// Inter-request delay in milliseconds (pass-through + DELAY env)
    #[arg(long = "delay")]
    delay: Option<u64>,

    /// Max retries per site, each with safer settings
    #[arg(long = "retries", default_value_t = 1)]
    retries: u32,

    /// Reuse existing artifacts instead of re-running grabbers
    #[arg(long = "resume")]
    resume: bool,

    /// M3U playlist (path or URL) whose tvg-ids whitelist the output channels
    #[arg(long = "playlist")]
    playlist: Option<String>,

    /// Fuzzy-match window in seconds for programme deduplication
    #[arg(long = "fuzzySec", default_value_t = 90)]
    fuzzy_sec: i64,

    /// Comma-separated site order for merge tie-breaks
    #[arg(long = "preferSites", value_delimiter = ',', default_value = "")]
    prefer_sites: Vec<String>,

    /// Hard per-site kill timer in seconds
    #[arg(long = "siteWallClockSec", default_value_t = 1800)]
    site_wall_clock_sec: u64,

    /// Minimum programme count for an artifact to count as valid
    #[arg(long = "minProg", default_value_t = 5)]
    min_prog: usize,

    /// Skip chronically failing sites and record new failures
    #[arg(long = "backoff")]
    backoff: bool,

    /// Backoff list location
    #[arg(long = "backoffFile", default_value = ".skip-sites.txt")]
    backoff_file: PathBuf,

    /// Attempt sites even when they are on the backoff list
    #[arg(long = "force")]
    force: bool,

    /// Progress report cadence in seconds; 0 disables
    #[arg(long = "progressSec", default_value_t = 30)]
    progress_sec: u64,

    /// Log level for the default filter (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "logLevel", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            sites_file: self.sites,
            output: self.out,
            tmp_dir: self.tmp_dir,
            playlist: self.playlist,
            grabber: GrabberSettings {
                program: GRABBER_PROGRAM.to_string(),
                leading_args: GRABBER_LEADING_ARGS.iter().map(|s| s.to_string()).collect(),
                days: self.days,
                max_connections: self.max_connections,
                delay_ms: self.delay,
                timeout_ms: self.timeout,
                wall_clock: Duration::from_secs(self.site_wall_clock_sec),
                min_programmes: self.min_prog,
            },
            fetch: FetchConfig {
                concurrency: self.site_concurrency.max(1),
                retries: self.retries,
                resume: self.resume,
                backoff: self.backoff,
                backoff_file: self.backoff_file,
                force: self.force,
                progress_interval: (self.progress_sec > 0)
                    .then(|| Duration::from_secs(self.progress_sec)),
            },
            merge: MergeConfig {
                fuzzy: chrono::Duration::seconds(self.fuzzy_sec),
                prefer_sites: self
                    .prefer_sites
                    .iter()
                    .filter(|s| !s.is_empty())
                    .map(|s| Site::new(s.clone()))
                    .collect(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("epg_fuse={}", cli.log_level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    pipeline::run(cli.into_config()).await?;
    Ok(())
}
