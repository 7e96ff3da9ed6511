//! This program serves interactive dashboards of the keyword frequency data
//! from the Grand Duchy corpus collection, whose processed form you can find
//! at <https://github.com/AnttiHaerkoenen/grand_duchy>.

mod cache;
mod config;
mod corpus;
mod csv;
mod dataset;
mod kwic;
mod progress;
mod server;

use crate::{config::Config, progress::ProgressReport, server::AppState};
use clap::Parser;
use log::LevelFilter;
use std::{path::PathBuf, sync::Arc};

/// Serve an interactive dashboard of per-year keyword frequencies
///
/// At startup, the absolute and relative frequency tables of the selected
/// corpus are downloaded and decoded. The dashboard is then served over HTTP
/// until the process is terminated.
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Short name of the text corpus to be served, e.g. "riksdag"
    #[arg(short, long, default_value = "riksdag")]
    corpus: Box<str>,

    /// Base URL of the processed data directory
    ///
    /// Two files are fetched from this location at startup: `<stem>.csv` with
    /// relative frequencies and `<stem>_abs.csv` with absolute occurence
    /// counts, where the stem comes from the corpus registry.
    #[arg(short, long, default_value = DEFAULT_DATA_URL)]
    data_url: Box<str>,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: Box<str>,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the SQLite database with KWIC tables (env: KWIC_DATABASE)
    ///
    /// When neither this flag nor the environment variable is set, the
    /// dashboard runs without keyword-in-context retrieval and the KWIC
    /// display never updates.
    #[arg(short, long, default_value = None)]
    kwic_database: Option<PathBuf>,
}
//
impl Args {
    /// Decode and validate CLI arguments
    pub fn parse_and_check() -> Result<Self> {
        // Decode CLI arguments
        let args = Args::parse();

        // Check CLI arguments for basic sanity
        anyhow::ensure!(
            args.data_url.starts_with("http://") || args.data_url.starts_with("https://"),
            "the processed data directory should be an HTTP(S) location"
        );
        Ok(args)
    }
}
//
#[tokio::main]
async fn main() -> Result<()> {
    // Set up logging
    setup_logging().map_err(|e| anyhow::format_err!("{e}"))?;

    // Decode CLI arguments
    let args = Args::parse_and_check()?;

    // Pick a corpus
    let corpus = corpus::get(&args.corpus)?;
    let config = Config::new(args, corpus);

    // Set up progress reporting
    let report = ProgressReport::new();

    // Collect the frequency tables
    let client = reqwest::Client::new();
    let dataset = csv::download_and_collect(config.clone(), client, &report).await?;

    // Open the KWIC store, if one is configured
    let kwic = kwic::KwicStore::open_configured(&config)?.map(Arc::new);

    // Serve the dashboard
    server::run(AppState {
        config,
        dataset,
        kwic,
    })
    .await
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Default location of the processed data directory
const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/AnttiHaerkoenen/grand_duchy/master/data/processed/";

/// Year of Gregorian Calendar
pub type Year = i16;

/// Keyword whose yearly frequency is being studied
pub type Keyword = Box<str>;

/// Single frequency reading for one keyword over one year
pub type Frequency = f64;

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}
