use clap::{Args, Parser, Subcommand};
use peerly_core::{DeliveryMode, TimeBand, Weekday};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "peerly")]
#[command(about = "Tutor discovery and session booking", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "PEERLY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Directory feed (JSON), overrides directory.path
        #[arg(long)]
        directory: Option<PathBuf>,

        /// Seats per slot when the feed sets none
        #[arg(long)]
        default_capacity: Option<u32>,
    },

    /// Search a directory feed and print matching tutors as JSON
    Search(SearchArgs),

    /// Validate a directory feed
    Check {
        /// Path to the feed
        feed: PathBuf,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    /// Path to the directory feed
    pub feed: PathBuf,

    /// Subject code (e.g. MT2013); "all" means any
    #[arg(long)]
    pub subject: Option<String>,

    /// Campus name, matched against slot locations
    #[arg(long = "campus")]
    pub campuses: Vec<String>,

    /// Weekday (e.g. monday, fri)
    #[arg(long = "weekday")]
    pub weekdays: Vec<Weekday>,

    /// morning, afternoon, evening or HH:MM-HH:MM
    #[arg(long = "band")]
    pub time_bands: Vec<TimeBand>,

    /// online, offline or both
    #[arg(long = "mode")]
    pub modes: Vec<DeliveryMode>,

    /// Rating bucket r, matching ratings in [r, r+1)
    #[arg(long = "rating", value_parser = clap::value_parser!(u8).range(0..=5))]
    pub rating_buckets: Vec<u8>,

    /// Free text over tutor name and staff id
    #[arg(long)]
    pub query: Option<String>,

    /// Order results by rating
    #[arg(long)]
    pub recommend: bool,
}
