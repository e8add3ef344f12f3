//! Command-line interface definitions for the newsroom console.
//!
//! Every dashboard action is reachable as a subcommand. Global options can
//! also come from environment variables.
//!
//! # Examples
//!
//! ```sh
//! # Scrape and list news from a local backend
//! newsroom_console news scrape --source all
//! newsroom_console news list
//!
//! # Generate an article from two news items, skipping confirmations
//! newsroom_console --yes articles generate n1 n2
//!
//! # Point at another backend
//! NEWSROOM_API_BASE=http://backend:8000 newsroom_console drafts list
//! ```

use crate::models::ScrapeSource;
use crate::state::ImageTarget;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Backend base URL (overrides the settings file)
    #[arg(long, global = true, env = "NEWSROOM_API_BASE")]
    pub api_base: Option<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long, global = true, env = "NEWSROOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scraped news
    #[command(subcommand)]
    News(NewsCommand),
    /// Generated articles
    #[command(subcommand)]
    Articles(ArticleCommand),
    /// WeChat draft box
    #[command(subcommand)]
    Drafts(DraftCommand),
    /// Backend configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// WeChat account binding
    #[command(subcommand)]
    Wechat(WechatCommand),
    /// Backend scheduler
    #[command(subcommand)]
    Scheduler(SchedulerCommand),
    /// Backend health check
    Health,
    /// Load the news list and account status and print the dashboard
    Dashboard,
}

#[derive(Subcommand, Debug)]
pub enum NewsCommand {
    List,
    /// Scrape news from a source
    Scrape {
        #[arg(short, long, value_enum, default_value_t = ScrapeSource::All)]
        source: ScrapeSource,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ArticleCommand {
    List,
    /// Show an article with its image slots
    Show { id: String },
    /// Generate an article from news ids
    Generate {
        #[arg(required = true)]
        news_ids: Vec<String>,
    },
    /// Save a new title and/or digest
    Save {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        digest: Option<String>,
    },
    /// Regenerate the article body
    Regenerate { id: String },
    /// Generate the cover and figures
    Images { id: String },
    /// Regenerate one image with a new prompt
    RegenerateImage {
        id: String,
        #[command(flatten)]
        target: TargetArgs,
        /// New prompt; defaults to the stored one
        #[arg(short, long)]
        prompt: Option<String>,
    },
    /// Download one image
    Image {
        id: String,
        #[command(flatten)]
        target: TargetArgs,
        #[arg(short, long)]
        output: PathBuf,
    },
    Delete { id: String },
    /// Upload to (or update in) the WeChat draft box
    Push { id: String },
}

/// Which image of an article: the cover, or `--figure N` (1-based).
#[derive(Args, Debug, Clone, Copy)]
pub struct TargetArgs {
    #[arg(long, conflicts_with = "figure")]
    pub cover: bool,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub figure: Option<u32>,
}

impl TargetArgs {
    pub fn target(&self) -> ImageTarget {
        match self.figure {
            Some(n) => ImageTarget::Figure(n),
            None => ImageTarget::Cover,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    List,
    Publish { media_id: String },
    Delete { media_id: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    /// Set fields by dotted key, e.g. `llm.temperature=0.7`
    Set {
        #[arg(required = true, value_parser = parse_key_value)]
        pairs: Vec<(String, String)>,
    },
}

#[derive(Subcommand, Debug)]
pub enum WechatCommand {
    Bind {
        #[arg(long, default_value = "")]
        app_id: String,
        #[arg(long, env = "WECHAT_APP_SECRET", default_value = "", hide_env_values = true)]
        app_secret: String,
        #[arg(long, default_value = "")]
        account_name: String,
    },
    Status,
}

#[derive(Subcommand, Debug)]
pub enum SchedulerCommand {
    Jobs,
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}
