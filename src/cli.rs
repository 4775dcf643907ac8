//! Command-line surface for the scraper.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use gig_scrape_lib::browser::BrowserEngine;
use gig_scrape_lib::scraping::{self, compute_expires_at};
use gig_scrape_lib::{default_config_path, run_scraper, AppConfig, RunSummary};

#[derive(Parser)]
#[command(name = "gig-scrape")]
#[command(about = "Scrape a venue's event calendar into a JSON gig list")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the per-user data directory)
    #[arg(long, global = true, env = "GIG_SCRAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest a venue listing and write its gigs
    Run(RunArgs),

    /// List the venues that can be scraped
    Venues {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print the expiry instant for an event date
    Expires {
        /// Event date, e.g. 2024-03-10 or 2024-03-10T21:00:00Z
        date: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Venue to scrape
    #[arg(long, env = "GIG_SCRAPE_VENUE")]
    venue: Option<String>,
    /// Listing URL to open instead of the venue's own
    #[arg(long, env = "GIG_SCRAPE_ENDPOINT")]
    endpoint: Option<String>,
    /// Output file for the gig list
    #[arg(short, long, env = "GIG_SCRAPE_OUTPUT")]
    output: Option<PathBuf>,
    /// Page driver to use
    #[arg(long, value_enum, env = "GIG_SCRAPE_ENGINE")]
    engine: Option<BrowserEngine>,
    /// Show the browser window
    #[arg(long, env = "GIG_SCRAPE_HEADFUL")]
    headful: bool,
    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    /// Flags and their environment variables win over the config file.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(venue) = &self.venue {
            config.venue = venue.clone();
        }
        if self.endpoint.is_some() {
            config.endpoint = self.endpoint.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if self.headful {
            config.headless = false;
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective config
    Show,
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();

    match cli.command {
        Commands::Run(args) => {
            let mut config = AppConfig::load(config_path.as_deref())?;
            args.apply(&mut config);

            let summary = run_scraper(&config).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::Venues { json } => {
            let venues = scraping::list_venues();
            if json {
                println!("{}", serde_json::to_string_pretty(&venues)?);
            } else {
                for venue in venues {
                    println!("{:<16} {:<20} {}", venue.id, venue.name, venue.url);
                }
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = AppConfig::load(config_path.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigCommands::Init { force } => {
                let path = config_path.unwrap_or_else(default_config_path);
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                let written = AppConfig::default().save(Some(&path))?;
                println!("Wrote {}", written.display());
            }
        },
        Commands::Expires { date } => match compute_expires_at(&date) {
            Some(expires_at) => println!("{expires_at}"),
            None => bail!("unrecognised date: {date}"),
        },
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Venue:     {}", summary.venue);
    println!("Listing:   {}", summary.endpoint);
    println!("Links:     {}", summary.links_harvested);
    println!("Extracted: {}", summary.gigs_extracted);
    if summary.links_failed > 0 {
        println!("Failed:    {}", summary.links_failed);
    }
    match &summary.output {
        Some(path) => println!("Saved to:  {path}"),
        None => println!("Nothing to save"),
    }
}
