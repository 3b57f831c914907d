//! Command-line front end to the extraction pipeline.
//!
//! ```bash
//! # Extract an opportunity (needs LLM_API_KEY or OPENAI_API_KEY)
//! scrape extract https://www.example.org/volunteer
//!
//! # Only print the cleaned text
//! scrape extract example.org/volunteer --text-only
//!
//! # Extract and store in postgres (needs DATABASE_URL), skipping known URLs
//! scrape save https://www.example.org/volunteer
//!
//! # Propose selectors for a new domain and save them
//! scrape discover https://example.org/volunteer --save
//!
//! # Manage saved site configs
//! scrape configs list
//! scrape configs delete example.org
//! ```

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use volunteer_scraper::{
    bootstrap::build_service,
    config::Config,
    sites::{SiteConfig, SiteConfigInput},
    telemetry::init_tracing,
    urls::Domain,
};

#[derive(Parser)]
#[command(name = "scrape")]
#[command(about = "Extract volunteer opportunities from web pages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a page with its domain's saved rules and extract the opportunity.
    Extract {
        url: String,
        /// Print the cleaned text instead of calling the language model.
        #[arg(long)]
        text_only: bool,
    },
    /// Extract and store the opportunity unless the URL is already saved.
    Save { url: String },
    /// Work out include/exclude rules for an unconfigured domain.
    Discover {
        url: String,
        /// Store the proposed rules and recommended crawler.
        #[arg(long)]
        save: bool,
    },
    /// Saved site configs.
    Configs {
        #[command(subcommand)]
        action: ConfigsAction,
    },
}

#[derive(Subcommand)]
enum ConfigsAction {
    List,
    Show { domain: String },
    Delete { domain: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format());
    let service = build_service(&config).await?;

    match cli.command {
        Command::Extract { url, text_only } => {
            if text_only {
                let page = service.extract(&url).await?;
                println!("{}", page.text);
            } else {
                let outcome = service.scrape(&url).await?;
                println!("{}", serde_json::to_string_pretty(&outcome.opportunity)?);
            }
        }
        Command::Save { url } => {
            let saved = service.scrape_and_save(&url).await?;
            if !saved.created {
                eprintln!("already saved, nothing fetched");
            }
            println!("{}", serde_json::to_string_pretty(&saved.opportunity)?);
        }
        Command::Discover { url, save } => {
            let discovery = service.discover_selectors(&url).await?;
            println!("{}", serde_json::to_string_pretty(&discovery)?);

            if save {
                let input = SiteConfigInput {
                    domain: discovery.domain.to_string(),
                    include: discovery.rules.include.clone(),
                    exclude: discovery.rules.exclude.clone(),
                    crawler: Some(discovery.recommended_mode.crawler_name().to_string()),
                    wait: None,
                };
                let config = match input.validate() {
                    Ok(config) => config,
                    Err(reason) => bail!("proposed config rejected: {reason}"),
                };
                let saved = service.save_config(config).await?;
                eprintln!("saved config for {}", saved.domain);
            }
        }
        Command::Configs { action } => match action {
            ConfigsAction::List => {
                let configs = service.store().list().await?;
                println!("{}", serde_json::to_string_pretty(&configs)?);
            }
            ConfigsAction::Show { domain } => {
                let domain = Domain::parse(&domain)?;
                let found: Option<SiteConfig> = service.store().get(&domain).await?;
                match found {
                    Some(config) => println!("{}", serde_json::to_string_pretty(&config)?),
                    None => bail!("no configuration found for domain: {domain}"),
                }
            }
            ConfigsAction::Delete { domain } => {
                let domain = Domain::parse(&domain)?;
                if !service.store().delete(&domain).await? {
                    bail!("no configuration found for domain: {domain}");
                }
                eprintln!("deleted config for {domain}");
            }
        },
    }

    Ok(())
}
