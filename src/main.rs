//! CLI entry point for addrscout.
//!
//! This binary wraps the discovery library: full discovery, the individual
//! strategies, the platform table, configuration management, and node key
//! pair utilities.

use addrscout::{
    crypto::NodeKeyPair,
    discovery::{coordinator, platform, ConfigScraper, DiscoveryCoordinator, Prober},
    utils::{raise_nofile_limit, LimitAdjustment, ScoutConfig, DEFAULT_CONFIG_FILE},
};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// addrscout - find the addresses this host can advertise to peers
#[derive(Parser)]
#[command(name = "addrscout")]
#[command(about = "Discover this host's candidate network addresses")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run full discovery: outbound probe plus the platform supplement
    Discover {
        /// Probe target (defaults to the configured target)
        #[arg(short, long)]
        target: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Only run the outbound probe towards a target
    Probe {
        /// Hostname or address literal
        target: String,
    },
    /// Only scrape the network-configuration tool
    Scrape {
        /// Operating system identifier to scrape as
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// List the platform table
    Platforms,
    /// Generate and validate configuration files
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Node key pair utilities
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        file: Option<PathBuf>,
    },
    /// Show current configuration
    Show {
        /// Show only specific section (discovery, logging, limits)
        #[arg(short, long)]
        section: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Generate a new node key pair
    GenerateKeypair,
    /// Print the public key belonging to a private key
    DerivePubkey {
        /// Private key as printed by generate-keypair
        privkey: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = ScoutConfig::load(cli.config.as_deref())?;

    // Initialize logging
    setup_logging(cli.verbose, cli.quiet, &config.logging.level)?;

    if config.limits.raise_nofile {
        adjust_limits(config.limits.min_nofile);
    }

    match cli.command {
        Commands::Discover {
            target,
            format,
            timeout,
        } => handle_discover_command(target, format, timeout, &config).await,
        Commands::Probe { target } => handle_probe_command(target, &config).await,
        Commands::Scrape { platform } => handle_scrape_command(platform, &config).await,
        Commands::Platforms => handle_platforms_command(),
        Commands::Config { action } => handle_config_commands(action, &config),
        Commands::Admin { action } => handle_admin_commands(action),
    }
}

fn setup_logging(verbose: u8, quiet: bool, configured: &str) -> Result<()> {
    let log_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => configured,
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn adjust_limits(min_nofile: u64) {
    match raise_nofile_limit(min_nofile) {
        Ok(LimitAdjustment::Raised { from, to }) => {
            debug!("Raised open-file limit from {} to {}", from, to);
        }
        Ok(LimitAdjustment::Rejected { soft }) => {
            warn!("Open-file limit stays at {}", soft);
        }
        Ok(_) => {}
        Err(e) => warn!("Could not inspect open-file limit: {}", e),
    }
}

async fn handle_discover_command(
    target: Option<String>,
    format: OutputFormat,
    timeout: Option<u64>,
    config: &ScoutConfig,
) -> Result<()> {
    let coordinator = DiscoveryCoordinator::new(config);
    let limit = Duration::from_secs(timeout.unwrap_or(config.discovery.timeout_secs));

    info!(
        "Discovering addresses towards {}",
        target.as_deref().unwrap_or(coordinator.default_target())
    );

    let report = tokio::time::timeout(limit, coordinator.report(target.as_deref()))
        .await
        .map_err(|_| anyhow::anyhow!("Discovery did not finish within {}s", limit.as_secs()))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Pretty => {
            println!("Discovered Addresses");
            println!("====================");
            println!("Target: {}", report.target);
            println!("Platform: {}", report.platform);
            println!("At: {}", report.discovered_at.format("%Y-%m-%d %H:%M:%S UTC"));
            for address in &report.addresses {
                println!("  {}", address);
            }
            println!("✓ {} candidate address(es)", report.addresses.len());
        }
    }

    Ok(())
}

async fn handle_probe_command(target: String, config: &ScoutConfig) -> Result<()> {
    let prober = Prober::new(config.discovery.probe_port);
    let addresses = tokio::task::spawn_blocking(move || prober.probe(&target)).await?;

    if addresses.is_empty() {
        println!("No route found");
    }
    for address in addresses {
        println!("{}", address);
    }
    Ok(())
}

async fn handle_scrape_command(platform: Option<String>, config: &ScoutConfig) -> Result<()> {
    let mut scraper = ConfigScraper::new(config.discovery.locale.clone());
    if let Some(platform) = platform {
        scraper = scraper.with_platform(platform);
    }

    let addresses = Arc::new(scraper).scrape().await?;
    for address in &addresses {
        println!("{}", address);
    }
    println!("✓ {} address(es) scraped", addresses.len());
    Ok(())
}

fn handle_platforms_command() -> Result<()> {
    let current = platform::current_platform();

    println!("Platform Table");
    println!("==============");
    for (name, family) in platform::platforms() {
        let profile = platform::profile_for(name)?;
        let marker = if name == current { "*" } else { " " };
        println!(
            "{} {:<10} {:<6} {} {}",
            marker,
            name,
            family.name(),
            profile.tool,
            profile.args.join(" ")
        );
    }

    if !coordinator::is_supported(current) {
        println!("Running platform '{}' is not in the table; only probing is available", current);
    }
    Ok(())
}

fn handle_config_commands(action: ConfigCommands, config: &ScoutConfig) -> Result<()> {
    match action {
        ConfigCommands::Generate { output } => {
            let default_config = ScoutConfig::default();
            let output_path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

            default_config.save(&output_path)?;
            println!("✓ Configuration generated: {}", output_path.display());
        }
        ConfigCommands::Validate { file } => {
            let config_to_validate = if let Some(path) = file {
                ScoutConfig::from_file(path)?
            } else {
                config.clone()
            };

            config_to_validate.validate()?;
            println!("✓ Configuration is valid");
        }
        ConfigCommands::Show { section } => {
            let config_str = match section.as_deref() {
                None => config.to_toml_string()?,
                Some("discovery") => toml::to_string_pretty(&config.discovery)?,
                Some("logging") => toml::to_string_pretty(&config.logging)?,
                Some("limits") => toml::to_string_pretty(&config.limits)?,
                Some(other) => return Err(anyhow::anyhow!("Unknown section: {}", other)),
            };
            println!("{}", config_str);
        }
    }
    Ok(())
}

fn handle_admin_commands(action: AdminCommands) -> Result<()> {
    match action {
        AdminCommands::GenerateKeypair => {
            let keypair = NodeKeyPair::generate();
            warn!("The private key below grants control of the node identity - keep it secret!");
            println!("Private key: {}", keypair.private_string());
            println!("Public key:  {}", keypair.public_string());
        }
        AdminCommands::DerivePubkey { privkey } => {
            let keypair = NodeKeyPair::from_private_string(&privkey)?;
            println!("{}", keypair.public_string());
        }
    }
    Ok(())
}
