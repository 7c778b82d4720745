use clap::{Parser, Subcommand};
use ferrous_resolver_domain::{AddressFamily, CliOverrides};
use std::process::ExitCode;
use tracing::{debug, info};

mod bootstrap;
mod di;

#[derive(Parser)]
#[command(name = "ferrous-resolver")]
#[command(version)]
#[command(about = "Ferrous Resolver - asynchronous DNS stub resolver with caching")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Upstream server (IP or IP:port), may be repeated
    #[arg(short = 's', long = "server", value_name = "ADDR")]
    servers: Vec<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Attempts per upstream server
    #[arg(long)]
    attempts: Option<u32>,

    /// Disable the answer cache
    #[arg(long)]
    no_cache: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a name to its addresses
    Resolve {
        name: String,

        /// Address family: ipv4, ipv6 or both
        #[arg(short = 'f', long)]
        family: Option<AddressFamily>,
    },
    /// Find the hostname of an IPv4 or IPv6 address
    Reverse { address: String },
    /// Resolve several names concurrently
    Many {
        #[arg(required = true)]
        names: Vec<String>,

        /// Address family: ipv4, ipv6 or both
        #[arg(short = 'f', long)]
        family: Option<AddressFamily>,
    },
}

impl Command {
    fn family(&self) -> Option<AddressFamily> {
        match self {
            Self::Resolve { family, .. } | Self::Many { family, .. } => *family,
            Self::Reverse { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        upstream_servers: Some(cli.servers.clone()),
        attempt_timeout_ms: cli.timeout_ms,
        attempts_per_server: cli.attempts,
        family: cli.command.family(),
        disable_cache: cli.no_cache,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);
    bootstrap::log_config_summary(cli.config.as_deref(), &config);

    info!("Starting Ferrous Resolver v{}", env!("CARGO_PKG_VERSION"));

    let use_cases = di::UseCases::new(&config)?;
    let family = config.resolver.family;

    let succeeded = match &cli.command {
        Command::Resolve { name, .. } => match use_cases.resolve_name.execute(name, family).await {
            Ok(addresses) => {
                for address in addresses {
                    println!("{}", address);
                }
                true
            }
            Err(e) => {
                eprintln!("{}: {}", name, e);
                false
            }
        },
        Command::Reverse { address } => match use_cases.reverse_lookup.execute(address).await {
            Ok(hostname) => {
                println!("{}", hostname);
                true
            }
            Err(e) => {
                eprintln!("{}: {}", address, e);
                false
            }
        },
        Command::Many { names, .. } => {
            let mut all_ok = true;
            for (name, result) in use_cases.resolve_many.execute(names, family).await {
                match result {
                    Ok(addresses) => {
                        let joined: Vec<String> =
                            addresses.iter().map(ToString::to_string).collect();
                        println!("{}\t{}", name, joined.join(" "));
                    }
                    Err(e) => {
                        all_ok = false;
                        eprintln!("{}: {}", name, e);
                    }
                }
            }
            all_ok
        }
    };

    let stats = use_cases.cache_stats.execute();
    debug!(
        entries = stats.entries,
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        "Cache statistics"
    );

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
