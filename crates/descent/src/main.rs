//! Descent
//!
//! Iterative DNS resolver: asks the root servers, follows referrals down to
//! the authoritative servers and prints the answer.

mod tracing_setup;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use console::style;
use descent_cache::{CacheConfig, ZoneCache};
use descent_config::Config;
use descent_dnssec::KeyTagVerifier;
use descent_proto::{Name, RecordType};
use descent_resolver::{IterativeResolver, NetTransport, QueryResult, ResolverConfig, RootHints};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use tracing_setup::{LogConfig, LogFormat, init_tracing, parse_log_level};

/// Descent - iterative DNS resolution from the root down
#[derive(Parser, Debug)]
#[command(name = "descent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a name
    Resolve {
        /// Domain name to resolve
        name: String,

        /// Record type (A, AAAA, MX, ...)
        #[arg(default_value = "A")]
        rtype: String,

        /// Request DNSSEC records and check RRSIG key tags
        #[arg(long)]
        dnssec: bool,

        /// Print resolver statistics after the answer
        #[arg(short, long)]
        stats: bool,
    },

    /// Validate configuration file
    Validate,

    /// Show version information
    Version,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_logging(config: &Config, cli_level: Option<&str>) {
    let level = parse_log_level(cli_level.unwrap_or(&config.logging.level));
    init_tracing(&LogConfig {
        level,
        format: LogFormat::parse(&config.logging.format),
    });
}

fn root_hints(config: &Config) -> Result<RootHints> {
    if config.resolver.root_hints.is_empty() {
        return Ok(RootHints::iana());
    }

    let mut entries = Vec::with_capacity(config.resolver.root_hints.len());
    for hint in &config.resolver.root_hints {
        let name: Name = hint
            .name
            .parse()
            .with_context(|| format!("Invalid root hint name {:?}", hint.name))?;
        entries.push((name, hint.address));
    }
    Ok(RootHints::new(entries))
}

fn build_resolver(config: &Config, dnssec: bool) -> Result<IterativeResolver> {
    let resolver_config = ResolverConfig {
        query_timeout: config.resolver.query_timeout(),
        total_timeout: config.resolver.total_timeout(),
        max_cname_chain: config.resolver.max_cname_chain,
        max_referrals: config.resolver.max_referrals,
        udp_payload_size: config.resolver.udp_payload_size,
        prefer_ipv6: config.resolver.prefer_ipv6,
    };

    let cache = Arc::new(ZoneCache::new(CacheConfig {
        capacity: config.cache.capacity,
        min_ttl: config.cache.min_ttl,
        max_ttl: config.cache.max_ttl,
        negative_ttl_cap: config.cache.negative_ttl_cap,
    }));
    let transport = Arc::new(NetTransport::new(config.resolver.udp_payload_size));

    let mut resolver = IterativeResolver::new(resolver_config, cache, transport)
        .with_root_hints(root_hints(config)?);
    if dnssec {
        resolver = resolver.with_verifier(Arc::new(KeyTagVerifier::new()));
    }
    Ok(resolver)
}

async fn resolve(config: &Config, name: &str, rtype: &str, dnssec: bool, stats: bool) -> Result<()> {
    let name: Name = name.parse().with_context(|| format!("Invalid name {name:?}"))?;
    let rtype: RecordType = rtype
        .parse()
        .with_context(|| format!("Unknown record type {rtype:?}"))?;

    let resolver = build_resolver(config, dnssec)?;
    debug!(%name, %rtype, "resolving");

    let started = Instant::now();
    let result = resolver
        .resolve_name(&name, rtype)
        .await
        .with_context(|| format!("Failed to resolve {name} {rtype}"))?;

    print_result(&result, started.elapsed().as_millis());

    if stats {
        let snapshot = resolver.stats().snapshot();
        println!();
        println!("{}", style(";; Resolver Statistics").cyan().bold());
        println!(";; queries sent:       {}", snapshot.queries_sent);
        println!(";; referrals followed: {}", snapshot.referrals_followed);
        println!(";; cache hits:         {}", snapshot.cache_hits);
        println!(";; truncation retries: {}", snapshot.truncation_retries);
        println!(";; server failures:    {}", snapshot.server_failures);
    }

    Ok(())
}

fn print_result(result: &QueryResult, elapsed_ms: u128) {
    print!("{}", result.message);
    println!();

    let status = if result.is_negative() {
        style(result.rcode().to_string()).yellow()
    } else {
        style(result.rcode().to_string()).green()
    };
    println!(";; Status: {status}");

    match result.server {
        Some(server) => println!(";; SERVER: {server}"),
        None => println!(";; SERVER: {}", style("(cache)").dim()),
    }
    if result.truncated {
        println!(";; Truncated over UDP, retried over TCP");
    }
    if let Some(validation) = &result.validation {
        let label = if validation.is_secure() {
            style(validation.to_string()).green()
        } else if validation.is_bogus() {
            style(validation.to_string()).red()
        } else {
            style(validation.to_string()).dim()
        };
        println!(";; DNSSEC: {label}");
    }
    println!(";; Query time: {elapsed_ms} msec");
}

fn validate(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        bail!("No configuration file given (use --config FILE)");
    };

    let config = Config::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    match config.validate() {
        Ok(()) => {
            println!(
                "{} Configuration is valid: {}",
                style("✓").green(),
                path.display()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", style("✗").red(), e);
            Err(e).context("Invalid configuration")
        }
    }
}

fn print_version() {
    println!(
        "{} {}",
        style("descent").cyan().bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            name,
            rtype,
            dnssec,
            stats,
        } => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(&config, cli.log_level.as_deref());
            resolve(&config, &name, &rtype, dnssec, stats).await
        }
        Commands::Validate => validate(cli.config.as_deref()),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}
