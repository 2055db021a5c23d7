// # ipagent - dynamic DNS updater
//
// Runs one pass and exits; schedule it with cron or a systemd timer.
//
// The binary is a thin integration layer:
// 1. Parse command-line flags
// 2. Load and validate the TOML configuration
// 3. Initialize logging (stdout, or syslog when `logging = true`)
// 4. Wire the HTTP IP source, Cloudflare provider and file cache into an
//    `UpdateAgent` and run it once
// 5. Map the outcome to an exit code
//
// All DNS logic lives in ipagent-core.
//
// ## Usage
//
// ```bash
// ipagent --config /etc/ipagent.toml
// ipagent --dry          # decide and log, change nothing
// IPAGENT_LOG=debug ipagent
// ```

use anyhow::Result;
use clap::Parser;
use ipagent_core::config::DEFAULT_CONFIG_PATH;
use ipagent_core::{Config, Error, FileIpCache, RunOutcome, UpdateAgent};
use ipagent_ip_http::HttpIpSource;
use ipagent_provider_cloudflare::CloudflareProvider;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
const LOG_ENV: &str = "IPAGENT_LOG";

/// Exit codes
///
/// - 0: Records are current (updated, or nothing to do)
/// - 1: Configuration error or a failed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentExitCode {
    Success = 0,
    Failure = 1,
}

impl From<AgentExitCode> for ExitCode {
    fn from(code: AgentExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep Cloudflare DNS records pointed at this machine's public IP
#[derive(Debug, Parser)]
#[command(name = "ipagent", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Decide and log changes without sending them to Cloudflare
    #[arg(long)]
    dry: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(Error::ConfigNotFound(path)) => {
            eprintln!("No config file found at {}", path);
            return AgentExitCode::Failure.into();
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return AgentExitCode::Failure.into();
        }
    };

    if let Err(e) = init_tracing(config.logging) {
        eprintln!("{}", e);
        return AgentExitCode::Failure.into();
    }

    // One pass, strictly sequential
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AgentExitCode::Failure.into();
        }
    };

    let result = rt.block_on(run(&config, cli.dry));

    match &result {
        Ok(RunOutcome::Unchanged { .. }) => {}
        Ok(RunOutcome::Reconciled { ip, summary }) => {
            info!(
                "Records for {} are current ({} created, {} updated, {} unchanged)",
                ip, summary.created, summary.updated, summary.unchanged
            );
        }
        Err(e) => error!("{}", e),
    }

    exit_code(&result).into()
}

/// A dry run that decided changes still succeeds
fn exit_code(result: &Result<RunOutcome>) -> AgentExitCode {
    match result {
        Ok(_) => AgentExitCode::Success,
        Err(_) => AgentExitCode::Failure,
    }
}

/// Build the components and run the agent once
async fn run(config: &Config, dry_run: bool) -> Result<RunOutcome> {
    if dry_run {
        warn!("Running in dry-run mode - no DNS records will be changed");
    }

    let ip_source = HttpIpSource::from_config(&config.ip_service)?;
    let provider = CloudflareProvider::from_config(&config.cloudflare)?;
    let cache = match &config.cache_path {
        Some(path) => FileIpCache::new(path),
        None => FileIpCache::in_temp_dir(),
    };

    info!(
        "Managing {} record(s) in zone {}",
        config.domain_list().len(),
        config.cloudflare.zone_id
    );

    let agent = UpdateAgent::new(
        Box::new(ip_source),
        Box::new(provider),
        Box::new(cache),
        config,
    )?
    .with_dry_run(dry_run);

    Ok(agent.run_once().await?)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
fn init_tracing(use_syslog: bool) -> Result<()> {
    if use_syslog {
        if init_syslog()? {
            return Ok(());
        }
        eprintln!("syslog is unavailable, logging to stdout");
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// Route logs to the system logger; `Ok(false)` if it cannot be opened
#[cfg(all(unix, not(target_os = "macos")))]
fn init_syslog() -> Result<bool> {
    let Some(writer) =
        syslog_tracing::Syslog::new(c"ipagent", Default::default(), Default::default())
    else {
        return Ok(false);
    };

    // syslog stamps its own time
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(true)
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn init_syslog() -> Result<bool> {
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ipagent_core::ApplySummary;
    use std::net::IpAddr;

    fn addr() -> IpAddr {
        "203.0.113.7".parse().unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["ipagent"]);
        assert_eq!(cli.config, PathBuf::from("./ipagent.toml"));
        assert!(!cli.dry);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["ipagent", "--config", "/etc/ipagent.toml", "--dry"]);
        assert_eq!(cli.config, PathBuf::from("/etc/ipagent.toml"));
        assert!(cli.dry);
    }

    #[test]
    fn test_unchanged_exits_zero() {
        let result = Ok(RunOutcome::Unchanged { ip: addr() });
        assert_eq!(exit_code(&result), AgentExitCode::Success);
    }

    #[test]
    fn test_dry_run_with_pending_changes_exits_zero() {
        let summary = ApplySummary {
            created: 1,
            updated: 2,
            unchanged: 0,
            dry_run: true,
        };
        let result = Ok(RunOutcome::Reconciled { ip: addr(), summary });
        assert_eq!(exit_code(&result), AgentExitCode::Success);
    }

    #[test]
    fn test_failed_run_exits_one() {
        let result: Result<RunOutcome> = Err(anyhow::anyhow!("remote fetch failed"));
        assert_eq!(exit_code(&result), AgentExitCode::Failure);
        assert_eq!(AgentExitCode::Failure as u8, 1);
    }
}
