//! Command-line entry point for zombie

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use consul_zombie::api::ClientCache;
use consul_zombie::config::Config;
use consul_zombie::deregister::{self, DeregisterOptions};
use consul_zombie::discover;
use consul_zombie::output::{self, Verbosity};

/// Default port for talking to remote consul agents
const DEFAULT_REMOTE_PORT: u16 = 8500;

/// Search (hunt) or deregister (kill) stale Consul services
#[derive(Parser, Debug)]
#[command(name = "zombie")]
#[command(about = "List and deregister dead consul services")]
#[command(version)]
struct Args {
    /// Limit search by service ID or name (regexp)
    #[arg(short = 's', long = "service", default_value = "")]
    service: String,

    /// Limit search by tag
    #[arg(short = 't', long = "tag", default_value = "")]
    tag: String,

    /// Address with port of the "local" agent, used to list services
    #[arg(long = "local-addr", env = "CONSUL_HTTP_ADDR")]
    local_addr: Option<String>,

    /// Port to use when connecting to remote agents
    #[arg(long = "remote-port")]
    remote_port: Option<u16>,

    /// ACL token, used in all api queries
    #[arg(long, env = "CONSUL_HTTP_TOKEN")]
    token: Option<String>,

    /// Per-minute rate of deregistration calls. 0 means no enforced limit,
    /// calls will be executed as fast as possible
    #[arg(long, default_value_t = 0)]
    rate: i64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Save the connection settings as defaults for future runs
    #[arg(long)]
    save_defaults: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List matching services and their health
    #[command(visible_aliases = ["find", "search"])]
    Hunt,

    /// Deregister failing services among the matches
    Kill {
        /// Force killing of all matches, including healthy services
        #[arg(short = 'f', long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (for debugging, set RUST_LOG=debug)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    if args.rate < 0 {
        bail!("rate must be >= 0");
    }
    let rate_per_minute = u32::try_from(args.rate).context("rate is too large")?;

    let saved = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "unable to load saved defaults, ignoring");
        Config::default()
    });

    let settings = saved.resolve(
        args.local_addr,
        args.token,
        args.remote_port,
        DEFAULT_REMOTE_PORT,
    );

    if args.save_defaults {
        let to_save = Config {
            local_addr: (!settings.local_addr.is_empty()).then(|| settings.local_addr.clone()),
            token: (!settings.token.is_empty()).then(|| settings.token.clone()),
            remote_port: Some(settings.remote_port),
        };
        to_save.save()?;
    }

    let cache = ClientCache::new();
    let instances = discover::discover(
        &cache,
        &settings.local_addr,
        &settings.token,
        &args.service,
        &args.tag,
    )
    .await?;

    match args.command {
        Command::Hunt => {
            let verbosity = Verbosity::from_count(args.verbose);
            print!("{}", output::render_list(&instances, verbosity));
        }
        Command::Kill { force } => {
            let opts = DeregisterOptions {
                remote_port: settings.remote_port,
                token: settings.token,
                force,
                rate_per_minute,
            };
            let outcome = deregister::deregister(&cache, &instances, &opts).await?;
            eprintln!(
                "deregistered {} services, {} failed",
                outcome.deregistered.len(),
                outcome.failed.len()
            );
        }
    }

    Ok(())
}
