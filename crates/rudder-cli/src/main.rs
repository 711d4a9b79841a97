use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rudder_core::{ClusterGateway, LogOptions, OpsResult, RudderConfig, config::DEFAULT_LOG_TAIL};
use rudder_kube::KubeGateway;

mod commands;
mod resolver;

use commands::logs::LogTarget;
use resolver::ParameterResolver;

#[derive(Parser)]
#[command(
    name = "rudder",
    about = "Rudder — deployment rollout and diagnostic toolkit",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Cluster API endpoint (default: a local kubectl proxy)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to rudder.toml (default: ./rudder.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Prompt for missing arguments instead of failing
    #[arg(short, long, global = true)]
    interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List deployments in one namespace, or across all namespaces
    List {
        #[arg(short, long)]
        namespace: Option<String>,
    },
    /// Show a deployment's replicas, conditions, and pods
    Info {
        name: Option<String>,
        #[arg(short, long)]
        namespace: Option<String>,
    },
    /// Change a deployment's replica count
    Scale {
        name: Option<String>,
        #[arg(short, long)]
        namespace: Option<String>,
        #[arg(short, long)]
        replicas: Option<u32>,
    },
    /// Evaluate a deployment's health and print the verdict
    Diagnostic {
        name: Option<String>,
        #[arg(short, long)]
        namespace: Option<String>,
        /// Include per-pod findings
        #[arg(long)]
        pods: bool,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Restart a deployment or query its rollout state
    Rollout {
        #[command(subcommand)]
        action: RolloutAction,
    },
    /// Print pod logs, for one pod or a whole deployment
    Logs {
        /// Deployment whose pods to read
        name: Option<String>,
        /// Read one pod directly instead of a deployment
        #[arg(long, conflicts_with = "name")]
        pod: Option<String>,
        #[arg(short, long)]
        namespace: Option<String>,
        /// Trailing lines per pod
        #[arg(long)]
        tail: Option<u32>,
        /// Keep streaming new lines
        #[arg(short, long)]
        follow: bool,
    },
}

#[derive(Subcommand)]
enum RolloutAction {
    /// Trigger a restart and monitor it to a terminal outcome
    Restart {
        name: Option<String>,
        #[arg(short, long)]
        namespace: Option<String>,
        /// Monitoring deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Seconds between polls
        #[arg(long)]
        poll_interval: Option<u64>,
    },
    /// Evaluate the rollout state from one snapshot
    Status {
        name: Option<String>,
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(1);
        }
    };

    let api_url = cli
        .api_url
        .as_deref()
        .or(config.api_url())
        .unwrap_or(KubeGateway::DEFAULT_API_URL);
    let gateway = KubeGateway::new(api_url, config.bearer_token().map(str::to_string));
    let mut resolver = ParameterResolver::from_stdin(cli.interactive);

    match dispatch(cli.command, gateway, &config, &mut resolver).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RudderConfig> {
    if let Some(path) = path {
        return RudderConfig::from_file(path);
    }
    let default = Path::new("rudder.toml");
    if default.exists() {
        return RudderConfig::from_file(default);
    }
    Ok(RudderConfig::default())
}

async fn dispatch<G: ClusterGateway, R: BufRead>(
    command: Commands,
    gateway: G,
    config: &RudderConfig,
    resolver: &mut ParameterResolver<R>,
) -> OpsResult<u8> {
    match command {
        Commands::List { namespace } => commands::list::run(gateway, namespace.as_deref()).await,
        Commands::Info { name, namespace } => {
            let name: String = resolver.require(name, "deployment name")?;
            let namespace = resolver.optional(namespace, "namespace (blank to search all)")?;
            commands::info::run(gateway, &name, namespace.as_deref()).await
        }
        Commands::Scale {
            name,
            namespace,
            replicas,
        } => {
            let name: String = resolver.require(name, "deployment name")?;
            let namespace = resolver.optional(namespace, "namespace (blank to search all)")?;
            let replicas = resolver.require(replicas, "replicas")?;
            commands::scale::run(gateway, &name, namespace.as_deref(), replicas).await
        }
        Commands::Diagnostic {
            name,
            namespace,
            pods,
            format,
        } => {
            let name: String = resolver.require(name, "deployment name")?;
            let namespace = resolver.optional(namespace, "namespace (blank to search all)")?;
            commands::diagnostic::run(
                gateway,
                &name,
                namespace.as_deref(),
                pods,
                &format,
                config.restart_threshold(),
            )
            .await
        }
        Commands::Rollout { action } => match action {
            RolloutAction::Restart {
                name,
                namespace,
                timeout,
                poll_interval,
            } => {
                let name: String = resolver.require(name, "deployment name")?;
                let namespace = resolver.optional(namespace, "namespace (blank to search all)")?;
                let timeout = timeout
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.rollout_timeout());
                let poll_interval = poll_interval
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.poll_interval());
                commands::rollout::restart(
                    gateway,
                    &name,
                    namespace.as_deref(),
                    timeout,
                    poll_interval,
                    config.fetch_retry_limit(),
                )
                .await
            }
            RolloutAction::Status { name, namespace } => {
                let name: String = resolver.require(name, "deployment name")?;
                let namespace = resolver.optional(namespace, "namespace (blank to search all)")?;
                commands::rollout::status(gateway, &name, namespace.as_deref()).await
            }
        },
        Commands::Logs {
            name,
            pod,
            namespace,
            tail,
            follow,
        } => {
            let target = match pod {
                Some(pod) => LogTarget::Pod(pod),
                None => LogTarget::Deployment(resolver.require(name, "deployment name")?),
            };
            let opts = LogOptions {
                tail_lines: Some(tail.unwrap_or(DEFAULT_LOG_TAIL)),
                follow,
            };
            commands::logs::run(gateway, target, namespace.as_deref(), &opts).await
        }
    }
}
