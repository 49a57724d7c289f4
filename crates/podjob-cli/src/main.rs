//! `podjob`: run one function call as an ephemeral Kubernetes pod.
mod config;
mod launch;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use podjob_observe::{LoggerLevel, init_logger};

use crate::config::{AppConfig, Overrides};

#[derive(Parser)]
#[command(name = "podjob")]
#[command(about = "Run function calls as ephemeral Kubernetes pods", long_about = None)]
struct Cli {
    /// JSON config file with `logger`, `cluster` and `runner` sections.
    #[arg(short, long, env = "PODJOB_CONFIG", default_value = "podjob.json")]
    config: PathBuf,

    /// Namespace for the job pods.
    #[arg(long, env = "PODJOB_NAMESPACE")]
    namespace: Option<String>,

    /// Kubeconfig context.
    #[arg(long, env = "PODJOB_CONTEXT")]
    context: Option<String>,

    /// Log filter, e.g. `info` or `podjob_core=debug,warn`.
    #[arg(long, env = "PODJOB_LOG")]
    log_level: Option<LoggerLevel>,

    /// Launch timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Container image for the job.
    #[arg(long)]
    image: Option<String>,

    /// Print collected metrics in prometheus text format on exit.
    #[arg(long)]
    dump_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch one function call and print its result.
    Launch {
        /// Function identifier passed to the job.
        function: String,
        /// Payload; JSON is embedded as-is, anything else as a string.
        #[arg(default_value = "{}")]
        payload: String,
    },
    /// Print the bundled pod template.
    Template,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Template = cli.command {
        println!("{}", podjob_kube::DEFAULT_POD_TEMPLATE);
        return Ok(());
    }

    let cfg = AppConfig::load(&cli.config)?.apply(Overrides {
        namespace: cli.namespace,
        context: cli.context,
        log_level: cli.log_level,
        timeout_ms: cli.timeout_ms,
        image: cli.image,
    });
    init_logger(&cfg.logger)?;
    info!(namespace = %cfg.cluster.namespace, image = %cfg.runner.image, "config loaded");

    match cli.command {
        Command::Launch { function, payload } => {
            launch::run(cfg, &function, &payload, cli.dump_metrics).await
        }
        Command::Template => Ok(()),
    }
}
