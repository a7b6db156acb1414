//! cluster-om command line tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cluster_om::inspection::{
    GsqlRunner, InspectionItem, ReturnTypeCheck, SysadminUserCheck,
};
use cluster_om::{
    CheckScope, ClusterStatusAggregator, CommandRunner, HealthExpectations,
    HostnameMappingChecker, InstallContext, OmConfig, ScriptLocator, ShellCommandRunner,
};
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cluster operations and inspection tool
#[derive(Parser)]
#[command(name = "cluster-om")]
#[command(about = "Operational checks for a distributed database cluster")]
#[command(version)]
struct Cli {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true, env = "CLUSTER_OM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check cluster or single node health
    Status {
        /// Node id to check; 0 checks the whole cluster
        #[arg(short, long, default_value_t = 0)]
        node: u32,

        /// User the temporary status file is named after
        #[arg(short, long, env = "USER", default_value = "omm")]
        user: String,

        /// Cluster state counted as healthy (repeatable)
        #[arg(long = "normal-state", conflicts_with = "any_state")]
        normal_states: Vec<String>,

        /// Accept any cluster state
        #[arg(long)]
        any_state: bool,

        /// Required redistribution label
        #[arg(long)]
        expect_redistributing: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify every node answers to, and is configured with, its own name
    CheckHostname {
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Print the path of a named operational script
    Script {
        name: String,

        /// Print the python invocation instead of the bare path
        #[arg(long)]
        command: bool,
    },

    /// Run an inspection item
    Inspect { item: Item },
}

#[derive(Clone, Copy, ValueEnum)]
enum Item {
    ReturnType,
    SysadminUser,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = OmConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellCommandRunner::default());

    match cli.command {
        Commands::Status {
            node,
            user,
            normal_states,
            any_state,
            expect_redistributing,
            json,
        } => {
            let mut expectations = HealthExpectations::default();
            if any_state {
                expectations.normal_states.clear();
            } else if !normal_states.is_empty() {
                expectations.normal_states = normal_states;
            }
            expectations.redistributing = expect_redistributing;

            let aggregator = ClusterStatusAggregator::new(runner, config.status.clone());
            let outcome = aggregator
                .check_status(&user, CheckScope::from_node_id(node), &expectations)
                .await
                .context("Failed to obtain the cluster status")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", outcome.report);
            }
            Ok(exit_code(outcome.healthy))
        }
        Commands::CheckHostname { nodes } => {
            let checker = HostnameMappingChecker::new(runner, config.hostname.clone());
            let verified = checker.check_all(&nodes).await?;
            for verification in &verified {
                println!("{}: OK", verification.node);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Script { name, command } => {
            let locator = ScriptLocator::new(InstallContext::detect(&config.install));
            if command {
                println!("{}", locator.command(&name)?);
            } else {
                println!("{}", locator.resolve(&name)?.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect { item } => {
            let item: Box<dyn InspectionItem> = match item {
                Item::ReturnType => Box::new(ReturnTypeCheck),
                Item::SysadminUser => Box::new(SysadminUserCheck::new(config.sql.user.clone())),
            };
            let gsql = GsqlRunner::new(runner, config.sql.clone());
            let result = item.check(&gsql).await?;
            print!("{}", result);
            Ok(exit_code(result.passed()))
        }
    }
}

fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
