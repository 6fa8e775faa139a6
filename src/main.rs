use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use consulator::utils::{DEFAULT_ARRAY_GLUE, DEFAULT_CONSUL_ADDR};
use consulator::{
    load_paths, load_stdin, run_pipeline, ConsulStore, FormatFlags, InputSource, StoreConfig,
    SyncConfig, SyncMode,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Consulator - import and sync key/value data into Consul
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Imports data into consul
    Import(RunArgs),
    /// Syncs data into consul (like import, but with deletes)
    Sync(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Parse stdin as YAML
    #[arg(long)]
    yaml: bool,

    /// Parse stdin as JSON
    #[arg(long)]
    json: bool,

    /// Parse stdin as a tarball
    #[arg(long)]
    tar: bool,

    /// Just output but not apply changes
    #[arg(long)]
    dry: bool,

    /// Output more detailed information
    #[arg(long)]
    verbose: bool,

    /// Glue to use for joining array values
    #[arg(long, default_value = DEFAULT_ARRAY_GLUE)]
    glue: String,

    /// Consul tree to work under
    #[arg(long, default_value = "")]
    prefix: String,

    /// Address of the Consul HTTP API
    #[arg(long, env = "CONSUL_HTTP_ADDR", default_value = DEFAULT_CONSUL_ADDR)]
    addr: String,

    /// ACL token for the Consul HTTP API
    #[arg(long, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Consul datacenter to target
    #[arg(long, env = "CONSUL_DATACENTER")]
    datacenter: Option<String>,

    /// Files or directories to read instead of stdin
    paths: Vec<PathBuf>,
}

impl Command {
    fn into_parts(self) -> (SyncMode, RunArgs) {
        match self {
            Command::Import(args) => (SyncMode::Import, args),
            Command::Sync(args) => (SyncMode::Sync, args),
        }
    }
}

impl RunArgs {
    fn store_config(&self) -> StoreConfig {
        let address = if self.addr.contains("://") {
            self.addr.clone()
        } else {
            format!("http://{}", self.addr)
        };
        StoreConfig {
            address,
            token: self.token.clone(),
            datacenter: self.datacenter.clone(),
        }
    }

    fn sync_config(&self, mode: SyncMode) -> Result<SyncConfig, consulator::ConfigError> {
        let formats = FormatFlags {
            yaml: self.yaml,
            json: self.json,
            tar: self.tar,
        };
        Ok(SyncConfig::new(mode, formats, self.paths.clone(), &self.prefix)?
            .with_dry_run(self.dry)
            .with_verbose(self.verbose)
            .with_glue(self.glue.clone()))
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (mode, args) = cli.command.into_parts();
    let config = args.sync_config(mode)?;

    let local = match &config.source {
        InputSource::Stdin(format) => load_stdin(*format, &config.glue)?,
        InputSource::Paths(paths) => load_paths(paths, &config.glue)?,
    };
    info!(keys = local.len(), prefix = %config.prefix, "Loaded local data");

    let store = ConsulStore::new(args.store_config()).context("Failed to set up Consul client")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_pipeline(&config, &local, &store, &mut out).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr, stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print().ok();
            return ExitCode::from(code);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
