use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use k3droot::config::AppConfig;
use k3droot::kubernetes::{ClientOptions, KubeClient};
use k3droot::picker::DialoguerPicker;
use k3droot::terminal::DockerBridge;
use k3droot::{Invocation, RootError, RootShell};

/// Root shell into any container of a local k3d cluster
#[derive(Debug, Parser)]
#[command(name = "k3droot", version, about)]
struct Cli {
    /// Target as "<pod>" or "<pod>: <container>"; omit to pick from running pods
    target: Option<String>,

    /// Namespace of the pod (default: namespace of the kubeconfig context)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long)]
    context: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Docker engine endpoint hosting the k3d nodes
    #[arg(long, value_name = "URL")]
    docker_host: Option<String>,

    /// Path to the k3droot config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Open the shell on the pod's node instead of inside the container
    #[arg(long)]
    node: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Command to run instead of the default shell (after `--`)
    #[arg(last = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; stdout belongs to the remote shell
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(cli.verbose))
        .init();

    // Both rustls backends may be linked in; pin the process-wide provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(cli));
    // The stdin reader of an ended session can still be parked in a blocking read
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Invocation failed ({:?}): {:?}", e.kind(), e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` (default `warn`), with `k3droot=debug` added by `-v`
fn log_filter(verbose: bool) -> EnvFilter {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if !verbose {
        return filter;
    }
    match "k3droot=debug".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

async fn run(cli: Cli) -> Result<(), RootError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if cli.docker_host.is_some() {
        config.docker.host = cli.docker_host.clone();
    }

    let client = KubeClient::new(&ClientOptions {
        kubeconfig: cli.kubeconfig.clone(),
        context: cli.context.clone(),
        fallback_namespace: config.cluster.fallback_namespace.clone(),
    })
    .await?;
    let bridge = DockerBridge::connect(config.docker.host.as_deref()).map_err(RootError::Engine)?;

    let invocation = Invocation {
        target: cli.target,
        namespace: cli.namespace,
        command: cli.command,
        on_node: cli.node,
    };

    let target = RootShell::new(&client, &bridge, &config)
        .run(&invocation, &DialoguerPicker)
        .await?;
    tracing::info!("Session into {} closed", target);
    Ok(())
}
