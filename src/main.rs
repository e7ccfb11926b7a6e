use anyhow::Context;
use redock::cli::{Args, ConfigDiscovery, DeployInvocation, ExecutionMode};
use redock::{DeployTarget, Deployer, DockerEngine, Outcome};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.mode() {
        ExecutionMode::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
        }
        ExecutionMode::Deploy(invocation) => {
            init_logging(invocation.verbose);

            let code = run_deploy(invocation).await;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }
}

/// Initialize logging. Diagnostics go to stderr so the tailed container
/// output owns stdout.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "redock=debug" } else { "redock=info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the deploy target and connect to the engine.
async fn prepare(invocation: DeployInvocation) -> anyhow::Result<(DockerEngine, DeployTarget)> {
    let defaults = ConfigDiscovery::discover(invocation.config_override.as_deref())?;
    let target = defaults.resolve(invocation.overrides)?;

    let engine = DockerEngine::connect()
        .await
        .context("could not reach a container engine")?;

    Ok((engine, target))
}

/// Run the workflow and map the result onto a process exit code: 0 for both
/// terminal outcomes, 1 for setup failures, one distinct code per failed
/// stage otherwise.
async fn run_deploy(invocation: DeployInvocation) -> i32 {
    let (engine, target) = match prepare(invocation).await {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    info!(
        service = %target.service,
        host_port = target.host_port,
        container_port = target.container_port,
        "redeploying"
    );

    match Deployer::new(engine, target).run().await {
        Ok(Outcome::Interrupted) => {
            info!("detached from logs; container left running");
            0
        }
        Ok(Outcome::ContainerExited) => {
            info!("container exited");
            0
        }
        Err(e) => {
            error!(stage = %e.stage(), "{}", e);
            e.exit_code()
        }
    }
}
