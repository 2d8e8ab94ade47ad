use std::time::Duration;

use clap::Parser;
use swapx_deploy::{cli::Cli, errors::ScriptError, utils::setup_client};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        priv_key,
        rpc_url,
        network,
        artifacts_dir,
        deployments_path,
        timeout_secs,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let client = setup_client(&priv_key, &rpc_url).await?;

    command
        .run(
            client,
            &network,
            &artifacts_dir,
            &deployments_path,
            Duration::from_secs(timeout_secs),
        )
        .await
}
