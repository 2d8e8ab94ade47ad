//! Definitions of CLI arguments and commands for the deploy scripts

use std::{
    fmt::{self, Display},
    sync::Arc,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use ethers::providers::Middleware;

use crate::{
    commands::{deploy, deploy_logic, deploy_proxy, upgrade},
    constants::{
        SWAPX_CONTRACT_KEY, SWAPX_CONTRACT_NAME, SWAP_V2_CONTRACT_KEY, SWAP_V2_CONTRACT_NAME,
        SWAP_V3_CONTRACT_KEY, SWAP_V3_CONTRACT_NAME,
    },
    errors::ScriptError,
    submitter::EthersSubmitter,
};

/// The CLI for the SwapX contract management scripts
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    // TODO: Better key management
    #[arg(short, long, env = "PRIV_KEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long)]
    pub rpc_url: String,

    /// Identifier of the network profile to deploy against
    #[arg(short, long)]
    pub network: String,

    /// Directory containing the compiled contract artifacts
    #[arg(short, long, default_value = "artifacts")]
    pub artifacts_dir: String,

    /// Path to the `deployments.json` record file
    #[arg(short, long, default_value = "deployments.json")]
    pub deployments_path: String,

    /// Seconds to wait for each transaction confirmation before giving up
    /// locally (the transaction may still confirm on-chain afterwards)
    #[arg(short, long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The subcommands of the deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the full SwapX system: logic libraries, implementation,
    /// and the initialized proxy
    Deploy(DeployArgs),
    /// Deploy a single logic contract
    DeployLogic(DeployLogicArgs),
    /// Deploy the upgradeable proxy against an existing implementation
    DeployProxy(DeployProxyArgs),
    /// Retarget an existing proxy to a new implementation
    Upgrade(UpgradeArgs),
}

impl Command {
    /// Dispatch the parsed command
    pub async fn run(
        self,
        client: Arc<impl Middleware + 'static>,
        network_id: &str,
        artifacts_dir: &str,
        deployments_path: &str,
        wait: Duration,
    ) -> Result<(), ScriptError> {
        let submitter = EthersSubmitter::new(client);
        match self {
            Command::Deploy(args) => {
                deploy(
                    args,
                    &submitter,
                    network_id,
                    artifacts_dir,
                    deployments_path,
                    wait,
                )
                .await
            }
            Command::DeployLogic(args) => {
                deploy_logic(
                    args,
                    &submitter,
                    network_id,
                    artifacts_dir,
                    deployments_path,
                    wait,
                )
                .await
            }
            Command::DeployProxy(args) => {
                deploy_proxy(
                    args,
                    &submitter,
                    network_id,
                    artifacts_dir,
                    deployments_path,
                    wait,
                )
                .await
            }
            Command::Upgrade(args) => {
                upgrade(args, &submitter, network_id, deployments_path, wait).await
            }
        }
    }
}

/// Deploy the full SwapX system in dependency order
#[derive(Args)]
pub struct DeployArgs {
    /// Address of the owner for both the proxy admin contract
    /// and the underlying SwapX contract
    #[arg(short, long)]
    pub owner: String,

    /// Acknowledge that the proxy's initializer delegatecalls into the
    /// implementation during deployment
    #[arg(long)]
    pub unsafe_allow_delegatecall: bool,
}

/// Deploy a single logic contract
#[derive(Args)]
pub struct DeployLogicArgs {
    /// The logic contract to deploy
    #[arg(short, long)]
    pub contract: LogicContract,
}

/// The deployable logic contracts
#[derive(ValueEnum, Copy, Clone)]
pub enum LogicContract {
    /// The SwapV2 router logic library
    SwapV2,
    /// The SwapV3 router logic library
    SwapV3,
    /// The SwapX implementation contract
    SwapX,
}

impl LogicContract {
    /// The artifact name of the contract
    pub fn artifact_name(self) -> &'static str {
        match self {
            LogicContract::SwapV2 => SWAP_V2_CONTRACT_NAME,
            LogicContract::SwapV3 => SWAP_V3_CONTRACT_NAME,
            LogicContract::SwapX => SWAPX_CONTRACT_NAME,
        }
    }

    /// The `deployments.json` key the contract's address is recorded under
    pub fn deployments_key(self) -> &'static str {
        match self {
            LogicContract::SwapV2 => SWAP_V2_CONTRACT_KEY,
            LogicContract::SwapV3 => SWAP_V3_CONTRACT_KEY,
            LogicContract::SwapX => SWAPX_CONTRACT_KEY,
        }
    }
}

impl Display for LogicContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicContract::SwapV2 => write!(f, "swap-v2"),
            LogicContract::SwapV3 => write!(f, "swap-v3"),
            LogicContract::SwapX => write!(f, "swap-x"),
        }
    }
}

/// Deploy the SwapX upgradeable proxy contract.
///
/// Concretely, this is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract.
///
/// Calls made directly to the `TransparentUpgradeableProxy` contract will be
/// forwarded to the implementation contract. Upgrade calls can only be made
/// to the `TransparentUpgradeableProxy` through the `ProxyAdmin`.
#[derive(Args)]
pub struct DeployProxyArgs {
    /// Address of the owner for both the proxy admin contract
    /// and the underlying SwapX contract
    #[arg(short, long)]
    pub owner: String,

    /// SwapX implementation contract address in hex; falls back to the
    /// address recorded in the deployments file
    #[arg(short, long)]
    pub implementation: Option<String>,

    /// SwapV2 logic library address in hex; falls back to the deployments
    /// file, then the network profile
    #[arg(long)]
    pub swap_v2: Option<String>,

    /// SwapV3 logic library address in hex; falls back to the deployments
    /// file, then the network profile
    #[arg(long)]
    pub swap_v3: Option<String>,

    /// Acknowledge that the proxy's initializer delegatecalls into the
    /// implementation during deployment
    #[arg(long)]
    pub unsafe_allow_delegatecall: bool,
}

/// Upgrade the SwapX implementation behind the proxy
#[derive(Args)]
pub struct UpgradeArgs {
    /// Address of the proxy admin contract; falls back to the address
    /// recorded in the deployments file
    #[arg(long)]
    pub proxy_admin: Option<String>,

    /// Address of the proxy contract; falls back to the address recorded
    /// in the deployments file
    #[arg(long)]
    pub proxy: Option<String>,

    /// Address of the new implementation contract
    #[arg(short, long)]
    pub implementation: String,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(short, long)]
    pub calldata: Option<String>,

    /// Acknowledge that non-empty upgrade calldata delegatecalls into the
    /// new implementation
    #[arg(long)]
    pub unsafe_allow_delegatecall: bool,
}
