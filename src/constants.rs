//! Constants used in the deploy scripts

use std::time::Duration;

/// The name of the SwapV2 logic library artifact
pub const SWAP_V2_CONTRACT_NAME: &str = "SwapV2";

/// The name of the SwapV3 logic library artifact
pub const SWAP_V3_CONTRACT_NAME: &str = "SwapV3";

/// The name of the SwapX implementation contract artifact
pub const SWAPX_CONTRACT_NAME: &str = "SwapX";

/// The name of the upgradeable proxy contract artifact
///
/// This is a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract.
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The interval at which to poll for a transaction receipt
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The SwapV2 logic library key in the `deployments.json` file
pub const SWAP_V2_CONTRACT_KEY: &str = "swap_v2_contract";

/// The SwapV3 logic library key in the `deployments.json` file
pub const SWAP_V3_CONTRACT_KEY: &str = "swap_v3_contract";

/// The SwapX implementation contract key in the `deployments.json` file
pub const SWAPX_CONTRACT_KEY: &str = "swapx_contract";

/// The SwapX proxy contract key in the `deployments.json` file
pub const SWAPX_PROXY_CONTRACT_KEY: &str = "swapx_proxy_contract";

/// The SwapX proxy admin contract key in the `deployments.json` file
pub const SWAPX_PROXY_ADMIN_CONTRACT_KEY: &str = "swapx_proxy_admin_contract";

/// The profile dependency key for the canonical WETH contract
pub const WETH_DEPENDENCY: &str = "weth";

/// The profile dependency key for a pre-deployed SwapV2 logic library
pub const SWAP_V2_DEPENDENCY: &str = "swap_v2";

/// The profile dependency key for a pre-deployed SwapV3 logic library
pub const SWAP_V3_DEPENDENCY: &str = "swap_v3";
