//! Type definitions used throughout the scripts

use ethers::{
    abi::{Abi, ParamType},
    types::{Address, Bytes, H256, U256},
    utils::hex::FromHex,
};
use serde::Deserialize;

use crate::errors::ScriptError;

/// The gas parameters applied to every transaction in a run,
/// fixed per network profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPolicy {
    /// The gas price in wei, or `None` to defer to the node's estimate
    pub gas_price: Option<U256>,
}

/// Whether the caller acknowledges that initialization or upgrade calldata
/// delegatecalls into the logic contract, letting deployment-time code
/// mutate the proxy's storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateCallOptIn {
    /// Refuse any delegatecall-based initialization
    Deny,
    /// The caller explicitly allows delegatecall-based initialization
    Allow,
}

impl DelegateCallOptIn {
    /// Build the capability from the CLI's `--unsafe-allow-delegatecall` flag
    pub fn from_flag(allow: bool) -> Self {
        if allow {
            DelegateCallOptIn::Allow
        } else {
            DelegateCallOptIn::Deny
        }
    }
}

/// A compiled contract artifact, supplied by the build step upstream
/// of these scripts
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The contract ABI
    pub abi: Abi,
    /// The contract creation bytecode
    pub bytecode: Bytes,
    /// The parameter types of the contract's constructor, in order.
    /// Empty when the ABI declares no constructor.
    pub constructor_types: Vec<ParamType>,
}

/// The subset of a Hardhat compilation artifact the scripts consume
#[derive(Deserialize)]
struct RawArtifact {
    /// The contract name
    #[serde(rename = "contractName")]
    contract_name: String,
    /// The contract ABI
    abi: Abi,
    /// The hex-encoded creation bytecode
    bytecode: String,
}

impl ContractArtifact {
    /// Parse an artifact from Hardhat's JSON output
    pub fn from_json(raw_json: &str) -> Result<Self, ScriptError> {
        let raw: RawArtifact = serde_json::from_str(raw_json)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        let stripped = raw.bytecode.strip_prefix("0x").unwrap_or(&raw.bytecode);
        let bytecode =
            Bytes::from_hex(stripped).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        let constructor_types = raw
            .abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.iter().map(|param| param.kind.clone()).collect())
            .unwrap_or_default();

        Ok(ContractArtifact {
            name: raw.contract_name,
            abi: raw.abi,
            bytecode,
            constructor_types,
        })
    }
}

/// A contract whose creation transaction has been confirmed.
/// The address is the sole identity consumed by downstream steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    /// The artifact name of the deployed contract
    pub name: String,
    /// The address the contract was deployed to
    pub address: Address,
    /// The hash of the creation transaction
    pub tx_hash: H256,
    /// The block in which the creation transaction was confirmed
    pub block_number: u64,
}

/// The state of a deployed upgradeable proxy.
///
/// The proxy address is permanent once deployed; the logic address is
/// rewritten by upgrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRecord {
    /// The permanent address of the proxy contract
    pub proxy_address: Address,
    /// The logic contract the proxy currently delegates to
    pub logic_address: Address,
    /// The keccak256 hash of the initializer (or upgrade) calldata,
    /// kept for auditability
    pub init_args_hash: H256,
}
