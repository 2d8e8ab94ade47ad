//! Utilities for the deploy scripts.

use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use alloy_primitives::Address as AlloyAddress;
use alloy_sol_types::SolCall;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes},
};
use json::JsonValue;

use crate::{
    constants::{
        DEPLOYMENTS_KEY, SWAPX_CONTRACT_KEY, SWAPX_CONTRACT_NAME, SWAP_V2_CONTRACT_KEY,
        SWAP_V2_CONTRACT_NAME, SWAP_V3_CONTRACT_KEY, SWAP_V3_CONTRACT_NAME,
    },
    errors::ScriptError,
    solidity::initializeCall,
    types::ContractArtifact,
};

/// Sets up the client with which to submit transactions,
/// from the private key and RPC url given on the CLI.
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
) -> Result<Arc<impl Middleware>, ScriptError> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let wallet = LocalWallet::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
        .as_u64();
    let client = Arc::new(SignerMiddleware::new(
        provider,
        wallet.clone().with_chain_id(chain_id),
    ));

    Ok(client)
}

/// Parse an address from its hex representation
pub fn parse_addr(addr: &str) -> Result<Address, ScriptError> {
    Address::from_str(addr).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Convert an ethers address into an alloy address for calldata encoding
pub(crate) fn to_alloy_address(address: Address) -> AlloyAddress {
    AlloyAddress::from_slice(address.as_bytes())
}

/// Prepare calldata for the SwapX contract's `initialize` method from the
/// two logic library addresses
pub fn swapx_initialize_calldata(args: &[Address]) -> Result<Bytes, ScriptError> {
    match args {
        [swap_v2, swap_v3] => {
            let call = initializeCall {
                swap_v2: to_alloy_address(*swap_v2),
                swap_v3: to_alloy_address(*swap_v3),
            };
            Ok(Bytes::from(call.abi_encode()))
        }
        _ => Err(ScriptError::ArgumentMismatch(format!(
            "SwapX initializer takes 2 addresses, got {}",
            args.len()
        ))),
    }
}

/// Load a compiled contract artifact from the artifacts directory
pub fn load_artifact(artifacts_dir: &str, name: &str) -> Result<ContractArtifact, ScriptError> {
    let path = Path::new(artifacts_dir).join(format!("{}.json", name));
    let raw = fs::read_to_string(&path).map_err(|e| {
        ScriptError::ArtifactParsing(format!("{}: {}", path.to_string_lossy(), e))
    })?;
    ContractArtifact::from_json(&raw)
}

/// The `deployments.json` key under which a logic contract's address is
/// recorded
pub fn contract_key(contract_name: &str) -> Result<&'static str, ScriptError> {
    match contract_name {
        SWAP_V2_CONTRACT_NAME => Ok(SWAP_V2_CONTRACT_KEY),
        SWAP_V3_CONTRACT_NAME => Ok(SWAP_V3_CONTRACT_KEY),
        SWAPX_CONTRACT_NAME => Ok(SWAPX_CONTRACT_KEY),
        other => Err(ScriptError::WriteDeployments(format!(
            "no deployments key for contract `{}`",
            other
        ))),
    }
}

/// Parse a JSON file into a `JsonValue`
pub fn get_json_from_file(file_path: &str) -> Result<JsonValue, ScriptError> {
    let mut file_contents = String::new();
    File::open(file_path)
        .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?
        .read_to_string(&mut file_contents)
        .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;

    json::parse(&file_contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Read a contract address recorded in the deployments file
pub fn parse_addr_from_deployments_file(
    file_path: &str,
    contract_key: &str,
) -> Result<Address, ScriptError> {
    let parsed_json = get_json_from_file(file_path)?;

    Address::from_str(
        parsed_json[DEPLOYMENTS_KEY][contract_key]
            .as_str()
            .ok_or_else(|| {
                ScriptError::ReadDeployments(format!(
                    "no `{}` address in deployments file",
                    contract_key
                ))
            })?,
    )
    .map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Record a deployed contract address in the deployments file
pub fn write_deployed_address(
    file_path: &str,
    contract_key: &str,
    address: Address,
) -> Result<(), ScriptError> {
    // If the file doesn't exist, create it
    if !PathBuf::from(file_path).exists() {
        fs::write(file_path, "{}").map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    }
    let mut parsed_json = get_json_from_file(file_path)?;

    parsed_json[DEPLOYMENTS_KEY][contract_key] = JsonValue::String(format!("{address:#x}"));

    fs::write(file_path, json::stringify_pretty(parsed_json, 4))
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use alloy_sol_types::SolCall;
    use ethers::types::Address;

    use crate::{constants::SWAP_V2_CONTRACT_KEY, errors::ScriptError, solidity::initializeCall};

    use super::{
        parse_addr_from_deployments_file, swapx_initialize_calldata, write_deployed_address,
    };

    #[test]
    fn test_initialize_calldata_selector() {
        let calldata = swapx_initialize_calldata(&[
            Address::from_low_u64_be(1),
            Address::from_low_u64_be(2),
        ])
        .unwrap();

        assert_eq!(&calldata[..4], initializeCall::SELECTOR.as_slice());
        // selector + two 32-byte words
        assert_eq!(calldata.len(), 4 + 64);
    }

    #[test]
    fn test_initialize_calldata_arity() {
        let res = swapx_initialize_calldata(&[Address::zero()]);
        assert!(matches!(res, Err(ScriptError::ArgumentMismatch(_))));
    }

    #[test]
    fn test_deployments_file_round_trip() {
        let path = env::temp_dir().join(format!("deployments_test_{}.json", std::process::id()));
        let path_str = path.to_str().unwrap();

        let address = Address::from_low_u64_be(0xbeef);
        write_deployed_address(path_str, SWAP_V2_CONTRACT_KEY, address).unwrap();

        let read = parse_addr_from_deployments_file(path_str, SWAP_V2_CONTRACT_KEY).unwrap();
        assert_eq!(read, address);

        // A key that was never written is an error, not a default
        assert!(parse_addr_from_deployments_file(path_str, "swapx_contract").is_err());

        fs::remove_file(path).unwrap();
    }
}
