//! Deployment and upgrade of the SwapX upgradeable proxy
//!
//! The proxy's lifecycle is `UNDEPLOYED -> DEPLOYED(logic_1) ->
//! DEPLOYED(logic_2) -> ...`: the proxy address is fixed at first deployment
//! and every upgrade rewrites only the logic pointer.

use std::{str::FromStr, time::Duration};

use alloy_primitives::Bytes as AlloyBytes;
use alloy_sol_types::SolCall;
use ethers::{
    abi::Token,
    types::{Address, Bytes, H256},
    utils::keccak256,
};
use tracing::{info, warn};

use crate::{
    constants::{NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT, PROXY_ADMIN_STORAGE_SLOT},
    deployer::{send_and_confirm, validate_constructor_args},
    errors::ScriptError,
    solidity::upgradeAndCallCall,
    submitter::{TransactionSubmitter, TxOutcome, TxRequest},
    types::{ContractArtifact, DelegateCallOptIn, DeployedContract, GasPolicy, ProxyRecord},
    utils::to_alloy_address,
};

/// Refuse non-empty delegatecall calldata unless the caller has opted in
fn check_delegatecall_opt_in(
    calldata: &Bytes,
    opt_in: DelegateCallOptIn,
    context: &str,
) -> Result<(), ScriptError> {
    if !calldata.is_empty() && opt_in == DelegateCallOptIn::Deny {
        return Err(ScriptError::DelegateCallNotAllowed(format!(
            "{} delegatecalls into the logic contract; pass --unsafe-allow-delegatecall to acknowledge this",
            context
        )));
    }
    Ok(())
}

/// The keccak256 hash of initializer or upgrade calldata, kept in the
/// proxy record for auditability
fn calldata_hash(data: &Bytes) -> H256 {
    H256::from(keccak256(data))
}

/// Deploy the upgradeable proxy, pointing it at `logic_address` and running
/// the initializer calldata inside the creation transaction.
///
/// Initialization is atomic with deployment: if the initializer reverts, no
/// record is produced and any partially created on-chain state is abandoned,
/// never reused.
#[allow(clippy::too_many_arguments)]
pub async fn deploy_proxy<S: TransactionSubmitter>(
    submitter: &S,
    proxy_artifact: &ContractArtifact,
    logic_address: Address,
    owner_address: Address,
    init_calldata: Bytes,
    opt_in: DelegateCallOptIn,
    gas_policy: &GasPolicy,
    wait: Duration,
) -> Result<(ProxyRecord, DeployedContract), ScriptError> {
    check_delegatecall_opt_in(&init_calldata, opt_in, "proxy initialization")?;

    let args = vec![
        Token::Address(logic_address),
        Token::Address(owner_address),
        Token::Bytes(init_calldata.to_vec()),
    ];
    validate_constructor_args(proxy_artifact, &args)?;

    let mut data = proxy_artifact.bytecode.to_vec();
    data.extend(ethers::abi::encode(&args));
    let request = TxRequest::creation(Bytes::from(data), gas_policy.gas_price);

    let (tx_hash, outcome) = send_and_confirm(submitter, request, wait, "proxy deployment").await?;

    let deployed = match outcome {
        TxOutcome::Confirmed {
            address: Some(address),
            block_number,
        } => DeployedContract {
            name: proxy_artifact.name.clone(),
            address,
            tx_hash,
            block_number,
        },
        TxOutcome::Confirmed { address: None, .. } => {
            return Err(ScriptError::DeploymentFailed(
                "proxy creation confirmed without a contract address".to_string(),
            ))
        }
        // The initializer runs inside the creation transaction, so a revert
        // here means initialization failed and the proxy is not live
        TxOutcome::Reverted { reason } => {
            return Err(ScriptError::InitializationFailed(reason.unwrap_or_else(
                || "initializer reverted with no reason".to_string(),
            )))
        }
    };

    info!("Proxy contract deployed at {:#x}", deployed.address);

    let record = ProxyRecord {
        proxy_address: deployed.address,
        logic_address,
        init_args_hash: calldata_hash(&init_calldata),
    };
    Ok((record, deployed))
}

/// Retarget an existing proxy to a new logic contract via its `ProxyAdmin`,
/// preserving the proxy's address and storage.
///
/// Storage-layout compatibility between the old and new logic contracts is
/// NOT verified here and cannot be; it is the caller's responsibility, and an
/// incompatible upgrade silently corrupts the proxy's storage.
#[allow(clippy::too_many_arguments)]
pub async fn upgrade_proxy<S: TransactionSubmitter>(
    submitter: &S,
    proxy_admin_address: Address,
    proxy_address: Address,
    new_logic_address: Address,
    calldata: Bytes,
    opt_in: DelegateCallOptIn,
    gas_policy: &GasPolicy,
    wait: Duration,
) -> Result<ProxyRecord, ScriptError> {
    check_delegatecall_opt_in(&calldata, opt_in, "the upgrade calldata")?;
    warn!("upgrading does not verify storage layout compatibility between implementations");

    let call = upgradeAndCallCall {
        proxy: to_alloy_address(proxy_address),
        implementation: to_alloy_address(new_logic_address),
        data: AlloyBytes::from(calldata.to_vec()),
    };
    let request = TxRequest::call(
        proxy_admin_address,
        Bytes::from(call.abi_encode()),
        gas_policy.gas_price,
    );

    let (_, outcome) = send_and_confirm(submitter, request, wait, "proxy upgrade").await?;

    match outcome {
        TxOutcome::Confirmed { .. } => {
            info!(
                "Proxy at {:#x} upgraded to logic {:#x}",
                proxy_address, new_logic_address
            );
            Ok(ProxyRecord {
                proxy_address,
                logic_address: new_logic_address,
                init_args_hash: calldata_hash(&calldata),
            })
        }
        TxOutcome::Reverted { reason } => Err(ScriptError::ContractInteraction(format!(
            "upgradeAndCall reverted: {}",
            reason.unwrap_or_else(|| "no revert reason".to_string())
        ))),
    }
}

/// Read the proxy admin contract address out of the proxy's EIP-1967 admin
/// storage slot.
///
/// This is the recommended way to recover the admin address:
/// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
pub async fn proxy_admin_address<S: TransactionSubmitter>(
    submitter: &S,
    proxy_address: Address,
) -> Result<Address, ScriptError> {
    // Can `unwrap` here since we know the storage slot constitutes a valid H256
    let slot = H256::from_str(PROXY_ADMIN_STORAGE_SLOT).unwrap();

    let value = submitter
        .storage_at(proxy_address, slot)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    Ok(Address::from_slice(
        &value.as_bytes()[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
    ))
}

#[cfg(test)]
mod tests {
    use std::{str::FromStr, time::Duration};

    use alloy_sol_types::SolCall;
    use ethers::{
        types::{Address, Bytes, H256, U256},
        utils::keccak256,
    };

    use crate::{
        constants::PROXY_ADMIN_STORAGE_SLOT,
        errors::ScriptError,
        solidity::upgradeAndCallCall,
        submitter::testing::MockSubmitter,
        types::{ContractArtifact, DelegateCallOptIn, GasPolicy},
        utils,
    };

    use super::{deploy_proxy, proxy_admin_address, upgrade_proxy};

    /// A confirmation wait long enough to never trigger in tests
    const WAIT: Duration = Duration::from_secs(5);

    /// The `TransparentUpgradeableProxy` artifact shape: constructor
    /// `(logic, initialOwner, data)`
    fn proxy_artifact() -> ContractArtifact {
        ContractArtifact::from_json(
            r#"{
                "contractName": "TransparentUpgradeableProxy",
                "abi": [
                    {
                        "type": "constructor",
                        "stateMutability": "payable",
                        "inputs": [
                            {"name": "_logic", "type": "address"},
                            {"name": "initialOwner", "type": "address"},
                            {"name": "_data", "type": "bytes"}
                        ]
                    }
                ],
                "bytecode": "0x60a060405260405162000e"
            }"#,
        )
        .unwrap()
    }

    /// The gas policy used across the proxy tests
    fn gas() -> GasPolicy {
        GasPolicy {
            gas_price: Some(U256::from(1_000_000_000u64)),
        }
    }

    /// Initializer calldata for a pair of logic library addresses
    fn init_calldata() -> Bytes {
        utils::swapx_initialize_calldata(&[
            Address::from_low_u64_be(0x2),
            Address::from_low_u64_be(0x3),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_deploy_proxy_success() {
        let submitter = MockSubmitter::new();
        let proxy_addr = Address::from_low_u64_be(0xaaaa);
        submitter.push_confirmed(proxy_addr);

        let logic = Address::from_low_u64_be(0x1);
        let owner = Address::from_low_u64_be(0x9);
        let init = init_calldata();

        let (record, deployed) = deploy_proxy(
            &submitter,
            &proxy_artifact(),
            logic,
            owner,
            init.clone(),
            DelegateCallOptIn::Allow,
            &gas(),
            WAIT,
        )
        .await
        .unwrap();

        assert_eq!(record.proxy_address, proxy_addr);
        assert_eq!(record.logic_address, logic);
        assert_eq!(record.init_args_hash, H256::from(keccak256(&init)));
        assert_eq!(deployed.address, proxy_addr);
    }

    #[tokio::test]
    async fn test_initializer_revert_produces_no_record() {
        let submitter = MockSubmitter::new();
        submitter.push_reverted("initializer reverted");

        let res = deploy_proxy(
            &submitter,
            &proxy_artifact(),
            Address::from_low_u64_be(0x1),
            Address::from_low_u64_be(0x9),
            init_calldata(),
            DelegateCallOptIn::Allow,
            &gas(),
            WAIT,
        )
        .await;

        assert!(matches!(res, Err(ScriptError::InitializationFailed(_))));
    }

    #[tokio::test]
    async fn test_delegatecall_opt_in_required() {
        let submitter = MockSubmitter::new();

        let res = deploy_proxy(
            &submitter,
            &proxy_artifact(),
            Address::from_low_u64_be(0x1),
            Address::from_low_u64_be(0x9),
            init_calldata(),
            DelegateCallOptIn::Deny,
            &gas(),
            WAIT,
        )
        .await;

        assert!(matches!(res, Err(ScriptError::DelegateCallNotAllowed(_))));
        assert_eq!(submitter.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_initializer_needs_no_opt_in() {
        let submitter = MockSubmitter::new();
        submitter.push_confirmed(Address::from_low_u64_be(0xaaaa));

        let res = deploy_proxy(
            &submitter,
            &proxy_artifact(),
            Address::from_low_u64_be(0x1),
            Address::from_low_u64_be(0x9),
            Bytes::new(),
            DelegateCallOptIn::Deny,
            &gas(),
            WAIT,
        )
        .await;

        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn test_upgrade_preserves_proxy_address() {
        let submitter = MockSubmitter::new();
        submitter.push_call_confirmed();

        let admin = Address::from_low_u64_be(0xad);
        let proxy = Address::from_low_u64_be(0xaaaa);
        let new_logic = Address::from_low_u64_be(0x2222);

        let record = upgrade_proxy(
            &submitter,
            admin,
            proxy,
            new_logic,
            Bytes::new(),
            DelegateCallOptIn::Deny,
            &gas(),
            WAIT,
        )
        .await
        .unwrap();

        assert_eq!(record.proxy_address, proxy);
        assert_eq!(record.logic_address, new_logic);

        // The upgrade goes through the proxy admin with an upgradeAndCall
        let request = submitter.submission(0);
        assert_eq!(request.to, Some(admin));
        assert_eq!(&request.data[..4], upgradeAndCallCall::SELECTOR.as_slice());
    }

    #[tokio::test]
    async fn test_reverted_upgrade() {
        let submitter = MockSubmitter::new();
        submitter.push_reverted("caller is not the owner");

        let res = upgrade_proxy(
            &submitter,
            Address::from_low_u64_be(0xad),
            Address::from_low_u64_be(0xaaaa),
            Address::from_low_u64_be(0x2222),
            Bytes::new(),
            DelegateCallOptIn::Deny,
            &gas(),
            WAIT,
        )
        .await;

        assert!(matches!(res, Err(ScriptError::ContractInteraction(_))));
    }

    #[tokio::test]
    async fn test_proxy_admin_address_from_slot() {
        let submitter = MockSubmitter::new();
        let proxy = Address::from_low_u64_be(0xaaaa);
        let admin = Address::from_low_u64_be(0xad);

        let slot = H256::from_str(PROXY_ADMIN_STORAGE_SLOT).unwrap();
        submitter.set_storage(proxy, slot, H256::from(admin));

        let read = proxy_admin_address(&submitter, proxy).await.unwrap();
        assert_eq!(read, admin);
    }
}
