//! Implementations of the various deploy scripts
//!
//! Each run executes strictly sequentially: every step depends on the
//! address produced by the one before it, and the first failure aborts the
//! remainder of the plan. Runs sharing a deployer account must be serialized
//! externally; concurrent runs collide on the account's nonce.

use std::{collections::HashMap, time::Duration};

use ethers::{
    abi::Token,
    types::{Address, Bytes},
    utils::hex::FromHex,
};
use tracing::info;

use crate::{
    cli::{DeployArgs, DeployLogicArgs, DeployProxyArgs, UpgradeArgs},
    constants::{
        PROXY_CONTRACT_NAME, SWAPX_CONTRACT_KEY, SWAPX_PROXY_ADMIN_CONTRACT_KEY,
        SWAPX_PROXY_CONTRACT_KEY, SWAP_V2_CONTRACT_KEY, SWAP_V2_DEPENDENCY, SWAP_V3_CONTRACT_KEY,
        SWAP_V3_DEPENDENCY,
    },
    deployer::deploy_contract,
    errors::ScriptError,
    network::{self, NetworkProfile},
    plan::{resolve_arg, swapx_plan, DeploymentPlan},
    proxy,
    report::report,
    submitter::TransactionSubmitter,
    types::{ContractArtifact, DelegateCallOptIn, DeployedContract, ProxyRecord},
    utils,
};

/// Execute a validated plan step by step, returning the deployed contracts in
/// order and the resulting proxy record, if the plan deploys a proxy
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_plan<S: TransactionSubmitter>(
    submitter: &S,
    plan: &DeploymentPlan,
    profile: &NetworkProfile,
    artifacts: &HashMap<String, ContractArtifact>,
    owner_address: Address,
    opt_in: DelegateCallOptIn,
    wait: Duration,
) -> Result<(Vec<DeployedContract>, Option<ProxyRecord>), ScriptError> {
    plan.validate(profile)?;

    let mut produced: HashMap<String, Address> = HashMap::new();
    let mut deployed = Vec::new();

    for step in &plan.steps {
        let artifact = artifacts.get(&step.name).ok_or_else(|| {
            ScriptError::ArtifactParsing(format!("no artifact for step `{}`", step.name))
        })?;

        let args = step
            .args
            .iter()
            .map(|arg| resolve_arg(arg, &produced, profile).map(Token::Address))
            .collect::<Result<Vec<_>, _>>()?;

        let contract =
            deploy_contract(submitter, artifact, &args, &profile.gas_policy, wait).await?;
        produced.insert(step.name.clone(), contract.address);
        deployed.push(contract);
    }

    let mut proxy_record = None;
    if let Some(proxy_step) = &plan.proxy {
        let logic_address = resolve_arg(&proxy_step.logic, &produced, profile)?;
        let init_addrs = proxy_step
            .init_args
            .iter()
            .map(|arg| resolve_arg(arg, &produced, profile))
            .collect::<Result<Vec<_>, _>>()?;
        let init_calldata = utils::swapx_initialize_calldata(&init_addrs)?;

        let proxy_artifact = artifacts.get(PROXY_CONTRACT_NAME).ok_or_else(|| {
            ScriptError::ArtifactParsing(format!("no artifact for `{}`", PROXY_CONTRACT_NAME))
        })?;

        let (record, contract) = proxy::deploy_proxy(
            submitter,
            proxy_artifact,
            logic_address,
            owner_address,
            init_calldata,
            opt_in,
            &profile.gas_policy,
            wait,
        )
        .await?;
        deployed.push(contract);
        proxy_record = Some(record);
    }

    Ok((deployed, proxy_record))
}

/// Deploy the full SwapX system on the selected network
pub(crate) async fn deploy<S: TransactionSubmitter>(
    args: DeployArgs,
    submitter: &S,
    network_id: &str,
    artifacts_dir: &str,
    deployments_path: &str,
    wait: Duration,
) -> Result<(), ScriptError> {
    let profile = network::resolve(network_id)?;
    let owner_address = utils::parse_addr(&args.owner)?;
    let opt_in = DelegateCallOptIn::from_flag(args.unsafe_allow_delegatecall);

    let plan = swapx_plan();
    let mut artifacts = HashMap::new();
    for step in &plan.steps {
        artifacts.insert(
            step.name.clone(),
            utils::load_artifact(artifacts_dir, &step.name)?,
        );
    }
    if plan.proxy.is_some() {
        artifacts.insert(
            PROXY_CONTRACT_NAME.to_string(),
            utils::load_artifact(artifacts_dir, PROXY_CONTRACT_NAME)?,
        );
    }

    info!("deploying SwapX system to `{}`", profile.network_id);
    let (deployed, proxy_record) = run_plan(
        submitter,
        &plan,
        &profile,
        &artifacts,
        owner_address,
        opt_in,
        wait,
    )
    .await?;

    for contract in &deployed {
        if contract.name != PROXY_CONTRACT_NAME {
            utils::write_deployed_address(
                deployments_path,
                utils::contract_key(&contract.name)?,
                contract.address,
            )?;
        }
    }
    if let Some(record) = &proxy_record {
        utils::write_deployed_address(
            deployments_path,
            SWAPX_PROXY_CONTRACT_KEY,
            record.proxy_address,
        )?;
        let admin_address = proxy::proxy_admin_address(submitter, record.proxy_address).await?;
        utils::write_deployed_address(
            deployments_path,
            SWAPX_PROXY_ADMIN_CONTRACT_KEY,
            admin_address,
        )?;
        println!("Proxy admin contract deployed at {:#x}", admin_address);
    }

    let summary = report(&profile.network_id, &deployed, proxy_record.as_ref());
    println!("{}", summary.render());

    Ok(())
}

/// Deploy a single logic contract and record its address
pub(crate) async fn deploy_logic<S: TransactionSubmitter>(
    args: DeployLogicArgs,
    submitter: &S,
    network_id: &str,
    artifacts_dir: &str,
    deployments_path: &str,
    wait: Duration,
) -> Result<(), ScriptError> {
    let profile = network::resolve(network_id)?;
    let artifact = utils::load_artifact(artifacts_dir, args.contract.artifact_name())?;

    let contract =
        deploy_contract(submitter, &artifact, &[], &profile.gas_policy, wait).await?;

    utils::write_deployed_address(
        deployments_path,
        args.contract.deployments_key(),
        contract.address,
    )?;
    println!("{} deployed at {:#x}", artifact.name, contract.address);

    Ok(())
}

/// Resolve a logic library address: explicit CLI argument, then the
/// deployments file, then the network profile. Never a silent default.
fn logic_address(
    cli_arg: Option<&str>,
    deployments_path: &str,
    contract_key: &str,
    profile: &NetworkProfile,
    dependency: &str,
) -> Result<Address, ScriptError> {
    if let Some(addr) = cli_arg {
        return utils::parse_addr(addr);
    }
    if let Ok(address) = utils::parse_addr_from_deployments_file(deployments_path, contract_key) {
        return Ok(address);
    }
    profile.dependency(dependency)
}

/// Deploy the upgradeable proxy against an existing SwapX implementation
pub(crate) async fn deploy_proxy<S: TransactionSubmitter>(
    args: DeployProxyArgs,
    submitter: &S,
    network_id: &str,
    artifacts_dir: &str,
    deployments_path: &str,
    wait: Duration,
) -> Result<(), ScriptError> {
    let profile = network::resolve(network_id)?;
    let owner_address = utils::parse_addr(&args.owner)?;
    let opt_in = DelegateCallOptIn::from_flag(args.unsafe_allow_delegatecall);

    let implementation = match &args.implementation {
        Some(addr) => utils::parse_addr(addr)?,
        None => utils::parse_addr_from_deployments_file(deployments_path, SWAPX_CONTRACT_KEY)?,
    };
    let swap_v2 = logic_address(
        args.swap_v2.as_deref(),
        deployments_path,
        SWAP_V2_CONTRACT_KEY,
        &profile,
        SWAP_V2_DEPENDENCY,
    )?;
    let swap_v3 = logic_address(
        args.swap_v3.as_deref(),
        deployments_path,
        SWAP_V3_CONTRACT_KEY,
        &profile,
        SWAP_V3_DEPENDENCY,
    )?;
    let init_calldata = utils::swapx_initialize_calldata(&[swap_v2, swap_v3])?;

    let proxy_artifact = utils::load_artifact(artifacts_dir, PROXY_CONTRACT_NAME)?;
    let (record, _) = proxy::deploy_proxy(
        submitter,
        &proxy_artifact,
        implementation,
        owner_address,
        init_calldata,
        opt_in,
        &profile.gas_policy,
        wait,
    )
    .await?;

    let admin_address = proxy::proxy_admin_address(submitter, record.proxy_address).await?;

    utils::write_deployed_address(
        deployments_path,
        SWAPX_PROXY_CONTRACT_KEY,
        record.proxy_address,
    )?;
    utils::write_deployed_address(
        deployments_path,
        SWAPX_PROXY_ADMIN_CONTRACT_KEY,
        admin_address,
    )?;

    println!("Proxy contract deployed at {:#x}", record.proxy_address);
    println!("Proxy admin contract deployed at {:#x}", admin_address);

    Ok(())
}

/// Retarget the existing proxy to a new implementation
pub(crate) async fn upgrade<S: TransactionSubmitter>(
    args: UpgradeArgs,
    submitter: &S,
    network_id: &str,
    deployments_path: &str,
    wait: Duration,
) -> Result<(), ScriptError> {
    let profile = network::resolve(network_id)?;
    let opt_in = DelegateCallOptIn::from_flag(args.unsafe_allow_delegatecall);

    let proxy_admin_address = match &args.proxy_admin {
        Some(addr) => utils::parse_addr(addr)?,
        None => utils::parse_addr_from_deployments_file(
            deployments_path,
            SWAPX_PROXY_ADMIN_CONTRACT_KEY,
        )?,
    };
    let proxy_address = match &args.proxy {
        Some(addr) => utils::parse_addr(addr)?,
        None => {
            utils::parse_addr_from_deployments_file(deployments_path, SWAPX_PROXY_CONTRACT_KEY)?
        }
    };
    let implementation = utils::parse_addr(&args.implementation)?;

    let calldata = match &args.calldata {
        Some(data) => Bytes::from_hex(data.strip_prefix("0x").unwrap_or(data))
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?,
        None => Bytes::new(),
    };

    let record = proxy::upgrade_proxy(
        submitter,
        proxy_admin_address,
        proxy_address,
        implementation,
        calldata,
        opt_in,
        &profile.gas_policy,
        wait,
    )
    .await?;

    utils::write_deployed_address(deployments_path, SWAPX_CONTRACT_KEY, record.logic_address)?;
    println!(
        "Proxy at {:#x} now delegates to {:#x}",
        record.proxy_address, record.logic_address
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use ethers::types::{Address, Bytes};

    use crate::{
        constants::{
            PROXY_CONTRACT_NAME, SWAPX_CONTRACT_NAME, SWAP_V2_CONTRACT_NAME, SWAP_V3_CONTRACT_NAME,
        },
        errors::ScriptError,
        network,
        plan::{swapx_plan, DeployStep, DeploymentPlan, PlanArg, ProxyStep},
        proxy::upgrade_proxy,
        report::report,
        submitter::testing::MockSubmitter,
        types::{ContractArtifact, DelegateCallOptIn},
    };

    use super::run_plan;

    /// A confirmation wait long enough to never trigger in tests
    const WAIT: Duration = Duration::from_secs(5);

    /// Build the artifact map for the standard plan
    fn swapx_artifacts() -> HashMap<String, ContractArtifact> {
        let mut artifacts = HashMap::new();
        for name in [
            SWAP_V2_CONTRACT_NAME,
            SWAP_V3_CONTRACT_NAME,
            SWAPX_CONTRACT_NAME,
        ] {
            let raw = format!(
                r#"{{"contractName": "{}", "abi": [], "bytecode": "0x6080"}}"#,
                name
            );
            artifacts.insert(name.to_string(), ContractArtifact::from_json(&raw).unwrap());
        }
        let proxy_raw = format!(
            r#"{{
                "contractName": "{}",
                "abi": [
                    {{
                        "type": "constructor",
                        "stateMutability": "payable",
                        "inputs": [
                            {{"name": "_logic", "type": "address"}},
                            {{"name": "initialOwner", "type": "address"}},
                            {{"name": "_data", "type": "bytes"}}
                        ]
                    }}
                ],
                "bytecode": "0x60a0"
            }}"#,
            PROXY_CONTRACT_NAME
        );
        artifacts.insert(
            PROXY_CONTRACT_NAME.to_string(),
            ContractArtifact::from_json(&proxy_raw).unwrap(),
        );
        artifacts
    }

    #[tokio::test]
    async fn test_full_deploy_flow() {
        let submitter = MockSubmitter::new();
        let addrs: Vec<Address> = (1..=4).map(Address::from_low_u64_be).collect();
        for addr in &addrs {
            submitter.push_confirmed(*addr);
        }

        let profile = network::resolve("sepolia").unwrap();
        let (deployed, proxy_record) = run_plan(
            &submitter,
            &swapx_plan(),
            &profile,
            &swapx_artifacts(),
            Address::from_low_u64_be(0x9),
            DelegateCallOptIn::Allow,
            WAIT,
        )
        .await
        .unwrap();

        // Logic contracts in plan order, then the proxy
        assert_eq!(deployed.len(), 4);
        assert_eq!(deployed[0].name, SWAP_V2_CONTRACT_NAME);
        assert_eq!(deployed[1].name, SWAP_V3_CONTRACT_NAME);
        assert_eq!(deployed[2].name, SWAPX_CONTRACT_NAME);
        assert_eq!(deployed[3].name, PROXY_CONTRACT_NAME);

        // The proxy delegates to the SwapX implementation deployed in step 3
        let record = proxy_record.unwrap();
        assert_eq!(record.logic_address, addrs[2]);
        assert_eq!(record.proxy_address, addrs[3]);

        let summary = report(&profile.network_id, &deployed, Some(&record));
        assert_eq!(summary.contracts.len(), 4);
        assert_eq!(
            summary.proxy.as_ref().unwrap().logic_address,
            deployed[2].address
        );
    }

    #[tokio::test]
    async fn test_failed_step_aborts_plan() {
        let submitter = MockSubmitter::new();
        submitter.push_reverted("constructor reverted");

        let profile = network::resolve("sepolia").unwrap();
        let res = run_plan(
            &submitter,
            &swapx_plan(),
            &profile,
            &swapx_artifacts(),
            Address::from_low_u64_be(0x9),
            DelegateCallOptIn::Allow,
            WAIT,
        )
        .await;

        assert!(matches!(res, Err(ScriptError::DeploymentFailed(_))));
        // Nothing past the failed step was submitted
        assert_eq!(submitter.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_plan_never_submits() {
        let submitter = MockSubmitter::new();

        let plan = DeploymentPlan {
            steps: vec![DeployStep {
                name: SWAPX_CONTRACT_NAME.to_string(),
                args: vec![],
            }],
            proxy: Some(ProxyStep {
                logic: PlanArg::Step("Nonexistent".to_string()),
                init_args: vec![],
            }),
        };

        let profile = network::resolve("sepolia").unwrap();
        let res = run_plan(
            &submitter,
            &plan,
            &profile,
            &swapx_artifacts(),
            Address::from_low_u64_be(0x9),
            DelegateCallOptIn::Allow,
            WAIT,
        )
        .await;

        assert!(matches!(res, Err(ScriptError::PlanValidation(_))));
        assert_eq!(submitter.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_upgrade_scenario() {
        let submitter = MockSubmitter::new();
        let addrs: Vec<Address> = (1..=4).map(Address::from_low_u64_be).collect();
        for addr in &addrs {
            submitter.push_confirmed(*addr);
        }

        let profile = network::resolve("sepolia").unwrap();
        let (_, proxy_record) = run_plan(
            &submitter,
            &swapx_plan(),
            &profile,
            &swapx_artifacts(),
            Address::from_low_u64_be(0x9),
            DelegateCallOptIn::Allow,
            WAIT,
        )
        .await
        .unwrap();
        let record = proxy_record.unwrap();

        // Deploy a new implementation, then retarget the existing proxy
        let new_logic = Address::from_low_u64_be(0x5);
        submitter.push_confirmed(new_logic);
        let new_impl = crate::deployer::deploy_contract(
            &submitter,
            &swapx_artifacts()[SWAPX_CONTRACT_NAME],
            &[],
            &profile.gas_policy,
            WAIT,
        )
        .await
        .unwrap();

        submitter.push_call_confirmed();
        let upgraded = upgrade_proxy(
            &submitter,
            Address::from_low_u64_be(0xad),
            record.proxy_address,
            new_impl.address,
            Bytes::new(),
            DelegateCallOptIn::Deny,
            &profile.gas_policy,
            WAIT,
        )
        .await
        .unwrap();

        assert_eq!(upgraded.proxy_address, record.proxy_address);
        assert_eq!(upgraded.logic_address, new_impl.address);
        assert_ne!(upgraded.logic_address, record.logic_address);
    }
}
