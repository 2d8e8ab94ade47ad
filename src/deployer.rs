//! Deployment of compiled contract artifacts
//!
//! Each deployment is a single irreversible contract creation. Failures are
//! never retried here: blindly resubmitting a creation transaction risks a
//! duplicate deployment, so re-running is left to the operator.

use std::time::Duration;

use ethers::{
    abi::{self, Token},
    types::{Bytes, H256},
};
use tokio::time::timeout;
use tracing::info;

use crate::{
    errors::ScriptError,
    submitter::{TransactionSubmitter, TxOutcome, TxRequest},
    types::{ContractArtifact, DeployedContract, GasPolicy},
};

/// Check constructor arguments against the artifact's constructor signature,
/// before anything is submitted
pub fn validate_constructor_args(
    artifact: &ContractArtifact,
    args: &[Token],
) -> Result<(), ScriptError> {
    if args.len() != artifact.constructor_types.len() {
        return Err(ScriptError::ArgumentMismatch(format!(
            "{} constructor takes {} argument(s), got {}",
            artifact.name,
            artifact.constructor_types.len(),
            args.len()
        )));
    }

    for (i, (token, kind)) in args.iter().zip(&artifact.constructor_types).enumerate() {
        if !token.type_check(kind) {
            return Err(ScriptError::ArgumentMismatch(format!(
                "{} constructor argument {} is not a {}",
                artifact.name, i, kind
            )));
        }
    }

    Ok(())
}

/// Submit a transaction and await its terminal outcome within `wait`.
///
/// A wait that elapses yields [`ScriptError::ConfirmationTimeout`]; the
/// transaction may still confirm on-chain afterwards, so a timeout must not
/// be read as "the transaction did not land".
pub(crate) async fn send_and_confirm<S: TransactionSubmitter>(
    submitter: &S,
    request: TxRequest,
    wait: Duration,
    step: &str,
) -> Result<(H256, TxOutcome), ScriptError> {
    // Submission failures for creations and calls surface under different
    // variants, matching the step that failed
    let wrap_cause = |cause: String| {
        if request.to.is_none() {
            ScriptError::DeploymentFailed(format!("{}: {}", step, cause))
        } else {
            ScriptError::ContractInteraction(format!("{}: {}", step, cause))
        }
    };

    let tx_hash = submitter
        .submit(request.clone())
        .await
        .map_err(|e| wrap_cause(e.to_string()))?;
    info!("{} transaction submitted: {:#x}", step, tx_hash);

    let outcome = timeout(wait, submitter.confirm(tx_hash))
        .await
        .map_err(|_| {
            ScriptError::ConfirmationTimeout(format!(
                "{} ({:#x}) unconfirmed after {}s; the transaction may still confirm on-chain",
                step,
                tx_hash,
                wait.as_secs()
            ))
        })?
        .map_err(|e| wrap_cause(e.to_string()))?;

    Ok((tx_hash, outcome))
}

/// Deploy a contract artifact with the given constructor arguments,
/// returning once the creation transaction is confirmed
pub async fn deploy_contract<S: TransactionSubmitter>(
    submitter: &S,
    artifact: &ContractArtifact,
    args: &[Token],
    gas_policy: &GasPolicy,
    wait: Duration,
) -> Result<DeployedContract, ScriptError> {
    validate_constructor_args(artifact, args)?;

    let mut data = artifact.bytecode.to_vec();
    data.extend(abi::encode(args));
    let request = TxRequest::creation(Bytes::from(data), gas_policy.gas_price);

    let step = format!("{} deployment", artifact.name);
    let (tx_hash, outcome) = send_and_confirm(submitter, request, wait, &step).await?;

    match outcome {
        TxOutcome::Confirmed {
            address: Some(address),
            block_number,
        } => {
            info!("{} deployed at {:#x}", artifact.name, address);
            Ok(DeployedContract {
                name: artifact.name.clone(),
                address,
                tx_hash,
                block_number,
            })
        }
        TxOutcome::Confirmed { address: None, .. } => Err(ScriptError::DeploymentFailed(format!(
            "{} creation confirmed without a contract address",
            artifact.name
        ))),
        TxOutcome::Reverted { reason } => Err(ScriptError::DeploymentFailed(format!(
            "{} constructor reverted: {}",
            artifact.name,
            reason.unwrap_or_else(|| "no revert reason".to_string())
        ))),
    }
}
