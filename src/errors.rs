//! Definitions of errors that can occur during the execution of the contract management scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the contract management scripts
#[derive(Debug)]
pub enum ScriptError {
    /// The requested network identifier is not in the supported set
    UnknownNetwork(String),
    /// A dependency address required for the selected network has not been
    /// resolved (i.e. the contract is not yet deployed on that network)
    UnresolvedDependency(String),
    /// Constructor or initializer arguments do not match the artifact ABI
    ArgumentMismatch(String),
    /// The deployment plan references an address no earlier step produces
    PlanValidation(String),
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Delegatecall-based initialization was requested without the explicit
    /// opt-in acknowledging it
    DelegateCallNotAllowed(String),
    /// A contract creation transaction failed to submit or confirm
    DeploymentFailed(String),
    /// The proxy's initializer reverted; the proxy is not considered deployed
    InitializationFailed(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// The confirmation wait elapsed; the transaction may still confirm on-chain
    ConfirmationTimeout(String),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
    /// Error de/serializing a deployment record
    Serde(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownNetwork(s) => write!(f, "unknown network: {}", s),
            ScriptError::UnresolvedDependency(s) => {
                write!(f, "unresolved dependency address: {}", s)
            }
            ScriptError::ArgumentMismatch(s) => write!(f, "argument mismatch: {}", s),
            ScriptError::PlanValidation(s) => write!(f, "invalid deployment plan: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::DelegateCallNotAllowed(s) => {
                write!(f, "delegatecall not acknowledged: {}", s)
            }
            ScriptError::DeploymentFailed(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::InitializationFailed(s) => {
                write!(f, "proxy initialization failed: {}", s)
            }
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::ConfirmationTimeout(s) => write!(f, "confirmation timed out: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::Serde(s) => write!(f, "error de/serializing record: {}", s),
        }
    }
}

impl Error for ScriptError {}
