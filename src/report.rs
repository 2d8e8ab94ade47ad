//! The structured summary emitted at the end of a run
//!
//! The summary is a pure transformation of the run's results: every address
//! produced, in deployment order, with the transaction hash of each step for
//! auditability. It serializes for machine consumption and renders as a
//! key-value table for humans.

use std::fmt::Write;

use ethers::types::{Address, H256};
use serde::Serialize;

use crate::{
    errors::ScriptError,
    types::{DeployedContract, ProxyRecord},
};

/// One deployed contract in the summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryEntry {
    /// The artifact name of the contract
    pub contract: String,
    /// The address the contract was deployed to
    pub address: Address,
    /// The hash of the creation transaction
    pub tx_hash: H256,
}

/// The proxy portion of the summary
#[derive(Debug, Clone, Serialize)]
pub struct ProxySummary {
    /// The permanent proxy address
    pub proxy_address: Address,
    /// The logic contract the proxy delegates to
    pub logic_address: Address,
}

/// The structured record of a deployment run
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    /// The network the run targeted
    pub network: String,
    /// The deployed contracts, in deployment order
    pub contracts: Vec<SummaryEntry>,
    /// The proxy state after the run, if the run touched the proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxySummary>,
}

/// Build the summary for a run from its results
pub fn report(
    network: &str,
    deployed: &[DeployedContract],
    proxy: Option<&ProxyRecord>,
) -> DeploymentSummary {
    DeploymentSummary {
        network: network.to_string(),
        contracts: deployed
            .iter()
            .map(|contract| SummaryEntry {
                contract: contract.name.clone(),
                address: contract.address,
                tx_hash: contract.tx_hash,
            })
            .collect(),
        proxy: proxy.map(|record| ProxySummary {
            proxy_address: record.proxy_address,
            logic_address: record.logic_address,
        }),
    }
}

impl DeploymentSummary {
    /// Render the summary as an aligned key-value table
    pub fn render(&self) -> String {
        // Addresses format to 42 characters with the 0x prefix
        let mut out = format!(
            "network: {}\n{:<28} {:<44} tx hash\n",
            self.network, "contract", "address"
        );
        for entry in &self.contracts {
            let _ = writeln!(
                out,
                "{:<28} {:<44} {:#x}",
                entry.contract,
                format!("{:#x}", entry.address),
                entry.tx_hash
            );
        }
        if let Some(proxy) = &self.proxy {
            let _ = writeln!(
                out,
                "proxy: {:#x} -> logic {:#x}",
                proxy.proxy_address, proxy.logic_address
            );
        }
        out
    }

    /// Serialize the summary to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ScriptError> {
        serde_json::to_string_pretty(self).map_err(|e| ScriptError::Serde(e.to_string()))
    }
}
