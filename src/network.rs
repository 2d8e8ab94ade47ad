//! Resolution of per-network deployment configuration
//!
//! All network-specific addresses and parameters live in the static table
//! below; the rest of the scripts consume only the resolved
//! [`NetworkProfile`]. Supporting a new network means adding a table entry.

use std::{collections::BTreeMap, str::FromStr};

use ethers::types::{Address, U256};

use crate::{errors::ScriptError, types::GasPolicy};

/// One entry in the static network table
struct NetworkEntry {
    /// The network identifier, as passed on the CLI
    id: &'static str,
    /// The chain id of the network
    chain_id: u64,
    /// The fixed gas price for the network, in wei
    gas_price_wei: u128,
    /// The fixed dependency addresses known for the network.
    /// Dependencies not yet deployed on a network are simply absent,
    /// never present with a placeholder address.
    dependencies: &'static [(&'static str, &'static str)],
}

/// The supported networks and their fixed parameters
const NETWORKS: &[NetworkEntry] = &[
    NetworkEntry {
        id: "eth_main",
        chain_id: 1,
        gas_price_wei: 13_000_000_000,
        dependencies: &[("weth", "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")],
    },
    NetworkEntry {
        id: "sepolia",
        chain_id: 11_155_111,
        gas_price_wei: 330_000_000_000,
        dependencies: &[("weth", "0x7b79995e5f793A07Bc00c21412e50Ecae098E7f9")],
    },
];

/// The resolved configuration for a single network, immutable for the
/// duration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    /// The network identifier the profile was resolved from
    pub network_id: String,
    /// The chain id of the network
    pub chain_id: u64,
    /// The resolved dependency addresses, keyed by dependency name
    pub dependencies: BTreeMap<String, Address>,
    /// The gas parameters to apply to every transaction on this network
    pub gas_policy: GasPolicy,
}

impl NetworkProfile {
    /// Look up a dependency address, failing if the dependency is not
    /// resolved for this network
    pub fn dependency(&self, name: &str) -> Result<Address, ScriptError> {
        self.dependencies.get(name).copied().ok_or_else(|| {
            ScriptError::UnresolvedDependency(format!(
                "`{}` is not deployed on network `{}`",
                name, self.network_id
            ))
        })
    }
}

/// Resolve a network identifier to its profile.
///
/// Deterministic and side-effect free; fails with
/// [`ScriptError::UnknownNetwork`] for identifiers outside the supported set.
pub fn resolve(network_id: &str) -> Result<NetworkProfile, ScriptError> {
    let entry = NETWORKS
        .iter()
        .find(|entry| entry.id == network_id)
        .ok_or_else(|| ScriptError::UnknownNetwork(network_id.to_string()))?;

    let mut dependencies = BTreeMap::new();
    for (name, addr) in entry.dependencies {
        let address = Address::from_str(addr)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
        dependencies.insert(name.to_string(), address);
    }

    Ok(NetworkProfile {
        network_id: entry.id.to_string(),
        chain_id: entry.chain_id,
        dependencies,
        gas_policy: GasPolicy {
            gas_price: Some(U256::from(entry.gas_price_wei)),
        },
    })
}
