//! Ordered deployment plans
//!
//! A plan lists the logic contracts to deploy, in order, followed by an
//! optional proxy step. Step arguments may only reference addresses produced
//! by strictly earlier steps or dependencies resolved in the network
//! profile; validation rejects anything else before a single transaction is
//! submitted.

use std::collections::{HashMap, HashSet};

use ethers::types::Address;

use crate::{
    constants::{SWAPX_CONTRACT_NAME, SWAP_V2_CONTRACT_NAME, SWAP_V3_CONTRACT_NAME},
    errors::ScriptError,
    network::NetworkProfile,
};

/// An address-valued argument to a plan step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanArg {
    /// A fixed address known up front
    Address(Address),
    /// The address produced by an earlier step, by step name
    Step(String),
    /// A dependency address from the network profile, by dependency name
    Dependency(String),
}

/// A single logic-contract deployment step
#[derive(Debug, Clone)]
pub struct DeployStep {
    /// The artifact name of the contract to deploy; doubles as the step name
    pub name: String,
    /// The constructor arguments for the deployment
    pub args: Vec<PlanArg>,
}

/// The proxy deployment step, always last in a plan
#[derive(Debug, Clone)]
pub struct ProxyStep {
    /// The step whose address the proxy delegates to
    pub logic: PlanArg,
    /// The arguments to the initializer run inside the creation transaction
    pub init_args: Vec<PlanArg>,
}

/// An ordered sequence of deployment steps, logic contracts before the proxy
/// that references them
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    /// The logic-contract deployment steps, in deployment order
    pub steps: Vec<DeployStep>,
    /// The proxy step, if the plan deploys a proxy
    pub proxy: Option<ProxyStep>,
}

impl DeploymentPlan {
    /// Check the plan against the profile: step names must be unique and
    /// every reference must resolve to a strictly earlier step or a resolved
    /// profile dependency
    pub fn validate(&self, profile: &NetworkProfile) -> Result<(), ScriptError> {
        let mut produced: HashSet<&str> = HashSet::new();

        for step in &self.steps {
            for arg in &step.args {
                check_arg(arg, &produced, profile)?;
            }
            if !produced.insert(&step.name) {
                return Err(ScriptError::PlanValidation(format!(
                    "duplicate step name `{}`",
                    step.name
                )));
            }
        }

        if let Some(proxy) = &self.proxy {
            check_arg(&proxy.logic, &produced, profile)?;
            for arg in &proxy.init_args {
                check_arg(arg, &produced, profile)?;
            }
        }

        Ok(())
    }
}

/// Check that a single argument references only already-produced addresses
fn check_arg(
    arg: &PlanArg,
    produced: &HashSet<&str>,
    profile: &NetworkProfile,
) -> Result<(), ScriptError> {
    match arg {
        PlanArg::Address(_) => Ok(()),
        PlanArg::Step(name) => {
            if produced.contains(name.as_str()) {
                Ok(())
            } else {
                Err(ScriptError::PlanValidation(format!(
                    "step argument references `{}`, which no earlier step produces",
                    name
                )))
            }
        }
        // Fails with `UnresolvedDependency` when the profile has no address,
        // rather than proceeding with a placeholder
        PlanArg::Dependency(name) => profile.dependency(name).map(|_| ()),
    }
}

/// Resolve a plan argument to a concrete address, given the addresses
/// produced so far
pub fn resolve_arg(
    arg: &PlanArg,
    produced: &HashMap<String, Address>,
    profile: &NetworkProfile,
) -> Result<Address, ScriptError> {
    match arg {
        PlanArg::Address(address) => Ok(*address),
        PlanArg::Step(name) => produced.get(name).copied().ok_or_else(|| {
            ScriptError::PlanValidation(format!("step `{}` has not produced an address", name))
        }),
        PlanArg::Dependency(name) => profile.dependency(name),
    }
}

/// The standard fresh-deployment plan: both swap logic libraries, the SwapX
/// implementation, then the proxy initialized with the library addresses
pub fn swapx_plan() -> DeploymentPlan {
    DeploymentPlan {
        steps: vec![
            DeployStep {
                name: SWAP_V2_CONTRACT_NAME.to_string(),
                args: vec![],
            },
            DeployStep {
                name: SWAP_V3_CONTRACT_NAME.to_string(),
                args: vec![],
            },
            DeployStep {
                name: SWAPX_CONTRACT_NAME.to_string(),
                args: vec![],
            },
        ],
        proxy: Some(ProxyStep {
            logic: PlanArg::Step(SWAPX_CONTRACT_NAME.to_string()),
            init_args: vec![
                PlanArg::Step(SWAP_V2_CONTRACT_NAME.to_string()),
                PlanArg::Step(SWAP_V3_CONTRACT_NAME.to_string()),
            ],
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::{errors::ScriptError, network};

    use super::{swapx_plan, DeployStep, DeploymentPlan, PlanArg, ProxyStep};

    #[test]
    fn test_swapx_plan_is_valid() {
        let profile = network::resolve("sepolia").unwrap();
        swapx_plan().validate(&profile).unwrap();
    }

    #[test]
    fn test_forward_reference_rejected() {
        let profile = network::resolve("sepolia").unwrap();
        let plan = DeploymentPlan {
            steps: vec![
                DeployStep {
                    name: "SwapX".to_string(),
                    // References a step that only runs afterwards
                    args: vec![PlanArg::Step("SwapV2".to_string())],
                },
                DeployStep {
                    name: "SwapV2".to_string(),
                    args: vec![],
                },
            ],
            proxy: None,
        };
        assert!(matches!(
            plan.validate(&profile),
            Err(ScriptError::PlanValidation(_))
        ));
    }

    #[test]
    fn test_self_reference_rejected() {
        let profile = network::resolve("sepolia").unwrap();
        let plan = DeploymentPlan {
            steps: vec![DeployStep {
                name: "SwapX".to_string(),
                args: vec![PlanArg::Step("SwapX".to_string())],
            }],
            proxy: None,
        };
        assert!(plan.validate(&profile).is_err());
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let profile = network::resolve("sepolia").unwrap();
        let plan = DeploymentPlan {
            steps: vec![
                DeployStep {
                    name: "SwapV2".to_string(),
                    args: vec![],
                },
                DeployStep {
                    name: "SwapV2".to_string(),
                    args: vec![],
                },
            ],
            proxy: None,
        };
        assert!(matches!(
            plan.validate(&profile),
            Err(ScriptError::PlanValidation(_))
        ));
    }

    #[test]
    fn test_unresolved_dependency_rejected() {
        let profile = network::resolve("sepolia").unwrap();
        let plan = DeploymentPlan {
            steps: vec![],
            proxy: Some(ProxyStep {
                logic: PlanArg::Dependency("swap_x".to_string()),
                init_args: vec![],
            }),
        };
        assert!(matches!(
            plan.validate(&profile),
            Err(ScriptError::UnresolvedDependency(_))
        ));
    }

    #[test]
    fn test_profile_dependency_accepted() {
        let profile = network::resolve("sepolia").unwrap();
        let plan = DeploymentPlan {
            steps: vec![DeployStep {
                name: "SwapX".to_string(),
                args: vec![PlanArg::Dependency("weth".to_string())],
            }],
            proxy: None,
        };
        plan.validate(&profile).unwrap();
    }
}
