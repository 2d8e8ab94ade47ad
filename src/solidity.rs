//! Definitions of Solidity functions called during deployment

use alloy_sol_types::sol;

sol! {
    /// The SwapX initializer, run against the proxy's storage context in the
    /// creation transaction, in place of a constructor
    function initialize(address swap_v2, address swap_v3) external;

    /// `ProxyAdmin.upgradeAndCall`, the only path through which the proxy's
    /// logic pointer can be retargeted
    function upgradeAndCall(address proxy, address implementation, bytes calldata data) external payable;
}
