//! Scripts for deploying and upgrading the SwapX smart contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cli;
mod commands;
pub mod constants;
pub mod deployer;
pub mod errors;
pub mod network;
pub mod plan;
pub mod proxy;
pub mod report;
mod solidity;
pub mod submitter;
pub mod types;
pub mod utils;
