//! The transaction submitter abstraction over the chain client
//!
//! All on-chain effects go through the [`TransactionSubmitter`] trait:
//! submission returns a transaction hash immediately, and confirmation is
//! awaited separately. The deploy and upgrade paths are generic over the
//! trait, so tests drive them against a scripted in-memory submitter
//! instead of a live chain.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, TransactionRequest, H256, U256},
};

use crate::constants::RECEIPT_POLL_INTERVAL;

/// A transaction to be submitted: a contract creation when `to` is absent,
/// a contract call otherwise
#[derive(Debug, Clone)]
pub struct TxRequest {
    /// The target of the call, or `None` for a contract creation
    pub to: Option<Address>,
    /// The creation bytecode or calldata
    pub data: Bytes,
    /// The gas price in wei, or `None` to defer to the node
    pub gas_price: Option<U256>,
}

impl TxRequest {
    /// A contract creation transaction
    pub fn creation(data: Bytes, gas_price: Option<U256>) -> Self {
        TxRequest {
            to: None,
            data,
            gas_price,
        }
    }

    /// A contract call transaction
    pub fn call(to: Address, data: Bytes, gas_price: Option<U256>) -> Self {
        TxRequest {
            to: Some(to),
            data,
            gas_price,
        }
    }
}

/// The terminal outcome of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// The transaction was included and succeeded
    Confirmed {
        /// The created contract's address, for creation transactions
        address: Option<Address>,
        /// The block in which the transaction was included
        block_number: u64,
    },
    /// The transaction was included but reverted
    Reverted {
        /// The revert reason, when the node surfaces one
        reason: Option<String>,
    },
}

/// An error surfaced by the underlying chain client
#[derive(Debug)]
pub struct SubmitterError(pub String);

impl Display for SubmitterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for SubmitterError {}

/// The interface to the chain through which all transactions flow
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit a transaction, returning its hash as soon as it is accepted
    /// by the node. Acceptance is not confirmation.
    async fn submit(&self, request: TxRequest) -> Result<H256, SubmitterError>;

    /// Await the terminal outcome of a previously submitted transaction.
    /// This resolves only once the transaction is included; callers bound
    /// the wait externally.
    async fn confirm(&self, tx_hash: H256) -> Result<TxOutcome, SubmitterError>;

    /// Read a raw storage slot of a deployed contract
    async fn storage_at(&self, address: Address, slot: H256) -> Result<H256, SubmitterError>;
}

/// A [`TransactionSubmitter`] backed by an ethers middleware stack
pub struct EthersSubmitter<M> {
    /// The signing client used to submit transactions
    client: Arc<M>,
}

impl<M> EthersSubmitter<M> {
    /// Wrap a configured client
    pub fn new(client: Arc<M>) -> Self {
        EthersSubmitter { client }
    }
}

#[async_trait]
impl<M: Middleware + 'static> TransactionSubmitter for EthersSubmitter<M> {
    async fn submit(&self, request: TxRequest) -> Result<H256, SubmitterError> {
        let mut tx = TransactionRequest::new().data(request.data);
        if let Some(to) = request.to {
            tx = tx.to(to);
        }
        if let Some(gas_price) = request.gas_price {
            tx = tx.gas_price(gas_price);
        }

        let pending = self
            .client
            .send_transaction(tx, None /* block */)
            .await
            .map_err(|e| SubmitterError(e.to_string()))?;

        Ok(*pending)
    }

    async fn confirm(&self, tx_hash: H256) -> Result<TxOutcome, SubmitterError> {
        loop {
            let receipt = self
                .client
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| SubmitterError(e.to_string()))?;

            if let Some(receipt) = receipt {
                let success = receipt.status.map(|s| s.as_u64() == 1).unwrap_or(true);
                return Ok(if success {
                    TxOutcome::Confirmed {
                        address: receipt.contract_address,
                        block_number: receipt.block_number.map(|b| b.as_u64()).unwrap_or_default(),
                    }
                } else {
                    // Receipts don't carry revert reasons; recovering one
                    // requires re-simulating the call
                    TxOutcome::Reverted { reason: None }
                });
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    async fn storage_at(&self, address: Address, slot: H256) -> Result<H256, SubmitterError> {
        self.client
            .get_storage_at(address, slot, None /* block */)
            .await
            .map_err(|e| SubmitterError(e.to_string()))
    }
}
