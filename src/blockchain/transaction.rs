//! Candidate transactions and gas parameters.
//!
//! A candidate is built fresh for every attempt and dropped once signed.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;

/// Fee fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasParams {
    /// Pre-EIP-1559 pricing.
    Legacy { gas_price: u128 },
    /// EIP-1559 pricing.
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

impl GasParams {
    /// Highest price per gas this bid can pay.
    pub fn max_price_per_gas(&self) -> u128 {
        match *self {
            GasParams::Legacy { gas_price } => gas_price,
            GasParams::Eip1559 { max_fee_per_gas, .. } => max_fee_per_gas,
        }
    }

    fn apply(&self, tx: TransactionRequest) -> TransactionRequest {
        match *self {
            GasParams::Legacy { gas_price } => tx.with_gas_price(gas_price),
            GasParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => tx
                .with_max_fee_per_gas(max_fee_per_gas)
                .with_max_priority_fee_per_gas(max_priority_fee_per_gas),
        }
    }
}

/// A fully specified mint transaction, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCandidate {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub nonce: u64,
    pub chain_id: u64,
    pub gas_limit: u64,
    pub gas: GasParams,
    pub calldata: Bytes,
    /// Entry point the calldata targets, e.g. `publicMint()`.
    pub entry_point: String,
}

impl TransactionCandidate {
    /// Convert into a request the signer can build.
    pub fn to_request(&self) -> TransactionRequest {
        let tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.to)
            .with_value(self.value)
            .with_input(self.calldata.clone())
            .with_nonce(self.nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(self.gas_limit);
        self.gas.apply(tx)
    }
}
