//! A single mint attempt, from readiness check to confirmed receipt.
//!
//! ```text
//! CheckingReadiness -> Building -> Signing -> Submitting -> AwaitingConfirmation
//!        |                |          |           |                |
//!     NotReady        BuildFailed SignFailed SendFailed   ConfirmedSuccess
//!                                                         ConfirmedFailure
//!                                                         TimedOut
//! ```

use std::fmt;
use std::time::Duration;

use alloy::primitives::{TxHash, U256};

use crate::blockchain::{ChainClient, MintReceipt, Signer};
use crate::config::ConfirmationConfig;
use crate::lifecycle::ShutdownSignal;
use crate::minting::builder::TxBuilder;
use crate::minting::contract::MintContract;

/// Intermediate states, logged as the attempt progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    CheckingReadiness,
    Building,
    Signing,
    Submitting,
    AwaitingConfirmation,
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttemptState::CheckingReadiness => "checking_readiness",
            AttemptState::Building => "building",
            AttemptState::Signing => "signing",
            AttemptState::Submitting => "submitting",
            AttemptState::AwaitingConfirmation => "awaiting_confirmation",
        };
        f.write_str(s)
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    NotReady,
    BuildFailed(String),
    SignFailed(String),
    SendFailed(String),
    ConfirmedSuccess(MintReceipt),
    /// Mined but reverted.
    ConfirmedFailure(MintReceipt),
    /// Sent, but no receipt within the polling window, or polling was
    /// cut short by shutdown.
    TimedOut(TxHash),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::ConfirmedSuccess(_))
    }

    /// Hash of the broadcast transaction, if it got that far.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            AttemptOutcome::ConfirmedSuccess(r) | AttemptOutcome::ConfirmedFailure(r) => Some(r.tx_hash),
            AttemptOutcome::TimedOut(hash) => Some(*hash),
            _ => None,
        }
    }

    pub fn receipt(&self) -> Option<&MintReceipt> {
        match self {
            AttemptOutcome::ConfirmedSuccess(r) | AttemptOutcome::ConfirmedFailure(r) => Some(r),
            _ => None,
        }
    }

    /// Short label used for metrics and the journal.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::NotReady => "not_ready",
            AttemptOutcome::BuildFailed(_) => "build_failed",
            AttemptOutcome::SignFailed(_) => "sign_failed",
            AttemptOutcome::SendFailed(_) => "send_failed",
            AttemptOutcome::ConfirmedSuccess(_) => "success",
            AttemptOutcome::ConfirmedFailure(_) => "reverted",
            AttemptOutcome::TimedOut(_) => "timed_out",
        }
    }
}

/// Borrowed collaborators for running attempts.
pub struct MintAttempt<'a> {
    pub client: &'a dyn ChainClient,
    pub signer: &'a Signer,
    pub contract: &'a MintContract,
    pub builder: &'a TxBuilder,
    pub confirmation: &'a ConfirmationConfig,
    /// Value sent with the mint call, in wei.
    pub value: U256,
}

impl MintAttempt<'_> {
    /// Drive one attempt to a terminal outcome. Never returns an error:
    /// every failure is folded into the outcome.
    ///
    /// Shutdown interrupts the wait between receipt polls.
    pub async fn run(&self, attempt: u64, shutdown: &mut ShutdownSignal) -> AttemptOutcome {
        self.enter(attempt, AttemptState::CheckingReadiness);
        if !self.contract.check_readiness(self.client).await {
            tracing::info!(attempt, "Mint not active yet");
            return AttemptOutcome::NotReady;
        }

        self.enter(attempt, AttemptState::Building);
        let candidate = match self
            .builder
            .build(self.client, self.signer.address(), self.contract, self.value)
            .await
        {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to build mint transaction");
                return AttemptOutcome::BuildFailed(e.to_string());
            }
        };

        self.enter(attempt, AttemptState::Signing);
        let raw = match self.signer.sign(candidate.to_request()).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(attempt, error = %e, "Failed to sign mint transaction");
                return AttemptOutcome::SignFailed(e.to_string());
            }
        };

        self.enter(attempt, AttemptState::Submitting);
        let tx_hash = match self.client.send_raw(raw).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to send mint transaction");
                return AttemptOutcome::SendFailed(e.to_string());
            }
        };
        tracing::info!(attempt, %tx_hash, nonce = candidate.nonce, "Mint transaction sent");

        self.enter(attempt, AttemptState::AwaitingConfirmation);
        self.await_confirmation(attempt, tx_hash, shutdown).await
    }

    async fn await_confirmation(
        &self,
        attempt: u64,
        tx_hash: TxHash,
        shutdown: &mut ShutdownSignal,
    ) -> AttemptOutcome {
        let interval = self.confirmation.poll_interval();
        for poll in 1..=self.confirmation.max_polls {
            match self.client.receipt(tx_hash).await {
                Ok(Some(receipt)) if receipt.success => {
                    tracing::info!(
                        attempt,
                        %tx_hash,
                        gas_used = receipt.gas_used,
                        block = ?receipt.block_number,
                        "Mint confirmed"
                    );
                    return AttemptOutcome::ConfirmedSuccess(receipt);
                }
                Ok(Some(receipt)) => {
                    tracing::warn!(attempt, %tx_hash, gas_used = receipt.gas_used, "Mint transaction reverted");
                    return AttemptOutcome::ConfirmedFailure(receipt);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(attempt, poll, error = %e, "Receipt lookup failed"),
            }
            if poll < self.confirmation.max_polls && !shutdown.sleep(interval).await {
                tracing::warn!(attempt, %tx_hash, poll, "Shutdown while awaiting confirmation");
                return AttemptOutcome::TimedOut(tx_hash);
            }
        }

        tracing::warn!(
            attempt,
            %tx_hash,
            window = ?confirmation_window(self.confirmation),
            "No receipt within polling window"
        );
        AttemptOutcome::TimedOut(tx_hash)
    }

    fn enter(&self, attempt: u64, state: AttemptState) {
        tracing::debug!(attempt, %state, "Attempt state");
    }
}

/// Total time the confirmation loop may wait.
pub fn confirmation_window(config: &ConfirmationConfig) -> Duration {
    config.poll_interval() * config.max_polls
}
