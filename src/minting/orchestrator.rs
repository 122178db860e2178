//! Run loop: wait for the mint to open, then attempt until the target is met.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::{ChainClient, Signer};
use crate::config::{ConfirmationConfig, MintBotConfig, RunMode};
use crate::keystore::{KeyStore, KeyStoreError, KvStore};
use crate::lifecycle::ShutdownSignal;
use crate::minting::attempt::{AttemptOutcome, MintAttempt};
use crate::minting::builder::TxBuilder;
use crate::minting::contract::MintContract;
use crate::observability::{metrics, Journal, JournalEntry};

/// How many outcomes a report keeps verbatim; older ones survive only in
/// the per-label counts.
pub const RECENT_OUTCOMES: usize = 100;

/// Errors that stop a run before the first attempt.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not decrypt wallet '{wallet}': {reason}")]
    Decryption { wallet: String, reason: String },

    #[error("Key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    TargetReached,
    /// Only reachable when the retry ceiling is enforced.
    RetryLimitReached,
    Interrupted,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub attempts: u64,
    pub successes: u64,
    pub target: u64,
    pub status: RunStatus,
    /// Attempts per outcome label, over the whole run.
    pub outcome_counts: BTreeMap<&'static str, u64>,
    /// The last `RECENT_OUTCOMES` outcomes, oldest first.
    pub outcomes: Vec<AttemptOutcome>,
}

/// Owns one mint run for a single wallet on a single network.
pub struct MintBot<S> {
    run_id: Uuid,
    network: String,
    wallet: String,
    signer: Signer,
    contract: MintContract,
    client: Arc<dyn ChainClient>,
    key_store: KeyStore<S>,
    journal: Option<Journal>,
    shutdown: ShutdownSignal,
    builder: TxBuilder,
    confirmation: ConfirmationConfig,
    value: U256,
    retry_delay: Duration,
    check_interval: Duration,
    retry_limit: Option<u64>,
    attempts: u64,
    successes: u64,
    outcome_counts: BTreeMap<&'static str, u64>,
    outcomes: VecDeque<AttemptOutcome>,
}

impl<S: KvStore> MintBot<S> {
    /// Prepare a run. Unlocks the configured wallet, so a wrong encryption
    /// key fails here and no transaction is ever built.
    pub fn new(
        config: &MintBotConfig,
        key_store: KeyStore<S>,
        client: Arc<dyn ChainClient>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, BotError> {
        let wallet = config
            .bot
            .wallet
            .clone()
            .ok_or_else(|| BotError::Configuration("no wallet selected".into()))?;
        let contract =
            MintContract::from_config(&config.contract).map_err(|e| BotError::Configuration(e.to_string()))?;
        let value = parse_ether(config.contract.mint_price.trim())
            .map_err(|e| BotError::Configuration(format!("contract.mint_price: {}", e)))?;

        let signer = key_store.unlock(&wallet).map_err(|e| match e {
            KeyStoreError::Decryption(reason) => BotError::Decryption {
                wallet: wallet.clone(),
                reason,
            },
            other => BotError::KeyStore(other),
        })?;

        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            network = %config.bot.network,
            wallet = %wallet,
            address = %signer.address(),
            contract = %contract.address(),
            mint_price = %config.contract.mint_price,
            "Mint bot ready"
        );

        Ok(Self {
            run_id,
            network: config.bot.network.clone(),
            wallet,
            signer,
            contract,
            client,
            key_store,
            journal: None,
            shutdown,
            builder: TxBuilder::new(&config.gas),
            confirmation: config.confirmation.clone(),
            value,
            retry_delay: config.bot.retry_delay(),
            check_interval: config.bot.check_interval(),
            retry_limit: config
                .bot
                .enforce_retry_limit
                .then_some(u64::from(config.bot.retry_count)),
            attempts: 0,
            successes: 0,
            outcome_counts: BTreeMap::new(),
            outcomes: VecDeque::new(),
        })
    }

    /// Record every broadcast transaction in `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Run in the given mode until `target` mints succeed.
    pub async fn run(&mut self, mode: RunMode, target: u64) -> RunReport {
        match mode {
            RunMode::Monitor => self.monitor_and_mint(target).await,
            RunMode::Immediate => self.run_until_target(target).await,
        }
    }

    /// Poll readiness every `check_interval` until the mint opens.
    ///
    /// Returns `false` if interrupted first.
    pub async fn wait_for_readiness(&mut self) -> bool {
        tracing::info!(interval = ?self.check_interval, "Waiting for mint to open");
        loop {
            let ready = self.contract.check_readiness(self.client.as_ref()).await;
            metrics::record_readiness_check(ready);
            if ready {
                tracing::info!("Mint is live");
                return true;
            }
            tracing::debug!("Mint not active yet");
            if !self.shutdown.sleep(self.check_interval).await {
                return false;
            }
        }
    }

    /// Wait for the mint to open, then run until `target` succeeds.
    pub async fn monitor_and_mint(&mut self, target: u64) -> RunReport {
        if !self.wait_for_readiness().await {
            return self.report(target, RunStatus::Interrupted);
        }
        self.run_until_target(target).await
    }

    /// Attempt repeatedly until `target` mints are confirmed.
    pub async fn run_until_target(&mut self, target: u64) -> RunReport {
        tracing::info!(run_id = %self.run_id, target, "Starting mint loop");

        while self.successes < target {
            if self.shutdown.is_triggered() {
                return self.report(target, RunStatus::Interrupted);
            }
            if let Some(limit) = self.retry_limit {
                if self.attempts >= limit {
                    tracing::warn!(attempts = self.attempts, limit, "Retry limit reached");
                    return self.report(target, RunStatus::RetryLimitReached);
                }
            }

            self.attempts += 1;
            tracing::info!(
                attempt = self.attempts,
                successes = self.successes,
                target,
                "Mint attempt"
            );

            let outcome = MintAttempt {
                client: self.client.as_ref(),
                signer: &self.signer,
                contract: &self.contract,
                builder: &self.builder,
                confirmation: &self.confirmation,
                value: self.value,
            }
            .run(self.attempts, &mut self.shutdown)
            .await;

            self.after_attempt(&outcome);
            let success = outcome.is_success();
            *self.outcome_counts.entry(outcome.label()).or_default() += 1;
            if self.outcomes.len() == RECENT_OUTCOMES {
                self.outcomes.pop_front();
            }
            self.outcomes.push_back(outcome);

            if success {
                self.successes += 1;
                tracing::info!(successes = self.successes, target, "Mint succeeded");
            } else if !self.shutdown.sleep(self.retry_delay).await {
                return self.report(target, RunStatus::Interrupted);
            }
        }

        tracing::info!(attempts = self.attempts, successes = self.successes, "Target reached");
        self.report(target, RunStatus::TargetReached)
    }

    fn after_attempt(&self, outcome: &AttemptOutcome) {
        metrics::record_attempt(outcome.label());
        if outcome.is_success() {
            metrics::record_success();
        }

        let receipt = outcome.receipt();
        let fee_wei = receipt.map(|r| r.fee_paid_wei()).unwrap_or_default();
        if receipt.is_some() {
            metrics::record_gas_spent(wei_to_f64(fee_wei, 0));
        }

        if let Err(e) = self
            .key_store
            .record_attempt(&self.wallet, outcome.is_success(), wei_to_f64(fee_wei, 18))
        {
            tracing::warn!(wallet = %self.wallet, error = %e, "Failed to update wallet statistics");
        }

        // Only broadcast transactions are journaled
        let Some(tx_hash) = outcome.tx_hash() else {
            return;
        };
        if let Some(journal) = &self.journal {
            let entry = JournalEntry {
                tx_hash: tx_hash.to_string(),
                network: self.network.clone(),
                status: outcome.label().to_string(),
                gas_used: receipt.map(|r| r.gas_used).unwrap_or(0),
                gas_price_gwei: receipt
                    .map(|r| r.effective_gas_price as f64 / 1e9)
                    .unwrap_or(0.0),
                value_eth: format_ether(self.value).parse().unwrap_or(0.0),
                timestamp: Utc::now(),
            };
            if let Err(e) = journal.append(&entry) {
                tracing::warn!(dir = %journal.dir().display(), error = %e, "Failed to write journal entry");
            }
        }
    }

    fn report(&self, target: u64, status: RunStatus) -> RunReport {
        RunReport {
            run_id: self.run_id,
            attempts: self.attempts,
            successes: self.successes,
            target,
            status,
            outcome_counts: self.outcome_counts.clone(),
            outcomes: self.outcomes.iter().cloned().collect(),
        }
    }
}

/// Lossy conversion for statistics; `decimals` = 18 gives ether.
fn wei_to_f64(wei: U256, decimals: i32) -> f64 {
    let whole: f64 = wei.to_string().parse().unwrap_or(0.0);
    whole / 10f64.powi(decimals)
}
