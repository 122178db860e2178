//! Persisted wallet record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One wallet as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub name: String,
    /// EIP-55 checksummed address derived from the private key.
    pub address: String,
    pub private_key_encrypted: String,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_mints: u64,
    #[serde(default)]
    pub successful_mints: u64,
    #[serde(default)]
    pub failed_mints: u64,
    /// Cumulative fees paid, in native currency units.
    #[serde(default)]
    pub total_gas_spent: f64,
    /// Percentage of attempts that minted.
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WalletRecord {
    pub fn new(name: &str, address: String, private_key_encrypted: String, now: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            address,
            private_key_encrypted,
            created_at: now,
            last_used: None,
            total_mints: 0,
            successful_mints: 0,
            failed_mints: 0,
            total_gas_spent: 0.0,
            success_rate: 0.0,
            tags: Vec::new(),
        }
    }

    /// Fold one finished mint attempt into the counters.
    pub fn record_attempt(&mut self, success: bool, gas_spent: f64, now: DateTime<Utc>) {
        self.last_used = Some(now);
        self.total_mints += 1;
        if success {
            self.successful_mints += 1;
        } else {
            self.failed_mints += 1;
        }
        self.total_gas_spent += gas_spent;
        self.success_rate = self.successful_mints as f64 / self.total_mints as f64 * 100.0;
    }
}
