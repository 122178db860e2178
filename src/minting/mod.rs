//! Minting core.
//!
//! # Data Flow
//! ```text
//! MintBot (orchestrator.rs)
//!     → wait_for_readiness: MintContract::check_readiness (contract.rs)
//!     → run_until_target, per attempt (attempt.rs):
//!           readiness → TxBuilder::build (builder.rs, gas.rs) → Signer → send → poll receipt
//!     → metrics, wallet statistics, journal
//! ```

pub mod attempt;
pub mod builder;
pub mod contract;
pub mod gas;
pub mod orchestrator;

pub use attempt::{AttemptOutcome, AttemptState, MintAttempt};
pub use builder::{BuildFailure, TxBuilder};
pub use contract::{ContractError, MintContract};
pub use gas::{compute_gas_params, quote_gas, GasCaps};
pub use orchestrator::{BotError, MintBot, RunReport, RunStatus, RECENT_OUTCOMES};
