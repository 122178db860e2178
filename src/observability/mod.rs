//! Observability subsystem.
//!
//! ```text
//! minting core ──▶ logging.rs  (tracing events, fmt to stderr)
//!              ──▶ metrics.rs  (counters and histograms, Prometheus scrape)
//!              ──▶ journal.rs  (daily JSON file of sent transactions)
//! ```

pub mod journal;
pub mod logging;
pub mod metrics;

pub use journal::{Journal, JournalEntry};
