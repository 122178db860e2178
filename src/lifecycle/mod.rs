//! Lifecycle management.
//!
//! ```text
//! Ctrl-C (signals.rs) → Shutdown::trigger → every ShutdownSignal wakes
//!                                            → run loop stops at its next wait
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
