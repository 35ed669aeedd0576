#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! "posledger" facade crate
//!
//! Single entry point re-exporting the `posledger` ecosystem's crates under
//! one namespace, plus a [`system`] module that wires the hotpath/coldpath
//! appliers into a runnable worker pool. Most deployments depend on the
//! individual `posledger-*` crates directly and write their own transport;
//! this crate is for the common case of "just run the engine in-process".
//!
//! # Example
//! ```no_run
//! use posledger::core::LedgerConfig;
//! let _system = posledger::system::System::new(4, LedgerConfig::default());
//! ```

pub use posledger_core as core;
pub use posledger_execution as execution;
pub use posledger_instrument as instrument;
pub use posledger_integration as integration;
pub use posledger_risk as risk;

pub mod system;

pub use posledger_core::{LedgerConfig, LedgerError};
pub use posledger_instrument::{PositionKey, PositionState, SnapshotRecord, TradeEvent};

/// Single import for the common application surface.
pub mod prelude {
    pub use crate::core::{HotpathApplier, HotpathOutcome, LedgerConfig, LedgerError};
    pub use crate::instrument::{Direction, PositionKey, TradeEvent, TradeType};
    pub use crate::system::System;
}
