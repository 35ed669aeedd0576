#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # posledger-core
//!
//! The hard engineering of the posledger engine: the pure tax-lot primitives
//! (C2), the snapshot codec (C3), the effective-date classifier (C6), and
//! the two transactional appliers built on them — the synchronous hotpath
//! (C8) and the chronological-replay coldpath (C9) — plus the position-
//! identity audit trail (C10). Validation (C7), storage (C4/C5), and
//! external-collaborator contracts live in sibling crates; this crate wires
//! them into the sequences from spec §4.6 and §4.8.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::LedgerConfig;
pub use engine::{
    classify, compress, inflate, reduce_lots, AllocationResult, ColdpathOutcome,
    ColdpathRecalculator, ColdpathResult, EngineError, HotpathApplier, HotpathOutcome,
    HotpathResult, UpiRecorder, UtiIndex,
};
pub use error::LedgerError;
