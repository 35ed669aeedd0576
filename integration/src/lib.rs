#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # posledger-integration
//!
//! Low-level glue shared by the rest of the `posledger` workspace: fast
//! collection aliases, the hotpath/coldpath retry backoff policy, the
//! partitioned stream envelope, and contract-only traits for the external
//! collaborators named (but intentionally not implemented) by spec §6 —
//! contract-rules lookup, entitlements, metrics, and regulatory submission.

pub mod backoff;
pub mod collaborators;
pub mod collection;
pub mod stream;

pub use backoff::BackoffPolicy;
pub use collaborators::{
    noop, ContractRules, ContractRulesProvider, EntitlementsService, MetricsSink, RegulatorySink,
};
pub use collection::{FnvIndexMap, FnvIndexSet};
pub use stream::StreamMessage;
