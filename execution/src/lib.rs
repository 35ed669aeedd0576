#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # posledger-execution
//!
//! Storage traits for the posledger engine and in-process reference
//! implementations: the append-only event log (C4), the per-position
//! snapshot table under optimistic concurrency control (C3), and the
//! trade-id idempotency registry (C5). Durable, partitioned deployments
//! implement the same traits against real storage; the in-memory types here
//! are what the worker pool and test suite run against.

pub mod error;
pub mod event_store;
pub mod idempotency;
pub mod snapshot_store;

pub use error::StoreError;
pub use event_store::{EventStore, InMemoryEventStore};
pub use idempotency::{IdempotencyRegistry, InMemoryIdempotencyRegistry};
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore};
