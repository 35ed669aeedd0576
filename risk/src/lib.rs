#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! # posledger-risk
//!
//! Pre-apply checks for the posledger engine: field/bound validation of an
//! inbound trade (C7) and resolution of the tax-lot consumption method for a
//! contract. Neither check touches storage; both are pure functions over the
//! trade, optionally the current position state, and injected configuration.

pub mod contract_rules;
pub mod validator;

pub use contract_rules::resolve_tax_lot_method;
pub use validator::{ValidationError, Validator};
