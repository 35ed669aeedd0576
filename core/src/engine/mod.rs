//! Pure/near-pure engine primitives (C2, C3, C6) and the two transactional
//! appliers built on top of them (C8, C9).

pub mod classifier;
pub mod coldpath;
pub mod hotpath;
pub mod materialize;
pub mod snapshot_codec;
pub mod tax_lot;
pub mod upi;

pub use classifier::classify;
pub use coldpath::{ColdpathOutcome, ColdpathRecalculator, ColdpathResult, UtiIndex};
pub use hotpath::{HotpathApplier, HotpathOutcome, HotpathResult};
pub use snapshot_codec::{compress, inflate};
pub use tax_lot::{add_lot, reduce_lots, AllocationResult, EngineError};
pub use upi::UpiRecorder;
