use std::time::Duration;

/// Retry backoff shared by the hotpath applier and coldpath recalculator
/// (spec §4.6, §4.8). Both retry loops collide on the same shape of problem
/// — a concurrency-conflict signal on append or optimistic snapshot write —
/// and differ only in the delay curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffPolicy {
    /// `base * multiplier^(attempt - 1)`, capped at `cap_ms`. Used by the
    /// hotpath (25ms base, ×1.5, cap 200ms).
    Exponential {
        base_ms: u64,
        multiplier: f64,
        cap_ms: u64,
    },
    /// `step_ms * attempt`. Used by the coldpath (100ms × attempt).
    Linear { step_ms: u64 },
}

impl BackoffPolicy {
    pub const HOTPATH: Self = Self::Exponential {
        base_ms: 25,
        multiplier: 1.5,
        cap_ms: 200,
    };

    pub const COLDPATH: Self = Self::Linear { step_ms: 100 };

    /// Delay before the `attempt`-th retry (1-indexed: `attempt == 1` is the
    /// delay before the first retry, i.e. after the first failed try).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match *self {
            Self::Exponential {
                base_ms,
                multiplier,
                cap_ms,
            } => {
                let scaled = base_ms as f64 * multiplier.powi(attempt.saturating_sub(1) as i32);
                Duration::from_millis((scaled as u64).min(cap_ms))
            }
            Self::Linear { step_ms } => Duration::from_millis(step_ms * attempt as u64),
        }
    }
}
