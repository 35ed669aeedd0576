//! Standardized logging initialization for the posledger engine, mirroring
//! the human-readable/JSON split used elsewhere in this ecosystem.
//!
//! `RUST_LOG` controls verbosity as usual, e.g. `RUST_LOG=posledger_core=debug`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes human-readable logging with a noise filter over the
/// per-event coldpath replay span, which otherwise emits one span per
/// replayed event and drowns out everything else at `debug`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(ColdpathReplaySpanFilter)
        .init()
}

/// JSON logging for aggregators/observability pipelines.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .with(ColdpathReplaySpanFilter)
        .init()
}

pub const COLDPATH_REPLAY_EVENT_SPAN_NAME: &str = "coldpath_replay_event";

struct ColdpathReplaySpanFilter;

impl<S> tracing_subscriber::layer::Layer<S> for ColdpathReplaySpanFilter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn event_enabled(
        &self,
        _: &tracing::Event<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        if let Some(span) = ctx.lookup_current() {
            span.name() != COLDPATH_REPLAY_EVENT_SPAN_NAME
        } else {
            true
        }
    }
}
