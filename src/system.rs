//! Wires the hotpath/coldpath appliers into a runnable worker pool over an
//! in-memory partitioned channel transport, standing in for the message-bus
//! bindings spec §6 names but leaves as deployment-owned glue (inbound
//! `trades`/`backdated-trades`, outbound `trade-applied-events`,
//! `provisional-trade-events`, `historical-position-corrected-events`).
//!
//! Messages are hashed by [`PositionKey`] to a fixed-size shard array so that
//! every trade for a given position lands on the same worker, in arrival
//! order (spec §5). Each shard owns its slice of the in-memory stores; a
//! real deployment would instead hand every shard the same durable store and
//! rely on the store's own per-row locking.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use fnv::FnvHasher;
use posledger_core::{ColdpathRecalculator, HotpathApplier, HotpathOutcome, LedgerConfig};
use posledger_execution::{InMemoryEventStore, InMemoryIdempotencyRegistry, InMemorySnapshotStore};
use posledger_instrument::{PositionKey, SnapshotRecord, TradeEvent};
use posledger_integration::{noop::NoopContractRulesProvider, ContractRulesProvider, StreamMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// One outbound event published by a shard, corresponding to spec §6's
/// `trade-applied-events` / `provisional-trade-events` /
/// `historical-position-corrected-events` streams. The facade does not
/// distinguish the three by separate channels; callers match on the
/// variant carried in [`HotpathOutcome`]/[`posledger_core::ColdpathOutcome`]
/// the same way an outbound-stream router would dispatch on topic.
pub type OutboundMessage = StreamMessage<SnapshotRecord>;

/// One shard of the worker pool: its own event/snapshot/idempotency stores
/// and a dedicated inbound channel. All trades for the position keys that
/// hash to this shard are processed here, strictly in arrival order.
struct Shard {
    events: InMemoryEventStore,
    snapshots: InMemorySnapshotStore,
    idempotency: InMemoryIdempotencyRegistry,
    contract_rules: Arc<dyn ContractRulesProvider>,
    config: LedgerConfig,
}

impl Shard {
    fn new(contract_rules: Arc<dyn ContractRulesProvider>, config: LedgerConfig) -> Self {
        Self {
            events: InMemoryEventStore::new(),
            snapshots: InMemorySnapshotStore::new(),
            idempotency: InMemoryIdempotencyRegistry::new(),
            contract_rules,
            config,
        }
    }

    fn applier(&self) -> HotpathApplier<'_> {
        HotpathApplier {
            events: &self.events,
            snapshots: &self.snapshots,
            idempotency: &self.idempotency,
            contract_rules: self.contract_rules.as_ref(),
            config: self.config.clone(),
        }
    }

    fn coldpath(&self) -> ColdpathRecalculator<'_> {
        ColdpathRecalculator {
            events: &self.events,
            snapshots: &self.snapshots,
            idempotency: &self.idempotency,
            contract_rules: self.contract_rules.as_ref(),
            uti_index: None,
            config: self.config.coldpath,
        }
    }

    fn process(&self, trade: TradeEvent, today: NaiveDate, out: &mpsc::UnboundedSender<OutboundMessage>) {
        match self.applier().apply(trade.clone(), today) {
            Ok(result) => match result.outcome {
                HotpathOutcome::Applied { snapshot } | HotpathOutcome::Duplicate { snapshot } => {
                    let _ = out.send(StreamMessage::new(snapshot.position_key.clone(), snapshot));
                }
                HotpathOutcome::RoutedToColdpath { provisional } => {
                    let position_key = provisional.position_key.clone();
                    let _ = out.send(StreamMessage::new(position_key.clone(), provisional));
                    self.run_coldpath(position_key, trade, out);
                }
                HotpathOutcome::SignChangeSplit { closed, opened } => {
                    let _ = out.send(StreamMessage::new(closed.position_key.clone(), closed));
                    let _ = out.send(StreamMessage::new(opened.position_key.clone(), opened.clone()));
                }
            },
            Err(err) => error!(trade_id = %trade.trade_id, %err, "hotpath rejected trade"),
        }
    }

    fn run_coldpath(&self, position_key: PositionKey, trade: TradeEvent, out: &mpsc::UnboundedSender<OutboundMessage>) {
        match self.coldpath().recalculate(&position_key, trade) {
            Ok(result) => {
                if let posledger_core::ColdpathOutcome::Corrected { snapshot, .. } = result.outcome {
                    let _ = out.send(StreamMessage::new(snapshot.position_key.clone(), snapshot));
                }
            }
            Err(err) => error!(%position_key, %err, "coldpath correction failed"),
        }
    }
}

fn shard_index(position_key: &PositionKey, shard_count: usize) -> usize {
    let mut hasher = FnvHasher::default();
    position_key.hash(&mut hasher);
    (hasher.finish() as usize) % shard_count
}

/// A running worker pool. Drop the sender half ([`System::inbound`]) to let
/// every shard drain and its worker task exit.
pub struct System {
    inbound: Vec<mpsc::UnboundedSender<TradeEvent>>,
    outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    workers: Vec<JoinHandle<()>>,
}

impl System {
    /// Spawns `shard_count` workers, each with its own in-memory stores and
    /// a `NoopContractRulesProvider`. Use [`System::with_contract_rules`] to
    /// wire a real contract-rules lookup.
    pub fn new(shard_count: usize, config: LedgerConfig) -> Self {
        Self::with_contract_rules(shard_count, config, Arc::new(NoopContractRulesProvider))
    }

    pub fn with_contract_rules(
        shard_count: usize,
        config: LedgerConfig,
        contract_rules: Arc<dyn ContractRulesProvider>,
    ) -> Self {
        assert!(shard_count > 0, "a worker pool needs at least one shard");
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let mut inbound = Vec::with_capacity(shard_count);
        let mut workers = Vec::with_capacity(shard_count);

        for shard_id in 0..shard_count {
            let (tx, mut rx) = mpsc::unbounded_channel::<TradeEvent>();
            let shard = Shard::new(contract_rules.clone(), config.clone());
            let outbound_tx = outbound_tx.clone();

            let handle = tokio::spawn(async move {
                info!(shard_id, "worker started");
                while let Some(trade) = rx.recv().await {
                    shard.process(trade, Utc::now().date_naive(), &outbound_tx);
                }
                info!(shard_id, "worker drained, exiting");
            });

            inbound.push(tx);
            workers.push(handle);
        }

        Self { inbound, outbound: outbound_rx, workers }
    }

    /// Routes `trade` to the shard its position key hashes to (spec §5:
    /// "partitioned by `position_key` at the transport layer"). Resolution
    /// of an absent `position_key` mirrors [`HotpathApplier`]'s own
    /// derivation so routing and application never disagree on the shard.
    pub fn submit(&self, trade: TradeEvent) -> Result<(), mpsc::error::SendError<TradeEvent>> {
        let key = trade.position_key.clone().unwrap_or_else(|| {
            let direction = posledger_instrument::Direction::from_signed_qty(trade.quantity)
                .unwrap_or(posledger_instrument::Direction::Long);
            PositionKey::generate(&trade.account, &trade.instrument, &trade.currency, direction)
        });
        let shard = shard_index(&key, self.inbound.len());
        self.inbound[shard].send(trade)
    }

    /// The outbound event stream: every applied, provisional, sign-change,
    /// or corrected snapshot produced by the pool, in emission order per
    /// shard (not globally ordered across shards).
    pub fn outbound(&mut self) -> &mut mpsc::UnboundedReceiver<OutboundMessage> {
        &mut self.outbound
    }

    /// Closes every inbound channel and waits for the workers to drain.
    pub async fn shutdown(mut self) {
        self.inbound.clear();
        for worker in self.workers.drain(..) {
            let _ = worker.await;
        }
    }
}
