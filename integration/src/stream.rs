use posledger_instrument::PositionKey;

/// Envelope for a message on one of the inbound/outbound streams named in
/// spec §6. At-least-once delivery is assumed; streams are partitioned by
/// [`PositionKey`] so all trades for a given position land on one worker, in
/// arrival order (spec §5).
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMessage<T> {
    pub partition_key: PositionKey,
    pub payload: T,
}

impl<T> StreamMessage<T> {
    pub fn new(partition_key: PositionKey, payload: T) -> Self {
        Self {
            partition_key,
            payload,
        }
    }
}
