use log::trace;
use tokio::sync::broadcast;
use tooling_model::BrokerEvent;

/// Events kept for each subscriber. A subscriber that falls further behind loses the oldest
/// events, and if that includes its broker's final event, its run ends with a broker timeout.
const EVENT_BUS_CAPACITY: usize = 64;

/// An in-process publish/subscribe channel for broker status events. Every subscriber sees every
/// event published after it subscribed, so listeners filter by workspace id.
#[derive(Debug, Clone)]
pub struct BrokerEventBus {
    sender: broadcast::Sender<BrokerEvent>,
}

impl Default for BrokerEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: BrokerEvent) {
        let runtime_id = event.runtime_id.clone();
        match self.sender.send(event) {
            Ok(receivers) => trace!(
                "Delivered broker event of '{}' to {} subscribers",
                runtime_id,
                receivers
            ),
            Err(_) => trace!(
                "Dropped broker event of '{}', nobody is subscribed",
                runtime_id
            ),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BrokerEvent> {
        self.sender.subscribe()
    }
}
