use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Domain events emitted by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderPlaced {
        order_id: i32,
        total_amount: Decimal,
        line_count: usize,
    },
    OrderDeleted(i32),

    ProductCreated(i32),
    ProductUpdated(i32),
    ProductDeleted(i32),

    BrandCreated(i32),
    BrandUpdated(i32),
    BrandDeleted(i32),

    OfferCreated(i32),
    OfferUpdated(i32),
    OfferDeleted(i32),
    /// Activation is exclusive; carries the ids that were deactivated
    OfferActivated {
        offer_id: i32,
        deactivated: Vec<i32>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event; a full or closed channel is logged and swallowed.
    /// Event delivery is never allowed to fail a request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Event dropped");
        }
    }
}

/// Background loop draining the event channel. Spawned once at startup;
/// exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderPlaced {
                order_id,
                total_amount,
                line_count,
            } => {
                info!(
                    order_id,
                    %total_amount,
                    line_count,
                    "Order placed"
                );
            }
            Event::OfferActivated {
                offer_id,
                deactivated,
            } => {
                info!(
                    offer_id,
                    deactivated = ?deactivated,
                    "Weekly offer activated"
                );
            }
            other => debug!(event = ?other, "Event processed"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        // Must not panic or error out
        sender.send_or_log(Event::ProductCreated(1)).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderPlaced {
                order_id: 7,
                total_amount: Decimal::new(5000, 2),
                line_count: 2,
            })
            .await
            .unwrap();

        match rx.recv().await {
            Some(Event::OrderPlaced { order_id, .. }) => assert_eq!(order_id, 7),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
