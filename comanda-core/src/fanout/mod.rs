//! Notification fanout - routing table plus fire-and-forget dispatch
//!
//! Every committed mutation maps to a fixed set of (topic, payload) rows.
//! The table is pure and exhaustively tested; dispatch happens after the
//! commit and never fails the command that triggered it.

use crate::inventory::LowStockAlert;
use async_trait::async_trait;
use shared::{FanoutMessage, FanoutPayload, Order, OrderStatus, Topic};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// A committed mutation the engine routes
#[derive(Debug, Clone)]
pub enum DomainEvent {
    OrderCreated(Order),
    OrderLinesReplaced(Order),
    OrderStatusChanged {
        order: Order,
        previous: OrderStatus,
    },
    MenuItemAvailability {
        item_id: String,
        name: String,
        available: bool,
    },
    LowStock(LowStockAlert),
}

/// Routing table
///
/// | Event                   | Topics                            | Payload        |
/// |-------------------------|-----------------------------------|----------------|
/// | order created           | kitchen, service-staff, management | full order     |
/// | lines edited            | kitchen, service-staff            | full order     |
/// | status -> preparing     | kitchen, service-staff            | full order     |
/// | status -> ready         | service-staff                     | summary        |
/// | status -> charged       | front-desk                        | summary        |
/// | status -> paid          | front-desk                        | summary        |
/// | status -> cancelled/other | kitchen, service-staff          | status delta   |
/// | item availability       | service-staff, management         | item fields    |
/// | low stock               | management                        | alert fields   |
pub fn route(event: &DomainEvent) -> Vec<FanoutMessage> {
    match event {
        DomainEvent::OrderCreated(order) => {
            fan(&[Topic::Kitchen, Topic::ServiceStaff, Topic::Management], || {
                FanoutPayload::OrderCreated {
                    order: order.clone(),
                }
            })
        }
        DomainEvent::OrderLinesReplaced(order) => {
            fan(&[Topic::Kitchen, Topic::ServiceStaff], || {
                FanoutPayload::OrderUpdated {
                    order: order.clone(),
                }
            })
        }
        DomainEvent::OrderStatusChanged { order, .. } => match order.status {
            OrderStatus::Preparing => fan(&[Topic::Kitchen, Topic::ServiceStaff], || {
                FanoutPayload::OrderUpdated {
                    order: order.clone(),
                }
            }),
            OrderStatus::Ready => fan(&[Topic::ServiceStaff], || FanoutPayload::OrderReady {
                order: order.summary(),
            }),
            OrderStatus::ChargedToRoom => {
                fan(&[Topic::FrontDesk], || FanoutPayload::OrderChargedToRoom {
                    order: order.summary(),
                })
            }
            OrderStatus::Paid => fan(&[Topic::FrontDesk], || FanoutPayload::OrderPaid {
                order: order.summary(),
            }),
            OrderStatus::Served | OrderStatus::Cancelled => {
                fan(&[Topic::Kitchen, Topic::ServiceStaff], || {
                    FanoutPayload::OrderStatusChanged {
                        order_id: order.id.clone(),
                        status: order.status,
                    }
                })
            }
            // Orders are created Pending; nothing transitions back into it
            OrderStatus::Pending => Vec::new(),
        },
        DomainEvent::MenuItemAvailability {
            item_id,
            name,
            available,
        } => fan(&[Topic::ServiceStaff, Topic::Management], || {
            FanoutPayload::MenuItemAvailability {
                item_id: item_id.clone(),
                name: name.clone(),
                available: *available,
            }
        }),
        DomainEvent::LowStock(alert) => fan(&[Topic::Management], || {
            FanoutPayload::LowStockAlert {
                component_id: alert.component_id.clone(),
                name: alert.name.clone(),
                quantity: alert.quantity,
                threshold: alert.threshold,
            }
        }),
    }
}

fn fan(topics: &[Topic], payload: impl Fn() -> FanoutPayload) -> Vec<FanoutMessage> {
    topics
        .iter()
        .map(|&topic| FanoutMessage {
            topic,
            payload: payload(),
        })
        .collect()
}

/// External delivery seam (websocket hub, message broker, printer relay)
///
/// Failures are logged and swallowed; delivery never feeds back into the
/// command that produced the event.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn publish(&self, message: FanoutMessage) -> anyhow::Result<()>;
}

/// Fire-and-forget dispatcher
///
/// In-process subscribers attach through [`FanoutEngine::subscribe`]; a
/// [`PublishSink`] worker spawned with [`FanoutEngine::run_sink`] carries
/// messages out of the process.
#[derive(Clone)]
pub struct FanoutEngine {
    message_tx: broadcast::Sender<FanoutMessage>,
}

impl FanoutEngine {
    pub fn new(capacity: usize) -> Self {
        let (message_tx, _) = broadcast::channel(capacity);
        Self { message_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FanoutMessage> {
        self.message_tx.subscribe()
    }

    /// Route and dispatch one event
    ///
    /// Returns the routed messages so callers and tests can observe what was
    /// sent without subscribing.
    pub fn dispatch(&self, event: &DomainEvent) -> Vec<FanoutMessage> {
        let messages = route(event);
        for message in &messages {
            tracing::debug!(topic = %message.topic, "Dispatching fanout message");
            if self.message_tx.send(message.clone()).is_err() {
                tracing::warn!(topic = %message.topic, "Fanout broadcast failed: no active receivers");
            }
        }
        messages
    }

    /// Forward every dispatched message to an external sink until cancelled
    ///
    /// Delivery is best-effort: publish failures are logged, a lagging sink
    /// skips messages rather than backpressuring command handlers.
    pub fn run_sink(
        &self,
        sink: Arc<dyn PublishSink>,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    result = rx.recv() => match result {
                        Ok(message) => {
                            let topic = message.topic;
                            if let Err(e) = sink.publish(message).await {
                                tracing::warn!(topic = %topic, "External publish failed: {}", e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "External sink lagged, messages dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("External sink worker stopped");
        })
    }
}
