use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use membership_events::Subscription;
use membership_sales::{Sale, SaleDto, SaleEvent};

/// Channel carrying the line-item view of sales still in progress.
pub const TEMPORARY_SALES: &str = "temporarySales";

/// Channel carrying the id of a sale that just became final.
pub const FINISHED_SALE: &str = "finishedSale";

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

/// Outbound push to connected terminals.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, channel: &str, payload: Value) -> Result<(), BroadcastError>;
}

impl<B> Broadcaster for Arc<B>
where
    B: Broadcaster + ?Sized,
{
    fn broadcast(&self, channel: &str, payload: Value) -> Result<(), BroadcastError> {
        (**self).broadcast(channel, payload)
    }
}

/// Pushes sale changes to point-of-sale terminals.
///
/// Fed from the sale event bus, which only ever carries events of committed
/// transactions. Failures are logged and dropped: a terminal missing a push
/// never affects the sale itself.
pub struct SaleNotificationListener<B> {
    broadcaster: B,
}

impl<B> SaleNotificationListener<B>
where
    B: Broadcaster,
{
    pub fn new(broadcaster: B) -> Self {
        Self { broadcaster }
    }

    pub fn handle(&self, event: &SaleEvent) {
        match event {
            SaleEvent::Created(e) => self.notify(&e.sale),
            SaleEvent::Updated(e) => self.notify(&e.sale),
            SaleEvent::Deleted(_) => {}
        }
    }

    /// Drain `subscription` until the bus goes away. Blocking.
    pub fn run(&self, subscription: Subscription<SaleEvent>) {
        while let Ok(event) = subscription.recv() {
            self.handle(&event);
        }
        debug!("sale event bus closed; notification listener stopping");
    }

    fn notify(&self, sale: &Sale) {
        let (channel, payload) = if sale.is_finished() {
            (FINISHED_SALE, json!(sale.id_typed()))
        } else {
            match serde_json::to_value(SaleDto::from(sale)) {
                Ok(dto) => (TEMPORARY_SALES, dto),
                Err(error) => {
                    warn!(sale_id = %sale.id_typed(), %error, "could not encode sale for push");
                    return;
                }
            }
        };

        match self.broadcaster.broadcast(channel, payload) {
            Ok(()) => debug!(sale_id = %sale.id_typed(), channel, "sale change pushed"),
            Err(error) => warn!(sale_id = %sale.id_typed(), channel, %error, "sale change push dropped"),
        }
    }
}
