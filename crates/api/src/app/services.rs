use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{debug, info};

use membership_events::{EventBus, InMemoryEventBus};
use membership_infra::{
    listeners::{BroadcastError, Broadcaster, SaleNotificationListener},
    services::{AdherentService, SaleService, StockService},
    store::InMemoryStore,
};
use membership_sales::SaleEvent;

use crate::config::Sales as SalesSettings;

/// Realtime message pushed to terminals via SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    /// SSE event name (`temporarySales`, `finishedSale`).
    pub topic: String,
    pub payload: Value,
}

/// [`Broadcaster`] that fans messages out to every connected SSE client.
#[derive(Debug, Clone)]
pub struct SseBroadcaster {
    tx: broadcast::Sender<RealtimeMessage>,
}

impl SseBroadcaster {
    pub fn new(tx: broadcast::Sender<RealtimeMessage>) -> Self {
        Self { tx }
    }
}

impl Broadcaster for SseBroadcaster {
    fn broadcast(&self, channel: &str, payload: Value) -> Result<(), BroadcastError> {
        // Lossy: with no terminal connected the message is simply dropped.
        match self.tx.send(RealtimeMessage {
            topic: channel.to_string(),
            payload,
        }) {
            Ok(receivers) => debug!(channel, receivers, "realtime message sent"),
            Err(_) => debug!(channel, "no realtime subscriber"),
        }
        Ok(())
    }
}

pub type SharedStore = Arc<InMemoryStore>;
pub type SaleBus = Arc<InMemoryEventBus<SaleEvent>>;

pub struct AppServices {
    pub sales: SaleService<SharedStore, SaleBus>,
    pub stock: StockService<SharedStore>,
    pub adherents: AdherentService<SharedStore>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

impl AppServices {
    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }
}

/// Wire the in-memory store, the sale event bus and the notification listener.
///
/// Must be called from within a Tokio runtime: the listener drains the bus on
/// a blocking task until the bus is dropped.
pub fn build_services(settings: &SalesSettings) -> AppServices {
    let store: SharedStore = Arc::new(InMemoryStore::new());
    let bus: SaleBus = Arc::new(InMemoryEventBus::new());
    let (realtime_tx, _) = broadcast::channel(settings.realtime_capacity.max(1));

    // Subscribe before any sale can be published.
    let subscription = bus.subscribe();
    let listener = SaleNotificationListener::new(SseBroadcaster::new(realtime_tx.clone()));
    tokio::task::spawn_blocking(move || listener.run(subscription));

    info!(
        price_change_policy = ?settings.price_change_policy,
        "services ready (in-memory store)"
    );

    AppServices {
        sales: SaleService::new(store.clone(), bus)
            .with_price_change_policy(settings.price_change_policy),
        stock: StockService::new(store.clone()),
        adherents: AdherentService::new(store),
        realtime_tx,
    }
}

/// SSE stream of sale notifications for one terminal.
pub fn sale_sse_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(m) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "null".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        // Lagged: the terminal missed pushes; keep the stream open.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
