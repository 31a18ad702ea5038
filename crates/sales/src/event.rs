use chrono::{DateTime, Utc};

use membership_core::SaleId;
use membership_events::Event;

use crate::sale::Sale;

/// Event: a sale was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleCreated {
    pub sale: Sale,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a sale was updated (carries the sale as persisted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleUpdated {
    pub sale: Sale,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a sale was deleted (carries the sale as it was before deletion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDeleted {
    pub sale: Sale,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleEvent {
    Created(SaleCreated),
    Updated(SaleUpdated),
    Deleted(SaleDeleted),
}

impl SaleEvent {
    pub fn sale(&self) -> &Sale {
        match self {
            SaleEvent::Created(e) => &e.sale,
            SaleEvent::Updated(e) => &e.sale,
            SaleEvent::Deleted(e) => &e.sale,
        }
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale().id_typed()
    }
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::Created(_) => "sale.created",
            SaleEvent::Updated(_) => "sale.updated",
            SaleEvent::Deleted(_) => "sale.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::Created(e) => e.occurred_at,
            SaleEvent::Updated(e) => e.occurred_at,
            SaleEvent::Deleted(e) => e.occurred_at,
        }
    }
}
