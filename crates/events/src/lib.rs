//! Domain events and their in-process distribution.
//!
//! Events describe facts that already happened inside a committed transaction.
//! They are collected in an [`Outbox`] while the transaction runs and handed to
//! an [`EventBus`] only once it has committed.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod outbox;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use outbox::Outbox;
