//! Events recorded during a transaction and published after it commits.

use tracing::warn;

use crate::bus::EventBus;

/// Buffer of messages produced by a unit of work.
///
/// A transaction records into the outbox; if it rolls back the outbox is simply
/// dropped, so nothing is ever published for work that did not commit.
#[derive(Debug, Clone)]
pub struct Outbox<M> {
    pending: Vec<M>,
}

impl<M> Outbox<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: M) {
        self.pending.push(message);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Publish every recorded message in order.
    ///
    /// A failed publish is logged and skipped; it never stops later messages.
    /// Returns how many messages were handed to the bus successfully.
    pub fn publish_to<B>(self, bus: &B) -> usize
    where
        B: EventBus<M> + ?Sized,
    {
        let mut delivered = 0;
        for message in self.pending {
            match bus.publish(message) {
                Ok(()) => delivered += 1,
                Err(error) => warn!(?error, "dropping event after commit: publish failed"),
            }
        }
        delivered
    }
}

impl<M> Default for Outbox<M> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Subscription;
    use crate::in_memory_bus::InMemoryEventBus;
    use std::sync::mpsc;

    struct FailingBus;

    impl EventBus<u32> for FailingBus {
        type Error = &'static str;

        fn publish(&self, message: u32) -> Result<(), Self::Error> {
            if message == 2 { Err("boom") } else { Ok(()) }
        }

        fn subscribe(&self) -> Subscription<u32> {
            let (_tx, rx) = mpsc::channel();
            Subscription::new(rx)
        }
    }

    #[test]
    fn publishes_in_recording_order() {
        let bus = InMemoryEventBus::new();
        let sub = bus.subscribe();

        let mut outbox = Outbox::new();
        outbox.record(1u32);
        outbox.record(2u32);
        assert_eq!(outbox.publish_to(&bus), 2);

        assert_eq!(sub.try_recv().unwrap(), 1);
        assert_eq!(sub.try_recv().unwrap(), 2);
    }

    #[test]
    fn a_failed_publish_does_not_block_the_rest() {
        let mut outbox = Outbox::new();
        for n in 1..=3u32 {
            outbox.record(n);
        }
        assert_eq!(outbox.publish_to(&FailingBus), 2);
    }

    #[test]
    fn dropping_the_outbox_publishes_nothing() {
        let bus = InMemoryEventBus::<u32>::new();
        let sub = bus.subscribe();
        let mut outbox = Outbox::new();
        outbox.record(1u32);
        drop(outbox);
        assert!(sub.try_recv().is_err());
    }
}
