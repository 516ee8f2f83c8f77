use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Raster deletion notifications
// ---------------------------------------------------------------------------

/// Handle returned by [`DeletionNotifier::subscribe`]; passed back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Per-raster "deleted" notifications.
pub trait DeletionNotifier {
    /// Register for the deletion of the raster with the given unique name.
    fn subscribe(&mut self, raster_name: &str) -> SubscriptionId;

    /// Undo one earlier `subscribe`. Returns `false` if the handle was unknown.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Session-wide subscription table, keyed by raster name.
#[derive(Debug, Default)]
pub struct DeletionHub {
    next_id: u64,
    subscriptions: BTreeMap<SubscriptionId, String>,
}

impl DeletionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions currently registered for `raster_name`, in subscription order.
    pub fn subscribers(&self, raster_name: &str) -> Vec<SubscriptionId> {
        self.subscriptions
            .iter()
            .filter(|(_, name)| name.as_str() == raster_name)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Announce that `raster_name` was deleted. Returns the subscriptions to
    /// notify; the subscribers release them through `unsubscribe`.
    pub fn fire(&self, raster_name: &str) -> Vec<SubscriptionId> {
        let notified = self.subscribers(raster_name);
        if !notified.is_empty() {
            log::info!(
                "Raster '{raster_name}' deleted, notifying {} subscriber(s)",
                notified.len()
            );
        }
        notified
    }

    /// Drop whatever is still subscribed to a raster that no longer exists.
    /// Returns the number of subscriptions that were left dangling.
    pub fn retire(&mut self, raster_name: &str) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|_, name| name != raster_name);
        let dropped = before - self.subscriptions.len();
        if dropped > 0 {
            log::warn!("{dropped} deletion subscription(s) for '{raster_name}' were never released");
        }
        dropped
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl DeletionNotifier for DeletionHub {
    fn subscribe(&mut self, raster_name: &str) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.insert(id, raster_name.to_string());
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_and_unsubscribe_are_paired() {
        let mut hub = DeletionHub::new();
        let a = hub.subscribe("scene1");
        let b = hub.subscribe("scene1");
        let c = hub.subscribe("scene2");
        assert_ne!(a, b);
        assert_eq!(hub.subscribers("scene1"), vec![a, b]);

        assert!(hub.unsubscribe(a));
        assert!(!hub.unsubscribe(a));
        assert_eq!(hub.subscribers("scene1"), vec![b]);
        assert_eq!(hub.subscribers("scene2"), vec![c]);
    }

    #[test]
    fn retire_drops_only_that_raster() {
        let mut hub = DeletionHub::new();
        hub.subscribe("scene1");
        hub.subscribe("scene2");

        assert_eq!(hub.fire("scene1").len(), 1);
        assert_eq!(hub.retire("scene1"), 1);
        assert!(hub.fire("scene1").is_empty());
        assert_eq!(hub.retire("scene1"), 0);
        assert_eq!(hub.len(), 1);
    }
}
