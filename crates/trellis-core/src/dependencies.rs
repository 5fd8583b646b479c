//! Inherited-value subscriptions.
//!
//! A many-to-many relation kept as two indexes: producer to subscribers and
//! subscriber to producers. Entries are removed explicitly on deactivation
//! and unmount.

use indexmap::{IndexMap, IndexSet};

use crate::collections::map::HashMap;
use crate::element::{Element, ElementId, WeakElement};

#[derive(Default)]
pub(crate) struct DependencyGraph {
    subscribers: HashMap<ElementId, IndexMap<ElementId, WeakElement>>,
    producers: HashMap<ElementId, IndexSet<ElementId>>,
}

impl DependencyGraph {
    pub(crate) fn add(&mut self, subscriber: &Element, producer: &Element) {
        self.subscribers
            .entry(producer.id())
            .or_default()
            .insert(subscriber.id(), subscriber.downgrade());
        self.producers
            .entry(subscriber.id())
            .or_default()
            .insert(producer.id());
    }

    /// Stops `subscriber` from being notified while keeping the record of
    /// what it depended on.
    pub(crate) fn detach(&mut self, subscriber: ElementId) {
        let Some(producers) = self.producers.get(&subscriber) else {
            return;
        };
        for producer in producers {
            if let Some(subscribers) = self.subscribers.get_mut(producer) {
                subscribers.shift_remove(&subscriber);
            }
        }
    }

    /// Drops every record of `subscriber`, returning whether it had any
    /// dependencies.
    pub(crate) fn clear(&mut self, subscriber: ElementId) -> bool {
        self.detach(subscriber);
        self.producers
            .remove(&subscriber)
            .is_some_and(|producers| !producers.is_empty())
    }

    /// Live subscribers of `producer`, in subscription order.
    pub(crate) fn subscribers_of(&self, producer: ElementId) -> Vec<Element> {
        self.subscribers
            .get(&producer)
            .map(|subscribers| subscribers.values().filter_map(WeakElement::upgrade).collect())
            .unwrap_or_default()
    }

    pub(crate) fn remove_producer(&mut self, producer: ElementId) {
        let Some(subscribers) = self.subscribers.remove(&producer) else {
            return;
        };
        for subscriber in subscribers.keys() {
            if let Some(producers) = self.producers.get_mut(subscriber) {
                producers.shift_remove(&producer);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/dependencies_tests.rs"]
mod tests;
