use crate::ports::{StoreError, SubscriptionStore};
use crate::types::push::Subscription;

use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex};

/// Process-local store keyed by endpoint.
#[derive(Debug, Clone, Default)]
pub struct MemorySubscriptionStore {
    by_endpoint: Arc<Mutex<HashMap<String, Subscription>>>,
}

impl MemorySubscriptionStore {
    pub fn len(&self) -> usize {
        self.by_endpoint.lock().expect("subscriptions lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    type ListFut<'a>
        = Ready<Result<Vec<Subscription>, StoreError>>
    where
        Self: 'a;
    type PutFut<'a>
        = Ready<Result<(), StoreError>>
    where
        Self: 'a;
    type RemoveFut<'a>
        = Ready<Result<(), StoreError>>
    where
        Self: 'a;

    fn list<'a>(&'a self, user_id: &'a str) -> Self::ListFut<'a> {
        let subscriptions = self
            .by_endpoint
            .lock()
            .expect("subscriptions lock")
            .values()
            .filter(|subscription| subscription.user_id == user_id)
            .cloned()
            .collect();
        ready(Ok(subscriptions))
    }

    fn put(&self, subscription: Subscription) -> Self::PutFut<'_> {
        self.by_endpoint
            .lock()
            .expect("subscriptions lock")
            .insert(subscription.endpoint.clone(), subscription);
        ready(Ok(()))
    }

    fn remove_by_endpoint<'a>(&'a self, endpoint: &'a str) -> Self::RemoveFut<'a> {
        self.by_endpoint
            .lock()
            .expect("subscriptions lock")
            .remove(endpoint);
        ready(Ok(()))
    }
}
