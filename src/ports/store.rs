use crate::types::push::Subscription;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store decode error: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("store encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Access contract for push subscriptions.
///
/// `put` upserts by endpoint and `remove_by_endpoint` is a no-op for unknown
/// endpoints. Implementations must tolerate concurrent calls.
pub trait SubscriptionStore: Clone + Send + Sync + 'static {
    type ListFut<'a>: Future<Output = Result<Vec<Subscription>, StoreError>> + Send + 'a
    where
        Self: 'a;
    type PutFut<'a>: Future<Output = Result<(), StoreError>> + Send + 'a
    where
        Self: 'a;
    type RemoveFut<'a>: Future<Output = Result<(), StoreError>> + Send + 'a
    where
        Self: 'a;

    fn list<'a>(&'a self, user_id: &'a str) -> Self::ListFut<'a>;
    fn put(&self, subscription: Subscription) -> Self::PutFut<'_>;
    fn remove_by_endpoint<'a>(&'a self, endpoint: &'a str) -> Self::RemoveFut<'a>;
}
