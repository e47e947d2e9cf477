use crate::types::push::{DeliveryOutcome, Subscription};

/// Push transport capability. Implementations map their own failure
/// conventions onto [`DeliveryOutcome`].
pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = DeliveryOutcome> + Send + 'a
    where
        Self: 'a;

    fn deliver<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a [u8],
        ttl_seconds: u32,
    ) -> Self::Fut<'a>;
}
