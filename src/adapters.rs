use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::ports;
use crate::types::push::{DeliveryOutcome, Subscription, VapidConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.vapid.public_key
    }

    async fn try_deliver(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        ttl_seconds: u32,
    ) -> Result<(), web_push::WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload);
        builder.set_ttl(ttl_seconds);
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        let message = builder.build()?;
        self.client.send(message).await
    }
}

impl ports::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>>
    where
        Self: 'a;

    fn deliver<'a>(
        &'a self,
        subscription: &'a Subscription,
        payload: &'a [u8],
        ttl_seconds: u32,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            match self.try_deliver(subscription, payload, ttl_seconds).await {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(err) => classify_error(err),
            }
        })
    }
}

/// Only a 410 from the push service means the endpoint is permanently dead.
fn classify_error(err: web_push::WebPushError) -> DeliveryOutcome {
    match err {
        web_push::WebPushError::EndpointNotValid => DeliveryOutcome::Gone,
        other => DeliveryOutcome::TransientFailure(other.to_string()),
    }
}
