use crate::adapters::TokioTimeProvider;
use crate::config;
use crate::ports::{PushSender, SubscriptionStore};
use crate::push as push_service;
use crate::state;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::error;

mod push;
mod reminders;
mod subscriptions;

pub fn app<St, S>(config: config::AppConfig, store: St, sender: Option<S>) -> Router
where
    St: SubscriptionStore,
    S: PushSender,
{
    let public_key = match push_service::load_vapid_config(&config) {
        push_service::VapidConfigStatus::Ready(vapid) => Some(vapid.public_key),
        push_service::VapidConfigStatus::Incomplete | push_service::VapidConfigStatus::Missing => {
            None
        }
    };
    let dispatcher = sender.map(|sender| push_service::PushDispatcher::new(store.clone(), sender));
    let scheduler = dispatcher
        .clone()
        .map(|dispatcher| push_service::ReminderScheduler::new(TokioTimeProvider, dispatcher));
    let state = state::AppState {
        config,
        store,
        dispatcher,
        scheduler,
        reminder_handles: Arc::new(Mutex::new(Vec::new())),
        public_key,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/push/public-key", get(push::push_public_key::<St, S>))
        .route(
            "/api/subscriptions",
            get(subscriptions::subscription_list::<St, S>)
                .post(subscriptions::subscription_create::<St, S>)
                .delete(subscriptions::subscription_delete::<St, S>),
        )
        .route(
            "/api/test-notification",
            post(push::test_notification::<St, S>),
        )
        .route(
            "/api/reminders/medication",
            post(reminders::medication_reminder::<St, S>),
        )
        .route(
            "/api/reminders/refill",
            post(reminders::refill_reminder::<St, S>),
        )
        .route(
            "/api/reminders/refill-check",
            post(reminders::refill_check::<St, S>),
        )
        .route(
            "/api/debug/reminders/schedule",
            get(reminders::reminder_schedule_debug::<St, S>)
                .delete(reminders::reminder_schedule_cancel::<St, S>),
        )
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: &'static str) -> ApiError {
    (status, Json(ErrorResponse { error }))
}

pub(crate) fn push_disabled() -> ApiError {
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "Push notifications are not configured.",
    )
}

pub(crate) fn dispatch_error(err: push_service::DispatchError) -> ApiError {
    error!(%err, "notification dispatch failed");
    match err {
        push_service::DispatchError::StoreUnavailable(_) => api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Subscription store unavailable.",
        ),
        push_service::DispatchError::Encode(_) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode notification.",
        ),
    }
}

pub(crate) fn require_user_id(user_id: &str) -> Result<&str, ApiError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "userId is required."));
    }
    Ok(user_id)
}
