use crate::app::{ApiError, api_error, require_user_id};
use crate::ports::{PushSender, StoreError, SubscriptionStore};
use crate::state;
use crate::types::push::{Subscription, SubscriptionKeys};

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionListQuery {
    pub(crate) user_id: String,
}

pub(crate) async fn subscription_list<St, S>(
    State(state): State<state::AppState<St, S>>,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let user_id = require_user_id(&query.user_id)?;
    let subscriptions = state.store.list(user_id).await.map_err(store_error)?;
    Ok(Json(subscriptions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscribeRequest {
    pub(crate) user_id: String,
    pub(crate) endpoint: String,
    pub(crate) keys: SubscriptionKeys,
    #[serde(default)]
    pub(crate) expiration_time: Option<i64>,
}

pub(crate) async fn subscription_create<St, S>(
    State(state): State<state::AppState<St, S>>,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let user_id = require_user_id(&request.user_id)?.to_string();
    let endpoint = request.endpoint.trim();
    let p256dh = request.keys.p256dh.trim();
    let auth = request.keys.auth.trim();
    if endpoint.is_empty() || p256dh.is_empty() || auth.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "endpoint, keys.p256dh, and keys.auth are required.",
        ));
    }

    let subscription = Subscription {
        user_id,
        endpoint: endpoint.to_string(),
        expiration_time: request.expiration_time,
        keys: SubscriptionKeys {
            p256dh: p256dh.to_string(),
            auth: auth.to_string(),
        },
    };
    state
        .store
        .put(subscription.clone())
        .await
        .map_err(store_error)?;
    info!(user_id = %subscription.user_id, "push subscription registered");
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnsubscribeRequest {
    #[serde(default)]
    pub(crate) endpoint: String,
}

#[derive(Serialize)]
pub(crate) struct SuccessResponse {
    pub(crate) success: bool,
}

pub(crate) async fn subscription_delete<St, S>(
    State(state): State<state::AppState<St, S>>,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<SuccessResponse>, ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let endpoint = request.endpoint.trim();
    if endpoint.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Endpoint is required."));
    }
    state
        .store
        .remove_by_endpoint(endpoint)
        .await
        .map_err(store_error)?;
    info!("push subscription removed");
    Ok(Json(SuccessResponse { success: true }))
}

fn store_error(err: StoreError) -> ApiError {
    error!(%err, "subscription store failure");
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "Subscription store unavailable.",
    )
}
