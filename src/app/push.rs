use crate::app::{ApiError, api_error, dispatch_error, push_disabled, require_user_id};
use crate::ports::{PushSender, SubscriptionStore};
use crate::state;
use crate::types::push::DeliveryResult;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn push_public_key<St, S>(
    State(state): State<state::AppState<St, S>>,
) -> Result<Json<PublicKeyResponse>, ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    match state.public_key {
        Some(public_key) => Ok(Json(PublicKeyResponse { public_key })),
        None => Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Push notifications are not configured.",
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestNotificationRequest {
    pub(crate) user_id: String,
}

pub(crate) async fn test_notification<St, S>(
    State(state): State<state::AppState<St, S>>,
    Json(request): Json<TestNotificationRequest>,
) -> Result<Json<DeliveryResult>, ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let user_id = require_user_id(&request.user_id)?;
    let dispatcher = state.dispatcher.as_ref().ok_or_else(push_disabled)?;
    let result = dispatcher
        .send_test_notification(user_id)
        .await
        .map_err(dispatch_error)?;
    Ok(Json(result))
}
