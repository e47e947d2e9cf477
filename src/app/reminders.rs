use crate::app::{ApiError, api_error, dispatch_error, push_disabled, require_user_id};
use crate::ports::{PushSender, SubscriptionStore};
use crate::push::refill::MedicationStock;
use crate::push::{RefillCheck, ScheduledReminder};
use crate::state;
use crate::types::push::DeliveryResult;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MedicationReminderRequest {
    pub(crate) user_id: String,
    pub(crate) medication_name: String,
    pub(crate) scheduled_time: String,
    /// Deliver at this instant instead of immediately.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum MedicationReminderResponse {
    Scheduled {
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
    },
    Sent {
        result: DeliveryResult,
    },
}

pub(crate) async fn medication_reminder<St, S>(
    State(state): State<state::AppState<St, S>>,
    Json(request): Json<MedicationReminderRequest>,
) -> Result<(StatusCode, Json<MedicationReminderResponse>), ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let user_id = require_user_id(&request.user_id)?;
    let medication_name = require_medication_name(&request.medication_name)?;
    let (Some(dispatcher), Some(scheduler)) = (&state.dispatcher, &state.scheduler) else {
        return Err(push_disabled());
    };

    if let Some(at) = request.at
        && at > scheduler.now()
    {
        let handle = scheduler.spawn(ScheduledReminder {
            user_id: user_id.to_string(),
            medication_name: medication_name.to_string(),
            scheduled_time: request.scheduled_time.clone(),
            at,
        });
        {
            let mut handles = state.reminder_handles.lock().expect("reminder handles lock");
            handles.retain(|handle| !handle.is_finished());
            handles.push(handle);
        }
        info!(user_id, medication = medication_name, %at, "medication reminder scheduled");
        return Ok((
            StatusCode::ACCEPTED,
            Json(MedicationReminderResponse::Scheduled { at }),
        ));
    }

    let result = dispatcher
        .send_medication_reminder(user_id, medication_name, &request.scheduled_time)
        .await
        .map_err(dispatch_error)?;
    Ok((
        StatusCode::OK,
        Json(MedicationReminderResponse::Sent { result }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefillReminderRequest {
    pub(crate) user_id: String,
    pub(crate) medication_name: String,
    pub(crate) pills_remaining: u32,
}

pub(crate) async fn refill_reminder<St, S>(
    State(state): State<state::AppState<St, S>>,
    Json(request): Json<RefillReminderRequest>,
) -> Result<Json<DeliveryResult>, ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let user_id = require_user_id(&request.user_id)?;
    let medication_name = require_medication_name(&request.medication_name)?;
    let dispatcher = state.dispatcher.as_ref().ok_or_else(push_disabled)?;
    let result = dispatcher
        .send_refill_reminder(user_id, medication_name, request.pills_remaining)
        .await
        .map_err(dispatch_error)?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefillCheckRequest {
    pub(crate) user_id: String,
    #[serde(default)]
    pub(crate) medications: Vec<MedicationStock>,
}

pub(crate) async fn refill_check<St, S>(
    State(state): State<state::AppState<St, S>>,
    Json(request): Json<RefillCheckRequest>,
) -> Result<Json<Vec<RefillCheck>>, ApiError>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let user_id = require_user_id(&request.user_id)?;
    let dispatcher = state.dispatcher.as_ref().ok_or_else(push_disabled)?;
    let checks = dispatcher
        .check_refills(user_id, &request.medications)
        .await
        .map_err(dispatch_error)?;
    Ok(Json(checks))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReminderScheduleDebugResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) server_time: OffsetDateTime,
    pub(crate) scheduled: Vec<ReminderScheduleEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReminderScheduleEntry {
    #[serde(flatten)]
    pub(crate) reminder: ScheduledReminder,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) scheduled_at: OffsetDateTime,
    pub(crate) finished: bool,
}

pub(crate) async fn reminder_schedule_debug<St, S>(
    State(state): State<state::AppState<St, S>>,
) -> Json<ReminderScheduleDebugResponse>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let server_time = OffsetDateTime::now_utc();
    let scheduled = {
        let handles = state.reminder_handles.lock().expect("reminder handles lock");
        handles
            .iter()
            .map(|handle| ReminderScheduleEntry {
                reminder: handle.reminder.clone(),
                scheduled_at: handle.scheduled_at,
                finished: handle.is_finished(),
            })
            .collect()
    };
    Json(ReminderScheduleDebugResponse {
        server_time,
        scheduled,
    })
}

#[derive(Serialize)]
pub(crate) struct ReminderCancelResponse {
    pub(crate) cancelled: usize,
}

/// Aborts every pending reminder task and forgets all handles.
pub(crate) async fn reminder_schedule_cancel<St, S>(
    State(state): State<state::AppState<St, S>>,
) -> Json<ReminderCancelResponse>
where
    St: SubscriptionStore,
    S: PushSender,
{
    let handles: Vec<_> = {
        let mut handles = state.reminder_handles.lock().expect("reminder handles lock");
        handles.drain(..).collect()
    };
    let mut cancelled = 0;
    for handle in handles {
        if !handle.is_finished() {
            handle.abort();
            cancelled += 1;
        }
    }
    info!(cancelled, "scheduled reminders cancelled");
    Json(ReminderCancelResponse { cancelled })
}

fn require_medication_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "medicationName is required.",
        ));
    }
    Ok(name)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use crate::app::tests::{json_body, json_request, test_app};
    use crate::ports::SubscriptionStore;
    use crate::push::test_support::TestSender;
    use crate::store::MemorySubscriptionStore;
    use crate::store::test_support::subscription;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value as JsonValue;
    use serde_json::json;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;
    use tower::ServiceExt;

    async fn store_with_patient() -> MemorySubscriptionStore {
        let store = MemorySubscriptionStore::default();
        store
            .put(subscription("patient", "https://push.example/a"))
            .await
            .expect("put");
        store
    }

    #[tokio::test]
    async fn medication_reminder__should_send_immediately_without_at() {
        // Given
        let sender = TestSender::default();
        let app = test_app(store_with_patient().await, Some(sender.clone()));

        // When
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/reminders/medication",
                json!({
                    "userId": "patient",
                    "medicationName": "Metformin",
                    "scheduledTime": "08:00",
                }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "status": "sent", "result": { "status": "delivered", "count": 1 } })
        );
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn medication_reminder__should_schedule_future_reminder() {
        // Given
        let sender = TestSender::default();
        let app = test_app(store_with_patient().await, Some(sender.clone()));
        let at = (OffsetDateTime::now_utc() + time::Duration::hours(6))
            .format(&Rfc3339)
            .expect("format at");

        // When
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/reminders/medication",
                json!({
                    "userId": "patient",
                    "medicationName": "Metformin",
                    "scheduledTime": "20:00",
                    "at": at,
                }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await["status"], "scheduled");
        assert!(sender.sent().is_empty());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/debug/reminders/schedule")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");
        assert_eq!(response.status(), StatusCode::OK);
        let body: JsonValue = json_body(response).await;
        let scheduled = body["scheduled"].as_array().expect("scheduled entries");
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0]["medicationName"], "Metformin");
        assert_eq!(scheduled[0]["scheduledTime"], "20:00");
        assert_eq!(scheduled[0]["finished"], false);
    }

    #[tokio::test]
    async fn refill_reminder__should_use_refill_tag() {
        // Given
        let sender = TestSender::default();
        let app = test_app(store_with_patient().await, Some(sender.clone()));

        // When
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/reminders/refill",
                json!({
                    "userId": "patient",
                    "medicationName": "Aspirin",
                    "pillsRemaining": 3,
                }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        let payload: JsonValue = serde_json::from_slice(&sent[0].1).expect("json payload");
        assert_eq!(payload["tag"], "refill-Aspirin");
    }

    #[tokio::test]
    async fn refill_check__should_report_each_medication() {
        // Given
        let sender = TestSender::default();
        let store = store_with_patient().await;
        let app = test_app(store.clone(), Some(sender.clone()));

        // When
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/reminders/refill-check",
                json!({
                    "userId": "patient",
                    "medications": [
                        { "name": "Aspirin", "pillsRemaining": 4, "times": ["08:00"] },
                        { "name": "Metformin", "times": ["08:00", "20:00"] },
                    ],
                }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["medicationName"], "Aspirin");
        assert_eq!(body[0]["status"]["needsRefill"], true);
        assert_eq!(body[0]["result"], json!({ "status": "delivered", "count": 1 }));
        assert_eq!(body[1]["status"]["message"], "30 pills in stock");
        assert!(body[1].get("result").is_none());
        assert_eq!(sender.sent().len(), 1);
        assert_eq!(store.list("patient").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn refill_reminder__should_require_medication_name() {
        // Given
        let app = test_app(store_with_patient().await, Some(TestSender::default()));

        // When
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/reminders/refill",
                json!({ "userId": "patient", "medicationName": "", "pillsRemaining": 3 }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reminder_schedule_cancel__should_abort_pending_reminders() {
        // Given
        let sender = TestSender::default();
        let app = test_app(store_with_patient().await, Some(sender.clone()));
        let at = (OffsetDateTime::now_utc() + time::Duration::hours(6))
            .format(&Rfc3339)
            .expect("format at");
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/reminders/medication",
                json!({
                    "userId": "patient",
                    "medicationName": "Metformin",
                    "scheduledTime": "20:00",
                    "at": at,
                }),
            ))
            .await
            .expect("request failed");
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // When
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/debug/reminders/schedule")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "cancelled": 1 }));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/debug/reminders/schedule")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("request failed");
        let body = json_body(response).await;
        assert_eq!(body["scheduled"], json!([]));
        assert!(sender.sent().is_empty());
    }
}
