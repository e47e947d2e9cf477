//! Notification payloads for each reminder kind.
//!
//! Builders are pure. The `tag` is derived from the medication name only, so
//! repeated reminders for the same medication replace each other in the
//! notification tray instead of stacking.

use crate::types::push::{NotificationData, NotificationPayload};

const ICON: &str = "/icon-192x192.png";
const BADGE: &str = "/badge-72x72.png";

pub fn medication_reminder(medication_name: &str, scheduled_time: &str) -> NotificationPayload {
    NotificationPayload {
        title: "💊 Time for Your Medication".to_string(),
        body: format!("Don't forget to take {medication_name} at {scheduled_time}"),
        icon: Some(ICON.to_string()),
        badge: Some(BADGE.to_string()),
        tag: Some(medication_tag(medication_name)),
        data: Some(NotificationData::MedicationReminder {
            medication_name: medication_name.to_string(),
            scheduled_time: scheduled_time.to_string(),
        }),
        url: Some("/scan".to_string()),
    }
}

pub fn refill_reminder(medication_name: &str, pills_remaining: u32) -> NotificationPayload {
    NotificationPayload {
        title: "🔔 Medication Refill Reminder".to_string(),
        body: format!(
            "{medication_name} is running low ({pills_remaining} pills remaining). Time to refill!"
        ),
        icon: Some(ICON.to_string()),
        badge: Some(BADGE.to_string()),
        tag: Some(refill_tag(medication_name)),
        data: Some(NotificationData::RefillReminder {
            medication_name: medication_name.to_string(),
            pills_remaining,
        }),
        url: Some("/schedule".to_string()),
    }
}

pub fn test_notification() -> NotificationPayload {
    NotificationPayload {
        title: "✨ Test Notification".to_string(),
        body: "SmartAid notifications are working correctly!".to_string(),
        icon: Some(ICON.to_string()),
        badge: Some(BADGE.to_string()),
        tag: Some("test-notification".to_string()),
        data: Some(NotificationData::Test),
        url: Some("/".to_string()),
    }
}

pub fn medication_tag(medication_name: &str) -> String {
    format!("medication-{medication_name}")
}

pub fn refill_tag(medication_name: &str) -> String {
    format!("refill-{medication_name}")
}
