use serde::{Deserialize, Serialize};

pub const DEFAULT_PILLS_REMAINING: u32 = 30;
pub const DEFAULT_REFILL_THRESHOLD: u32 = 7;
const DAYS_WITHOUT_SCHEDULE: u32 = 30;
const URGENT_DAYS: u32 = 3;

/// The slice of a medication record that refill checks need.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStock {
    pub name: String,
    #[serde(default)]
    pub pills_remaining: Option<u32>,
    #[serde(default)]
    pub refill_threshold: Option<u32>,
    /// Daily intake times; one pill per entry.
    #[serde(default)]
    pub times: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillStatus {
    pub needs_refill: bool,
    pub urgent: bool,
    pub pills_remaining: u32,
    pub days_remaining: u32,
    pub message: String,
}

impl RefillStatus {
    pub fn calculate(stock: &MedicationStock) -> Self {
        let pills_remaining = stock.pills_remaining.unwrap_or(DEFAULT_PILLS_REMAINING);
        let refill_threshold = stock.refill_threshold.unwrap_or(DEFAULT_REFILL_THRESHOLD);
        let daily_doses = stock.times.len() as u32;

        let days_remaining = if daily_doses > 0 {
            pills_remaining / daily_doses
        } else {
            DAYS_WITHOUT_SCHEDULE
        };
        let needs_refill = pills_remaining <= refill_threshold;
        let urgent = days_remaining <= URGENT_DAYS;

        let message = if urgent && days_remaining == 0 {
            "Out of stock - Refill now!".to_string()
        } else if urgent {
            let unit = if days_remaining == 1 { "day" } else { "days" };
            format!("Only {days_remaining} {unit} left")
        } else if needs_refill {
            format!("{pills_remaining} pills remaining")
        } else {
            format!("{pills_remaining} pills in stock")
        };

        Self {
            needs_refill,
            urgent,
            pills_remaining,
            days_remaining,
            message,
        }
    }
}
