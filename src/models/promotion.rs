use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const LOYALTY_MIN_COMPLETED_TRIPS: u32 = 10;

/// Who may use a promotion, judged from their trip history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EligibilityRule {
    FirstRideOnly,
    MinCompletedTrips(u32),
    Unconditional,
    /// Every rule must pass. They are checked in order and the last failure
    /// supplies the reason.
    AllOf(Vec<EligibilityRule>),
}

impl EligibilityRule {
    /// Rule for records that predate explicit rules and only carry a title.
    pub fn infer_from_title(title: &str) -> Self {
        let title = title.to_lowercase();
        let first_ride = title.contains("first ride");
        let loyalty = title.contains("loyalty");

        match (first_ride, loyalty) {
            (true, true) => EligibilityRule::AllOf(vec![
                EligibilityRule::FirstRideOnly,
                EligibilityRule::MinCompletedTrips(LOYALTY_MIN_COMPLETED_TRIPS),
            ]),
            (true, false) => EligibilityRule::FirstRideOnly,
            (false, true) => EligibilityRule::MinCompletedTrips(LOYALTY_MIN_COMPLETED_TRIPS),
            (false, false) => EligibilityRule::Unconditional,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub discount_amount: Option<f64>,
    pub rule: EligibilityRule,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a promotion; `rule` falls back to the title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub discount_amount: Option<f64>,
    #[serde(default)]
    pub rule: Option<EligibilityRule>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub discount_amount: f64,
    pub final_price: f64,
}

/// A discount priced against a specific promotion, as handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountQuote {
    pub promotion_id: Uuid,
    pub promotion_title: String,
    pub original_price: f64,
    pub discount_amount: f64,
    pub final_price: f64,
}
