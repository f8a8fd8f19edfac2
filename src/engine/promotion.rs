use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::promotion::{Discount, Eligibility, EligibilityRule, Promotion, PromotionDraft};
use crate::models::trip::{TripStatus, TripSummary};

pub const ELIGIBLE_REASON: &str = "You are eligible for this promotion";
pub const NOT_ACTIVE_REASON: &str = "Promotion is not currently active";
pub const FIRST_RIDE_REASON: &str = "This promotion is only for first-time users";

/// Validates a draft and turns it into a promotion record.
///
/// Drafts carrying both a percentage and a fixed amount are rejected rather
/// than silently preferring one.
pub fn create(draft: PromotionDraft, now: DateTime<Utc>) -> EngineResult<Promotion> {
    if draft.title.trim().is_empty() {
        return Err(EngineError::InvalidPromotion("title is required".to_string()));
    }

    match (draft.discount_percentage, draft.discount_amount) {
        (Some(_), Some(_)) => {
            return Err(EngineError::InvalidPromotion(
                "set either discount_percentage or discount_amount, not both".to_string(),
            ));
        }
        (Some(pct), None) if !(pct > 0.0 && pct <= 100.0) => {
            return Err(EngineError::InvalidPromotion(format!(
                "discount_percentage must be in (0, 100], got {pct}"
            )));
        }
        (None, Some(amount)) if !(amount > 0.0 && amount.is_finite()) => {
            return Err(EngineError::InvalidPromotion(format!(
                "discount_amount must be positive, got {amount}"
            )));
        }
        _ => {}
    }

    if draft.valid_from > draft.valid_until {
        return Err(EngineError::InvalidPromotion(format!(
            "valid_from {} is after valid_until {}",
            draft.valid_from, draft.valid_until
        )));
    }

    let rule = draft
        .rule
        .unwrap_or_else(|| EligibilityRule::infer_from_title(&draft.title));

    Ok(Promotion {
        id: Uuid::new_v4(),
        title: draft.title,
        description: draft.description,
        discount_percentage: draft.discount_percentage,
        discount_amount: draft.discount_amount,
        rule,
        valid_from: draft.valid_from,
        valid_until: draft.valid_until,
        is_active: draft.is_active,
        created_at: now,
    })
}

/// Active and `now` inside `[valid_from, valid_until]`.
pub fn is_valid_now(promotion: &Promotion, now: DateTime<Utc>) -> bool {
    promotion.is_active && promotion.valid_from <= now && now <= promotion.valid_until
}

/// Same test as [`is_valid_now`], reporting why a promotion cannot be used.
pub fn ensure_valid(promotion: &Promotion, now: DateTime<Utc>) -> EngineResult<()> {
    if now > promotion.valid_until {
        return Err(EngineError::PromotionExpired(promotion.id));
    }
    if !promotion.is_active || now < promotion.valid_from {
        return Err(EngineError::PromotionInactive(promotion.id));
    }
    Ok(())
}

pub fn check_eligibility(promotion: &Promotion, history: &[TripSummary]) -> Eligibility {
    let completed = history
        .iter()
        .filter(|trip| trip.status == TripStatus::Completed)
        .count();

    match failure_reason(&promotion.rule, completed) {
        Some(reason) => Eligibility {
            eligible: false,
            reason,
        },
        None => Eligibility {
            eligible: true,
            reason: ELIGIBLE_REASON.to_string(),
        },
    }
}

/// Why `rule` rejects a user with `completed` finished trips, if it does.
fn failure_reason(rule: &EligibilityRule, completed: usize) -> Option<String> {
    match rule {
        EligibilityRule::FirstRideOnly if completed > 0 => Some(FIRST_RIDE_REASON.to_string()),
        EligibilityRule::MinCompletedTrips(min) if completed < *min as usize => {
            let remaining = *min as usize - completed;
            Some(format!("Complete {remaining} more trips to unlock this promotion"))
        }
        EligibilityRule::AllOf(rules) => rules
            .iter()
            .filter_map(|rule| failure_reason(rule, completed))
            .last(),
        _ => None,
    }
}

/// Prices a discount. The caller must already have checked validity.
///
/// A percentage wins over a fixed amount when a record carries both.
pub fn apply_discount(promotion: &Promotion, trip_price: f64) -> EngineResult<Discount> {
    if !(trip_price > 0.0) || !trip_price.is_finite() {
        return Err(EngineError::InvalidTripPrice(trip_price));
    }

    let discount_amount = match (promotion.discount_percentage, promotion.discount_amount) {
        (Some(pct), _) if pct != 0.0 => (trip_price * pct / 100.0).round(),
        (_, Some(amount)) if amount != 0.0 => amount.min(trip_price),
        _ => 0.0,
    };

    Ok(Discount {
        discount_amount,
        final_price: (trip_price - discount_amount).max(0.0),
    })
}
