// The dashboard's headline numbers.
//
// A "deal" is deduplicated by the natural key (user id, requested
// quantity) across both deal exports; timestamps and dealer references do
// not participate in the key.
use crate::types::{DealRecord, MetricsSummary, UserRecord};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Days a user counts as "new" after onboarding.
pub const NEW_USER_WINDOW_DAYS: i64 = 30;

fn new_user_cutoff(now: DateTime<Utc>) -> i64 {
    (now - Duration::days(NEW_USER_WINDOW_DAYS)).timestamp()
}

/// Whether the user onboarded within the trailing window ending at `now`.
pub fn is_new_user(user: &UserRecord, now: DateTime<Utc>) -> bool {
    user.create_epoch
        .map(|epoch| epoch >= new_user_cutoff(now))
        .unwrap_or(false)
}

fn deal_key(deal: &DealRecord) -> (&str, u64) {
    (deal.user_id.as_str(), deal.req_qty.to_bits())
}

pub fn compute(
    users: &[UserRecord],
    deals: &[DealRecord],
    deals_full: &[DealRecord],
    now: DateTime<Utc>,
) -> MetricsSummary {
    let total_users = users.len();
    let total_visits = deals.len() + deals_full.len();
    let new_users = users.iter().filter(|u| is_new_user(u, now)).count();

    let active_users = deals
        .iter()
        .map(|d| d.user_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let unique_deals = deals
        .iter()
        .chain(deals_full.iter())
        .map(deal_key)
        .collect::<HashSet<_>>()
        .len();

    let responded_deals = deals
        .iter()
        .filter(|d| d.req_qty > 0.0)
        .map(deal_key)
        .collect::<HashSet<_>>()
        .len();

    let new_user_deal_ratio = if new_users > 0 {
        unique_deals as f64 / new_users as f64 * 100.0
    } else {
        0.0
    };
    let response_ratio = if unique_deals > 0 {
        responded_deals as f64 / unique_deals as f64 * 100.0
    } else {
        0.0
    };

    MetricsSummary {
        total_users,
        total_visits,
        new_users,
        active_users,
        total_deals: total_visits,
        unique_deals,
        new_user_deal_ratio,
        response_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(id: &str, epoch: Option<i64>) -> UserRecord {
        UserRecord {
            user_id: id.to_string(),
            pincode: None,
            city: "Mumbai".to_string(),
            name: "Unknown".to_string(),
            phone: "N/A".to_string(),
            create_epoch: epoch,
            latitude: 19.0760,
            longitude: 72.8777,
        }
    }

    fn deal(user_id: &str, qty: f64) -> DealRecord {
        DealRecord {
            user_id: user_id.to_string(),
            user_name: "Unknown".to_string(),
            pincode: Some("400601".to_string()),
            city: "Thane".to_string(),
            req_qty: qty,
            created_at: None,
            dealer_coname: None,
            dealer_id: None,
            latitude: 19.1950,
            longitude: 72.9770,
        }
    }

    #[test]
    fn summary_formulas() {
        let now = Utc.with_ymd_and_hms(2025, 4, 15, 0, 0, 0).unwrap();
        let fresh = now.timestamp() - 86400; // one day old
        let stale = now.timestamp() - 90 * 86400;
        let users = vec![
            user("u1", Some(fresh)),
            user("u2", Some(stale)),
            user("u3", None),
        ];
        // (u1, 5) appears in both exports and twice in the subset dump:
        // one unique deal. (u1, 0) is unique but never counts as responded.
        let deals = vec![deal("u1", 5.0), deal("u1", 5.0), deal("u1", 0.0)];
        let deals_full = vec![deal("u1", 5.0), deal("u2", 7.0)];

        let summary = compute(&users, &deals, &deals_full, now);
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.total_visits, 5);
        assert_eq!(summary.total_deals, 5);
        assert_eq!(summary.new_users, 1);
        assert_eq!(summary.active_users, 1);
        assert_eq!(summary.unique_deals, 3);
        assert!((summary.new_user_deal_ratio - 300.0).abs() < 1e-9);
        // One responded pair (u1, 5) out of three unique deals.
        assert!((summary.response_ratio - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn ratios_guard_empty_denominators() {
        let now = Utc.with_ymd_and_hms(2025, 4, 15, 0, 0, 0).unwrap();
        let summary = compute(&[], &[], &[], now);
        assert_eq!(summary.new_user_deal_ratio, 0.0);
        assert_eq!(summary.response_ratio, 0.0);
    }
}
