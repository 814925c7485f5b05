// Lookup queries over the cleaned datasets.
//
// These back the dashboard's drill-down panels: deals on a given date,
// dealers by category or pincode, and deals at a pincode with the dealer
// reference resolved to a company name.
use crate::types::{
    DealOnDateRow, DealRecord, DealerDirectoryRow, DealerRecord, PincodeDealRow, ReportError,
};
use chrono::NaiveDate;

fn format_deal_date(deal: &DealRecord) -> String {
    deal.created_at
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Deals from both exports created on the given `YYYY-MM-DD` date.
pub fn deals_on_date(
    deals: &[DealRecord],
    deals_full: &[DealRecord],
    date_str: &str,
) -> Result<Vec<DealOnDateRow>, ReportError> {
    let target = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| ReportError::InvalidDate(date_str.to_string()))?;
    Ok(deals
        .iter()
        .chain(deals_full.iter())
        .filter(|d| d.created_at.map(|dt| dt.date()) == Some(target))
        .map(|d| DealOnDateRow {
            user_id: d.user_id.clone(),
            user_name: d.user_name.clone(),
            pincode: d.pincode.clone().unwrap_or_default(),
            req_qty: d.req_qty,
            deal_date: target.format("%Y-%m-%d").to_string(),
        })
        .collect())
}

fn directory_row(dealer: &DealerRecord) -> DealerDirectoryRow {
    DealerDirectoryRow {
        coname: dealer.coname.clone(),
        pincode: dealer.pincode.clone(),
        phone_no: dealer.phone_no.clone(),
        cat_disp_names: dealer.cat_disp_names.clone(),
        subcat_disp_names: dealer.subcat_disp_names.clone(),
    }
}

/// Dealers whose category display names contain the query,
/// case-insensitively. An empty query matches nothing.
pub fn dealers_by_category(dealers: &[DealerRecord], category: &str) -> Vec<DealerDirectoryRow> {
    let category = category.trim().to_lowercase();
    if category.is_empty() {
        return Vec::new();
    }
    dealers
        .iter()
        .filter(|d| d.cat_disp_names.to_lowercase().contains(&category))
        .map(directory_row)
        .collect()
}

pub fn dealers_by_pincode(dealers: &[DealerRecord], pincode: &str) -> Vec<DealerDirectoryRow> {
    let pincode = pincode.trim();
    if pincode.is_empty() {
        return Vec::new();
    }
    dealers
        .iter()
        .filter(|d| d.pincode == pincode)
        .map(directory_row)
        .collect()
}

fn resolve_dealer_name(deal: &DealRecord, dealers: &[DealerRecord]) -> String {
    if let Some(coname) = deal.dealer_coname.as_deref() {
        return coname.to_string();
    }
    deal.dealer_id
        .as_deref()
        .and_then(|id| dealers.iter().find(|d| d.id == id))
        .map(|d| d.coname.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Deals from both exports at the given pincode, with the dealer resolved
/// by company-name reference, then dealer-id lookup, then "Unknown".
pub fn deals_by_pincode(
    deals: &[DealRecord],
    deals_full: &[DealRecord],
    dealers: &[DealerRecord],
    pincode: &str,
) -> Vec<PincodeDealRow> {
    let pincode = pincode.trim();
    if pincode.is_empty() {
        return Vec::new();
    }
    deals
        .iter()
        .chain(deals_full.iter())
        .filter(|d| d.pincode.as_deref() == Some(pincode))
        .map(|d| PincodeDealRow {
            user_id: d.user_id.clone(),
            user_name: d.user_name.clone(),
            dealer_name: resolve_dealer_name(d, dealers),
            pincode: pincode.to_string(),
            req_qty: d.req_qty,
            deal_date: format_deal_date(d),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::parse_datetime_flexible;

    fn deal(
        user: &str,
        pincode: &str,
        created_at: Option<&str>,
        coname: Option<&str>,
        dealer_id: Option<&str>,
    ) -> DealRecord {
        DealRecord {
            user_id: user.to_string(),
            user_name: user.to_string(),
            pincode: Some(pincode.to_string()),
            city: String::new(),
            req_qty: 2.0,
            created_at: parse_datetime_flexible(created_at),
            dealer_coname: coname.map(str::to_string),
            dealer_id: dealer_id.map(str::to_string),
            latitude: 19.0,
            longitude: 72.0,
        }
    }

    fn dealer(id: &str, coname: &str, cats: &str) -> DealerRecord {
        DealerRecord {
            id: id.to_string(),
            coname: coname.to_string(),
            phone_no: "900".to_string(),
            addr1: String::new(),
            addr2: String::new(),
            landmark: String::new(),
            city: String::new(),
            pincode: "400601".to_string(),
            latitude: 19.5,
            longitude: 72.5,
            cat_disp_names: cats.to_string(),
            subcat_disp_names: String::new(),
            img_url: None,
        }
    }

    #[test]
    fn date_filter_spans_both_exports() {
        let deals = vec![deal("u1", "400601", Some("2025-04-10 09:30:00"), None, None)];
        let deals_full = vec![
            deal("u2", "400601", Some("2025-04-10"), None, None),
            deal("u3", "400601", Some("2025-04-11"), None, None),
            deal("u4", "400601", None, None, None),
        ];
        let rows = deals_on_date(&deals, &deals_full, "2025-04-10").unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        assert_eq!(rows[0].deal_date, "2025-04-10");
    }

    #[test]
    fn date_filter_rejects_bad_input() {
        assert!(matches!(
            deals_on_date(&[], &[], "10/04/2025"),
            Err(ReportError::InvalidDate(_))
        ));
    }

    #[test]
    fn category_filter_is_case_insensitive() {
        let dealers = vec![
            dealer("d1", "Acme Traders", "Paint | Tools"),
            dealer("d2", "Borkar & Sons", "Cement"),
        ];
        let rows = dealers_by_category(&dealers, "paint");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].coname, "Acme Traders");
        assert!(dealers_by_category(&dealers, "").is_empty());
    }

    #[test]
    fn pincode_deals_resolve_dealer_names() {
        let dealers = vec![dealer("d1", "Acme Traders", "Paint")];
        let deals = vec![
            deal("u1", "400601", Some("2025-04-10"), Some("Borkar & Sons"), None),
            deal("u2", "400601", None, None, Some("d1")),
            deal("u3", "400601", None, None, Some("d9")),
            deal("u4", "400078", None, None, None),
        ];
        let rows = deals_by_pincode(&deals, &[], &dealers, "400601");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].dealer_name, "Borkar & Sons");
        assert_eq!(rows[0].deal_date, "2025-04-10");
        assert_eq!(rows[1].dealer_name, "Acme Traders");
        assert_eq!(rows[2].dealer_name, "Unknown");
        assert_eq!(rows[2].deal_date, "N/A");
    }
}
