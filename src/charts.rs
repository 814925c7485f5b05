// Chart figure construction.
//
// A `Figure` is the JSON payload a Plotly-style frontend renders: an array
// of traces plus layout metadata. The builders here only shape data; they
// know nothing about rendering.
use crate::metrics::is_new_user;
use crate::types::{DealRecord, DealerRecord, UserRecord};
use crate::util::epoch_to_date;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const USERS_COLOR: &str = "#1f77b4";
pub const DEALERS_COLOR: &str = "#ff7f0e";

#[derive(Debug, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<String>,
    pub y: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

impl Trace {
    fn bar(x: Vec<String>, y: Vec<Value>) -> Self {
        Trace {
            kind: "bar",
            x,
            y,
            name: None,
            mode: None,
            marker: None,
        }
    }

    fn scatter(x: Vec<String>, y: Vec<Value>) -> Self {
        Trace {
            kind: "scatter",
            x,
            y,
            name: None,
            mode: Some("markers"),
            marker: None,
        }
    }

    fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    fn colored(mut self, color: &str) -> Self {
        self.marker = Some(Marker {
            color: color.to_string(),
        });
        self
    }
}

#[derive(Debug, Serialize)]
pub struct Marker {
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct Layout {
    pub title: String,
    pub template: &'static str,
    pub autosize: bool,
    pub height: u32,
    pub margin: Margin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

#[derive(Debug, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickangle: Option<i32>,
    pub automargin: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn base_layout(title: &str) -> Layout {
    Layout {
        title: title.to_string(),
        template: "plotly_dark",
        autosize: true,
        height: 300,
        margin: Margin {
            l: 40,
            r: 20,
            t: 40,
            b: 60,
        },
        barmode: None,
        xaxis: Axis {
            tickangle: Some(45),
            automargin: true,
            ..Axis::default()
        },
        yaxis: Axis {
            automargin: true,
            ..Axis::default()
        },
    }
}

/// Deal requests per pincode; rows whose pincode could not be extracted
/// are left out of the grouping.
pub fn users_per_pincode(deals: &[DealRecord]) -> Figure {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for deal in deals {
        if let Some(pin) = deal.pincode.as_deref() {
            *counts.entry(pin).or_insert(0) += 1;
        }
    }
    let (x, y) = counts
        .into_iter()
        .map(|(pin, n)| (pin.to_string(), json!(n)))
        .unzip();
    Figure {
        data: vec![Trace::bar(x, y).colored(USERS_COLOR)],
        layout: base_layout("Users per Pincode"),
    }
}

pub fn dealers_per_pincode(dealers: &[DealerRecord]) -> Figure {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for dealer in dealers {
        *counts.entry(dealer.pincode.as_str()).or_insert(0) += 1;
    }
    let (x, y) = counts
        .into_iter()
        .map(|(pin, n)| (pin.to_string(), json!(n)))
        .unzip();
    Figure {
        data: vec![Trace::bar(x, y).colored(DEALERS_COLOR)],
        layout: base_layout("Dealers per Pincode"),
    }
}

fn deals_by_pincode(deals: &[DealRecord]) -> BTreeMap<&str, Vec<&DealRecord>> {
    let mut groups: BTreeMap<&str, Vec<&DealRecord>> = BTreeMap::new();
    for deal in deals {
        if let Some(pin) = deal.pincode.as_deref() {
            groups.entry(pin).or_default().push(deal);
        }
    }
    groups
}

/// Requested quantity per user, one trace per pincode.
pub fn deal_requests_per_user(deals: &[DealRecord]) -> Figure {
    let data = deals_by_pincode(deals)
        .into_iter()
        .map(|(pin, group)| {
            let x = group.iter().map(|d| d.user_id.clone()).collect();
            let y = group.iter().map(|d| json!(d.req_qty)).collect();
            Trace::bar(x, y).named(pin)
        })
        .collect();
    Figure {
        data,
        layout: base_layout("Deal Requests per User"),
    }
}

/// Product categories per dealer: the pipe-delimited display names explode
/// to one point per (dealer, category), traced per pincode.
pub fn dealer_categories(dealers: &[DealerRecord]) -> Figure {
    let mut groups: BTreeMap<&str, (Vec<String>, Vec<Value>)> = BTreeMap::new();
    for dealer in dealers {
        for category in dealer.cat_disp_names.split(" | ") {
            let category = category.trim();
            if category.is_empty() {
                continue;
            }
            let entry = groups.entry(dealer.pincode.as_str()).or_default();
            entry.0.push(dealer.coname.clone());
            entry.1.push(json!(category));
        }
    }
    let data = groups
        .into_iter()
        .map(|(pin, (x, y))| Trace::bar(x, y).named(pin))
        .collect();
    Figure {
        data,
        layout: base_layout("Dealer Product Categories"),
    }
}

/// Onboarding scatter for users created in the last 30 days, traced per
/// pincode, dates on a categorical axis.
pub fn new_users_timeline(users: &[UserRecord], now: DateTime<Utc>) -> Figure {
    let mut groups: BTreeMap<&str, (Vec<String>, Vec<Value>)> = BTreeMap::new();
    for user in users {
        if !is_new_user(user, now) {
            continue;
        }
        let (Some(pin), Some(epoch)) = (user.pincode.as_deref(), user.create_epoch) else {
            continue;
        };
        let Some(date) = epoch_to_date(epoch) else {
            continue;
        };
        let entry = groups.entry(pin).or_default();
        entry.0.push(user.user_id.clone());
        entry.1.push(json!(date.format("%Y-%m-%d").to_string()));
    }
    let data = groups
        .into_iter()
        .map(|(pin, (x, y))| Trace::scatter(x, y).named(pin))
        .collect();
    let mut layout = base_layout("New Users Onboarding Timeline");
    layout.xaxis.tickangle = Some(0);
    layout.yaxis.kind = Some("category");
    layout.yaxis.title = Some("Onboarding Date".to_string());
    Figure { data, layout }
}

/// Users and dealers per pincode side by side: an outer join of the two
/// per-pincode counts with the absent side filled with zero.
pub fn pincode_overview(users: &[UserRecord], dealers: &[DealerRecord]) -> Figure {
    let mut user_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for user in users {
        if let Some(pin) = user.pincode.as_deref() {
            *user_counts.entry(pin).or_insert(0) += 1;
        }
    }
    let mut dealer_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for dealer in dealers {
        *dealer_counts.entry(dealer.pincode.as_str()).or_insert(0) += 1;
    }

    let pincodes: BTreeSet<&str> = user_counts
        .keys()
        .chain(dealer_counts.keys())
        .copied()
        .collect();
    let x: Vec<String> = pincodes.iter().map(|p| p.to_string()).collect();
    let users_y = pincodes
        .iter()
        .map(|p| json!(user_counts.get(p).copied().unwrap_or(0)))
        .collect();
    let dealers_y = pincodes
        .iter()
        .map(|p| json!(dealer_counts.get(p).copied().unwrap_or(0)))
        .collect();

    let mut layout = base_layout("Users and Dealers by Pincode");
    layout.barmode = Some("group");
    Figure {
        data: vec![
            Trace::bar(x.clone(), users_y).named("Users").colored(USERS_COLOR),
            Trace::bar(x, dealers_y).named("Dealers").colored(DEALERS_COLOR),
        ],
        layout,
    }
}
