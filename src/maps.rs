// Map document construction.
//
// A `MapDocument` is the serialized form of a Leaflet/Folium-style map:
// a center/zoom/tile header plus circle markers, div labels, and
// connecting lines. Popups are small HTML fragments, as the dashboard
// embeds them directly.
use crate::geo::{self, DEFAULT_COORDS};
use crate::metrics::is_new_user;
use crate::types::{DealRecord, DealerRecord, UserRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const TILES: &str = "cartodbpositron";
pub const USER_MARKER_COLOR: &str = "#1f77b4";
pub const DEALER_MARKER_COLOR: &str = "#ff7f0e";
pub const NEW_USER_MARKER_COLOR: &str = "#17becf";

#[derive(Debug, Serialize)]
pub struct MapDocument {
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: &'static str,
    pub markers: Vec<CircleMarker>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<MapLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<MapLine>,
}

impl MapDocument {
    fn new(zoom: u8) -> Self {
        MapDocument {
            center: [DEFAULT_COORDS.0, DEFAULT_COORDS.1],
            zoom,
            tiles: TILES,
            markers: Vec::new(),
            labels: Vec::new(),
            lines: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CircleMarker {
    pub location: [f64; 2],
    pub radius: f64,
    pub popup: String,
    pub color: String,
    pub fill: bool,
    pub fill_opacity: f64,
}

impl CircleMarker {
    fn new(location: [f64; 2], radius: f64, popup: String, color: &str) -> Self {
        CircleMarker {
            location,
            radius,
            popup,
            color: color.to_string(),
            fill: true,
            fill_opacity: 0.7,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MapLabel {
    pub location: [f64; 2],
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct MapLine {
    pub locations: [[f64; 2]; 2],
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
}

fn group_deals_by_pincode(deals: &[DealRecord]) -> BTreeMap<&str, Vec<&DealRecord>> {
    let mut groups: BTreeMap<&str, Vec<&DealRecord>> = BTreeMap::new();
    for deal in deals {
        if let Some(pin) = deal.pincode.as_deref() {
            groups.entry(pin).or_default().push(deal);
        }
    }
    groups
}

/// One marker per deal pincode: location from the pincode table (first
/// row's coordinates otherwise), radius scaled by the unique-user count
/// and capped, popup listing each user with their request count.
///
/// Returns the markers together with the pincode -> location table the
/// relational map draws lines from.
fn user_markers(deals: &[DealRecord]) -> (Vec<CircleMarker>, BTreeMap<String, (f64, f64)>) {
    let mut markers = Vec::new();
    let mut locations = BTreeMap::new();

    for (pin, group) in group_deals_by_pincode(deals) {
        let mut seen = HashSet::new();
        let mut unique_users = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for deal in &group {
            if seen.insert(deal.user_name.as_str()) {
                unique_users.push(deal.user_name.as_str());
            }
            *counts.entry(deal.user_name.as_str()).or_insert(0) += 1;
        }
        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let user_display = ranked
            .iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect::<Vec<_>>()
            .join("<br>");

        let (lat, lon) = geo::pincode_coords(pin)
            .unwrap_or_else(|| (group[0].latitude, group[0].longitude));
        let radius = (5 + unique_users.len() * 2).min(20) as f64;
        markers.push(CircleMarker::new(
            [lat, lon],
            radius,
            format!(
                "Pincode: {}<br>Users ({}):<br>{}",
                pin,
                unique_users.len(),
                user_display
            ),
            USER_MARKER_COLOR,
        ));
        locations.insert(pin.to_string(), (lat, lon));
    }
    (markers, locations)
}

pub fn users_map(deals: &[DealRecord]) -> MapDocument {
    let mut map = MapDocument::new(11);
    let (markers, _) = user_markers(deals);
    map.markers = markers;
    map
}

fn image_links_html(img_url: Option<&str>) -> String {
    match img_url {
        None => "No images available".to_string(),
        Some(links) => links
            .split(" | ")
            .map(|url| {
                let url = url.trim();
                let label = if url.is_empty() { "Invalid link" } else { url };
                format!("<a href='{}' target='_blank'>{}</a>", url, label)
            })
            .collect::<Vec<_>>()
            .join("<br>"),
    }
}

pub fn dealers_map(dealers: &[DealerRecord]) -> MapDocument {
    let mut map = MapDocument::new(11);
    for dealer in dealers {
        let popup = format!(
            "Dealer: {}<br>Phone: {}<br>Address: {}, {}, {}, {}, {}<br>Categories: {}<br>Subcategories: {}<br>Images: <br>{}",
            dealer.coname,
            dealer.phone_no,
            dealer.addr1,
            dealer.addr2,
            dealer.landmark,
            dealer.city,
            dealer.pincode,
            dealer.cat_disp_names,
            dealer.subcat_disp_names,
            image_links_html(dealer.img_url.as_deref()),
        );
        map.markers.push(CircleMarker::new(
            [dealer.latitude, dealer.longitude],
            5.0,
            popup,
            DEALER_MARKER_COLOR,
        ));
    }
    map
}

/// Users and dealers on one map, with a grey line per deal that can be
/// tied to a dealer: by company-name reference first, then by dealer id,
/// then a same-pincode link when a dealer exists at the user's pincode.
pub fn relational_map(deals: &[DealRecord], dealers: &[DealerRecord]) -> MapDocument {
    let mut map = MapDocument::new(11);
    let (markers, user_locations) = user_markers(deals);
    map.markers = markers;

    // Pincode -> dealer location; later dealers overwrite earlier ones.
    let mut dealer_locations: HashMap<&str, (f64, f64)> = HashMap::new();
    for dealer in dealers {
        map.markers.push(CircleMarker::new(
            [dealer.latitude, dealer.longitude],
            5.0,
            format!("Dealer: {}<br>Pincode: {}", dealer.coname, dealer.pincode),
            DEALER_MARKER_COLOR,
        ));
        dealer_locations.insert(dealer.pincode.as_str(), (dealer.latitude, dealer.longitude));
    }

    for deal in deals {
        let Some(pin) = deal.pincode.as_deref() else {
            continue;
        };
        let Some(&user_loc) = user_locations.get(pin) else {
            continue;
        };
        let dealer_loc = if let Some(coname) = deal.dealer_coname.as_deref() {
            dealers
                .iter()
                .find(|d| d.coname == coname)
                .and_then(|d| dealer_locations.get(d.pincode.as_str()).copied())
        } else if let Some(dealer_id) = deal.dealer_id.as_deref() {
            dealers
                .iter()
                .find(|d| d.id == dealer_id)
                .and_then(|d| dealer_locations.get(d.pincode.as_str()).copied())
        } else {
            dealer_locations.get(pin).copied()
        };
        if let Some(dealer_loc) = dealer_loc {
            map.lines.push(MapLine {
                locations: [[user_loc.0, user_loc.1], [dealer_loc.0, dealer_loc.1]],
                color: "grey".to_string(),
                weight: 1,
                opacity: 0.5,
            });
        }
    }
    map
}

/// Users onboarded in the trailing 30-day window, grouped by pincode, with
/// a total-pincode label beside the map center. `None` when there is
/// nothing to show.
pub fn new_users_map(users: &[UserRecord], now: DateTime<Utc>) -> Option<MapDocument> {
    if users.is_empty() {
        log::warn!("No users found in the dataset.");
        return None;
    }
    let mut groups: BTreeMap<&str, Vec<&UserRecord>> = BTreeMap::new();
    for user in users {
        if !is_new_user(user, now) {
            continue;
        }
        if let Some(pin) = user.pincode.as_deref() {
            groups.entry(pin).or_default().push(user);
        }
    }
    if groups.is_empty() {
        log::warn!("No new users found in the last 30 days.");
        return None;
    }

    let mut map = MapDocument::new(10);
    map.labels.push(MapLabel {
        location: [DEFAULT_COORDS.0, DEFAULT_COORDS.1 - 0.2],
        html: format!("Total Pincodes: {}", groups.len()),
    });
    for (pin, group) in groups {
        let user_count = group
            .iter()
            .map(|u| u.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let mut seen_names = HashSet::new();
        let mut names = Vec::new();
        let mut seen_phones = HashSet::new();
        let mut phones = Vec::new();
        for user in &group {
            if seen_names.insert(user.name.as_str()) {
                names.push(user.name.as_str());
            }
            if seen_phones.insert(user.phone.as_str()) {
                phones.push(user.phone.as_str());
            }
        }
        let (lat, lon) = (group[0].latitude, group[0].longitude);
        map.markers.push(CircleMarker::new(
            [lat, lon],
            5.0 + user_count as f64 * 0.5,
            format!(
                "Pincode: {}<br>Users: {}<br>Names: {}<br>Phones: {}",
                pin,
                user_count,
                names.join(", "),
                phones.join(", ")
            ),
            NEW_USER_MARKER_COLOR,
        ));
    }
    Some(map)
}
