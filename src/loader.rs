// Loading and cleaning for the four CSV exports.
//
// Each loader normalizes its export the same way: validate the required
// header columns once, then clean row by row, counting rows that fail
// parsing instead of aborting the load. Every record that survives carries
// concrete coordinates.
use crate::geo::{self, CoordSource};
use crate::types::{
    DealRecord, DealerRecord, RawDealRow, RawDealerRow, RawUserRow, ReportError, UserRecord,
};
use crate::util::{parse_datetime_flexible, parse_f64_safe, parse_i64_safe};
use csv::ReaderBuilder;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub dataset: &'static str,
    pub total_rows: usize,
    pub kept_rows: usize,
    pub parse_errors: usize,
    pub fallback_coords: usize,
    pub dropped_unlocated: usize,
}

impl LoadReport {
    fn new(dataset: &'static str) -> Self {
        LoadReport {
            dataset,
            total_rows: 0,
            kept_rows: 0,
            parse_errors: 0,
            fallback_coords: 0,
            dropped_unlocated: 0,
        }
    }
}

/// The four cleaned datasets, loaded together.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub users: Vec<UserRecord>,
    pub dealers: Vec<DealerRecord>,
    pub deals: Vec<DealRecord>,
    pub deals_full: Vec<DealRecord>,
}

fn open_reader(
    path: &Path,
    dataset: &'static str,
    required: &[&'static str],
) -> Result<csv::Reader<std::fs::File>, ReportError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| ReportError::Csv { dataset, source })?;
    let headers = rdr
        .headers()
        .map_err(|source| ReportError::Csv { dataset, source })?
        .clone();
    log::debug!("{} columns: {:?}", dataset, headers.iter().collect::<Vec<_>>());
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(ReportError::MissingColumn { dataset, column });
        }
    }
    Ok(rdr)
}

fn non_empty(s: Option<String>) -> Option<String> {
    let s = s?.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub fn load_users(path: &Path) -> Result<(Vec<UserRecord>, LoadReport), ReportError> {
    let dataset = "users";
    let mut rdr = open_reader(
        path,
        dataset,
        &["userid", "pincode", "locality", "phone", "name", "createEpoch"],
    )?;
    let mut report = LoadReport::new(dataset);
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawUserRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };
        let Some(user_id) = non_empty(row.userid) else {
            report.parse_errors += 1;
            continue;
        };
        let pincode = row.pincode.as_deref().and_then(geo::extract_pincode);
        // City fallback: locality, then state, then Mumbai.
        let city = non_empty(row.locality)
            .or_else(|| non_empty(row.state))
            .unwrap_or_else(|| "Mumbai".to_string());
        let (latitude, longitude, source) = geo::locate(pincode.as_deref(), Some(city.as_str()));
        if source != CoordSource::Pincode {
            report.fallback_coords += 1;
        }
        records.push(UserRecord {
            user_id,
            pincode,
            city,
            name: non_empty(row.name).unwrap_or_else(|| "Unknown".to_string()),
            phone: non_empty(row.phone).unwrap_or_else(|| "N/A".to_string()),
            create_epoch: parse_i64_safe(row.create_epoch.as_deref()),
            latitude,
            longitude,
        });
    }
    report.kept_rows = records.len();
    Ok((records, report))
}

pub fn load_dealers(path: &Path) -> Result<(Vec<DealerRecord>, LoadReport), ReportError> {
    let dataset = "dealers";
    let mut rdr = open_reader(
        path,
        dataset,
        &["_id", "pincode", "lat", "long", "coname", "cat_disp_names"],
    )?;
    let mut report = LoadReport::new(dataset);
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawDealerRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };
        let (Some(id), Some(pincode)) = (non_empty(row.id), non_empty(row.pincode)) else {
            report.parse_errors += 1;
            continue;
        };
        // Dealers have no geocode fallback: rows without usable
        // coordinates are dropped.
        let (Some(latitude), Some(longitude)) = (
            parse_f64_safe(row.lat.as_deref()),
            parse_f64_safe(row.lon.as_deref()),
        ) else {
            report.dropped_unlocated += 1;
            continue;
        };
        records.push(DealerRecord {
            id,
            coname: non_empty(row.coname).unwrap_or_else(|| "Unknown".to_string()),
            phone_no: non_empty(row.phone_no).unwrap_or_default(),
            addr1: non_empty(row.addr1).unwrap_or_default(),
            addr2: non_empty(row.addr2).unwrap_or_default(),
            landmark: non_empty(row.landmark).unwrap_or_default(),
            city: non_empty(row.city).unwrap_or_default(),
            pincode,
            latitude,
            longitude,
            cat_disp_names: non_empty(row.cat_disp_names).unwrap_or_default(),
            subcat_disp_names: non_empty(row.subcat_disp_names).unwrap_or_default(),
            img_url: non_empty(row.img_url),
        });
    }
    report.kept_rows = records.len();
    Ok((records, report))
}

/// Shared loader for the deal-request exports. The full dump treats a
/// missing `user_pincode` as Mumbai; the subset dump leaves the city blank
/// and lets the geocode default take over.
fn load_deal_requests(
    path: &Path,
    dataset: &'static str,
    default_city_mumbai: bool,
) -> Result<(Vec<DealRecord>, LoadReport), ReportError> {
    let mut rdr = open_reader(path, dataset, &["user_id", "user_pincode", "req_qty"])?;
    let mut report = LoadReport::new(dataset);
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawDealRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };
        let Some(user_id) = non_empty(row.user_id) else {
            report.parse_errors += 1;
            continue;
        };
        let Some(req_qty) = parse_f64_safe(row.req_qty.as_deref()) else {
            report.parse_errors += 1;
            continue;
        };
        let raw_pincode = non_empty(row.user_pincode);
        let pincode = raw_pincode.as_deref().and_then(geo::extract_pincode);
        // The pincode field doubles as "City, 400601"; the city is the
        // segment before the first comma.
        let mut city = raw_pincode
            .as_deref()
            .and_then(|raw| raw.split(',').next())
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if city.is_empty() && default_city_mumbai {
            city = "Mumbai".to_string();
        }
        let city_for_lookup = if city.is_empty() { None } else { Some(city.as_str()) };
        let (latitude, longitude, source) = geo::locate(pincode.as_deref(), city_for_lookup);
        if source != CoordSource::Pincode {
            report.fallback_coords += 1;
        }
        records.push(DealRecord {
            user_id,
            user_name: non_empty(row.user_name).unwrap_or_else(|| "Unknown".to_string()),
            pincode,
            city,
            req_qty,
            created_at: parse_datetime_flexible(row.created_at.as_deref()),
            dealer_coname: non_empty(row.dealer_coname),
            dealer_id: non_empty(row.dealer_id),
            latitude,
            longitude,
        });
    }
    report.kept_rows = records.len();
    Ok((records, report))
}

pub fn load_deals(path: &Path) -> Result<(Vec<DealRecord>, LoadReport), ReportError> {
    load_deal_requests(path, "deals", false)
}

pub fn load_deals_full(path: &Path) -> Result<(Vec<DealRecord>, LoadReport), ReportError> {
    load_deal_requests(path, "deals full", true)
}

/// Load all four exports. Fails with the dataset counts when any cleaned
/// dataset comes back empty; downstream analysis needs all of them.
pub fn load_all(
    users_path: &Path,
    dealers_path: &Path,
    deals_path: &Path,
    deals_full_path: &Path,
) -> Result<(Datasets, Vec<LoadReport>), ReportError> {
    let (users, users_report) = load_users(users_path)?;
    let (dealers, dealers_report) = load_dealers(dealers_path)?;
    let (deals, deals_report) = load_deals(deals_path)?;
    let (deals_full, deals_full_report) = load_deals_full(deals_full_path)?;

    if users.is_empty() || dealers.is_empty() || deals.is_empty() || deals_full.is_empty() {
        return Err(ReportError::EmptyDataset {
            users: users.len(),
            dealers: dealers.len(),
            deals: deals.len(),
            deals_full: deals_full.len(),
        });
    }

    Ok((
        Datasets {
            users,
            dealers,
            deals,
            deals_full,
        },
        vec![users_report, dealers_report, deals_report, deals_full_report],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::DEFAULT_COORDS;
    use std::path::PathBuf;

    fn fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("deal_insights_{}_{}.csv", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn users_clean_and_geocode() {
        let path = fixture(
            "users",
            "userid,pincode,locality,phone,name,createEpoch\n\
             u1,400601,Thane,911,Asha,1744243200\n\
             u2,no-pin,Thane,922,Ravi,1744243200\n\
             u3,unknown,,933,Meera,not-a-number\n\
             ,400601,Thane,944,Ghost,1744243200\n",
        );
        let (users, report) = load_users(&path).unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.kept_rows, 3);
        assert_eq!(report.parse_errors, 1);

        // Pincode table hit.
        assert_eq!(users[0].pincode.as_deref(), Some("400601"));
        assert_eq!((users[0].latitude, users[0].longitude), (19.1950, 72.9770));
        // City fallback.
        assert_eq!(users[1].pincode, None);
        assert_eq!((users[1].latitude, users[1].longitude), (19.2183, 72.9781));
        // Default fallback, missing locality, unparseable epoch.
        assert_eq!(users[2].city, "Mumbai");
        assert_eq!(users[2].create_epoch, None);
        assert_eq!(report.fallback_coords, 2);
    }

    #[test]
    fn dealers_require_coordinates() {
        let path = fixture(
            "dealers",
            "_id,coname,phone_no,pincode,lat,long,cat_disp_names,subcat_disp_names,Imgurl\n\
             d1,Acme Traders,900,400601,19.19,72.97,Paint | Tools,Brushes,http://a | http://b\n\
             d2,No Coords,901,400602,,72.98,Paint,,\n\
             ,Headless,902,400603,19.20,72.99,Tools,,\n",
        );
        let (dealers, report) = load_dealers(&path).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(dealers.len(), 1);
        assert_eq!(report.dropped_unlocated, 1);
        assert_eq!(report.parse_errors, 1);
        assert_eq!(dealers[0].coname, "Acme Traders");
        assert_eq!(dealers[0].img_url.as_deref(), Some("http://a | http://b"));
    }

    #[test]
    fn deals_extract_pincode_and_city() {
        let path = fixture(
            "deals",
            "user_id,user_name,user_pincode,req_qty,created_at,dealerinfo.coname,dealerinfo.dealer_id\n\
             u1,Asha,\"Navi Mumbai, 410206\",5,2025-04-10 09:00:00,Acme Traders,\n\
             u2,Ravi,Thane,3,2025-04-11,,d7\n\
             u3,Meera,400089,abc,2025-04-11,,\n",
        );
        let (deals, report) = load_deals(&path).unwrap();
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.parse_errors, 1);

        assert_eq!(deals[0].pincode.as_deref(), Some("410206"));
        assert_eq!(deals[0].city, "Navi Mumbai");
        assert_eq!((deals[0].latitude, deals[0].longitude), (19.0330, 73.0297));
        assert_eq!(deals[0].dealer_coname.as_deref(), Some("Acme Traders"));

        assert_eq!(deals[1].pincode, None);
        assert_eq!(deals[1].city, "Thane");
        assert_eq!(deals[1].dealer_id.as_deref(), Some("d7"));
        assert_eq!(report.fallback_coords, 1);
    }

    #[test]
    fn full_dump_defaults_city_to_mumbai() {
        let path = fixture(
            "deals_full",
            "user_id,user_name,user_pincode,req_qty\n\
             u9,Kiran,,2\n",
        );
        let (deals, report) = load_deals_full(&path).unwrap();
        assert_eq!(deals[0].city, "Mumbai");
        assert_eq!(
            (deals[0].latitude, deals[0].longitude),
            DEFAULT_COORDS
        );
        assert_eq!(report.fallback_coords, 1);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let path = fixture("headless", "user_id,req_qty\nu1,5\n");
        let err = load_deals(&path).unwrap_err();
        match err {
            ReportError::MissingColumn { dataset, column } => {
                assert_eq!(dataset, "deals");
                assert_eq!(column, "user_pincode");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
