// Entry point and high-level CLI flow.
//
// The binary mirrors the dashboard's lifecycle without the web layer:
// - Option [1] loads and cleans the four CSV exports, printing diagnostics.
// - Option [2] generates the dashboard artifacts: the metric summary,
//   chart figures, and map documents, all as JSON files.
// - Option [3] runs drill-down lookups and exports them as CSV reports.
// - After generating artifacts, the user can choose to go back to the
//   selection menu or exit.
mod charts;
mod filters;
mod geo;
mod loader;
mod maps;
mod metrics;
mod output;
mod types;
mod util;

use chrono::Utc;
use loader::Datasets;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use types::MetricCardRow;

const USERS_FILE: &str = "users.csv";
const DEALERS_FILE: &str = "dealers.csv";
const DEALS_FILE: &str = "deal_requests.csv";
const DEALS_FULL_FILE: &str = "deal_requests_full.csv";

// Simple in-memory app state so we only load/clean the CSVs once but can
// generate artifacts and run lookups multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Datasets>,
}

/// Print a prompt and read a single trimmed line from stdin.
fn read_input(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_input("Enter choice: ")
}

/// Ask the user whether to go back to the main menu after generating
/// artifacts.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        let resp = read_input("Back to Menu (Y/N): ").to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load and clean the four CSV exports.
///
/// On success, we store the cleaned `Datasets` in `APP_STATE` and print a
/// short textual summary of what happened to each file.
fn handle_load() {
    let result = loader::load_all(
        Path::new(USERS_FILE),
        Path::new(DEALERS_FILE),
        Path::new(DEALS_FILE),
        Path::new(DEALS_FULL_FILE),
    );
    match result {
        Ok((data, reports)) => {
            for r in &reports {
                println!(
                    "Processing {}... ({} rows loaded, {} kept)",
                    r.dataset,
                    util::format_int(r.total_rows as i64),
                    util::format_int(r.kept_rows as i64)
                );
                if r.parse_errors > 0 {
                    println!(
                        "Note: {} rows skipped due to parse/validation errors.",
                        util::format_int(r.parse_errors as i64)
                    );
                }
                if r.fallback_coords > 0 {
                    println!(
                        "Info: Resolved coordinates by city/default fallback for {} rows.",
                        util::format_int(r.fallback_coords as i64)
                    );
                }
                if r.dropped_unlocated > 0 {
                    println!(
                        "Info: Dropped {} rows without usable coordinates.",
                        util::format_int(r.dropped_unlocated as i64)
                    );
                }
            }
            println!("");
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load datasets: {}\n", e);
        }
    }
}

fn loaded_data() -> Option<Datasets> {
    let state = APP_STATE.lock().unwrap();
    state.data.clone()
}

fn metric_cards(summary: &types::MetricsSummary) -> Vec<MetricCardRow> {
    let count = |label: &str, n: usize| MetricCardRow {
        metric: label.to_string(),
        value: util::format_int(n as i64),
    };
    let ratio = |label: &str, v: f64| MetricCardRow {
        metric: label.to_string(),
        value: format!("{:.2}%", v),
    };
    vec![
        count("Total Users", summary.total_users),
        count("Total Visits", summary.total_visits),
        count("New Users", summary.new_users),
        count("Active Users", summary.active_users),
        count("Total Deals", summary.total_deals),
        count("Unique Deals", summary.unique_deals),
        ratio("New User to Deal Ratio", summary.new_user_deal_ratio),
        ratio("Unique Deals vs Response Ratio", summary.response_ratio),
    ]
}

/// Handle option [2]: generate every dashboard artifact.
///
/// This function is intentionally side-effectful:
/// - writes the metric summary JSON,
/// - writes one JSON document per map and per chart figure,
/// - and prints a metric card preview to the console.
fn handle_generate() {
    let Some(data) = loaded_data() else {
        println!("Error: No data loaded. Please load the CSV files first (option 1).\n");
        return;
    };
    let now = Utc::now();

    println!("Generating dashboard artifacts...");
    println!("Outputs saved to individual files...\n");

    let summary = metrics::compute(&data.users, &data.deals, &data.deals_full, now);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Overview (summary.json):\n");
    output::preview_table_rows(&metric_cards(&summary), 8);

    let map_files = [
        ("map_users.json", maps::users_map(&data.deals)),
        ("map_dealers.json", maps::dealers_map(&data.dealers)),
        (
            "map_relations.json",
            maps::relational_map(&data.deals, &data.dealers),
        ),
    ];
    for (file, map) in &map_files {
        if let Err(e) = output::write_json(file, map) {
            eprintln!("Write error: {}", e);
        }
        println!("Map: {} markers exported to {}", map.markers.len(), file);
    }
    match maps::new_users_map(&data.users, now) {
        Some(map) => {
            if let Err(e) = output::write_json("map_new_users.json", &map) {
                eprintln!("Write error: {}", e);
            }
            println!("Map: {} markers exported to map_new_users.json", map.markers.len());
        }
        None => println!("Map: no new users in the last 30 days, map skipped"),
    }
    println!("");

    let figures = [
        ("chart_users_per_pincode.json", charts::users_per_pincode(&data.deals)),
        (
            "chart_dealers_per_pincode.json",
            charts::dealers_per_pincode(&data.dealers),
        ),
        (
            "chart_deal_requests_per_user.json",
            charts::deal_requests_per_user(&data.deals),
        ),
        (
            "chart_dealer_categories.json",
            charts::dealer_categories(&data.dealers),
        ),
        (
            "chart_new_users_timeline.json",
            charts::new_users_timeline(&data.users, now),
        ),
        (
            "chart_pincode_overview.json",
            charts::pincode_overview(&data.users, &data.dealers),
        ),
    ];
    for (file, figure) in &figures {
        if let Err(e) = output::write_json(file, figure) {
            eprintln!("Write error: {}", e);
        }
        println!("Chart: {} exported to {}", figure.layout.title, file);
    }
    println!("");
}

/// Handle option [3]: the lookup submenu. Each lookup previews its rows
/// and exports them as a CSV report.
fn handle_lookups() {
    let Some(data) = loaded_data() else {
        println!("Error: No data loaded. Please load the CSV files first (option 1).\n");
        return;
    };
    loop {
        println!("Select a lookup:");
        println!("[1] Deals on a date");
        println!("[2] Dealers by category");
        println!("[3] Dealers by pincode");
        println!("[4] Deals at a pincode");
        println!("[5] Back\n");
        match read_choice().as_str() {
            "1" => {
                let date = read_input("Enter date (YYYY-MM-DD): ");
                match filters::deals_on_date(&data.deals, &data.deals_full, &date) {
                    Ok(rows) => export_lookup("lookup_deals_on_date.csv", &rows),
                    Err(e) => eprintln!("Lookup error: {}\n", e),
                }
            }
            "2" => {
                let category = read_input("Enter category: ");
                let rows = filters::dealers_by_category(&data.dealers, &category);
                export_lookup("lookup_dealers_by_category.csv", &rows);
            }
            "3" => {
                let pincode = read_input("Enter pincode: ");
                let rows = filters::dealers_by_pincode(&data.dealers, &pincode);
                export_lookup("lookup_dealers_by_pincode.csv", &rows);
            }
            "4" => {
                let pincode = read_input("Enter pincode: ");
                let rows =
                    filters::deals_by_pincode(&data.deals, &data.deals_full, &data.dealers, &pincode);
                export_lookup("lookup_deals_by_pincode.csv", &rows);
            }
            "5" => return,
            _ => println!("Invalid choice. Please enter 1-5.\n"),
        }
    }
}

fn export_lookup<T>(file: &str, rows: &[T])
where
    T: serde::Serialize + tabled::Tabled + Clone,
{
    output::preview_table_rows(rows, 10);
    if rows.is_empty() {
        return;
    }
    if let Err(e) = output::write_csv(file, rows) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "({} rows exported to {})\n",
        util::format_int(rows.len() as i64),
        file
    );
}

fn main() {
    env_logger::init();
    loop {
        println!("Select an option:");
        println!("[1] Load datasets");
        println!("[2] Generate dashboard artifacts");
        println!("[3] Lookups\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!("");
                handle_generate();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                println!("");
                handle_lookups();
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
