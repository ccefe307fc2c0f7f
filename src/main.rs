// Entry point and high-level CLI flow.
//
// The binary exposes the three dashboard pages of the original analysis
// as console report groups:
// - Option [1] loads and cleans the three data sources, printing
//   diagnostics.
// - Option [2] generates the market overview reports (KPIs, district
//   summary, rent trend, youth affordability).
// - Option [3] generates the rent-control simulation reports.
// - Option [4] generates the fiscal projection reports and a JSON
//   summary.
use madrid_rent_report::metrics::DistrictFilter;
use madrid_rent_report::policy::{self, MADRID_SCENARIO};
use madrid_rent_report::types::Dataset;
use madrid_rent_report::{loader, output, reports, series, util};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;

// Simple in-memory app state so we only load/clean the data sources once
// but can generate reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Dataset>,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt. The prompt is reused for the main menu and numeric inputs.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_line_with_prompt(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Prompt for a numeric parameter, falling back to the shown default on
/// blank or unparsable input.
fn read_f64_default(label: &str, default: f64) -> f64 {
    let input = read_line_with_prompt(&format!("{} [{}]: ", label, default));
    util::parse_f64_safe(Some(input.as_str())).unwrap_or(default)
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn require_loaded() -> bool {
    let loaded = APP_STATE.lock().unwrap().data.is_some();
    if !loaded {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
    }
    loaded
}

/// Handle option [1]: load and clean the three data sources.
///
/// The load is all-or-nothing: a failure in any source leaves the app
/// state untouched.
fn handle_load() {
    match loader::load_all(
        loader::PRICES_PATH,
        loader::YEARLY_PATH,
        loader::BOUNDARIES_PATH,
    ) {
        Ok((data, report)) => {
            println!(
                "Processing price table... ({} rows read, {} records kept, {} without a usable price)",
                util::format_int(report.price_rows as i64),
                util::format_int(report.price_records as i64),
                util::format_int(report.null_prices as i64)
            );
            println!(
                "Processing salary table... ({} rows read, {} records kept)",
                util::format_int(report.yearly_rows as i64),
                util::format_int(report.yearly_records as i64)
            );
            println!(
                "Boundary file: {} district features; price data covers {} districts.",
                util::format_int(report.boundary_features as i64),
                util::format_int(report.districts as i64)
            );
            println!();
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load data: {:#}\n", e);
        }
    }
}

/// Handle option [2]: market overview reports.
///
/// Prompts for the KPI district, prints the KPI block, and writes the
/// district summary, rent trend, and youth affordability tables.
fn handle_market_reports() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
        return;
    };

    let filter = DistrictFilter::parse(&read_line_with_prompt("District for KPI cards [All]: "));
    let kpis = reports::market_kpis(&data.prices, &filter);
    let pct = |value: Option<f64>| {
        value
            .map(|v| format!("{}%", util::format_number(v, 2)))
            .unwrap_or_else(|| "N/A".to_string())
    };
    let with_unit = |value: Option<f64>, unit: &str| {
        value
            .map(|v| format!("{} {}", util::format_number(v, 2), unit))
            .unwrap_or_else(|| "N/A".to_string())
    };

    println!("\nMarket KPIs for {}:", filter);
    println!("  CAGR since 2012:    {}", pct(kpis.cagr_pct));
    println!("  Max rent price:     {}", with_unit(kpis.max_rent, "EUR/m2"));
    println!(
        "  City ranking:       {}",
        kpis.ranking
            .map(|r| format!("#{}", r))
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!("  Average rent:       {}", with_unit(kpis.avg_rent, "EUR/m2"));
    println!(
        "  Required income:    {}\n",
        with_unit(kpis.required_income, "EUR/month")
    );

    let summary = reports::district_summary(&data.prices);
    let file1 = "report1_district_summary.csv";
    if let Err(e) = output::write_csv(file1, &summary) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 1: District Market Summary");
    println!("(Ranked by average rent, valid observations only)\n");
    output::preview_table_rows(&summary, 5);
    println!("(Full table exported to {})\n", file1);

    let shaped = series::shape_time_series(&data.prices, &[]);
    let trend = reports::rent_trend(&shaped);
    let file2 = "report2_rent_trend.csv";
    if let Err(e) = output::write_csv(file2, &trend) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 2: Rent Price Trend");
    println!("(Monthly mean per district; citywide aggregate previewed below)\n");
    output::preview_table_rows(&reports::citywide_trend(&shaped), 3);
    println!("(Full per-district series exported to {})\n", file2);

    let burdens = series::yearly_burden(&data.yearly);
    let affordability = reports::youth_affordability(&burdens);
    let file3 = "report3_youth_affordability.csv";
    if let Err(e) = output::write_csv(file3, &affordability) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 3: Youth Salary vs Rent");
    println!("(Monthly rent as a share of average youth salary)\n");
    output::preview_table_rows(&affordability, 3);
    println!("(Full table exported to {})\n", file3);
}

/// Handle option [3]: rent-control simulation reports.
fn handle_control_reports() {
    if !require_loaded() {
        return;
    }
    let scenario = &*MADRID_SCENARIO;

    println!("Incentive level for landlords:");
    for (idx, level) in scenario.incentive_levels.iter().enumerate() {
        println!("[{}] {}", idx + 1, level.label);
    }
    let picked = read_choice()
        .parse::<usize>()
        .ok()
        .and_then(|n| scenario.incentive_levels.get(n.wrapping_sub(1)))
        .unwrap_or_else(|| &scenario.incentive_levels[scenario.incentive_levels.len() - 1]);
    println!(
        "\n{}: {}% participation, {}% expected rent increase, {} EUR net benefit per landlord\n",
        picked.label,
        util::format_number(picked.participation_pct, 0),
        util::format_number(picked.rent_increase_pct, 1),
        util::format_number(picked.net_benefit, 0)
    );

    let kpis = policy::citywide_kpis(scenario);
    println!(
        "Citywide average rent: {} -> {} EUR/m2",
        util::format_number(kpis.avg_before, 1),
        util::format_number(kpis.avg_after, 1)
    );
    println!(
        "Citywide tenant burden: {}% -> {}%\n",
        util::format_number(kpis.avg_burden_before, 1),
        util::format_number(kpis.avg_burden_after, 1)
    );

    let control = reports::rent_control(scenario);
    let file4 = "report4_rent_control.csv";
    if let Err(e) = output::write_csv(file4, &control) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 4: Rent Control Impact by District\n");
    output::preview_table_rows(&control, 5);
    println!("(Full table exported to {})\n", file4);

    let burden = reports::tenant_burden(scenario);
    let file5 = "report5_tenant_burden.csv";
    if let Err(e) = output::write_csv(file5, &burden) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 5: Tenant Burden by Category\n");
    output::preview_table_rows(&burden, 3);
    println!("(Full table exported to {})\n", file5);

    let breakdown = reports::burden_breakdown(scenario);
    let file6 = "report6_district_burden.csv";
    if let Err(e) = output::write_csv(file6, &breakdown) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 6: Burden Breakdown in Pilot Districts\n");
    output::preview_table_rows(&breakdown, 5);
    println!("(Full table exported to {})\n", file6);
}

/// Handle option [4]: fiscal projection reports and the JSON summary.
fn handle_fiscal_reports() {
    if !require_loaded() {
        return;
    }
    let scenario = &*MADRID_SCENARIO;

    let budget = read_f64_default(
        "Incentive budget (% of total)",
        policy::DEFAULT_INCENTIVE_BUDGET,
    );
    let tax_savings = read_f64_default(
        "Tax savings per landlord (EUR)",
        policy::DEFAULT_TAX_SAVINGS,
    );
    let growth_without = read_f64_default(
        "Revenue growth without program (%)",
        policy::DEFAULT_GROWTH_WITHOUT_PCT,
    );
    let growth_with = read_f64_default(
        "Revenue growth with program (%)",
        policy::DEFAULT_GROWTH_WITH_PCT,
    );

    let projection =
        policy::revenue_projection(scenario.base_property_tax, growth_without, growth_with);
    let summary = reports::fiscal_summary(scenario, budget, tax_savings, &projection);

    println!("\nFiscal KPIs:");
    println!(
        "  10-year ROI:        {}%",
        util::format_number(summary.roi_pct, 1)
    );
    println!("  Payback period:     {} years", summary.payback_years);
    println!(
        "  Revenue growth:     {}%",
        util::format_number(summary.revenue_growth_pct, 1)
    );
    println!(
        "  Cumulative gain:    {} M EUR",
        util::format_number(summary.cumulative_gain, 1)
    );
    println!(
        "  Landlord net gain:  {} EUR/year\n",
        util::format_number(summary.landlord_net_gain, 0)
    );

    let schedule = reports::revenue_schedule(scenario, &projection);
    let file7 = "report7_revenue_projection.csv";
    if let Err(e) = output::write_csv(file7, &schedule) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 7: Tax Revenue Projection");
    println!("(Millions of EUR per projected year)\n");
    output::preview_table_rows(&schedule, 3);
    println!("(Full table exported to {})\n", file7);

    let effectiveness = reports::district_cost_effectiveness(scenario);
    let file8 = "report8_cost_effectiveness.csv";
    if let Err(e) = output::write_csv(file8, &effectiveness) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Report 8: Incentive Cost-Effectiveness by District\n");
    output::preview_table_rows(&effectiveness, 5);
    println!("(Full table exported to {})\n", file8);

    if let Err(e) = output::write_json("fiscal_summary.json", &summary) {
        eprintln!("Write error: {:#}", e);
    }
    println!("Summary stats (fiscal_summary.json):");
    println!(
        "{{\"roi_pct\": {}, \"payback_years\": {}, \"cumulative_gain\": {}}}\n",
        util::format_number(summary.roi_pct, 2),
        summary.payback_years,
        util::format_number(summary.cumulative_gain, 2)
    );
}

fn main() {
    loop {
        println!("Madrid Rent Analytics");
        println!("[1] Load the data files");
        println!("[2] Market overview reports");
        println!("[3] Rent control simulation reports");
        println!("[4] Fiscal projection reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_market_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                println!();
                handle_control_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => {
                println!();
                handle_fiscal_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter a number between 1 and 4.\n");
            }
        }
    }
}
