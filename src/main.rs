// Entry point and high-level CLI flow.
//
// - Option [1] loads the inspection dataset, with a retry prompt on failure.
// - Option [2] builds the four views, writes the HTML page, JSON summary and
//   CSV table, and prints previews. The user can then go back to the menu
//   or exit.
// - Option [3] runs the array-methods tutorial.
// `--batch` and `--tutorial` run the same steps without the menu.
use anyhow::{Context, Result};
use chrono::Local;
use inspection_report::cli::Args;
use inspection_report::config::ReportConfig;
use inspection_report::loader::{self, DataSource};
use inspection_report::output;
use inspection_report::tutorial;
use inspection_report::types::{BucketRow, InspectionRecord};
use inspection_report::util::{format_int, format_number};
use inspection_report::views::{self, Report};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const RETRY_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_TUTORIAL_FILE: &str = "restaurants.json";

// Loaded once per session so views can be regenerated without re-fetching.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<InspectionRecord>>,
}

fn app_state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Print `prompt` and read one trimmed line; `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask a Y/N question until answered. A closed stdin counts as "no".
fn prompt_yes_no(question: &str) -> bool {
    loop {
        let Some(resp) = read_line(&format!("{} (Y/N): ", question)) else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn timeout(config: &ReportConfig) -> Duration {
    Duration::from_secs(config.timeout_secs)
}

fn print_load_summary(report: &loader::LoadReport) {
    println!(
        "Processing dataset... ({} records loaded, {} with inspection results)",
        format_int(report.loaded_rows),
        format_int(report.with_results)
    );
    if report.skipped_rows > 0 {
        println!(
            "Note: {} rows skipped because they were not records.",
            format_int(report.skipped_rows)
        );
    }
    let undated = report.loaded_rows - report.with_dates;
    if undated > 0 {
        println!(
            "Info: {} records have no usable inspection date.",
            format_int(undated)
        );
    }
    println!();
}

/// Handle option [1]: fetch the dataset, offering a retry on failure.
fn handle_load(config: &ReportConfig) {
    let source = DataSource::parse(&config.source);
    loop {
        println!("Loading inspection data from {}...", source);
        match loader::load_records(&source, timeout(config)) {
            Ok((data, load_report)) => {
                print_load_summary(&load_report);
                app_state().data = Some(data);
                return;
            }
            Err(e) => {
                error!(error = %e, "load failed");
                eprintln!("Failed to load data. Please check your internet/server and try again.");
                eprintln!("Uh-oh! We couldn't fetch {}: {}\n", source, e);
                if !prompt_yes_no("Retry") {
                    return;
                }
            }
        }
    }
}

fn month_rows(report: &Report) -> Vec<BucketRow> {
    report
        .stats
        .monthly
        .iter()
        .map(|m| BucketRow {
            key: m.label.clone(),
            total: m.total,
            compliant: m.compliant,
            rate: format_number(m.rate, 1),
        })
        .collect()
}

fn generate(data: &[InspectionRecord], config: &ReportConfig) -> Result<()> {
    println!("Generating views...");
    let report = views::build_report(data, &config.views, Local::now().naive_local());
    let written = output::write_report(&config.output_dir, &report)?;

    let table = &report.table;
    println!("Table View: {} establishments inspected in {}", table.city, table.year);
    println!(
        "({} of {} records match)\n",
        format_int(table.matched),
        format_int(table.total)
    );
    output::preview_table_rows(&table.rows, 5);

    println!("Card View: {} most recently inspected", report.cards.len());
    for card in &report.cards {
        println!(
            "  {} {} ({}) - inspected {}",
            card.status.icon(),
            card.name,
            card.city,
            card.inspection_date
        );
    }
    println!();

    println!("Category View: compliant establishments in {}", report.categories.city);
    for group in &report.categories.groups {
        println!("  {} {} ({})", group.icon, group.title, group.items.len());
    }
    println!();

    let stats = &report.stats;
    println!("Stats View:");
    println!(
        "  Overall compliance: {}% of {} inspections ({} critical)",
        format_number(stats.overall.rate, 1),
        format_int(stats.overall.total_with_results),
        format_int(stats.overall.critical_count)
    );
    println!(
        "  {} safety score: {}% - {}",
        stats.city,
        format_number(stats.city_rate, 1),
        stats.tip
    );
    match &stats.safest_category {
        Some(s) => println!(
            "  Safest category: {} ({}%)",
            s.category,
            format_number(s.rate, 1)
        ),
        None => println!("  Safest category: N/A"),
    }
    println!("\nTop categories by inspection volume");
    output::preview_table_rows(&output::bucket_rows(&stats.top_categories), stats.top_categories.len());
    println!("Top cities (10+ inspections)");
    output::preview_table_rows(&output::bucket_rows(&stats.top_cities), stats.top_cities.len());
    println!("Monthly trend");
    let months = month_rows(&report);
    output::preview_table_rows(&months, months.len());

    for path in &written {
        println!("Saved {}", path.display());
    }
    println!();
    Ok(())
}

/// Handle option [2]: build every view from the loaded data.
fn handle_generate(config: &ReportConfig) {
    let data = app_state().data.clone();
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
        return;
    };
    if let Err(e) = generate(&data, config) {
        error!(error = %e, "generate failed");
        eprintln!("Write error: {:#}", e);
    }
}

fn run_tutorial(path: &Path, config: &ReportConfig) -> Result<()> {
    println!("Tutorial: async data loading and array methods\n");
    let restaurants = match tutorial::load_restaurants(path, timeout(config)) {
        Ok(r) => {
            println!("Successfully loaded {} restaurants\n", r.len());
            r
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", path.display(), e);
            Vec::new()
        }
    };

    println!("Display (forEach):");
    for line in tutorial::display_lines(&restaurants) {
        println!("  {}", line);
    }

    println!("\nFilter (price range \"$\"):");
    let budget = tutorial::filter_budget(&restaurants);
    if restaurants.is_empty() {
        println!("  {}", tutorial::NO_DATA);
    } else if budget.is_empty() {
        println!("  {}", tutorial::NO_MATCHES);
    }
    for r in budget {
        println!("  {} | {} • {}", r.name, r.cuisine, r.price_range);
    }

    println!("\nMap (names):");
    if restaurants.is_empty() {
        println!("  {}", tutorial::NO_DATA);
    } else {
        for name in tutorial::map_names(&restaurants) {
            println!("  - {}", name);
        }
        let top = tutorial::top_rated(&restaurants).map_or("N/A", |r| r.name.as_str());
        println!("  Top-rated in this dataset: {}", top);
    }

    println!("\nError handling (loading from a bad path):");
    if let Some(e) = tutorial::error_demo(path, timeout(config)) {
        println!("  We tried a broken path on purpose: {}", e);
        println!("  The request failed gracefully.");
        if prompt_yes_no("  Retry the broken request") {
            match tutorial::error_demo(path, timeout(config)) {
                Some(_) => println!("  Retry failed again!"),
                None => println!("  This should not appear."),
            }
        }
        if prompt_yes_no("  Load the real data instead") {
            let reloaded = tutorial::load_restaurants(path, timeout(config))
                .with_context(|| format!("failed to reload {}", path.display()))?;
            println!("  Recovered: {} restaurants loaded", reloaded.len());
        }
    }
    println!();
    Ok(())
}

fn run_batch(config: &ReportConfig) -> Result<()> {
    let source = DataSource::parse(&config.source);
    let (data, load_report) =
        loader::load_with_retry(&source, config.retries, RETRY_DELAY, timeout(config))
            .with_context(|| format!("could not load data from {}", source))?;
    print_load_summary(&load_report);
    generate(&data, config)
}

fn menu(config: &ReportConfig, tutorial_path: &Path) {
    loop {
        println!("Food Inspection Reports:");
        println!("[1] Load the data");
        println!("[2] Generate views");
        println!("[3] Array methods tutorial\n");
        let Some(choice) = read_line("Enter choice: ") else {
            println!("Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(config),
            "2" => {
                println!();
                handle_generate(config);
                if !prompt_yes_no("Back to Report Selection") {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                if let Err(e) = run_tutorial(tutorial_path, config) {
                    eprintln!("Error: {:#}", e);
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}

fn main() {
    let args = Args::parse_args();
    init_logging(&args);
    info!("inspection_report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let config = match ReportConfig::resolve(&args) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = if args.batch {
        run_batch(&config)
    } else if let Some(path) = &args.tutorial {
        run_tutorial(path, &config)
    } else {
        let tutorial_path = PathBuf::from(DEFAULT_TUTORIAL_FILE);
        menu(&config, &tutorial_path);
        Ok(())
    };

    if let Err(e) = result {
        error!(error = %e, "run failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
