// Entry point and high-level CLI flow.
//
// The dataset is loaded once at start-up into an immutable `Dataset` that
// every later step borrows. After that the binary either renders a single
// pass (`--no-interactive` / `--project`) or drops into a small menu.
mod dashboard;
mod error;
mod geo;
mod loader;
mod output;
mod recommend;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use loader::{Dataset, LoadReport, SourceConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;

/// Environmental project dashboard: metrics, map, charts and per-project
/// recommendations for a project spreadsheet.
#[derive(Debug, Parser)]
#[command(name = "enviro-dashboard", version, about)]
struct Args {
    /// Spreadsheet (.xlsx/.xls/.ods) or CSV file with the project data
    #[arg(short, long, default_value = "Environmental_Dataset.xlsx")]
    input: PathBuf,

    /// Sheet to read from a spreadsheet source
    #[arg(short, long, default_value = "Environmental_Dataset")]
    sheet: String,

    /// Print the recommendation for this project id and exit
    #[arg(short, long)]
    project: Option<String>,

    /// Render the dashboard once and exit
    #[arg(long)]
    no_interactive: bool,

    /// Directory for GeoJSON/CSV/JSON exports
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Maximum rows shown in per-project tables and charts
    #[arg(long, value_parser = parse_row_limit)]
    rows: Option<usize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_row_limit(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("row limit must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    // Logs go to stderr; stdout carries the dashboard itself.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Read a single trimmed line after printing `prompt`. `None` on EOF.
fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Dataset loaded ({} rows).",
        util::format_int(report.total_rows)
    );
    if report.unmatched_province > 0 || report.unmapped_province > 0 {
        println!(
            "Note: {} rows without a province code, {} with a province missing from the map.",
            util::format_int(report.unmatched_province),
            util::format_int(report.unmapped_province)
        );
    }
    if report.uncategorized > 0 {
        println!(
            "Note: {} rows have no High/Medium/Low impact rating (shown as Unclassified).",
            util::format_int(report.uncategorized)
        );
    }
    if report.undefined_efficiency > 0 || report.unparsed_cells > 0 {
        println!(
            "Note: {} rows have an undefined efficiency; {} numeric cells could not be read.",
            util::format_int(report.undefined_efficiency),
            util::format_int(report.unparsed_cells)
        );
    }
    println!();
}

/// Resolve a selector answer: a 1-based list number or a project id.
fn select_project<'a>(data: &'a Dataset, answer: &str) -> Option<&'a types::ProjectRecord> {
    if let Ok(n) = answer.parse::<usize>() {
        let ids = data.project_ids();
        if let Some(id) = n.checked_sub(1).and_then(|i| ids.get(i)) {
            return data.find(id);
        }
    }
    data.find(answer)
}

fn handle_recommendation(data: &Dataset) {
    println!("\n## Recommendations & Action Plan");
    for (i, id) in data.project_ids().iter().enumerate() {
        println!("[{}] {}", i + 1, id);
    }
    loop {
        let Some(answer) = prompt_line("Select project (number or id, blank to return): ") else {
            return;
        };
        if answer.is_empty() {
            return;
        }
        match select_project(data, &answer) {
            Some(record) => {
                println!("\n{}\n", dashboard::recommendation_panel(record));
                return;
            }
            None => println!("Unknown project '{}'. Please try again.", answer),
        }
    }
}

fn handle_export(data: &Dataset, dir: Option<&PathBuf>) {
    let dir = match dir {
        Some(d) => d.clone(),
        None => match prompt_line("Export directory: ") {
            Some(d) if !d.is_empty() => PathBuf::from(d),
            _ => return,
        },
    };
    match dashboard::export(data, &dir) {
        Ok(n) => println!("{} files written to {}\n", n, dir.display()),
        Err(e) => eprintln!("Export failed: {}\n", e),
    }
}

fn run_menu(data: &Dataset, args: &Args, max_rows: usize) {
    loop {
        println!("[1] Show dashboard");
        println!("[2] Project recommendation");
        println!("[3] Export");
        println!("[0] Exit\n");
        let Some(choice) = prompt_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => dashboard::render_dashboard(data, max_rows),
            "2" => handle_recommendation(data),
            "3" => handle_export(data, args.export_dir.as_ref()),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-3.\n"),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    let source = SourceConfig {
        path: args.input.clone(),
        sheet: args.sheet.clone(),
    };
    let (data, report) = loader::load_dataset(&source)
        .with_context(|| format!("failed to load {}", source.path.display()))?;
    print_load_report(&report);

    let max_rows = args.rows.unwrap_or(usize::MAX);

    if let Some(id) = args.project.as_deref() {
        let record = data
            .find(id)
            .with_context(|| format!("project '{}' not found", id))?;
        println!("{}", dashboard::recommendation_panel(record));
    } else if args.no_interactive {
        dashboard::render_dashboard(&data, max_rows);
    } else {
        run_menu(&data, &args, max_rows);
        return Ok(());
    }

    if let Some(dir) = args.export_dir.as_ref() {
        if let Err(e) = dashboard::export(&data, dir) {
            warn!(error = %e, "export failed");
        }
    }
    Ok(())
}
