// Terminal rendering of the dashboard sections plus the optional exports.
use crate::error::ExportError;
use crate::loader::Dataset;
use crate::output::{self, chart_rows, marker_row, project_row};
use crate::recommend::recommend;
use crate::reports::{self, ProvinceMetric};
use crate::types::{ChartRow, MarkerRow, ProjectRecord, ProjectRow, SummaryStats};
use crate::util::{format_int, format_number};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// A rendered chart: title, export file stem and its sorted bars.
pub struct Chart {
    pub title: &'static str,
    pub file_stem: &'static str,
    pub rows: Vec<ChartRow>,
}

/// The six aggregate charts, each sorted by its own metric.
pub fn build_charts(data: &Dataset) -> Vec<Chart> {
    let records = data.records();
    let per_project = |ranked: Vec<&ProjectRecord>, f: fn(&ProjectRecord) -> f64| {
        ranked
            .into_iter()
            .map(|r| (r.project_id.clone(), f(r)))
            .collect::<Vec<_>>()
    };

    let aggregates = reports::province_aggregates(records);
    let per_province = |metric: ProvinceMetric| {
        reports::sort_provinces(&aggregates, metric)
            .into_iter()
            .map(|a| {
                let v = metric.value(&a);
                (a.province, v)
            })
            .collect::<Vec<_>>()
    };

    let total = records.len().max(1) as f64;
    let categories: Vec<(String, f64)> = reports::category_distribution(records)
        .into_iter()
        .map(|(label, n)| (format!("{} ({:.1}%)", label, n as f64 / total * 100.0), n as f64))
        .collect();

    vec![
        Chart {
            title: "CO2 Efficiency per kWh per Project",
            file_stem: "chart_efficiency_by_project",
            rows: chart_rows(
                &per_project(reports::rank_by_efficiency(records), |r| r.co2_efficiency),
                2,
            ),
        },
        Chart {
            title: "Environmental Risk Index per Project",
            file_stem: "chart_risk_by_project",
            rows: chart_rows(
                &per_project(reports::rank_by_risk(records), |r| {
                    r.environmental_risk_index
                }),
                2,
            ),
        },
        Chart {
            title: "Impact Rating Distribution",
            file_stem: "chart_impact_distribution",
            rows: chart_rows(&categories, 0),
        },
        Chart {
            title: "Total CO2 Reduction per Province",
            file_stem: "chart_co2_by_province",
            rows: chart_rows(&per_province(ProvinceMetric::TotalCo2), 2),
        },
        Chart {
            title: "Mean CO2 Efficiency per kWh per Province",
            file_stem: "chart_efficiency_by_province",
            rows: chart_rows(&per_province(ProvinceMetric::MeanEfficiency), 2),
        },
        Chart {
            title: "Mean Environmental Risk Index per Province",
            file_stem: "chart_risk_by_province",
            rows: chart_rows(&per_province(ProvinceMetric::MeanRisk), 2),
        },
    ]
}

fn render_summary(stats: &SummaryStats) {
    println!("## Summary");
    println!(
        "Total CO2 Reduction (kg):   {}",
        format_number(stats.total_co2_reduction.trunc(), 0)
    );
    println!(
        "Total Energy Output (kWh):  {}",
        format_number(stats.total_energy_output.trunc(), 0)
    );
    println!(
        "Mean Environmental Risk:    {}",
        format_number(stats.mean_risk_index, 2)
    );
    println!(
        "Projects: {} across {} provinces ({} on the map)\n",
        format_int(stats.total_projects),
        format_int(stats.total_provinces),
        format_int(stats.mapped_projects)
    );
}

fn render_callouts(records: &[ProjectRecord]) {
    println!("## Project Analysis");
    match reports::top_efficiency(records) {
        Some(r) => println!(
            "Most efficient project: {} ({} kg/kWh)",
            r.project_id,
            format_number(r.co2_efficiency, 2)
        ),
        None => println!("Most efficient project: n/a (no defined efficiency)"),
    }
    match reports::top_risk(records) {
        Some(r) => println!(
            "Highest risk: {} (Index: {})",
            r.project_id,
            format_number(r.environmental_risk_index, 2)
        ),
        None => println!("Highest risk: n/a"),
    }
}

/// Print every dashboard section. `max_rows` limits the per-project tables.
pub fn render_dashboard(data: &Dataset, max_rows: usize) {
    let records = data.records();
    println!("# Environmental Project Dashboard");
    println!("Source: {} ({} projects)\n", data.source().display(), format_int(data.len()));

    render_summary(&reports::summary_stats(records));
    render_callouts(records);

    let rows: Vec<ProjectRow> = records.iter().map(project_row).collect();
    output::preview_table("Project Data", None, &rows, max_rows);

    let markers: Vec<MarkerRow> = reports::map_markers(records)
        .iter()
        .map(marker_row)
        .collect();
    output::preview_table(
        "Project Locations",
        Some("projects without a known province are not mapped"),
        &markers,
        max_rows,
    );

    println!("## Charts");
    for (i, chart) in build_charts(data).iter().enumerate() {
        // The first two charts list every project; the rest are small.
        let limit = if i < 2 { max_rows } else { usize::MAX };
        output::preview_table(chart.title, None, &chart.rows, limit);
    }
}

/// Recommendation panel text for one record.
pub fn recommendation_panel(record: &ProjectRecord) -> String {
    format!(
        "### Project: {} ({})\n{}",
        record.project_id,
        record.province_label(),
        recommend(record)
    )
}

#[derive(Serialize)]
struct ExportSummary<'a> {
    generated_at: DateTime<Local>,
    source: String,
    #[serde(flatten)]
    stats: &'a SummaryStats,
    most_efficient_project: Option<&'a str>,
    highest_risk_project: Option<&'a str>,
}

/// Write the map, every chart and a JSON summary into `dir`.
pub fn export(data: &Dataset, dir: &Path) -> Result<usize, ExportError> {
    fs::create_dir_all(dir)?;
    let records = data.records();
    let mut written = 0usize;

    output::write_geojson(&dir.join("markers.geojson"), &reports::map_markers(records))?;
    written += 1;

    for chart in build_charts(data) {
        output::write_csv(&dir.join(format!("{}.csv", chart.file_stem)), &chart.rows)?;
        written += 1;
    }

    let stats = reports::summary_stats(records);
    let summary = ExportSummary {
        generated_at: Local::now(),
        source: data.source().display().to_string(),
        stats: &stats,
        most_efficient_project: reports::top_efficiency(records).map(|r| r.project_id.as_str()),
        highest_risk_project: reports::top_risk(records).map(|r| r.project_id.as_str()),
    };
    output::write_json(&dir.join("summary.json"), &summary)?;
    written += 1;

    info!(dir = %dir.display(), files = written, "exports written");
    Ok(written)
}
