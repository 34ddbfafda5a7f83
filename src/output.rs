use crate::error::ExportError;
use crate::geo::{MAP_CENTER, MAP_ZOOM};
use crate::types::{ChartRow, MapMarker, MarkerRow, ProjectRecord, ProjectRow};
use crate::util::format_number;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

const BAR_WIDTH: usize = 30;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markers as a GeoJSON FeatureCollection, popup fields in `properties`.
pub fn write_geojson(path: &Path, markers: &[MapMarker]) -> Result<(), ExportError> {
    let features: Vec<serde_json::Value> = markers
        .iter()
        .map(|m| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    // GeoJSON positions are [lon, lat].
                    "coordinates": [m.longitude, m.latitude],
                },
                "properties": {
                    "project": m.project_id,
                    "province": m.province,
                    "impact_rating": m.impact_rating,
                    "risk_index": m.risk_index,
                    "energy_output_kwh": m.energy_output,
                    "co2_reduction_kg": m.co2_reduction,
                },
            })
        })
        .collect();
    let doc = json!({
        "type": "FeatureCollection",
        "properties": {
            "center": [MAP_CENTER.1, MAP_CENTER.0],
            "zoom": MAP_ZOOM,
        },
        "features": features,
    });
    write_json(path, &doc)
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n### {}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows", rows.len() - max_rows);
    }
    println!();
}

fn opt_label(s: Option<&str>) -> String {
    s.unwrap_or("-").to_string()
}

pub fn project_row(r: &ProjectRecord) -> ProjectRow {
    ProjectRow {
        project_id: r.project_id.clone(),
        province: r.province_label().to_string(),
        co2_reduction: format_number(r.co2_reduction, 2),
        energy_output: format_number(r.energy_output, 2),
        co2_efficiency: format_number(r.co2_efficiency, 2),
        risk_index: format_number(r.environmental_risk_index, 2),
        impact_rating: r.impact_rating.clone(),
        impact_category: opt_label(r.impact_category.map(|c| c.label())),
    }
}

pub fn marker_row(m: &MapMarker) -> MarkerRow {
    MarkerRow {
        project_id: m.project_id.clone(),
        province: m.province.clone(),
        latitude: format!("{:.4}", m.latitude),
        longitude: format!("{:.4}", m.longitude),
        impact_rating: m.impact_rating.clone(),
        risk_index: format_number(m.risk_index, 2),
        energy_output: format_number(m.energy_output, 2),
        co2_reduction: format_number(m.co2_reduction, 2),
    }
}

/// Chart rows with bars scaled to the largest finite value. Entries are
/// expected already sorted.
pub fn chart_rows(entries: &[(String, f64)], decimals: usize) -> Vec<ChartRow> {
    let max = entries
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(0.0_f64, f64::max);
    entries
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let width = if max > 0.0 && value.is_finite() && *value > 0.0 {
                ((value / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            ChartRow {
                rank: i + 1,
                label: label.clone(),
                value: format_number(*value, decimals),
                bar: "█".repeat(width),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_to_largest_value() {
        let rows = chart_rows(
            &[
                ("A".to_string(), 10.0),
                ("B".to_string(), 5.0),
                ("C".to_string(), f64::NAN),
            ],
            1,
        );
        assert_eq!(rows[0].bar.chars().count(), BAR_WIDTH);
        assert_eq!(rows[1].bar.chars().count(), BAR_WIDTH / 2);
        assert_eq!(rows[2].bar, "");
        assert_eq!(rows[2].value, "n/a");
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn project_row_marks_missing_fields() {
        let r = ProjectRecord::derive("X-1", 10.0, 0.0, 50.0, "n/a");
        let row = project_row(&r);
        assert_eq!(row.province, "-");
        assert_eq!(row.co2_efficiency, "n/a");
        assert_eq!(row.impact_category, "-");
    }

    #[test]
    fn geojson_uses_lon_lat_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.geojson");
        let marker = MapMarker {
            project_id: "PLTS-NTT-001".to_string(),
            province: "NTT".to_string(),
            impact_rating: "High".to_string(),
            risk_index: 62.0,
            energy_output: 400.0,
            co2_reduction: 1200.0,
            latitude: -10.1772,
            longitude: 123.607,
        };
        write_geojson(&path, &[marker]).unwrap();
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["type"], "FeatureCollection");
        let feature = &doc["features"][0];
        assert_eq!(feature["geometry"]["coordinates"][0], 123.607);
        assert_eq!(feature["geometry"]["coordinates"][1], -10.1772);
        assert_eq!(feature["properties"]["project"], "PLTS-NTT-001");
    }

    #[test]
    fn chart_csv_omits_bars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.csv");
        write_csv(&path, &chart_rows(&[("NTT".to_string(), 2.5)], 2)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Rank,Label,Value\n1,NTT,2.50\n");
    }
}
