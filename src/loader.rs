use crate::error::LoadError;
use crate::geo::is_mapped;
use crate::types::{ProjectRecord, RawRow, REQUIRED_COLUMNS};
use crate::util::parse_f64_safe;
use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the dataset comes from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Sheet name; ignored for CSV sources.
    pub sheet: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub unmatched_province: usize,
    pub unmapped_province: usize,
    pub uncategorized: usize,
    pub undefined_efficiency: usize,
    pub unparsed_cells: usize,
}

/// The enriched record set. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<ProjectRecord>,
    source: PathBuf,
}

impl Dataset {
    pub fn new(records: Vec<ProjectRecord>, source: impl Into<PathBuf>) -> Self {
        Dataset {
            records,
            source: source.into(),
        }
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// First record with the given id.
    pub fn find(&self, project_id: &str) -> Option<&ProjectRecord> {
        self.records.iter().find(|r| r.project_id == project_id)
    }

    /// Distinct project ids in input order, for the selector.
    pub fn project_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.project_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

pub fn load_dataset(cfg: &SourceConfig) -> Result<(Dataset, LoadReport), LoadError> {
    std::fs::metadata(&cfg.path).map_err(|source| LoadError::Io {
        path: cfg.path.clone(),
        source,
    })?;
    let rows = read_rows(cfg)?;
    let (records, report) = derive_records(rows);
    if records.is_empty() {
        return Err(LoadError::Empty);
    }
    info!(
        path = %cfg.path.display(),
        rows = report.total_rows,
        unmatched_province = report.unmatched_province,
        unmapped_province = report.unmapped_province,
        uncategorized = report.uncategorized,
        undefined_efficiency = report.undefined_efficiency,
        "dataset loaded"
    );
    Ok((Dataset::new(records, cfg.path.clone()), report))
}

fn read_rows(cfg: &SourceConfig) -> Result<Vec<RawRow>, LoadError> {
    let ext = cfg
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv(&cfg.path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_sheet(&cfg.path, &cfg.sheet),
        _ => Err(LoadError::UnsupportedFormat(ext)),
    }
}

fn read_csv(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    column_indices(&headers)?;

    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawRow>() {
        let row = result?;
        if !is_blank(&row) {
            rows.push(row);
        }
    }
    debug!(rows = rows.len(), "csv rows read");
    Ok(rows)
}

fn read_sheet(path: &Path, sheet: &str) -> Result<Vec<RawRow>, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        return Err(LoadError::SheetNotFound {
            sheet: sheet.to_string(),
            available: names.join(", "),
        });
    }
    let range = workbook.worksheet_range(sheet)?;
    let mut iter = range.rows();
    let headers: Vec<String> = iter
        .next()
        .map(|h| {
            h.iter()
                .map(|c| cell_text(c).unwrap_or_default().trim().to_string())
                .collect()
        })
        .unwrap_or_default();
    let [id, co2, energy, risk, rating] = column_indices(&headers)?;

    let mut rows = Vec::new();
    for cells in iter {
        let get = |i: usize| cells.get(i).and_then(cell_text);
        let row = RawRow {
            project_id: get(id),
            co2_reduction: get(co2),
            energy_output: get(energy),
            environmental_risk_index: get(risk),
            impact_rating: get(rating),
        };
        if !is_blank(&row) {
            rows.push(row);
        }
    }
    debug!(sheet, rows = rows.len(), "sheet rows read");
    Ok(rows)
}

/// Positions of the required columns, in `REQUIRED_COLUMNS` order.
fn column_indices(headers: &[String]) -> Result<[usize; 5], LoadError> {
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or(LoadError::MissingColumn(name))?;
    }
    Ok(idx)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        other => Some(other.to_string()),
    }
}

fn is_blank(row: &RawRow) -> bool {
    row.project_id.is_none()
        && row.co2_reduction.is_none()
        && row.energy_output.is_none()
        && row.environmental_risk_index.is_none()
        && row.impact_rating.is_none()
}

fn parse_cell(raw: Option<&str>, unparsed: &mut usize) -> f64 {
    match parse_f64_safe(raw) {
        Some(v) => v,
        None => {
            *unparsed += 1;
            f64::NAN
        }
    }
}

/// Turn raw rows into records, tallying every derivation miss.
pub fn derive_records(rows: Vec<RawRow>) -> (Vec<ProjectRecord>, LoadReport) {
    let mut report = LoadReport {
        total_rows: rows.len(),
        ..LoadReport::default()
    };
    let mut warned: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let co2 = parse_cell(row.co2_reduction.as_deref(), &mut report.unparsed_cells);
        let energy = parse_cell(row.energy_output.as_deref(), &mut report.unparsed_cells);
        let risk = parse_cell(
            row.environmental_risk_index.as_deref(),
            &mut report.unparsed_cells,
        );
        let project_id = row.project_id.unwrap_or_default().trim().to_string();
        let rating = row.impact_rating.unwrap_or_default().trim().to_string();

        let record = ProjectRecord::derive(project_id, co2, energy, risk, rating);

        match record.province_code.as_deref() {
            None => {
                report.unmatched_province += 1;
                debug!(project = %record.project_id, "no province code in project id");
            }
            Some(code) if !is_mapped(code) => {
                report.unmapped_province += 1;
                if warned.insert(code.to_string()) {
                    warn!(province = code, "province has no coordinates; left off the map");
                }
            }
            Some(_) => {}
        }
        if record.impact_category.is_none() {
            report.uncategorized += 1;
            debug!(project = %record.project_id, rating = %record.impact_rating, "no impact category");
        }
        if record.co2_efficiency.is_nan() {
            report.undefined_efficiency += 1;
        }
        records.push(record);
    }
    (records, report)
}
