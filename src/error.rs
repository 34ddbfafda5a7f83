use std::path::PathBuf;

/// Failures while reading the dataset. All of them abort the render.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("sheet '{sheet}' not found (available: {available})")]
    SheetNotFound { sheet: String, available: String },
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
    #[error("unsupported file type '{0}' (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedFormat(String),
    #[error("dataset contains no project rows")]
    Empty,
}

/// Failures while writing exports. Reported, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
