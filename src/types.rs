use crate::geo::province_coordinates;
use crate::util::{co2_efficiency, extract_impact_category, extract_province};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Columns every source must carry, in the order they are read.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Project_ID",
    "CO2_Reduction",
    "Energy_Output",
    "Environmental_Risk_Index",
    "Peringkat_Dampak",
];

/// Label used for records whose impact rating carries no known category.
pub const UNCLASSIFIED: &str = "Unclassified";

/// One raw sheet row, all cells kept as text until the loader parses them.
#[derive(Debug, Default, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Project_ID")]
    pub project_id: Option<String>,
    #[serde(rename = "CO2_Reduction")]
    pub co2_reduction: Option<String>,
    #[serde(rename = "Energy_Output")]
    pub energy_output: Option<String>,
    #[serde(rename = "Environmental_Risk_Index")]
    pub environmental_risk_index: Option<String>,
    #[serde(rename = "Peringkat_Dampak")]
    pub impact_rating: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ImpactCategory {
    High,
    Medium,
    Low,
}

impl ImpactCategory {
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "High" => Some(ImpactCategory::High),
            "Medium" => Some(ImpactCategory::Medium),
            "Low" => Some(ImpactCategory::Low),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImpactCategory::High => "High",
            ImpactCategory::Medium => "Medium",
            ImpactCategory::Low => "Low",
        }
    }
}

impl fmt::Display for ImpactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A project row with its derived fields resolved.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub project_id: String,
    pub co2_reduction: f64,
    pub energy_output: f64,
    pub environmental_risk_index: f64,
    pub impact_rating: String,
    pub province_code: Option<String>,
    /// `NaN` when the energy output is zero or missing.
    pub co2_efficiency: f64,
    pub impact_category: Option<ImpactCategory>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ProjectRecord {
    /// Build a record from its source fields, resolving every derived field.
    pub fn derive(
        project_id: impl Into<String>,
        co2_reduction: f64,
        energy_output: f64,
        environmental_risk_index: f64,
        impact_rating: impl Into<String>,
    ) -> Self {
        let project_id = project_id.into();
        let impact_rating = impact_rating.into();
        let province_code = extract_province(&project_id);
        let coords = province_code.as_deref().and_then(province_coordinates);
        ProjectRecord {
            co2_efficiency: co2_efficiency(co2_reduction, energy_output),
            impact_category: extract_impact_category(&impact_rating),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            project_id,
            co2_reduction,
            energy_output,
            environmental_risk_index,
            impact_rating,
            province_code,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn province_label(&self) -> &str {
        self.province_code.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ProjectRow {
    #[serde(rename = "Project_ID")]
    #[tabled(rename = "Project_ID")]
    pub project_id: String,
    #[serde(rename = "Province")]
    #[tabled(rename = "Province")]
    pub province: String,
    #[serde(rename = "CO2_Reduction")]
    #[tabled(rename = "CO2_Reduction")]
    pub co2_reduction: String,
    #[serde(rename = "Energy_Output")]
    #[tabled(rename = "Energy_Output")]
    pub energy_output: String,
    #[serde(rename = "CO2_per_kWh")]
    #[tabled(rename = "CO2_per_kWh")]
    pub co2_efficiency: String,
    #[serde(rename = "Risk_Index")]
    #[tabled(rename = "Risk_Index")]
    pub risk_index: String,
    #[serde(rename = "Impact_Rating")]
    #[tabled(rename = "Impact_Rating")]
    pub impact_rating: String,
    #[serde(rename = "Impact_Category")]
    #[tabled(rename = "Impact_Category")]
    pub impact_category: String,
}

/// A map marker: resolved coordinates plus the popup fields.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapMarker {
    pub project_id: String,
    pub province: String,
    pub impact_rating: String,
    pub risk_index: f64,
    pub energy_output: f64,
    pub co2_reduction: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MarkerRow {
    #[tabled(rename = "Project")]
    pub project_id: String,
    #[tabled(rename = "Province")]
    pub province: String,
    #[tabled(rename = "Lat")]
    pub latitude: String,
    #[tabled(rename = "Lon")]
    pub longitude: String,
    #[tabled(rename = "Impact")]
    pub impact_rating: String,
    #[tabled(rename = "Risk")]
    pub risk_index: String,
    #[tabled(rename = "Energy (kWh)")]
    pub energy_output: String,
    #[tabled(rename = "CO2 (kg)")]
    pub co2_reduction: String,
}

/// One bar of a rendered chart.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChartRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "#")]
    pub rank: usize,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(skip)]
    #[tabled(rename = "")]
    pub bar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceAggregate {
    pub province: String,
    pub project_count: usize,
    pub total_co2_reduction: f64,
    pub mean_efficiency: f64,
    pub mean_risk: f64,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_projects: usize,
    pub total_provinces: usize,
    pub mapped_projects: usize,
    pub total_co2_reduction: f64,
    pub total_energy_output: f64,
    pub mean_risk_index: f64,
}
