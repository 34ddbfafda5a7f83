use crate::types::{
    ImpactCategory, MapMarker, ProjectRecord, ProvinceAggregate, SummaryStats, UNCLASSIFIED,
};
use crate::util::{average, cmp_desc_nan_last};
use std::collections::{HashMap, HashSet};

/// Per-province metric a ranking can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvinceMetric {
    TotalCo2,
    MeanEfficiency,
    MeanRisk,
}

impl ProvinceMetric {
    pub fn value(self, agg: &ProvinceAggregate) -> f64 {
        match self {
            ProvinceMetric::TotalCo2 => agg.total_co2_reduction,
            ProvinceMetric::MeanEfficiency => agg.mean_efficiency,
            ProvinceMetric::MeanRisk => agg.mean_risk,
        }
    }
}

// Earliest record holding the largest non-NaN key.
fn max_by_first<'a, F>(data: &'a [ProjectRecord], key: F) -> Option<&'a ProjectRecord>
where
    F: Fn(&ProjectRecord) -> f64,
{
    let mut best: Option<(&ProjectRecord, f64)> = None;
    for r in data {
        let v = key(r);
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((r, v)),
        }
    }
    best.map(|(r, _)| r)
}

pub fn top_efficiency(data: &[ProjectRecord]) -> Option<&ProjectRecord> {
    max_by_first(data, |r| r.co2_efficiency)
}

pub fn top_risk(data: &[ProjectRecord]) -> Option<&ProjectRecord> {
    max_by_first(data, |r| r.environmental_risk_index)
}

/// Records sorted by efficiency, highest first, undefined ratios last.
pub fn rank_by_efficiency(data: &[ProjectRecord]) -> Vec<&ProjectRecord> {
    let mut v: Vec<&ProjectRecord> = data.iter().collect();
    v.sort_by(|a, b| cmp_desc_nan_last(a.co2_efficiency, b.co2_efficiency));
    v
}

pub fn rank_by_risk(data: &[ProjectRecord]) -> Vec<&ProjectRecord> {
    let mut v: Vec<&ProjectRecord> = data.iter().collect();
    v.sort_by(|a, b| {
        cmp_desc_nan_last(a.environmental_risk_index, b.environmental_risk_index)
    });
    v
}

/// Record count per impact category. Records without a category are counted
/// under `Unclassified`, so the counts always add up to `data.len()`.
pub fn category_distribution(data: &[ProjectRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<Option<ImpactCategory>, usize> = HashMap::new();
    for r in data {
        *counts.entry(r.impact_category).or_default() += 1;
    }
    let mut rows: Vec<(Option<ImpactCategory>, usize)> = counts.into_iter().collect();
    // `None` orders before `Some` for Option, so rank it explicitly last.
    rows.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.0.is_none().cmp(&b.0.is_none()))
            .then_with(|| a.0.cmp(&b.0))
    });
    rows.into_iter()
        .map(|(cat, n)| {
            let label = cat.map(ImpactCategory::label).unwrap_or(UNCLASSIFIED);
            (label.to_string(), n)
        })
        .collect()
}

/// Per-province totals and means, in order of first appearance. Records
/// without a province code are left out.
pub fn province_aggregates(data: &[ProjectRecord]) -> Vec<ProvinceAggregate> {
    #[derive(Default)]
    struct Acc {
        co2: Vec<f64>,
        efficiency: Vec<f64>,
        risk: Vec<f64>,
    }
    let mut order: Vec<String> = Vec::new();
    let mut map: HashMap<String, Acc> = HashMap::new();
    for r in data {
        let Some(code) = r.province_code.as_ref() else {
            continue;
        };
        let e = map.entry(code.clone()).or_insert_with(|| {
            order.push(code.clone());
            Acc::default()
        });
        e.co2.push(r.co2_reduction);
        e.efficiency.push(r.co2_efficiency);
        e.risk.push(r.environmental_risk_index);
    }
    order
        .into_iter()
        .filter_map(|province| {
            let acc = map.remove(&province)?;
            Some(ProvinceAggregate {
                project_count: acc.co2.len(),
                total_co2_reduction: acc.co2.iter().filter(|v| !v.is_nan()).sum(),
                mean_efficiency: average(&acc.efficiency),
                mean_risk: average(&acc.risk),
                province,
            })
        })
        .collect()
}

/// Provinces sorted by one metric, highest first. Stable, `NaN` last.
pub fn sort_provinces(
    aggregates: &[ProvinceAggregate],
    by: ProvinceMetric,
) -> Vec<ProvinceAggregate> {
    let mut v = aggregates.to_vec();
    v.sort_by(|a, b| cmp_desc_nan_last(by.value(a), by.value(b)));
    v
}

/// Records with resolved coordinates, as map markers.
pub fn map_markers(data: &[ProjectRecord]) -> Vec<MapMarker> {
    data.iter()
        .filter_map(|r| {
            let (latitude, longitude) = r.coordinates()?;
            Some(MapMarker {
                project_id: r.project_id.clone(),
                province: r.province_label().to_string(),
                impact_rating: r.impact_rating.clone(),
                risk_index: r.environmental_risk_index,
                energy_output: r.energy_output,
                co2_reduction: r.co2_reduction,
                latitude,
                longitude,
            })
        })
        .collect()
}

pub fn summary_stats(data: &[ProjectRecord]) -> SummaryStats {
    let provinces: HashSet<&str> = data
        .iter()
        .filter_map(|r| r.province_code.as_deref())
        .collect();
    let finite_sum = |f: fn(&ProjectRecord) -> f64| -> f64 {
        data.iter().map(f).filter(|v| !v.is_nan()).sum()
    };
    SummaryStats {
        total_projects: data.len(),
        total_provinces: provinces.len(),
        mapped_projects: data.iter().filter(|r| r.coordinates().is_some()).count(),
        total_co2_reduction: finite_sum(|r| r.co2_reduction),
        total_energy_output: finite_sum(|r| r.energy_output),
        mean_risk_index: average(
            &data
                .iter()
                .map(|r| r.environmental_risk_index)
                .collect::<Vec<_>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, co2: f64, energy: f64, risk: f64, rating: &str) -> ProjectRecord {
        ProjectRecord::derive(id, co2, energy, risk, rating)
    }

    fn sample() -> Vec<ProjectRecord> {
        vec![
            rec("PLTS-NTT-001", 1200.0, 400.0, 62.0, "High"),
            rec("PLTM-NTT-002", 600.0, 300.0, 40.0, "Low"),
            rec("PLTS-JATIM-003", 900.0, 300.0, 55.0, "Medium"),
            rec("PLTS-BALI-004", 100.0, 0.0, 30.0, "Low impact"),
            rec("HYDRO-005", 250.0, 100.0, 70.0, "unknown"),
        ]
    }

    #[test]
    fn top_efficiency_prefers_first_of_ties() {
        let data = sample();
        // NTT-001 and JATIM-003 both reach 3.0.
        assert_eq!(top_efficiency(&data).unwrap().project_id, "PLTS-NTT-001");
    }

    #[test]
    fn top_efficiency_ignores_undefined_ratios() {
        let data = vec![
            rec("PLTS-NTT-001", 5.0, 0.0, 1.0, "Low"),
            rec("PLTS-NTT-002", 1.0, 2.0, 1.0, "Low"),
        ];
        assert_eq!(top_efficiency(&data).unwrap().project_id, "PLTS-NTT-002");
        assert!(top_efficiency(&data[..1]).is_none());
        assert!(top_efficiency(&[]).is_none());
    }

    #[test]
    fn top_risk_prefers_first_of_ties() {
        let mut data = sample();
        data.push(rec("PLTS-SULS-006", 1.0, 1.0, 70.0, "Low"));
        assert_eq!(top_risk(&data).unwrap().project_id, "HYDRO-005");
    }

    #[test]
    fn rankings_are_descending_with_nan_last() {
        let data = sample();
        let ids: Vec<&str> = rank_by_efficiency(&data)
            .iter()
            .map(|r| r.project_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "PLTS-NTT-001",
                "PLTS-JATIM-003",
                "HYDRO-005",
                "PLTM-NTT-002",
                "PLTS-BALI-004"
            ]
        );
        let risk: Vec<f64> = rank_by_risk(&data)
            .iter()
            .map(|r| r.environmental_risk_index)
            .collect();
        assert_eq!(risk, vec![70.0, 62.0, 55.0, 40.0, 30.0]);
    }

    #[test]
    fn category_counts_cover_every_record() {
        let data = sample();
        let dist = category_distribution(&data);
        let total: usize = dist.iter().map(|(_, n)| n).sum();
        assert_eq!(total, data.len());
        assert_eq!(
            dist,
            vec![
                ("Low".to_string(), 2),
                ("High".to_string(), 1),
                ("Medium".to_string(), 1),
                ("Unclassified".to_string(), 1),
            ]
        );
    }

    #[test]
    fn province_aggregates_match_raw_records() {
        let data = sample();
        let aggs = province_aggregates(&data);
        let names: Vec<&str> = aggs.iter().map(|a| a.province.as_str()).collect();
        assert_eq!(names, vec!["NTT", "JATIM", "BALI"]);

        for agg in &aggs {
            let members: Vec<&ProjectRecord> = data
                .iter()
                .filter(|r| r.province_code.as_deref() == Some(agg.province.as_str()))
                .collect();
            let co2: f64 = members.iter().map(|r| r.co2_reduction).sum();
            let risk: f64 = members.iter().map(|r| r.environmental_risk_index).sum::<f64>()
                / members.len() as f64;
            assert_eq!(agg.project_count, members.len());
            assert_eq!(agg.total_co2_reduction, co2);
            assert!((agg.mean_risk - risk).abs() < 1e-9);
        }

        let ntt = &aggs[0];
        assert!((ntt.mean_efficiency - 2.5).abs() < 1e-9);
        // BALI's only record has an undefined ratio.
        assert!(aggs[2].mean_efficiency.is_nan());
    }

    #[test]
    fn provinces_sort_by_each_metric() {
        let aggs = province_aggregates(&sample());
        let by = |m| {
            sort_provinces(&aggs, m)
                .into_iter()
                .map(|a| a.province)
                .collect::<Vec<_>>()
        };
        assert_eq!(by(ProvinceMetric::TotalCo2), vec!["NTT", "JATIM", "BALI"]);
        assert_eq!(by(ProvinceMetric::MeanEfficiency), vec!["JATIM", "NTT", "BALI"]);
        assert_eq!(by(ProvinceMetric::MeanRisk), vec!["JATIM", "NTT", "BALI"]);
    }

    #[test]
    fn markers_skip_unresolved_provinces() {
        let markers = map_markers(&sample());
        let ids: Vec<&str> = markers.iter().map(|m| m.project_id.as_str()).collect();
        assert_eq!(ids, vec!["PLTS-NTT-001", "PLTM-NTT-002", "PLTS-JATIM-003"]);
        assert_eq!(markers[2].latitude, -7.536);
        assert_eq!(markers[2].province, "JATIM");
    }

    #[test]
    fn summary_totals() {
        let s = summary_stats(&sample());
        assert_eq!(s.total_projects, 5);
        assert_eq!(s.total_provinces, 3);
        assert_eq!(s.mapped_projects, 3);
        assert_eq!(s.total_co2_reduction, 3050.0);
        assert_eq!(s.total_energy_output, 1100.0);
        assert!((s.mean_risk_index - 51.4).abs() < 1e-9);
    }
}
