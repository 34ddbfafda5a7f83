// Threshold rules behind the per-project action plan.
use crate::types::ProjectRecord;
use std::fmt;

pub const HIGH_RISK_THRESHOLD: f64 = 60.0;
pub const MODERATE_RISK_THRESHOLD: f64 = 45.0;
pub const EXCELLENT_EFFICIENCY_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    High,
    Moderate,
    Low,
}

impl RiskTier {
    /// Lower bounds are inclusive; `NaN` falls through to `Low`.
    pub fn classify(risk: f64) -> Self {
        if risk >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if risk >= MODERATE_RISK_THRESHOLD {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            RiskTier::High => {
                "High risk: audit + conservation. Run an environmental audit and protect the surrounding area."
            }
            RiskTier::Moderate => {
                "Moderate: periodic monitoring. Schedule regular checks and apply technical mitigation."
            }
            RiskTier::Low => {
                "Low: recommend replication. The project is a good template for other regions."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfficiencyTier {
    Excellent,
    Improvable,
}

impl EfficiencyTier {
    pub fn classify(efficiency: f64) -> Self {
        if efficiency >= EXCELLENT_EFFICIENCY_THRESHOLD {
            EfficiencyTier::Excellent
        } else {
            EfficiencyTier::Improvable
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            EfficiencyTier::Excellent => {
                "Excellent, candidate for pilot replication. The efficiency makes it a model project."
            }
            EfficiencyTier::Improvable => {
                "Improvable, evaluate technology in use to raise CO2 reduction per kWh."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub risk: RiskTier,
    pub efficiency: EfficiencyTier,
}

pub fn recommend(record: &ProjectRecord) -> Recommendation {
    Recommendation {
        risk: RiskTier::classify(record.environmental_risk_index),
        efficiency: EfficiencyTier::classify(record.co2_efficiency),
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- {}", self.risk.advice())?;
        write!(f, "- {}", self.efficiency.advice())
    }
}
