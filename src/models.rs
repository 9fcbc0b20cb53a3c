//! Core data models for the financial chatbot

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ================= Enums =================
//

/// Supported tabular input formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    /// Row- or column-oriented JSON
    Json,
}

impl DataFormat {
    /// Infer the format from a file name's extension
    pub fn from_filename(name: &str) -> Result<Self, LoadError> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Ok(DataFormat::Csv)
        } else if lower.ends_with(".json") {
            Ok(DataFormat::Json)
        } else {
            Err(LoadError::UnsupportedFormat(name.to_string()))
        }
    }
}

impl FromStr for DataFormat {
    type Err = LoadError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" | "structured" => Ok(DataFormat::Json),
            _ => Err(LoadError::UnsupportedFormat(tag.to_string())),
        }
    }
}

/// The five derived ratio families
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    RevenueGrowth,
    ProfitMargin,
    AssetTurnover,
    DebtRatio,
    OperatingCashFlowRatio,
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricFamily::RevenueGrowth => "Revenue Growth",
            MetricFamily::ProfitMargin => "Profit Margin",
            MetricFamily::AssetTurnover => "Asset Turnover",
            MetricFamily::DebtRatio => "Debt Ratio",
            MetricFamily::OperatingCashFlowRatio => "Operating Cash Flow",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Record =================
//

/// One company-year observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialRecord {
    pub company: String,
    pub year: i32,
    pub total_revenue: f64,
    pub net_income: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub operating_cash_flow: f64,
}

/// Division that yields NaN instead of infinity when the denominator is zero
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

impl FinancialRecord {
    pub fn profit_margin(&self) -> f64 {
        ratio(self.net_income, self.total_revenue) * 100.0
    }

    pub fn asset_turnover(&self) -> f64 {
        ratio(self.total_revenue, self.total_assets)
    }

    pub fn debt_ratio(&self) -> f64 {
        ratio(self.total_liabilities, self.total_assets) * 100.0
    }

    pub fn operating_cash_flow_ratio(&self) -> f64 {
        ratio(self.operating_cash_flow, self.total_revenue) * 100.0
    }
}

//
// ================= Derived Metrics =================
//

/// {mean, min, max} over one family's series. NaN when no value was defined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    pub const UNDEFINED: MetricSummary = MetricSummary {
        mean: f64::NAN,
        min: f64::NAN,
        max: f64::NAN,
    };

    /// Reduce a series, skipping undefined entries
    pub fn from_values(values: &[f64]) -> Self {
        let defined: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if defined.is_empty() {
            return Self::UNDEFINED;
        }

        let sum: f64 = defined.iter().sum();
        Self {
            mean: sum / defined.len() as f64,
            min: defined.iter().copied().fold(f64::INFINITY, f64::min),
            max: defined.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    pub fn is_defined(&self) -> bool {
        !self.mean.is_nan()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyMetrics {
    pub company: String,
    pub revenue_growth: MetricSummary,
    pub profit_margin: MetricSummary,
    pub asset_turnover: MetricSummary,
    pub debt_ratio: MetricSummary,
    pub operating_cash_flow_ratio: MetricSummary,
}

impl CompanyMetrics {
    pub fn family(&self, family: MetricFamily) -> &MetricSummary {
        match family {
            MetricFamily::RevenueGrowth => &self.revenue_growth,
            MetricFamily::ProfitMargin => &self.profit_margin,
            MetricFamily::AssetTurnover => &self.asset_turnover,
            MetricFamily::DebtRatio => &self.debt_ratio,
            MetricFamily::OperatingCashFlowRatio => &self.operating_cash_flow_ratio,
        }
    }
}

/// Industry totals for one year
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndustryYear {
    pub year: i32,
    pub total_revenue: f64,
    pub total_net_income: f64,
    pub total_operating_cash_flow: f64,
}
