//! Report generators
//!
//! Pure functions of a metrics snapshot. Undefined values render as "N/A"
//! instead of failing the report.

use crate::classifier::ReportKind;
use crate::error::ChatbotError;
use crate::metrics::MetricsSnapshot;
use crate::models::{CompanyMetrics, IndustryYear, MetricFamily};
use crate::Result;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const HELP_TEXT: &str = "I can help you with:\n\
1. Company comparisons (e.g., 'Compare companies')\n\
2. Growth analysis (e.g., 'What is Apple's growth?')\n\
3. Profitability analysis (e.g., 'Show Microsoft's profit margins')\n\
4. Risk assessment (e.g., 'What is Tesla's risk profile?')\n\
5. Industry trends (e.g., 'Show industry trends')\n\
6. Financial health (e.g., 'How is Apple's financial health?')";

const UNDEFINED: &str = "N/A";
const INSUFFICIENT: &str = "Insufficient data";

/// Families listed by the comparison report
pub const COMPARISON_FAMILIES: [MetricFamily; 3] = [
    MetricFamily::ProfitMargin,
    MetricFamily::AssetTurnover,
    MetricFamily::OperatingCashFlowRatio,
];

/// Render the report for a classified query
pub fn render(kind: &ReportKind, snapshot: &MetricsSnapshot) -> Result<String> {
    let company = |name: &str| {
        snapshot.company(name).ok_or_else(|| {
            ChatbotError::InternalConsistency(format!(
                "classified company '{}' missing from metrics",
                name
            ))
        })
    };

    let report = match kind {
        ReportKind::Help => HELP_TEXT.to_string(),
        ReportKind::Comparison => comparison_report(snapshot),
        ReportKind::Growth(name) => growth_report(company(name)?),
        ReportKind::Profitability(name) => profitability_report(company(name)?),
        ReportKind::Risk(name) => risk_report(company(name)?),
        ReportKind::FinancialHealth(name) => financial_health_report(company(name)?),
        ReportKind::IndustryTrends => industry_trends_report(&snapshot.industry),
    };

    Ok(report)
}

// =============================
// Formatting
// =============================

fn fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        UNDEFINED.to_string()
    } else {
        format!("{:.*}", decimals, value)
    }
}

fn percent(value: f64) -> String {
    percent_with(value, 2)
}

fn percent_with(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        UNDEFINED.to_string()
    } else {
        format!("{:.*}%", decimals, value)
    }
}

/// Dollar amount with thousands separators; cents only when fractional
pub fn money(value: f64) -> String {
    if !value.is_finite() {
        return UNDEFINED.to_string();
    }

    let raw = if value.fract() == 0.0 {
        format!("{:.0}", value.abs())
    } else {
        format!("{:.2}", value.abs())
    };
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}${}.{}", sign, grouped, f),
        None => format!("{}${}", sign, grouped),
    }
}

/// Descending with undefined values last
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

// =============================
// Assessments
// =============================

pub fn assess_growth(mean: f64) -> &'static str {
    if mean.is_nan() {
        INSUFFICIENT
    } else if mean > 5.0 {
        "Strong growth trajectory"
    } else if mean > 0.0 {
        "Moderate growth"
    } else {
        "Challenging growth environment"
    }
}

pub fn assess_profitability(margin: f64) -> &'static str {
    if margin.is_nan() {
        INSUFFICIENT
    } else if margin > 30.0 {
        "Excellent profitability"
    } else if margin > 20.0 {
        "Strong profitability"
    } else if margin > 10.0 {
        "Moderate profitability"
    } else {
        "Below average profitability"
    }
}

pub fn assess_leverage(debt_ratio: f64) -> &'static str {
    if debt_ratio.is_nan() {
        INSUFFICIENT
    } else if debt_ratio > 60.0 {
        "High leverage risk"
    } else if debt_ratio > 40.0 {
        "Moderate leverage risk"
    } else {
        "Low leverage risk"
    }
}

/// One point each for margin > 20%, turnover > 0.8x and cash flow ratio > 25%
pub fn financial_health_score(metrics: &CompanyMetrics) -> u8 {
    let checks = [
        metrics.profit_margin.mean > 20.0,
        metrics.asset_turnover.mean > 0.8,
        metrics.operating_cash_flow_ratio.mean > 25.0,
    ];
    checks.iter().filter(|passed| **passed).count() as u8
}

pub fn assess_financial_health(score: u8) -> &'static str {
    match score {
        3 => "Strong financial position",
        2 => "Stable financial position",
        _ => "Mixed financial indicators",
    }
}

// =============================
// Reports
// =============================

pub fn comparison_report(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::from("Company Comparison:\n\n");

    for family in COMPARISON_FAMILIES {
        out.push_str(&format!("\n{}:\n", family));

        let mut ranked: Vec<&CompanyMetrics> = snapshot.companies.iter().collect();
        ranked.sort_by(|a, b| descending(a.family(family).mean, b.family(family).mean));

        for company in ranked {
            out.push_str(&format!(
                "- {}: {}\n",
                company.company,
                percent(company.family(family).mean)
            ));
        }
    }

    out
}

pub fn growth_report(metrics: &CompanyMetrics) -> String {
    let growth = &metrics.revenue_growth;
    format!(
        "{}'s Growth Analysis:\n\
         - Average revenue growth: {}\n\
         - Range: {} to {}\n\
         - Trend assessment: {}",
        metrics.company,
        percent(growth.mean),
        percent(growth.min),
        percent(growth.max),
        assess_growth(growth.mean)
    )
}

pub fn profitability_report(metrics: &CompanyMetrics) -> String {
    let margin = &metrics.profit_margin;
    format!(
        "{}'s Profitability Analysis:\n\
         - Average profit margin: {}\n\
         - Range: {} to {}\n\
         - Performance: {}",
        metrics.company,
        percent(margin.mean),
        percent(margin.min),
        percent(margin.max),
        assess_profitability(margin.mean)
    )
}

pub fn risk_report(metrics: &CompanyMetrics) -> String {
    let debt = &metrics.debt_ratio;
    format!(
        "{}'s Risk Assessment:\n\
         - Average debt ratio: {}\n\
         - Range: {} to {}\n\
         - Leverage assessment: {}",
        metrics.company,
        percent(debt.mean),
        percent(debt.min),
        percent(debt.max),
        assess_leverage(debt.mean)
    )
}

pub fn financial_health_report(metrics: &CompanyMetrics) -> String {
    format!(
        "{}'s Financial Health Overview:\n\
         - Operational Efficiency: {}x\n\
         - Profitability: {}\n\
         - Cash Flow Strength: {}\n\
         - Overall Assessment: {}",
        metrics.company,
        fixed(metrics.asset_turnover.mean, 2),
        percent(metrics.profit_margin.mean),
        percent(metrics.operating_cash_flow_ratio.mean),
        assess_financial_health(financial_health_score(metrics))
    )
}

/// Compares the two most recent years. With a single year the growth line is N/A.
pub fn industry_trends_report(industry: &BTreeMap<i32, IndustryYear>) -> String {
    let mut recent = industry.values().rev();
    let Some(latest) = recent.next() else {
        return "Industry Trends Analysis:\n- No industry data available".to_string();
    };

    let growth = match recent.next() {
        Some(previous) if previous.total_revenue != 0.0 => {
            percent_with((latest.total_revenue / previous.total_revenue - 1.0) * 100.0, 1)
        }
        _ => UNDEFINED.to_string(),
    };

    format!(
        "Industry Trends Analysis:\n\
         - Latest revenue ({}): {}\n\
         - Year-over-year growth: {}\n\
         - Operating cash flow trend: {}",
        latest.year,
        money(latest.total_revenue),
        growth,
        money(latest.total_operating_cash_flow)
    )
}
