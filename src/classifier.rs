//! Query Classifier
//!
//! Maps free-text input to one report kind. Rules are evaluated in order and
//! the first match wins; an unmatched query falls back to the help text.
//! Matching is case-insensitive substring search on the trimmed query.

use crate::metrics::MetricsSnapshot;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKind {
    Help,
    Comparison,
    Growth(String),
    Profitability(String),
    Risk(String),
    FinancialHealth(String),
    IndustryTrends,
}

type Matcher = fn(&str, &MetricsSnapshot) -> Option<ReportKind>;

/// Sub-intent keywords checked once a company name is found
const GROWTH_KEYWORDS: &[&str] = &["growth"];
const PROFITABILITY_KEYWORDS: &[&str] = &["profit", "margin"];
const RISK_KEYWORDS: &[&str] = &["risk"];
const HEALTH_KEYWORDS: &[&str] = &["financial health", "performance"];

pub struct ClassificationRule {
    pub name: &'static str,
    matcher: Matcher,
}

/// Query classifier
pub struct QueryClassifier {
    rules: Vec<ClassificationRule>,
}

impl QueryClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                ClassificationRule { name: "help", matcher: match_help },
                ClassificationRule { name: "comparison", matcher: match_comparison },
                ClassificationRule { name: "company", matcher: match_company },
                ClassificationRule { name: "industry_trends", matcher: match_industry_trends },
            ],
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Classify a raw query against the known companies
    pub fn classify(&self, query: &str, snapshot: &MetricsSnapshot) -> ReportKind {
        let normalized = normalize(query);

        for rule in &self.rules {
            if let Some(kind) = (rule.matcher)(&normalized, snapshot) {
                debug!(rule = rule.name, ?kind, "Query matched");
                return kind;
            }
        }

        ReportKind::Help
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn match_help(query: &str, _: &MetricsSnapshot) -> Option<ReportKind> {
    (query == "help").then_some(ReportKind::Help)
}

fn match_comparison(query: &str, _: &MetricsSnapshot) -> Option<ReportKind> {
    (query.contains("compare") && query.contains("companies")).then_some(ReportKind::Comparison)
}

/// First company (in snapshot order) that is named and has a sub-intent wins.
/// A named company without a sub-intent does not stop the search.
fn match_company(query: &str, snapshot: &MetricsSnapshot) -> Option<ReportKind> {
    for company in snapshot.company_names() {
        if !query.contains(&company.to_lowercase()) {
            continue;
        }

        if let Some(kind) = company_intent(query, company) {
            return Some(kind);
        }
    }
    None
}

/// Sub-intents in priority order: growth, profitability, risk, health
fn company_intent(query: &str, company: &str) -> Option<ReportKind> {
    let mentions = |keywords: &[&str]| keywords.iter().any(|kw| query.contains(kw));
    let company = company.to_string();

    if mentions(GROWTH_KEYWORDS) {
        Some(ReportKind::Growth(company))
    } else if mentions(PROFITABILITY_KEYWORDS) {
        Some(ReportKind::Profitability(company))
    } else if mentions(RISK_KEYWORDS) {
        Some(ReportKind::Risk(company))
    } else if mentions(HEALTH_KEYWORDS) {
        Some(ReportKind::FinancialHealth(company))
    } else {
        None
    }
}

fn match_industry_trends(query: &str, _: &MetricsSnapshot) -> Option<ReportKind> {
    (query.contains("industry") && query.contains("trend")).then_some(ReportKind::IndustryTrends)
}
