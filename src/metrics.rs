//! Metrics engine
//!
//! Turns a raw record set into per-company ratio summaries and per-year
//! industry totals. Everything here is a pure function of its input.

use crate::models::{ratio, CompanyMetrics, FinancialRecord, IndustryYear, MetricSummary};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Immutable derived view of one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// In order of each company's first appearance in the input
    pub companies: Vec<CompanyMetrics>,
    pub industry: BTreeMap<i32, IndustryYear>,
}

impl MetricsSnapshot {
    pub fn from_records(records: &[FinancialRecord]) -> Self {
        Self {
            companies: compute_company_metrics(records),
            industry: compute_industry_trends(records),
        }
    }

    pub fn company(&self, name: &str) -> Option<&CompanyMetrics> {
        self.companies.iter().find(|c| c.company == name)
    }

    pub fn company_names(&self) -> impl Iterator<Item = &str> {
        self.companies.iter().map(|c| c.company.as_str())
    }

    pub fn years(&self) -> Vec<i32> {
        self.industry.keys().copied().collect()
    }
}

/// Group records by company, keeping first-appearance order, each group
/// sorted by ascending year. The sort is stable, so duplicate years keep
/// their input order.
pub fn group_by_company(records: &[FinancialRecord]) -> Vec<(&str, Vec<&FinancialRecord>)> {
    let mut groups: Vec<(&str, Vec<&FinancialRecord>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.company.as_str()) {
            Some(&slot) => groups[slot].1.push(record),
            None => {
                index.insert(record.company.as_str(), groups.len());
                groups.push((record.company.as_str(), vec![record]));
            }
        }
    }

    for (_, rows) in groups.iter_mut() {
        rows.sort_by_key(|r| r.year);
    }

    groups
}

/// Period-over-period revenue change in percent. One value per record after the first.
pub fn revenue_growth_series(rows: &[&FinancialRecord]) -> Vec<f64> {
    rows.windows(2)
        .map(|pair| ratio(pair[1].total_revenue - pair[0].total_revenue, pair[0].total_revenue) * 100.0)
        .collect()
}

fn summarize<F>(rows: &[&FinancialRecord], f: F) -> MetricSummary
where
    F: Fn(&FinancialRecord) -> f64,
{
    let values: Vec<f64> = rows.iter().map(|&r| f(r)).collect();
    MetricSummary::from_values(&values)
}

pub fn compute_company_metrics(records: &[FinancialRecord]) -> Vec<CompanyMetrics> {
    group_by_company(records)
        .into_iter()
        .map(|(company, rows)| CompanyMetrics {
            company: company.to_string(),
            revenue_growth: MetricSummary::from_values(&revenue_growth_series(&rows)),
            profit_margin: summarize(&rows, FinancialRecord::profit_margin),
            asset_turnover: summarize(&rows, FinancialRecord::asset_turnover),
            debt_ratio: summarize(&rows, FinancialRecord::debt_ratio),
            operating_cash_flow_ratio: summarize(&rows, FinancialRecord::operating_cash_flow_ratio),
        })
        .collect()
}

/// Sum revenue, net income and operating cash flow per year.
/// Years without records are absent.
pub fn compute_industry_trends(records: &[FinancialRecord]) -> BTreeMap<i32, IndustryYear> {
    let mut trends: BTreeMap<i32, IndustryYear> = BTreeMap::new();

    for record in records {
        let entry = trends.entry(record.year).or_insert(IndustryYear {
            year: record.year,
            total_revenue: 0.0,
            total_net_income: 0.0,
            total_operating_cash_flow: 0.0,
        });
        entry.total_revenue += record.total_revenue;
        entry.total_net_income += record.net_income;
        entry.total_operating_cash_flow += record.operating_cash_flow;
    }

    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sample_dataset;

    fn record(company: &str, year: i32, revenue: f64, income: f64) -> FinancialRecord {
        FinancialRecord {
            company: company.to_string(),
            year,
            total_revenue: revenue,
            net_income: income,
            total_assets: 100.0,
            total_liabilities: 40.0,
            operating_cash_flow: 10.0,
        }
    }

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_growth_has_one_value_per_transition() {
        let records = sample_dataset();
        for (_, rows) in group_by_company(&records) {
            assert_eq!(revenue_growth_series(&rows).len(), rows.len() - 1);
        }
    }

    #[test]
    fn test_groups_are_sorted_chronologically() {
        let records = vec![
            record("A", 2023, 300.0, 1.0),
            record("B", 2021, 10.0, 1.0),
            record("A", 2021, 100.0, 1.0),
            record("A", 2022, 200.0, 1.0),
        ];
        let groups = group_by_company(&records);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[1].0, "B");
        let years: Vec<i32> = groups[0].1.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2021, 2022, 2023]);

        // 100 -> 200 -> 300: +100%, +50%
        let metrics = compute_company_metrics(&records);
        assert!(approx(metrics[0].revenue_growth.mean, 75.0, 1e-9));
        assert!(approx(metrics[0].revenue_growth.min, 50.0, 1e-9));
        assert!(approx(metrics[0].revenue_growth.max, 100.0, 1e-9));
    }

    #[test]
    fn test_profit_margin_matches_raw_fields() {
        let records = sample_dataset();
        for r in &records {
            assert_eq!(r.profit_margin(), r.net_income / r.total_revenue * 100.0);
        }

        let single = vec![record("Solo", 2020, 200.0, 50.0)];
        let metrics = compute_company_metrics(&single);
        assert_eq!(metrics[0].profit_margin.mean, 25.0);
        assert_eq!(metrics[0].profit_margin.min, 25.0);
        assert_eq!(metrics[0].profit_margin.max, 25.0);
    }

    #[test]
    fn test_single_record_company_has_undefined_growth() {
        let metrics = compute_company_metrics(&[record("Solo", 2020, 200.0, 50.0)]);
        assert!(!metrics[0].revenue_growth.is_defined());
        assert!(metrics[0].profit_margin.is_defined());
    }

    #[test]
    fn test_zero_revenue_propagates_as_undefined() {
        let records = vec![record("Z", 2020, 0.0, 5.0)];
        let metrics = compute_company_metrics(&records);
        assert!(metrics[0].profit_margin.mean.is_nan());
        assert!(metrics[0].operating_cash_flow_ratio.mean.is_nan());
        assert!(metrics[0].debt_ratio.is_defined());
    }

    #[test]
    fn test_sample_apple_growth() {
        let snapshot = MetricsSnapshot::from_records(&sample_dataset());
        let apple = snapshot.company("Apple").unwrap();
        let expected =
            ((394328.0 / 365817.0 - 1.0) + (383285.0 / 394328.0 - 1.0)) / 2.0 * 100.0;
        assert!(approx(apple.revenue_growth.mean, expected, 1e-9));
        assert!(approx(apple.revenue_growth.mean, 2.5, 0.1));
    }

    #[test]
    fn test_sample_company_order_follows_input() {
        let snapshot = MetricsSnapshot::from_records(&sample_dataset());
        let names: Vec<&str> = snapshot.company_names().collect();
        assert_eq!(names, vec!["Apple", "Microsoft", "Tesla"]);
    }

    #[test]
    fn test_many_distinct_companies_stay_linear() {
        const COMPANIES: usize = 50_000;
        let records: Vec<FinancialRecord> = (0..COMPANIES)
            .flat_map(|i| {
                let name = format!("Company {}", i);
                [record(&name, 2021, 100.0, 10.0), record(&name, 2022, 110.0, 12.0)]
            })
            .collect();

        let start = std::time::Instant::now();
        let snapshot = MetricsSnapshot::from_records(&records);
        let elapsed = start.elapsed();

        assert_eq!(snapshot.companies.len(), COMPANIES);
        assert_eq!(snapshot.companies[0].company, "Company 0");
        assert_eq!(snapshot.companies[COMPANIES - 1].company, format!("Company {}", COMPANIES - 1));
        assert!(approx(snapshot.companies[7].revenue_growth.mean, 10.0, 1e-9));
        assert!(elapsed.as_secs() < 10, "took {:?}", elapsed);
    }

    #[test]
    fn test_industry_trends_sum_by_year() {
        let trends = compute_industry_trends(&sample_dataset());
        assert_eq!(trends.keys().copied().collect::<Vec<_>>(), vec![2021, 2022, 2023]);

        let y2023 = trends[&2023];
        assert_eq!(y2023.total_revenue, 383285.0 + 211915.0 + 96773.0);
        assert_eq!(y2023.total_net_income, 96995.0 + 67718.0 + 14837.0);
        assert_eq!(y2023.total_operating_cash_flow, 110543.0 + 81869.0 + 13285.0);
    }

    #[test]
    fn test_industry_trends_skip_missing_years() {
        let records = vec![record("A", 2019, 1.0, 1.0), record("B", 2022, 2.0, 1.0)];
        let trends = compute_industry_trends(&records);
        assert_eq!(trends.len(), 2);
        assert!(!trends.contains_key(&2020));
    }
}
