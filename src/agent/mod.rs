//! Chatbot service - ties loading, the active session and query routing together
//!
//! LOAD → COMPUTE METRICS → INSTALL SESSION, then QUERY → CLASSIFY → RENDER

use crate::classifier::{QueryClassifier, ReportKind};
use crate::error::{ChatbotError, LoadError};
use crate::loader;
use crate::metrics::MetricsSnapshot;
use crate::models::DataFormat;
use crate::reports;
use crate::session::{Session, SessionStore, SessionSummary};
use crate::Result;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Parse raw input and compute its metrics without touching any session
pub fn load(raw: &[u8], format_tag: &str) -> Result<MetricsSnapshot> {
    let format: DataFormat = format_tag.parse()?;
    let records = loader::load_bytes(raw, format)?;
    Ok(MetricsSnapshot::from_records(&records))
}

/// Answer a query against a snapshot using the default rule set
pub fn answer(query: &str, snapshot: &MetricsSnapshot) -> Result<String> {
    let kind = QueryClassifier::new().classify(query, snapshot);
    reports::render(&kind, snapshot)
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub session_id: Uuid,
    pub report: String,
    pub response: String,
}

fn report_name(kind: &ReportKind) -> &'static str {
    match kind {
        ReportKind::Help => "help",
        ReportKind::Comparison => "comparison",
        ReportKind::Growth(_) => "growth",
        ReportKind::Profitability(_) => "profitability",
        ReportKind::Risk(_) => "risk",
        ReportKind::FinancialHealth(_) => "financial_health",
        ReportKind::IndustryTrends => "industry_trends",
    }
}

/// Main chatbot service
pub struct FinancialChatbot {
    store: Box<dyn SessionStore>,
    classifier: QueryClassifier,
}

impl FinancialChatbot {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            classifier: QueryClassifier::new(),
        }
    }

    /// Parse, compute and install. A failed load leaves the previous session in place.
    pub async fn load_bytes(
        &self,
        source: &str,
        raw: &[u8],
        format: DataFormat,
    ) -> Result<SessionSummary> {
        let start = Instant::now();

        // Parsing and metrics are CPU-bound; keep them off the async workers
        let owned_source = source.to_string();
        let owned_raw = raw.to_vec();
        let built = tokio::task::spawn_blocking(move || {
            loader::load_bytes(&owned_raw, format)
                .map(|records| Session::build(owned_source, &owned_raw, records))
        })
        .await?;

        let session = match built {
            Ok(session) => session,
            Err(e) => {
                warn!(source, ?format, error = %e, "Rejected dataset");
                return Err(e.into());
            }
        };

        let session = self.store.install(session).await?;
        let summary = session.summary();

        info!(
            session_id = %summary.session_id,
            source,
            records = summary.record_count,
            companies = summary.companies.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Installed dataset"
        );

        Ok(summary)
    }

    /// Load with a textual format tag ("csv", "json" or "structured")
    pub async fn load_tagged(&self, source: &str, raw: &[u8], format_tag: &str) -> Result<SessionSummary> {
        let format: DataFormat = match format_tag.parse() {
            Ok(format) => format,
            Err(e) => {
                warn!(source, format_tag, "Rejected dataset with unsupported format");
                return Err(ChatbotError::Load(e));
            }
        };
        self.load_bytes(source, raw, format).await
    }

    /// Load a file, inferring the format from its extension
    pub async fn load_path(&self, path: &Path) -> Result<SessionSummary> {
        let source = path.display().to_string();
        let format = DataFormat::from_filename(&source)?;
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| LoadError::Unreadable(format!("{}: {}", source, e)))?;
        self.load_bytes(&source, &raw, format).await
    }

    pub async fn load_sample(&self) -> Result<SessionSummary> {
        let records = loader::sample_dataset();
        let raw = loader::records_to_csv(&records)?;
        self.load_bytes("sample", &raw, DataFormat::Csv).await
    }

    pub async fn session(&self) -> Result<SessionSummary> {
        self.store
            .current()
            .await?
            .map(|s| s.summary())
            .ok_or(ChatbotError::NoActiveSession)
    }

    pub async fn query(&self, text: &str) -> Result<QueryResponse> {
        let session = self.store.current().await?.ok_or(ChatbotError::NoActiveSession)?;

        let kind = self.classifier.classify(text, &session.metrics);
        debug!(session_id = %session.session_id, query = text, ?kind, "Classified query");

        let response = reports::render(&kind, &session.metrics).map_err(|e| {
            error!(session_id = %session.session_id, error = %e, "Report rendering failed");
            e
        })?;

        Ok(QueryResponse {
            session_id: session.session_id,
            report: report_name(&kind).to_string(),
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sample_dataset;
    use crate::session::InMemorySessionStore;

    fn chatbot() -> FinancialChatbot {
        FinancialChatbot::new(Box::new(InMemorySessionStore::new()))
    }

    #[tokio::test]
    async fn test_query_without_session() {
        let bot = chatbot();
        let err = bot.query("help").await.unwrap_err();
        assert!(matches!(err, ChatbotError::NoActiveSession));
        assert!(matches!(bot.session().await.unwrap_err(), ChatbotError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_sample_queries() {
        let bot = chatbot();
        let summary = bot.load_sample().await.unwrap();
        assert_eq!(summary.source, "sample");
        assert_eq!(summary.companies, vec!["Apple", "Microsoft", "Tesla"]);

        let growth = bot.query("Apple growth").await.unwrap();
        assert_eq!(growth.report, "growth");
        assert_eq!(growth.session_id, summary.session_id);
        assert!(growth.response.contains("Moderate growth"));

        let help = bot.query("help").await.unwrap();
        let unknown = bot.query("xyzzy").await.unwrap();
        assert_eq!(help.response, unknown.response);
        assert_eq!(unknown.report, "help");

        let trends = bot.query("show industry trends").await.unwrap();
        assert!(trends.response.contains("(2023)"));
    }

    #[tokio::test]
    async fn test_failed_load_retains_previous_session() {
        let bot = chatbot();
        let installed = bot.load_sample().await.unwrap();

        let err = bot.load_tagged("bad.xlsx", b"whatever", "xlsx").await.unwrap_err();
        assert!(matches!(err, ChatbotError::Load(LoadError::UnsupportedFormat(_))));

        let err = bot
            .load_bytes("broken.csv", b"Company,Year\nAcme,2020\n", DataFormat::Csv)
            .await
            .unwrap_err();
        assert!(err.is_user_error());

        assert_eq!(bot.session().await.unwrap().session_id, installed.session_id);
    }

    #[tokio::test]
    async fn test_new_load_replaces_session() {
        let bot = chatbot();
        bot.load_sample().await.unwrap();

        let csv = "Company,Year,Total Revenue,Net Income,Total Assets,Total Liabilities,Cash Flow from Operating Activities\n\
                   Acme,2020,100,10,200,50,20\n";
        let summary = bot.load_tagged("acme.csv", csv.as_bytes(), "csv").await.unwrap();
        assert_eq!(summary.companies, vec!["Acme"]);

        // Old companies are gone, so this no longer routes to a growth report
        let reply = bot.query("apple growth").await.unwrap();
        assert_eq!(reply.report, "help");
    }

    #[tokio::test]
    async fn test_load_many_companies_within_budget() {
        const COMPANIES: usize = 50_000;
        let mut csv = String::from(
            "Company,Year,Total Revenue,Net Income,Total Assets,Total Liabilities,Cash Flow from Operating Activities\n",
        );
        for i in 0..COMPANIES {
            csv.push_str(&format!("Firm{},2021,100,10,200,50,20\n", i));
            csv.push_str(&format!("Firm{},2022,125,15,220,60,25\n", i));
        }

        let bot = chatbot();
        let start = Instant::now();
        let summary = bot.load_tagged("large.csv", csv.as_bytes(), "csv").await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(summary.record_count, 2 * COMPANIES);
        assert_eq!(summary.companies.len(), COMPANIES);
        assert_eq!(summary.companies[0], "Firm0");
        assert!(elapsed.as_secs() < 10, "took {:?}", elapsed);

        let reply = bot.query("Firm0 growth").await.unwrap();
        assert_eq!(reply.report, "growth");
        assert!(reply.response.contains("25.00%"));
    }

    #[tokio::test]
    async fn test_load_path_rejects_unknown_extension() {
        let bot = chatbot();
        let err = bot.load_path(Path::new("data.txt")).await.unwrap_err();
        assert!(matches!(err, ChatbotError::Load(LoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_pure_load_and_answer() {
        let raw = loader::records_to_csv(&sample_dataset()).unwrap();
        let snapshot = load(&raw, "CSV").unwrap();
        let text = answer("compare companies", &snapshot).unwrap();
        let microsoft = text.find("- Microsoft").unwrap();
        let apple = text.find("- Apple").unwrap();
        assert!(microsoft < apple);

        assert!(load(&raw, "parquet").is_err());
    }
}
