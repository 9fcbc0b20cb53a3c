//! Financial Chatbot
//!
//! Answers plain-language questions about company performance from a
//! tabular record set (one row per company and year):
//! - Loads CSV or JSON records
//! - Precomputes per-company ratio summaries and per-year industry totals
//! - Routes each query through ordered keyword rules to a fixed report
//!
//! FLOW:
//! RECORDS → METRICS → SESSION → CLASSIFY → REPORT

pub mod agent;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod reports;
pub mod session;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::{answer, load, FinancialChatbot};
pub use classifier::{QueryClassifier, ReportKind};
pub use metrics::MetricsSnapshot;
