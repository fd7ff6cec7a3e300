//! In-process query log and summary statistics.
//!
//! Every successful query appends one [`QueryLogEntry`]. The log is held in
//! memory for the lifetime of the process and is never trimmed, so a
//! long-running session grows without bound.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{source_labels, Confidence, Document};

/// One answered question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryLogEntry {
    pub timestamp: DateTime<Local>,
    pub question: String,
    pub answer: String,
    pub confidence: Confidence,
    /// `source` of each retrieved document in rank order, `"unknown"` when missing.
    pub sources: Vec<String>,
    /// Wall-clock seconds.
    pub response_time: f64,
}

/// Aggregate over the whole log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryStats {
    pub total_queries: usize,
    /// Share of queries labelled [`Confidence::High`], in `[0, 1]`.
    pub high_confidence_rate: f64,
    /// Mean response time in seconds.
    pub average_response_time: f64,
}

#[derive(Debug, Default)]
pub struct QueryMonitor {
    entries: Vec<QueryLogEntry>,
}

impl QueryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_query(
        &mut self,
        question: &str,
        answer: &str,
        confidence: Confidence,
        sources: &[Document],
        response_time: f64,
    ) {
        self.entries.push(QueryLogEntry {
            timestamp: Local::now(),
            question: question.to_string(),
            answer: answer.to_string(),
            confidence,
            sources: source_labels(sources),
            response_time,
        });
    }

    pub fn entries(&self) -> &[QueryLogEntry] {
        &self.entries
    }

    pub fn get_stats(&self) -> QueryStats {
        if self.entries.is_empty() {
            return QueryStats {
                total_queries: 0,
                high_confidence_rate: 0.0,
                average_response_time: 0.0,
            };
        }

        let total = self.entries.len();
        let high = self
            .entries
            .iter()
            .filter(|e| e.confidence == Confidence::High)
            .count();
        let time: f64 = self.entries.iter().map(|e| e.response_time).sum();

        QueryStats {
            total_queries: total,
            high_confidence_rate: high as f64 / total as f64,
            average_response_time: time / total as f64,
        }
    }

    /// Statistics block printed by the interactive `stats` command.
    pub fn render_stats(&self) -> String {
        let stats = self.get_stats();
        let rule = "=".repeat(50);
        format!(
            "{rule}\nStatistics:\n  Total queries: {}\n  High confidence: {:.2}%\n  Average response time: {:.2}s\n{rule}",
            stats.total_queries,
            stats.high_confidence_rate * 100.0,
            stats.average_response_time
        )
    }
}
