//! Interactive question loop and answer reports.
//!
//! [`run_repl`] reads one line per question from any [`BufRead`] and
//! writes reports to any [`Write`], so the loop can be driven from a
//! terminal or from scripted input in tests.
//!
//! | Input | Effect |
//! |-------|--------|
//! | `quit` | Leave the loop |
//! | `stats` | Print the monitor's statistics |
//! | empty line | Ignored |
//! | anything else | Answered as a question |
//!
//! Commands are matched case-insensitively after trimming.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::error;

use crate::models::QueryResult;
use crate::monitor::QueryMonitor;
use crate::pipeline::Pipeline;

const PREVIEW_CHARS: usize = 100;

/// What a single input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Stats,
    Skip,
    Question(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Command::Skip
        } else if trimmed.eq_ignore_ascii_case("quit") {
            Command::Quit
        } else if trimmed.eq_ignore_ascii_case("stats") {
            Command::Stats
        } else {
            Command::Question(trimmed.to_string())
        }
    }
}

/// First 100 characters of `content`, with `...` appended when cut.
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

/// Human-readable report for one answered question.
pub fn format_report(question: &str, result: &QueryResult, response_time: f64) -> String {
    let rule = "=".repeat(50);
    let mut out = format!(
        "\n{rule}\nQuestion: {}\n{rule}\nAnswer: {}\n\nConfidence: {}\nResponse time: {:.2}s\n",
        question, result.answer, result.confidence, response_time
    );

    if !result.sources.is_empty() {
        out.push_str("\nSources:\n");
        for (i, (label, doc)) in result
            .source_labels()
            .iter()
            .zip(&result.sources)
            .enumerate()
        {
            out.push_str(&format!("  {}. {}: {}\n", i + 1, label, preview(doc.content())));
        }
    }
    out
}

/// Read questions from `input` until `quit` or end of input.
///
/// Reports go to `out`; a failed query prints `Error: …` to `err` and the
/// loop carries on with the next line.
pub async fn run_repl<R, W, E>(
    pipeline: &Pipeline,
    monitor: &mut QueryMonitor,
    mut input: R,
    out: &mut W,
    err: &mut E,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    loop {
        write!(out, "\nEnter a question ('quit' to exit, 'stats' for statistics): ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Skip => continue,
            Command::Stats => writeln!(out, "\n{}", monitor.render_stats())?,
            Command::Question(question) => {
                match pipeline.query_recorded(&question, monitor).await {
                    Ok(result) => {
                        let elapsed = monitor
                            .entries()
                            .last()
                            .map(|e| e.response_time)
                            .unwrap_or_default();
                        write!(out, "{}", format_report(&question, &result, elapsed))?;
                    }
                    Err(e) => {
                        error!("Query failed: {:#}", e);
                        writeln!(err, "Error: {:#}", e)?;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Document};

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  QUIT \n"), Command::Quit);
        assert_eq!(Command::parse("Stats"), Command::Stats);
        assert_eq!(Command::parse("   \n"), Command::Skip);
        assert_eq!(
            Command::parse(" What is Rust? \n"),
            Command::Question("What is Rust?".to_string())
        );
    }

    #[test]
    fn test_preview_truncates_long_content() {
        let long = "a".repeat(150);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 103);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"b".repeat(100)), "b".repeat(100));
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let text = "я".repeat(101);
        assert_eq!(preview(&text), format!("{}...", "я".repeat(100)));
    }

    #[test]
    fn test_report_lists_sources_in_order() {
        let result = QueryResult {
            answer: "ML is a subset of AI.".to_string(),
            confidence: Confidence::High,
            sources: vec![
                Document::new("Machine learning text", "ml_intro"),
                Document::new("Deep learning text", "deep_learning"),
            ],
        };
        let report = format_report("What is ML?", &result, 1.234);
        assert!(report.contains("Question: What is ML?"));
        assert!(report.contains("Confidence: high"));
        assert!(report.contains("Response time: 1.23s"));
        let first = report.find("  1. ml_intro: Machine learning text").unwrap();
        let second = report.find("  2. deep_learning: Deep learning text").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_report_without_sources() {
        let result = QueryResult {
            answer: "none".to_string(),
            confidence: Confidence::Low,
            sources: Vec::new(),
        };
        assert!(!format_report("q", &result, 0.0).contains("Sources:"));
    }
}
