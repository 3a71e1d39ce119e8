//! Output formatting for CLI commands.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{OutputFormat, XimlArgs};
use crate::corpus::BatchSummary;
use crate::stats::StatsReport;

/// Result of a batch transform or classify run.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResult {
    pub input: String,
    pub output: String,
    #[serde(flatten)]
    pub summary: BatchSummary,
    pub duration_ms: u64,
}

impl BatchResult {
    pub fn new(input: &Path, output: &Path, summary: BatchSummary, duration_ms: u64) -> Self {
        BatchResult {
            input: input.display().to_string(),
            output: output.display().to_string(),
            summary,
            duration_ms,
        }
    }
}

/// Result of a model file conversion.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversionResult {
    pub input: String,
    pub output: String,
    pub records: usize,
}

/// Result of a configured pipeline run.
#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<BatchResult>,
    pub classify: BatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsReport>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &XimlArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &XimlArgs) -> Result<()> {
    if args.verbosity() == 0 {
        return Ok(());
    }
    println!("{message}");
    println!();

    let value = serde_json::to_value(result)?;
    for line in human_lines(&value, 0) {
        println!("{line}");
    }
    Ok(())
}

/// Render a JSON value as indented `key: value` lines.
fn human_lines(value: &Value, indent: usize) -> Vec<String> {
    let pad = "  ".repeat(indent);
    let mut lines = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                let label = key.replace('_', " ");
                match value {
                    Value::Object(_) => {
                        lines.push(format!("{pad}{label}:"));
                        lines.extend(human_lines(value, indent + 1));
                    }
                    other => lines.push(format!("{pad}{label}: {}", scalar(other))),
                }
            }
        }
        other => lines.push(format!("{pad}{}", scalar(other))),
    }
    lines
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.2}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &XimlArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_human_lines() {
        let value = json!({
            "global_accuracy": 75.0,
            "sport": {"precision": 100.0, "recall": 66.666},
            "written": 3
        });
        let lines = human_lines(&value, 0);
        assert_eq!(
            lines,
            vec![
                "global accuracy: 75.00",
                "sport:",
                "  precision: 100.00",
                "  recall: 66.67",
                "written: 3",
            ]
        );
    }

    #[test]
    fn test_batch_result_flattens_summary() {
        let result = BatchResult::new(
            Path::new("in.jsonl"),
            Path::new("out.jsonl"),
            BatchSummary {
                read: 4,
                written: 3,
                dropped: 1,
                skipped: 0,
            },
            12,
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["written"], 3);
        assert_eq!(value["input"], "in.jsonl");
    }
}
