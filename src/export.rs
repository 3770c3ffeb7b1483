use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde_json::Value;
use tracing::warn;

use crate::dimensions;
use crate::models::EvaluationReport;
use crate::runner::normalize_name;

const METADATA_FIELDS: [&str; 2] = ["website", "linkedin_url"];
const ERROR_CELL: &str = "ERROR";

/// Read a batch file: a JSON list of `{"data": {...}}` wrappers.
///
/// Returns the inner company objects; malformed items are skipped.
pub fn load_companies(path: &Path) -> anyhow::Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let items: Value = serde_json::from_str(&content)
        .with_context(|| format!("could not decode JSON from {}", path.display()))?;
    let Value::Array(items) = items else {
        bail!("content of {} is not a list", path.display());
    };

    let mut companies = Vec::with_capacity(items.len());
    for item in items {
        match item.get("data") {
            Some(Value::Object(company)) if company.contains_key("name") => {
                companies.push(Value::Object(company.clone()));
            }
            Some(Value::Object(_)) => {
                warn!(path = %path.display(), "Company data item is missing a 'name' field");
            }
            Some(_) => {
                warn!(path = %path.display(), "'data' field of an item is not an object");
            }
            None => {
                warn!(path = %path.display(), "Item does not have a 'data' key");
            }
        }
    }

    Ok(companies)
}

/// `<dir>/<stem>_evaluation_summary.csv` for an input file.
pub fn summary_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "companies".to_string());
    input.with_file_name(format!("{stem}_evaluation_summary.csv"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub metadata: Vec<String>,
    pub overall_score: String,
    pub scores: Vec<String>,
    pub rationales: Vec<String>,
}

impl SummaryRow {
    pub fn from_report(company: &Value, report: &EvaluationReport) -> Self {
        let (scores, rationales) = dimensions::ALL
            .iter()
            .map(|dimension| match report.dimension(dimension.name) {
                Some(result) => (result.score.to_string(), result.rationale.clone()),
                None => (String::new(), String::new()),
            })
            .unzip();

        Self {
            name: report.metadata.company_name.clone(),
            metadata: metadata_cells(company),
            overall_score: report.overall.score.to_string(),
            scores,
            rationales,
        }
    }

    pub fn failed(company: &Value) -> Self {
        let cells = vec![ERROR_CELL.to_string(); dimensions::ALL.len()];
        Self {
            name: field_text(company, "name"),
            metadata: metadata_cells(company),
            overall_score: ERROR_CELL.to_string(),
            scores: cells.clone(),
            rationales: cells,
        }
    }

    fn record(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.metadata.iter().map(String::as_str))
            .chain(std::iter::once(self.overall_score.as_str()))
            .chain(self.scores.iter().map(String::as_str))
            .chain(self.rationales.iter().map(String::as_str))
            .collect()
    }
}

fn metadata_cells(company: &Value) -> Vec<String> {
    METADATA_FIELDS
        .iter()
        .map(|field| field_text(company, field))
        .collect()
}

fn field_text(company: &Value, field: &str) -> String {
    match company.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn summary_headers() -> Vec<String> {
    let mut headers = vec!["name".to_string()];
    headers.extend(METADATA_FIELDS.iter().map(|f| f.to_string()));
    headers.push("overall_score".to_string());
    for suffix in ["score", "rationale"] {
        headers.extend(
            dimensions::ALL
                .iter()
                .map(|d| format!("{}_{suffix}", normalize_name(d.name))),
        );
    }
    headers
}

pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(summary_headers())?;
    for row in rows {
        writer.write_record(row.record())?;
    }
    writer.flush()?;
    Ok(())
}
