use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{error, info};

use crate::dimensions::{self, Dimension};
use crate::error::EvaluationError;
use crate::evaluator::Evaluator;
use crate::models::{
    CompanyRecord, DimensionResult, EvaluationReport, Metadata, OverallResult, ScoreRange,
    EVALUATION_VERSION,
};

const REQUIRED_FIELDS: [&str; 3] = ["name", "display_name", "summary"];

/// Check the minimal identity fields before any dimension runs.
pub fn validate_company(input: &Value) -> Result<&CompanyRecord, EvaluationError> {
    let company = match input.get("data") {
        Some(Value::Array(items)) if !items.is_empty() => &items[0],
        _ => input,
    };
    let company = company.as_object().ok_or_else(|| {
        EvaluationError::InputValidation("Company data must be an object".to_string())
    })?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !company.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(EvaluationError::InputValidation(format!(
            "Missing required fields in company data: {}",
            missing.join(", ")
        )));
    }

    info!(company = company_name(company), "Validated company");
    Ok(company)
}

pub fn company_name(company: &CompanyRecord) -> &str {
    ["name", "display_name"]
        .iter()
        .filter_map(|field| company.get(*field).and_then(Value::as_str))
        .find(|name| !name.is_empty())
        .unwrap_or("Unknown Company")
}

/// Evaluate every dimension in order and aggregate the results.
pub async fn run_evaluation(
    input: &Value,
    evaluator: &Evaluator<'_>,
) -> Result<EvaluationReport, EvaluationError> {
    run_dimensions(input, evaluator, &dimensions::ALL).await
}

pub async fn run_dimensions(
    input: &Value,
    evaluator: &Evaluator<'_>,
    dimensions: &[Dimension],
) -> Result<EvaluationReport, EvaluationError> {
    let start = Instant::now();
    let company = validate_company(input)?;
    let name = company_name(company).to_string();
    info!(company = %name, "Starting evaluation");

    let evaluation_date = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut results = Vec::with_capacity(dimensions.len());

    for dimension in dimensions {
        let dimension_start = Instant::now();
        let result = evaluator.evaluate(dimension, input).await;
        let elapsed = dimension_start.elapsed().as_secs_f64();

        if result.succeeded() {
            info!(
                dimension = dimension.name,
                score = result.score,
                elapsed = %format!("{elapsed:.2}s"),
                "Dimension evaluation completed"
            );
        } else {
            error!(
                dimension = dimension.name,
                error = result.error.as_deref().unwrap_or_default(),
                "Dimension evaluation failed"
            );
        }
        results.push((dimension.name.to_string(), result));
    }

    let overall = overall(&results, evaluator.range());
    let total = start.elapsed().as_secs_f64();
    info!(
        company = %name,
        overall = overall.score,
        elapsed = %format!("{total:.2}s"),
        "Evaluation completed"
    );

    Ok(EvaluationReport {
        metadata: Metadata {
            company_name: name,
            evaluation_date,
            evaluation_version: EVALUATION_VERSION.to_string(),
            total_evaluation_time: format!("{total:.2}s"),
        },
        dimensions: results,
        overall,
    })
}

/// Mean of the dimensions that completed, rounded to two decimals.
pub fn overall(results: &[(String, DimensionResult)], range: ScoreRange) -> OverallResult {
    let scores: Vec<i64> = results
        .iter()
        .map(|(_, result)| result)
        .filter(|result| result.succeeded())
        .map(|result| result.score)
        .collect();
    let total_dimensions = results.len();

    if scores.is_empty() {
        return OverallResult {
            score: range.default_score() as f64,
            rationale: "No successful evaluations".to_string(),
            successful_evaluations: 0,
            total_dimensions,
        };
    }

    let mean = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
    OverallResult {
        score: (mean * 100.0).round() / 100.0,
        rationale: format!(
            "Average score across {} of {} dimensions",
            scores.len(),
            total_dimensions
        ),
        successful_evaluations: scores.len(),
        total_dimensions,
    }
}

pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .replace(['.', ','], "")
}

/// Write the report to `<logs_dir>/<normalized name>.json`.
pub fn save_report(report: &EvaluationReport, logs_dir: &Path) -> Result<PathBuf, EvaluationError> {
    std::fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(format!(
        "{}.json",
        normalize_name(&report.metadata.company_name)
    ));
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "Evaluation log saved");
    Ok(path)
}
