use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A company as delivered by the data provider: arbitrary, partial fields.
pub type CompanyRecord = Map<String, Value>;

pub const EVALUATION_VERSION: &str = "1.0";

/// Widest range a prompt can list one guideline line per score for.
pub const MAX_SCORE_SPAN: i64 = 10;

/// Closed range every dimension score is clamped into.
///
/// Only built through [`ScoreRange::new`], so `min < max` and the span is
/// at most [`MAX_SCORE_SPAN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRange {
    min: i64,
    max: i64,
}

impl ScoreRange {
    pub fn new(min: i64, max: i64) -> Option<Self> {
        let span = max.checked_sub(min)?;
        (1..=MAX_SCORE_SPAN)
            .contains(&span)
            .then_some(Self { min, max })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Score used whenever nothing usable could be parsed or evaluation failed.
    pub fn default_score(&self) -> i64 {
        self.min
    }

    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn values(&self) -> impl Iterator<Item = i64> {
        self.min..=self.max
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub score: i64,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DimensionResult {
    pub fn new(score: i64, rationale: impl Into<String>) -> Self {
        Self {
            score,
            rationale: rationale.into(),
            error: None,
        }
    }

    pub fn failed(score: i64, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            score,
            rationale: format!("Error during evaluation: {error}"),
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub company_name: String,
    pub evaluation_date: String,
    pub evaluation_version: String,
    pub total_evaluation_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallResult {
    pub score: f64,
    pub rationale: String,
    pub successful_evaluations: usize,
    pub total_dimensions: usize,
}

/// One run across all dimensions for one company.
///
/// Serialises as a flat JSON object: `metadata`, one key per dimension in
/// evaluation order, then `Overall`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub metadata: Metadata,
    pub dimensions: Vec<(String, DimensionResult)>,
    pub overall: OverallResult,
}

impl EvaluationReport {
    pub fn dimension(&self, name: &str) -> Option<&DimensionResult> {
        self.dimensions
            .iter()
            .find(|(dimension, _)| dimension == name)
            .map(|(_, result)| result)
    }
}

const METADATA_KEY: &str = "metadata";
const OVERALL_KEY: &str = "Overall";

impl Serialize for EvaluationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.dimensions.len() + 2))?;
        map.serialize_entry(METADATA_KEY, &self.metadata)?;
        for (name, result) in &self.dimensions {
            map.serialize_entry(name, result)?;
        }
        map.serialize_entry(OVERALL_KEY, &self.overall)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for EvaluationReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;

        let mut metadata = None;
        let mut overall = None;
        let mut dimensions = Vec::with_capacity(map.len().saturating_sub(2));
        for (key, value) in map {
            match key.as_str() {
                METADATA_KEY => {
                    metadata = Some(Metadata::deserialize(value).map_err(invalid::<D::Error>)?);
                }
                OVERALL_KEY => {
                    let result = OverallResult::deserialize(value).map_err(invalid::<D::Error>)?;
                    overall = Some(result);
                }
                _ => {
                    let result = DimensionResult::deserialize(value).map_err(invalid::<D::Error>)?;
                    dimensions.push((key, result));
                }
            }
        }

        Ok(Self {
            metadata: metadata.ok_or_else(|| missing::<D::Error>(METADATA_KEY))?,
            dimensions,
            overall: overall.ok_or_else(|| missing::<D::Error>(OVERALL_KEY))?,
        })
    }
}

fn invalid<E: de::Error>(e: serde_json::Error) -> E {
    E::custom(e)
}

fn missing<E: de::Error>(field: &'static str) -> E {
    E::missing_field(field)
}
