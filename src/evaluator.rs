use std::fmt::Write;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::dimensions::Dimension;
use crate::error::EvaluationError;
use crate::llm::TextGenerator;
use crate::models::{CompanyRecord, DimensionResult, ScoreRange};
use crate::parse;
use crate::search::WebSearcher;

/// Pinned so repeated runs on identical input score the same.
pub const TEMPERATURE: f32 = 0.0;

const SCORING_TIERS: [&str; 5] = [
    "No signal of edge. Claims are generic or unrelated to the domain.",
    "Background or approach is adjacent but not clearly strategic.",
    "Domain or network relevance is evident but not unique.",
    "Strong, hard-to-replicate advantage supported by evidence.",
    "Rare and strategic edge (e.g., repeat founder in same vertical, ex-CxO in target buyer persona).",
];

const HYPOTHESES: [&str; 5] = [
    "The company is targeting a proven problem/market where customers will pay",
    "The space has limited incumbents (signaled by competitors being young companies)",
    "Recent technological or market changes enable new solutions",
    "Rapid growth signals strong product-market fit or investor validation",
    "The timing is right for a fast follower strategy",
];

/// Scores one company on one dimension. Holds no state between calls.
pub struct Evaluator<'a> {
    generator: &'a dyn TextGenerator,
    searcher: &'a dyn WebSearcher,
    range: ScoreRange,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        searcher: &'a dyn WebSearcher,
        range: ScoreRange,
    ) -> Self {
        Self {
            generator,
            searcher,
            range,
        }
    }

    pub fn range(&self) -> ScoreRange {
        self.range
    }

    /// Never fails: insufficient input and pipeline errors both come back as
    /// results carrying the minimum score.
    #[instrument(skip_all, fields(dimension = dimension.name))]
    pub async fn evaluate(&self, dimension: &Dimension, input: &Value) -> DimensionResult {
        info!("Starting evaluation");

        let Some(company) = extract_company(input) else {
            warn!("No company data found");
            return self.insufficient(dimension);
        };

        match self.run_pipeline(dimension, company).await {
            Ok(result) => {
                info!(score = result.score, "Evaluation complete");
                result
            }
            Err(e) => {
                error!(error = %e, "Error during evaluation");
                DimensionResult::failed(self.range.default_score(), e.to_string())
            }
        }
    }

    async fn run_pipeline(
        &self,
        dimension: &Dimension,
        company: &CompanyRecord,
    ) -> Result<DimensionResult, EvaluationError> {
        let trimmed = dimension.trim(company);
        if trimmed.is_empty() {
            warn!("No trimmed data available after processing");
            return Ok(self.insufficient(dimension));
        }

        let web_results = self.search_web(dimension, company).await;
        info!(
            words = web_results.split_whitespace().count(),
            "Web search completed"
        );

        let prompt = build_prompt(dimension, company, &trimmed, &web_results, self.range)
            .map_err(|e| EvaluationError::evaluator(dimension.name, e))?;

        info!("Sending evaluation prompt to LLM");
        let response = self
            .generator
            .generate(&prompt, TEMPERATURE)
            .await
            .map_err(|e| EvaluationError::evaluator(dimension.name, format!("{e:#}")))?;

        let preview: String = response.chars().take(200).collect();
        info!(preview = %preview, "Raw response from LLM");
        debug!(response = %response, "Full response");

        Ok(parse::parse_response(&response, self.range))
    }

    /// Run every query for the dimension, keeping whatever succeeds.
    pub async fn search_web(&self, dimension: &Dimension, company: &CompanyRecord) -> String {
        let mut all_results = Vec::new();

        for query in dimension.search_queries(company) {
            match self.searcher.search(&query).await {
                Ok(results) => {
                    all_results.push(format!("Search results for '{query}':\n{results}"));
                }
                Err(e) => {
                    error!(query = %query, error = %e, "Error in individual search query");
                }
            }
        }

        all_results.join("\n\n")
    }

    fn insufficient(&self, dimension: &Dimension) -> DimensionResult {
        DimensionResult::new(
            self.range.default_score(),
            format!(
                "Insufficient company information to evaluate {}",
                dimension.name
            ),
        )
    }
}

/// Locate the company object in a possibly wrapped input.
///
/// Accepts either the record itself or an object whose `data` field is a
/// list of records, in which case the first one is used.
pub fn extract_company(input: &Value) -> Option<&CompanyRecord> {
    let map = input.as_object().filter(|map| !map.is_empty())?;

    if let Some(Value::Array(items)) = map.get("data") {
        debug!(companies = items.len(), "Found companies in data list");
        return items.first()?.as_object().filter(|map| !map.is_empty());
    }

    Some(map)
}

pub fn build_prompt(
    dimension: &Dimension,
    company: &CompanyRecord,
    trimmed: &CompanyRecord,
    web_results: &str,
    range: ScoreRange,
) -> Result<String, serde_json::Error> {
    let company_name = company
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("the company");
    let company_data = serde_json::to_string_pretty(trimmed)?;
    let (min, max) = (range.min(), range.max());

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a critical evaluator assessing {company_name} for the {} dimension, \
         specifically analyzing its potential as a fast follower opportunity. \
         Assume nothing until proven.",
        dimension.name
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Key Hypothesis to Evaluate:");
    for (i, hypothesis) in HYPOTHESES.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {hypothesis}", i + 1);
    }

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Scoring Guidelines (Adversarial):");
    for score in range.values() {
        let _ = writeln!(prompt, "- {score} = {}", scoring_tier(score, range));
    }

    let calibration = calibration_text(dimension, range);
    if !calibration.is_empty() {
        let _ = writeln!(prompt);
        prompt.push_str(&calibration);
    }

    let instructions = [
        "Use BOTH company data AND web research to inform your evaluation".to_string(),
        "Be skeptical - distinguish between genuine signals and funding-driven growth".to_string(),
        "Explicitly identify missing information that would strengthen the evaluation"
            .to_string(),
        "Challenge assumptions about market readiness and timing".to_string(),
        "Consider both technical and go-to-market risks".to_string(),
        format!(
            "Your response MUST start with either \"Score: X\" or just the number X \
             (where X is {min}-{max})"
        ),
        "Justify why the company doesn't deserve a higher score".to_string(),
        "Question the reliability and completeness of available information".to_string(),
    ];
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Important Instructions:");
    for (i, instruction) in instructions.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {instruction}", i + 1);
    }

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Company Data:\n{company_data}");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Web Research Results:\n{web_results}");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Evaluation Rubric:\n{}", dimension.rubric);
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Provide:");
    let _ = writeln!(
        prompt,
        "1. A concise, informative analysis of the company's potential as a fast follower \
         opportunity for the {} dimension. Your rationale must be no longer than 500 words. \
         Avoid repetition and unnecessary detail.",
        dimension.name
    );
    let _ = writeln!(
        prompt,
        "2. The score from {min}-{max} using the rubric, stated first as instructed above."
    );

    Ok(prompt)
}

fn scoring_tier(score: i64, range: ScoreRange) -> &'static str {
    let span = range.max() - range.min();
    let steps = (SCORING_TIERS.len() - 1) as i64;
    let index = ((score - range.min()) * steps) / span;
    SCORING_TIERS[index.clamp(0, steps) as usize]
}

fn calibration_text(dimension: &Dimension, range: ScoreRange) -> String {
    let mut text = String::new();
    for score in range.values() {
        let examples = dimension.calibration_examples(score);
        if examples.is_empty() {
            continue;
        }
        let _ = writeln!(text, "Score {score}:");
        for example in examples {
            let _ = writeln!(text, "- {example}");
        }
    }

    if text.is_empty() {
        text
    } else {
        format!("Calibration Examples:\n{text}")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::dimensions::{FOUNDER_EDGE, INVESTOR_BEHAVIOR, NOVEL_WEDGE};

    /// Replies with a fixed text, or fails when `reply` is `None`.
    pub struct FakeGenerator {
        pub reply: Option<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
            assert_eq!(temperature, TEMPERATURE);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| anyhow!("insufficient_quota"))
        }
    }

    /// Echoes the query back; fails for queries containing any `fail_on` term.
    pub struct FakeSearcher {
        pub fail_on: Vec<&'static str>,
        pub queries: Mutex<Vec<String>>,
    }

    impl FakeSearcher {
        pub fn new() -> Self {
            Self::failing_on(Vec::new())
        }

        pub fn failing_on(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl WebSearcher for FakeSearcher {
        async fn search(&self, query: &str) -> Result<String> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail_on.iter().any(|term| query.contains(term)) {
                return Err(anyhow!("search timeout"));
            }
            Ok(format!("results for {query}"))
        }
    }

    fn acme() -> Value {
        json!({
            "name": "Acme Robotics",
            "display_name": "Acme",
            "summary": "Warehouse picking robots",
            "industry": "logistics",
            "funding_details": [{"round": "Seed", "amount": 2000000}],
        })
    }

    #[test]
    fn extracts_plain_and_wrapped_records() {
        let plain = acme();
        assert_eq!(
            extract_company(&plain).unwrap()["name"],
            "Acme Robotics"
        );

        let wrapped = json!({"data": [acme(), {"name": "Second"}]});
        assert_eq!(
            extract_company(&wrapped).unwrap()["name"],
            "Acme Robotics"
        );
    }

    #[test]
    fn rejects_missing_or_empty_records() {
        assert!(extract_company(&Value::Null).is_none());
        assert!(extract_company(&json!({})).is_none());
        assert!(extract_company(&json!([acme()])).is_none());
        assert!(extract_company(&json!({"data": []})).is_none());
        assert!(extract_company(&json!({"data": ["not an object"]})).is_none());
    }

    #[tokio::test]
    async fn empty_record_short_circuits_without_network_calls() {
        let generator = FakeGenerator::replying("Score: 5");
        let searcher = FakeSearcher::new();
        let evaluator = Evaluator::new(&generator, &searcher, ScoreRange::default());

        for input in [Value::Null, json!({}), json!({"data": []})] {
            let result = evaluator.evaluate(&FOUNDER_EDGE, &input).await;
            assert_eq!(result.score, 1);
            assert_eq!(
                result.rationale,
                "Insufficient company information to evaluate Founder Edge"
            );
            assert!(result.succeeded());
        }
        assert_eq!(generator.calls(), 0);
        assert_eq!(searcher.calls(), 0);
    }

    #[tokio::test]
    async fn empty_trim_short_circuits() {
        let generator = FakeGenerator::replying("Score: 5");
        let searcher = FakeSearcher::new();
        let evaluator = Evaluator::new(&generator, &searcher, ScoreRange::default());

        let result = evaluator
            .evaluate(&INVESTOR_BEHAVIOR, &json!({"headcount": 40}))
            .await;
        assert_eq!(
            result.rationale,
            "Insufficient company information to evaluate Investor Behavior"
        );
        assert_eq!(generator.calls(), 0);
        assert_eq!(searcher.calls(), 0);
    }

    #[tokio::test]
    async fn full_pipeline_scores_reply() {
        let generator = FakeGenerator::replying("Score: 4\nRationale: Repeat founder in logistics.");
        let searcher = FakeSearcher::new();
        let evaluator = Evaluator::new(&generator, &searcher, ScoreRange::default());

        let result = evaluator.evaluate(&FOUNDER_EDGE, &acme()).await;
        assert_eq!(result, DimensionResult::new(4, "Repeat founder in logistics."));
        assert_eq!(generator.calls(), 1);
        assert_eq!(searcher.calls(), FOUNDER_EDGE.queries.len());

        let prompts = generator.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("assessing Acme Robotics for the Founder Edge dimension"));
        assert!(prompt.contains("Search results for 'Acme Robotics founding team':"));
        assert!(prompt.contains("\"funding_details\""));
        assert!(!prompt.contains("\"display_name\""));
        assert!(prompt.contains("(where X is 1-5)"));
        assert!(prompt.contains("Score 5:\n- Founder with multiple exits"));
        assert!(prompt.contains(FOUNDER_EDGE.rubric));
    }

    #[tokio::test]
    async fn model_failure_degrades_to_minimum() {
        let generator = FakeGenerator::failing();
        let searcher = FakeSearcher::new();
        let evaluator = Evaluator::new(&generator, &searcher, ScoreRange::default());

        let result = evaluator.evaluate(&NOVEL_WEDGE, &acme()).await;
        assert_eq!(result.score, 1);
        assert!(result.rationale.starts_with("Error during evaluation:"));
        assert!(result.rationale.contains("insufficient_quota"));
        assert!(!result.succeeded());
    }

    #[tokio::test]
    async fn malformed_reply_keeps_raw_text() {
        let generator = FakeGenerator::replying("unclear signals, hard to say");
        let searcher = FakeSearcher::new();
        let evaluator = Evaluator::new(&generator, &searcher, ScoreRange::default());

        let result = evaluator.evaluate(&NOVEL_WEDGE, &acme()).await;
        assert_eq!(
            result,
            DimensionResult::new(1, "unclear signals, hard to say")
        );
    }

    #[tokio::test]
    async fn search_keeps_successful_queries_only() {
        let generator = FakeGenerator::replying("3");
        let searcher = FakeSearcher::failing_on(vec!["CEO linkedin", "previous startups"]);
        let evaluator = Evaluator::new(&generator, &searcher, ScoreRange::default());
        let company = acme();

        let text = evaluator
            .search_web(&FOUNDER_EDGE, company.as_object().unwrap())
            .await;
        assert_eq!(
            text,
            "Search results for 'Acme Robotics founders background experience':\n\
             results for Acme Robotics founders background experience\n\n\
             Search results for 'Acme Robotics founding team':\n\
             results for Acme Robotics founding team"
        );
        assert_eq!(searcher.calls(), 4);
    }

    #[tokio::test]
    async fn total_search_failure_still_evaluates() {
        let generator = FakeGenerator::replying("Score: 2\nLittle public evidence.");
        let searcher = FakeSearcher::failing_on(vec!["Acme"]);
        let evaluator = Evaluator::new(&generator, &searcher, ScoreRange::default());

        let text = evaluator
            .search_web(&NOVEL_WEDGE, acme().as_object().unwrap())
            .await;
        assert_eq!(text, "");

        let result = evaluator.evaluate(&NOVEL_WEDGE, &acme()).await;
        assert_eq!(result, DimensionResult::new(2, "Little public evidence."));
    }

    #[test]
    fn prompt_follows_configured_range() {
        let company = acme();
        let company = company.as_object().unwrap();
        let range = ScoreRange::new(0, 3).unwrap();
        let prompt = build_prompt(
            &FOUNDER_EDGE,
            company,
            &FOUNDER_EDGE.trim(company),
            "",
            range,
        )
        .unwrap();

        assert!(prompt.contains("- 0 = No signal of edge."));
        assert!(prompt.contains("- 3 = Rare and strategic edge"));
        assert!(prompt.contains("(where X is 0-3)"));
        assert!(!prompt.contains("Score 0:"));
        assert!(prompt.contains("Score 3:"));
        assert!(!prompt.contains("Score 4:"));
    }
}
