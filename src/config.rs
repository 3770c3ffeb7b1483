use anyhow::{bail, Context, Result};

use crate::models::{ScoreRange, MAX_SCORE_SPAN};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Settings loaded from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub serpapi_api_key: String,
    pub serpapi_base_url: String,
    pub score_range: ScoreRange,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: std::env::var("SCORECARD_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            serpapi_api_key: std::env::var("SERPAPI_API_KEY")
                .context("SERPAPI_API_KEY must be set")?,
            serpapi_base_url: std::env::var("SERPAPI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_SERPAPI_BASE_URL.to_string()),
            score_range: score_range(
                std::env::var("SCORECARD_MIN_SCORE").ok().as_deref(),
                std::env::var("SCORECARD_MAX_SCORE").ok().as_deref(),
            )?,
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n: usize = val.chars().take(5).map(char::len_utf8).sum();
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        tracing::info!("  OPENAI_BASE_URL: {}", self.openai_base_url);
        tracing::info!("  SCORECARD_MODEL: {}", self.model);
        tracing::info!("  SERPAPI_API_KEY: {}", preview(&self.serpapi_api_key));
        tracing::info!(
            "  Score range: {}-{}",
            self.score_range.min(),
            self.score_range.max()
        );
    }
}

fn score_range(min: Option<&str>, max: Option<&str>) -> Result<ScoreRange> {
    let defaults = ScoreRange::default();
    let min = match min {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("SCORECARD_MIN_SCORE is not an integer: {raw}"))?,
        None => defaults.min(),
    };
    let max = match max {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("SCORECARD_MAX_SCORE is not an integer: {raw}"))?,
        None => defaults.max(),
    };

    match ScoreRange::new(min, max) {
        Some(range) => Ok(range),
        None => bail!(
            "score range {min}-{max} is invalid; minimum must be below maximum \
             and the span at most {MAX_SCORE_SPAN}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_defaults_to_one_through_five() {
        assert_eq!(score_range(None, None).unwrap(), ScoreRange::default());
    }

    #[test]
    fn range_overrides_parse() {
        let range = score_range(Some("0"), Some(" 3 ")).unwrap();
        assert_eq!((range.min(), range.max()), (0, 3));
    }

    #[test]
    fn inverted_or_garbage_range_is_rejected() {
        assert!(score_range(Some("5"), Some("1")).is_err());
        assert!(score_range(Some("low"), None).is_err());
        assert!(score_range(Some("3"), Some("3")).is_err());
    }

    #[test]
    fn oversized_range_is_rejected() {
        assert!(score_range(Some("0"), Some("1000000000")).is_err());
        assert!(score_range(Some("0"), Some("10")).is_ok());
    }
}
