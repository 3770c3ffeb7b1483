use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

/// A web-search service returning results already rendered as text.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

const NO_RESULTS: &str = "No good search result found";
const MAX_RESULTS: usize = 8;

// --- SerpAPI (Google Search) ---

pub struct SerpApiSearcher {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerpApiSearcher {
    pub fn new(api_key: &str) -> Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: "https://serpapi.com".to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .context("Failed to build HTTP client")?,
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl WebSearcher for SerpApiSearcher {
    async fn search(&self, query: &str) -> Result<String> {
        info!(query, "SerpAPI search");

        let resp = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("SerpAPI request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("SerpAPI error ({}): {}", status, body));
        }

        let data: SerpApiResponse = resp
            .json()
            .await
            .context("Failed to parse SerpAPI response")?;

        if let Some(error) = data.error {
            return Err(anyhow!("SerpAPI error: {error}"));
        }

        let text = render_results(&data);
        info!(query, count = data.organic_results.len(), "SerpAPI search complete");
        Ok(text)
    }
}

fn render_results(data: &SerpApiResponse) -> String {
    let mut lines = Vec::new();

    if let Some(answer) = data
        .answer_box
        .as_ref()
        .and_then(|b| b.answer.as_deref().or(b.snippet.as_deref()))
    {
        lines.push(answer.to_string());
    }

    for result in data.organic_results.iter().take(MAX_RESULTS) {
        if result.snippet.is_empty() && result.title.is_empty() {
            continue;
        }
        lines.push(format!("{}: {} ({})", result.title, result.snippet, result.link));
    }

    if lines.is_empty() {
        NO_RESULTS.to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn searcher(server: &MockServer) -> SerpApiSearcher {
        SerpApiSearcher::new("serp-key")
            .unwrap()
            .with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn renders_answer_box_and_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "Acme founding team"))
            .and(query_param("engine", "google"))
            .and(query_param("api_key", "serp-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer_box": {"snippet": "Acme was founded in 2021."},
                "organic_results": [
                    {"title": "Acme team", "link": "https://acme.example/team", "snippet": "Meet the founders"},
                    {"title": "", "link": "https://empty.example", "snippet": ""}
                ]
            })))
            .mount(&server)
            .await;

        let text = searcher(&server)
            .await
            .search("Acme founding team")
            .await
            .unwrap();
        assert_eq!(
            text,
            "Acme was founded in 2021.\nAcme team: Meet the founders (https://acme.example/team)"
        );
    }

    #[tokio::test]
    async fn empty_results_render_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let text = searcher(&server).await.search("nothing").await.unwrap();
        assert_eq!(text, NO_RESULTS);
    }

    #[tokio::test]
    async fn api_errors_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Invalid API key."
            })))
            .mount(&server)
            .await;

        let err = searcher(&server).await.search("Acme").await.unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn http_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(searcher(&server).await.search("Acme").await.is_err());
    }
}
