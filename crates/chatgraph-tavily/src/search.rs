use async_trait::async_trait;
use chatgraph_core::{ChatGraphError, Tool};
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub api_key: String,
    pub max_results: usize,
    pub search_depth: String,
    pub include_answer: bool,
    pub base_url: String,
}

impl TavilyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            max_results: 5,
            search_depth: "basic".to_string(),
            include_answer: true,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// `"basic"` or `"advanced"`.
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn with_include_answer(mut self, include: bool) -> Self {
        self.include_answer = include;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

pub struct TavilySearchTool {
    config: TavilyConfig,
    client: reqwest::Client,
}

impl TavilySearchTool {
    pub fn new(config: TavilyConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &TavilyConfig {
        &self.config
    }
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<RawResult>,
}

/// Normalize a Tavily `/search` body: results sorted by score (highest
/// first) and capped at `max_results`.
pub fn parse_search_response(
    query: &str,
    body: Value,
    max_results: usize,
) -> Result<Value, ChatGraphError> {
    let raw: RawResponse = serde_json::from_value(body)
        .map_err(|e| ChatGraphError::Parsing(format!("unexpected Tavily response: {e}")))?;

    let mut results = raw.results;
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(max_results);

    let results: Vec<Value> = results
        .into_iter()
        .map(|r| {
            json!({
                "title": r.title,
                "url": r.url,
                "content": r.content,
                "score": r.score,
            })
        })
        .collect();

    Ok(json!({
        "query": query,
        "answer": raw.answer,
        "results": results,
    }))
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &'static str {
        "tavily_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for current information. Input should be a search query."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, ChatGraphError> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ChatGraphError::Tool("tavily_search: missing string argument 'query'".to_string())
            })?;

        let body = json!({
            "api_key": self.config.api_key,
            "query": query,
            "max_results": self.config.max_results,
            "search_depth": self.config.search_depth,
            "include_answer": self.config.include_answer,
        });

        tracing::debug!(query, "tavily search");
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatGraphError::Tool(format!("Tavily request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChatGraphError::Tool(format!(
                "Tavily API error ({status}): {text}"
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ChatGraphError::Parsing(format!("Tavily response not JSON: {e}")))?;

        parse_search_response(query, json, self.config.max_results)
    }
}
