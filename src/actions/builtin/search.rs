use std::fmt::Write;

use async_trait::async_trait;
use serde_json::Value;

use crate::actions::handler::arg;
use crate::actions::ActionHandler;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// `search_web(query)` backed by the Google Custom Search JSON API.
pub struct GoogleSearch {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    endpoint: String,
}

impl GoogleSearch {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn search(&self, query: &str) -> Result<String, reqwest::Error> {
        let query = query.replace('"', "");
        let data: Value = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(format_results(&data))
    }
}

/// Numbered `URL:` / `Description:` pairs, one block per item.
pub(crate) fn format_results(data: &Value) -> String {
    let mut out = String::new();
    let Some(items) = data["items"].as_array() else {
        return out;
    };
    for (i, item) in items.iter().enumerate() {
        let url = item["link"].as_str().unwrap_or("");
        let description = item["snippet"].as_str().unwrap_or("");
        let _ = write!(out, "{}. URL: {url}\n   Description: {description}\n\n", i + 1);
    }
    out
}

#[async_trait]
impl ActionHandler for GoogleSearch {
    async fn call(&self, args: &[String]) -> Result<String, String> {
        self.search(arg(args, 0)?)
            .await
            .map_err(|e| format!("Failed to perform the web search. Error: {e}"))
    }
}
