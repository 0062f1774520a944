use async_trait::async_trait;

use crate::actions::handler::arg;
use crate::actions::ActionHandler;

/// `browse_url(url)`: the response body of a plain GET.
pub struct BrowseUrl {
    client: reqwest::Client,
}

impl BrowseUrl {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for BrowseUrl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionHandler for BrowseUrl {
    async fn call(&self, args: &[String]) -> Result<String, String> {
        let url = arg(args, 0)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Error browsing url: {e}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("Error browsing url: {e}"))?;

        if !status.is_success() {
            return Err(format!("Error browsing url: {url} returned {status}\n{body}"));
        }
        Ok(body)
    }
}
