//! Sources of person records
//!
//! The crawl pipeline only needs "give me the record for id N, or tell me
//! there is none". `HttpPersonSource` answers that from the live directory;
//! tests substitute in-memory sources.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::fetch_text;
use crate::crawler::parser::parse_person;
use crate::state::{NodeId, Record};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;

#[async_trait]
pub trait PersonSource: Send + Sync + 'static {
    /// Fetches and parses one record; `Ok(None)` means the id has no entity
    async fn fetch_person(&self, id: NodeId) -> Result<Option<Record>, HarvestError>;
}

/// Fetches record pages over HTTP and parses them
#[derive(Debug, Clone)]
pub struct HttpPersonSource {
    client: Client,
    base_url: String,
}

impl HttpPersonSource {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the page for `id`
    pub fn record_url(&self, id: NodeId) -> String {
        format!("{}/id.php?id={}", self.base_url, id)
    }
}

#[async_trait]
impl PersonSource for HttpPersonSource {
    async fn fetch_person(&self, id: NodeId) -> Result<Option<Record>, HarvestError> {
        let html = fetch_text(&self.client, &self.record_url(id)).await?;
        parse_person(&html, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_url() {
        let config = CrawlerConfig {
            base_url: "https://genealogy.example.org/".to_string(),
            ..CrawlerConfig::default()
        };
        let source = HttpPersonSource::new(Client::new(), &config);
        assert_eq!(
            source.record_url(42),
            "https://genealogy.example.org/id.php?id=42"
        );
    }
}
