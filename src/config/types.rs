use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Genealogy-Harvest
///
/// Every section is optional; a missing file or section falls back to the
/// defaults that target the public genealogy directory and Wikidata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub enrichment: EnrichmentConfig,
    pub snapshot: SnapshotConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Root of the genealogy directory; records live at `{base}/id.php?id=N`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum number of concurrent record fetches
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.genealogy.math.ndsu.nodak.edu".to_string(),
            max_concurrent_requests: 10,
            request_timeout_secs: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "genealogy-harvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = self
            .contact_url
            .iter()
            .map(|url| format!("+{}", url))
            .chain(self.contact_email.iter().cloned())
            .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Ranking and link-lookup configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// SPARQL endpoint used for the popularity ranking query
    #[serde(rename = "sparql-endpoint")]
    pub sparql_endpoint: String,

    /// Entity API endpoint used for batched sitelink lookups
    #[serde(rename = "api-endpoint")]
    pub api_endpoint: String,

    /// How many top-ranked entities to request
    #[serde(rename = "top-ranked")]
    pub top_ranked: u32,

    /// Number of ids per lookup request
    #[serde(rename = "batch-size")]
    pub batch_size: u32,

    /// Maximum number of concurrent lookup requests
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            sparql_endpoint: "https://query.wikidata.org/sparql".to_string(),
            api_endpoint: "https://www.wikidata.org/w/api.php".to_string(),
            top_ranked: 1000,
            batch_size: 50,
            max_concurrent_requests: 10,
        }
    }
}

/// Snapshot file locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Snapshot of the crawl registry
    #[serde(rename = "crawl-path")]
    pub crawl_path: PathBuf,

    /// Snapshot of the link lookup cache
    #[serde(rename = "enrichment-path")]
    pub enrichment_path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            crawl_path: PathBuf::from("~/.genealogy_backup"),
            enrichment_path: PathBuf::from("~/.genealogy_wiki_backup"),
        }
    }
}

impl SnapshotConfig {
    /// Crawl snapshot path with a leading `~` expanded
    pub fn crawl_path(&self) -> PathBuf {
        expand_home(&self.crawl_path)
    }

    /// Enrichment snapshot path with a leading `~` expanded
    pub fn enrichment_path(&self) -> PathBuf {
        expand_home(&self.enrichment_path)
    }
}

/// Expands a leading `~` component to the user's home directory
pub fn expand_home(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_user_agent_without_contact() {
        let ua = UserAgentConfig {
            crawler_name: "Harvester".to_string(),
            crawler_version: "2.1".to_string(),
            contact_url: None,
            contact_email: None,
        };
        assert_eq!(ua.header_value(), "Harvester/2.1");
    }

    #[test]
    fn test_user_agent_with_contact() {
        let ua = UserAgentConfig {
            crawler_name: "Harvester".to_string(),
            crawler_version: "2.1".to_string(),
            contact_url: Some("https://example.com/about".to_string()),
            contact_email: Some("admin@example.com".to_string()),
        };
        assert_eq!(
            ua.header_value(),
            "Harvester/2.1 (+https://example.com/about; admin@example.com)"
        );
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        let path = Path::new("/var/tmp/backup.json");
        assert_eq!(expand_home(path), PathBuf::from("/var/tmp/backup.json"));
    }

    #[test]
    fn test_expand_home_replaces_tilde() {
        if let Some(home) = dirs::home_dir() {
            let expanded = expand_home(Path::new("~/.genealogy_backup"));
            assert_eq!(expanded, home.join(".genealogy_backup"));
        }
    }
}
