use crate::config::types::{
    Config, CrawlerConfig, EnrichmentConfig, SnapshotConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest id batch the entity API accepts in one request
const MAX_BATCH_SIZE: u32 = 50;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_enrichment_config(&config.enrichment)?;
    validate_snapshot_config(&config.snapshot)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;
    validate_concurrency("crawler.max_concurrent_requests", config.max_concurrent_requests)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    validate_http_url("sparql_endpoint", &config.sparql_endpoint)?;
    validate_http_url("api_endpoint", &config.api_endpoint)?;
    validate_concurrency(
        "enrichment.max_concurrent_requests",
        config.max_concurrent_requests,
    )?;

    if config.top_ranked < 1 {
        return Err(ConfigError::Validation(
            "top_ranked must be >= 1".to_string(),
        ));
    }

    if config.batch_size < 1 || config.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.batch_size
        )));
    }

    Ok(())
}

fn validate_snapshot_config(config: &SnapshotConfig) -> Result<(), ConfigError> {
    if config.crawl_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "crawl_path cannot be empty".to_string(),
        ));
    }

    if config.enrichment_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "enrichment_path cannot be empty".to_string(),
        ));
    }

    // Each pipeline owns its snapshot exclusively.
    if config.crawl_path() == config.enrichment_path() {
        return Err(ConfigError::Validation(format!(
            "crawl_path and enrichment_path must differ, both are '{}'",
            config.crawl_path.display()
        )));
    }

    Ok(())
}

fn validate_concurrency(field: &str, value: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and 100, got {}",
            field, value
        )));
    }
    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}

/// Basic email shape check: one `@` with a dotted domain after it
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::Validation(format!(
            "Invalid contact_email: '{}'",
            email
        )));
    }

    Ok(())
}
