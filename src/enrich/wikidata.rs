//! Knowledge-base client: popularity ranking and sitelink lookup

use crate::config::EnrichmentConfig;
use crate::crawler::fetch_json;
use crate::enrich::{LinkCache, LinkResolver, RankedEntity, RankingSource};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

/// Entities carrying a genealogy id, most-linked first
const RANKING_QUERY: &str = r#"SELECT ?mathematician ?mathematicianLabel (COUNT(DISTINCT ?sitelink) AS ?sites) ?Mathematics_Genealogy_Project_ID WHERE {
SERVICE wikibase:label { bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en". }
?mathematician wdt:P549 ?Mathematics_Genealogy_Project_ID.
?sitelink schema:about ?mathematician.
}
GROUP BY ?mathematician ?mathematicianLabel ?Mathematics_Genealogy_Project_ID
ORDER BY DESC(?sites)
LIMIT "#;

/// Site whose article URL is attached to ranked records
const SITE_FILTER: &str = "enwiki";

/// Client for the SPARQL endpoint and the entity API
#[derive(Debug, Clone)]
pub struct WikidataClient {
    client: Client,
    sparql_endpoint: String,
    api_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    mathematician: SparqlTerm,
    sites: SparqlTerm,
    #[serde(rename = "Mathematics_Genealogy_Project_ID")]
    genealogy_id: SparqlTerm,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    entities: HashMap<String, Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(default)]
    sitelinks: HashMap<String, Sitelink>,
}

#[derive(Debug, Deserialize)]
struct Sitelink {
    url: Option<String>,
}

impl WikidataClient {
    pub fn new(client: Client, config: &EnrichmentConfig) -> Self {
        Self {
            client,
            sparql_endpoint: config.sparql_endpoint.clone(),
            api_endpoint: config.api_endpoint.clone(),
        }
    }

    fn ranking_url(&self, limit: u32) -> Result<Url, HarvestError> {
        let query = format!("{}{}", RANKING_QUERY, limit);
        Url::parse_with_params(&self.sparql_endpoint, &[("query", query.as_str()), ("format", "json")])
            .map_err(|e| self.malformed(&self.sparql_endpoint, e.to_string()))
    }

    fn links_url(&self, batch: &[u64]) -> Result<Url, HarvestError> {
        let ids = batch
            .iter()
            .map(|id| format!("Q{}", id))
            .collect::<Vec<_>>()
            .join("|");
        Url::parse_with_params(
            &self.api_endpoint,
            &[
                ("action", "wbgetentities"),
                ("format", "json"),
                ("props", "sitelinks/urls"),
                ("ids", ids.as_str()),
                ("sitefilter", SITE_FILTER),
            ],
        )
        .map_err(|e| self.malformed(&self.api_endpoint, e.to_string()))
    }

    fn malformed(&self, url: &str, message: String) -> HarvestError {
        HarvestError::MalformedResponse {
            url: url.to_string(),
            message,
        }
    }
}

/// `http://www.wikidata.org/entity/Q6722` or `Q6722` -> 6722
fn entity_number(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.strip_prefix('Q')?.parse().ok()
}

fn ranked_entity(binding: &SparqlBinding) -> Option<RankedEntity> {
    Some(RankedEntity {
        wiki_id: entity_number(&binding.mathematician.value)?,
        id: binding.genealogy_id.value.trim().parse().ok()?,
        score: binding.sites.value.trim().parse().ok()?,
        wiki_link: None,
    })
}

#[async_trait]
impl RankingSource for WikidataClient {
    async fn fetch_top_ranked(&self, limit: u32) -> Result<Vec<RankedEntity>, HarvestError> {
        let url = self.ranking_url(limit)?;
        let response: SparqlResponse = fetch_json(&self.client, url.as_str()).await?;

        let ranked: Vec<RankedEntity> = response
            .results
            .bindings
            .iter()
            .filter_map(|binding| {
                let entity = ranked_entity(binding);
                if entity.is_none() {
                    tracing::warn!(
                        "skipping ranking row with unparseable ids: {} / {}",
                        binding.mathematician.value,
                        binding.genealogy_id.value
                    );
                }
                entity
            })
            .collect();

        tracing::info!("ranking source returned {} entities", ranked.len());
        Ok(ranked)
    }
}

#[async_trait]
impl LinkResolver for WikidataClient {
    async fn resolve_links(&self, batch: Vec<u64>) -> Result<LinkCache, HarvestError> {
        let url = self.links_url(&batch)?;
        let response: EntitiesResponse = fetch_json(&self.client, url.as_str()).await?;

        let mut links: LinkCache = response
            .entities
            .into_iter()
            .filter_map(|(key, entity)| {
                let link = entity
                    .sitelinks
                    .get(SITE_FILTER)
                    .and_then(|sitelink| sitelink.url.clone());
                entity_number(&key).map(|id| (id, link))
            })
            .collect();

        // Ids the API did not echo back have no link either.
        for id in batch {
            links.entry(id).or_insert(None);
        }

        Ok(links)
    }
}
