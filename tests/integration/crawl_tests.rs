//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the genealogy directory and the
//! knowledge base, and run the crawl and enrichment end-to-end over HTTP.

use genealogy_harvest::config::{Config, CrawlerConfig, EnrichmentConfig, SnapshotConfig};
use genealogy_harvest::crawler::{build_http_client, crawl, FetchGate, HttpPersonSource, Shutdown};
use genealogy_harvest::job::{harvest_all, lookup_ids, PhaseProgress};
use genealogy_harvest::storage::{JsonSnapshot, SnapshotStore};
use genealogy_harvest::{HarvestError, Registry, Slot};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOT_FOUND: &str = "<html><body><p>You have specified an ID that does not exist in the database.\n  Please back up and try again.</p></body></html>";

/// Renders a record page with one degree and a students table
fn person_page(name: &str, advisor: Option<usize>, students: &[usize]) -> String {
    let advisor = advisor
        .map(|id| format!(r#"Advisor 1: <a href="id.php?id={}">Someone</a>"#, id))
        .unwrap_or_else(|| "Advisor: Unknown".to_string());
    let rows: String = students
        .iter()
        .map(|id| format!(r#"<tr><td><a href="id.php?id={}">Student {}</a></td><td>Somewhere</td></tr>"#, id, id))
        .collect();

    format!(
        r#"<html><body><div id="mainContent">
<h2>{name}</h2>
<div><span>Ph.D. <span>Example University</span> 1900</span><img title="Germany" /></div>
<div><span id="thesisTitle">On things</span></div>
<div>Mathematics Subject Classification: 01—History and biography</div>
<p>{advisor}</p>
<table><tr><th>Name</th><th>School</th></tr>{rows}</table>
</div></body></html>"#
    )
}

async fn mount_page(server: &MockServer, id: usize, body: String) {
    Mock::given(method("GET"))
        .and(path("/id.php"))
        .and(query_param("id", id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// 1 -> {3, 5}, 5 -> {7}; 2, 4 and 6 do not exist
async fn mount_directory(server: &MockServer, skip: &[usize]) {
    let pages = [
        (1, Some(person_page("Root Person", None, &[3, 5]))),
        (2, None),
        (3, Some(person_page("Third Person", Some(1), &[]))),
        (4, None),
        (5, Some(person_page("Fifth Person", Some(1), &[7]))),
        (6, None),
        (7, Some(person_page("Seventh Person", Some(5), &[]))),
    ];
    for (id, page) in pages {
        if skip.contains(&id) {
            continue;
        }
        mount_page(server, id, page.unwrap_or_else(|| NOT_FOUND.to_string())).await;
    }
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: server.uri(),
            max_concurrent_requests: 3,
            request_timeout_secs: 5,
        },
        enrichment: EnrichmentConfig {
            sparql_endpoint: format!("{}/sparql", server.uri()),
            api_endpoint: format!("{}/w/api.php", server.uri()),
            top_ranked: 10,
            batch_size: 50,
            max_concurrent_requests: 2,
        },
        snapshot: SnapshotConfig {
            crawl_path: dir.path().join("genealogy_backup"),
            enrichment_path: dir.path().join("genealogy_wiki_backup"),
        },
        ..Config::default()
    }
}

async fn crawl_server(server: &MockServer, snapshot: JsonSnapshot) -> Result<Registry, HarvestError> {
    let crawler = CrawlerConfig {
        base_url: server.uri(),
        ..CrawlerConfig::default()
    };
    let client = build_http_client(&Config::default().user_agent, Duration::from_secs(5)).unwrap();
    crawl(
        Arc::new(HttpPersonSource::new(client, &crawler)),
        snapshot,
        FetchGate::new(3),
        Shutdown::never(),
        ProgressBar::hidden(),
    )
    .await
}

fn requested_ids(requests: &[wiremock::Request]) -> Vec<usize> {
    requests
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "id")
                .and_then(|(_, value)| value.parse().ok())
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_over_http() {
    let server = MockServer::start().await;
    mount_directory(&server, &[]).await;
    let dir = TempDir::new().unwrap();

    let registry = crawl_server(&server, JsonSnapshot::new(dir.path().join("backup")))
        .await
        .unwrap();

    assert_eq!(registry.len(), 8);
    assert!(registry.is_complete());
    assert_eq!(registry.present_count(), 4);
    for id in [2, 4, 6] {
        assert_eq!(registry.get(id), Some(&Slot::Absent));
    }

    let seventh = registry.get(7).and_then(Slot::record).unwrap();
    assert_eq!(seventh.name, "Seventh Person");
    assert_eq!(seventh.degrees[0].advisors[0].id, 5);
    assert_eq!(seventh.degrees[0].subject_id, Some(1));

    let mut fetched = requested_ids(&server.received_requests().await.unwrap());
    fetched.sort_unstable();
    assert_eq!(fetched, (1..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_server_error_leaves_resumable_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = JsonSnapshot::new(dir.path().join("backup"));

    let failing = MockServer::start().await;
    mount_directory(&failing, &[4]).await;
    Mock::given(method("GET"))
        .and(path("/id.php"))
        .and(query_param("id", "4"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&failing)
        .await;

    let result = crawl_server(&failing, snapshot.clone()).await;
    assert!(matches!(result, Err(HarvestError::Status { status: 500, .. })));

    let saved: Registry = snapshot.load().unwrap().unwrap();
    assert_eq!(saved.get(4), Some(&Slot::Pending));
    assert!(saved.get(1).and_then(Slot::record).is_some());

    // The same snapshot against a healthy directory finishes the job.
    let healthy = MockServer::start().await;
    mount_directory(&healthy, &[]).await;
    let registry = crawl_server(&healthy, snapshot).await.unwrap();

    assert!(registry.is_complete());
    assert_eq!(registry.len(), 8);
    let refetched = requested_ids(&healthy.received_requests().await.unwrap());
    assert!(refetched.contains(&4));
    assert!(!refetched.contains(&1));
}

#[tokio::test]
async fn test_harvest_all_enriches_and_cleans_up() {
    let server = MockServer::start().await;
    mount_directory(&server, &[]).await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {"bindings": [
                {
                    "mathematician": {"type": "uri", "value": "http://www.wikidata.org/entity/Q501"},
                    "sites": {"type": "literal", "value": "40"},
                    "Mathematics_Genealogy_Project_ID": {"type": "literal", "value": "5"}
                },
                {
                    "mathematician": {"type": "uri", "value": "http://www.wikidata.org/entity/Q900"},
                    "sites": {"type": "literal", "value": "3"},
                    "Mathematics_Genealogy_Project_ID": {"type": "literal", "value": "99"}
                }
            ]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "wbgetentities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "entities": {
                "Q501": {"id": "Q501", "sitelinks": {"enwiki": {
                    "site": "enwiki",
                    "title": "Fifth Person",
                    "url": "https://en.wikipedia.org/wiki/Fifth_Person"
                }}},
                "Q900": {"id": "Q900", "sitelinks": {}}
            },
            "success": 1
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let registry = harvest_all(&config, Shutdown::never(), PhaseProgress::hidden())
        .await
        .unwrap();

    let rank = registry
        .get(5)
        .and_then(Slot::record)
        .and_then(|record| record.rank.clone())
        .unwrap();
    assert_eq!(rank.wiki_id, 501);
    assert_eq!(rank.score, 40);
    assert_eq!(rank.wiki_link.as_deref(), Some("https://en.wikipedia.org/wiki/Fifth_Person"));

    // Id 99 lies beyond the crawled range and is dropped.
    assert_eq!(registry.len(), 8);
    assert!(!config.snapshot.crawl_path.exists());
    assert!(!config.snapshot.enrichment_path.exists());

    let json = serde_json::to_value(&registry).unwrap();
    assert_eq!(json[5]["wiki_id"], 501);
    assert_eq!(json[2], serde_json::json!({}));
}

#[tokio::test]
async fn test_enrichment_failure_keeps_crawl_result_on_disk() {
    let dir = TempDir::new().unwrap();

    let server = MockServer::start().await;
    mount_directory(&server, &[]).await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let config = test_config(&server, &dir);

    let result = harvest_all(&config, Shutdown::never(), PhaseProgress::hidden()).await;
    assert!(matches!(result, Err(HarvestError::Status { status: 503, .. })));

    let saved: Registry = JsonSnapshot::new(&config.snapshot.crawl_path)
        .load()
        .unwrap()
        .unwrap();
    assert!(saved.is_complete());
    assert_eq!(saved.len(), 8);

    // With the knowledge base back, the rerun fetches no directory pages.
    let recovered = MockServer::start().await;
    mount_directory(&recovered, &[]).await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {"bindings": []}
        })))
        .mount(&recovered)
        .await;
    let config = test_config(&recovered, &dir);

    let registry = harvest_all(&config, Shutdown::never(), PhaseProgress::hidden())
        .await
        .unwrap();
    assert_eq!(registry, saved);
    let directory_requests = requested_ids(&recovered.received_requests().await.unwrap());
    assert!(directory_requests.is_empty());
    assert!(!config.snapshot.crawl_path.exists());
}

#[tokio::test]
async fn test_lookup_ids_prints_in_request_order() {
    let server = MockServer::start().await;
    mount_directory(&server, &[]).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir);

    let mut out = Vec::new();
    lookup_ids(&config, &[7, 2, 1], Shutdown::never(), &mut out)
        .await
        .unwrap();

    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["name"], "Seventh Person");
    assert_eq!(lines[1], serde_json::json!({}));
    assert_eq!(lines[2]["descendants"], serde_json::json!([3, 5]));
    assert!(!config.snapshot.crawl_path.exists());
}
