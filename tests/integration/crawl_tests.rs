//! Integration tests for the crawler
//!
//! Most tests drive the coordinator with an in-memory page fetcher so every
//! page, failure and delay is deterministic. The last tests use wiremock to
//! run the full crawl cycle over HTTP.

use async_trait::async_trait;
use feedhop::config::{Config, DomainEntry};
use feedhop::crawler::{
    Coordinator, CrawlOutcome, CrawlStatus, Document, FetchError, PageFetcher, SiteResult,
};
use feedhop::seed::{read_seeds, Seed};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

enum StubPage {
    Html { body: String, delay: Duration },
    Fail,
}

/// Page fetcher serving canned documents and counting every fetch
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, StubPage>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl StubFetcher {
    fn page(self, url: &str, body: impl Into<String>) -> Self {
        self.slow_page(url, body, Duration::ZERO)
    }

    fn slow_page(mut self, url: &str, body: impl Into<String>, delay: Duration) -> Self {
        self.pages.insert(
            url.to_string(),
            StubPage::Html {
                body: body.into(),
                delay,
            },
        );
        self
    }

    fn failing(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), StubPage::Fail);
        self
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn fetch_counts(&self) -> HashMap<String, usize> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        match self.pages.get(url) {
            Some(StubPage::Html { body, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(Document::new(Url::parse(url).unwrap(), body.clone()))
            }
            Some(StubPage::Fail) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            None => Err(FetchError::Unreachable {
                url: url.to_string(),
                message: "no stub page".to_string(),
            }),
        }
    }
}

/// A profile page whose bio fields link to `links`
fn profile_page(links: &[&str]) -> String {
    let fields: String = links
        .iter()
        .map(|link| format!(r#"<dl><dt>Web</dt><dd><a href="{}" rel="me">{}</a></dd></dl>"#, link, link))
        .collect();
    format!(
        r#"<html><body>
        <div class="account__header__bio">
            <p>Bio text with <a href="https://x.test/tags/blog">#blog</a></p>
            <div class="account__header__fields">{}</div>
        </div>
        </body></html>"#,
        fields
    )
}

/// A website page advertising `feeds` as (type, href) pairs
fn site_page(feeds: &[(&str, &str)]) -> String {
    let links: String = feeds
        .iter()
        .map(|(mime, href)| format!(r#"<link rel="alternate" type="{}" href="{}">"#, mime, href))
        .collect();
    format!(
        r#"<html><head><title>Site</title>{}</head><body>Hello</body></html>"#,
        links
    )
}

const RSS: &str = "application/rss+xml";
const ATOM: &str = "application/atom+xml";

fn test_config(workers: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_pages_open = workers;
    config
}

async fn crawl(config: Config, fetcher: &Arc<StubFetcher>, seeds: Vec<Seed>) -> CrawlOutcome {
    Coordinator::with_fetcher(config, fetcher.clone())
        .run(seeds)
        .await
}

fn site_urls(outcome: &CrawlOutcome, profile_id: &str) -> Vec<String> {
    let mut urls: Vec<String> = outcome
        .results
        .get(profile_id)
        .unwrap_or_else(|| panic!("no entry for {}", profile_id))
        .iter()
        .map(|site| site.site_url.clone())
        .collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_end_to_end_single_profile() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page("https://x.test/@a", profile_page(&["https://a-site.test"]))
            .page(
                "https://a-site.test",
                site_page(&[
                    (RSS, "https://a-site.test/rss.xml"),
                    (ATOM, "https://a-site.test/atom.xml"),
                ]),
            ),
    );

    let outcome = crawl(
        test_config(4),
        &fetcher,
        vec![Seed::new("a@x.test", "https://x.test/@a")],
    )
    .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(
        outcome.results.get("a@x.test").unwrap(),
        &[SiteResult {
            site_url: "https://a-site.test".to_string(),
            feed_urls: vec![
                "https://a-site.test/rss.xml".to_string(),
                "https://a-site.test/atom.xml".to_string(),
            ],
        }]
    );
    assert_eq!(outcome.stats.profiles_visited, 1);
    assert_eq!(outcome.stats.websites_visited, 1);
    assert_eq!(outcome.stats.feeds_found, 2);
}

#[tokio::test]
async fn test_profile_without_bio_links() {
    let fetcher = Arc::new(StubFetcher::default().page("https://x.test/@a", profile_page(&[])));

    let outcome = crawl(
        test_config(2),
        &fetcher,
        vec![Seed::new("a@x.test", "https://x.test/@a")],
    )
    .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.results.get("a@x.test"), Some(&[][..]));
}

#[tokio::test]
async fn test_website_without_feeds_is_still_recorded() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page("https://x.test/@a", profile_page(&["https://plain.test"]))
            .page("https://plain.test", site_page(&[])),
    );

    let outcome = crawl(
        test_config(2),
        &fetcher,
        vec![Seed::new("a@x.test", "https://x.test/@a")],
    )
    .await;

    assert_eq!(
        outcome.results.get("a@x.test").unwrap(),
        &[SiteResult {
            site_url: "https://plain.test".to_string(),
            feed_urls: vec![],
        }]
    );
}

#[tokio::test]
async fn test_result_keys_match_seed_profiles() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page("https://x.test/@a", profile_page(&["https://a-site.test"]))
            .page("https://a-site.test", site_page(&[(RSS, "/rss.xml")]))
            .failing("https://x.test/@c"),
    );
    let seeds = vec![
        Seed::new("a@x.test", "https://x.test/@a"),
        Seed::new("b@x.test", "https://x.test/@b"),
        Seed::new("c@x.test", "https://x.test/@c"),
        Seed::new("broken", ""),
        Seed::new("a@x.test", "https://x.test/@a"),
    ];
    let expected: HashSet<String> = seeds.iter().map(|s| s.profile_id.clone()).collect();

    let outcome = crawl(test_config(3), &fetcher, seeds).await;

    let keys: HashSet<String> = outcome.results.profile_ids().map(String::from).collect();
    assert_eq!(keys, expected);
    assert_eq!(outcome.status, CrawlStatus::Completed);
}

#[tokio::test]
async fn test_results_keep_seed_order() {
    let fetcher = Arc::new(StubFetcher::default());
    let seeds = vec![
        Seed::new("c@x.test", "https://x.test/@c"),
        Seed::new("a@x.test", "https://x.test/@a"),
        Seed::new("b@x.test", "https://x.test/@b"),
    ];

    let outcome = crawl(test_config(3), &fetcher, seeds).await;

    let ids: Vec<&str> = outcome.results.profile_ids().collect();
    assert_eq!(ids, vec!["c@x.test", "a@x.test", "b@x.test"]);
}

#[tokio::test]
async fn test_no_url_fetched_twice() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(
                "https://x.test/@a",
                profile_page(&["https://shared.test", "https://a-site.test"]),
            )
            .page(
                "https://x.test/@b",
                // Same site written differently, plus a repeated link
                profile_page(&[
                    "https://www.shared.test/",
                    "https://b-site.test",
                    "https://b-site.test",
                ]),
            )
            .page("https://shared.test", site_page(&[(RSS, "/feed")]))
            .page("https://a-site.test", site_page(&[]))
            .page("https://b-site.test", site_page(&[])),
    );
    let seeds = vec![
        Seed::new("a@x.test", "https://x.test/@a"),
        Seed::new("b@x.test", "https://x.test/@b"),
        Seed::new("a@x.test", "https://x.test/@a"),
    ];

    // One worker keeps profile a ahead of b, so a's spelling of the shared site wins
    let outcome = crawl(test_config(1), &fetcher, seeds).await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    for (url, count) in fetcher.fetch_counts() {
        assert_eq!(count, 1, "{} fetched {} times", url, count);
    }
    assert_eq!(fetcher.fetch_count("https://www.shared.test/"), 0);
    assert_eq!(outcome.results.site_count(), 3);
    assert!(outcome.stats.duplicates >= 3);
}

#[tokio::test]
async fn test_sites_attributed_to_linking_profile() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(
                "https://x.test/@a",
                profile_page(&["https://shared.test", "https://a-site.test"]),
            )
            .page(
                "https://x.test/@b",
                profile_page(&["https://shared.test", "https://b-site.test"]),
            )
            .page("https://shared.test", site_page(&[(RSS, "/feed")]))
            .page("https://a-site.test", site_page(&[(ATOM, "/atom")]))
            .page("https://b-site.test", site_page(&[(RSS, "/rss")])),
    );
    let seeds = vec![
        Seed::new("a@x.test", "https://x.test/@a"),
        Seed::new("b@x.test", "https://x.test/@b"),
    ];

    let outcome = crawl(test_config(4), &fetcher, seeds).await;

    let a = site_urls(&outcome, "a@x.test");
    let b = site_urls(&outcome, "b@x.test");

    assert!(a.contains(&"https://a-site.test".to_string()));
    assert!(!a.contains(&"https://b-site.test".to_string()));
    assert!(b.contains(&"https://b-site.test".to_string()));
    assert!(!b.contains(&"https://a-site.test".to_string()));

    // The shared site is visited once and credited to exactly one of its linkers
    let shared = "https://shared.test".to_string();
    assert!(a.contains(&shared) ^ b.contains(&shared));
}

#[tokio::test]
async fn test_rerun_yields_same_results() {
    let fetcher = || {
        Arc::new(
            StubFetcher::default()
                .page(
                    "https://x.test/@a",
                    profile_page(&[
                        "https://one.test",
                        "https://two.test",
                        "https://three.test",
                    ]),
                )
                .page("https://one.test", site_page(&[(RSS, "/rss")]))
                .page("https://two.test", site_page(&[(ATOM, "/atom")]))
                .page("https://three.test", site_page(&[])),
        )
    };
    let seeds = || vec![Seed::new("a@x.test", "https://x.test/@a")];

    let first = crawl(test_config(8), &fetcher(), seeds()).await;
    let second = crawl(test_config(8), &fetcher(), seeds()).await;

    let sorted = |outcome: &CrawlOutcome| {
        let mut sites = outcome.results.get("a@x.test").unwrap().to_vec();
        sites.sort_by(|x, y| x.site_url.cmp(&y.site_url));
        sites
    };
    assert_eq!(sorted(&first), sorted(&second));
    assert_eq!(sorted(&first).len(), 3);
}

#[tokio::test]
async fn test_single_website_failure_is_contained() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(
                "https://x.test/@a",
                profile_page(&["https://ok.test", "https://down.test"]),
            )
            .page("https://x.test/@b", profile_page(&["https://b-site.test"]))
            .page("https://ok.test", site_page(&[(RSS, "/rss")]))
            .failing("https://down.test")
            .page("https://b-site.test", site_page(&[(ATOM, "/atom")])),
    );
    let seeds = vec![
        Seed::new("a@x.test", "https://x.test/@a"),
        Seed::new("b@x.test", "https://x.test/@b"),
    ];

    let outcome = crawl(test_config(4), &fetcher, seeds).await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(site_urls(&outcome, "a@x.test"), vec!["https://ok.test"]);
    assert_eq!(site_urls(&outcome, "b@x.test"), vec!["https://b-site.test"]);
    assert_eq!(outcome.stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_profile_failure_leaves_empty_entry() {
    let fetcher = Arc::new(StubFetcher::default().failing("https://x.test/@a"));

    let outcome = crawl(
        test_config(2),
        &fetcher,
        vec![Seed::new("a@x.test", "https://x.test/@a")],
    )
    .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.results.get("a@x.test"), Some(&[][..]));
    assert_eq!(outcome.stats.fetch_failures, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_website_results_all_kept() {
    let sites: Vec<String> = (0..40).map(|i| format!("https://site{}.test", i)).collect();
    let links: Vec<&str> = sites.iter().map(String::as_str).collect();

    let mut fetcher = StubFetcher::default().page("https://x.test/@a", profile_page(&links));
    for (i, site) in sites.iter().enumerate() {
        fetcher = fetcher.slow_page(
            site,
            site_page(&[(RSS, "/rss")]),
            Duration::from_millis((i % 5) as u64 * 3),
        );
    }
    let fetcher = Arc::new(fetcher);

    let outcome = crawl(
        test_config(16),
        &fetcher,
        vec![Seed::new("a@x.test", "https://x.test/@a")],
    )
    .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.results.get("a@x.test").unwrap().len(), 40);
}

#[tokio::test]
async fn test_malformed_seed_reported() {
    let fetcher = Arc::new(
        StubFetcher::default().page("https://x.test/@a", profile_page(&[])),
    );
    let seeds = vec![
        Seed::new("a@x.test", "https://x.test/@a"),
        Seed::new("not-a-handle", ""),
    ];

    let outcome = crawl(test_config(2), &fetcher, seeds).await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].profile_id, "not-a-handle");
    assert_eq!(outcome.results.get("not-a-handle"), Some(&[][..]));
    assert_eq!(fetcher.fetch_counts().len(), 1);
}

#[tokio::test]
async fn test_queue_overflow_aborts_with_partial_results() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page("https://x.test/@a", profile_page(&["https://a-site.test"]))
            .page("https://a-site.test", site_page(&[(RSS, "/rss")]))
            .slow_page(
                "https://x.test/@b",
                profile_page(&["https://b1.test", "https://b2.test", "https://b3.test"]),
                Duration::from_millis(300),
            ),
    );
    let mut config = test_config(2);
    config.crawler.max_queue_size = 2;
    let seeds = vec![
        Seed::new("a@x.test", "https://x.test/@a"),
        Seed::new("b@x.test", "https://x.test/@b"),
    ];

    let outcome = crawl(config, &fetcher, seeds).await;

    assert!(
        matches!(&outcome.status, CrawlStatus::Aborted { reason } if reason.contains("full")),
        "unexpected status {:?}",
        outcome.status
    );
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(site_urls(&outcome, "a@x.test"), vec!["https://a-site.test"]);
    assert!(site_urls(&outcome, "b@x.test").is_empty());
    for site in ["https://b1.test", "https://b2.test", "https://b3.test"] {
        assert_eq!(fetcher.fetch_count(site), 0);
    }
}

#[tokio::test]
async fn test_cancellation_returns_partial_results() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .slow_page(
                "https://x.test/@a",
                profile_page(&["https://one.test", "https://two.test"]),
                Duration::from_millis(200),
            )
            .page("https://one.test", site_page(&[]))
            .page("https://two.test", site_page(&[])),
    );
    let coordinator = Coordinator::with_fetcher(test_config(1), fetcher.clone());
    let token = coordinator.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let outcome = coordinator
        .run(vec![
            Seed::new("a@x.test", "https://x.test/@a"),
            Seed::new("b@x.test", "https://x.test/@b"),
        ])
        .await;

    assert_eq!(outcome.status, CrawlStatus::Interrupted);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(fetcher.fetch_count("https://x.test/@a"), 1);
    assert_eq!(fetcher.fetch_count("https://one.test"), 0);
}

#[tokio::test]
async fn test_skipped_domains_are_not_fetched() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .page(
                "https://x.test/@a",
                profile_page(&["https://github.com/a", "https://a-site.test"]),
            )
            .page("https://a-site.test", site_page(&[(RSS, "/rss")])),
    );
    let mut config = test_config(2);
    config.skip.push(DomainEntry {
        domain: "github.com".to_string(),
    });

    let outcome = crawl(
        config,
        &fetcher,
        vec![Seed::new("a@x.test", "https://x.test/@a")],
    )
    .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(site_urls(&outcome, "a@x.test"), vec!["https://a-site.test"]);
    assert_eq!(fetcher.fetch_count("https://github.com/a"), 0);
    assert_eq!(outcome.stats.skipped, 1);
}

#[tokio::test]
async fn test_crawl_from_csv_handles() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "Account address,Show boosts").unwrap();
    writeln!(csv, "a@x.test,true").unwrap();
    writeln!(csv, "@b@x.test,false").unwrap();
    writeln!(csv, "nonsense,true").unwrap();
    csv.flush().unwrap();

    let seeds = read_seeds(csv.path()).unwrap();
    let fetcher = Arc::new(
        StubFetcher::default()
            .page("https://x.test/@a", profile_page(&["https://a-site.test"]))
            .page("https://x.test/@b", profile_page(&[]))
            .page("https://a-site.test", site_page(&[(RSS, "/rss.xml")])),
    );

    let outcome = crawl(test_config(2), &fetcher, seeds).await;

    let ids: Vec<&str> = outcome.results.profile_ids().collect();
    assert_eq!(ids, vec!["a@x.test", "b@x.test", "nonsense"]);
    assert_eq!(
        outcome.results.get("a@x.test").unwrap()[0].feed_urls,
        vec!["https://a-site.test/rss.xml"]
    );
    assert_eq!(outcome.warnings.len(), 1);
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html; charset=utf-8")
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_full_crawl_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/@a"))
        .respond_with(html(profile_page(&[
            &format!("{}/blog", base_url),
            &format!("{}/down", base_url),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(html(site_page(&[(RSS, "/blog/rss.xml"), (ATOM, "atom.xml")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.crawler.max_concurrent_pages_open = 2;
    config.crawler.settle_timeout = 5000;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(vec![Seed::new("a@x.test", format!("{}/@a", base_url))])
        .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(
        outcome.results.get("a@x.test").unwrap(),
        &[SiteResult {
            site_url: format!("{}/blog", base_url),
            feed_urls: vec![
                format!("{}/blog/rss.xml", base_url),
                format!("{}/atom.xml", base_url),
            ],
        }]
    );
    assert_eq!(outcome.stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_not_found_site_still_reports_its_feeds() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/@a"))
        .respond_with(html(profile_page(&[&format!("{}/moved", base_url)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(site_page(&[(RSS, "/rss.xml")]), "text/html")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(Config::default()).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(vec![Seed::new("a@x.test", format!("{}/@a", base_url))])
        .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(
        outcome.results.get("a@x.test").unwrap(),
        &[SiteResult {
            site_url: format!("{}/moved", base_url),
            feed_urls: vec![format!("{}/rss.xml", base_url)],
        }]
    );
    assert_eq!(outcome.stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_crawl_over_http_with_non_html_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/@a"))
        .respond_with(html(profile_page(&[&format!("{}/resume.pdf", base_url)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/resume.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let coordinator = Coordinator::new(Config::default()).expect("Failed to create coordinator");
    let outcome = coordinator
        .run(vec![Seed::new("a@x.test", format!("{}/@a", base_url))])
        .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.results.get("a@x.test"), Some(&[][..]));
    assert_eq!(outcome.stats.fetch_failures, 1);
}
