use chrono::{DateTime, TimeZone, Utc};
use async_trait::async_trait;
use ladder_harvest::api::{AuthTransport, HttpTransport, RiotApi, Transport};
use ladder_harvest::config::ApiConfig;
use ladder_harvest::shutdown::{self, Shutdown, ShutdownTrigger};
use ladder_harvest::storage::{FileStore, MatchStore, SqliteStore, StorageError, StorageResult};
use ladder_harvest::{Collector, HarvestError, MatchId, MatchRecord};
use reqwest::{Request, Response};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";
const LADDER_PATH: &str = "/lol/league/v4/entries/RANKED_SOLO_5x5/SILVER/I";

type TestApi = RiotApi<AuthTransport<HttpTransport>>;

fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Creates an API client pointing both routing hosts at the mock server
fn create_test_api(server: &MockServer) -> TestApi {
    let config = ApiConfig {
        platform_url: server.uri(),
        regional_url: server.uri(),
        timeout_secs: 5,
        ..ApiConfig::default()
    };
    let http = HttpTransport::new(&config).expect("Failed to build http transport");
    let auth = AuthTransport::new(TOKEN, http).expect("Failed to build auth transport");
    RiotApi::new(auth, &config).expect("Failed to build api client")
}

fn entry(summoner_id: &str) -> serde_json::Value {
    json!({
        "leagueId": "league-1",
        "queueType": "RANKED_SOLO_5x5",
        "tier": "SILVER",
        "rank": "I",
        "summonerId": summoner_id,
        "leaguePoints": 50
    })
}

fn match_body(id: &str) -> String {
    format!(r#"{{"metadata":{{"matchId":"{}"}},"info":{{"gameMode":"CLASSIC"}}}}"#, id)
}

async fn mount_page(server: &MockServer, page: u32, entries: serde_json::Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path(LADDER_PATH))
        .and(query_param("page", page.to_string()))
        .and(header("X-Riot-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_summoner(server: &MockServer, summoner_id: &str, puuid: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/lol/summoner/v4/summoners/{}", summoner_id)))
        .and(header("X-Riot-Token", TOKEN))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": summoner_id, "puuid": puuid, "summonerLevel": 100 })),
        )
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_match_ids(server: &MockServer, puuid: &str, ids: &[&str], calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/lol/match/v5/matches/by-puuid/{}/ids", puuid)))
        .and(query_param("type", "ranked"))
        .and(query_param("count", "10"))
        .and(query_param("startTime", start_time().timestamp().to_string()))
        .and(header("X-Riot-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(ids)))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_match(server: &MockServer, id: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/lol/match/v5/matches/{}", id)))
        .and(header("X-Riot-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string(match_body(id)))
        .expect(calls)
        .mount(server)
        .await;
}

fn record(id: &str) -> MatchRecord {
    MatchRecord::from(match_body(id).into_bytes())
}

#[tokio::test]
async fn test_run_stops_at_first_empty_page() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a")]), 1).await;
    mount_page(&server, 2, json!([entry("sid-b")]), 1).await;
    mount_page(&server, 3, json!([]), 1).await;
    mount_page(&server, 4, json!([]), 0).await;
    mount_summoner(&server, "sid-a", "puuid-a", 1).await;
    mount_summoner(&server, "sid-b", "puuid-b", 1).await;
    mount_match_ids(&server, "puuid-a", &[], 1).await;
    mount_match_ids(&server, "puuid-b", &[], 1).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );

    let stats = collector.run().await.expect("Collection failed");

    assert_eq!(stats.pages, 3);
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.matches_stored, 0);
}

#[tokio::test]
async fn test_empty_first_page_succeeds() {
    let server = MockServer::start().await;
    mount_page(&server, 1, json!([]), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );

    let stats = collector.run().await.expect("Collection failed");
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.entries, 0);
}

#[tokio::test]
async fn test_stored_matches_are_skipped_and_shared_match_fetched_once() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a"), entry("sid-b")]), 1).await;
    mount_page(&server, 2, json!([]), 1).await;
    mount_summoner(&server, "sid-a", "puuid-a", 1).await;
    mount_summoner(&server, "sid-b", "puuid-b", 1).await;
    mount_match_ids(&server, "puuid-a", &["JP1_1", "JP1_2"], 1).await;
    mount_match_ids(&server, "puuid-b", &["JP1_2"], 1).await;
    mount_match(&server, "JP1_1", 0).await;
    mount_match(&server, "JP1_2", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    store
        .put(&MatchId::from("JP1_1"), &MatchRecord::from(b"{}".to_vec()))
        .unwrap();

    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );
    let stats = collector.run().await.expect("Collection failed");

    assert_eq!(stats.matches_listed, 3);
    assert_eq!(stats.matches_skipped, 2);
    assert_eq!(stats.matches_stored, 1);

    let stored = std::fs::read_to_string(dir.path().join("JP1_2.json")).unwrap();
    assert_eq!(stored, match_body("JP1_2"));

    // the pre-existing record is left untouched
    let untouched = std::fs::read_to_string(dir.path().join("JP1_1.json")).unwrap();
    assert_eq!(untouched, "{}");
    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_second_run_fetches_nothing() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a")]), 2).await;
    mount_page(&server, 2, json!([]), 2).await;
    mount_summoner(&server, "sid-a", "puuid-a", 2).await;
    mount_match_ids(&server, "puuid-a", &["JP1_10", "JP1_11"], 2).await;
    mount_match(&server, "JP1_10", 1).await;
    mount_match(&server, "JP1_11", 1).await;

    let dir = tempfile::tempdir().unwrap();

    let first = {
        let store = FileStore::open(dir.path()).unwrap();
        let mut collector =
            Collector::new(create_test_api(&server), store, start_time(), Shutdown::never());
        collector.run().await.expect("First run failed")
    };
    assert_eq!(first.matches_stored, 2);

    let store = FileStore::open(dir.path()).unwrap();
    let mut collector =
        Collector::new(create_test_api(&server), store, start_time(), Shutdown::never());
    let second = collector.run().await.expect("Second run failed");

    assert_eq!(second.matches_stored, 0);
    assert_eq!(second.matches_skipped, 2);
    assert_eq!(collector.into_store().count().unwrap(), 2);
}

#[tokio::test]
async fn test_rate_limited_lookup_aborts_run() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a"), entry("sid-b")]), 1).await;
    mount_page(&server, 2, json!([]), 0).await;
    Mock::given(method("GET"))
        .and(path("/lol/summoner/v4/summoners/sid-a"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "10")
                .set_body_string(r#"{"status":{"message":"Rate limit exceeded","status_code":429}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_summoner(&server, "sid-b", "puuid-b", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );

    let err = collector.run().await.expect_err("Run should fail");

    assert_eq!(err.status(), Some(429));
    assert!(matches!(err, HarvestError::Page { page: 1, .. }));
    let message = err.to_string();
    assert!(message.contains("sid-a"), "missing entry context: {}", message);
    assert!(
        message.contains("Rate limit exceeded"),
        "missing response dump: {}",
        message
    );
}

#[tokio::test]
async fn test_server_error_on_ladder_aborts_run() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a")]), 1).await;
    mount_summoner(&server, "sid-a", "puuid-a", 1).await;
    mount_match_ids(&server, "puuid-a", &[], 1).await;
    Mock::given(method("GET"))
        .and(path(LADDER_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, 3, json!([]), 0).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );

    let err = collector.run().await.expect_err("Run should fail");

    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, HarvestError::Page { page: 2, .. }));
    assert!(err.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn test_match_fetch_error_aborts_before_next_match() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a"), entry("sid-b")]), 1).await;
    mount_summoner(&server, "sid-a", "puuid-a", 1).await;
    mount_summoner(&server, "sid-b", "puuid-b", 0).await;
    mount_match_ids(&server, "puuid-a", &["JP1_1", "JP1_2"], 1).await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/JP1_1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Data not found"))
        .expect(1)
        .mount(&server)
        .await;
    mount_match(&server, "JP1_2", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );

    let err = collector.run().await.expect_err("Run should fail");
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("JP1_1"));
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_undecodable_summoner_is_fatal() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a")]), 1).await;
    Mock::given(method("GET"))
        .and(path("/lol/summoner/v4/summoners/sid-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );

    let err = collector.run().await.expect_err("Run should fail");
    assert!(matches!(
        err.root(),
        HarvestError::Decode {
            operation: "get summoner",
            ..
        }
    ));
}

/// Store whose writes always fail
#[derive(Default)]
struct FailingStore {
    puts: usize,
}

impl MatchStore for FailingStore {
    fn exists(&self, _id: &MatchId) -> StorageResult<bool> {
        Ok(false)
    }

    fn put(&mut self, _id: &MatchId, _record: &MatchRecord) -> StorageResult<()> {
        self.puts += 1;
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only output",
        )))
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_storage_failure_aborts_run() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a"), entry("sid-b")]), 1).await;
    mount_summoner(&server, "sid-a", "puuid-a", 1).await;
    mount_summoner(&server, "sid-b", "puuid-b", 0).await;
    mount_match_ids(&server, "puuid-a", &["JP1_1", "JP1_2"], 1).await;
    mount_match(&server, "JP1_1", 1).await;
    mount_match(&server, "JP1_2", 0).await;

    let mut store = FailingStore::default();
    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );

    let err = collector.run().await.expect_err("Run should fail");
    assert!(matches!(err.root(), HarvestError::Storage(StorageError::Io(_))));
    assert!(err.to_string().contains("JP1_1"));
    assert_eq!(store.puts, 1);
}

#[tokio::test]
async fn test_sqlite_store_deduplicates() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a")]), 1).await;
    mount_page(&server, 2, json!([]), 1).await;
    mount_summoner(&server, "sid-a", "puuid-a", 1).await;
    mount_match_ids(&server, "puuid-a", &["JP1_7", "JP1_8"], 1).await;
    mount_match(&server, "JP1_7", 0).await;
    mount_match(&server, "JP1_8", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::new(&dir.path().join("matches.db")).unwrap();
    store.put(&MatchId::from("JP1_7"), &record("JP1_7")).unwrap();

    let mut collector = Collector::new(
        create_test_api(&server),
        &mut store,
        start_time(),
        Shutdown::never(),
    );
    let stats = collector.run().await.expect("Collection failed");

    assert_eq!(stats.matches_stored, 1);
    assert_eq!(
        store.get(&MatchId::from("JP1_8")).unwrap(),
        Some(match_body("JP1_8").into_bytes())
    );
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let server = MockServer::start().await;
    mount_page(&server, 1, json!([entry("sid-a")]), 0).await;

    let (trigger, shutdown) = shutdown::channel();
    trigger.trigger();

    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut collector = Collector::new(create_test_api(&server), store, start_time(), shutdown);

    let err = collector.run().await.expect_err("Run should be cancelled");
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_cancellation_interrupts_in_flight_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LADDER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let (trigger, shutdown) = shutdown::channel();
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    let config = ApiConfig {
        platform_url: server.uri(),
        regional_url: server.uri(),
        timeout_secs: 60,
        ..ApiConfig::default()
    };
    let http = HttpTransport::new(&config).unwrap();
    let api = RiotApi::new(AuthTransport::new(TOKEN, http).unwrap(), &config).unwrap();
    let mut collector = Collector::new(api, store, start_time(), shutdown);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.trigger();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), collector.run())
        .await
        .expect("Cancellation should return promptly");

    let err = result.expect_err("Run should be cancelled");
    assert!(err.is_cancelled());
    assert!(matches!(err, HarvestError::Page { page: 1, .. }));
}

/// Transport that fires the shutdown trigger once a match document has been received
struct CancelAfterMatchFetch<T> {
    inner: T,
    trigger: ShutdownTrigger,
}

#[async_trait]
impl<T: Transport> Transport for CancelAfterMatchFetch<T> {
    async fn send(&self, request: Request) -> reqwest::Result<Response> {
        let is_match_fetch = request.url().path().starts_with("/lol/match/v5/matches/")
            && !request.url().path().contains("/by-puuid/");
        let response = self.inner.send(request).await;
        if is_match_fetch {
            self.trigger.trigger();
        }
        response
    }
}

/// File store that counts writes
struct CountingStore {
    inner: FileStore,
    puts: usize,
}

impl MatchStore for CountingStore {
    fn exists(&self, id: &MatchId) -> StorageResult<bool> {
        self.inner.exists(id)
    }

    fn put(&mut self, id: &MatchId, record: &MatchRecord) -> StorageResult<()> {
        self.puts += 1;
        self.inner.put(id, record)
    }

    fn count(&self) -> StorageResult<u64> {
        self.inner.count()
    }
}

#[tokio::test]
async fn test_cancellation_after_fetch_stores_nothing() {
    let server = MockServer::start().await;

    mount_page(&server, 1, json!([entry("sid-a")]), 1).await;
    mount_summoner(&server, "sid-a", "puuid-a", 1).await;
    mount_match_ids(&server, "puuid-a", &["JP1_20", "JP1_21"], 1).await;
    mount_match(&server, "JP1_20", 1).await;
    mount_match(&server, "JP1_21", 0).await;

    let config = ApiConfig {
        platform_url: server.uri(),
        regional_url: server.uri(),
        timeout_secs: 5,
        ..ApiConfig::default()
    };
    let (trigger, shutdown) = shutdown::channel();
    let http = HttpTransport::new(&config).unwrap();
    let transport = CancelAfterMatchFetch {
        inner: AuthTransport::new(TOKEN, http).unwrap(),
        trigger,
    };
    let api = RiotApi::new(transport, &config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut store = CountingStore {
        inner: FileStore::open(dir.path()).unwrap(),
        puts: 0,
    };
    let mut collector = Collector::new(api, &mut store, start_time(), shutdown);

    let err = collector.run().await.expect_err("Run should be cancelled");

    assert!(err.is_cancelled());
    assert!(err.to_string().contains("JP1_20"));
    assert_eq!(store.puts, 0);
    assert_eq!(store.count().unwrap(), 0);
    assert!(!dir.path().join("JP1_20.json").exists());
}
