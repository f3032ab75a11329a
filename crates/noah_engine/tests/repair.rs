use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use noah_engine::{
    run_repair, ApiError, CandidateItem, ClientSettings, FailureKind, FilePage, LibraryApi,
    LookupData, MetaUpdate, ReqwestClient, SkipReason, ThumbAttachment,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type LookupReply = Result<Option<LookupData>, ApiError>;

#[derive(Default)]
struct FakeLibrary {
    lookups: HashMap<String, LookupReply>,
    calls: Mutex<Vec<String>>,
    updates: Mutex<Vec<MetaUpdate>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeLibrary {
    fn with_lookup(mut self, code: &str, reply: LookupReply) -> Self {
        self.lookups.insert(code.to_string(), reply);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn updates(&self) -> Vec<MetaUpdate> {
        self.updates.lock().unwrap().clone()
    }

    async fn track(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl LibraryApi for FakeLibrary {
    async fn list_files(&self, _page: u32, _size: u32) -> Result<FilePage, ApiError> {
        unreachable!("the sweep never lists")
    }

    async fn lookup(&self, code: &str) -> Result<Option<LookupData>, ApiError> {
        self.track(format!("lookup {code}")).await;
        self.lookups.get(code).cloned().unwrap_or(Ok(None))
    }

    async fn fetch_image(&self, url: &str) -> Result<ThumbAttachment, ApiError> {
        self.track(format!("image {url}")).await;
        Ok(ThumbAttachment {
            file_name: "cover.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            bytes: bytes::Bytes::from_static(b"jpeg"),
        })
    }

    async fn update_meta(&self, update: MetaUpdate) -> Result<(), ApiError> {
        self.track(format!("update {}", update.file_hash)).await;
        self.updates.lock().unwrap().push(update);
        Ok(())
    }
}

fn item(hash: &str, name: &str, tags: &[&str]) -> CandidateItem {
    CandidateItem {
        file_hash: hash.to_string(),
        file_name: name.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
    }
}

fn found(tags: &[&str], thumbnail: &str) -> LookupReply {
    Ok(Some(LookupData {
        title: Some("Work".to_string()),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        thumbnail: thumbnail.to_string(),
    }))
}

fn network_error() -> ApiError {
    ApiError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    }
}

#[tokio::test]
async fn only_untagged_items_with_an_id_are_attempted() {
    let api = FakeLibrary::default();
    let items = vec![
        item("a", "[RJ111111] A.zip", &[]),
        item("b", "[RJ222222] B.zip", &["voice"]),
        item("c", "holiday.mp4", &[]),
    ];

    let summary = run_repair(&api, &items).await;

    assert_eq!(api.calls(), vec!["lookup RJ111111".to_string()]);
    assert_eq!(summary.attempted, 1);
    assert!(summary.repaired.is_empty());
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].file_hash, "a");
    assert_eq!(summary.skipped[0].reason, SkipReason::NotFound);
}

#[tokio::test]
async fn failures_are_contained_per_item() {
    let api = FakeLibrary::default()
        .with_lookup("RJ111111", Err(network_error()))
        .with_lookup("RJ333333", found(&["rpg"], ""));
    let items = vec![
        item("a", "RJ111111.zip", &[]),
        item("b", "RJ222222.zip", &[]),
        item("c", "RJ333333.zip", &[]),
    ];

    let summary = run_repair(&api, &items).await;

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.repaired, vec!["c".to_string()]);
    let reasons: Vec<_> = summary
        .skipped
        .iter()
        .map(|skip| (skip.file_hash.as_str(), skip.reason.clone()))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("a", SkipReason::Lookup(network_error())),
            ("b", SkipReason::NotFound),
        ]
    );
}

#[tokio::test]
async fn successful_repair_keeps_name_and_replaces_tags_and_thumbnail() {
    let api = FakeLibrary::default().with_lookup(
        "RJ01169914",
        found(&["voice", "asmr"], "https://img.example/cover.jpg"),
    );
    let items = vec![item("h1", "RJ01169914 original name.zip", &[])];

    let summary = run_repair(&api, &items).await;

    assert_eq!(summary.repaired, vec!["h1".to_string()]);
    assert_eq!(
        api.calls(),
        vec![
            "lookup RJ01169914".to_string(),
            "image https://img.example/cover.jpg".to_string(),
            "update h1".to_string(),
        ]
    );
    let updates = api.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].file_name, "RJ01169914 original name.zip");
    assert_eq!(
        updates[0].tags,
        vec!["voice".to_string(), "asmr".to_string()]
    );
    assert_eq!(
        updates[0].thumb.as_ref().map(|thumb| thumb.file_name.as_str()),
        Some("cover.jpg")
    );
}

#[tokio::test]
async fn sweep_is_strictly_sequential() {
    let api = FakeLibrary::default()
        .with_lookup("RJ111111", found(&["a"], "https://img/1.jpg"))
        .with_lookup("RJ222222", found(&["b"], "https://img/2.jpg"));
    let items = vec![
        item("a", "RJ111111.zip", &[]),
        item("b", "RJ222222.zip", &[]),
    ];

    run_repair(&api, &items).await;

    assert_eq!(api.peak.load(Ordering::SeqCst), 1);
    assert_eq!(api.calls().len(), 6);
}

#[tokio::test]
async fn rerunning_over_repaired_items_is_a_no_op() {
    let api = FakeLibrary::default().with_lookup("RJ111111", found(&["voice"], ""));
    let mut items = vec![item("a", "RJ111111.zip", &[])];

    let first = run_repair(&api, &items).await;
    assert_eq!(first.repaired, vec!["a".to_string()]);

    // Reflect the server-side change the way a refreshed listing would.
    for update in api.updates() {
        if let Some(entry) = items.iter_mut().find(|i| i.file_hash == update.file_hash) {
            entry.tags = update.tags.clone();
        }
    }
    let calls_before = api.calls().len();

    let second = run_repair(&api, &items).await;
    assert_eq!(second.attempted, 0);
    assert_eq!(api.calls().len(), calls_before);
    assert_eq!(api.updates().len(), 1);
}

#[tokio::test]
async fn sweep_against_http_collaborators() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch-rj-info"))
        .and(query_param("rj_code", "RJ123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "title": "Title",
                "tags": ["voice", "fantasy"],
                "thumbnail": format!("{}/images/RJ123456_img_main.jpg", server.uri())
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/RJ123456_img_main.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"jpeg-data".to_vec(), "image/jpeg"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/files/meta"))
        .and(body_string_contains("name=\"file_hash\""))
        .and(body_string_contains("hash-1"))
        .and(body_string_contains("[RJ123456] keep me.zip"))
        .and(body_string_contains("fantasy"))
        .and(body_string_contains("filename=\"RJ123456_img_main.jpg\""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .unwrap();
    let items = vec![item("hash-1", "[RJ123456] keep me.zip", &[])];

    let summary = run_repair(&client, &items).await;

    assert_eq!(summary.repaired, vec!["hash-1".to_string()]);
    assert!(summary.skipped.is_empty());
}

#[tokio::test]
async fn failing_update_is_skipped_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch-rj-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "tags": ["x"], "thumbnail": "" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/files/meta"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ReqwestClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .unwrap();
    let items = vec![
        item("h1", "RJ111111.zip", &[]),
        item("h2", "RJ222222.zip", &[]),
    ];

    let summary = run_repair(&client, &items).await;

    assert_eq!(summary.attempted, 2);
    assert!(summary.repaired.is_empty());
    assert!(summary.skipped.iter().all(|skip| matches!(
        &skip.reason,
        SkipReason::Update(err) if err.kind == FailureKind::HttpStatus(500)
    )));
}
