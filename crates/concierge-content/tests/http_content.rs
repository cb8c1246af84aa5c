//! Loading content over HTTP against a mock server.

use std::sync::Arc;
use std::time::Duration;

use concierge_content::{ContentError, ContentKind, ContentSource, ContentStore, HttpContentSource, LoadState};
use concierge_core::{Language, NodeKey};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer) -> HttpContentSource {
    HttpContentSource::new(format!("{}/data", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetches_language_specific_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/programs.en.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"name":"ESL Circle","description":"Practice","expired":"no","news":"yes"}]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let body = source(&server)
        .fetch(ContentKind::Programs, Language::En)
        .await
        .unwrap();
    assert!(body.contains("ESL Circle"));
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = source(&server).fetch(ContentKind::Events, Language::Vi).await;
    assert!(matches!(result, Err(ContentError::NotFound(url)) if url.ends_with("/data/events.json")));
}

#[tokio::test]
async fn server_error_is_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = source(&server).fetch(ContentKind::Strings, Language::En).await;
    assert!(matches!(result, Err(ContentError::Status { status: 503, .. })));
}

#[tokio::test]
async fn store_degrades_to_empty_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = ContentStore::new(Arc::new(source(&server)));
    store.load(Language::En).await;

    assert_eq!(store.programs_state(Language::En), LoadState::Ready);
    assert!(store.get_programs(Language::En).is_empty());
    // Built-in strings still render the menu
    assert_eq!(store.get_string("helpQuestion", Language::En), "What can I help you with?");
    assert_eq!(store.get_menu_options(NodeKey::Root, Language::En).len(), 12);
}

#[tokio::test]
async fn store_uses_remote_strings_and_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/strings.vi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"helpQuestion":"Xin chào?"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/programs.vi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"name":"Lớp tiếng Anh","description":"Học","expired":"no","news":"yes"}]"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/events.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"name":"Tết","description":"Lễ hội","date":"2026-02-17","capacity":120}]"#,
        ))
        .mount(&server)
        .await;

    let store = ContentStore::new(Arc::new(source(&server)));
    store.load(Language::Vi).await;

    assert_eq!(store.get_string("helpQuestion", Language::Vi), "Xin chào?");
    assert_eq!(
        store.get_menu_options(NodeKey::Programs, Language::Vi),
        vec!["Lớp tiếng Anh".to_string(), store.get_string("morePrograms", Language::Vi)]
    );
    let events = store.get_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].capacity.as_deref(), Some("120"));
}
