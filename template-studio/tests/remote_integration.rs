//! Remote template store tests against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use template_core::{export_document, Element, ElementType, Page};
use template_studio::{RemoteError, StudioConfig, StudioError, TemplateClient, TemplateStudio};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_pages() -> Vec<Page> {
    let mut page = Page::default();
    page.add_element(Element::new(ElementType::Header, "A", None));
    vec![page, Page::default()]
}

fn studio_for(server: &MockServer) -> TemplateStudio {
    TemplateStudio::new(&StudioConfig {
        api_url: server.uri(),
        ..StudioConfig::default()
    })
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_list_templates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "invoice", "name": "Invoice", "createdAt": "2024-05-01T10:00:00Z", "pages": "[{}]" },
            { "id": "legacy", "pages": "[{}]" }
        ])))
        .mount(&server)
        .await;

    let client = TemplateClient::new(server.uri()).expect("client");
    let records = client.list().await.expect("list");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].display_name(), "Invoice");
    assert_eq!(records[1].display_name(), "legacy");
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_save_posts_serialized_pages() {
    let server = MockServer::start().await;
    let pages = sample_pages();
    let serialized = export_document(&pages).expect("serialize");

    Mock::given(method("POST"))
        .and(path("/templates"))
        .and(body_partial_json(json!({ "id": "Q3 report", "pages": serialized })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TemplateClient::new(server.uri()).expect("client");
    client.save("Q3 report", &pages).await.expect("save");
    assert!(!client.is_saving());
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_concurrent_save_is_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/templates"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    let client = TemplateClient::new(server.uri()).expect("client");
    let pages = sample_pages();
    let (first, second) = futures::join!(client.save("a", &pages), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.save("b", &pages).await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(RemoteError::Busy("save"))));
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_server_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/templates/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = TemplateClient::new(server.uri()).expect("client");
    let err = client.delete("missing").await.expect_err("404");

    match err {
        RemoteError::OperationFailed { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!client.is_deleting());
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_studio_load_replaces_document() {
    let server = MockServer::start().await;
    let pages = sample_pages();
    Mock::given(method("GET"))
        .and(path("/templates/invoice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "invoice",
            "name": "invoice",
            "pages": export_document(&pages).expect("serialize"),
        })))
        .mount(&server)
        .await;

    let mut studio = studio_for(&server);
    studio.add_page();
    studio.load_from_server("invoice").await.expect("load");

    assert_eq!(studio.pages(), pages.as_slice());
    assert_eq!(studio.current_page_index(), 0);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_studio_load_rejects_corrupt_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "broken",
            "pages": "{\"not\": \"pages\"}",
        })))
        .mount(&server)
        .await;

    let mut studio = studio_for(&server);
    studio.add_page();
    let before = studio.pages().to_vec();

    let result = studio.load_from_server("broken").await;

    assert!(matches!(
        result,
        Err(StudioError::Remote(RemoteError::Decode(_)))
    ));
    assert_eq!(studio.pages(), before.as_slice());
    let notices = studio.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Server error");
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_studio_save_and_delete_notices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/templates"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/templates/report"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let mut studio = studio_for(&server);
    studio.save_to_server(" report ").await.expect("save");
    studio.delete_template("report").await.expect("delete");

    let titles: Vec<String> = studio.drain_notices().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Template saved", "Template deleted"]);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_unreachable_server() {
    let client = TemplateClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2))
        .expect("client");
    assert!(matches!(
        client.check().await,
        Err(RemoteError::Unavailable(_))
    ));
}
