//! Contract tests for the HTTP existence probe and the history stage
//! running against a live (mock) server.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | HEAD | `/standards/history/{shortName}` | `probe_*`, `pipeline_*` |

use chrono::NaiveDate;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use specmeta_core::{
    DocumentContext, EngineSettings, ExistenceProbe, HttpProbe, ProbeError, RawConfig,
    ResolutionPipeline, VersionLink,
};

fn target(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{route}", server.uri())).unwrap()
}

#[tokio::test]
async fn probe_returns_url_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/standards/history/s"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let probe = HttpProbe::new(None).unwrap();
    let url = target(&server, "/standards/history/s");
    let found = probe.probe(&url).await.unwrap();
    assert_eq!(found, url);
}

#[tokio::test]
async fn probe_reports_missing_page() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/standards/history/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(Some(Duration::from_secs(5))).unwrap();
    let err = probe
        .probe(&target(&server, "/standards/history/missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Status { status: 404, .. }));
}

#[tokio::test]
async fn probe_follows_redirects() {
    let server = MockServer::start().await;
    let moved = format!("{}/standards/history/renamed", server.uri());
    Mock::given(method("HEAD"))
        .and(path("/standards/history/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", moved.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/standards/history/renamed"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(None).unwrap();
    let found = probe.probe(&target(&server, "/standards/history/old")).await.unwrap();
    assert_eq!(found.as_str(), moved);
}

#[tokio::test]
async fn pipeline_adopts_probed_history() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/standards/history/example-spec"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let settings = EngineSettings {
        history_base: format!("{}/standards/history/", server.uri()),
        probe_timeout_secs: Some(5),
        ..EngineSettings::default()
    };
    let pipeline = ResolutionPipeline::with_http_probe(&settings).unwrap();
    let raw: RawConfig = serde_json::from_value(json!({
        "specStatus": "WD",
        "shortName": "example-spec",
        "github": "w3c/example-spec",
        "editors": [{ "name": "Ada", "w3cid": 1 }],
    }))
    .unwrap();
    let context = DocumentContext::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());

    let resolution = pipeline.resolve(&raw, &context).await;
    assert_eq!(
        resolution.config.versions.history_uri,
        VersionLink::Url(format!("{}/standards/history/example-spec", server.uri()))
    );
    assert!(resolution.is_valid(), "{:?}", resolution.diagnostics);
}

#[tokio::test]
async fn pipeline_omits_history_when_server_says_no() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/standards/history/example-spec"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let settings = EngineSettings {
        history_base: format!("{}/standards/history", server.uri()),
        ..EngineSettings::default()
    };
    let pipeline = ResolutionPipeline::with_http_probe(&settings).unwrap();
    let raw: RawConfig = serde_json::from_value(json!({
        "specStatus": "REC",
        "shortName": "example-spec",
    }))
    .unwrap();
    let context = DocumentContext::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());

    let resolution = pipeline.resolve(&raw, &context).await;
    assert!(resolution.config.versions.history_uri.is_absent());
    assert!(!resolution.diagnostics.iter().any(|d| d.rule == "history"));
}
