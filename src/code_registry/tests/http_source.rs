mod common;

use std::time::Duration;

use code_registry::{
    CodeRegistry, HtmlTableSource, MappingSource, RegistryError, StaticTable,
    refresh::refresh_static_table,
};
use common::{CODE_PAGE, local_client, serve, serve_silence};

fn source(timeout_ms: u64) -> HtmlTableSource {
    HtmlTableSource::with_client(local_client(Duration::from_millis(timeout_ms)))
}

#[tokio::test]
async fn fetches_and_parses_live_table() {
    let server = serve("200 OK", CODE_PAGE).await;

    let mapping = source(2_000).fetch(&server.url).await.expect("fetch");

    assert_eq!(mapping.len(), 3);
    assert_eq!(mapping.alpha2_for("JA"), Some("JP"));
    assert_eq!(mapping.alpha2_for("GM"), Some("DE"));
    assert_eq!(mapping.legacy_for("IQ"), Some("IZ"));
}

#[tokio::test]
async fn registry_fetches_once_per_url() {
    let server = serve("200 OK", CODE_PAGE).await;
    let registry = CodeRegistry::new(source(2_000), None);

    for _ in 0..3 {
        let m = registry.fetch_mapping(&server.url).await.expect("fetch");
        assert_eq!(m.alpha2_for("IZ"), Some("IQ"));
    }
    assert_eq!(server.hits(), 1);

    registry.invalidate(&server.url);
    registry.fetch_mapping(&server.url).await.expect("refetch");
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn http_error_status_is_source_unavailable() {
    let server = serve("503 Service Unavailable", "try later").await;

    let err = source(2_000).fetch(&server.url).await.unwrap_err();

    match err {
        RegistryError::SourceUnavailable { url, reason } => {
            assert_eq!(url, server.url);
            assert!(reason.contains("503"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn page_without_table_is_source_unavailable() {
    let server = serve("200 OK", "<html><body>We moved!</body></html>").await;

    let err = source(2_000).fetch(&server.url).await.unwrap_err();

    assert!(err.is_source_unavailable());
    assert!(err.to_string().contains("no <table>"));
}

#[tokio::test]
async fn slow_source_times_out_instead_of_hanging() {
    let url = serve_silence().await;

    let err = source(200).fetch(&url).await.unwrap_err();

    assert!(err.is_source_unavailable());
}

#[tokio::test]
async fn refused_connection_is_source_unavailable() {
    // bind then drop to get a port nobody listens on
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{port}/codes");

    let registry = CodeRegistry::new(source(1_000), None);
    let err = registry.fetch_mapping(&url).await.unwrap_err();

    assert!(err.is_source_unavailable());
    assert!(registry.cache().is_empty());
}

#[tokio::test]
async fn refresh_writes_loadable_static_table() {
    let server = serve("200 OK", CODE_PAGE).await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("codes.toml");

    let written = refresh_static_table(&source(2_000), &server.url, &out)
        .await
        .expect("refresh");

    let loaded = StaticTable::from_path(&out).expect("load");
    assert_eq!(loaded, written);
    assert_eq!(loaded.source_url.as_deref(), Some(server.url.as_str()));
    assert_eq!(loaded.entries.len(), 3);
    assert_eq!(loaded.entries[0].name, "Germany");
    assert_eq!(loaded.to_mapping().alpha2_for("JA"), Some("JP"));
}

#[tokio::test]
async fn failed_refresh_writes_nothing() {
    let server = serve("404 Not Found", "gone").await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("codes.toml");

    refresh_static_table(&source(2_000), &server.url, &out)
        .await
        .unwrap_err();

    assert!(!out.exists());
}

const BLANK_CODE_PAGE: &str = "<html><body><table>\
    <tr><th>Country</th><th>FIPS</th><th>ISO</th></tr>\
    <tr><td>Japan</td><td>JA</td><td>JP</td></tr>\
    <tr><td>Nowhere</td><td></td><td>XX</td></tr>\
    </table></body></html>";

#[tokio::test]
async fn blank_legacy_cell_is_source_unavailable() {
    let server = serve("200 OK", BLANK_CODE_PAGE).await;
    let registry = CodeRegistry::new(source(2_000), None);

    let err = registry.fetch_mapping(&server.url).await.unwrap_err();

    assert!(err.is_source_unavailable());
    assert!(err.to_string().contains("row 2 has an empty code"), "{err}");
    assert!(registry.cache().is_empty());
}

#[tokio::test]
async fn refresh_with_blank_code_writes_nothing() {
    let server = serve("200 OK", BLANK_CODE_PAGE).await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("codes.toml");

    let err = refresh_static_table(&source(2_000), &server.url, &out)
        .await
        .unwrap_err();

    assert!(err.is_source_unavailable());
    assert!(!out.exists());
}
