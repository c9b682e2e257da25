use crate::common::{TestApp, routes};

#[tokio::test]
async fn stats_on_an_empty_store() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::STATS).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["totalFirmwareFiles"], 0);
    assert_eq!(res.body["totalDownloads"], 0);
    assert!(res.body["lastUpdate"].is_null());
    assert!(res.body["lastDownload"].is_null());
    assert_eq!(res.body["diskSpaceUsed"], "0 Bytes");
    assert!(res.body["serverUptime"].as_str().unwrap().ends_with('s'));
}

#[tokio::test]
async fn downloads_are_counted_with_caller() {
    let app = TestApp::spawn().await;
    app.upload_ok("build.bin", vec![0u8; 1024]).await;

    app.download_as(routes::LEGACY_LATEST, "ESP32-http-Update").await;
    app.download_as(routes::LATEST, "curl/8.0").await;

    let stats = app.get(routes::LEGACY_STATS).await;
    assert_eq!(stats.status, 200);
    assert_eq!(stats.body["totalFirmwareFiles"], 1);
    assert_eq!(stats.body["totalDownloads"], 2);
    assert!(stats.body["lastUpdate"].is_string());
    assert!(stats.body["lastDownload"].is_string());
    // Stored file plus latest.bin.
    assert_eq!(stats.body["diskSpaceUsed"], "2 KB");

    let history = app.get(routes::DOWNLOADS).await;
    assert_eq!(history.status, 200);
    assert_eq!(history.body["total"], 2);
    let downloads = history.body["downloads"].as_array().unwrap();
    assert_eq!(downloads[0]["callerTag"], "curl/8.0");
    assert_eq!(downloads[1]["callerTag"], "ESP32-http-Update");
    assert_eq!(downloads[0]["artifactId"], "latest.bin");
    assert_eq!(downloads[0]["sizeBytes"], 1024);
}

#[tokio::test]
async fn failed_downloads_are_not_counted() {
    let app = TestApp::spawn().await;

    app.get(routes::LATEST).await;
    app.get(&routes::artifact("firmware-missing.bin")).await;
    app.get(&routes::artifact("bad.txt")).await;

    let stats = app.get(routes::STATS).await;
    assert_eq!(stats.body["totalDownloads"], 0);
    let history = app.get(routes::DOWNLOADS).await;
    assert_eq!(history.body["total"], 0);
}

#[tokio::test]
async fn download_ledger_is_written_to_disk() {
    let app = TestApp::spawn().await;
    app.upload_ok("build.bin", vec![1u8; 10]).await;
    app.download(routes::LATEST).await;

    let ledger = std::fs::read_to_string(app.dir.path().join("data/stats.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&ledger).unwrap();
    assert_eq!(doc["totalDownloads"], 1);
    assert_eq!(doc["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn server_config_reports_firmware_url() {
    let app = TestApp::spawn_with_max_size(4096).await;

    let res = app.get(routes::SERVER_CONFIG).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["host"], "127.0.0.1");
    assert_eq!(
        res.body["firmwareUrl"],
        "http://ota.test:8080/api/firmware/latest.bin"
    );
    assert_eq!(res.body["maxUploadSize"], 4096);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::OPENAPI).await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v1/artifacts/{id}"));
    assert!(paths.contains_key("/api/v1/stats/downloads"));
    assert!(paths.keys().any(|p| p.starts_with("/api/v1/server-config")));
}
