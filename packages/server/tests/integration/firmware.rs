use crate::common::{TestApp, routes};

fn blob(tag: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| tag.wrapping_add(i as u8)).collect()
}

#[tokio::test]
async fn upload_stores_and_promotes_firmware() {
    let app = TestApp::spawn().await;
    let bytes = blob(7, 2048);

    let res = app.upload("build.bin", bytes.clone()).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["message"], "Firmware uploaded successfully");
    assert_eq!(res.body["size"], 2048);
    let id = res.body["id"].as_str().unwrap();
    assert!(id.starts_with("firmware-"), "unexpected id {id}");
    assert!(id.ends_with(".bin"));
    assert!(res.body["createdAt"].is_string());

    let on_disk = std::fs::read(app.firmware_dir().join(id)).unwrap();
    assert_eq!(on_disk, bytes);
    let latest = std::fs::read(app.firmware_dir().join("latest.bin")).unwrap();
    assert_eq!(latest, bytes);
}

#[tokio::test]
async fn upload_without_firmware_field_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .upload_field(routes::ARTIFACTS, "other", "build.bin", blob(1, 16))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    assert_eq!(res.body["message"], "No firmware file provided");
}

#[tokio::test]
async fn upload_with_wrong_extension_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app.upload("build.hex", blob(1, 16)).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    let list = app.get(routes::ARTIFACTS).await;
    assert_eq!(list.body["total"], 0);
}

#[tokio::test]
async fn oversize_upload_leaves_latest_untouched() {
    let app = TestApp::spawn_with_max_size(1024).await;
    let first = blob(3, 512);
    app.upload_ok("small.bin", first.clone()).await;

    let res = app.upload("big.bin", blob(9, 4096)).await;

    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.code(), "FILE_TOO_LARGE");

    let latest = app.download(routes::LATEST).await;
    assert_eq!(latest.status, 200);
    assert_eq!(latest.bytes, first);

    let list = app.get(routes::ARTIFACTS).await;
    assert_eq!(list.body["total"], 1);
}

#[tokio::test]
async fn latest_download_carries_binary_headers() {
    let app = TestApp::spawn().await;
    let bytes = blob(5, 1000);
    app.upload_ok("build.bin", bytes.clone()).await;

    let res = app.download(routes::LATEST).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, bytes);
    assert_eq!(res.headers["content-type"], "application/octet-stream");
    assert_eq!(res.headers["content-length"], "1000");
    assert_eq!(
        res.headers["content-disposition"],
        "attachment; filename=\"latest.bin\""
    );
    assert_eq!(
        res.headers["cache-control"],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(res.headers["pragma"], "no-cache");
    assert_eq!(res.headers["expires"], "0");
}

#[tokio::test]
async fn legacy_latest_url_serves_the_same_bytes() {
    let app = TestApp::spawn().await;
    let bytes = blob(11, 300);
    app.upload_ok("build.bin", bytes.clone()).await;

    let res = app.download_as(routes::LEGACY_LATEST, "ESP32-http-Update").await;

    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, bytes);
}

#[tokio::test]
async fn legacy_upload_route_accepts_firmware() {
    let app = TestApp::spawn().await;

    let res = app
        .upload_field(routes::LEGACY_UPLOAD, "firmware", "build.bin", blob(2, 64))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    let list = app.get(routes::LEGACY_LIST).await;
    assert_eq!(list.status, 200);
    assert_eq!(list.body["total"], 1);
}

#[tokio::test]
async fn listing_flags_only_the_promoted_file() {
    let app = TestApp::spawn().await;
    let a = blob(1, 100);
    let b = blob(2, 200);
    let id_a = app.upload_ok("a.bin", a).await;
    let id_b = app.upload_ok("b.bin", b.clone()).await;

    let res = app.get(routes::ARTIFACTS).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["total"], 2);
    assert_eq!(res.body["message"], "Found 2 firmware file(s)");
    let files = res.body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["name"], id_b.as_str());
    assert_eq!(files[0]["size"], 200);
    assert_eq!(files[0]["isLatest"], true);
    assert_eq!(files[1]["name"], id_a.as_str());
    assert!(files[1].get("isLatest").is_none());
    assert!(files.iter().all(|f| f["name"] != "latest.bin"));
    assert!(files[0]["version"].is_string());

    let latest = app.download(routes::LATEST).await;
    assert_eq!(latest.bytes, b);

    let older = app.download(&routes::artifact(&id_a)).await;
    assert_eq!(older.status, 200);
    assert_eq!(older.bytes.len(), 100);
}

#[tokio::test]
async fn missing_artifact_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::artifact("firmware-nope.bin")).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn latest_before_any_upload_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::LATEST).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn malformed_names_are_rejected() {
    let app = TestApp::spawn().await;

    let traversal = app.get(&routes::artifact("..%2F..%2Fetc%2Fpasswd")).await;
    assert_eq!(traversal.status, 400);
    assert_eq!(traversal.code(), "VALIDATION_ERROR");

    let wrong_ext = app.get(&routes::artifact("notes.txt")).await;
    assert_eq!(wrong_ext.status, 400);
    assert_eq!(wrong_ext.code(), "VALIDATION_ERROR");

    let hidden = app.get(&routes::legacy_firmware(".latest.bin")).await;
    assert_eq!(hidden.status, 400);
}

#[tokio::test]
async fn latest_alias_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    app.upload_ok("build.bin", blob(1, 10)).await;

    for path in [
        routes::artifact("latest.bin"),
        routes::artifact("latest"),
        routes::legacy_firmware("latest.bin"),
    ] {
        let res = app.delete(&path).await;
        assert_eq!(res.status, 400, "{path}");
        assert_eq!(res.code(), "LATEST_PROTECTED");
        assert_eq!(res.body["message"], "Cannot delete latest.bin file");
    }

    assert_eq!(app.download(routes::LATEST).await.status, 200);
}

#[tokio::test]
async fn deleting_the_promoted_source_keeps_latest_serving() {
    let app = TestApp::spawn().await;
    let bytes = blob(4, 128);
    let id = app.upload_ok("build.bin", bytes.clone()).await;

    let res = app.delete(&routes::artifact(&id)).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["message"], "Firmware file deleted successfully");
    assert_eq!(res.body["id"], id.as_str());

    let again = app.delete(&routes::legacy_firmware(&id)).await;
    assert_eq!(again.status, 404);

    let list = app.get(routes::ARTIFACTS).await;
    assert_eq!(list.body["total"], 0);

    let latest = app.download(routes::LATEST).await;
    assert_eq!(latest.status, 200);
    assert_eq!(latest.bytes, bytes);
}

#[tokio::test]
async fn concurrent_uploads_get_distinct_ids() {
    let app = TestApp::spawn().await;

    let uploads = (0..6u8).map(|n| app.upload("build.bin", blob(n, 256 + n as usize)));
    let results = futures::future::join_all(uploads).await;

    let mut ids: Vec<String> = results
        .iter()
        .map(|r| {
            assert_eq!(r.status, 200, "{}", r.text);
            r.body["id"].as_str().unwrap().to_string()
        })
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 6);

    let list = app.get(routes::ARTIFACTS).await;
    assert_eq!(list.body["total"], 6);
    let files = list.body["files"].as_array().unwrap();
    let flagged: Vec<_> = files.iter().filter(|f| f["isLatest"] == true).collect();
    assert_eq!(flagged.len(), 1);

    let latest = app.download(routes::LATEST).await;
    let flagged_size = flagged[0]["size"].as_u64().unwrap() as usize;
    assert_eq!(latest.bytes.len(), flagged_size);
}
