//! Integration tests for slide image batches against a mock CDN.

use indicatif::ProgressBar;
use slidegrab_core::download::{DownloadError, HttpClient, fetch_images};
use slidegrab_core::{ImageDownloader, RedirectResolver, SlideImage};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

const CONTENT_ID: &str = "7301234567890123456";

#[tokio::test]
async fn test_fetch_images_partial_batch_keeps_going() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/img/first.jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"first".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/gone.jpeg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/third.jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"third".to_vec()))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out_dir = temp_dir.path().join("nested").join("out");
    let images = vec![
        SlideImage::new(format!("{}/img/first.jpeg?sig=a", mock_server.uri()), 0),
        SlideImage::new(format!("{}/img/gone.jpeg", mock_server.uri()), 1),
        SlideImage::new(format!("{}/img/third.jpeg?sig=c", mock_server.uri()), 2),
    ];

    let client = HttpClient::new(None).expect("client should build");
    let report = fetch_images(&client, CONTENT_ID, &images, &out_dir, &ProgressBar::hidden())
        .await
        .expect("batch should run");

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.fetched.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].url.ends_with("/img/gone.jpeg"));
    assert!(report.failed[0].reason.contains("HTTP 404"));

    let first = out_dir.join(format!("[{CONTENT_ID}]-0-first.jpeg"));
    let third = out_dir.join(format!("[{CONTENT_ID}]-2-third.jpeg"));
    assert_eq!(report.fetched, vec![first.clone(), third.clone()]);
    assert_eq!(std::fs::read(&first).expect("first saved"), b"first");
    assert_eq!(std::fs::read(&third).expect("third saved"), b"third");
    assert!(!out_dir.join(format!("[{CONTENT_ID}]-1-gone.jpeg")).exists());
}

#[tokio::test]
async fn test_fetch_images_all_failed_reports_every_image() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let images = vec![
        SlideImage::new(format!("{}/a.jpg", mock_server.uri()), 0),
        SlideImage::new(format!("{}/b.jpg", mock_server.uri()), 1),
    ];

    let client = HttpClient::new(None).expect("client should build");
    let report = fetch_images(
        &client,
        CONTENT_ID,
        &images,
        temp_dir.path(),
        &ProgressBar::hidden(),
    )
    .await
    .expect("batch should run");

    assert!(report.all_failed());
    assert!(report.failed.iter().all(|f| f.reason.starts_with("[AUTH]")));
}

#[tokio::test]
async fn test_fetch_images_output_dir_blocked_is_fatal() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, b"x").expect("write blocker");
    let images = vec![SlideImage::new("https://cdn.example/a.jpg", 0)];

    let client = HttpClient::new(None).expect("client should build");
    let result = fetch_images(
        &client,
        CONTENT_ID,
        &images,
        &blocker.join("out"),
        &ProgressBar::hidden(),
    )
    .await;

    assert!(matches!(result, Err(DownloadError::Io { .. })));
}

#[tokio::test]
async fn test_download_image_overwrites_existing_file() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("a.jpg");
    std::fs::write(&dest, b"old content").expect("seed file");

    let client = HttpClient::new(None).expect("client should build");
    let bytes = client
        .download_image(&format!("{}/a.jpg", mock_server.uri()), &dest)
        .await
        .expect("download should succeed");

    assert_eq!(bytes, 3);
    assert_eq!(std::fs::read(&dest).expect("read"), b"new");
}

#[tokio::test]
async fn test_final_url_follows_share_link_redirect() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let target = format!("{}/@user/video/{CONTENT_ID}", mock_server.uri());
    Mock::given(method("GET"))
        .and(path("/ZMabc123/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", target.as_str()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/@user/video/{CONTENT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(None).expect("client should build");
    let final_url = client
        .final_url(&format!("{}/ZMabc123/", mock_server.uri()))
        .await
        .expect("redirect should resolve");

    assert_eq!(final_url, target);
}
