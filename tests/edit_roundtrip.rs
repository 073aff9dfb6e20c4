//! End-to-end: a real server on a loopback port driven through `ApiClient`
//! and `EditSession`, the way a front end would.
//!
//! Run with: cargo test --test edit_roundtrip

use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
use retouch::client::{ApiClient, ClientError, UploadFile};
use retouch::config::ServerConfig;
use retouch::editor::{EditSession, Point, PointerInput, PointerKind};
use retouch::server;
use reqwest::StatusCode;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::net::TcpListener;

struct TestServer {
    _tmp: TempDir,
    results: PathBuf,
    client: ApiClient,
}

async fn start() -> TestServer {
    let tmp = TempDir::new().unwrap();
    let mut config = ServerConfig::default();
    config.storage.uploads_dir = tmp.path().join("uploads");
    config.storage.results_dir = tmp.path().join("results");
    config.server.public_dir = tmp.path().join("public");

    let router = server::app(&config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::run(listener, router));

    TestServer {
        results: config.storage.results_dir.clone(),
        client: ApiClient::new(format!("http://{addr}")),
        _tmp: tmp,
    }
}

fn white_png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

async fn upload_one(server: &TestServer, name: &str) -> (String, String) {
    let response = server
        .client
        .upload(vec![UploadFile {
            filename: name.into(),
            mime: "image/png".into(),
            bytes: white_png(40, 30),
        }])
        .await
        .unwrap();
    assert_eq!(response.processed_files.len(), 1);
    let file = &response.processed_files[0];
    (file.enhanced.clone(), file.url.clone())
}

fn draw_line(session: &mut EditSession, from: Point, to: Point) {
    let editor = session.editor_mut();
    editor.set_brush_size(50.0);
    editor.handle_pointer(PointerInput::mouse(PointerKind::Down, from, 1));
    editor.handle_pointer(PointerInput::mouse(PointerKind::Move, to, 1));
    editor.handle_pointer(PointerInput::mouse(PointerKind::Up, to, 0));
}

#[tokio::test]
async fn upload_edit_rename_download() {
    let server = start().await;
    let (enhanced, url) = upload_one(&server, "wall.png").await;

    // Upscaled 2x.
    let mut session = EditSession::open(&server.client, &enhanced, &url)
        .await
        .unwrap();
    assert_eq!(session.editor().layer().width(), 80);
    assert_eq!(session.editor().layer().height(), 60);

    draw_line(&mut session, Point::new(10.0, 30.0), Point::new(70.0, 30.0));
    let new_url = session.submit(&server.client).await.unwrap();
    assert!(new_url.starts_with(&format!("/results/{enhanced}?t=")));
    assert!(session.editor().layer().is_blank());
    assert!(session.controls_enabled());

    let bytes = server.client.fetch_bytes(&new_url).await.unwrap();
    let edited = image::load_from_memory(&bytes).unwrap();
    assert_eq!(edited.dimensions(), (80, 60));
    assert_eq!(edited.get_pixel(40, 30), Rgba([255, 0, 0, 255]));
    assert_eq!(edited.get_pixel(40, 5), Rgba([255, 255, 255, 255]));

    // Nothing drawn: the file stays as it is.
    let before = std::fs::read(server.results.join(&enhanced)).unwrap();
    session.submit(&server.client).await.unwrap();
    let after = std::fs::read(server.results.join(&enhanced)).unwrap();
    assert_eq!(before, after);

    let renamed = server.client.rename(&enhanced, "final").await.unwrap();
    assert!(renamed.success);
    assert_eq!(renamed.new_filename, "final.png");
    assert_eq!(renamed.url, "/results/final.png");
    assert!(!server.results.join(&enhanced).exists());

    let archive = server.client.download_all().await.unwrap();
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    assert_eq!(zip.len(), 1);
    let mut entry = zip.by_name("final.png").unwrap();
    let mut zipped = Vec::new();
    entry.read_to_end(&mut zipped).unwrap();
    assert_eq!(zipped, after);
}

#[tokio::test]
async fn editing_a_missing_file_reports_not_found() {
    let server = start().await;
    let mut session = EditSession::from_dimensions("ghost.png", "/results/ghost.png", 10, 10);
    draw_line(&mut session, Point::new(1.0, 1.0), Point::new(9.0, 9.0));

    let err = session.submit(&server.client).await.unwrap_err();
    match err {
        retouch::editor::EditorError::Client(ClientError::Api { status, message }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "File 'ghost.png' not found");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Strokes survive a failed submit.
    assert!(!session.editor().layer().is_blank());
}

#[tokio::test]
async fn rename_onto_existing_result_conflicts() {
    let server = start().await;
    let (first, _) = upload_one(&server, "a.png").await;
    let (second, _) = upload_one(&server, "b.png").await;

    let err = server.client.rename(&first, &second).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert!(server.results.join(&first).exists());
}

#[tokio::test]
async fn text_upload_is_rejected() {
    let server = start().await;
    let err = server
        .client
        .upload(vec![UploadFile {
            filename: "notes.txt".into(),
            mime: "text/plain".into(),
            bytes: b"hello".to_vec(),
        }])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}
