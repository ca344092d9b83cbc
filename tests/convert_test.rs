//! Integration tests for `POST /convert`.

mod common;

use std::time::Duration;

use axum::http::{header, StatusCode};
use common::{body_bytes, body_json, convert_request, test_config, TestHarness};
use tower::ServiceExt;
use typeshift_convert::table::{self, Table};

const CSV: &[u8] = b"name,qty\nbolt,4\nnut,12\n";

fn read_xlsx_bytes(bytes: &[u8]) -> Table {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");
    std::fs::write(&path, bytes).unwrap();
    table::read_xlsx(&path).unwrap()
}

fn png_fixture() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 3, image::Rgba([200, 10, 10, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn wait_for_empty_scratch(h: &TestHarness) {
    for _ in 0..50 {
        if h.scratch_entries().is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("scratch files left behind: {:?}", h.scratch_entries());
}

#[tokio::test]
async fn csv_to_xlsx_returns_attachment() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let response = h
        .app()
        .oneshot(convert_request("parts.csv", CSV, "XLSX", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"converted_parts.xlsx\""));

    let bytes = body_bytes(response.into_body()).await;
    let table = read_xlsx_bytes(&bytes);
    assert_eq!(table.headers, vec!["name", "qty"]);
    assert_eq!(table.rows, vec![vec!["bolt", "4"], vec!["nut", "12"]]);

    assert!(h.scratch_entries().is_empty());
}

#[tokio::test]
async fn target_format_is_case_insensitive() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let response = h
        .app()
        .oneshot(convert_request("Parts.CSV", CSV, " xlsx ", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("converted_Parts.xlsx"));
}

#[tokio::test]
async fn png_to_jpg_is_decodable() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let response = h
        .app()
        .oneshot(convert_request("dot.png", &png_fixture(), "JPG", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body_bytes(response.into_body()).await;
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 3));
}

#[tokio::test]
async fn unsupported_pair_is_400_and_writes_nothing() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let response = h
        .app()
        .oneshot(convert_request("anim.gif", b"GIF89a", "PNG", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["detail"], "Unsupported conversion: gif to PNG");

    let response = h
        .app()
        .oneshot(convert_request("data.csv", CSV, "DOCX", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(h.scratch_entries().is_empty());
}

#[tokio::test]
async fn missing_token_is_401() {
    let h = TestHarness::new();

    let response = h
        .app()
        .oneshot(convert_request("parts.csv", CSV, "XLSX", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert!(h.scratch_entries().is_empty());
}

#[tokio::test]
async fn auth_disabled_allows_anonymous_convert() {
    let mut config = test_config();
    config.server.auth.enabled = false;
    let h = TestHarness::with_config(config);

    let response = h
        .app()
        .oneshot(convert_request("parts.csv", CSV, "XLSX", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_fields_are_400() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let boundary = common::BOUNDARY;
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"target_format\"\r\n\r\nPDF\r\n--{boundary}--\r\n"
    );
    let request = axum::http::Request::post("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = h.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["detail"], "Missing file field");
}

#[tokio::test]
async fn corrupt_input_is_500_and_cleaned_up() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let response = h
        .app()
        .oneshot(convert_request("broken.xlsx", b"not a zip", "CSV", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response.into_body()).await;
    assert!(json["detail"].is_string());

    assert!(h.scratch_entries().is_empty());
}

#[tokio::test]
async fn unicode_filename_gets_encoded_disposition() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let response = h
        .app()
        .oneshot(convert_request("résumé.csv", CSV, "XLSX", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("filename*=UTF-8''converted%5Fr%C3%A9sum%C3%A9%2Exlsx"));
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let mut config = test_config();
    config.server.max_upload_mb = 1;
    let h = TestHarness::with_config(config);
    let token = h.user_token("alice");

    let big = vec![b'a'; 2 * 1024 * 1024];
    let response = h
        .app()
        .oneshot(convert_request("big.csv", &big, "XLSX", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.scratch_entries().is_empty());
}

#[tokio::test]
async fn concurrent_conversions_do_not_collide() {
    let (h, addr) = TestHarness::with_server().await;
    let token = h.user_token("alice");
    let client = reqwest::Client::new();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            let token = token.clone();
            let url = format!("http://{addr}/convert");
            tokio::spawn(async move {
                let csv = format!("id,value\n{i},row-{i}\n");
                let form = reqwest::multipart::Form::new()
                    .part(
                        "file",
                        reqwest::multipart::Part::bytes(csv.into_bytes())
                            .file_name(format!("batch{i}.csv")),
                    )
                    .text("target_format", "XLSX");
                let resp = client
                    .post(url)
                    .bearer_auth(token)
                    .multipart(form)
                    .send()
                    .await
                    .unwrap();
                assert_eq!(resp.status(), 200);
                (i, resp.bytes().await.unwrap().to_vec())
            })
        })
        .collect();

    for task in tasks {
        let (i, bytes) = task.await.unwrap();
        let table = read_xlsx_bytes(&bytes);
        assert_eq!(table.rows, vec![vec![i.to_string(), format!("row-{i}")]]);
    }

    wait_for_empty_scratch(&h).await;
}

#[tokio::test]
async fn dropped_download_still_cleans_up() {
    let (h, addr) = TestHarness::with_server().await;
    let token = h.user_token("alice");

    let form = reqwest::multipart::Form::new()
        .part(
            "file",
            reqwest::multipart::Part::bytes(CSV.to_vec()).file_name("parts.csv"),
        )
        .text("target_format", "PDF");
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/convert"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    drop(resp);

    wait_for_empty_scratch(&h).await;
}
