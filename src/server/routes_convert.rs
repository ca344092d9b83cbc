//! Format listing and the conversion endpoint.

use crate::server::error::ApiError;
use crate::server::AppContext;
use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio_util::io::ReaderStream;
use typeshift_convert::format;

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online",
        message: "Typeshift conversion API is running",
    })
}

#[derive(Serialize)]
pub struct FormatsResponse {
    pub formats: BTreeMap<&'static str, Vec<&'static str>>,
}

pub async fn formats(State(ctx): State<AppContext>) -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: ctx.router.formats(),
    })
}

/// The parts of a conversion upload.
struct Upload {
    filename: String,
    data: Bytes,
    target_format: String,
}

/// Oversized bodies keep their 413.
fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut target_format: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data));
            }
            Some("target_format") => {
                target_format = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| ApiError::bad_request("Missing file field"))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("Uploaded file has no filename"));
    }
    let target_format =
        target_format.ok_or_else(|| ApiError::bad_request("Missing target_format field"))?;

    Ok(Upload {
        filename,
        data,
        target_format,
    })
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
fn content_disposition(name: &str) -> HeaderValue {
    let ascii: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        utf8_percent_encode(name, NON_ALPHANUMERIC)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

pub async fn convert(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let upload = read_upload(multipart).await?;

    let extension = format::source_extension(&upload.filename);
    let target = format::normalize_target(&upload.target_format);

    // Unsupported pairs never touch the scratch directory.
    let route = ctx.router.resolve(&extension, &target)?;
    tracing::info!(
        filename = %upload.filename,
        extension = %extension,
        target = %target,
        strategy = route.strategy.name(),
        size = upload.data.len(),
        "Starting conversion"
    );

    let job = ctx.scratch.begin_job(&extension, &target);
    tokio::fs::write(job.input(), &upload.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {}", e)))?;

    let router = ctx.router.clone();
    let job = tokio::task::spawn_blocking(move || {
        router
            .convert(
                job.source_extension(),
                job.target_format(),
                job.input(),
                job.output(),
            )
            .map(|()| job)
    })
    .await??;

    let file = tokio::fs::File::open(job.output())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to open converted file: {}", e)))?;
    let length = file.metadata().await.ok().map(|m| m.len());

    // The stream owns the job, so its files go when the body is finished or dropped.
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _job = &job;
        chunk
    });

    let download = format::download_name(&upload.filename, &target);
    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_DISPOSITION, content_disposition(&download)),
        ],
        Body::from_stream(stream),
    )
        .into_response();
    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}
