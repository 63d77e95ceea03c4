// HTTP response utilities for file downloads with optional Brotli encoding
use anyhow::{Context, Result};
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Response, StatusCode, header},
};
use tokio::io::AsyncReadExt;

/// Whether the client's `Accept-Encoding` lists `br`
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').any(|enc| enc.trim().starts_with("br")))
        .unwrap_or(false)
}

pub async fn compress_brotli(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = BrotliEncoder::new(bytes);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await.context("Brotli compression failed")?;
    Ok(compressed)
}

/// Attachment response named `filename`, Brotli-encoded when `compress` is set
pub async fn file_response(
    bytes: Vec<u8>,
    content_type: &str,
    filename: &str,
    compress: bool,
) -> Result<Response<Body>> {
    let (body_bytes, content_encoding) = if compress {
        let compressed = compress_brotli(&bytes).await?;
        tracing::debug!(raw = bytes.len(), compressed = compressed.len(), "brotli-encoded export");
        (compressed, Some("br"))
    } else {
        (bytes, None)
    };

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .context("Invalid export file name")?;

    let mut response_builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, body_bytes.len());

    if let Some(encoding) = content_encoding {
        response_builder = response_builder.header(header::CONTENT_ENCODING, encoding);
    }

    response_builder
        .body(Body::from(body_bytes))
        .context("Failed to build file response")
}
