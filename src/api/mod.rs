//! OCR backend client seam.

mod http;

pub use http::HttpOcrApi;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// JSON reply shared by `/upload` and `/clear-images`.
#[derive(Debug, Deserialize)]
pub struct MessageResp {
    /// Human-readable outcome, when the server provides one.
    pub message: Option<String>,
}

/// The three endpoints the tool consumes. Behind a trait so the worker
/// can run against a fake in tests.
#[async_trait]
pub trait OcrApi: Send + Sync {
    /// Multipart upload of one image under the form field `image`.
    async fn upload_image(&self, filename: &str, mime: &str, bytes: Vec<u8>)
    -> Result<MessageResp>;

    /// Trigger OCR over whatever was uploaded; returns the raw payload.
    async fn run_ocr(&self) -> Result<serde_json::Value>;

    /// Ask the server to drop its stored images.
    async fn clear_images(&self) -> Result<MessageResp>;
}
