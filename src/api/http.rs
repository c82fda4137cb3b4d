//! reqwest implementation of the OCR backend endpoints.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::{MessageResp, OcrApi};

/// HTTP client bound to one backend base URL.
pub struct HttpOcrApi {
    http: Client,
    base_url: String,
}

impl HttpOcrApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl OcrApi for HttpOcrApi {
    async fn upload_image(
        &self,
        filename: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<MessageResp> {
        let form = reqwest::multipart::Form::new().part(
            "image",
            reqwest::multipart::Part::bytes(bytes)
                .file_name(filename.to_string())
                .mime_str(mime)?,
        );

        let resp = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<MessageResp>()
            .await?;
        Ok(resp)
    }

    async fn run_ocr(&self) -> Result<serde_json::Value> {
        // No body; the server runs its pipeline over the uploaded images.
        let resp = self
            .http
            .post(self.url("/run-ocr"))
            .header("Content-Type", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        Ok(resp)
    }

    async fn clear_images(&self) -> Result<MessageResp> {
        let resp = self
            .http
            .post(self.url("/clear-images"))
            .send()
            .await?
            .error_for_status()?
            .json::<MessageResp>()
            .await?;
        Ok(resp)
    }
}
