//! Background worker handling the backend call sequence.

use crate::{
    api::{HttpOcrApi, OcrApi},
    config::Config,
    normalize::{self, NormalizedResult},
};
use tokio::sync::mpsc;

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Run the upload-then-analyze sequence for the given image.
    Analyze {
        filename: String,
        mime: String,
        bytes: Vec<u8>,
    },
    /// Forget the upload marker so the next analyze re-uploads.
    InvalidateUpload,
    /// Ask the server to drop its stored images.
    ClearRemote,
    /// Persist and apply updated settings.
    SaveSettings(Config),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// Upload finished; the marker now holds this filename.
    UploadDone {
        filename: String,
        message: Option<String>,
    },
    /// Upload failed; the sequence was aborted and the marker left unset.
    UploadFailed(String),
    /// The analysis call itself started (upload done or skipped).
    Analyzing,
    /// Full sequence finished with a normalized result.
    AnalysisDone(NormalizedResult),
    /// Analysis failed after a successful or skipped upload.
    AnalysisFailed(String),
    /// Server-side images cleared.
    Cleared { message: Option<String> },
    /// Clearing server-side images failed. Local reset is unaffected.
    ClearFailed(String),
    /// Informational log message.
    Log(String),
}

/// Main worker loop: build the HTTP client, then handle commands
/// strictly one at a time so upload and analysis never overlap.
pub async fn run(mut rx: mpsc::Receiver<WorkerCmd>, tx: mpsc::Sender<WorkerEvent>, cfg: Config) {
    let mut api = HttpOcrApi::new(cfg.server.base_url.clone());
    // Filename of the last successful upload. The worker is the only
    // writer while a sequence runs, so this is the authoritative copy.
    let mut uploaded_marker: Option<String> = None;
    tracing::info!("worker started, backend {}", cfg.server.base_url);

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCmd::SaveSettings(new_cfg) => {
                tracing::info!("settings updated, backend {}", new_cfg.server.base_url);
                // A different server knows nothing about past uploads.
                api = HttpOcrApi::new(new_cfg.server.base_url.clone());
                uploaded_marker = None;
                let _ = tx.send(WorkerEvent::Log("settings updated".into())).await;
            }

            WorkerCmd::InvalidateUpload => {
                uploaded_marker = None;
            }

            WorkerCmd::Analyze {
                filename,
                mime,
                bytes,
            } => {
                handle_analyze(&api, &mut uploaded_marker, &filename, &mime, bytes, &tx).await;
            }

            WorkerCmd::ClearRemote => {
                handle_clear(&api, &mut uploaded_marker, &tx).await;
            }
        }
    }
}

/// The strictly ordered sequence: upload (unless the marker already
/// matches), then analyze, then normalize. Any failure aborts and is
/// reported as an event; nothing here panics or returns an error.
pub async fn handle_analyze<A: OcrApi + ?Sized>(
    api: &A,
    uploaded_marker: &mut Option<String>,
    filename: &str,
    mime: &str,
    bytes: Vec<u8>,
    tx: &mpsc::Sender<WorkerEvent>,
) {
    if uploaded_marker.as_deref() != Some(filename) {
        tracing::info!("uploading {filename}");
        match api.upload_image(filename, mime, bytes).await {
            Ok(resp) => {
                *uploaded_marker = Some(filename.to_string());
                let _ = tx
                    .send(WorkerEvent::UploadDone {
                        filename: filename.to_string(),
                        message: resp.message,
                    })
                    .await;
            }
            Err(e) => {
                // Marker stays unset so a retry re-uploads.
                tracing::error!("upload failed: {e}");
                let _ = tx.send(WorkerEvent::UploadFailed(e.to_string())).await;
                return;
            }
        }
    } else {
        tracing::info!("upload skipped, {filename} already on server");
        let _ = tx
            .send(WorkerEvent::Log(format!("upload skipped for {filename}")))
            .await;
    }

    let _ = tx.send(WorkerEvent::Analyzing).await;
    tracing::info!("running OCR");
    match api.run_ocr().await {
        Ok(payload) => {
            let result = normalize::normalize(&payload);
            tracing::info!("analysis done, plate {}", result.details.plate);
            let _ = tx.send(WorkerEvent::AnalysisDone(result)).await;
        }
        Err(e) => {
            tracing::error!("analysis failed: {e}");
            let _ = tx.send(WorkerEvent::AnalysisFailed(e.to_string())).await;
        }
    }
}

/// Ask the server to drop stored images; the upload marker goes with
/// them either way, since a retry after failure should re-upload.
pub async fn handle_clear<A: OcrApi + ?Sized>(
    api: &A,
    uploaded_marker: &mut Option<String>,
    tx: &mpsc::Sender<WorkerEvent>,
) {
    *uploaded_marker = None;
    match api.clear_images().await {
        Ok(resp) => {
            tracing::info!("server images cleared");
            let _ = tx
                .send(WorkerEvent::Cleared {
                    message: resp.message,
                })
                .await;
        }
        Err(e) => {
            tracing::error!("clear failed: {e}");
            let _ = tx.send(WorkerEvent::ClearFailed(e.to_string())).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MessageResp;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double counting calls, with switchable failures.
    #[derive(Default)]
    struct FakeApi {
        uploads: AtomicUsize,
        ocr_calls: AtomicUsize,
        clear_calls: AtomicUsize,
        fail_upload: bool,
        fail_ocr: bool,
        fail_clear: bool,
    }

    #[async_trait]
    impl OcrApi for FakeApi {
        async fn upload_image(
            &self,
            _filename: &str,
            _mime: &str,
            _bytes: Vec<u8>,
        ) -> anyhow::Result<MessageResp> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            if self.fail_upload {
                return Err(anyhow!("500 Internal Server Error"));
            }
            Ok(MessageResp {
                message: Some("Image saved".into()),
            })
        }

        async fn run_ocr(&self) -> anyhow::Result<serde_json::Value> {
            self.ocr_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_ocr {
                return Err(anyhow!("OCR execution failed"));
            }
            Ok(json!({ "message": "checked MH12AB1234" }))
        }

        async fn clear_images(&self) -> anyhow::Result<MessageResp> {
            self.clear_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_clear {
                return Err(anyhow!("Failed to clear images"));
            }
            Ok(MessageResp {
                message: Some("Cleared successfully".into()),
            })
        }
    }

    fn channel() -> (mpsc::Sender<WorkerEvent>, mpsc::Receiver<WorkerEvent>) {
        mpsc::channel(64)
    }

    fn drain(rx: &mut mpsc::Receiver<WorkerEvent>) -> Vec<WorkerEvent> {
        let mut out = vec![];
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn second_analyze_of_same_file_skips_upload() {
        let api = FakeApi::default();
        let (tx, mut rx) = channel();
        let mut marker = None;

        handle_analyze(&api, &mut marker, "car.png", "image/png", vec![1], &tx).await;
        handle_analyze(&api, &mut marker, "car.png", "image/png", vec![1], &tx).await;

        // Exactly one upload, two analysis calls.
        assert_eq!(api.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(api.ocr_calls.load(Ordering::SeqCst), 2);
        assert_eq!(marker.as_deref(), Some("car.png"));

        let done = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, WorkerEvent::AnalysisDone(_)))
            .count();
        assert_eq!(done, 2);
    }

    #[tokio::test]
    async fn different_filename_forces_reupload() {
        let api = FakeApi::default();
        let (tx, _rx) = channel();
        let mut marker = None;

        handle_analyze(&api, &mut marker, "a.png", "image/png", vec![1], &tx).await;
        handle_analyze(&api, &mut marker, "b.png", "image/png", vec![2], &tx).await;

        assert_eq!(api.uploads.load(Ordering::SeqCst), 2);
        assert_eq!(marker.as_deref(), Some("b.png"));
    }

    #[tokio::test]
    async fn upload_failure_aborts_and_leaves_marker_unset() {
        let api = FakeApi {
            fail_upload: true,
            ..Default::default()
        };
        let (tx, mut rx) = channel();
        let mut marker = None;

        handle_analyze(&api, &mut marker, "car.png", "image/png", vec![1], &tx).await;

        // The sequence aborted before analysis.
        assert_eq!(api.ocr_calls.load(Ordering::SeqCst), 0);
        assert_eq!(marker, None);
        assert!(
            drain(&mut rx)
                .iter()
                .any(|e| matches!(e, WorkerEvent::UploadFailed(_)))
        );
    }

    #[tokio::test]
    async fn analysis_failure_keeps_upload_marker() {
        let api = FakeApi {
            fail_ocr: true,
            ..Default::default()
        };
        let (tx, mut rx) = channel();
        let mut marker = None;

        handle_analyze(&api, &mut marker, "car.png", "image/png", vec![1], &tx).await;

        // Upload succeeded, so a retry may skip straight to analysis.
        assert_eq!(marker.as_deref(), Some("car.png"));
        assert!(
            drain(&mut rx)
                .iter()
                .any(|e| matches!(e, WorkerEvent::AnalysisFailed(_)))
        );
    }

    #[tokio::test]
    async fn successful_analysis_is_normalized() {
        let api = FakeApi::default();
        let (tx, mut rx) = channel();
        let mut marker = None;

        handle_analyze(&api, &mut marker, "car.png", "image/png", vec![1], &tx).await;

        let events = drain(&mut rx);
        let result = events
            .iter()
            .find_map(|e| match e {
                WorkerEvent::AnalysisDone(r) => Some(r),
                _ => None,
            })
            .expect("analysis result");
        assert_eq!(result.details.plate, "MH12AB1234");
        assert_eq!(result.raw, "checked MH12AB1234");
    }

    #[tokio::test]
    async fn clear_calls_endpoint_once_and_resets_marker() {
        let api = FakeApi::default();
        let (tx, mut rx) = channel();
        let mut marker = Some("car.png".to_string());

        handle_clear(&api, &mut marker, &tx).await;

        assert_eq!(api.clear_calls.load(Ordering::SeqCst), 1);
        assert_eq!(marker, None);
        assert!(
            drain(&mut rx)
                .iter()
                .any(|e| matches!(e, WorkerEvent::Cleared { .. }))
        );
    }

    #[tokio::test]
    async fn clear_failure_is_reported_not_fatal() {
        let api = FakeApi {
            fail_clear: true,
            ..Default::default()
        };
        let (tx, mut rx) = channel();
        let mut marker = Some("car.png".to_string());

        handle_clear(&api, &mut marker, &tx).await;

        // Marker is still dropped; only the report differs.
        assert_eq!(marker, None);
        assert!(
            drain(&mut rx)
                .iter()
                .any(|e| matches!(e, WorkerEvent::ClearFailed(_)))
        );
    }
}
