//! Selected-image model, validation, and the scan session.

use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::Path;

/// An image accepted for analysis, held fully in memory.
#[derive(Clone, Debug)]
pub struct SelectedImage {
    /// File name used for display and upload-marker comparison.
    pub filename: String,
    /// Guessed MIME type, e.g. `image/png`.
    pub mime: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl SelectedImage {
    /// Validate a candidate before any bytes are read into the session.
    ///
    /// Mirrors the upload form's rules: image MIME only, size under the
    /// configured cap. Rejection means no upload attempt is made.
    pub fn validate(mime: &str, size: u64, max_bytes: u64) -> Result<()> {
        if !mime.starts_with("image/") {
            return Err(anyhow!("not an image file (PNG, JPG, WEBP expected)"));
        }
        if size > max_bytes {
            return Err(anyhow!(
                "file too large ({} bytes, limit {})",
                size,
                max_bytes
            ));
        }
        Ok(())
    }

    /// Read and validate an image from disk.
    pub async fn load(path: &Path, max_bytes: u64) -> Result<Self> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| anyhow!("cannot read {}: {e}", path.display()))?;
        if !meta.is_file() {
            return Err(anyhow!("{} is not a file", path.display()));
        }
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        Self::validate(mime.essence_str(), meta.len(), max_bytes)?;

        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .ok_or_else(|| anyhow!("path has no file name"))?
            .to_string_lossy()
            .into_owned();
        Ok(Self {
            filename,
            mime: mime.essence_str().to_string(),
            bytes,
        })
    }

    /// Encode the image as a `data:` URI, the local no-network preview.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Mutable scan state owned by the app, reset wholesale on clear.
#[derive(Clone, Debug, Default)]
pub struct Session {
    /// Current selection, replaced on every accepted pick.
    pub current: Option<SelectedImage>,
    /// Filename of the last successful upload, mirrored from the worker.
    ///
    /// Comparison is by name only, so a different file sharing a name
    /// would skip re-upload. Known weak invariant, kept deliberately.
    pub uploaded_marker: Option<String>,
    /// Preview data URI for the current selection.
    pub preview: Option<String>,
}

impl Session {
    /// Install a newly accepted image, invalidating the upload marker.
    pub fn select(&mut self, img: SelectedImage) {
        self.preview = Some(img.data_uri());
        self.uploaded_marker = None;
        self.current = Some(img);
    }

    /// Drop all state back to the initial empty session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_image_mime() {
        let err = SelectedImage::validate("application/pdf", 100, 10_000_000);
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("not an image"));
    }

    #[test]
    fn rejects_oversize_file() {
        let err = SelectedImage::validate("image/png", 10 * 1024 * 1024 + 1, 10 * 1024 * 1024);
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn accepts_image_at_the_cap() {
        assert!(SelectedImage::validate("image/jpeg", 10 * 1024 * 1024, 10 * 1024 * 1024).is_ok());
    }

    #[test]
    fn select_invalidates_marker_and_builds_preview() {
        let mut s = Session::default();
        s.uploaded_marker = Some("old.png".into());
        s.select(SelectedImage {
            filename: "car.png".into(),
            mime: "image/png".into(),
            bytes: vec![1, 2, 3],
        });
        // A fresh selection always forces the next analyze to re-upload.
        assert_eq!(s.uploaded_marker, None);
        let uri = s.preview.unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = Session::default();
        s.select(SelectedImage {
            filename: "car.png".into(),
            mime: "image/png".into(),
            bytes: vec![0],
        });
        s.reset();
        assert!(s.current.is_none());
        assert!(s.preview.is_none());
        assert!(s.uploaded_marker.is_none());
    }
}
