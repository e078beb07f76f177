//! Where uploaded image bytes end up: a local directory served under
//! `/uploads`, or a hosted media service that hands back a durable URL.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use bytes::Bytes;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tokio::fs;

#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("transient: {0}")]
    Transient(String),
    #[error("permanent: {0}")]
    Permanent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub url:       String,
    pub public_id: String,
}

#[derive(Clone)]
pub enum MediaStore {
    Local(LocalMedia),
    Hosted(HostedMedia),
}

impl MediaStore {
    pub async fn upload(&self, data: Bytes, mime: &str) -> Result<StoredMedia, UploadError> {
        match self {
            MediaStore::Local(m)  => m.upload(data, mime).await,
            MediaStore::Hosted(m) => m.upload(data, mime).await,
        }
    }
}

/* ------------ 本機目錄 ------------ */
#[derive(Clone)]
pub struct LocalMedia {
    dir: PathBuf,
}

impl LocalMedia {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory served under `/uploads`.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn upload(&self, data: Bytes, mime: &str) -> Result<StoredMedia, UploadError> {
        let ext = extension_for(mime);
        let id = uuid::Uuid::new_v4().to_string();
        let fname = format!("{id}.{ext}");

        fs::create_dir_all(&self.dir).await.map_err(transient)?;
        fs::write(self.dir.join(&fname), &data).await.map_err(transient)?;

        Ok(StoredMedia { url: format!("/uploads/{fname}"), public_id: id })
    }
}

/* ------------ 外部圖床 ------------ */
#[derive(Clone)]
pub struct HostedMedia {
    client:     Client,
    upload_url: String,
    preset:     String,
    api_key:    Option<String>,
}

#[derive(Deserialize)]
struct HostedResp {
    secure_url: String,
    public_id:  String,
}

impl HostedMedia {
    pub fn new(upload_url: String, preset: String, api_key: Option<String>) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, upload_url, preset, api_key })
    }

    async fn upload(&self, data: Bytes, mime: &str) -> Result<StoredMedia, UploadError> {
        let part = multipart::Part::bytes(data.to_vec())
            .file_name("upload")
            .mime_str(mime)
            .map_err(|e| UploadError::Permanent(e.to_string()))?;
        let mut form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());
        if let Some(key) = &self.api_key {
            form = form.text("api_key", key.clone());
        }

        let resp = self.client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(transient)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify(status, text));
        }

        let body: HostedResp = resp.json().await
            .map_err(|e| UploadError::Permanent(format!("bad response: {e}")))?;
        Ok(StoredMedia { url: body.secure_url, public_id: body.public_id })
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",   // mime_guess lists jfif first
        _ => mime_guess::get_mime_extensions_str(mime)
            .and_then(|a| a.first().copied())
            .unwrap_or("bin"),
    }
}

fn transient<E: std::fmt::Display>(e: E) -> UploadError {
    UploadError::Transient(e.to_string())
}

fn classify(status: StatusCode, body: String) -> UploadError {
    let msg = format!("{status}: {body}");
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        UploadError::Transient(msg)
    } else {
        UploadError::Permanent(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_upload_writes_file_with_guessed_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::Local(LocalMedia::new(dir.path().join("uploads")));

        let stored = store.upload(Bytes::from_static(b"\x89PNG"), "image/png").await.unwrap();

        assert_eq!(stored.url, format!("/uploads/{}.png", stored.public_id));
        let on_disk = std::fs::read(dir.path().join(format!("uploads/{}.png", stored.public_id))).unwrap();
        assert_eq!(on_disk, b"\x89PNG");
    }

    #[tokio::test]
    async fn local_upload_unknown_mime_falls_back_to_bin() {
        let dir = tempfile::tempdir().unwrap();
        let stored = LocalMedia::new(dir.path())
            .upload(Bytes::from_static(b"??"), "application/x-unheard-of")
            .await
            .unwrap();
        assert!(stored.url.ends_with(".bin"));
    }

    #[tokio::test]
    async fn jpeg_uploads_keep_jpg_extension() {
        let dir = tempfile::tempdir().unwrap();
        let stored = LocalMedia::new(dir.path())
            .upload(Bytes::from_static(b"\xff\xd8"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(stored.url, format!("/uploads/{}.jpg", stored.public_id));
        assert!(dir.path().join(format!("{}.jpg", stored.public_id)).exists());
    }

    #[tokio::test]
    async fn unreachable_host_is_transient() {
        let hosted = HostedMedia::new("http://127.0.0.1:9/upload".into(), "preset".into(), None).unwrap();
        let err = hosted.upload(Bytes::from_static(b"x"), "image/png").await.unwrap_err();
        assert!(matches!(err, UploadError::Transient(_)));
    }

    #[test]
    fn status_classification() {
        assert!(matches!(classify(StatusCode::BAD_GATEWAY, String::new()), UploadError::Transient(_)));
        assert!(matches!(classify(StatusCode::TOO_MANY_REQUESTS, String::new()), UploadError::Transient(_)));
        assert!(matches!(classify(StatusCode::BAD_REQUEST, "bad preset".into()), UploadError::Permanent(m) if m.contains("bad preset")));
    }
}
