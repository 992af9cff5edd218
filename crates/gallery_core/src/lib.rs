//! Client-side core for the media vault: page-model fetching, thumbnail
//! bytes, concurrent multipart uploads, favorite toggling, and the content
//! management operations, plus the pure controllers the desktop shell drives.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use shared::{
    error::{ApiError, ApiException},
    protocol::{FavoriteForm, PageSnapshot},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};
use url::Url;

pub mod navigate;
pub mod reveal;
pub mod upload;

pub use upload::UploadBatch;

/// Form field name the favorite endpoint inspects; submitted only while the
/// flag is being enabled, matching checkbox semantics.
const FAVORITE_FIELD: &str = "toggle-favorite";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload destination '{url}': {source}")]
    InvalidDestination {
        url: String,
        source: url::ParseError,
    },
}

/// One dropped file, read into memory by the caller.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum GalleryEvent {
    UploadStarted {
        submitted: usize,
    },
    UploadProgress {
        completed: usize,
        submitted: usize,
    },
    /// A file that never arrived; it does not advance the batch.
    UploadFailed {
        filename: String,
        reason: String,
    },
    UploadFinished {
        submitted: usize,
    },
}

#[derive(Debug, Serialize)]
struct NewFolderForm<'a> {
    #[serde(rename = "folder-name")]
    folder_name: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteItemForm<'a> {
    #[serde(rename = "item-name")]
    item_name: &'a str,
}

pub struct GalleryClient {
    http: Client,
    base_url: Url,
    uploads: Mutex<upload::BatchLedger>,
    events: broadcast::Sender<GalleryEvent>,
}

impl GalleryClient {
    pub fn new(server_url: &str) -> Result<Arc<Self>> {
        let base_url = Url::parse(server_url)
            .with_context(|| format!("invalid server url: {server_url}"))?;
        let (events, _) = broadcast::channel(1024);
        Ok(Arc::new(Self {
            http: Client::new(),
            base_url,
            uploads: Mutex::new(upload::BatchLedger::default()),
            events,
        }))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a URL path from a page snapshot against the server base.
    fn resolve(&self, href: &str) -> Result<Url> {
        self.base_url
            .join(href)
            .with_context(|| format!("invalid href '{href}' against {}", self.base_url))
    }

    /// `GET /c/<path>` serves the page model for a content path.
    fn page_url(&self, path: &str) -> Result<Url> {
        self.prefixed_url("c", path)
    }

    /// `POST /:/<path>` is the content management route.
    fn manage_url(&self, path: &str) -> Result<Url> {
        self.prefixed_url(":", path)
    }

    fn prefixed_url(&self, prefix: &str, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| anyhow!("server url cannot be a base: {}", self.base_url))?;
            segments.push(prefix);
            for segment in path.split('/').filter(|segment| !segment.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    async fn get_snapshot(&self, url: Url) -> Result<PageSnapshot> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?;

        if response.status().is_success() {
            return response
                .json::<PageSnapshot>()
                .await
                .context("invalid page snapshot payload");
        }

        let status = response.status();
        if let Ok(body) = response.json::<ApiError>().await {
            return Err(ApiException::from(body).into());
        }
        Err(anyhow!("server returned {status} for page request"))
    }

    pub async fn fetch_page(&self, path: &str) -> Result<PageSnapshot> {
        let url = self.page_url(path)?;
        info!(path, "gallery: fetch_page");
        self.get_snapshot(url).await
    }

    pub async fn fetch_favorites(&self, path: &str) -> Result<PageSnapshot> {
        let mut url = self.page_url(path)?;
        url.query_pairs_mut().append_key_only("favorites");
        info!(path, "gallery: fetch_favorites");
        self.get_snapshot(url).await
    }

    pub async fn search(&self, path: &str, keyword: &str) -> Result<PageSnapshot> {
        let mut url = self.page_url(path)?;
        url.query_pairs_mut().append_pair("search", keyword);
        info!(path, keyword, "gallery: search");
        self.get_snapshot(url).await
    }

    /// Fetches raw bytes for a snapshot href (thumbnails, single-item
    /// content).
    pub async fn fetch_bytes(&self, href: &str) -> Result<Vec<u8>> {
        let url = self.resolve(href)?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()
            .with_context(|| format!("content request rejected for {href}"))?;
        Ok(response
            .bytes()
            .await
            .with_context(|| format!("failed to read content body for {href}"))?
            .to_vec())
    }

    /// Submits the page's favorite form with its declared method, action and
    /// fields. Enabling appends the checkbox field; disabling omits it.
    pub async fn toggle_favorite(&self, form: &FavoriteForm, enable: bool) -> Result<()> {
        let url = self.resolve(&form.action)?;
        let method = reqwest::Method::from_bytes(form.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| anyhow!("unsupported favorite form method '{}'", form.method))?;

        let mut fields: Vec<(String, String)> = form
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect();
        if enable {
            fields.push((FAVORITE_FIELD.to_string(), "on".to_string()));
        }

        info!(action = form.action.as_str(), enable, "gallery: toggle_favorite");
        self.http
            .request(method, url)
            .form(&fields)
            .send()
            .await
            .context("favorite toggle request failed")?
            .error_for_status()
            .context("favorite toggle rejected")?;
        Ok(())
    }

    pub async fn create_folder(&self, path: &str, name: &str) -> Result<()> {
        let mut url = self.manage_url(path)?;
        url.query_pairs_mut().append_key_only("new_folder");
        info!(path, name, "gallery: create_folder");
        self.http
            .post(url)
            .form(&NewFolderForm { folder_name: name })
            .send()
            .await
            .context("create folder request failed")?
            .error_for_status()
            .context("create folder rejected")?;
        Ok(())
    }

    pub async fn delete_item(&self, path: &str, name: &str) -> Result<()> {
        let mut url = self.manage_url(path)?;
        url.query_pairs_mut().append_key_only("delete");
        info!(path, name, "gallery: delete_item");
        self.http
            .post(url)
            .form(&DeleteItemForm { item_name: name })
            .send()
            .await
            .context("delete request failed")?
            .error_for_status()
            .context("delete rejected")?;
        Ok(())
    }

    /// Starts a new upload batch and submits every file independently. The
    /// call returns once the batch is started; progress arrives through the
    /// event channel. An empty file list starts nothing.
    pub async fn upload_files(
        self: &Arc<Self>,
        upload_url: &str,
        files: Vec<UploadFile>,
    ) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let destination =
            self.base_url
                .join(upload_url)
                .map_err(|source| UploadError::InvalidDestination {
                    url: upload_url.to_string(),
                    source,
                })?;

        let submitted = files.len();
        let epoch = self.uploads.lock().await.begin(submitted);
        let _ = self.events.send(GalleryEvent::UploadStarted { submitted });
        info!(submitted, destination = %destination, "gallery: upload batch started");

        for file in files {
            let client = Arc::clone(self);
            let destination = destination.clone();
            tokio::spawn(async move {
                client.upload_single(epoch, destination, file).await;
            });
        }
        Ok(())
    }

    pub async fn current_batch(&self) -> Option<UploadBatch> {
        self.uploads.lock().await.current()
    }

    async fn upload_single(&self, epoch: u64, destination: Url, file: UploadFile) {
        let filename = file.filename.clone();
        match self.post_multipart(destination, file).await {
            Ok(()) => {
                let progressed = self.uploads.lock().await.complete_one(epoch);
                // A completion from a superseded batch carries no progress.
                let Some(batch) = progressed else {
                    return;
                };
                let _ = self.events.send(GalleryEvent::UploadProgress {
                    completed: batch.completed(),
                    submitted: batch.submitted(),
                });
                if batch.is_done() {
                    info!(submitted = batch.submitted(), "gallery: upload batch finished");
                    let _ = self.events.send(GalleryEvent::UploadFinished {
                        submitted: batch.submitted(),
                    });
                }
            }
            Err(err) => {
                warn!(filename = filename.as_str(), "gallery: upload failed: {err:#}");
                let _ = self.events.send(GalleryEvent::UploadFailed {
                    filename,
                    reason: format!("{err:#}"),
                });
            }
        }
    }

    async fn post_multipart(&self, destination: Url, file: UploadFile) -> Result<()> {
        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename);
        if let Some(mime) = &file.mime_type {
            part = part
                .mime_str(mime)
                .context("invalid mime type for upload part")?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        // Arrival is the whole contract; the endpoint's status code is not
        // inspected.
        self.http
            .post(destination)
            .multipart(form)
            .send()
            .await
            .context("upload request failed")?;
        Ok(())
    }
}

/// The seam the desktop shell talks through; lets the command loop run
/// against a stand-in in tests.
#[async_trait]
pub trait GalleryHandle: Send + Sync {
    async fn fetch_page(&self, path: &str) -> Result<PageSnapshot>;
    async fn fetch_favorites(&self, path: &str) -> Result<PageSnapshot>;
    async fn search(&self, path: &str, keyword: &str) -> Result<PageSnapshot>;
    async fn fetch_bytes(&self, href: &str) -> Result<Vec<u8>>;
    async fn upload_files(&self, upload_url: &str, files: Vec<UploadFile>) -> Result<()>;
    async fn toggle_favorite(&self, form: &FavoriteForm, enable: bool) -> Result<()>;
    async fn create_folder(&self, path: &str, name: &str) -> Result<()>;
    async fn delete_item(&self, path: &str, name: &str) -> Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<GalleryEvent>;
}

#[async_trait]
impl GalleryHandle for Arc<GalleryClient> {
    async fn fetch_page(&self, path: &str) -> Result<PageSnapshot> {
        GalleryClient::fetch_page(self, path).await
    }

    async fn fetch_favorites(&self, path: &str) -> Result<PageSnapshot> {
        GalleryClient::fetch_favorites(self, path).await
    }

    async fn search(&self, path: &str, keyword: &str) -> Result<PageSnapshot> {
        GalleryClient::search(self, path, keyword).await
    }

    async fn fetch_bytes(&self, href: &str) -> Result<Vec<u8>> {
        GalleryClient::fetch_bytes(self, href).await
    }

    async fn upload_files(&self, upload_url: &str, files: Vec<UploadFile>) -> Result<()> {
        GalleryClient::upload_files(self, upload_url, files).await
    }

    async fn toggle_favorite(&self, form: &FavoriteForm, enable: bool) -> Result<()> {
        GalleryClient::toggle_favorite(self, form, enable).await
    }

    async fn create_folder(&self, path: &str, name: &str) -> Result<()> {
        GalleryClient::create_folder(self, path, name).await
    }

    async fn delete_item(&self, path: &str, name: &str) -> Result<()> {
        GalleryClient::delete_item(self, path, name).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<GalleryEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
