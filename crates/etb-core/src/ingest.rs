//! Photo ingestion: upload to the blob store, then append the derived entry.

use std::sync::Arc;

use crate::{
    domain::{ExpenseEntry, PhotoUpload},
    errors::Error,
    ledger::Ledger,
    ports::{BlobStore, ObjectKey},
    Result,
};

/// Fixed top-level folder for uploaded photos.
const PHOTO_FOLDER: &str = "telegram_bot";

/// Outcome of a fully successful ingestion.
#[derive(Clone, Debug)]
pub struct IngestReceipt {
    pub url: String,
    pub row: u32,
}

pub struct PhotoIngestor {
    blob: Arc<dyn BlobStore>,
    ledger: Arc<Ledger>,
}

impl PhotoIngestor {
    pub fn new(blob: Arc<dyn BlobStore>, ledger: Arc<Ledger>) -> Self {
        Self { blob, ledger }
    }

    /// Upload first, append second: a written row always references an
    /// already-durable blob. An upload failure is terminal and nothing is
    /// written; an append failure after a successful upload leaves the blob
    /// orphaned and is reported distinctly.
    pub async fn ingest(&self, upload: PhotoUpload) -> Result<IngestReceipt> {
        let key = object_key(&upload);

        let author = upload.author;
        let stamp = upload.stamp;
        let url = self.blob.upload(&key, upload.bytes).await?;
        if url.trim().is_empty() {
            return Err(Error::UploadFailed("store returned an empty URL".to_string()));
        }

        let entry = ExpenseEntry::photo(author, stamp, url.clone());
        match self.ledger.append(&entry).await {
            Ok(row) => Ok(IngestReceipt { url, row }),
            Err(e) => {
                tracing::error!("row append failed after upload, blob orphaned at {url}: {e}");
                Err(e)
            }
        }
    }

    /// Connectivity probe, used by the status command.
    pub async fn probe(&self) -> Result<()> {
        self.blob.probe().await
    }
}

/// `telegram_bot/<sanitized-author>_<timestamp>`. `@` is stripped; `.`, `:`
/// and spaces are unsafe in object names and become underscores.
pub fn object_key(upload: &PhotoUpload) -> ObjectKey {
    ObjectKey {
        folder: PHOTO_FOLDER.to_string(),
        name: format!(
            "{}_{}",
            sanitize_author(&upload.author),
            upload.stamp.key_timestamp()
        ),
    }
}

fn sanitize_author(author: &str) -> String {
    author
        .chars()
        .filter_map(|c| match c {
            '@' => None,
            '.' | ':' | ' ' => Some('_'),
            other => Some(other),
        })
        .collect()
}
