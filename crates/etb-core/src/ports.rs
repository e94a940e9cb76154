//! Ports to the two external stores.
//!
//! The interfaces are deliberately narrow (append a row, upload a blob) so
//! the parser/mapper/ingestion logic can be unit-tested against in-memory
//! fakes instead of live services.

use async_trait::async_trait;

use crate::{ledger::CellValue, Result};

/// Cell format hint applied after a write. Applying a format any number of
/// times must not alter the written value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellFormat {
    /// Date pattern (`dd.mm.yyyy`).
    Date,
    /// Number pattern with optional decimals.
    Number,
}

/// Append/update-capable spreadsheet-like service addressed by row/column
/// coordinates. Rows and columns are 1-based.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Number of currently occupied rows, header included.
    async fn occupied_rows(&self) -> Result<u32>;

    /// Write one row of typed cells starting at column 1.
    async fn write_row(&self, row: u32, cells: &[CellValue]) -> Result<()>;

    /// The header row, one string per occupied header cell.
    async fn header(&self) -> Result<Vec<String>>;

    /// Write a single header cell.
    async fn write_header_cell(&self, column: u32, value: &str) -> Result<()>;

    /// Apply cell formats to the given row. Cosmetic and idempotent.
    async fn format_cells(&self, row: u32, formats: &[(u32, CellFormat)]) -> Result<()>;

    /// Cheap connectivity/authentication check.
    async fn probe(&self) -> Result<()>;
}

/// Key of an uploaded object: a fixed top-level folder plus a name derived
/// from the author and a second-resolution timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectKey {
    pub folder: String,
    pub name: String,
}

impl ObjectKey {
    pub fn public_id(&self) -> String {
        format!("{}/{}", self.folder, self.name)
    }
}

/// Binary object storage returning a durable retrieval URL per upload.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload the bytes under `key` and return the durable URL.
    async fn upload(&self, key: &ObjectKey, bytes: Vec<u8>) -> Result<String>;

    /// Cheap connectivity/authentication check.
    async fn probe(&self) -> Result<()>;
}
