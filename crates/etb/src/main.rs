use std::sync::Arc;

use etb_cloudinary::CloudinaryClient;
use etb_core::{
    config::Config,
    ingest::PhotoIngestor,
    ledger::Ledger,
    ports::{BlobStore, TabularStore},
};
use etb_sheets::SheetsClient;

#[tokio::main]
async fn main() -> Result<(), etb_core::Error> {
    etb_core::logging::init("etb")?;

    let cfg = Arc::new(Config::load()?);

    let sheets: Arc<dyn TabularStore> = Arc::new(SheetsClient::new(
        &cfg.google_credentials_json,
        cfg.spreadsheet_id.clone(),
        cfg.http_timeout,
    )?);
    let ledger = Arc::new(Ledger::new(sheets));

    let ingestor = match &cfg.cloudinary {
        Some(c) => {
            let blob: Arc<dyn BlobStore> =
                Arc::new(CloudinaryClient::new(c.clone(), cfg.http_timeout)?);
            Some(Arc::new(PhotoIngestor::new(blob, ledger.clone())))
        }
        None => None,
    };

    etb_telegram::router::run(cfg, ledger, ingestor)
        .await
        .map_err(|e| etb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
