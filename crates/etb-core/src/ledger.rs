//! Row mapping and append-at-end placement for the tabular store.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::{
    domain::ExpenseEntry,
    ports::{CellFormat, TabularStore},
    Result,
};

/// Columns of a text-entry row / a photo row. Order is fixed:
/// `author, date, time, amount, category[, url]`.
pub const TEXT_COLUMNS: usize = 5;
pub const PHOTO_COLUMNS: usize = 6;

/// 1-based positions of the cells that get a format applied after a write.
pub const DATE_COLUMN: u32 = 2;
pub const AMOUNT_COLUMN: u32 = 4;

/// Header label padded into the URL column the first time a photo row needs it.
const URL_HEADER: &str = "Ссылка";

/// A single typed cell value.
///
/// Dates and amounts are written as typed values, not display strings, so
/// spreadsheet functions (sums by day, filters) work on the columns without
/// re-parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    /// JSON value as sent to the store. Integral amounts become JSON
    /// integers so the cell is typed numerically (`1500`, never `1500.0`).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 9e15 => {
                serde_json::json!(*n as i64)
            }
            CellValue::Number(n) => serde_json::json!(*n),
            CellValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Build the fixed-order row for an entry. The URL cell is appended only for
/// photo entries, never interleaved.
pub fn entry_row(entry: &ExpenseEntry) -> Vec<CellValue> {
    let mut row = vec![
        CellValue::Text(entry.author.clone()),
        CellValue::Date(entry.stamp.date()),
        CellValue::Text(entry.stamp.time_display()),
        CellValue::Number(entry.amount),
        CellValue::Text(entry.category.clone()),
    ];
    if let Some(url) = &entry.attachment_url {
        row.push(CellValue::Text(url.clone()));
    }
    row
}

/// Render an amount for user-facing text: integral values lose the
/// fractional part (`1500`, not `1500.0`).
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 9e15 {
        return format!("{}", amount as i64);
    }
    format!("{amount}")
}

/// Confirmation text sent back to the submitter after a successful append.
pub fn confirmation(entry: &ExpenseEntry) -> String {
    match &entry.attachment_url {
        Some(url) => format!("✅ Фото сохранено!\n🔗 {url}"),
        None => format!(
            "✅ Записано: {} в {}",
            format_amount(entry.amount),
            entry.category
        ),
    }
}

/// Appends entries at the end of the tabular store.
///
/// Row placement is read-then-write (`occupied rows + 1`). The append lock
/// serializes that critical section, so concurrent submissions handled by
/// this process cannot land on the same row; other writers to the same sheet
/// are not serialized.
pub struct Ledger {
    store: Arc<dyn TabularStore>,
    append_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    /// Append one entry and return the 1-based row it landed on.
    pub async fn append(&self, entry: &ExpenseEntry) -> Result<u32> {
        let row = entry_row(entry);

        let index = {
            let _guard = self.append_lock.lock().await;

            if entry.is_photo() {
                self.pad_url_header().await?;
            }

            let index = self.store.occupied_rows().await? + 1;
            self.store.write_row(index, &row).await?;
            index
        };

        // Cosmetic: cell formats on the just-written row. The row content is
        // already durable, so a failure here is logged and swallowed.
        let formats = [
            (DATE_COLUMN, CellFormat::Date),
            (AMOUNT_COLUMN, CellFormat::Number),
        ];
        if let Err(e) = self.store.format_cells(index, &formats).await {
            tracing::warn!("cell formatting failed on row {index}: {e}");
        }

        Ok(index)
    }

    /// Pad the URL header cell when the header row is narrower than a photo row.
    async fn pad_url_header(&self) -> Result<()> {
        let header = self.store.header().await?;
        if header.len() < PHOTO_COLUMNS {
            self.store
                .write_header_cell(PHOTO_COLUMNS as u32, URL_HEADER)
                .await?;
        }
        Ok(())
    }

    /// Connectivity probe, used by the status command.
    pub async fn probe(&self) -> Result<()> {
        self.store.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Stamp;
    use crate::errors::Error;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex as StdMutex;

    fn stamp() -> Stamp {
        Stamp::from_utc(Utc.with_ymd_and_hms(2026, 8, 6, 11, 30, 0).unwrap(), 3)
    }

    fn text_entry(amount: f64, category: &str) -> ExpenseEntry {
        ExpenseEntry::text("@vasya".into(), stamp(), amount, category.into())
    }

    /// In-memory stand-in for the sheet: row 1 is the header.
    #[derive(Default)]
    struct MemStore {
        grid: StdMutex<Vec<Vec<CellValue>>>,
        format_calls: StdMutex<u32>,
        fail_writes: bool,
        fail_formats: bool,
    }

    impl MemStore {
        fn with_header(labels: &[&str]) -> Self {
            let store = Self::default();
            store
                .grid
                .lock()
                .unwrap()
                .push(labels.iter().map(|l| CellValue::Text(l.to_string())).collect());
            store
        }

        fn row(&self, index: u32) -> Vec<CellValue> {
            self.grid.lock().unwrap()[index as usize - 1].clone()
        }

        fn rows(&self) -> usize {
            self.grid.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TabularStore for MemStore {
        async fn occupied_rows(&self) -> Result<u32> {
            Ok(self.grid.lock().unwrap().len() as u32)
        }

        async fn write_row(&self, row: u32, cells: &[CellValue]) -> Result<()> {
            if self.fail_writes {
                return Err(Error::StoreUnavailable("write rejected".into()));
            }
            let mut grid = self.grid.lock().unwrap();
            let idx = row as usize - 1;
            while grid.len() <= idx {
                grid.push(Vec::new());
            }
            grid[idx] = cells.to_vec();
            Ok(())
        }

        async fn header(&self) -> Result<Vec<String>> {
            let grid = self.grid.lock().unwrap();
            Ok(grid
                .first()
                .map(|row| {
                    row.iter()
                        .map(|c| match c {
                            CellValue::Text(s) => s.clone(),
                            other => format!("{other:?}"),
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn write_header_cell(&self, column: u32, value: &str) -> Result<()> {
            let mut grid = self.grid.lock().unwrap();
            if grid.is_empty() {
                grid.push(Vec::new());
            }
            let header = &mut grid[0];
            while header.len() < column as usize {
                header.push(CellValue::Text(String::new()));
            }
            header[column as usize - 1] = CellValue::Text(value.to_string());
            Ok(())
        }

        async fn format_cells(&self, _row: u32, _formats: &[(u32, CellFormat)]) -> Result<()> {
            if self.fail_formats {
                return Err(Error::FormattingFailed("no grid access".into()));
            }
            *self.format_calls.lock().unwrap() += 1;
            Ok(())
        }

        async fn probe(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn text_entry_appends_five_columns_after_the_last_row() {
        let store = Arc::new(MemStore::with_header(&["Автор", "Дата", "Время", "Сумма", "Категория"]));
        let ledger = Ledger::new(store.clone());

        let row = ledger.append(&text_entry(150.0, "Кофе")).await.unwrap();
        assert_eq!(row, 2);

        let cells = store.row(2);
        assert_eq!(cells.len(), TEXT_COLUMNS);
        assert_eq!(cells[0], CellValue::Text("@vasya".into()));
        assert_eq!(cells[2], CellValue::Text("14:30".into()));
        assert_eq!(cells[3], CellValue::Number(150.0));
        assert_eq!(cells[4], CellValue::Text("Кофе".into()));
    }

    #[tokio::test]
    async fn sequential_appends_land_on_consecutive_rows() {
        let store = Arc::new(MemStore::with_header(&["Автор", "Дата", "Время", "Сумма", "Категория"]));
        let ledger = Ledger::new(store.clone());

        assert_eq!(ledger.append(&text_entry(1.0, "a")).await.unwrap(), 2);
        assert_eq!(ledger.append(&text_entry(2.0, "b")).await.unwrap(), 3);
        assert_eq!(ledger.append(&text_entry(3.0, "c")).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn concurrent_appends_never_share_a_row() {
        let store = Arc::new(MemStore::default());
        let ledger = Arc::new(Ledger::new(store.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.append(&text_entry(i as f64 + 1.0, "x")).await.unwrap() })
            })
            .collect();

        let mut rows = Vec::new();
        for t in tasks {
            rows.push(t.await.unwrap());
        }
        rows.sort_unstable();
        rows.dedup();
        assert_eq!(rows.len(), 8);
        assert_eq!(store.rows(), 8);
    }

    #[tokio::test]
    async fn photo_entry_appends_url_column_and_pads_the_header() {
        let store = Arc::new(MemStore::with_header(&["Автор", "Дата", "Время", "Сумма", "Категория"]));
        let ledger = Ledger::new(store.clone());

        let entry = ExpenseEntry::photo("@vasya".into(), stamp(), "https://cdn.example/x.jpg".into());
        let row = ledger.append(&entry).await.unwrap();

        let cells = store.row(row);
        assert_eq!(cells.len(), PHOTO_COLUMNS);
        assert_eq!(cells[3], CellValue::Number(0.0));
        assert_eq!(cells[4], CellValue::Text("фото".into()));
        assert_eq!(cells[5], CellValue::Text("https://cdn.example/x.jpg".into()));

        let header = store.row(1);
        assert_eq!(header.len(), PHOTO_COLUMNS);
        assert_eq!(header[5], CellValue::Text("Ссылка".into()));
    }

    #[tokio::test]
    async fn header_already_wide_enough_is_left_alone() {
        let store = Arc::new(MemStore::with_header(&[
            "Автор", "Дата", "Время", "Сумма", "Категория", "Link",
        ]));
        let ledger = Ledger::new(store.clone());

        let entry = ExpenseEntry::photo("@vasya".into(), stamp(), "https://cdn.example/x.jpg".into());
        ledger.append(&entry).await.unwrap();

        assert_eq!(store.row(1)[5], CellValue::Text("Link".into()));
    }

    #[tokio::test]
    async fn formatting_failure_does_not_fail_the_append() {
        let store = Arc::new(MemStore {
            fail_formats: true,
            ..MemStore::default()
        });
        let ledger = Ledger::new(store.clone());

        let row = ledger.append(&text_entry(10.0, "еда")).await.unwrap();
        assert_eq!(row, 1);
        assert_eq!(store.rows(), 1);
    }

    #[tokio::test]
    async fn repeated_formatting_leaves_the_written_value_intact() {
        let store = Arc::new(MemStore::with_header(&["a", "b", "c", "d", "e"]));
        let ledger = Ledger::new(store.clone());

        let row = ledger.append(&text_entry(1500.0, "техника")).await.unwrap();
        let before = store.row(row);

        let formats = [(DATE_COLUMN, CellFormat::Date), (AMOUNT_COLUMN, CellFormat::Number)];
        store.format_cells(row, &formats).await.unwrap();
        store.format_cells(row, &formats).await.unwrap();

        assert_eq!(store.row(row), before);
        assert!(*store.format_calls.lock().unwrap() >= 3);
    }

    #[tokio::test]
    async fn store_failure_surfaces_and_writes_nothing() {
        let store = Arc::new(MemStore {
            fail_writes: true,
            ..MemStore::default()
        });
        let ledger = Ledger::new(store.clone());

        let err = ledger.append(&text_entry(10.0, "еда")).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert_eq!(store.rows(), 0);
    }

    #[test]
    fn integral_amounts_serialize_as_json_integers() {
        assert_eq!(CellValue::Number(1500.0).to_json().to_string(), "1500");
        assert_eq!(CellValue::Number(99.9).to_json().to_string(), "99.9");
    }

    #[test]
    fn date_cells_serialize_as_iso_values() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(CellValue::Date(d).to_json(), serde_json::json!("2026-08-06"));
    }

    #[test]
    fn amount_display_round_trips_integral_values() {
        assert_eq!(format_amount(1500.0), "1500");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(99.9), "99.9");
    }

    #[test]
    fn confirmation_mentions_amount_and_category() {
        let text = confirmation(&text_entry(150.0, "Кофе"));
        assert!(text.contains("150"));
        assert!(text.contains("Кофе"));
        assert!(!text.contains("150.0"));

        let photo = ExpenseEntry::photo("@vasya".into(), stamp(), "https://cdn.example/x.jpg".into());
        assert!(confirmation(&photo).contains("https://cdn.example/x.jpg"));
    }
}
