//! Google Sheets adapter.
//!
//! Implements the `etb-core` TabularStore port over the Sheets v4 values
//! API: `values/A:A` for the occupied row count, `values/A<n>` writes with
//! USER_ENTERED semantics (so date cells come out typed), and
//! `spreadsheets:batchUpdate` for the cosmetic cell formats.

mod auth;

pub use auth::{ServiceAccountKey, TokenProvider};

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use etb_core::{
    errors::Error,
    ledger::CellValue,
    ports::{CellFormat, TabularStore},
    Result,
};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsClient {
    spreadsheet_id: String,
    http: reqwest::Client,
    tokens: TokenProvider,
    // Numeric id of the first sheet, needed only for batchUpdate requests.
    sheet_id: Mutex<Option<i64>>,
}

impl SheetsClient {
    pub fn new(credentials_json: &str, spreadsheet_id: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;

        let key = ServiceAccountKey::from_json(credentials_json)?;
        let tokens = TokenProvider::new(key, http.clone())?;

        Ok(Self {
            spreadsheet_id,
            http,
            tokens,
            sheet_id: Mutex::new(None),
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!("{API_BASE}/{}/values/{range}", self.spreadsheet_id)
    }

    async fn get_values(&self, range: &str) -> Result<serde_json::Value> {
        let token = self.tokens.bearer().await?;
        let resp = self
            .http
            .get(self.values_url(range))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("sheets request failed: {e}")))?;
        Self::json_body(resp).await
    }

    async fn put_values(&self, range: &str, body: serde_json::Value) -> Result<()> {
        let token = self.tokens.bearer().await?;
        let url = format!("{}?valueInputOption=USER_ENTERED", self.values_url(range));
        let resp = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("sheets request failed: {e}")))?;
        Self::json_body(resp).await?;
        Ok(())
    }

    async fn json_body(resp: reqwest::Response) -> Result<serde_json::Value> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::StoreUnavailable(format!(
                "sheets API returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        resp.json()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("sheets response malformed: {e}")))
    }

    async fn first_sheet_id(&self) -> Result<i64> {
        let mut cached = self.sheet_id.lock().await;
        if let Some(id) = *cached {
            return Ok(id);
        }

        let token = self.tokens.bearer().await?;
        let url = format!(
            "{API_BASE}/{}?fields=sheets.properties.sheetId",
            self.spreadsheet_id
        );
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("sheets request failed: {e}")))?;
        let v = Self::json_body(resp).await?;

        let id = v["sheets"][0]["properties"]["sheetId"]
            .as_i64()
            .ok_or_else(|| Error::StoreUnavailable("spreadsheet has no sheets".to_string()))?;
        *cached = Some(id);
        Ok(id)
    }
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn occupied_rows(&self) -> Result<u32> {
        let v = self.get_values("A:A").await?;
        Ok(occupied_rows_from(&v))
    }

    async fn write_row(&self, row: u32, cells: &[CellValue]) -> Result<()> {
        let range = format!("A{row}");
        self.put_values(&range, value_range_body(&range, cells)).await
    }

    async fn header(&self) -> Result<Vec<String>> {
        let v = self.get_values("1:1").await?;
        Ok(header_from(&v))
    }

    async fn write_header_cell(&self, column: u32, value: &str) -> Result<()> {
        let range = format!("{}1", column_letter(column));
        let cells = [CellValue::Text(value.to_string())];
        self.put_values(&range, value_range_body(&range, &cells)).await
    }

    async fn format_cells(&self, row: u32, formats: &[(u32, CellFormat)]) -> Result<()> {
        let sheet_id = self
            .first_sheet_id()
            .await
            .map_err(|e| Error::FormattingFailed(e.to_string()))?;

        let requests: Vec<serde_json::Value> = formats
            .iter()
            .map(|&(column, format)| format_request(sheet_id, row, column, format))
            .collect();

        let token = self
            .tokens
            .bearer()
            .await
            .map_err(|e| Error::FormattingFailed(e.to_string()))?;
        let url = format!("{API_BASE}/{}:batchUpdate", self.spreadsheet_id);
        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| Error::FormattingFailed(format!("batchUpdate failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::FormattingFailed(format!(
                "batchUpdate returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        let token = self.tokens.bearer().await?;
        let url = format!("{API_BASE}/{}?fields=spreadsheetId", self.spreadsheet_id);
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("sheets unreachable: {e}")))?;
        Self::json_body(resp).await?;
        Ok(())
    }
}

/// 1-based column index to its A1-notation letters.
fn column_letter(column: u32) -> String {
    let mut n = column;
    let mut out = Vec::new();
    while n > 0 {
        out.push(b'A' + ((n - 1) % 26) as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Body for a `values` update: one row of typed cells.
fn value_range_body(range: &str, cells: &[CellValue]) -> serde_json::Value {
    let row: Vec<serde_json::Value> = cells.iter().map(CellValue::to_json).collect();
    serde_json::json!({
        "range": range,
        "majorDimension": "ROWS",
        "values": [row],
    })
}

fn occupied_rows_from(v: &serde_json::Value) -> u32 {
    v.get("values")
        .and_then(|x| x.as_array())
        .map(|a| a.len() as u32)
        .unwrap_or(0)
}

fn header_from(v: &serde_json::Value) -> Vec<String> {
    v.get("values")
        .and_then(|x| x.as_array())
        .and_then(|a| a.first())
        .and_then(|r| r.as_array())
        .map(|r| {
            r.iter()
                .map(|c| c.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// One `repeatCell` request pinning the number format of a single cell.
/// Repeating it any number of times leaves the cell value untouched.
fn format_request(sheet_id: i64, row: u32, column: u32, format: CellFormat) -> serde_json::Value {
    let (kind, pattern) = match format {
        CellFormat::Date => ("DATE", "dd.mm.yyyy"),
        CellFormat::Number => ("NUMBER", "0.##"),
    };

    serde_json::json!({
        "repeatCell": {
            "range": {
                "sheetId": sheet_id,
                "startRowIndex": row - 1,
                "endRowIndex": row,
                "startColumnIndex": column - 1,
                "endColumnIndex": column,
            },
            "cell": {
                "userEnteredFormat": { "numberFormat": { "type": kind, "pattern": pattern } }
            },
            "fields": "userEnteredFormat.numberFormat",
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn column_letters_cover_single_and_double_width() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(6), "F");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn value_range_keeps_integral_amounts_integral() {
        let cells = [
            CellValue::Text("@vasya".into()),
            CellValue::Date(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()),
            CellValue::Text("14:30".into()),
            CellValue::Number(1500.0),
            CellValue::Text("техника".into()),
        ];
        let body = value_range_body("A2", &cells);

        assert_eq!(body["range"], "A2");
        assert_eq!(body["values"][0][1], "2026-08-06");
        assert_eq!(body["values"][0][3], serde_json::json!(1500));
        assert_eq!(body["values"][0][3].to_string(), "1500");
    }

    #[test]
    fn row_count_handles_missing_values_key() {
        assert_eq!(occupied_rows_from(&serde_json::json!({})), 0);
        assert_eq!(
            occupied_rows_from(&serde_json::json!({"values": [["a"], ["b"], ["c"]]})),
            3
        );
    }

    #[test]
    fn header_parsing_handles_empty_sheets() {
        assert!(header_from(&serde_json::json!({})).is_empty());
        assert_eq!(
            header_from(&serde_json::json!({"values": [["Автор", "Дата"]]})),
            vec!["Автор".to_string(), "Дата".to_string()]
        );
    }

    #[test]
    fn format_requests_target_one_cell_with_the_right_pattern() {
        let req = format_request(0, 2, 4, CellFormat::Number);
        assert_eq!(req["repeatCell"]["range"]["startRowIndex"], 1);
        assert_eq!(req["repeatCell"]["range"]["endColumnIndex"], 4);
        assert_eq!(
            req["repeatCell"]["cell"]["userEnteredFormat"]["numberFormat"]["pattern"],
            "0.##"
        );

        let req = format_request(0, 2, 2, CellFormat::Date);
        assert_eq!(
            req["repeatCell"]["cell"]["userEnteredFormat"]["numberFormat"]["type"],
            "DATE"
        );
    }
}
