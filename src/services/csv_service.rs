use std::collections::BTreeMap;

use reqwest::Client;

use crate::error::ApiError;

/// One CSV data line, keyed by trimmed header name.
pub type RecipientRow = BTreeMap<String, String>;

pub async fn fetch_csv(client: &Client, url: &str) -> Result<String, ApiError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("csv fetch failed: {e}")))?;
    if !resp.status().is_success() {
        return Err(ApiError::Upstream(format!(
            "csv fetch returned {}",
            resp.status()
        )));
    }
    resp.text()
        .await
        .map_err(|e| ApiError::Upstream(format!("csv read failed: {e}")))
}

/// Naive CSV split: first line is the header, every field is trimmed, and
/// rows shorter than the header are padded with empty strings. Quoted
/// fields containing commas or embedded newlines are split incorrectly;
/// that is a known limitation of this format, kept as-is.
pub fn parse_rows(text: &str) -> (Vec<String>, Vec<RecipientRow>) {
    let mut lines = text.trim().lines();
    let headers: Vec<String> = match lines.next() {
        Some(line) => line.split(',').map(|h| h.trim().to_string()).collect(),
        None => return (Vec::new(), Vec::new()),
    };

    let rows = lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(|v| v.trim()).collect();
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    (
                        header.clone(),
                        values.get(i).map(|v| v.to_string()).unwrap_or_default(),
                    )
                })
                .collect::<RecipientRow>()
        })
        .collect();

    (headers, rows)
}
