// Copyright (c) 2025 - Cowboy AI, Inc.
//! Dataset payload: a JSON array of fixed-arity game rows

use serde::Deserialize;

use super::LoadError;

/// One game with its description embedding
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IgdbRow {
    pub igdb_id: i64,
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub artwork_hash: Option<String>,
    pub screenshot_hash: Option<String>,
    pub embedding: Vec<f32>,
}

/// Positional wire form: `[id, name, summary, description, url, artwork, screenshot, embedding]`
#[derive(Deserialize)]
struct WireRow(
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Vec<f32>,
);

impl From<WireRow> for IgdbRow {
    fn from(w: WireRow) -> Self {
        Self {
            igdb_id: w.0,
            name: w.1,
            summary: w.2,
            description: w.3,
            url: w.4,
            artwork_hash: w.5,
            screenshot_hash: w.6,
            embedding: w.7,
        }
    }
}

/// Parse and validate the whole payload before anything touches the database
pub fn parse_payload(bytes: &[u8], dimension: usize) -> Result<Vec<IgdbRow>, LoadError> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(bytes)
        .map_err(|e| LoadError::PayloadParse(format!("expected a JSON array of rows: {e}")))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            let row: IgdbRow = serde_json::from_value::<WireRow>(value)
                .map_err(|e| LoadError::PayloadParse(format!("row {index}: {e}")))?
                .into();
            if row.embedding.len() != dimension {
                return Err(LoadError::PayloadParse(format!(
                    "row {index}: embedding has {} dimensions, expected {dimension}",
                    row.embedding.len()
                )));
            }
            Ok(row)
        })
        .collect()
}
