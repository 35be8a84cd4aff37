// Copyright (c) 2025 - Cowboy AI, Inc.
//! Statements run against the target database

pub const TABLE: &str = "igdb";

pub const CREATE_EXTENSION: &str = "CREATE EXTENSION IF NOT EXISTS vector";

pub const DROP_TABLE: &str = "DROP TABLE IF EXISTS igdb";

pub const INSERT_ROW: &str = "INSERT INTO igdb \
     (igdb_id, name, summary, description, url, artwork_hash, screenshot_hash, description_embeddings) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8::vector)";

pub const VACUUM_ANALYZE: &str = "VACUUM ANALYZE igdb";

pub fn create_table(dimension: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS igdb(\
         igdb_id bigserial primary key, \
         name text, \
         summary text, \
         description text, \
         url text, \
         artwork_hash text, \
         screenshot_hash text, \
         description_embeddings vector({dimension}))"
    )
}

/// Cosine-distance ivfflat index on the embedding column
pub fn create_index(lists: u32) -> String {
    format!(
        "CREATE INDEX ON igdb USING ivfflat (description_embeddings vector_cosine_ops) \
         WITH (lists = {lists})"
    )
}

/// pgvector text form: `[0.1,0.2,...]`
pub fn vector_literal(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}
