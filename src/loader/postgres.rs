// Copyright (c) 2025 - Cowboy AI, Inc.
//! PostgreSQL + pgvector adapter

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::debug;

use super::sql;
use super::{DatabaseCredentials, IgdbRow, LoadError, VectorDatabase, VectorSession};
use crate::state_machine::LoadStep;

fn db_err(step: LoadStep) -> impl Fn(sqlx::Error) -> LoadError {
    move |e| LoadError::Database {
        step,
        details: e.to_string(),
    }
}

/// Connects with the resolved credentials over TLS when offered
#[derive(Debug, Default, Clone, Copy)]
pub struct PgVectorDatabase;

#[async_trait]
impl VectorDatabase for PgVectorDatabase {
    async fn connect(
        &self,
        credentials: &DatabaseCredentials,
    ) -> Result<Box<dyn VectorSession>, LoadError> {
        let mut options = PgConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.username)
            .password(credentials.password.expose());
        if let Some(dbname) = &credentials.dbname {
            options = options.database(dbname);
        }
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(db_err(LoadStep::Connect))?;
        debug!(host = %credentials.host, port = credentials.port, "connected");
        Ok(Box::new(PgVectorSession { conn }))
    }
}

pub struct PgVectorSession {
    conn: PgConnection,
}

#[async_trait]
impl VectorSession for PgVectorSession {
    async fn ensure_extension(&mut self) -> Result<(), LoadError> {
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql::CREATE_EXTENSION))
            .await
            .map_err(db_err(LoadStep::Connect))?;
        Ok(())
    }

    async fn recreate_table(&mut self, dimension: usize) -> Result<(), LoadError> {
        let create = sql::create_table(dimension);
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql::DROP_TABLE))
            .await
            .map_err(db_err(LoadStep::RecreateTable))?;
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(&create))
            .await
            .map_err(db_err(LoadStep::RecreateTable))?;
        Ok(())
    }

    async fn insert_rows(&mut self, rows: &[IgdbRow]) -> Result<u64, LoadError> {
        let err = db_err(LoadStep::InsertRows);
        let mut tx = self.conn.begin().await.map_err(&err)?;
        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(sql::INSERT_ROW)
                .bind(row.igdb_id)
                .bind(&row.name)
                .bind(&row.summary)
                .bind(&row.description)
                .bind(&row.url)
                .bind(&row.artwork_hash)
                .bind(&row.screenshot_hash)
                .bind(sql::vector_literal(&row.embedding))
                .execute(&mut *tx)
                .await
                .map_err(&err)?;
            inserted += result.rows_affected();
        }
        tx.commit().await.map_err(&err)?;
        Ok(inserted)
    }

    async fn create_index(&mut self, lists: u32) -> Result<(), LoadError> {
        let statement = sql::create_index(lists);
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(&statement))
            .await
            .map_err(db_err(LoadStep::CreateIndex))?;
        Ok(())
    }

    async fn analyze(&mut self) -> Result<(), LoadError> {
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql::VACUUM_ANALYZE))
            .await
            .map_err(db_err(LoadStep::Analyze))?;
        Ok(())
    }
}
