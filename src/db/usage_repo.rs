// src/db/usage_repo.rs
//
// Histórico de retiradas. Não existe UPDATE nem DELETE aqui: a tabela é
// somente-inserção (os triggers do banco abortam qualquer tentativa).

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};

use crate::{
    common::error::AppError,
    models::usage::{TubeUsage, UsagePayload, UsageView},
};

#[derive(Clone)]
pub struct UsageRepository;

impl UsageRepository {
    pub fn new() -> Self {
        Self
    }

    /// Mais recentes primeiro, opcionalmente só de um tubo.
    pub async fn list<'e, E>(&self, executor: E, tube_id: Option<i64>, limit: i64) -> Result<Vec<UsageView>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let usages = sqlx::query_as::<_, UsageView>(
            r#"
            SELECT u.*, t.barcode AS tube_barcode
            FROM tube_usage u
            LEFT JOIN tube t ON t.id = u.tube_id
            WHERE (? IS NULL OR u.tube_id = ?)
            ORDER BY u.date_out DESC, u.id DESC
            LIMIT ?
            "#,
        )
        .bind(tube_id)
        .bind(tube_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(usages)
    }

    pub async fn count_for_tube<'e, E>(&self, executor: E, tube_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM tube_usage WHERE tube_id = ?")
            .bind(tube_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        payload: &UsagePayload,
        date_out: NaiveDate,
    ) -> Result<TubeUsage, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let usage = sqlx::query_as::<_, TubeUsage>(
            r#"
            INSERT INTO tube_usage (tube_id, user_name, date_out, date_return, volume_taken, purpose, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(payload.tube_id)
        .bind(&payload.user_name)
        .bind(date_out)
        .bind(payload.date_return)
        .bind(payload.volume_taken)
        .bind(&payload.purpose)
        .bind(&payload.notes)
        .fetch_one(executor)
        .await?;
        Ok(usage)
    }
}
