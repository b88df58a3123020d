// src/db/box_repo.rs

use sqlx::{Executor, Sqlite};

use crate::{
    common::error::AppError,
    models::storage_box::{BoxDraft, StorageBox},
};

#[derive(Clone)]
pub struct BoxRepository;

impl BoxRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<StorageBox>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let boxes = sqlx::query_as::<_, StorageBox>("SELECT * FROM box ORDER BY name ASC, id ASC")
            .fetch_all(executor)
            .await?;
        Ok(boxes)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<StorageBox>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let storage_box = sqlx::query_as::<_, StorageBox>("SELECT * FROM box WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(storage_box)
    }

    pub async fn create<'e, E>(&self, executor: E, draft: &BoxDraft) -> Result<StorageBox, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let storage_box = sqlx::query_as::<_, StorageBox>(
            r#"
            INSERT INTO box (name, box_type, freezer, grid_rows, grid_cols, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(draft.box_type)
        .bind(&draft.freezer)
        .bind(draft.grid_rows)
        .bind(draft.grid_cols)
        .bind(&draft.notes)
        .fetch_one(executor)
        .await?;
        Ok(storage_box)
    }

    pub async fn update<'e, E>(&self, executor: E, id: i64, draft: &BoxDraft) -> Result<Option<StorageBox>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let storage_box = sqlx::query_as::<_, StorageBox>(
            r#"
            UPDATE box SET
                name = ?, box_type = ?, freezer = ?, grid_rows = ?, grid_cols = ?, notes = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(draft.box_type)
        .bind(&draft.freezer)
        .bind(draft.grid_rows)
        .bind(draft.grid_cols)
        .bind(&draft.notes)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(storage_box)
    }

    /// Maior linha/coluna ocupada (para não encolher a grade por cima de tubos).
    pub async fn occupied_extent<'e, E>(&self, executor: E, id: i64) -> Result<(i64, i64), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let extent: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(MAX(position_row), 0), COALESCE(MAX(position_col), 0)
            FROM tube WHERE box_id = ?
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(extent)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM box WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
