// src/db/sample_repo.rs

use std::collections::HashMap;

use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    common::{
        db_utils::{count_grouped, fetch_by_ids, like_pattern},
        error::{map_unique_violation, AppError},
    },
    models::{
        individual::IndividualRef,
        sample::{Sample, SampleDraft, SampleFilter},
    },
};

#[derive(Clone)]
pub struct SampleRepository;

fn push_sample_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SampleFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (s.sample_code LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR s.notes LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR s.individual_id IN (SELECT id FROM individual WHERE individual_code LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'))");
    }

    if let Some(individual_id) = filter.individual_id {
        qb.push(" AND s.individual_id = ").push_bind(individual_id);
    }

    if let Some(sample_type) = &filter.sample_type {
        qb.push(" AND s.sample_type = ").push_bind(sample_type.clone());
    }
}

impl SampleRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Leitura
    // ---

    pub async fn count<'e, E>(&self, executor: E, filter: &SampleFilter) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM sample s");
        push_sample_filters(&mut qb, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &SampleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Sample>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb = QueryBuilder::new("SELECT s.* FROM sample s");
        push_sample_filters(&mut qb, filter);
        qb.push(" ORDER BY s.sample_code ASC, s.id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let samples = qb.build_query_as::<Sample>().fetch_all(executor).await?;
        Ok(samples)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Sample>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sample = sqlx::query_as::<_, Sample>("SELECT * FROM sample WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sample)
    }

    pub async fn exists<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM sample WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(found.is_some())
    }

    /// Amostras de um indivíduo, pela ordem do código.
    pub async fn list_for_individual<'e, E>(
        &self,
        executor: E,
        individual_id: i64,
    ) -> Result<Vec<Sample>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let samples = sqlx::query_as::<_, Sample>(
            "SELECT * FROM sample WHERE individual_id = ? ORDER BY sample_code ASC, id ASC",
        )
        .bind(individual_id)
        .fetch_all(executor)
        .await?;
        Ok(samples)
    }

    pub async fn count_for_individual<'e, E>(&self, executor: E, individual_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM sample WHERE individual_id = ?")
            .bind(individual_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn distinct_types<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let types = sqlx::query_scalar(
            r#"
            SELECT DISTINCT sample_type FROM sample
            WHERE sample_type IS NOT NULL AND sample_type <> ''
            ORDER BY sample_type
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(types)
    }

    /// Indivíduos (id, código, família) das amostras da página, em lote.
    pub async fn individual_refs(
        &self,
        conn: &mut SqliteConnection,
        individual_ids: &[i64],
    ) -> Result<HashMap<i64, IndividualRef>, AppError> {
        let rows: Vec<IndividualRef> = fetch_by_ids(
            conn,
            "SELECT id, individual_code, family_id FROM individual",
            individual_ids,
        )
        .await?;
        Ok(rows.into_iter().map(|r| (r.id, r)).collect())
    }

    /// Contagem de tubos por amostra, em lote.
    pub async fn tube_counts(
        &self,
        conn: &mut SqliteConnection,
        sample_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AppError> {
        count_grouped(
            conn,
            "SELECT sample_id, COUNT(*) FROM tube WHERE sample_id IN",
            "GROUP BY sample_id",
            sample_ids,
        )
        .await
    }

    // ---
    // Escrita
    // ---

    pub async fn create<'e, E>(&self, executor: E, draft: &SampleDraft) -> Result<Sample, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Sample>(
            r#"
            INSERT INTO sample (sample_code, individual_id, sample_type, arrival_date, notes)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&draft.sample_code)
        .bind(draft.individual_id)
        .bind(&draft.sample_type)
        .bind(draft.arrival_date)
        .bind(&draft.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "sample", &draft.sample_code))
    }

    pub async fn update<'e, E>(&self, executor: E, id: i64, draft: &SampleDraft) -> Result<Option<Sample>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Sample>(
            r#"
            UPDATE sample SET
                sample_code = ?, individual_id = ?, sample_type = ?, arrival_date = ?, notes = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&draft.sample_code)
        .bind(draft.individual_id)
        .bind(&draft.sample_type)
        .bind(draft.arrival_date)
        .bind(&draft.notes)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, "sample", &draft.sample_code))
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sample WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
