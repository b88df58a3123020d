// src/db/individual_repo.rs

use std::collections::HashMap;

use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    common::{
        db_utils::{count_grouped, like_pattern},
        error::{map_unique_violation, AppError},
    },
    models::individual::{Individual, IndividualDraft, IndividualFilter, NameList},
};

#[derive(Clone)]
pub struct IndividualRepository;

/// Predicado comum da listagem e da contagem.
fn push_individual_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &IndividualFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (i.individual_code LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR i.aliases LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR i.family_id LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR i.projects LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(family) = &filter.family {
        qb.push(" AND i.family_id = ").push_bind(family.clone());
    }

    if let Some(project) = &filter.project {
        qb.push(" AND i.projects LIKE ")
            .push_bind(like_pattern(project))
            .push(" ESCAPE '\\'");
    }
}

impl IndividualRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Leitura
    // ---

    pub async fn count<'e, E>(&self, executor: E, filter: &IndividualFilter) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM individual i");
        push_individual_filters(&mut qb, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }

    /// Página ordenada pelo código do indivíduo.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &IndividualFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Individual>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb = QueryBuilder::new("SELECT i.* FROM individual i");
        push_individual_filters(&mut qb, filter);
        qb.push(" ORDER BY i.individual_code ASC, i.id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let individuals = qb.build_query_as::<Individual>().fetch_all(executor).await?;
        Ok(individuals)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Individual>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let individual = sqlx::query_as::<_, Individual>("SELECT * FROM individual WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(individual)
    }

    pub async fn exists<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM individual WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(found.is_some())
    }

    /// Famílias distintas, ordenadas.
    pub async fn families<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let families = sqlx::query_scalar(
            r#"
            SELECT DISTINCT family_id FROM individual
            WHERE family_id IS NOT NULL AND family_id <> ''
            ORDER BY family_id
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(families)
    }

    /// Coluna `projects` crua de cada indivíduo que tem algum projeto.
    pub async fn project_lists<'e, E>(&self, executor: E) -> Result<Vec<NameList>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let lists = sqlx::query_scalar::<_, NameList>(
            "SELECT projects FROM individual WHERE projects IS NOT NULL AND projects <> ''",
        )
        .fetch_all(executor)
        .await?;
        Ok(lists)
    }

    /// Contagem de amostras por indivíduo, em lote.
    pub async fn sample_counts(
        &self,
        conn: &mut SqliteConnection,
        individual_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AppError> {
        count_grouped(
            conn,
            "SELECT individual_id, COUNT(*) FROM sample WHERE individual_id IN",
            "GROUP BY individual_id",
            individual_ids,
        )
        .await
    }

    /// Contagem de tubos por indivíduo, via amostras.
    pub async fn tube_counts(
        &self,
        conn: &mut SqliteConnection,
        individual_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AppError> {
        count_grouped(
            conn,
            "SELECT s.individual_id, COUNT(t.id) FROM sample s JOIN tube t ON t.sample_id = s.id WHERE s.individual_id IN",
            "GROUP BY s.individual_id",
            individual_ids,
        )
        .await
    }

    // ---
    // Escrita
    // ---

    pub async fn create<'e, E>(&self, executor: E, draft: &IndividualDraft) -> Result<Individual, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Individual>(
            r#"
            INSERT INTO individual
                (individual_code, aliases, family_id, sex, phenotype, projects, other_family_codes, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&draft.individual_code)
        .bind(draft.aliases.to_db())
        .bind(&draft.family_id)
        .bind(draft.sex)
        .bind(&draft.phenotype)
        .bind(draft.projects.to_db())
        .bind(&draft.other_family_codes)
        .bind(&draft.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "individual", &draft.individual_code))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i64,
        draft: &IndividualDraft,
    ) -> Result<Option<Individual>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Individual>(
            r#"
            UPDATE individual SET
                individual_code = ?, aliases = ?, family_id = ?, sex = ?, phenotype = ?,
                projects = ?, other_family_codes = ?, notes = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&draft.individual_code)
        .bind(draft.aliases.to_db())
        .bind(&draft.family_id)
        .bind(draft.sex)
        .bind(&draft.phenotype)
        .bind(draft.projects.to_db())
        .bind(&draft.other_family_codes)
        .bind(&draft.notes)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, "individual", &draft.individual_code))
    }

    /// Retorna o número de linhas apagadas (0 ou 1).
    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM individual WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
