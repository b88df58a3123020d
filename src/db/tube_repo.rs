// src/db/tube_repo.rs

use std::collections::HashMap;

use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    common::{
        db_utils::{distinct_ids, fetch_by_ids, like_pattern, push_id_list, IN_CHUNK_SIZE},
        error::{map_unique_violation, AppError},
    },
    models::{
        individual::IndividualRef,
        tube::{BoxRef, SampleRef, Tube, TubeDraft, TubeFilter, TubeView},
    },
};

/// Status derivado em SQL (alias `t`), espelho de `TubeStatus::classify`.
/// Usado no filtro por status e no GROUP BY das estatísticas.
pub const STATUS_SQL: &str = "CASE \
    WHEN t.current_volume IS NULL OR t.current_volume <= 0 THEN 'Empty' \
    WHEN t.current_volume < 10 THEN 'Critical' \
    WHEN t.initial_volume IS NOT NULL AND t.current_volume < t.initial_volume * 0.25 THEN 'Low' \
    ELSE 'Available' END";

#[derive(Clone)]
pub struct TubeRepository;

// Só a UNIQUE do barcode vira 409 aqui; a da posição é coberta pela
// checagem prévia do serviço, na mesma transação.
fn map_tube_write_error(e: sqlx::Error, barcode: &str) -> AppError {
    let is_barcode = matches!(
        &e,
        sqlx::Error::Database(db_err) if db_err.message().contains("tube.barcode")
    );
    if is_barcode {
        map_unique_violation(e, "tube", barcode)
    } else {
        e.into()
    }
}

/// Único ponto onde o `TubeFilter` vira SQL: contagem, página e exportação
/// passam todas por aqui.
pub(crate) fn push_tube_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TubeFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (t.barcode LIKE ")
            .push_bind(pattern.clone())
            .push(
                " ESCAPE '\\' OR t.sample_id IN (SELECT s.id FROM sample s \
                 LEFT JOIN individual i ON i.id = s.individual_id \
                 WHERE s.sample_code LIKE ",
            )
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR i.individual_code LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'))");
    }

    if let Some(box_id) = filter.box_id {
        qb.push(" AND t.box_id = ").push_bind(box_id);
    }

    if let Some(status) = filter.status {
        qb.push(" AND (")
            .push(STATUS_SQL)
            .push(") = ")
            .push_bind(status.as_str());
    }

    if let Some(kind) = filter.kind {
        qb.push(" AND t.tube_type = ").push_bind(kind);
    }
}

impl TubeRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Listagem filtrada
    // ---

    pub async fn count<'e, E>(&self, executor: E, filter: &TubeFilter) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM tube t");
        push_tube_filters(&mut qb, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(total)
    }

    /// Ordem estável (barcode, id). `page = Some((limit, offset))`; `None` traz tudo.
    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &TubeFilter,
        page: Option<(i64, i64)>,
    ) -> Result<Vec<Tube>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb = QueryBuilder::new("SELECT t.* FROM tube t");
        push_tube_filters(&mut qb, filter);
        qb.push(" ORDER BY t.barcode ASC, t.id ASC");

        if let Some((limit, offset)) = page {
            qb.push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(offset);
        }

        let tubes = qb.build_query_as::<Tube>().fetch_all(executor).await?;
        Ok(tubes)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Tube>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let tube = sqlx::query_as::<_, Tube>("SELECT * FROM tube WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(tube)
    }

    /// Tubo que ocupa a posição, ignorando `exclude_id` (o próprio tubo numa edição).
    pub async fn find_in_slot<'e, E>(
        &self,
        executor: E,
        box_id: i64,
        row: i64,
        col: i64,
        exclude_id: Option<i64>,
    ) -> Result<Option<Tube>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let tube = sqlx::query_as::<_, Tube>(
            r#"
            SELECT * FROM tube
            WHERE box_id = ? AND position_row = ? AND position_col = ?
              AND (? IS NULL OR id <> ?)
            LIMIT 1
            "#,
        )
        .bind(box_id)
        .bind(row)
        .bind(col)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_optional(executor)
        .await?;
        Ok(tube)
    }

    /// Tubos de uma caixa, na ordem da grade.
    pub async fn list_for_box<'e, E>(&self, executor: E, box_id: i64) -> Result<Vec<Tube>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let tubes = sqlx::query_as::<_, Tube>(
            r#"
            SELECT * FROM tube WHERE box_id = ?
            ORDER BY position_row ASC, position_col ASC, barcode ASC, id ASC
            "#,
        )
        .bind(box_id)
        .fetch_all(executor)
        .await?;
        Ok(tubes)
    }

    pub async fn count_for_box<'e, E>(&self, executor: E, box_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM tube WHERE box_id = ?")
            .bind(box_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn count_for_sample<'e, E>(&self, executor: E, sample_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM tube WHERE sample_id = ?")
            .bind(sample_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// Contagem de tubos por caixa (um único GROUP BY).
    pub async fn counts_by_box<'e, E>(&self, executor: E) -> Result<HashMap<i64, i64>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT box_id, COUNT(*) FROM tube WHERE box_id IS NOT NULL GROUP BY box_id",
        )
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Tubos de várias amostras de uma vez (ficha do sujet).
    pub async fn list_for_samples(
        &self,
        conn: &mut SqliteConnection,
        sample_ids: &[i64],
    ) -> Result<Vec<Tube>, AppError> {
        let mut tubes: Vec<Tube> = Vec::new();
        for chunk in sample_ids.chunks(IN_CHUNK_SIZE) {
            let mut qb = QueryBuilder::new("SELECT * FROM tube WHERE sample_id IN ");
            push_id_list(&mut qb, chunk);
            qb.push(" ORDER BY barcode ASC, id ASC");
            tubes.extend(qb.build_query_as::<Tube>().fetch_all(&mut *conn).await?);
        }
        Ok(tubes)
    }

    // ---
    // Projeção: amostras, indivíduos e caixas em três cargas em lote
    // ---
    pub async fn project(
        &self,
        conn: &mut SqliteConnection,
        tubes: Vec<Tube>,
    ) -> Result<Vec<TubeView>, AppError> {
        let sample_ids = distinct_ids(tubes.iter().map(|t| t.sample_id));
        let samples: HashMap<i64, SampleRef> = fetch_by_ids::<SampleRef>(
            &mut *conn,
            "SELECT id, sample_code, individual_id FROM sample",
            &sample_ids,
        )
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

        let individual_ids = distinct_ids(samples.values().map(|s| s.individual_id));
        let individuals: HashMap<i64, IndividualRef> = fetch_by_ids::<IndividualRef>(
            &mut *conn,
            "SELECT id, individual_code, family_id FROM individual",
            &individual_ids,
        )
        .await?
        .into_iter()
        .map(|i| (i.id, i))
        .collect();

        let box_ids = distinct_ids(tubes.iter().map(|t| t.box_id));
        let boxes: HashMap<i64, BoxRef> =
            fetch_by_ids::<BoxRef>(&mut *conn, "SELECT id, name, freezer FROM box", &box_ids)
                .await?
                .into_iter()
                .map(|b| (b.id, b))
                .collect();

        let views = tubes
            .into_iter()
            .map(|tube| {
                let sample = tube.sample_id.and_then(|id| samples.get(&id));
                let individual = sample
                    .and_then(|s| s.individual_id)
                    .and_then(|id| individuals.get(&id));
                let storage_box = tube.box_id.and_then(|id| boxes.get(&id));
                TubeView::project(tube, sample, individual, storage_box)
            })
            .collect();

        Ok(views)
    }

    // ---
    // Escrita
    // ---

    pub async fn create<'e, E>(&self, executor: E, draft: &TubeDraft) -> Result<Tube, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Tube>(
            r#"
            INSERT INTO tube (
                barcode, sample_id, box_id, position_row, position_col, concentration,
                quality, initial_volume, current_volume, source, tube_type, notes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&draft.barcode)
        .bind(draft.sample_id)
        .bind(draft.box_id)
        .bind(draft.position_row)
        .bind(draft.position_col)
        .bind(draft.concentration)
        .bind(&draft.quality)
        .bind(draft.initial_volume)
        .bind(draft.current_volume)
        .bind(&draft.source)
        .bind(draft.tube_type)
        .bind(&draft.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| map_tube_write_error(e, &draft.barcode))
    }

    pub async fn update<'e, E>(&self, executor: E, id: i64, draft: &TubeDraft) -> Result<Option<Tube>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Tube>(
            r#"
            UPDATE tube SET
                barcode = ?, sample_id = ?, box_id = ?, position_row = ?, position_col = ?,
                concentration = ?, quality = ?, initial_volume = ?, current_volume = ?,
                source = ?, tube_type = ?, notes = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&draft.barcode)
        .bind(draft.sample_id)
        .bind(draft.box_id)
        .bind(draft.position_row)
        .bind(draft.position_col)
        .bind(draft.concentration)
        .bind(&draft.quality)
        .bind(draft.initial_volume)
        .bind(draft.current_volume)
        .bind(&draft.source)
        .bind(draft.tube_type)
        .bind(&draft.notes)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_tube_write_error(e, &draft.barcode))
    }

    /// Desconta o volume retirado (só quando o volume atual é conhecido).
    pub async fn decrement_volume<'e, E>(&self, executor: E, id: i64, amount: f64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            UPDATE tube
            SET current_volume = current_volume - ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND current_volume IS NOT NULL
            "#,
        )
        .bind(amount)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tube WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
