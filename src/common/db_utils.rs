use std::collections::HashMap;

use sqlx::{pool::PoolConnection, sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::common::error::AppError;
use crate::config::AppState;

/// Máximo de ids por cláusula `IN (...)` nas cargas em lote.
pub(crate) const IN_CHUNK_SIZE: usize = 500;

// ---
// Conexão por requisição
// ---
/// Adquire uma conexão da pool para a requisição.
/// Ela volta para a pool no `Drop`, em qualquer caminho de saída.
pub(crate) async fn acquire_connection(
    app_state: &AppState,
) -> Result<PoolConnection<Sqlite>, AppError> {
    let conn = app_state.db_pool.acquire().await?;
    Ok(conn)
}

/// Padrão `LIKE` para busca por substring, escapando `%`, `_` e `\`.
/// Usar sempre com `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Acrescenta `(?, ?, ...)` com os ids ligados.
pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push("(");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

/// Ids distintos e ordenados, para montar as cargas em lote.
pub(crate) fn distinct_ids(ids: impl IntoIterator<Item = Option<i64>>) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.into_iter().flatten().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

// ---
// Cargas em lote (sem ida ao banco por linha)
// ---
/// `{select} WHERE id IN (...)`, em lotes de `IN_CHUNK_SIZE` ids.
pub(crate) async fn fetch_by_ids<T>(
    conn: &mut SqliteConnection,
    select: &str,
    ids: &[i64],
) -> Result<Vec<T>, AppError>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut rows = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let mut qb = QueryBuilder::new(select);
        qb.push(" WHERE id IN ");
        push_id_list(&mut qb, chunk);
        rows.extend(qb.build_query_as::<T>().fetch_all(&mut *conn).await?);
    }

    Ok(rows)
}

/// Contagens agrupadas por uma chave: `select` termina em `... IN`,
/// o `GROUP BY` vem em `group_by`. Ids sem linha ficam fora do mapa.
pub(crate) async fn count_grouped(
    conn: &mut SqliteConnection,
    select: &str,
    group_by: &str,
    ids: &[i64],
) -> Result<HashMap<i64, i64>, AppError> {
    let mut counts = HashMap::with_capacity(ids.len());

    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let mut qb = QueryBuilder::new(select);
        qb.push(" ");
        push_id_list(&mut qb, chunk);
        qb.push(" ").push(group_by);

        let rows: Vec<(i64, i64)> = qb.build_query_as().fetch_all(&mut *conn).await?;
        counts.extend(rows);
    }

    Ok(counts)
}
