// src/db/dashboard_repo.rs

use std::collections::HashMap;

use sqlx::{Acquire, Executor, Sqlite};

use crate::{
    common::error::AppError,
    db::tube_repo::STATUS_SQL,
    models::{
        dashboard::{BoxCount, FamilyCount, ProjectCount, Stats, StatusCounts, Totals, TypeCount},
        individual::NameList,
    },
};

pub const TOP_N: usize = 5;

#[derive(Clone)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_stats<'e, E>(&self, executor: E) -> Result<Stats, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        // Uma transação só: todas as contagens veem o mesmo snapshot
        let mut tx = executor.begin().await?;

        // A. Totais
        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM individual) AS individuals,
                (SELECT COUNT(*) FROM sample)     AS samples,
                (SELECT COUNT(*) FROM tube)       AS tubes,
                (SELECT COUNT(*) FROM box)        AS boxes
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        // B. Tubos por status (mesmo CASE do filtro da listagem)
        let status_sql = format!("SELECT {STATUS_SQL} AS status, COUNT(*) FROM tube t GROUP BY status");
        let status_rows: Vec<(String, i64)> = sqlx::query_as(&status_sql).fetch_all(&mut *tx).await?;
        let by_status = StatusCounts::from_rows(status_rows);
        if by_status.total() != totals.tubes {
            tracing::warn!(
                "Contagem por status ({}) difere do total de tubos ({})",
                by_status.total(),
                totals.tubes
            );
        }

        // C. Tubos por caixa + tubos sem caixa
        let by_box = sqlx::query_as::<_, BoxCount>(
            r#"
            SELECT b.id AS box_id, b.name, COUNT(t.id) AS count
            FROM box b
            JOIN tube t ON t.box_id = b.id
            GROUP BY b.id, b.name
            ORDER BY b.name ASC, b.id ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let unboxed_tubes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tube WHERE box_id IS NULL")
            .fetch_one(&mut *tx)
            .await?;

        // D. Amostras por tipo
        let by_sample_type = sqlx::query_as::<_, TypeCount>(
            r#"
            SELECT sample_type, COUNT(*) AS count
            FROM sample
            GROUP BY sample_type
            ORDER BY count DESC, sample_type ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        // E. Top famílias
        let top_families = sqlx::query_as::<_, FamilyCount>(
            r#"
            SELECT family_id, COUNT(*) AS count
            FROM individual
            WHERE family_id IS NOT NULL AND family_id <> ''
            GROUP BY family_id
            ORDER BY count DESC, family_id ASC
            LIMIT ?
            "#,
        )
        .bind(TOP_N as i64)
        .fetch_all(&mut *tx)
        .await?;

        // F. Top projetos (a coluna é uma lista, a contagem é feita aqui)
        let project_lists = sqlx::query_scalar::<_, NameList>(
            "SELECT projects FROM individual WHERE projects IS NOT NULL AND projects <> ''",
        )
        .fetch_all(&mut *tx)
        .await?;
        let top_projects = top_projects(&project_lists, TOP_N);

        tx.commit().await?;

        Ok(Stats {
            totals,
            by_status,
            by_box,
            unboxed_tubes,
            by_sample_type,
            top_families,
            top_projects,
        })
    }
}

/// Conta cada projeto uma vez por indivíduo; empate desempata pelo nome.
pub fn top_projects(lists: &[NameList], n: usize) -> Vec<ProjectCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for list in lists {
        let mut seen: Vec<&str> = list.iter().collect();
        seen.sort_unstable();
        seen.dedup();
        for project in seen {
            *counts.entry(project).or_default() += 1;
        }
    }

    let mut ranked: Vec<ProjectCount> = counts
        .into_iter()
        .map(|(project, count)| ProjectCount {
            project: project.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.project.cmp(&b.project)));
    ranked.truncate(n);
    ranked
}
