// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::tube::TubeStatus;

// 1. Totais (os cards do topo)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Totals {
    pub individuals: i64,
    pub samples: i64,
    pub tubes: i64,
    pub boxes: i64,
}

// 2. Tubos por status: as quatro chaves sempre presentes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCounts {
    pub empty: i64,
    pub critical: i64,
    pub low: i64,
    pub available: i64,
}

impl StatusCounts {
    /// Monta a partir das linhas (status, total) do GROUP BY.
    pub fn from_rows(rows: impl IntoIterator<Item = (String, i64)>) -> Self {
        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match TubeStatus::parse(&status) {
                Some(TubeStatus::Empty) => counts.empty += count,
                Some(TubeStatus::Critical) => counts.critical += count,
                Some(TubeStatus::Low) => counts.low += count,
                Some(TubeStatus::Available) => counts.available += count,
                None => tracing::warn!("Status desconhecido nas estatísticas: {status}"),
            }
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.empty + self.critical + self.low + self.available
    }
}

// 3. Gráficos
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BoxCount {
    pub box_id: i64,
    pub name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TypeCount {
    pub sample_type: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FamilyCount {
    pub family_id: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectCount {
    pub project: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Stats {
    pub totals: Totals,
    pub by_status: StatusCounts,
    pub by_box: Vec<BoxCount>,
    pub unboxed_tubes: i64,
    pub by_sample_type: Vec<TypeCount>,
    pub top_families: Vec<FamilyCount>,
    pub top_projects: Vec<ProjectCount>,
}
