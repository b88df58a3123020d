// src/services/dashboard_service.rs

use sqlx::{Acquire, Executor, Sqlite};

use crate::{common::error::AppError, db::DashboardRepository, models::dashboard::Stats};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_stats<'e, E>(&self, executor: E) -> Result<Stats, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        self.repo.get_stats(executor).await
    }
}
