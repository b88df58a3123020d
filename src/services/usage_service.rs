// src/services/usage_service.rs

use chrono::Utc;
use sqlx::{Acquire, Executor, Sqlite};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{TubeRepository, UsageRepository},
    models::usage::{TubeUsage, UsagePayload, UsageView},
};

#[derive(Clone)]
pub struct UsageService {
    usage_repo: UsageRepository,
    tube_repo: TubeRepository,
}

impl UsageService {
    pub fn new(usage_repo: UsageRepository, tube_repo: TubeRepository) -> Self {
        Self { usage_repo, tube_repo }
    }

    pub async fn list_usages<'e, E>(&self, executor: E, tube_id: Option<i64>, limit: i64) -> Result<Vec<UsageView>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        self.usage_repo.list(executor, tube_id, limit).await
    }

    /// Histórico de um tubo existente (404 se o tubo não existe).
    pub async fn list_for_tube<'e, E>(&self, executor: E, tube_id: i64, limit: i64) -> Result<Vec<UsageView>, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        if self.tube_repo.find_by_id(&mut *tx, tube_id).await?.is_none() {
            return Err(AppError::NotFound { entity: "tube", id: tube_id });
        }
        let usages = self.usage_repo.list(&mut *tx, Some(tube_id), limit).await?;

        tx.commit().await?;
        Ok(usages)
    }

    /// Registra a retirada e desconta o volume do tubo na mesma transação.
    pub async fn record_usage<'e, E>(&self, executor: E, payload: UsagePayload) -> Result<TubeUsage, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let payload = payload.normalized();
        payload.validate()?;

        let mut tx = executor.begin().await?;

        let tube = self
            .tube_repo
            .find_by_id(&mut *tx, payload.tube_id)
            .await?
            .ok_or(AppError::NotFound { entity: "tube", id: payload.tube_id })?;

        if let (Some(requested), Some(available)) = (payload.volume_taken, tube.current_volume) {
            if requested > available {
                return Err(AppError::InsufficientVolume { available, requested });
            }
        }

        let date_out = payload.date_out.unwrap_or_else(|| Utc::now().date_naive());
        let usage = self.usage_repo.insert(&mut *tx, &payload, date_out).await?;

        if let Some(volume) = payload.volume_taken {
            self.tube_repo.decrement_volume(&mut *tx, tube.id, volume).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Uso registrado no tubo {}: {:?} µL",
            tube.barcode,
            payload.volume_taken
        );
        Ok(usage)
    }
}
