// src/services/storage_service.rs
//
// Caixas do congelador.

use sqlx::{Acquire, Executor, Sqlite};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{BoxRepository, TubeRepository},
    models::{
        storage_box::{BoxDetail, BoxDraft, BoxPatch, BoxView, StorageBox},
        tube::position_display,
    },
};

#[derive(Clone)]
pub struct StorageService {
    box_repo: BoxRepository,
    tube_repo: TubeRepository,
}

impl StorageService {
    pub fn new(box_repo: BoxRepository, tube_repo: TubeRepository) -> Self {
        Self { box_repo, tube_repo }
    }

    /// Caixas + contagem de tubos (um GROUP BY para todas).
    pub async fn list_boxes<'e, E>(&self, executor: E) -> Result<Vec<BoxView>, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;
        let boxes = self.box_repo.list(&mut *tx).await?;
        let counts = self.tube_repo.counts_by_box(&mut *tx).await?;
        tx.commit().await?;

        Ok(boxes
            .into_iter()
            .map(|b| {
                let count = counts.get(&b.id).copied().unwrap_or(0);
                BoxView::new(b, count)
            })
            .collect())
    }

    pub async fn get_box<'e, E>(&self, executor: E, id: i64) -> Result<BoxDetail, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let storage_box = self
            .box_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "box", id })?;
        let tubes = self.tube_repo.list_for_box(&mut *tx, id).await?;
        let tubes = self.tube_repo.project(&mut tx, tubes).await?;

        tx.commit().await?;

        Ok(BoxDetail {
            capacity: storage_box.capacity(),
            tube_count: tubes.len(),
            storage_box,
            tubes,
        })
    }

    pub async fn create_box<'e, E>(&self, executor: E, draft: BoxDraft) -> Result<StorageBox, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let draft = draft.normalized();
        draft.validate()?;

        let mut tx = executor.begin().await?;
        let storage_box = self.box_repo.create(&mut *tx, &draft).await?;
        tx.commit().await?;

        tracing::info!("Caixa criada: {:?} ({})", storage_box.name, storage_box.id);
        Ok(storage_box)
    }

    /// A grade não pode encolher por cima de tubos já posicionados.
    pub async fn update_box<'e, E>(&self, executor: E, id: i64, patch: BoxPatch) -> Result<StorageBox, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .box_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "box", id })?;

        let mut draft = BoxDraft::from(&current);
        patch.apply_to(&mut draft);
        let draft = draft.normalized();
        draft.validate()?;

        let (max_row, max_col) = self.box_repo.occupied_extent(&mut *tx, id).await?;
        if max_row > draft.grid_rows || max_col > draft.grid_cols {
            return Err(AppError::SlotOutOfGrid {
                position: position_display(Some(max_row), Some(max_col)).unwrap_or_default(),
                rows: draft.grid_rows,
                cols: draft.grid_cols,
            });
        }

        let updated = self
            .box_repo
            .update(&mut *tx, id, &draft)
            .await?
            .ok_or(AppError::NotFound { entity: "box", id })?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Nunca apaga tubos: caixa ocupada devolve 409.
    pub async fn delete_box<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        if self.box_repo.find_by_id(&mut *tx, id).await?.is_none() {
            return Err(AppError::NotFound { entity: "box", id });
        }
        if self.tube_repo.count_for_box(&mut *tx, id).await? > 0 {
            return Err(AppError::DeleteBlocked {
                entity: "box",
                dependents: "tubes",
            });
        }

        self.box_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Caixa {id} excluída");
        Ok(())
    }
}
