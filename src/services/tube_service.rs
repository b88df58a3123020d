// src/services/tube_service.rs

use sqlx::{Acquire, Executor, Sqlite, SqliteConnection};
use validator::Validate;

use crate::{
    common::{error::AppError, params::PageRequest},
    db::{BoxRepository, SampleRepository, TubeRepository, UsageRepository},
    models::{
        pagination::Paginated,
        tube::{position_display, TubeDraft, TubeFilter, TubePatch, TubeView},
    },
};

#[derive(Clone)]
pub struct TubeService {
    tube_repo: TubeRepository,
    sample_repo: SampleRepository,
    box_repo: BoxRepository,
    usage_repo: UsageRepository,
}

impl TubeService {
    pub fn new(
        tube_repo: TubeRepository,
        sample_repo: SampleRepository,
        box_repo: BoxRepository,
        usage_repo: UsageRepository,
    ) -> Self {
        Self {
            tube_repo,
            sample_repo,
            box_repo,
            usage_repo,
        }
    }

    // ---
    // Leitura
    // ---

    /// Página filtrada + total calculado com o mesmo predicado.
    pub async fn list_tubes<'e, E>(
        &self,
        executor: E,
        filter: &TubeFilter,
        page: PageRequest,
    ) -> Result<Paginated<TubeView>, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let total = self.tube_repo.count(&mut *tx, filter).await?;
        let tubes = self
            .tube_repo
            .list(&mut *tx, filter, Some((page.per_page, page.offset())))
            .await?;
        let views = self.tube_repo.project(&mut tx, tubes).await?;

        tx.commit().await?;
        Ok(Paginated::new(views, total, page))
    }

    pub async fn get_tube<'e, E>(&self, executor: E, id: i64) -> Result<TubeView, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;
        let view = self.load_view(&mut tx, id).await?;
        tx.commit().await?;
        Ok(view)
    }

    async fn load_view(&self, conn: &mut SqliteConnection, id: i64) -> Result<TubeView, AppError> {
        let tube = self
            .tube_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound { entity: "tube", id })?;

        self.tube_repo
            .project(conn, vec![tube])
            .await?
            .pop()
            .ok_or(AppError::NotFound { entity: "tube", id })
    }

    // ---
    // Regras de escrita
    // ---

    /// Amostra existente, posição completa e só dentro de caixa, dentro da grade e livre.
    async fn check_placement(
        &self,
        conn: &mut SqliteConnection,
        draft: &TubeDraft,
        tube_id: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(sample_id) = draft.sample_id {
            if !self.sample_repo.exists(&mut *conn, sample_id).await? {
                return Err(AppError::NotFound { entity: "sample", id: sample_id });
            }
        }

        if draft.position_row.is_some() != draft.position_col.is_some() {
            return Err(AppError::IncompletePosition);
        }

        let Some(box_id) = draft.box_id else {
            if draft.position_row.is_some() {
                return Err(AppError::PositionWithoutBox);
            }
            return Ok(());
        };

        let storage_box = self
            .box_repo
            .find_by_id(&mut *conn, box_id)
            .await?
            .ok_or(AppError::NotFound { entity: "box", id: box_id })?;

        let (Some(row), Some(col)) = (draft.position_row, draft.position_col) else {
            return Ok(());
        };
        let position = position_display(Some(row), Some(col)).unwrap_or_default();

        if !storage_box.contains_slot(row, col) {
            return Err(AppError::SlotOutOfGrid {
                position,
                rows: storage_box.grid_rows,
                cols: storage_box.grid_cols,
            });
        }

        if let Some(occupant) = self
            .tube_repo
            .find_in_slot(&mut *conn, box_id, row, col, tube_id)
            .await?
        {
            return Err(AppError::SlotOccupied {
                box_id,
                position,
                occupant: occupant.barcode,
            });
        }

        Ok(())
    }

    pub async fn create_tube<'e, E>(&self, executor: E, draft: TubeDraft) -> Result<TubeView, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let draft = draft.normalized();
        draft.validate()?;

        let mut tx = executor.begin().await?;

        self.check_placement(&mut tx, &draft, None).await?;
        let tube = self.tube_repo.create(&mut *tx, &draft).await?;
        let view = self.load_view(&mut tx, tube.id).await?;

        tx.commit().await?;

        tracing::info!("Tubo criado: {}", view.barcode);
        Ok(view)
    }

    pub async fn update_tube<'e, E>(&self, executor: E, id: i64, patch: TubePatch) -> Result<TubeView, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .tube_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "tube", id })?;

        let mut draft = TubeDraft::from(&current);
        patch.apply_to(&mut draft);
        let draft = draft.normalized();
        draft.validate()?;

        self.check_placement(&mut tx, &draft, Some(id)).await?;
        self.tube_repo
            .update(&mut *tx, id, &draft)
            .await?
            .ok_or(AppError::NotFound { entity: "tube", id })?;
        let view = self.load_view(&mut tx, id).await?;

        tx.commit().await?;
        Ok(view)
    }

    /// Tubo com histórico de uso não pode ser apagado.
    pub async fn delete_tube<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        if self.tube_repo.find_by_id(&mut *tx, id).await?.is_none() {
            return Err(AppError::NotFound { entity: "tube", id });
        }
        if self.usage_repo.count_for_tube(&mut *tx, id).await? > 0 {
            return Err(AppError::DeleteBlocked {
                entity: "tube",
                dependents: "usages",
            });
        }

        self.tube_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Tubo {id} excluído");
        Ok(())
    }
}
