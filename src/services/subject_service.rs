// src/services/subject_service.rs
//
// Indivíduos ("sujets") e suas amostras.

use std::collections::{BTreeSet, HashMap};

use sqlx::{Acquire, Executor, Sqlite, SqliteConnection};
use validator::Validate;

use crate::{
    common::{db_utils::distinct_ids, error::AppError, params::PageRequest},
    db::{IndividualRepository, SampleRepository, TubeRepository},
    models::{
        individual::{
            sex_display, Individual, IndividualDraft, IndividualFilter, IndividualPatch,
            IndividualView, SujetDetail, SujetSample, SujetTube,
        },
        pagination::Paginated,
        sample::{Sample, SampleDraft, SampleFilter, SamplePatch, SampleView},
    },
};

#[derive(Clone)]
pub struct SubjectService {
    individual_repo: IndividualRepository,
    sample_repo: SampleRepository,
    tube_repo: TubeRepository,
}

impl SubjectService {
    pub fn new(
        individual_repo: IndividualRepository,
        sample_repo: SampleRepository,
        tube_repo: TubeRepository,
    ) -> Self {
        Self {
            individual_repo,
            sample_repo,
            tube_repo,
        }
    }

    // Contagens de amostras e tubos da página inteira em duas consultas
    async fn individual_views(
        &self,
        conn: &mut SqliteConnection,
        individuals: Vec<Individual>,
    ) -> Result<Vec<IndividualView>, AppError> {
        let ids: Vec<i64> = individuals.iter().map(|i| i.id).collect();
        let sample_counts = self.individual_repo.sample_counts(&mut *conn, &ids).await?;
        let tube_counts = self.individual_repo.tube_counts(&mut *conn, &ids).await?;

        Ok(individuals
            .into_iter()
            .map(|individual| {
                let samples = sample_counts.get(&individual.id).copied().unwrap_or(0);
                let tubes = tube_counts.get(&individual.id).copied().unwrap_or(0);
                IndividualView::new(individual, samples, tubes)
            })
            .collect())
    }

    async fn sample_views(
        &self,
        conn: &mut SqliteConnection,
        samples: Vec<Sample>,
    ) -> Result<Vec<SampleView>, AppError> {
        let sample_ids: Vec<i64> = samples.iter().map(|s| s.id).collect();
        let individual_ids = distinct_ids(samples.iter().map(|s| s.individual_id));

        let individuals = self.sample_repo.individual_refs(&mut *conn, &individual_ids).await?;
        let tube_counts = self.sample_repo.tube_counts(&mut *conn, &sample_ids).await?;

        Ok(samples
            .into_iter()
            .map(|sample| {
                let individual = sample.individual_id.and_then(|id| individuals.get(&id));
                SampleView {
                    individual_code: individual.map(|i| i.individual_code.clone()),
                    family_id: individual.and_then(|i| i.family_id.clone()),
                    tube_count: tube_counts.get(&sample.id).copied().unwrap_or(0),
                    sample,
                }
            })
            .collect())
    }

    // ---
    // Indivíduos
    // ---

    /// Lista simples (sem total), limitada.
    pub async fn list_individuals<'e, E>(
        &self,
        executor: E,
        filter: &IndividualFilter,
        limit: i64,
    ) -> Result<Vec<IndividualView>, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;
        let individuals = self.individual_repo.list(&mut *tx, filter, limit, 0).await?;
        let views = self.individual_views(&mut tx, individuals).await?;
        tx.commit().await?;
        Ok(views)
    }

    /// Lista paginada com total real.
    pub async fn list_sujets<'e, E>(
        &self,
        executor: E,
        filter: &IndividualFilter,
        page: PageRequest,
    ) -> Result<Paginated<IndividualView>, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let total = self.individual_repo.count(&mut *tx, filter).await?;
        let individuals = self
            .individual_repo
            .list(&mut *tx, filter, page.per_page, page.offset())
            .await?;
        let views = self.individual_views(&mut tx, individuals).await?;

        tx.commit().await?;
        Ok(Paginated::new(views, total, page))
    }

    pub async fn get_individual<'e, E>(&self, executor: E, id: i64) -> Result<IndividualView, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let individual = self
            .individual_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "individual", id })?;
        let mut views = self.individual_views(&mut tx, vec![individual]).await?;

        tx.commit().await?;
        views.pop().ok_or(AppError::NotFound { entity: "individual", id })
    }

    /// Indivíduo com amostras e tubos (caixa, congelador, posição).
    pub async fn get_sujet<'e, E>(&self, executor: E, id: i64) -> Result<SujetDetail, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let individual = self
            .individual_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "individual", id })?;

        let samples = self.sample_repo.list_for_individual(&mut *tx, id).await?;
        let sample_ids: Vec<i64> = samples.iter().map(|s| s.id).collect();
        let tubes = self.tube_repo.list_for_samples(&mut tx, &sample_ids).await?;
        let tube_views = self.tube_repo.project(&mut tx, tubes).await?;

        tx.commit().await?;

        let mut tubes_by_sample: HashMap<i64, Vec<SujetTube>> = HashMap::new();
        for view in tube_views {
            if let Some(sample_id) = view.sample_id {
                tubes_by_sample.entry(sample_id).or_default().push(SujetTube {
                    id: view.id,
                    barcode: view.barcode,
                    position_display: view.position_display,
                    box_name: view.box_name,
                    freezer: view.freezer,
                });
            }
        }

        let samples: Vec<SujetSample> = samples
            .into_iter()
            .map(|sample| {
                let tubes = tubes_by_sample.remove(&sample.id).unwrap_or_default();
                SujetSample {
                    id: sample.id,
                    sample_code: sample.sample_code,
                    sample_type: sample.sample_type,
                    tube_count: tubes.len(),
                    tubes,
                }
            })
            .collect();

        Ok(SujetDetail {
            sex_display: sex_display(individual.sex),
            sample_count: samples.len(),
            tube_count: samples.iter().map(|s| s.tube_count).sum(),
            individual,
            samples,
        })
    }

    /// Valida depois de normalizar: código só com espaços não passa.
    pub async fn create_individual<'e, E>(&self, executor: E, draft: IndividualDraft) -> Result<Individual, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let draft = draft.normalized();
        draft.validate()?;

        let mut tx = executor.begin().await?;
        let individual = self.individual_repo.create(&mut *tx, &draft).await?;
        tx.commit().await?;

        tracing::info!("Indivíduo criado: {}", individual.individual_code);
        Ok(individual)
    }

    pub async fn update_individual<'e, E>(
        &self,
        executor: E,
        id: i64,
        patch: IndividualPatch,
    ) -> Result<Individual, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .individual_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "individual", id })?;

        let mut draft = IndividualDraft::from(&current);
        patch.apply_to(&mut draft);
        let draft = draft.normalized();
        draft.validate()?;

        let updated = self
            .individual_repo
            .update(&mut *tx, id, &draft)
            .await?
            .ok_or(AppError::NotFound { entity: "individual", id })?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_individual<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        if !self.individual_repo.exists(&mut *tx, id).await? {
            return Err(AppError::NotFound { entity: "individual", id });
        }
        if self.sample_repo.count_for_individual(&mut *tx, id).await? > 0 {
            return Err(AppError::DeleteBlocked {
                entity: "individual",
                dependents: "samples",
            });
        }

        self.individual_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Indivíduo {id} excluído");
        Ok(())
    }

    pub async fn families<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        self.individual_repo.families(executor).await
    }

    /// Projetos distintos, já separados e ordenados.
    pub async fn projects<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let lists = self.individual_repo.project_lists(executor).await?;
        let projects: BTreeSet<String> = lists
            .iter()
            .flat_map(|list| list.iter().map(str::to_string))
            .collect();
        Ok(projects.into_iter().collect())
    }

    // ---
    // Amostras
    // ---

    pub async fn list_samples<'e, E>(
        &self,
        executor: E,
        filter: &SampleFilter,
        page: PageRequest,
    ) -> Result<Paginated<SampleView>, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let total = self.sample_repo.count(&mut *tx, filter).await?;
        let samples = self
            .sample_repo
            .list(&mut *tx, filter, page.per_page, page.offset())
            .await?;
        let views = self.sample_views(&mut tx, samples).await?;

        tx.commit().await?;
        Ok(Paginated::new(views, total, page))
    }

    pub async fn get_sample<'e, E>(&self, executor: E, id: i64) -> Result<SampleView, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let sample = self
            .sample_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "sample", id })?;
        let mut views = self.sample_views(&mut tx, vec![sample]).await?;

        tx.commit().await?;
        views.pop().ok_or(AppError::NotFound { entity: "sample", id })
    }

    pub async fn sample_types<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        self.sample_repo.distinct_types(executor).await
    }

    pub async fn create_sample<'e, E>(&self, executor: E, draft: SampleDraft) -> Result<Sample, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let draft = draft.normalized();
        draft.validate()?;

        let mut tx = executor.begin().await?;

        if let Some(individual_id) = draft.individual_id {
            if !self.individual_repo.exists(&mut *tx, individual_id).await? {
                return Err(AppError::NotFound {
                    entity: "individual",
                    id: individual_id,
                });
            }
        }

        let sample = self.sample_repo.create(&mut *tx, &draft).await?;
        tx.commit().await?;

        tracing::info!("Amostra criada: {}", sample.sample_code);
        Ok(sample)
    }

    pub async fn update_sample<'e, E>(&self, executor: E, id: i64, patch: SamplePatch) -> Result<Sample, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .sample_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound { entity: "sample", id })?;

        let mut draft = SampleDraft::from(&current);
        patch.apply_to(&mut draft);
        let draft = draft.normalized();
        draft.validate()?;

        if let Some(individual_id) = draft.individual_id {
            if !self.individual_repo.exists(&mut *tx, individual_id).await? {
                return Err(AppError::NotFound {
                    entity: "individual",
                    id: individual_id,
                });
            }
        }

        let updated = self
            .sample_repo
            .update(&mut *tx, id, &draft)
            .await?
            .ok_or(AppError::NotFound { entity: "sample", id })?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_sample<'e, E>(&self, executor: E, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;

        if !self.sample_repo.exists(&mut *tx, id).await? {
            return Err(AppError::NotFound { entity: "sample", id });
        }
        if self.tube_repo.count_for_sample(&mut *tx, id).await? > 0 {
            return Err(AppError::DeleteBlocked {
                entity: "sample",
                dependents: "tubes",
            });
        }

        self.sample_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Amostra {id} excluída");
        Ok(())
    }
}
