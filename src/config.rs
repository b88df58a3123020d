// src/config.rs

use std::{
    env,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{info, warn};

use crate::{
    common::i18n::I18nStore,
    db::{
        BoxRepository, DashboardRepository, IndividualRepository, SampleRepository,
        TubeRepository, UsageRepository,
    },
    services::{
        dashboard_service::DashboardService, export_service::ExportService,
        storage_service::StorageService, subject_service::SubjectService,
        tube_service::TubeService, usage_service::UsageService,
    },
};

const DEFAULT_DB_FILE: &str = "dna_samples.db";

// ---
// Configuração (variáveis de ambiente / .env)
// ---
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
}

impl Config {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: try_load("DATABASE_URL", DEFAULT_DB_FILE),
            host: try_load("APP_HOST", "127.0.0.1"),
            port: try_load("APP_PORT", "5003"),
            max_connections: try_load("DB_MAX_CONNECTIONS", "5"),
        }
    }

    /// Aceita uma URL `sqlite:`, um arquivo .db ou uma pasta contendo `dna_samples.db`.
    pub fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = if self.database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&self.database_url)?
        } else {
            SqliteConnectOptions::new().filename(resolve_db_path(Path::new(&self.database_url)))
        };

        Ok(options
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal))
    }
}

fn resolve_db_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DEFAULT_DB_FILE)
    } else {
        path.to_path_buf()
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} não definida, usando o padrão: {default}");
        default.to_string()
    });

    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Valor inválido para {key} ({e}), usando o padrão: {default}");
            default
                .parse()
                .unwrap_or_else(|_| panic!("Padrão inválido para {key}"))
        }
    }
}

// ---
// Estado compartilhado da aplicação
// ---
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub i18n_store: Arc<I18nStore>,
    pub subject_service: SubjectService,
    pub tube_service: TubeService,
    pub storage_service: StorageService,
    pub usage_service: UsageService,
    pub export_service: ExportService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(config.connect_options()?)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool)
    }

    /// Monta o gráfico de dependências sobre uma pool já aberta.
    pub fn from_pool(db_pool: SqlitePool) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let tube_repo = TubeRepository::new();
        let usage_repo = UsageRepository::new();

        Ok(Self {
            db_pool,
            i18n_store,
            subject_service: SubjectService::new(
                IndividualRepository::new(),
                SampleRepository::new(),
                tube_repo.clone(),
            ),
            tube_service: TubeService::new(
                tube_repo.clone(),
                SampleRepository::new(),
                BoxRepository::new(),
                usage_repo.clone(),
            ),
            storage_service: StorageService::new(BoxRepository::new(), tube_repo.clone()),
            usage_service: UsageService::new(usage_repo, tube_repo.clone()),
            export_service: ExportService::new(tube_repo),
            dashboard_service: DashboardService::new(DashboardRepository::new()),
        })
    }
}
