// src/handlers/tubes.rs

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::{
        db_utils::acquire_connection,
        error::ApiError,
        extract::{json_body, lenient_query, QueryPairs},
        params::PageRequest,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        pagination::Paginated,
        tube::{TubeDraft, TubeFilter, TubePatch, TubeView},
    },
    services::export_service::ExportFormat,
};

// ---
// Parâmetros de query
// ---
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TubeListQuery {
    /// Busca em barcode, código da amostra e do indivíduo
    pub search: Option<String>,
    /// ID da caixa
    #[serde(rename = "box")]
    pub box_id: Option<String>,
    /// Empty, Critical, Low ou Available
    pub status: Option<String>,
    /// stock ou working
    #[serde(rename = "type")]
    pub tube_type: Option<String>,
    pub page: Option<String>,
    /// 1..=5000, padrão 200
    pub limit: Option<String>,
}

impl TubeListQuery {
    fn filter(&self) -> TubeFilter {
        TubeFilter::from_raw(
            self.search.as_deref(),
            self.box_id.as_deref(),
            self.status.as_deref(),
            self.tube_type.as_deref(),
        )
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TubeExportQuery {
    /// tsv (padrão) ou xlsx
    pub format: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "box")]
    pub box_id: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub tube_type: Option<String>,
}

// GET /api/tubes
#[utoipa::path(
    get,
    path = "/api/tubes",
    tag = "Tubes",
    params(TubeListQuery),
    responses(
        (status = 200, description = "Página de tubos (barcode, id) com status calculado", body = Paginated<TubeView>)
    )
)]
pub async fn list_tubes(
    State(app_state): State<AppState>,
    locale: Locale,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query: TubeListQuery = lenient_query(query);
    let filter = query.filter();
    let page = PageRequest::from_raw(query.page.as_deref(), query.limit.as_deref(), 200, 5000);

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tubes = app_state
        .tube_service
        .list_tubes(&mut *conn, &filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(tubes)))
}

// GET /api/tubes/export
#[utoipa::path(
    get,
    path = "/api/tubes/export",
    tag = "Tubes",
    params(TubeExportQuery),
    responses(
        (status = 200, description = "Arquivo TSV (UTF-8 com BOM) ou XLSX com todos os tubos filtrados"),
        (status = 400, description = "Formato não suportado")
    )
)]
pub async fn export_tubes(
    State(app_state): State<AppState>,
    locale: Locale,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query: TubeExportQuery = lenient_query(query);
    let format = ExportFormat::parse(query.format.as_deref())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let filter = TubeFilter::from_raw(
        query.search.as_deref(),
        query.box_id.as_deref(),
        query.status.as_deref(),
        query.tube_type.as_deref(),
    );

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let file = app_state
        .export_service
        .export_tubes(&mut *conn, &filter, format)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    ))
}

// GET /api/tubes/{id}
#[utoipa::path(
    get,
    path = "/api/tubes/{id}",
    tag = "Tubes",
    params(("id" = i64, Path, description = "ID interno do tubo")),
    responses(
        (status = 200, description = "Tubo", body = TubeView),
        (status = 404, description = "Não encontrado")
    )
)]
pub async fn get_tube(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tube = app_state
        .tube_service
        .get_tube(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(tube)))
}

// POST /api/tubes
#[utoipa::path(
    post,
    path = "/api/tubes",
    tag = "Tubes",
    request_body = TubeDraft,
    responses(
        (status = 201, description = "Tubo criado", body = TubeView),
        (status = 400, description = "Dados inválidos ou posição fora da grade"),
        (status = 404, description = "Amostra ou caixa não encontrada"),
        (status = 409, description = "Barcode já existe ou posição ocupada")
    )
)]
pub async fn create_tube(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<TubeDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tube = app_state
        .tube_service
        .create_tube(&mut *conn, draft)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(tube)))
}

// PUT /api/tubes/{id}
#[utoipa::path(
    put,
    path = "/api/tubes/{id}",
    tag = "Tubes",
    params(("id" = i64, Path, description = "ID interno do tubo")),
    request_body = TubePatch,
    responses(
        (status = 200, description = "Tubo atualizado", body = TubeView),
        (status = 400, description = "Posição fora da grade"),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Barcode já existe ou posição ocupada")
    )
)]
pub async fn update_tube(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    body: Result<Json<TubePatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let tube = app_state
        .tube_service
        .update_tube(&mut *conn, id, patch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(tube)))
}

// DELETE /api/tubes/{id}
#[utoipa::path(
    delete,
    path = "/api/tubes/{id}",
    tag = "Tubes",
    params(("id" = i64, Path, description = "ID interno do tubo")),
    responses(
        (status = 204, description = "Excluído"),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Possui histórico de uso")
    )
)]
pub async fn delete_tube(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .tube_service
        .delete_tube(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
