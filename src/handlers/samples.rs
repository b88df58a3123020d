// src/handlers/samples.rs

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
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
        sample::{Sample, SampleDraft, SampleFilter, SamplePatch, SampleTypes, SampleView, SujetSamplePayload},
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SampleListQuery {
    /// Busca em código da amostra, notas e código do indivíduo
    pub search: Option<String>,
    /// ID interno do indivíduo
    pub individual: Option<String>,
    #[serde(rename = "type")]
    pub sample_type: Option<String>,
    pub page: Option<String>,
    /// 1..=500, padrão 100
    pub per_page: Option<String>,
}

// GET /api/samples
#[utoipa::path(
    get,
    path = "/api/samples",
    tag = "Samples",
    params(SampleListQuery),
    responses(
        (status = 200, description = "Página de amostras com indivíduo e contagem de tubos", body = Paginated<SampleView>)
    )
)]
pub async fn list_samples(
    State(app_state): State<AppState>,
    locale: Locale,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query: SampleListQuery = lenient_query(query);
    let filter = SampleFilter::from_raw(
        query.search.as_deref(),
        query.individual.as_deref(),
        query.sample_type.as_deref(),
    );
    let page = PageRequest::from_raw(query.page.as_deref(), query.per_page.as_deref(), 100, 500);

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let samples = app_state
        .subject_service
        .list_samples(&mut *conn, &filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(samples)))
}

// GET /api/samples/types
#[utoipa::path(
    get,
    path = "/api/samples/types",
    tag = "Samples",
    responses((status = 200, description = "Tipos de amostra distintos", body = SampleTypes))
)]
pub async fn list_sample_types(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let types = app_state
        .subject_service
        .sample_types(&mut *conn)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(SampleTypes { types })))
}

// GET /api/samples/{id}
#[utoipa::path(
    get,
    path = "/api/samples/{id}",
    tag = "Samples",
    params(("id" = i64, Path, description = "ID interno da amostra")),
    responses(
        (status = 200, description = "Amostra", body = SampleView),
        (status = 404, description = "Não encontrada")
    )
)]
pub async fn get_sample(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sample = app_state
        .subject_service
        .get_sample(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sample)))
}

// POST /api/samples
#[utoipa::path(
    post,
    path = "/api/samples",
    tag = "Samples",
    request_body = SampleDraft,
    responses(
        (status = 201, description = "Amostra criada", body = Sample),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Indivíduo não encontrado"),
        (status = 409, description = "Código já existe")
    )
)]
pub async fn create_sample(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<SampleDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sample = app_state
        .subject_service
        .create_sample(&mut *conn, draft)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sample)))
}

// POST /api/sujets/{id}/samples
#[utoipa::path(
    post,
    path = "/api/sujets/{id}/samples",
    tag = "Samples",
    params(("id" = i64, Path, description = "ID interno do indivíduo")),
    request_body = SujetSamplePayload,
    responses(
        (status = 201, description = "Amostra criada para o sujet", body = Sample),
        (status = 404, description = "Indivíduo não encontrado"),
        (status = 409, description = "Código já existe")
    )
)]
pub async fn add_sample_to_sujet(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    body: Result<Json<SujetSamplePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sample = app_state
        .subject_service
        .create_sample(&mut *conn, payload.into_draft(id))
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sample)))
}

// PUT /api/samples/{id}
#[utoipa::path(
    put,
    path = "/api/samples/{id}",
    tag = "Samples",
    params(("id" = i64, Path, description = "ID interno da amostra")),
    request_body = SamplePatch,
    responses(
        (status = 200, description = "Amostra atualizada", body = Sample),
        (status = 404, description = "Não encontrada"),
        (status = 409, description = "Código já existe")
    )
)]
pub async fn update_sample(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    body: Result<Json<SamplePatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sample = app_state
        .subject_service
        .update_sample(&mut *conn, id, patch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sample)))
}

// DELETE /api/samples/{id}
#[utoipa::path(
    delete,
    path = "/api/samples/{id}",
    tag = "Samples",
    params(("id" = i64, Path, description = "ID interno da amostra")),
    responses(
        (status = 204, description = "Excluída"),
        (status = 404, description = "Não encontrada"),
        (status = 409, description = "Ainda possui tubos")
    )
)]
pub async fn delete_sample(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .subject_service
        .delete_sample(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
