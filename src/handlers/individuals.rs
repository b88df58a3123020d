// src/handlers/individuals.rs
//
// Indivíduos: lista simples (/api/individuals) e visão "sujet" paginada
// (/api/sujets). As duas rotas compartilham criação, edição e exclusão.

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
        params::{coerce_int, PageRequest},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        individual::{Individual, IndividualDraft, IndividualFilter, IndividualPatch, IndividualView, SujetDetail},
        pagination::Paginated,
    },
};

// ---
// Parâmetros de query (sempre texto: a coerção é nossa)
// ---
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IndividualListQuery {
    /// Busca em código, apelidos, família e projetos
    pub search: Option<String>,
    pub family: Option<String>,
    pub project: Option<String>,
    /// 1..=1000, padrão 100
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SujetListQuery {
    pub search: Option<String>,
    pub family: Option<String>,
    pub project: Option<String>,
    pub page: Option<String>,
    /// 1..=100, padrão 25
    pub per_page: Option<String>,
}

// GET /api/individuals
#[utoipa::path(
    get,
    path = "/api/individuals",
    tag = "Individuals",
    params(IndividualListQuery),
    responses(
        (status = 200, description = "Indivíduos ordenados pelo código, com contagens", body = Vec<IndividualView>)
    )
)]
pub async fn list_individuals(
    State(app_state): State<AppState>,
    locale: Locale,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query: IndividualListQuery = lenient_query(query);
    let filter = IndividualFilter::from_raw(
        query.search.as_deref(),
        query.family.as_deref(),
        query.project.as_deref(),
    );
    let limit = coerce_int(query.limit.as_deref(), 100, 1, 1000);

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let individuals = app_state
        .subject_service
        .list_individuals(&mut *conn, &filter, limit)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(individuals)))
}

// GET /api/sujets
#[utoipa::path(
    get,
    path = "/api/sujets",
    tag = "Individuals",
    params(SujetListQuery),
    responses(
        (status = 200, description = "Página de sujets com total real", body = Paginated<IndividualView>)
    )
)]
pub async fn list_sujets(
    State(app_state): State<AppState>,
    locale: Locale,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query: SujetListQuery = lenient_query(query);
    let filter = IndividualFilter::from_raw(
        query.search.as_deref(),
        query.family.as_deref(),
        query.project.as_deref(),
    );
    let page = PageRequest::from_raw(query.page.as_deref(), query.per_page.as_deref(), 25, 100);

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sujets = app_state
        .subject_service
        .list_sujets(&mut *conn, &filter, page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sujets)))
}

// GET /api/individuals/{id}
#[utoipa::path(
    get,
    path = "/api/individuals/{id}",
    tag = "Individuals",
    params(("id" = i64, Path, description = "ID interno do indivíduo")),
    responses(
        (status = 200, description = "Indivíduo com contagens", body = IndividualView),
        (status = 404, description = "Não encontrado")
    )
)]
pub async fn get_individual(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let individual = app_state
        .subject_service
        .get_individual(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(individual)))
}

// GET /api/sujets/{id}
#[utoipa::path(
    get,
    path = "/api/sujets/{id}",
    tag = "Individuals",
    params(("id" = i64, Path, description = "ID interno do indivíduo")),
    responses(
        (status = 200, description = "Sujet com amostras e tubos", body = SujetDetail),
        (status = 404, description = "Não encontrado")
    )
)]
pub async fn get_sujet(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sujet = app_state
        .subject_service
        .get_sujet(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sujet)))
}

// POST /api/individuals (e /api/sujets)
#[utoipa::path(
    post,
    path = "/api/individuals",
    tag = "Individuals",
    request_body = IndividualDraft,
    responses(
        (status = 201, description = "Indivíduo criado", body = Individual),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código já existe")
    )
)]
pub async fn create_individual(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<IndividualDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let individual = app_state
        .subject_service
        .create_individual(&mut *conn, draft)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(individual)))
}

// PUT /api/individuals/{id} (e /api/sujets/{id})
#[utoipa::path(
    put,
    path = "/api/individuals/{id}",
    tag = "Individuals",
    params(("id" = i64, Path, description = "ID interno do indivíduo")),
    request_body = IndividualPatch,
    responses(
        (status = 200, description = "Indivíduo atualizado", body = Individual),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Código já existe")
    )
)]
pub async fn update_individual(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    body: Result<Json<IndividualPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let individual = app_state
        .subject_service
        .update_individual(&mut *conn, id, patch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(individual)))
}

// DELETE /api/individuals/{id} (e /api/sujets/{id})
#[utoipa::path(
    delete,
    path = "/api/individuals/{id}",
    tag = "Individuals",
    params(("id" = i64, Path, description = "ID interno do indivíduo")),
    responses(
        (status = 204, description = "Excluído"),
        (status = 404, description = "Não encontrado"),
        (status = 409, description = "Ainda possui amostras")
    )
)]
pub async fn delete_individual(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .subject_service
        .delete_individual(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/families
#[utoipa::path(
    get,
    path = "/api/families",
    tag = "Individuals",
    responses((status = 200, description = "Famílias distintas, ordenadas", body = Vec<String>))
)]
pub async fn list_families(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let families = app_state
        .subject_service
        .families(&mut *conn)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(families)))
}

// GET /api/projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Individuals",
    responses((status = 200, description = "Projetos distintos, ordenados", body = Vec<String>))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let projects = app_state
        .subject_service
        .projects(&mut *conn)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(projects)))
}
