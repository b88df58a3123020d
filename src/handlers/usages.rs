// src/handlers/usages.rs
//
// Histórico de uso: só leitura e inserção.

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
        params::{coerce_id, coerce_int},
    },
    config::AppState,
    middleware::i18n::Locale,
    models::usage::{TubeUsage, UsagePayload, UsageView},
};

const DEFAULT_LIMIT: i64 = 500;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsageListQuery {
    /// ID do tubo
    pub tube: Option<String>,
    /// 1..=1000, padrão 500
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsageLimitQuery {
    pub limit: Option<String>,
}

// GET /api/usages
#[utoipa::path(
    get,
    path = "/api/usages",
    tag = "Usages",
    params(UsageListQuery),
    responses(
        (status = 200, description = "Retiradas mais recentes primeiro", body = Vec<UsageView>)
    )
)]
pub async fn list_usages(
    State(app_state): State<AppState>,
    locale: Locale,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query: UsageListQuery = lenient_query(query);
    let tube_id = coerce_id(query.tube.as_deref());
    let limit = coerce_int(query.limit.as_deref(), DEFAULT_LIMIT, 1, MAX_LIMIT);

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let usages = app_state
        .usage_service
        .list_usages(&mut *conn, tube_id, limit)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(usages)))
}

// GET /api/tubes/{id}/usages
#[utoipa::path(
    get,
    path = "/api/tubes/{id}/usages",
    tag = "Usages",
    params(("id" = i64, Path, description = "ID interno do tubo"), UsageLimitQuery),
    responses(
        (status = 200, description = "Histórico do tubo", body = Vec<UsageView>),
        (status = 404, description = "Tubo não encontrado")
    )
)]
pub async fn list_tube_usages(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query: UsageLimitQuery = lenient_query(query);
    let limit = coerce_int(query.limit.as_deref(), DEFAULT_LIMIT, 1, MAX_LIMIT);

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let usages = app_state
        .usage_service
        .list_for_tube(&mut *conn, id, limit)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(usages)))
}

// POST /api/usages
#[utoipa::path(
    post,
    path = "/api/usages",
    tag = "Usages",
    request_body = UsagePayload,
    responses(
        (status = 201, description = "Retirada registrada, volume do tubo descontado", body = TubeUsage),
        (status = 400, description = "Dados inválidos ou volume insuficiente"),
        (status = 404, description = "Tubo não encontrado")
    )
)]
pub async fn record_usage(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<UsagePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let usage = app_state
        .usage_service
        .record_usage(&mut *conn, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(usage)))
}
