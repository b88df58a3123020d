// src/handlers/boxes.rs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{db_utils::acquire_connection, error::ApiError, extract::json_body},
    config::AppState,
    middleware::i18n::Locale,
    models::storage_box::{BoxDetail, BoxDraft, BoxPatch, BoxView, StorageBox},
};

// GET /api/boxes
#[utoipa::path(
    get,
    path = "/api/boxes",
    tag = "Boxes",
    responses((status = 200, description = "Caixas com capacidade e ocupação", body = Vec<BoxView>))
)]
pub async fn list_boxes(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let boxes = app_state
        .storage_service
        .list_boxes(&mut *conn)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(boxes)))
}

// GET /api/boxes/{id}
#[utoipa::path(
    get,
    path = "/api/boxes/{id}",
    tag = "Boxes",
    params(("id" = i64, Path, description = "ID da caixa")),
    responses(
        (status = 200, description = "Caixa com os tubos na ordem da grade", body = BoxDetail),
        (status = 404, description = "Não encontrada")
    )
)]
pub async fn get_box(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .storage_service
        .get_box(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/boxes
#[utoipa::path(
    post,
    path = "/api/boxes",
    tag = "Boxes",
    request_body = BoxDraft,
    responses(
        (status = 201, description = "Caixa criada", body = StorageBox),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn create_box(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<BoxDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let storage_box = app_state
        .storage_service
        .create_box(&mut *conn, draft)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(storage_box)))
}

// PUT /api/boxes/{id}
#[utoipa::path(
    put,
    path = "/api/boxes/{id}",
    tag = "Boxes",
    params(("id" = i64, Path, description = "ID da caixa")),
    request_body = BoxPatch,
    responses(
        (status = 200, description = "Caixa atualizada", body = StorageBox),
        (status = 400, description = "A grade não comporta os tubos já posicionados"),
        (status = 404, description = "Não encontrada")
    )
)]
pub async fn update_box(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
    body: Result<Json<BoxPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = json_body(body).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let storage_box = app_state
        .storage_service
        .update_box(&mut *conn, id, patch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(storage_box)))
}

// DELETE /api/boxes/{id}
#[utoipa::path(
    delete,
    path = "/api/boxes/{id}",
    tag = "Boxes",
    params(("id" = i64, Path, description = "ID da caixa")),
    responses(
        (status = 204, description = "Excluída"),
        (status = 404, description = "Não encontrada"),
        (status = 409, description = "Ainda contém tubos")
    )
)]
pub async fn delete_box(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .storage_service
        .delete_box(&mut *conn, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
