// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::{db_utils::acquire_connection, error::ApiError},
    config::AppState,
    middleware::i18n::Locale,
    models::dashboard::Stats,
};

// GET /api/stats
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Totais, tubos por status/caixa, amostras por tipo, top famílias e projetos", body = Stats)
    )
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = acquire_connection(&app_state)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state
        .dashboard_service
        .get_stats(&mut *conn)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}
