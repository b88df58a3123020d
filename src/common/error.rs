use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio. Os handlers convertem para `ApiError`
// (já traduzido) com `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(String),

    #[error("{entity} {id} não encontrado")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} '{code}' já existe")]
    AlreadyExists { entity: &'static str, code: String },

    #[error("Posição {position} da caixa {box_id} já ocupada por {occupant}")]
    SlotOccupied {
        box_id: i64,
        position: String,
        occupant: String,
    },

    #[error("Posição {position} fora da grade {rows}x{cols}")]
    SlotOutOfGrid {
        position: String,
        rows: i64,
        cols: i64,
    },

    #[error("Posição incompleta: informe linha e coluna")]
    IncompletePosition,

    #[error("Posição informada para tubo fora de caixa")]
    PositionWithoutBox,

    #[error("Não é possível excluir {entity}: ainda possui {dependents}")]
    DeleteBlocked {
        entity: &'static str,
        dependents: &'static str,
    },

    #[error("Volume insuficiente: disponível {available}, pedido {requested}")]
    InsufficientVolume { available: f64, requested: f64 },

    #[error("Formato de exportação não suportado: {0}")]
    UnsupportedExportFormat(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro ao gerar TSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Erro ao gerar planilha: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

/// Erro pronto para a resposta HTTP (status + mensagem traduzida).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();

        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => store.translate(lang, &format!("validation.{}", e.code)),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    message: store.translate(lang, "error.validation"),
                    details: Some(json!(details)),
                }
            }
            AppError::InvalidBody(reason) => ApiError {
                status: StatusCode::BAD_REQUEST,
                message: store.translate(lang, "error.invalid_body"),
                details: Some(json!({ "body": [reason] })),
            },
            AppError::NotFound { entity, id } => ApiError::new(
                StatusCode::NOT_FOUND,
                store.format(
                    lang,
                    &format!("error.not_found.{entity}"),
                    &[("id", &id.to_string())],
                ),
            ),
            AppError::AlreadyExists { entity, code } => ApiError::new(
                StatusCode::CONFLICT,
                store.format(
                    lang,
                    &format!("error.already_exists.{entity}"),
                    &[("code", &code)],
                ),
            ),
            AppError::SlotOccupied { position, occupant, .. } => ApiError::new(
                StatusCode::CONFLICT,
                store.format(
                    lang,
                    "error.slot_occupied",
                    &[("position", &position), ("occupant", &occupant)],
                ),
            ),
            AppError::SlotOutOfGrid { position, rows, cols } => ApiError::new(
                StatusCode::BAD_REQUEST,
                store.format(
                    lang,
                    "error.slot_out_of_grid",
                    &[
                        ("position", &position),
                        ("rows", &rows.to_string()),
                        ("cols", &cols.to_string()),
                    ],
                ),
            ),
            AppError::IncompletePosition => ApiError::new(
                StatusCode::BAD_REQUEST,
                store.translate(lang, "error.incomplete_position"),
            ),
            AppError::PositionWithoutBox => ApiError::new(
                StatusCode::BAD_REQUEST,
                store.translate(lang, "error.position_without_box"),
            ),
            AppError::DeleteBlocked { entity, dependents } => ApiError::new(
                StatusCode::CONFLICT,
                store.translate(lang, &format!("error.delete_blocked.{entity}.{dependents}")),
            ),
            AppError::InsufficientVolume { available, requested } => ApiError::new(
                StatusCode::BAD_REQUEST,
                store.format(
                    lang,
                    "error.insufficient_volume",
                    &[
                        ("available", &available.to_string()),
                        ("requested", &requested.to_string()),
                    ],
                ),
            ),
            AppError::UnsupportedExportFormat(format) => ApiError::new(
                StatusCode::BAD_REQUEST,
                store.format(lang, "error.export_format", &[("format", &format)]),
            ),

            // Todo o resto (banco, exportação, E/S) vira 500.
            // O detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    store.translate(lang, "error.internal"),
                )
            }
        }
    }
}

/// Converte violação de UNIQUE em `AlreadyExists`, o resto segue como erro de banco.
pub(crate) fn map_unique_violation(e: sqlx::Error, entity: &'static str, code: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::AlreadyExists {
                entity,
                code: code.to_string(),
            };
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn not_found_is_404_and_translated() {
        let err = AppError::NotFound { entity: "tube", id: 42 };
        let api = err.to_api_error(&Locale("fr".to_string()), &store());
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.message.contains("42"), "{}", api.message);
    }

    #[test]
    fn database_errors_become_generic_500() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        let api = err.to_api_error(&Locale("en".to_string()), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("RowNotFound"));
    }

    #[test]
    fn delete_blocked_and_slot_conflicts_are_409() {
        let locale = Locale("en".to_string());
        let blocked = AppError::DeleteBlocked { entity: "box", dependents: "tubes" }
            .to_api_error(&locale, &store());
        assert_eq!(blocked.status, StatusCode::CONFLICT);

        let occupied = AppError::SlotOccupied {
            box_id: 1,
            position: "A1".to_string(),
            occupant: "T-001".to_string(),
        }
        .to_api_error(&locale, &store());
        assert_eq!(occupied.status, StatusCode::CONFLICT);
        assert!(occupied.message.contains("T-001"));
    }

    #[test]
    fn validation_details_follow_the_locale() {
        use crate::models::usage::UsagePayload;
        use validator::Validate;

        let payload: UsagePayload =
            serde_json::from_value(json!({ "tube_id": 1, "volume_taken": 0.0 })).unwrap();

        let fr = AppError::from(payload.validate().unwrap_err())
            .to_api_error(&Locale("fr".to_string()), &store());
        assert_eq!(fr.status, StatusCode::BAD_REQUEST);
        assert_eq!(fr.details.unwrap()["volume_taken"][0], "Le volume prélevé doit être positif.");

        let en = AppError::from(payload.validate().unwrap_err())
            .to_api_error(&Locale("en".to_string()), &store());
        assert_eq!(en.details.unwrap()["volume_taken"][0], "Volume taken must be positive.");
    }
}
