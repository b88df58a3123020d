// src/models/usage.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::patch::blank_to_none;

// --- Retirada de material (tabela 'tube_usage', somente inserção) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TubeUsage {
    pub id: i64,
    pub tube_id: i64,
    pub user_name: Option<String>,
    pub date_out: Option<NaiveDate>,
    pub date_return: Option<NaiveDate>,
    pub volume_taken: Option<f64>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

// Linha do histórico com o código de barras do tubo (JOIN)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UsageView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub usage: TubeUsage,
    pub tube_barcode: Option<String>,
}

fn validate_positive(value: f64) -> Result<(), ValidationError> {
    // `!(v > 0)` também rejeita NaN
    if !(value > 0.0) {
        return Err(ValidationError::new("volume_taken_positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UsagePayload {
    pub tube_id: i64,
    #[validate(length(max = 50, code = "user_name_length"))]
    pub user_name: Option<String>,
    /// Padrão: hoje.
    pub date_out: Option<NaiveDate>,
    pub date_return: Option<NaiveDate>,
    #[validate(custom(function = "validate_positive"))]
    pub volume_taken: Option<f64>,
    #[validate(length(max = 100, code = "purpose_length"))]
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

impl UsagePayload {
    pub fn normalized(mut self) -> Self {
        self.user_name = blank_to_none(self.user_name);
        self.purpose = blank_to_none(self.purpose);
        self.notes = blank_to_none(self.notes);
        self
    }
}
