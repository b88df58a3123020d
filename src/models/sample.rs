// src/models/sample.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::params::{coerce_id, non_empty};
use crate::models::patch::{apply, apply_text, blank_to_none, deserialize_some};

// --- Amostra (tabela 'sample') ---
// Tipo (DNA, RNA, ...) não muda depois da criação na prática.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Sample {
    pub id: i64,
    pub sample_code: String,
    pub individual_id: Option<i64>,
    pub sample_type: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Amostra + dados do indivíduo e contagem de tubos (carregados em lote)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SampleView {
    #[serde(flatten)]
    pub sample: Sample,
    pub individual_code: Option<String>,
    pub family_id: Option<String>,
    pub tube_count: i64,
}

// Filtros de /api/samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleFilter {
    pub search: Option<String>,
    pub individual_id: Option<i64>,
    pub sample_type: Option<String>,
}

impl SampleFilter {
    pub fn from_raw(search: Option<&str>, individual: Option<&str>, sample_type: Option<&str>) -> Self {
        Self {
            search: non_empty(search),
            individual_id: coerce_id(individual),
            sample_type: non_empty(sample_type),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SampleTypes {
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SampleDraft {
    #[serde(alias = "sample_id")]
    #[validate(length(min = 1, max = 50, code = "sample_code_length"))]
    pub sample_code: String,
    pub individual_id: Option<i64>,
    pub sample_type: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl SampleDraft {
    pub fn normalized(mut self) -> Self {
        self.sample_code = self.sample_code.trim().to_string();
        self.sample_type = blank_to_none(self.sample_type);
        self.notes = blank_to_none(self.notes);
        self
    }
}

impl From<&Sample> for SampleDraft {
    fn from(s: &Sample) -> Self {
        Self {
            sample_code: s.sample_code.clone(),
            individual_id: s.individual_id,
            sample_type: s.sample_type.clone(),
            arrival_date: s.arrival_date,
            notes: s.notes.clone(),
        }
    }
}

// Amostra criada a partir da ficha do sujet (o indivíduo vem da rota)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SujetSamplePayload {
    #[serde(alias = "sample_id")]
    #[validate(length(min = 1, max = 50, code = "sample_code_length"))]
    pub sample_code: String,
    pub sample_type: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl SujetSamplePayload {
    pub fn into_draft(self, individual_id: i64) -> SampleDraft {
        SampleDraft {
            sample_code: self.sample_code,
            individual_id: Some(individual_id),
            sample_type: self.sample_type,
            arrival_date: self.arrival_date,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SamplePatch {
    #[serde(alias = "sample_id")]
    pub sample_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub individual_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub sample_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub arrival_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl SamplePatch {
    pub fn apply_to(self, draft: &mut SampleDraft) {
        apply(&mut draft.sample_code, self.sample_code);
        apply(&mut draft.individual_id, self.individual_id);
        apply(&mut draft.arrival_date, self.arrival_date);
        apply_text(&mut draft.sample_type, self.sample_type);
        apply_text(&mut draft.notes, self.notes);
    }
}
