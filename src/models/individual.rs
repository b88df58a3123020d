// src/models/individual.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    error::BoxDynError,
    sqlite::{SqliteTypeInfo, SqliteValueRef},
    Decode, FromRow, Sqlite, Type, ValueRef,
};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::params::non_empty;
use crate::models::patch::{apply, apply_text, blank_to_none, deserialize_some};

// --- Lista de nomes (apelidos, projetos) ---
// No banco fica como texto separado por vírgulas; na API é um array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct NameList(pub Vec<String>);

impl NameList {
    pub fn parse(raw: &str) -> Self {
        NameList(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn normalized(names: Vec<String>) -> Self {
        NameList::parse(&names.join(","))
    }

    /// Valor para gravar: `None` quando a lista está vazia.
    pub fn to_db(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.join(","))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Type<Sqlite> for NameList {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for NameList {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(NameList::default());
        }
        let raw = <&str as Decode<Sqlite>>::decode(value)?;
        Ok(NameList::parse(raw))
    }
}

/// 0 = desconhecido, 1 = masculino, 2 = feminino
pub fn sex_display(sex: Option<i64>) -> &'static str {
    match sex {
        Some(1) => "M",
        Some(2) => "F",
        _ => "Unknown",
    }
}

// --- Indivíduo (tabela 'individual') ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Individual {
    pub id: i64,
    pub individual_code: String,
    pub aliases: NameList,
    pub family_id: Option<String>,
    pub sex: Option<i64>,
    pub phenotype: Option<String>,
    pub projects: NameList,
    pub other_family_codes: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha mínima para as cargas em lote (amostras e tubos)
#[derive(Debug, Clone, FromRow)]
pub struct IndividualRef {
    pub id: i64,
    pub individual_code: String,
    pub family_id: Option<String>,
}

// Linha de listagem: indivíduo + contagens calculadas em lote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndividualView {
    #[serde(flatten)]
    pub individual: Individual,
    pub sex_display: &'static str,
    pub sample_count: i64,
    pub tube_count: i64,
}

impl IndividualView {
    pub fn new(individual: Individual, sample_count: i64, tube_count: i64) -> Self {
        Self {
            sex_display: sex_display(individual.sex),
            individual,
            sample_count,
            tube_count,
        }
    }
}

// Filtros de /api/individuals e /api/sujets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndividualFilter {
    pub search: Option<String>,
    pub family: Option<String>,
    pub project: Option<String>,
}

impl IndividualFilter {
    pub fn from_raw(search: Option<&str>, family: Option<&str>, project: Option<&str>) -> Self {
        Self {
            search: non_empty(search),
            family: non_empty(family),
            project: non_empty(project),
        }
    }
}

// --- "Sujet": indivíduo com amostras e tubos ---
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SujetTube {
    pub id: i64,
    pub barcode: String,
    pub position_display: Option<String>,
    pub box_name: Option<String>,
    pub freezer: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SujetSample {
    pub id: i64,
    pub sample_code: String,
    pub sample_type: Option<String>,
    pub tube_count: usize,
    pub tubes: Vec<SujetTube>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SujetDetail {
    #[serde(flatten)]
    pub individual: Individual,
    pub sex_display: &'static str,
    pub sample_count: usize,
    pub tube_count: usize,
    pub samples: Vec<SujetSample>,
}

// ---
// Payloads de escrita
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct IndividualDraft {
    #[validate(length(min = 1, max = 50, code = "individual_code_length"))]
    pub individual_code: String,
    #[serde(default)]
    pub aliases: NameList,
    pub family_id: Option<String>,
    #[validate(range(min = 0, max = 2, code = "sex_range"))]
    pub sex: Option<i64>,
    pub phenotype: Option<String>,
    #[serde(default)]
    pub projects: NameList,
    pub other_family_codes: Option<String>,
    pub notes: Option<String>,
}

impl IndividualDraft {
    /// Apara espaços e transforma texto vazio em ausente.
    pub fn normalized(mut self) -> Self {
        self.individual_code = self.individual_code.trim().to_string();
        self.aliases = NameList::normalized(self.aliases.0);
        self.projects = NameList::normalized(self.projects.0);
        self.family_id = blank_to_none(self.family_id);
        self.phenotype = blank_to_none(self.phenotype);
        self.other_family_codes = blank_to_none(self.other_family_codes);
        self.notes = blank_to_none(self.notes);
        self
    }
}

impl From<&Individual> for IndividualDraft {
    fn from(i: &Individual) -> Self {
        Self {
            individual_code: i.individual_code.clone(),
            aliases: i.aliases.clone(),
            family_id: i.family_id.clone(),
            sex: i.sex,
            phenotype: i.phenotype.clone(),
            projects: i.projects.clone(),
            other_family_codes: i.other_family_codes.clone(),
            notes: i.notes.clone(),
        }
    }
}

// PUT: só os campos presentes mudam; `null` limpa os campos opcionais
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct IndividualPatch {
    pub individual_code: Option<String>,
    pub aliases: Option<NameList>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub family_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub sex: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub phenotype: Option<Option<String>>,
    pub projects: Option<NameList>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub other_family_codes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl IndividualPatch {
    pub fn apply_to(self, draft: &mut IndividualDraft) {
        apply(&mut draft.individual_code, self.individual_code);
        apply(&mut draft.aliases, self.aliases);
        apply(&mut draft.projects, self.projects);
        apply(&mut draft.sex, self.sex);
        apply_text(&mut draft.family_id, self.family_id);
        apply_text(&mut draft.phenotype, self.phenotype);
        apply_text(&mut draft.other_family_codes, self.other_family_codes);
        apply_text(&mut draft.notes, self.notes);
    }
}
