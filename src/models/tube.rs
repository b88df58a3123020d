// src/models/tube.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::params::{coerce_id, non_empty};
use crate::models::individual::IndividualRef;
use crate::models::patch::{apply, apply_text, blank_to_none, deserialize_some};

/// Abaixo deste volume (µL) o tubo é crítico.
pub const CRITICAL_VOLUME: f64 = 10.0;
/// Fração do volume inicial abaixo da qual o tubo está baixo.
pub const LOW_FRACTION: f64 = 0.25;

// --- Status derivado (nunca gravado) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum TubeStatus {
    Empty,
    Critical,
    Low,
    Available,
}

impl TubeStatus {
    pub const ALL: [TubeStatus; 4] = [
        TubeStatus::Empty,
        TubeStatus::Critical,
        TubeStatus::Low,
        TubeStatus::Available,
    ];

    /// Precedência: Empty > Critical > Low > Available.
    pub fn classify(current_volume: Option<f64>, initial_volume: Option<f64>) -> Self {
        let current = match current_volume {
            // `!(v > 0)` também pega NaN
            Some(v) if v > 0.0 => v,
            _ => return TubeStatus::Empty,
        };

        if current < CRITICAL_VOLUME {
            return TubeStatus::Critical;
        }

        match initial_volume {
            Some(initial) if current < initial * LOW_FRACTION => TubeStatus::Low,
            _ => TubeStatus::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TubeStatus::Empty => "Empty",
            TubeStatus::Critical => "Critical",
            TubeStatus::Low => "Low",
            TubeStatus::Available => "Available",
        }
    }

    /// Valor desconhecido -> `None` (o filtro é ignorado).
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

// --- Tipo do tubo (estoque ou alíquota de trabalho) ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TubeKind {
    #[default]
    Stock,
    Working,
}

impl TubeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TubeKind::Stock => "stock",
            TubeKind::Working => "working",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stock" => Some(TubeKind::Stock),
            "working" => Some(TubeKind::Working),
            _ => None,
        }
    }
}

/// "B7" para linha 2, coluna 7. Linhas acima de 26 ficam numéricas.
pub fn position_display(row: Option<i64>, col: Option<i64>) -> Option<String> {
    match (row, col) {
        (Some(row), Some(col)) if row > 0 && col > 0 => {
            let row_label = if row <= 26 {
                char::from(b'A' + (row - 1) as u8).to_string()
            } else {
                row.to_string()
            };
            Some(format!("{row_label}{col}"))
        }
        _ => None,
    }
}

// --- Tubo (tabela 'tube') ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Tube {
    pub id: i64,
    pub barcode: String,
    pub sample_id: Option<i64>,
    pub box_id: Option<i64>,
    pub position_row: Option<i64>,
    pub position_col: Option<i64>,
    pub concentration: Option<f64>,
    pub quality: Option<String>,
    pub initial_volume: Option<f64>,
    pub current_volume: Option<f64>,
    pub source: Option<String>,
    pub tube_type: TubeKind,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tube {
    pub fn status(&self) -> TubeStatus {
        TubeStatus::classify(self.current_volume, self.initial_volume)
    }

    pub fn position_display(&self) -> Option<String> {
        position_display(self.position_row, self.position_col)
    }
}

// ---
// Linhas mínimas usadas nas cargas em lote da projeção
// ---
#[derive(Debug, Clone, FromRow)]
pub struct SampleRef {
    pub id: i64,
    pub sample_code: String,
    pub individual_id: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BoxRef {
    pub id: i64,
    pub name: Option<String>,
    pub freezer: Option<String>,
}

// --- Projeção plana para JSON/exportação ---
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TubeView {
    pub id: i64,
    pub barcode: String,
    pub sample_id: Option<i64>,
    pub sample_code: Option<String>,
    pub individual_id: Option<i64>,
    pub individual_code: Option<String>,
    pub box_id: Option<i64>,
    pub box_name: Option<String>,
    pub freezer: Option<String>,
    pub position_row: Option<i64>,
    pub position_col: Option<i64>,
    pub position_display: Option<String>,
    pub concentration: Option<f64>,
    pub quality: Option<String>,
    pub initial_volume: Option<f64>,
    pub current_volume: Option<f64>,
    pub source: Option<String>,
    pub tube_type: TubeKind,
    pub notes: Option<String>,
    pub status: TubeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TubeView {
    pub fn project(
        tube: Tube,
        sample: Option<&SampleRef>,
        individual: Option<&IndividualRef>,
        storage_box: Option<&BoxRef>,
    ) -> Self {
        Self {
            status: tube.status(),
            position_display: tube.position_display(),
            sample_code: sample.map(|s| s.sample_code.clone()),
            individual_id: sample.and_then(|s| s.individual_id),
            individual_code: individual.map(|i| i.individual_code.clone()),
            box_name: storage_box.and_then(|b| b.name.clone()),
            freezer: storage_box.and_then(|b| b.freezer.clone()),
            id: tube.id,
            barcode: tube.barcode,
            sample_id: tube.sample_id,
            box_id: tube.box_id,
            position_row: tube.position_row,
            position_col: tube.position_col,
            concentration: tube.concentration,
            quality: tube.quality,
            initial_volume: tube.initial_volume,
            current_volume: tube.current_volume,
            source: tube.source,
            tube_type: tube.tube_type,
            notes: tube.notes,
            created_at: tube.created_at,
            updated_at: tube.updated_at,
        }
    }
}

// ---
// Filtro compartilhado entre listagem e exportação
// ---
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeFilter {
    pub search: Option<String>,
    pub box_id: Option<i64>,
    pub status: Option<TubeStatus>,
    pub kind: Option<TubeKind>,
}

impl TubeFilter {
    /// Valores desconhecidos desligam o filtro correspondente.
    pub fn from_raw(
        search: Option<&str>,
        box_id: Option<&str>,
        status: Option<&str>,
        kind: Option<&str>,
    ) -> Self {
        Self {
            search: non_empty(search),
            box_id: coerce_id(box_id),
            status: status.and_then(TubeStatus::parse),
            kind: kind.and_then(TubeKind::parse),
        }
    }
}

// ---
// Payloads de escrita
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TubeDraft {
    #[validate(length(min = 1, max = 50, code = "barcode_length"))]
    pub barcode: String,
    pub sample_id: Option<i64>,
    pub box_id: Option<i64>,
    #[validate(range(min = 1, code = "position_row_range"))]
    pub position_row: Option<i64>,
    #[validate(range(min = 1, code = "position_col_range"))]
    pub position_col: Option<i64>,
    #[validate(range(min = 0.0, code = "concentration_range"))]
    pub concentration: Option<f64>,
    pub quality: Option<String>,
    #[validate(range(min = 0.0, code = "volume_range"))]
    pub initial_volume: Option<f64>,
    #[validate(range(min = 0.0, code = "volume_range"))]
    pub current_volume: Option<f64>,
    pub source: Option<String>,
    #[serde(default)]
    pub tube_type: TubeKind,
    pub notes: Option<String>,
}

impl TubeDraft {
    pub fn normalized(mut self) -> Self {
        self.barcode = self.barcode.trim().to_string();
        self.quality = blank_to_none(self.quality);
        self.source = blank_to_none(self.source);
        self.notes = blank_to_none(self.notes);
        self
    }

    /// Posição completa dentro de uma caixa, se houver.
    pub fn slot(&self) -> Option<(i64, i64, i64)> {
        match (self.box_id, self.position_row, self.position_col) {
            (Some(box_id), Some(row), Some(col)) => Some((box_id, row, col)),
            _ => None,
        }
    }
}

impl From<&Tube> for TubeDraft {
    fn from(t: &Tube) -> Self {
        Self {
            barcode: t.barcode.clone(),
            sample_id: t.sample_id,
            box_id: t.box_id,
            position_row: t.position_row,
            position_col: t.position_col,
            concentration: t.concentration,
            quality: t.quality.clone(),
            initial_volume: t.initial_volume,
            current_volume: t.current_volume,
            source: t.source.clone(),
            tube_type: t.tube_type,
            notes: t.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TubePatch {
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub sample_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub box_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub position_row: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub position_col: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub concentration: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub quality: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub initial_volume: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub current_volume: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub source: Option<Option<String>>,
    pub tube_type: Option<TubeKind>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl TubePatch {
    pub fn apply_to(self, draft: &mut TubeDraft) {
        apply(&mut draft.barcode, self.barcode);
        apply(&mut draft.sample_id, self.sample_id);
        apply(&mut draft.box_id, self.box_id);
        apply(&mut draft.position_row, self.position_row);
        apply(&mut draft.position_col, self.position_col);
        apply(&mut draft.concentration, self.concentration);
        apply(&mut draft.initial_volume, self.initial_volume);
        apply(&mut draft.current_volume, self.current_volume);
        apply(&mut draft.tube_type, self.tube_type);
        apply_text(&mut draft.quality, self.quality);
        apply_text(&mut draft.source, self.source);
        apply_text(&mut draft.notes, self.notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_is_strictly_under_a_quarter_of_initial_volume() {
        assert_eq!(TubeStatus::classify(Some(9.99), Some(100.0)), TubeStatus::Critical);
        // 30/100 não está abaixo de 25%
        assert_eq!(TubeStatus::classify(Some(30.0), Some(100.0)), TubeStatus::Available);
        assert_eq!(TubeStatus::classify(Some(25.0), Some(100.0)), TubeStatus::Available);
        assert_eq!(TubeStatus::classify(Some(24.0), Some(100.0)), TubeStatus::Low);
        assert_eq!(TubeStatus::classify(Some(80.0), Some(100.0)), TubeStatus::Available);
        assert_eq!(TubeStatus::classify(Some(0.0), Some(100.0)), TubeStatus::Empty);
    }

    #[test]
    fn low_needs_initial_volume_and_critical_wins_over_low() {
        assert_eq!(TubeStatus::classify(Some(30.0), Some(200.0)), TubeStatus::Low);
        assert_eq!(TubeStatus::classify(Some(30.0), None), TubeStatus::Available);
        assert_eq!(TubeStatus::classify(Some(5.0), Some(1000.0)), TubeStatus::Critical);
        assert_eq!(TubeStatus::classify(Some(10.0), None), TubeStatus::Available);
        assert_eq!(TubeStatus::classify(Some(10.0), Some(0.0)), TubeStatus::Available);
    }

    #[test]
    fn missing_negative_or_nan_volume_is_empty() {
        assert_eq!(TubeStatus::classify(None, Some(100.0)), TubeStatus::Empty);
        assert_eq!(TubeStatus::classify(Some(-3.0), None), TubeStatus::Empty);
        assert_eq!(TubeStatus::classify(Some(f64::NAN), None), TubeStatus::Empty);
    }

    #[test]
    fn every_volume_pair_gets_exactly_one_status() {
        let volumes = [None, Some(-1.0), Some(0.0), Some(0.5), Some(9.99), Some(10.0), Some(24.9), Some(25.0), Some(1e6)];
        for current in volumes {
            for initial in volumes {
                let status = TubeStatus::classify(current, initial);
                let matches = TubeStatus::ALL
                    .iter()
                    .filter(|candidate| **candidate == status)
                    .count();
                assert_eq!(matches, 1, "{current:?}/{initial:?}");
            }
        }
    }

    #[test]
    fn status_and_kind_parse_case_insensitively() {
        assert_eq!(TubeStatus::parse("critical"), Some(TubeStatus::Critical));
        assert_eq!(TubeStatus::parse(" Low "), Some(TubeStatus::Low));
        assert_eq!(TubeStatus::parse("Full"), None);
        assert_eq!(TubeKind::parse("WORKING"), Some(TubeKind::Working));
        assert_eq!(TubeKind::parse("aliquot"), None);
    }

    #[test]
    fn positions_render_as_letter_and_number() {
        assert_eq!(position_display(Some(1), Some(1)).as_deref(), Some("A1"));
        assert_eq!(position_display(Some(9), Some(12)).as_deref(), Some("I12"));
        assert_eq!(position_display(Some(27), Some(3)).as_deref(), Some("273"));
        assert_eq!(position_display(Some(2), None), None);
        assert_eq!(position_display(Some(0), Some(4)), None);
    }

    #[test]
    fn filter_ignores_unknown_values() {
        let filter = TubeFilter::from_raw(Some("  "), Some("abc"), Some("Full"), Some("aliquot"));
        assert_eq!(filter, TubeFilter::default());

        let filter = TubeFilter::from_raw(Some("C00"), Some("4"), Some("low"), Some("stock"));
        assert_eq!(filter.search.as_deref(), Some("C00"));
        assert_eq!(filter.box_id, Some(4));
        assert_eq!(filter.status, Some(TubeStatus::Low));
        assert_eq!(filter.kind, Some(TubeKind::Stock));
    }
}
