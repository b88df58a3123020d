// src/models/storage_box.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::patch::{apply, apply_text, blank_to_none, deserialize_some};
use crate::models::tube::{TubeKind, TubeView};

pub const DEFAULT_GRID: i64 = 9;

fn default_grid() -> i64 {
    DEFAULT_GRID
}

// --- Caixa do congelador (tabela 'box') ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StorageBox {
    pub id: i64,
    pub name: Option<String>,
    pub box_type: TubeKind,
    pub freezer: Option<String>,
    pub grid_rows: i64,
    pub grid_cols: i64,
    pub notes: Option<String>,
}

impl StorageBox {
    pub fn capacity(&self) -> i64 {
        self.grid_rows * self.grid_cols
    }

    pub fn contains_slot(&self, row: i64, col: i64) -> bool {
        (1..=self.grid_rows).contains(&row) && (1..=self.grid_cols).contains(&col)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoxView {
    #[serde(flatten)]
    pub storage_box: StorageBox,
    pub capacity: i64,
    pub tube_count: i64,
}

impl BoxView {
    pub fn new(storage_box: StorageBox, tube_count: i64) -> Self {
        Self {
            capacity: storage_box.capacity(),
            storage_box,
            tube_count,
        }
    }
}

// Caixa com os tubos já projetados, na ordem da grade
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoxDetail {
    #[serde(flatten)]
    pub storage_box: StorageBox,
    pub capacity: i64,
    pub tube_count: usize,
    pub tubes: Vec<TubeView>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BoxDraft {
    #[validate(length(max = 100, code = "box_name_length"))]
    pub name: Option<String>,
    #[serde(default)]
    pub box_type: TubeKind,
    pub freezer: Option<String>,
    #[serde(default = "default_grid")]
    #[validate(range(min = 1, max = 26, code = "grid_rows_range"))]
    pub grid_rows: i64,
    #[serde(default = "default_grid")]
    #[validate(range(min = 1, max = 48, code = "grid_cols_range"))]
    pub grid_cols: i64,
    pub notes: Option<String>,
}

impl BoxDraft {
    pub fn normalized(mut self) -> Self {
        self.name = blank_to_none(self.name);
        self.freezer = blank_to_none(self.freezer);
        self.notes = blank_to_none(self.notes);
        self
    }
}

impl From<&StorageBox> for BoxDraft {
    fn from(b: &StorageBox) -> Self {
        Self {
            name: b.name.clone(),
            box_type: b.box_type,
            freezer: b.freezer.clone(),
            grid_rows: b.grid_rows,
            grid_cols: b.grid_cols,
            notes: b.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BoxPatch {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub name: Option<Option<String>>,
    pub box_type: Option<TubeKind>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub freezer: Option<Option<String>>,
    pub grid_rows: Option<i64>,
    pub grid_cols: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl BoxPatch {
    pub fn apply_to(self, draft: &mut BoxDraft) {
        apply(&mut draft.box_type, self.box_type);
        apply(&mut draft.grid_rows, self.grid_rows);
        apply(&mut draft.grid_cols, self.grid_cols);
        apply_text(&mut draft.name, self.name);
        apply_text(&mut draft.freezer, self.freezer);
        apply_text(&mut draft.notes, self.notes);
    }
}
