// src/models/patch.rs
//
// Utilitários dos payloads de PUT: campo ausente = manter, `null` = limpar.

use serde::{Deserialize, Deserializer};

/// Usado com `#[serde(default, deserialize_with = "deserialize_some")]` em
/// `Option<Option<T>>`: ausente -> `None`, `null` -> `Some(None)`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub fn apply<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

pub fn apply_text(target: &mut Option<String>, value: Option<Option<String>>) {
    if let Some(value) = value {
        *target = blank_to_none(value);
    }
}

pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
