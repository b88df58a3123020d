// src/common/extract.rs
//
// Extração tolerante: query string nunca vira 4xx, corpo JSON inválido vira
// o nosso 400 traduzido em vez da rejeição em texto puro do axum.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::common::error::AppError;

/// Query string crua, na ordem em que chegou.
pub type QueryPairs = Vec<(String, String)>;

/// Vale a primeira ocorrência de cada chave; chave repetida ou desconhecida
/// não derruba os outros parâmetros.
pub fn lenient_query<T: DeserializeOwned + Default>(query: Result<Query<QueryPairs>, QueryRejection>) -> T {
    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => {
            tracing::debug!("Query ignorada: {}", rejection.body_text());
            return T::default();
        }
    };

    let mut fields = Map::new();
    for (key, value) in pairs {
        fields.entry(key).or_insert(Value::String(value));
    }

    serde_json::from_value(Value::Object(fields)).unwrap_or_else(|e| {
        tracing::debug!("Query ignorada: {}", e);
        T::default()
    })
}

pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(payload)| payload)
        .map_err(|rejection| AppError::InvalidBody(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Filters {
        status: Option<String>,
        #[serde(rename = "box")]
        box_id: Option<String>,
        format: Option<String>,
    }

    fn parse(uri: &str) -> Filters {
        let uri: Uri = uri.parse().unwrap();
        lenient_query(Query::<QueryPairs>::try_from_uri(&uri))
    }

    #[test]
    fn repeated_key_keeps_first_value_and_the_other_keys() {
        let filters = parse("/api/tubes/export?format=xlsx&box=1&box=2&status=Empty&status=Low");
        assert_eq!(filters.format.as_deref(), Some("xlsx"));
        assert_eq!(filters.box_id.as_deref(), Some("1"));
        assert_eq!(filters.status.as_deref(), Some("Empty"));
    }

    #[test]
    fn unknown_and_empty_keys_are_ignored() {
        let filters = parse("/api/tubes?foo=bar&=x&status=Low");
        assert_eq!(filters.status.as_deref(), Some("Low"));
        assert!(filters.box_id.is_none());

        let empty = parse("/api/tubes");
        assert!(empty.status.is_none() && empty.format.is_none());
    }
}
