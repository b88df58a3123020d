// src/common/params.rs
//
// Coerção defensiva dos parâmetros de query string.
// Nenhum valor malformado pode virar erro HTTP: ausente ou inválido -> padrão,
// fora da faixa -> limitado à faixa.

/// Converte um parâmetro inteiro, usando `default` quando ausente/inválido
/// e limitando o resultado a `[min, max]`.
pub fn coerce_int(raw: Option<&str>, default: i64, min: i64, max: i64) -> i64 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(value) => value.clamp(min, max),
        None => default.clamp(min, max),
    }
}

/// Filtro opcional por id: só ids positivos contam, o resto desliga o filtro.
pub fn coerce_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Texto de filtro: vazio ou só espaços equivale a ausente.
pub fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Página + tamanho de página já coagidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn from_raw(
        page: Option<&str>,
        per_page: Option<&str>,
        default_per_page: i64,
        max_per_page: i64,
    ) -> Self {
        Self {
            page: coerce_int(page, 1, 1, i64::from(i32::MAX)),
            per_page: coerce_int(per_page, default_per_page, 1, max_per_page),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_garbage_resolve_to_default() {
        assert_eq!(coerce_int(None, 200, 1, 5000), 200);
        assert_eq!(coerce_int(Some("abc"), 200, 1, 5000), 200);
        assert_eq!(coerce_int(Some(""), 200, 1, 5000), 200);
        assert_eq!(coerce_int(Some("12.5"), 200, 1, 5000), 200);
        assert_eq!(coerce_int(Some("99999999999999999999999"), 200, 1, 5000), 200);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(coerce_int(Some("0"), 200, 1, 5000), 1);
        assert_eq!(coerce_int(Some("-7"), 200, 1, 5000), 1);
        assert_eq!(coerce_int(Some("100000"), 200, 1, 5000), 5000);
        assert_eq!(coerce_int(Some(" 42 "), 200, 1, 5000), 42);
    }

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(coerce_id(Some("3")), Some(3));
        assert_eq!(coerce_id(Some("0")), None);
        assert_eq!(coerce_id(Some("-1")), None);
        assert_eq!(coerce_id(Some("box")), None);
        assert_eq!(coerce_id(None), None);
    }

    #[test]
    fn page_offset_never_overflows() {
        let req = PageRequest::from_raw(Some("3"), Some("25"), 25, 100);
        assert_eq!(req.offset(), 50);

        let huge = PageRequest::from_raw(Some("9999999999999"), Some("100"), 25, 100);
        assert_eq!(huge.page, i64::from(i32::MAX));
        assert!(huge.offset() > 0);
    }

    #[test]
    fn blank_text_filters_are_absent() {
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(Some(" DNA ")), Some("DNA".to_string()));
    }
}
