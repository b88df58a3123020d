// src/models/pagination.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::common::params::PageRequest;

// Página de resultados + metadados (total independente da página)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let pages = ((total + request.per_page - 1) / request.per_page).max(1);
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up_and_is_at_least_one() {
        let req = PageRequest { page: 1, per_page: 25 };
        assert_eq!(Paginated::<()>::new(vec![], 0, req).pages, 1);
        assert_eq!(Paginated::<()>::new(vec![], 25, req).pages, 1);
        assert_eq!(Paginated::<()>::new(vec![], 26, req).pages, 2);
    }
}
