// src/handlers/pages.rs
//
// Páginas estáticas embutidas no binário. Todo o conteúdo vem da API JSON,
// carregado pelo navegador.

use axum::response::Html;

pub async fn dashboard_page() -> Html<&'static str> {
    Html(include_str!("../../templates/dashboard.html"))
}

pub async fn tubes_page() -> Html<&'static str> {
    Html(include_str!("../../templates/tubes.html"))
}

pub async fn boxes_page() -> Html<&'static str> {
    Html(include_str!("../../templates/boxes.html"))
}

pub async fn sujets_page() -> Html<&'static str> {
    Html(include_str!("../../templates/sujets.html"))
}

pub async fn samples_page() -> Html<&'static str> {
    Html(include_str!("../../templates/samples.html"))
}

pub async fn history_page() -> Html<&'static str> {
    Html(include_str!("../../templates/history.html"))
}
