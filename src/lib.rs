//! DNA Sample Manager: inventário de um biobanco de DNA/RNA.
//!
//! Indivíduos -> amostras -> tubos -> caixas, com histórico de uso dos tubos,
//! API JSON, exportação TSV/XLSX e um painel com estatísticas.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;

/// Monta o router completo (API + páginas + Swagger).
pub fn app(app_state: AppState) -> Router {
    let individual_routes = Router::new()
        .route(
            "/",
            get(handlers::individuals::list_individuals).post(handlers::individuals::create_individual),
        )
        .route(
            "/{id}",
            get(handlers::individuals::get_individual)
                .put(handlers::individuals::update_individual)
                .delete(handlers::individuals::delete_individual),
        );

    // "Sujets" = indivíduo + amostras (tela principal do laboratório)
    let sujet_routes = Router::new()
        .route(
            "/",
            get(handlers::individuals::list_sujets).post(handlers::individuals::create_individual),
        )
        .route(
            "/{id}",
            get(handlers::individuals::get_sujet)
                .put(handlers::individuals::update_individual)
                .delete(handlers::individuals::delete_individual),
        )
        .route("/{id}/samples", post(handlers::samples::add_sample_to_sujet));

    let sample_routes = Router::new()
        .route(
            "/",
            get(handlers::samples::list_samples).post(handlers::samples::create_sample),
        )
        .route("/types", get(handlers::samples::list_sample_types))
        .route(
            "/{id}",
            get(handlers::samples::get_sample)
                .put(handlers::samples::update_sample)
                .delete(handlers::samples::delete_sample),
        );

    // A rota de exportação vem antes de "/{id}"
    let tube_routes = Router::new()
        .route(
            "/",
            get(handlers::tubes::list_tubes).post(handlers::tubes::create_tube),
        )
        .route("/export", get(handlers::tubes::export_tubes))
        .route(
            "/{id}",
            get(handlers::tubes::get_tube)
                .put(handlers::tubes::update_tube)
                .delete(handlers::tubes::delete_tube),
        )
        .route("/{id}/usages", get(handlers::usages::list_tube_usages));

    let box_routes = Router::new()
        .route(
            "/",
            get(handlers::boxes::list_boxes).post(handlers::boxes::create_box),
        )
        .route(
            "/{id}",
            get(handlers::boxes::get_box)
                .put(handlers::boxes::update_box)
                .delete(handlers::boxes::delete_box),
        );

    // Somente inserção e leitura: o histórico não é editável
    let usage_routes = Router::new().route(
        "/",
        get(handlers::usages::list_usages).post(handlers::usages::record_usage),
    );

    let page_routes = Router::new()
        .route("/", get(handlers::pages::dashboard_page))
        .route("/tubes", get(handlers::pages::tubes_page))
        .route("/boxes", get(handlers::pages::boxes_page))
        .route("/sujets", get(handlers::pages::sujets_page))
        .route("/samples", get(handlers::pages::samples_page))
        .route("/history", get(handlers::pages::history_page));

    Router::new()
        .merge(page_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/stats", get(handlers::dashboard::get_stats))
        .route("/api/families", get(handlers::individuals::list_families))
        .route("/api/projects", get(handlers::individuals::list_projects))
        .nest("/api/individuals", individual_routes)
        .nest("/api/sujets", sujet_routes)
        .nest("/api/samples", sample_routes)
        .nest("/api/tubes", tube_routes)
        .nest("/api/boxes", box_routes)
        .nest("/api/usages", usage_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
