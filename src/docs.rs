// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "DNA Sample Manager", description = "Inventário de indivíduos, amostras, tubos e caixas"),
    paths(
        // --- Dashboard ---
        handlers::dashboard::get_stats,

        // --- Individuals / Sujets ---
        handlers::individuals::list_individuals,
        handlers::individuals::list_sujets,
        handlers::individuals::get_individual,
        handlers::individuals::get_sujet,
        handlers::individuals::create_individual,
        handlers::individuals::update_individual,
        handlers::individuals::delete_individual,
        handlers::individuals::list_families,
        handlers::individuals::list_projects,

        // --- Samples ---
        handlers::samples::list_samples,
        handlers::samples::list_sample_types,
        handlers::samples::get_sample,
        handlers::samples::create_sample,
        handlers::samples::add_sample_to_sujet,
        handlers::samples::update_sample,
        handlers::samples::delete_sample,

        // --- Tubes ---
        handlers::tubes::list_tubes,
        handlers::tubes::export_tubes,
        handlers::tubes::get_tube,
        handlers::tubes::create_tube,
        handlers::tubes::update_tube,
        handlers::tubes::delete_tube,

        // --- Boxes ---
        handlers::boxes::list_boxes,
        handlers::boxes::get_box,
        handlers::boxes::create_box,
        handlers::boxes::update_box,
        handlers::boxes::delete_box,

        // --- Usages ---
        handlers::usages::list_usages,
        handlers::usages::list_tube_usages,
        handlers::usages::record_usage,
    ),
    components(
        schemas(
            // --- Individuals ---
            models::individual::NameList,
            models::individual::Individual,
            models::individual::IndividualView,
            models::individual::SujetDetail,
            models::individual::SujetSample,
            models::individual::SujetTube,
            models::individual::IndividualDraft,
            models::individual::IndividualPatch,

            // --- Samples ---
            models::sample::Sample,
            models::sample::SampleView,
            models::sample::SampleTypes,
            models::sample::SampleDraft,
            models::sample::SujetSamplePayload,
            models::sample::SamplePatch,

            // --- Tubes ---
            models::tube::TubeStatus,
            models::tube::TubeKind,
            models::tube::Tube,
            models::tube::TubeView,
            models::tube::TubeDraft,
            models::tube::TubePatch,

            // --- Boxes ---
            models::storage_box::StorageBox,
            models::storage_box::BoxView,
            models::storage_box::BoxDetail,
            models::storage_box::BoxDraft,
            models::storage_box::BoxPatch,

            // --- Usages ---
            models::usage::TubeUsage,
            models::usage::UsageView,
            models::usage::UsagePayload,

            // --- Dashboard ---
            models::dashboard::Totals,
            models::dashboard::StatusCounts,
            models::dashboard::BoxCount,
            models::dashboard::TypeCount,
            models::dashboard::FamilyCount,
            models::dashboard::ProjectCount,
            models::dashboard::Stats,
        )
    ),
    tags(
        (name = "Dashboard", description = "Estatísticas do biobanco"),
        (name = "Individuals", description = "Indivíduos e fichas de sujet"),
        (name = "Samples", description = "Amostras (DNA, RNA, ...)"),
        (name = "Tubes", description = "Tubos, status de volume e exportação"),
        (name = "Boxes", description = "Caixas de congelador e grade de posições"),
        (name = "Usages", description = "Histórico de retiradas (somente inserção)")
    )
)]
pub struct ApiDoc;
