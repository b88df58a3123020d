pub mod dashboard_service;
pub mod export_service;
pub mod storage_service;
pub mod subject_service;
pub mod tube_service;
pub mod usage_service;
