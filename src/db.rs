pub mod individual_repo;
pub use individual_repo::IndividualRepository;
pub mod sample_repo;
pub use sample_repo::SampleRepository;
pub mod tube_repo;
pub use tube_repo::TubeRepository;
pub mod box_repo;
pub use box_repo::BoxRepository;
pub mod usage_repo;
pub use usage_repo::UsageRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
