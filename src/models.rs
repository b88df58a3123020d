pub mod dashboard;
pub mod individual;
pub mod pagination;
pub mod patch;
pub mod sample;
pub mod storage_box;
pub mod tube;
pub mod usage;
