pub mod boxes;
pub mod dashboard;
pub mod individuals;
pub mod pages;
pub mod samples;
pub mod tubes;
pub mod usages;
