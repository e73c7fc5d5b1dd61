pub mod dashboard;
pub mod presenter;
