pub mod charts;
pub mod dashboard;
pub mod datasets;
pub mod identity_provider;
pub mod login;
pub mod summary;
