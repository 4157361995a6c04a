pub mod analytics;
pub mod auth;
pub mod backup;
pub mod core;
pub mod narration;
pub mod reports;
pub mod results;
pub mod students;
