pub mod auth;
pub mod categories;
pub mod error;
pub mod files;
pub mod health;
pub mod scheduler;
pub mod schedules;
pub mod status;
