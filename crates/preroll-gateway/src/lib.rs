//! `preroll-gateway`: the HTTP control plane. Schedule CRUD, category
//! browsing and activation, status, asset serving and a manual scheduler tick.

pub mod app;
pub mod http;

pub use app::{build_router, AppState};
