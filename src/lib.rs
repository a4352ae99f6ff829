//! tplace: terminal UI for JSONPlaceholder-style REST APIs.
//!
//! The crate is split into a UI-free core (`pipeline`, `view_state`,
//! `selection`, `mutation`, `detail`) and the terminal front end (`app`,
//! `event`, `ui`) that drives it.

pub mod api;
pub mod app;
pub mod config;
pub mod detail;
pub mod event;
pub mod mutation;
pub mod notification;
pub mod pipeline;
pub mod resource;
pub mod selection;
pub mod ui;
pub mod view_state;

/// Version injected at compile time via TPLACE_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TPLACE_VERSION") {
    Some(v) => v,
    None => "dev",
};
