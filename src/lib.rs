pub mod app;
pub mod charts;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod fetch;
pub mod figure;
pub mod geo;
pub mod handlers;
pub mod maps;
pub mod models;
pub mod smoothing;
pub mod state;
pub mod table;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use dashboard::{BuildOptions, Dashboard, build_dashboard};
pub use state::AppState;
