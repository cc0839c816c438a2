pub mod app;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod reconcile;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use client::ApiClient;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
