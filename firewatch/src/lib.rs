pub mod commands;
pub mod dashboard;
pub mod handlers;
pub mod server;

pub use handlers::{fetch_params, format_key_status, load_config, report_path, write_report};
pub use server::{build_router, ApiError, AppState};
