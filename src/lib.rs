pub mod about;
pub mod app;
pub mod config;
pub mod curated;
pub mod error;
pub mod filters;
pub mod imaging;
pub mod loader;
pub mod measurements;
pub mod metadata;
pub mod render_chart;
pub mod session;
pub mod views;

pub use error::{HofError, Result};

pub const DEFAULT_LOG_FILTER: &str = "hall_of_fame_enhancers=info";

/// Logs to stderr. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
