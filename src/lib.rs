//! ledgergate - the request gate of a multi-tenant finance API
//!
//! Every request to an organization's data passes the same ordered checks
//! before a handler runs: path parameters, the caller's credential, their
//! membership in the organization, their role, and finally the body and
//! query. The first failing check answers the request with a 400, 401, 403
//! or 404 and nothing after it runs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ledgergate::{App, ConfigBuilder};
//! use ledgergate::finance::{AccountStore, AccountsModule, OrganizationsModule};
//! use ledgergate::organizations::InMemoryOrgStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     ledgergate::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     let store = InMemoryOrgStore::new();
//!
//!     App::from_config(config, Arc::new(store.clone()), Arc::new(store))?
//!         .register_module(OrganizationsModule)
//!         .register_module(AccountsModule::new(AccountStore::new()))
//!         .serve()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
mod config;
mod core;
mod error;
pub mod finance;
mod http;
mod middleware;
pub mod organizations;
pub mod pipeline;
pub mod testing;
pub mod utils;
pub mod validation;

// Re-exports for public API
pub use config::{
    AuthConfig, Config, ConfigBuilder, ConfigError, LoggingConfig, OrgAccessConfig, ServerConfig,
};
pub use self::core::App;
pub use error::{AuthenticationReason, AuthorizationReason, ErrorResponse, GateError, Result};
pub use http::{
    CreatedResponse, JsonResponse, NoContentResponse, PaginatedData, PaginationMeta,
    PaginationQuery, RouteModule,
};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "ledgergate=debug")
/// - `LEDGERGATE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install(env_filter, json_logs);
}

/// Initialize tracing with the configured level and format
pub fn init_tracing_with_config(config: &Config) {
    install(EnvFilter::new(&config.logging.level), config.logging.json);
}

fn install(env_filter: EnvFilter, json: bool) {
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
