use crate::{
    auth::JwtVerifier,
    config::Config,
    error::Result,
    http::RouteModule,
    middleware::MakeRequestUuid,
    organizations::{MembershipResolver, MembershipStore, OrganizationStore},
    pipeline::{Gate, Pipeline},
};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// The HTTP application: guarded route modules plus the outer middleware.
pub struct App {
    router: Router,
    config: Config,
    gate: Gate,
}

impl App {
    pub fn new(config: Config, gate: Gate) -> Self {
        Self {
            router: Router::new(),
            config,
            gate,
        }
    }

    /// Wires JWT verification and membership resolution from `config`.
    pub fn from_config(
        config: Config,
        memberships: Arc<dyn MembershipStore>,
        organizations: Arc<dyn OrganizationStore>,
    ) -> Result<Self> {
        let verifier = JwtVerifier::from_config(&config.auth)?;
        let resolver = MembershipResolver::new(memberships, organizations)
            .with_default_visibility(config.organizations.visibility());
        let gate = Gate::from_config(Pipeline::new(Arc::new(verifier), resolver), &config);
        Ok(Self::new(config, gate))
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a route module with the application
    pub fn register_module<M: RouteModule>(mut self, module: M) -> Self {
        self.router = module.register(self.router, &self.gate);
        self
    }

    /// Merge an already built router, e.g. unguarded health routes.
    pub fn merge_router(mut self, router: Router) -> Self {
        self.router = self.router.merge(router);
        self
    }

    /// The finished router with request ids and tracing applied. Used by
    /// [`serve`](Self::serve) and by tests.
    pub fn into_router(self) -> Router {
        self.router
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Start the application server
    pub async fn serve(self) -> std::result::Result<(), std::io::Error> {
        let addr = self
            .config
            .server
            .addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server starting on http://{}", addr);

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give connections a grace period to close
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("Shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::organizations::InMemoryOrgStore;

    #[test]
    fn test_from_config_requires_secret() {
        let config = ConfigBuilder::new().build().unwrap();
        let store = InMemoryOrgStore::new();
        let result = App::from_config(config, Arc::new(store.clone()), Arc::new(store));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_applies_settings() {
        let config = ConfigBuilder::new()
            .with_jwt_secret("an-adequately-long-secret-for-hs256!")
            .with_dev_mode(true)
            .with_reveal_missing_organizations(true)
            .build()
            .unwrap();
        let store = InMemoryOrgStore::new();
        let app = App::from_config(config, Arc::new(store.clone()), Arc::new(store)).unwrap();
        assert!(app.gate().dev_mode());
        assert_eq!(
            app.gate().pipeline().resolver().default_visibility(),
            crate::organizations::OrgVisibility::Reveal
        );
    }
}
