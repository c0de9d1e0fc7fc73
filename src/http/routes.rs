use crate::pipeline::Gate;
use axum::Router;

/// Trait for composable route modules
///
/// A module mounts its routes behind the [`Gate`], one
/// [`RouteContract`](crate::pipeline::RouteContract) per route.
///
/// # Example
///
/// ```ignore
/// struct AccountsModule { store: AccountStore }
///
/// impl RouteModule for AccountsModule {
///     fn routes(&self, gate: &Gate) -> Router {
///         Router::new().route(
///             "/organizations/{orgId}/accounts",
///             gate.guard(get(list_accounts), contracts::list_accounts()),
///         )
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module, state applied.
    fn routes(&self, gate: &Gate) -> Router;

    /// Optional: specify a path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Registers this module's routes into the application router
    fn register(&self, router: Router, gate: &Gate) -> Router {
        let routes = self.routes(gate);

        match self.prefix() {
            Some(prefix) => router.nest(prefix, routes),
            None => router.merge(routes),
        }
    }
}
