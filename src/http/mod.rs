//! HTTP response wrappers, query types, and the [`RouteModule`] trait for
//! organizing guarded routes.

pub mod query;
pub mod response;
pub mod routes;

pub use query::PaginationQuery;
pub use response::{CreatedResponse, JsonResponse, NoContentResponse, PaginatedData, PaginationMeta};
pub use routes::RouteModule;
