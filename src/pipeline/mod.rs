//! The per-request pipeline: validate params, authenticate, resolve the
//! organization membership, check the role, then validate body and query.
//!
//! A [`RouteContract`] declares which of those stages a route needs. The
//! [`Pipeline`] runs them in order and stops at the first failure; the
//! [`Gate`] mounts it on axum routes.

mod composer;
mod context;
mod contract;
mod layer;
mod stage;

pub use composer::{Pipeline, PipelineFailure};
pub use context::{RawBody, RawRequest, RequestContext};
pub use contract::{Access, OrgScope, RouteContract, RouteContractBuilder};
pub use layer::{Ctx, Gate};
pub use stage::{PipelineState, Stage};
