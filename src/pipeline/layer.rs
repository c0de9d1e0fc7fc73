//! Mounting the pipeline on axum routes.

use super::composer::Pipeline;
use super::context::{RawBody, RawRequest, RequestContext};
use super::contract::RouteContract;
use super::stage::PipelineState;
use crate::config::Config;
use crate::error::GateError;
use crate::validation::{FieldError, InputSource};
use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams, Request, State, rejection::RawPathParamsRejection},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Wraps routes with the request pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::post};
/// use ledgergate::pipeline::{Ctx, Gate};
///
/// async fn create_account(Ctx(ctx): Ctx) -> ledgergate::Result<StatusCode> {
///     let membership = ctx.require_membership()?;
///     // ...
/// }
///
/// let router = Router::new().route(
///     "/organizations/{orgId}/accounts",
///     gate.guard(post(create_account), contracts::create_account()),
/// );
/// ```
#[derive(Clone)]
pub struct Gate {
    pipeline: Arc<Pipeline>,
    max_body_size: usize,
    dev_mode: bool,
}

impl Gate {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            max_body_size: 1024 * 1024,
            dev_mode: false,
        }
    }

    /// Takes the body limit and dev mode from `config`.
    pub fn from_config(pipeline: Pipeline, config: &Config) -> Self {
        Self::new(pipeline)
            .with_max_body_size(config.server.max_body_size)
            .with_dev_mode(config.dev_mode)
    }

    #[must_use]
    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    #[must_use]
    pub fn with_dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Guards one method router with `contract`. The handler only runs when
    /// every stage passes, and can read the result through [`Ctx`].
    pub fn guard<S>(&self, route: MethodRouter<S>, contract: RouteContract) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let guard = RouteGuard {
            gate: self.clone(),
            contract: Arc::new(contract),
        };
        route.route_layer(middleware::from_fn_with_state(guard, enforce))
    }
}

#[derive(Clone)]
struct RouteGuard {
    gate: Gate,
    contract: Arc<RouteContract>,
}

async fn enforce(
    State(guard): State<RouteGuard>,
    path: Result<RawPathParams, RawPathParamsRejection>,
    request: Request,
    next: Next,
) -> Response {
    let dev_mode = guard.gate.dev_mode;

    let path_params: HashMap<String, String> = match path {
        Ok(params) => params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        Err(RawPathParamsRejection::MissingPathParams(_)) => HashMap::new(),
        Err(rejection) => {
            return GateError::validation(
                InputSource::Params,
                vec![FieldError::new("", rejection.body_text())],
            )
            .into_response_with(dev_mode);
        }
    };

    let (mut parts, body) = request.into_parts();

    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    let bytes = axum::body::to_bytes(body, guard.gate.max_body_size).await;
    let raw_body = match &bytes {
        Ok(bytes) => RawBody::from_bytes(bytes),
        Err(_) => RawBody::Invalid(format!(
            "request body exceeds {} bytes or could not be read",
            guard.gate.max_body_size
        )),
    };

    let raw = RawRequest {
        authorization,
        path_params,
        query: parts.uri.query().map(str::to_string),
        body: raw_body,
    };

    match guard.gate.pipeline.run(&guard.contract, raw).await {
        Ok(mut ctx) => {
            ctx.state = PipelineState::Dispatched;
            parts.extensions.insert(ctx);
            let body = bytes.map(Body::from).unwrap_or_else(|_| Body::empty());
            next.run(Request::from_parts(parts, body)).await
        }
        Err(failure) => failure.error.into_response_with(dev_mode),
    }
}

/// Extractor for the [`RequestContext`] of a guarded route.
///
/// Using it on a route without [`Gate::guard`] is an internal error.
pub struct Ctx(pub RequestContext);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = GateError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let ctx = parts.extensions.remove::<RequestContext>();
        async move {
            ctx.map(Ctx)
                .ok_or_else(|| GateError::internal("route is not guarded by the request pipeline"))
        }
    }
}

impl IntoResponse for super::composer::PipelineFailure {
    fn into_response(self) -> Response {
        self.error.into_response()
    }
}
