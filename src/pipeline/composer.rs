use super::context::{RawBody, RawRequest, RequestContext, query_to_value};
use super::contract::RouteContract;
use super::stage::{PipelineState, Stage};
use crate::auth::{CredentialVerifier, TokenExtractor};
use crate::error::{GateError, Result};
use crate::organizations::{MembershipResolver, RoleGate};
use crate::validation::{FieldError, InputSource};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// A request stopped by the pipeline: the stage that refused it and why.
#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: Stage,
    /// Last state the request reached before `stage` refused it.
    pub reached: PipelineState,
    pub error: GateError,
}

impl PipelineFailure {
    /// Always [`PipelineState::Failed`].
    pub fn state(&self) -> PipelineState {
        PipelineState::Failed
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<PipelineFailure> for GateError {
    fn from(failure: PipelineFailure) -> Self {
        failure.error
    }
}

/// Runs a request through its route's stages, strictly in order, stopping
/// at the first failure.
///
/// Holds no per-request state; one instance serves every request.
#[derive(Clone)]
pub struct Pipeline {
    verifier: Arc<dyn CredentialVerifier>,
    resolver: MembershipResolver,
}

impl Pipeline {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, resolver: MembershipResolver) -> Self {
        Self { verifier, resolver }
    }

    pub fn resolver(&self) -> &MembershipResolver {
        &self.resolver
    }

    /// Runs every stage of `contract` against `raw`.
    ///
    /// On success the context is in [`PipelineState::BodyQueryValidated`].
    /// On failure nothing after the failing stage has run.
    #[tracing::instrument(name = "pipeline", skip_all, fields(route = contract.name()))]
    pub async fn run(
        &self,
        contract: &RouteContract,
        raw: RawRequest,
    ) -> std::result::Result<RequestContext, PipelineFailure> {
        let RawRequest {
            authorization,
            path_params,
            query,
            body,
        } = raw;
        let mut body = Some(body);
        let mut ctx = RequestContext::new(contract.name());

        for &stage in contract.stages() {
            let outcome = match stage {
                Stage::ValidateParams => Self::validate_params(contract, &path_params, &mut ctx),
                Stage::Authenticate => self.authenticate(authorization.as_deref(), &mut ctx).await,
                Stage::ResolveMembership => self.resolve_membership(contract, &mut ctx).await,
                Stage::CheckRole => Self::check_role(contract, &ctx),
                Stage::ValidateBodyAndQuery => Self::validate_body_and_query(
                    contract,
                    body.take().unwrap_or_default(),
                    query.as_deref(),
                    &mut ctx,
                ),
            };

            if let Err(error) = outcome {
                tracing::debug!(
                    stage = stage.as_str(),
                    kind = error.kind(),
                    reason = error.reason().unwrap_or("-"),
                    "Request rejected"
                );
                return Err(PipelineFailure {
                    stage,
                    reached: ctx.state,
                    error,
                });
            }
            ctx.state = stage.completes();
        }

        Ok(ctx)
    }

    /// Runs the pipeline and, if it passes, hands the context to `handler`
    /// exactly once.
    pub async fn dispatch<F, Fut, T>(
        &self,
        contract: &RouteContract,
        raw: RawRequest,
        handler: F,
    ) -> std::result::Result<T, PipelineFailure>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = T>,
    {
        let mut ctx = self.run(contract, raw).await?;
        ctx.state = PipelineState::Dispatched;
        tracing::debug!(route = contract.name(), "Dispatching request");
        Ok(handler(ctx).await)
    }

    fn validate_params(
        contract: &RouteContract,
        path_params: &HashMap<String, String>,
        ctx: &mut RequestContext,
    ) -> Result<()> {
        let raw: Map<String, Value> = path_params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let params = match contract.params_schema() {
            Some(schema) => schema
                .validate_from(InputSource::Params, Value::Object(raw))
                .map_err(|errors| GateError::validation(InputSource::Params, errors))?,
            None => Value::Object(raw),
        };

        if let Some(scope) = contract.org_scope() {
            let org_id = match path_params.get(scope.param()) {
                None => Err("is required"),
                Some(value) => Uuid::parse_str(value.trim()).map_err(|_| "must be a valid UUID"),
            }
            .map_err(|message| {
                GateError::validation(InputSource::Params, vec![FieldError::new(scope.param(), message)])
            })?;
            ctx.org_id = Some(org_id);
        }

        ctx.params = params;
        Ok(())
    }

    async fn authenticate(&self, authorization: Option<&str>, ctx: &mut RequestContext) -> Result<()> {
        let token = TokenExtractor::bearer(authorization)?;
        let identity = self.verifier.verify(&token).await?;
        tracing::debug!(user_id = identity.id(), "Caller authenticated");
        ctx.identity = Some(identity);
        Ok(())
    }

    async fn resolve_membership(&self, contract: &RouteContract, ctx: &mut RequestContext) -> Result<()> {
        let (Some(scope), Some(identity), Some(org_id)) = (contract.org_scope(), ctx.identity.as_ref(), ctx.org_id)
        else {
            return Err(GateError::internal(format!(
                "route {} resolved membership without identity or organization",
                contract.name()
            )));
        };

        let membership = self.resolver.resolve(identity, org_id, scope.visibility()).await?;
        ctx.membership = Some(membership);
        Ok(())
    }

    fn check_role(contract: &RouteContract, ctx: &RequestContext) -> Result<()> {
        let (Some(roles), Some(membership)) = (
            contract.org_scope().and_then(|scope| scope.required_roles()),
            ctx.membership.as_ref(),
        ) else {
            return Err(GateError::internal(format!(
                "route {} checked roles without a resolved membership",
                contract.name()
            )));
        };

        RoleGate::check(membership, roles)
    }

    /// Body first, then query. The first one to fail ends the request.
    fn validate_body_and_query(
        contract: &RouteContract,
        body: RawBody,
        query: Option<&str>,
        ctx: &mut RequestContext,
    ) -> Result<()> {
        if let Some(schema) = contract.body_schema() {
            let raw = match body {
                RawBody::Empty => Value::Object(Map::new()),
                RawBody::Json(value) => value,
                RawBody::Invalid(message) => {
                    return Err(GateError::validation(
                        InputSource::Body,
                        vec![FieldError::new("", message)],
                    ));
                }
            };
            ctx.body = schema
                .validate_from(InputSource::Body, raw)
                .map_err(|errors| GateError::validation(InputSource::Body, errors))?;
        }

        if let Some(schema) = contract.query_schema() {
            let raw = query_to_value(query).map_err(|e| GateError::validation(InputSource::Query, vec![e]))?;
            ctx.query = schema
                .validate_from(InputSource::Query, raw)
                .map_err(|errors| GateError::validation(InputSource::Query, errors))?;
        }

        Ok(())
    }
}
