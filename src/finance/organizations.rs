//! Caller and organization read routes.

use super::contracts;
use crate::auth::Identity;
use crate::error::{GateError, Result};
use crate::http::{JsonResponse, PaginatedData, PaginationQuery, RouteModule};
use crate::organizations::{Membership, MembershipResolver, OrgRole};
use crate::pipeline::{Ctx, Gate};
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use uuid::Uuid;

/// An organization as seen by one of its members.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationView {
    pub id: Uuid,
    pub name: String,
    pub role: OrgRole,
}

/// Mounts `auth.me`, `organizations.get` and `organizations.members.list`.
pub struct OrganizationsModule;

impl RouteModule for OrganizationsModule {
    fn routes(&self, gate: &Gate) -> Router {
        Router::new()
            .route("/auth/me", gate.guard(get(me), contracts::auth_me()))
            .route(
                "/organizations/{orgId}",
                gate.guard(get(get_organization), contracts::get_organization()),
            )
            .route(
                "/organizations/{orgId}/members",
                gate.guard(get(list_members), contracts::list_members()),
            )
            .with_state(gate.pipeline().resolver().clone())
    }
}

async fn me(Ctx(ctx): Ctx) -> JsonResponse<Identity> {
    Ok(Json(ctx.require_identity()?.clone()))
}

async fn get_organization(
    State(resolver): State<MembershipResolver>,
    Ctx(ctx): Ctx,
) -> JsonResponse<OrganizationView> {
    let membership = ctx.require_membership()?;
    let org = resolver
        .organizations()
        .find_organization(membership.organization_id)
        .await?
        .ok_or_else(|| GateError::not_found("Organization not found"))?;

    Ok(Json(OrganizationView {
        id: org.id,
        name: org.name,
        role: membership.role,
    }))
}

async fn list_members(
    State(resolver): State<MembershipResolver>,
    Ctx(ctx): Ctx,
) -> Result<PaginatedData<Membership>> {
    let org_id = ctx.require_membership()?.organization_id;
    let page: PaginationQuery = ctx.query_as()?;
    let members = resolver.memberships().list_members(org_id).await?;
    Ok(PaginatedData::from_window(members, page.limit, page.offset))
}
