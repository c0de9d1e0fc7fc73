//! Per-route declarations of what a request must satisfy.

use super::stage::Stage;
use crate::organizations::{OrgVisibility, RoleSet};
use crate::validation::InputSchema;
use std::fmt;
use std::sync::Arc;

/// Whether a route needs a verified caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    Public,
    #[default]
    Authenticated,
}

/// Makes a route organization-scoped: the caller must be a member of the
/// organization named by a path parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgScope {
    param: String,
    roles: Option<RoleSet>,
    visibility: Option<OrgVisibility>,
}

impl OrgScope {
    /// Scope on the path parameter `param` (e.g. `"orgId"`).
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            roles: None,
            visibility: None,
        }
    }

    /// Only members whose role is in `roles` may proceed.
    #[must_use]
    pub fn roles(mut self, roles: RoleSet) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Answer non-members of a missing organization with 404.
    #[must_use]
    pub fn reveal_missing(mut self) -> Self {
        self.visibility = Some(OrgVisibility::Reveal);
        self
    }

    /// Never disclose whether the organization exists, whatever the
    /// configured default.
    #[must_use]
    pub fn conceal_missing(mut self) -> Self {
        self.visibility = Some(OrgVisibility::Conceal);
        self
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn required_roles(&self) -> Option<&RoleSet> {
        self.roles.as_ref()
    }

    pub fn visibility(&self) -> Option<OrgVisibility> {
        self.visibility
    }
}

/// Everything the pipeline needs to know about one route. Built once at
/// startup and immutable afterwards; cloning is cheap.
///
/// # Example
///
/// ```rust
/// use ledgergate::organizations::RoleSet;
/// use ledgergate::pipeline::{OrgScope, RouteContract, Stage};
/// use ledgergate::validation::{Field, Schema};
///
/// let contract = RouteContract::builder("accounts.create")
///     .params(Schema::object().field("orgId", Field::uuid()))
///     .body(Schema::object().field("name", Field::string().min_len(1)))
///     .org_scoped(OrgScope::new("orgId").roles(RoleSet::owner_or_admin()))
///     .build();
///
/// assert_eq!(contract.stages().len(), 5);
/// assert_eq!(contract.stages()[3], Stage::CheckRole);
/// ```
#[derive(Clone)]
pub struct RouteContract {
    name: Arc<str>,
    params: Option<Arc<dyn InputSchema>>,
    body: Option<Arc<dyn InputSchema>>,
    query: Option<Arc<dyn InputSchema>>,
    access: Access,
    org_scope: Option<OrgScope>,
    stages: Arc<[Stage]>,
}

impl RouteContract {
    pub fn builder(name: impl Into<String>) -> RouteContractBuilder {
        RouteContractBuilder {
            name: name.into(),
            params: None,
            body: None,
            query: None,
            access: Access::default(),
            org_scope: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn org_scope(&self) -> Option<&OrgScope> {
        self.org_scope.as_ref()
    }

    pub fn params_schema(&self) -> Option<&dyn InputSchema> {
        self.params.as_deref()
    }

    pub fn body_schema(&self) -> Option<&dyn InputSchema> {
        self.body.as_deref()
    }

    pub fn query_schema(&self) -> Option<&dyn InputSchema> {
        self.query.as_deref()
    }

    /// The stages this route runs, in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl fmt::Debug for RouteContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContract")
            .field("name", &self.name)
            .field("access", &self.access)
            .field("org_scope", &self.org_scope)
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

#[must_use = "builder does nothing until you call build()"]
pub struct RouteContractBuilder {
    name: String,
    params: Option<Arc<dyn InputSchema>>,
    body: Option<Arc<dyn InputSchema>>,
    query: Option<Arc<dyn InputSchema>>,
    access: Access,
    org_scope: Option<OrgScope>,
}

impl RouteContractBuilder {
    pub fn params(mut self, schema: impl InputSchema + 'static) -> Self {
        self.params = Some(Arc::new(schema));
        self
    }

    pub fn body(mut self, schema: impl InputSchema + 'static) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    pub fn query(mut self, schema: impl InputSchema + 'static) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    /// No credential needed. Ignored when the route is organization-scoped.
    pub fn public(mut self) -> Self {
        self.access = Access::Public;
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.access = Access::Authenticated;
        self
    }

    /// Requires membership in the organization named by the scope's path
    /// parameter. Implies authentication.
    pub fn org_scoped(mut self, scope: OrgScope) -> Self {
        self.org_scope = Some(scope);
        self
    }

    pub fn build(self) -> RouteContract {
        let access = if self.org_scope.is_some() {
            Access::Authenticated
        } else {
            self.access
        };

        let mut stages = vec![Stage::ValidateParams];
        if access == Access::Authenticated {
            stages.push(Stage::Authenticate);
        }
        if let Some(scope) = &self.org_scope {
            stages.push(Stage::ResolveMembership);
            if scope.roles.is_some() {
                stages.push(Stage::CheckRole);
            }
        }
        stages.push(Stage::ValidateBodyAndQuery);

        RouteContract {
            name: self.name.into(),
            params: self.params,
            body: self.body,
            query: self.query,
            access,
            org_scope: self.org_scope,
            stages: stages.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizations::OrgRole;

    #[test]
    fn test_public_route_skips_authentication() {
        let contract = RouteContract::builder("health").public().build();
        assert_eq!(
            contract.stages(),
            &[Stage::ValidateParams, Stage::ValidateBodyAndQuery]
        );
    }

    #[test]
    fn test_authenticated_route_without_org() {
        let contract = RouteContract::builder("auth.me").build();
        assert_eq!(
            contract.stages(),
            &[
                Stage::ValidateParams,
                Stage::Authenticate,
                Stage::ValidateBodyAndQuery
            ]
        );
    }

    #[test]
    fn test_org_scope_without_roles_skips_role_check() {
        let contract = RouteContract::builder("accounts.list")
            .org_scoped(OrgScope::new("orgId"))
            .build();
        assert!(!contract.stages().contains(&Stage::CheckRole));
        assert!(contract.stages().contains(&Stage::ResolveMembership));
    }

    #[test]
    fn test_org_scope_implies_authentication() {
        let contract = RouteContract::builder("accounts.delete")
            .public()
            .org_scoped(OrgScope::new("orgId").roles(RoleSet::of(&[OrgRole::Owner])))
            .build();
        assert_eq!(contract.access(), Access::Authenticated);
        assert_eq!(
            contract.stages(),
            &[
                Stage::ValidateParams,
                Stage::Authenticate,
                Stage::ResolveMembership,
                Stage::CheckRole,
                Stage::ValidateBodyAndQuery
            ]
        );
    }

    #[test]
    fn test_scope_visibility_override() {
        let scope = OrgScope::new("orgId").reveal_missing();
        assert_eq!(scope.visibility(), Some(OrgVisibility::Reveal));
        assert_eq!(OrgScope::new("orgId").visibility(), None);
    }
}
