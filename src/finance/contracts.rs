//! The route contract table of the finance API.
//!
//! Every route the API exposes is declared here, once. Handlers are mounted
//! with [`Gate::guard`](crate::pipeline::Gate::guard) and the matching
//! contract; [`catalog`] lists them all.

use crate::http::PaginationQuery;
use crate::organizations::RoleSet;
use crate::pipeline::{OrgScope, RouteContract};
use crate::validation::{Field, Schema, validate_currency_code, validate_hex_color, validate_not_blank};

pub const ORG_PARAM: &str = "orgId";
pub const ACCOUNT_PARAM: &str = "accountId";

pub const ACCOUNT_TYPES: &[&str] = &[
    "CHECKING",
    "SAVINGS",
    "CREDIT_CARD",
    "CASH",
    "INVESTMENT",
    "LOAN",
    "OTHER",
];

pub const TRANSACTION_TYPES: &[&str] = &["INCOME", "EXPENSE", "TRANSFER"];

fn member_of_org() -> OrgScope {
    OrgScope::new(ORG_PARAM)
}

fn managers_of_org() -> OrgScope {
    OrgScope::new(ORG_PARAM).roles(RoleSet::owner_or_admin())
}

pub fn org_params() -> Schema {
    Schema::object().field(ORG_PARAM, Field::uuid())
}

pub fn account_params() -> Schema {
    org_params().field(ACCOUNT_PARAM, Field::uuid())
}

fn name_field(max: usize) -> Field {
    Field::string().min_len(1).max_len(max).check(validate_not_blank)
}

fn description_field() -> Field {
    Field::string().max_len(500).optional().nullable()
}

pub fn create_account_body() -> Schema {
    Schema::object()
        .field("name", name_field(100))
        .field("type", Field::one_of(ACCOUNT_TYPES).default("CHECKING"))
        .field("currency", Field::string().check(validate_currency_code).default("USD"))
        .field("description", description_field())
}

pub fn update_account_body() -> Schema {
    Schema::object()
        .field("name", name_field(100).optional())
        .field("type", Field::one_of(ACCOUNT_TYPES).optional())
        .field("description", description_field())
}

pub fn list_transactions_query() -> Schema {
    PaginationQuery::schema()
        .field("accountId", Field::uuid().optional())
        .field("from", Field::date().optional())
        .field("to", Field::date().optional())
}

pub fn create_transaction_body() -> Schema {
    Schema::object()
        .field("accountId", Field::uuid())
        .field("type", Field::one_of(TRANSACTION_TYPES))
        .field("amount", Field::number().min(0))
        .field("date", Field::date())
        .field("description", description_field())
        .field("categoryId", Field::uuid().optional().nullable())
        .field("vendorId", Field::uuid().optional().nullable())
        .field("tags", Field::array(name_field(30)).max_len(10).optional())
}

pub fn auth_me() -> RouteContract {
    RouteContract::builder("auth.me").authenticated().build()
}

pub fn get_organization() -> RouteContract {
    RouteContract::builder("organizations.get")
        .params(org_params())
        .org_scoped(member_of_org())
        .build()
}

pub fn update_organization() -> RouteContract {
    RouteContract::builder("organizations.update")
        .params(org_params())
        .body(Schema::object().field("name", name_field(100).optional()))
        .org_scoped(managers_of_org())
        .build()
}

pub fn delete_organization() -> RouteContract {
    RouteContract::builder("organizations.delete")
        .params(org_params())
        .org_scoped(OrgScope::new(ORG_PARAM).roles(RoleSet::owner_only()))
        .build()
}

pub fn list_members() -> RouteContract {
    RouteContract::builder("organizations.members.list")
        .params(org_params())
        .query(PaginationQuery::schema())
        .org_scoped(member_of_org())
        .build()
}

pub fn list_accounts() -> RouteContract {
    RouteContract::builder("accounts.list")
        .params(org_params())
        .query(PaginationQuery::schema())
        .org_scoped(member_of_org())
        .build()
}

pub fn create_account() -> RouteContract {
    RouteContract::builder("accounts.create")
        .params(org_params())
        .body(create_account_body())
        .org_scoped(managers_of_org())
        .build()
}

pub fn get_account() -> RouteContract {
    RouteContract::builder("accounts.get")
        .params(account_params())
        .org_scoped(member_of_org())
        .build()
}

pub fn update_account() -> RouteContract {
    RouteContract::builder("accounts.update")
        .params(account_params())
        .body(update_account_body())
        .org_scoped(managers_of_org())
        .build()
}

pub fn delete_account() -> RouteContract {
    RouteContract::builder("accounts.delete")
        .params(account_params())
        .org_scoped(managers_of_org())
        .build()
}

pub fn list_transactions() -> RouteContract {
    RouteContract::builder("transactions.list")
        .params(org_params())
        .query(list_transactions_query())
        .org_scoped(member_of_org())
        .build()
}

pub fn create_transaction() -> RouteContract {
    RouteContract::builder("transactions.create")
        .params(org_params())
        .body(create_transaction_body())
        .org_scoped(member_of_org())
        .build()
}

pub fn list_categories() -> RouteContract {
    RouteContract::builder("categories.list")
        .params(org_params())
        .query(PaginationQuery::schema())
        .org_scoped(member_of_org())
        .build()
}

pub fn create_category() -> RouteContract {
    RouteContract::builder("categories.create")
        .params(org_params())
        .body(
            Schema::object()
                .field("name", name_field(50))
                .field("color", Field::string().check(validate_hex_color).optional())
                .field("parentId", Field::uuid().optional().nullable()),
        )
        .org_scoped(managers_of_org())
        .build()
}

pub fn list_vendors() -> RouteContract {
    RouteContract::builder("vendors.list")
        .params(org_params())
        .query(PaginationQuery::schema())
        .org_scoped(member_of_org())
        .build()
}

pub fn create_vendor() -> RouteContract {
    RouteContract::builder("vendors.create")
        .params(org_params())
        .body(
            Schema::object()
                .field("name", name_field(100))
                .field("email", Field::email().optional().nullable())
                .field("description", description_field()),
        )
        .org_scoped(managers_of_org())
        .build()
}

/// Every contract of the API, in declaration order.
pub fn catalog() -> Vec<RouteContract> {
    vec![
        auth_me(),
        get_organization(),
        update_organization(),
        delete_organization(),
        list_members(),
        list_accounts(),
        create_account(),
        get_account(),
        update_account(),
        delete_account(),
        list_transactions(),
        create_transaction(),
        list_categories(),
        create_category(),
        list_vendors(),
        create_vendor(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizations::OrgRole;
    use crate::pipeline::{Access, Stage};
    use crate::validation::InputSchema;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_contract_names_are_unique() {
        let catalog = catalog();
        let names: HashSet<&str> = catalog.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_every_org_route_authenticates() {
        for contract in catalog() {
            if contract.org_scope().is_some() {
                assert_eq!(contract.access(), Access::Authenticated, "{}", contract.name());
                assert!(contract.stages().contains(&Stage::ResolveMembership));
            }
        }
    }

    #[test]
    fn test_write_routes_require_managers() {
        for contract in [create_account(), update_account(), delete_account(), update_organization()] {
            let roles = contract.org_scope().and_then(|s| s.required_roles()).unwrap();
            assert!(roles.contains(OrgRole::Owner));
            assert!(roles.contains(OrgRole::Admin));
            assert!(!roles.contains(OrgRole::Member), "{}", contract.name());
        }

        let roles = *delete_organization().org_scope().and_then(|s| s.required_roles()).unwrap();
        assert_eq!(roles, RoleSet::owner_only());
    }

    #[test]
    fn test_any_member_may_record_transactions() {
        assert!(!create_transaction().stages().contains(&Stage::CheckRole));
        assert!(!list_accounts().stages().contains(&Stage::CheckRole));
    }

    #[test]
    fn test_auth_me_is_not_org_scoped() {
        let contract = auth_me();
        assert!(contract.org_scope().is_none());
        assert!(contract.stages().contains(&Stage::Authenticate));
    }

    #[test]
    fn test_create_account_body_defaults() {
        let normalized = create_account_body().validate(json!({"name": "Checking"})).unwrap();
        assert_eq!(
            normalized,
            json!({"name": "Checking", "type": "CHECKING", "currency": "USD"})
        );
    }

    #[test]
    fn test_create_account_body_rejects_empty_name() {
        let errors = create_account_body().validate(json!({"name": ""})).unwrap_err();
        assert_eq!(errors[0].field, "name");
        assert!(errors[0].message.contains("at least 1 character"));
    }

    #[test]
    fn test_create_account_body_rejects_bad_currency() {
        let errors = create_account_body()
            .validate(json!({"name": "Euro", "currency": "eur"}))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "currency");
    }

    #[test]
    fn test_transaction_body_collects_all_errors() {
        let errors = create_transaction_body()
            .validate(json!({
                "accountId": "nope",
                "type": "GIFT",
                "amount": -5,
                "date": "2024-13-01",
                "tags": ["ok", "   "]
            }))
            .unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["accountId", "type", "amount", "date", "tags[1]"]);
    }
}
