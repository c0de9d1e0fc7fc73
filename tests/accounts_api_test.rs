//! The account routes over HTTP, through the full application stack.

use axum::Router;
use ledgergate::finance::{AccountStore, AccountsModule, OrganizationsModule};
use ledgergate::testing::{self, OrgFixture, TEST_SECRET, TestTokens, TestUser};
use ledgergate::{App, ConfigBuilder};
use serde_json::{Value, json};
use std::sync::Arc;

struct TestApp {
    router: Router,
    fixture: OrgFixture,
    tokens: TestTokens,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(ConfigBuilder::new())
    }

    fn with_config(builder: ConfigBuilder) -> Self {
        let config = builder.with_jwt_secret(TEST_SECRET).build().unwrap();
        let fixture = OrgFixture::seeded();
        let store = fixture.store.clone();
        let router = App::from_config(config, Arc::new(store.clone()), Arc::new(store))
            .unwrap()
            .register_module(OrganizationsModule)
            .register_module(AccountsModule::new(AccountStore::new()))
            .into_router();

        Self {
            router,
            fixture,
            tokens: TestTokens::default(),
        }
    }

    fn token(&self, user: &TestUser) -> String {
        self.tokens.for_user(user)
    }

    fn accounts_path(&self) -> String {
        self.fixture.path("/accounts")
    }

    async fn create_account(&self, name: &str) -> Value {
        testing::post(self.router.clone(), &self.accounts_path())
            .bearer_token(&self.token(&self.fixture.owner))
            .json_body(&json!({"name": name}))
            .execute()
            .await
            .assert_created()
            .json()
    }
}

#[tokio::test]
async fn owner_creates_an_account() {
    let app = TestApp::new();

    let response = testing::post(app.router.clone(), &app.accounts_path())
        .bearer_token(&app.token(&app.fixture.owner))
        .json_body(&json!({"name": "Checking"}))
        .execute()
        .await
        .assert_created()
        .assert_json_field("name", json!("Checking"))
        .assert_json_field("type", json!("CHECKING"))
        .assert_json_field("currency", json!("USD"))
        .assert_json_field("organizationId", json!(app.fixture.org.id.to_string()))
        .assert_has_header("x-request-id");

    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
    testing::get(app.router.clone(), &format!("{}/{id}", app.accounts_path()))
        .bearer_token(&app.token(&app.fixture.member))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("id", json!(id));
}

#[tokio::test]
async fn created_account_has_location() {
    let app = TestApp::new();
    let response = testing::post(app.router.clone(), &app.accounts_path())
        .bearer_token(&app.token(&app.fixture.admin))
        .json_body(&json!({"name": "Payroll", "currency": "EUR"}))
        .execute()
        .await
        .assert_created();

    let body: Value = response.json();
    let expected = format!("{}/{}", app.accounts_path(), body["id"].as_str().unwrap());
    response.assert_header("location", &expected);
}

#[tokio::test]
async fn expired_token_cannot_list_accounts() {
    let app = TestApp::new();

    testing::get(app.router.clone(), &app.accounts_path())
        .bearer_token(&app.tokens.expired(&app.fixture.owner))
        .execute()
        .await
        .assert_unauthorized()
        .assert_error("authentication_error", Some("expired_credential"));
}

#[tokio::test]
async fn missing_token_is_401() {
    let app = TestApp::new();

    testing::get(app.router.clone(), &app.accounts_path())
        .execute()
        .await
        .assert_unauthorized()
        .assert_error("authentication_error", Some("missing_credential"));
}

#[tokio::test]
async fn member_cannot_patch_an_account() {
    let app = TestApp::new();
    let account = app.create_account("Checking").await;
    let path = format!("{}/{}", app.accounts_path(), account["id"].as_str().unwrap());

    testing::patch(app.router.clone(), &path)
        .bearer_token(&app.token(&app.fixture.member))
        .json_body(&json!({"name": "Mine now"}))
        .execute()
        .await
        .assert_forbidden()
        .assert_error("authorization_error", Some("insufficient_role"));

    testing::get(app.router.clone(), &path)
        .bearer_token(&app.token(&app.fixture.member))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("name", json!("Checking"));
}

#[tokio::test]
async fn empty_name_is_rejected() {
    let app = TestApp::new();

    testing::post(app.router.clone(), &app.accounts_path())
        .bearer_token(&app.token(&app.fixture.owner))
        .json_body(&json!({"name": ""}))
        .execute()
        .await
        .assert_bad_request()
        .assert_error("validation_error", None)
        .assert_json_field("source", json!("body"))
        .assert_field_error("name", Some("at least 1 character"));
}

#[tokio::test]
async fn broken_json_is_a_body_error() {
    let app = TestApp::new();

    testing::post(app.router.clone(), &app.accounts_path())
        .bearer_token(&app.token(&app.fixture.owner))
        .header("content-type", "application/json")
        .text_body("{\"name\": ")
        .execute()
        .await
        .assert_bad_request()
        .assert_field_error("body", Some("invalid JSON"));
}

#[tokio::test]
async fn outsider_gets_the_same_refusal_for_real_and_missing_orgs() {
    let app = TestApp::new();
    let token = app.token(&app.fixture.outsider);

    let real: Value = testing::get(app.router.clone(), &app.accounts_path())
        .bearer_token(&token)
        .execute()
        .await
        .assert_forbidden()
        .json();

    let missing_path = format!("/organizations/{}/accounts", OrgFixture::missing_org_id());
    let missing: Value = testing::get(app.router.clone(), &missing_path)
        .bearer_token(&token)
        .execute()
        .await
        .assert_forbidden()
        .json();

    for key in ["kind", "message", "reason"] {
        assert_eq!(real[key], missing[key], "{key} differs");
    }
    assert_eq!(real["reason"], "not_a_member");
    assert_ne!(real["error_id"], missing["error_id"]);
}

#[tokio::test]
async fn revealing_deployment_answers_missing_org_with_404() {
    let app = TestApp::with_config(ConfigBuilder::new().with_reveal_missing_organizations(true));
    let missing_path = format!("/organizations/{}/accounts", OrgFixture::missing_org_id());

    testing::get(app.router.clone(), &missing_path)
        .bearer_token(&app.token(&app.fixture.outsider))
        .execute()
        .await
        .assert_not_found()
        .assert_error("not_found", None);
}

#[tokio::test]
async fn account_of_another_org_is_not_found() {
    let app = TestApp::new();
    let ours = app.create_account("Ours").await;

    let other = OrgFixture::seed_into(app.fixture.store.clone());
    let path = other.path(&format!("/accounts/{}", ours["id"].as_str().unwrap()));

    testing::get(app.router.clone(), &path)
        .bearer_token(&app.token(&other.owner))
        .execute()
        .await
        .assert_not_found();

    testing::delete(app.router.clone(), &path)
        .bearer_token(&app.token(&other.owner))
        .execute()
        .await
        .assert_not_found();
}

#[tokio::test]
async fn list_is_paginated() {
    let app = TestApp::new();
    for name in ["A", "B", "C"] {
        app.create_account(name).await;
    }

    testing::get(app.router.clone(), &app.accounts_path())
        .with_query(&[("limit", "2"), ("offset", "1")])
        .bearer_token(&app.token(&app.fixture.member))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("pagination.total", json!(3))
        .assert_json_field("pagination.limit", json!(2))
        .assert_json_field("pagination.offset", json!(1))
        .assert_json_field("items.0.name", json!("B"))
        .assert_json_field("items.1.name", json!("C"));

    testing::get(app.router.clone(), &app.accounts_path())
        .with_query(&[("limit", "0")])
        .bearer_token(&app.token(&app.fixture.member))
        .execute()
        .await
        .assert_bad_request()
        .assert_json_field("source", json!("query"))
        .assert_field_error("limit", None);
}

#[tokio::test]
async fn patch_clears_description_only_when_null() {
    let app = TestApp::new();
    let created: Value = testing::post(app.router.clone(), &app.accounts_path())
        .bearer_token(&app.token(&app.fixture.owner))
        .json_body(&json!({"name": "Savings", "type": "SAVINGS", "description": "Rainy day"}))
        .execute()
        .await
        .assert_created()
        .json();
    let path = format!("{}/{}", app.accounts_path(), created["id"].as_str().unwrap());
    let token = app.token(&app.fixture.admin);

    testing::patch(app.router.clone(), &path)
        .bearer_token(&token)
        .json_body(&json!({"name": "Emergency"}))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("name", json!("Emergency"))
        .assert_json_field("description", json!("Rainy day"));

    testing::patch(app.router.clone(), &path)
        .bearer_token(&token)
        .json_body(&json!({"description": null}))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("description", Value::Null)
        .assert_json_field("type", json!("SAVINGS"));
}

#[tokio::test]
async fn admin_deletes_an_account() {
    let app = TestApp::new();
    let account = app.create_account("Old").await;
    let path = format!("{}/{}", app.accounts_path(), account["id"].as_str().unwrap());

    testing::delete(app.router.clone(), &path)
        .bearer_token(&app.token(&app.fixture.admin))
        .execute()
        .await
        .assert_no_content();

    testing::get(app.router.clone(), &path)
        .bearer_token(&app.token(&app.fixture.owner))
        .execute()
        .await
        .assert_not_found();
}

#[tokio::test]
async fn me_and_organization_routes() {
    let app = TestApp::new();
    let owner = &app.fixture.owner;

    testing::get(app.router.clone(), "/auth/me")
        .bearer_token(&app.token(owner))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("id", json!(owner.id))
        .assert_json_field("email", json!(owner.email));

    testing::get(app.router.clone(), &app.fixture.path(""))
        .bearer_token(&app.token(&app.fixture.admin))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("name", json!(app.fixture.org.name))
        .assert_json_field("role", json!("ADMIN"));

    testing::get(app.router.clone(), &app.fixture.path("/members"))
        .bearer_token(&app.token(&app.fixture.member))
        .execute()
        .await
        .assert_ok()
        .assert_json_field("pagination.total", json!(3))
        .assert_json_field("items.0.role", json!("OWNER"));
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = TestApp::new();

    testing::get(app.router.clone(), "/auth/me")
        .header("x-request-id", "req-123")
        .execute()
        .await
        .assert_unauthorized()
        .assert_header("x-request-id", "req-123");
}
