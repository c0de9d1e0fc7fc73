//! Account routes: the reference business handlers behind the pipeline.

use super::contracts;
use crate::error::{GateError, Result};
use crate::http::{CreatedResponse, JsonResponse, NoContentResponse, PaginatedData, PaginationQuery, RouteModule};
use crate::pipeline::{Ctx, Gate};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
    Loan,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub currency: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NewAccount {
    name: String,
    #[serde(rename = "type")]
    account_type: AccountType,
    currency: String,
    #[serde(default)]
    description: Option<String>,
}

/// A partial update. `description` distinguishes absent (keep) from `null` (clear).
#[derive(Debug, Default, Deserialize)]
pub struct AccountPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub account_type: Option<AccountType>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountPath {
    org_id: Uuid,
    account_id: Uuid,
}

/// In-memory account storage, in creation order.
#[derive(Clone, Default)]
pub struct AccountStore {
    accounts: Arc<RwLock<Vec<Account>>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts of one organization, oldest first.
    pub async fn list(&self, org_id: Uuid) -> Vec<Account> {
        self.accounts
            .read()
            .await
            .iter()
            .filter(|a| a.organization_id == org_id)
            .cloned()
            .collect()
    }

    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.push(account);
    }

    /// Looks an account up within its organization. Accounts of other
    /// organizations are not found.
    pub async fn get(&self, org_id: Uuid, id: Uuid) -> Option<Account> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.id == id && a.organization_id == org_id)
            .cloned()
    }

    pub async fn update(&self, org_id: Uuid, id: Uuid, patch: AccountPatch) -> Option<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id && a.organization_id == org_id)?;
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(account_type) = patch.account_type {
            account.account_type = account_type;
        }
        if let Some(description) = patch.description {
            account.description = description;
        }
        account.updated_at = Utc::now();
        Some(account.clone())
    }

    pub async fn remove(&self, org_id: Uuid, id: Uuid) -> bool {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|a| !(a.id == id && a.organization_id == org_id));
        accounts.len() != before
    }
}

/// Mounts the five account routes.
pub struct AccountsModule {
    store: AccountStore,
}

impl AccountsModule {
    pub fn new(store: AccountStore) -> Self {
        Self { store }
    }
}

impl RouteModule for AccountsModule {
    fn routes(&self, gate: &Gate) -> Router {
        Router::new()
            .route(
                "/organizations/{orgId}/accounts",
                gate.guard(get(list_accounts), contracts::list_accounts())
                    .merge(gate.guard(post(create_account), contracts::create_account())),
            )
            .route(
                "/organizations/{orgId}/accounts/{accountId}",
                gate.guard(get(get_account), contracts::get_account())
                    .merge(gate.guard(axum::routing::patch(update_account), contracts::update_account()))
                    .merge(gate.guard(axum::routing::delete(delete_account), contracts::delete_account())),
            )
            .with_state(self.store.clone())
    }
}

fn account_not_found() -> GateError {
    GateError::not_found("Account not found")
}

async fn list_accounts(
    State(store): State<AccountStore>,
    Ctx(ctx): Ctx,
) -> Result<PaginatedData<Account>> {
    let org_id = ctx.require_membership()?.organization_id;
    let page: PaginationQuery = ctx.query_as()?;
    let accounts = store.list(org_id).await;
    Ok(PaginatedData::from_window(accounts, page.limit, page.offset))
}

async fn create_account(
    State(store): State<AccountStore>,
    Ctx(ctx): Ctx,
) -> Result<CreatedResponse<Account>> {
    let membership = ctx.require_membership()?;
    let new: NewAccount = ctx.body_as()?;
    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4(),
        organization_id: membership.organization_id,
        name: new.name,
        account_type: new.account_type,
        currency: new.currency,
        description: new.description,
        created_at: now,
        updated_at: now,
    };
    store.insert(account.clone()).await;

    tracing::info!(
        account_id = %account.id,
        organization_id = %account.organization_id,
        user_id = %membership.user_id,
        "Account created"
    );

    let location = format!(
        "/organizations/{}/accounts/{}",
        account.organization_id, account.id
    );
    Ok(CreatedResponse::new(account, location))
}

async fn get_account(State(store): State<AccountStore>, Ctx(ctx): Ctx) -> JsonResponse<Account> {
    let path: AccountPath = ctx.params_as()?;
    store
        .get(path.org_id, path.account_id)
        .await
        .map(Json)
        .ok_or_else(account_not_found)
}

async fn update_account(State(store): State<AccountStore>, Ctx(ctx): Ctx) -> JsonResponse<Account> {
    let path: AccountPath = ctx.params_as()?;
    let patch: AccountPatch = ctx.body_as()?;
    store
        .update(path.org_id, path.account_id, patch)
        .await
        .map(Json)
        .ok_or_else(account_not_found)
}

async fn delete_account(State(store): State<AccountStore>, Ctx(ctx): Ctx) -> Result<NoContentResponse> {
    let path: AccountPath = ctx.params_as()?;
    if store.remove(path.org_id, path.account_id).await {
        Ok(NoContentResponse)
    } else {
        Err(account_not_found())
    }
}
